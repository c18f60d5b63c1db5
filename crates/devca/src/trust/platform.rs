//! Platform selection: decided once, then driven entirely by the closed
//! enum rather than scattered conditional compilation.

use std::sync::Arc;

use super::adapter::TrustStoreAdapter;
use super::detect::DetectionCache;
use super::linux::LinuxAdapter;
use super::macos::MacAdapter;
use super::nss::{BrowserKind, NssAdapter};
use super::windows::WindowsAdapter;

/// The operating systems we know how to reconcile trust on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Linux,
    Windows,
    /// Anything else; reconciliation degrades to an empty adapter set
    Unsupported,
}

impl Platform {
    /// The platform this binary was built for.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else if cfg!(windows) {
            Self::Windows
        } else {
            Self::Unsupported
        }
    }
}

/// Build the adapter set for a platform.
///
/// macOS and Windows browsers other than Firefox read the OS store, so
/// one OS adapter plus Firefox covers them. Chromium on Linux keeps its
/// own NSS database and needs a dedicated adapter.
#[must_use]
pub fn adapters_for(
    platform: Platform,
    cache: &Arc<DetectionCache>,
    nss_dynamic_install: bool,
) -> Vec<Box<dyn TrustStoreAdapter>> {
    match platform {
        Platform::MacOs => vec![
            Box::new(MacAdapter::new()),
            Box::new(NssAdapter::new(
                BrowserKind::Firefox,
                Arc::clone(cache),
                nss_dynamic_install,
            )),
        ],
        Platform::Linux => vec![
            Box::new(LinuxAdapter::new()),
            Box::new(NssAdapter::new(
                BrowserKind::Firefox,
                Arc::clone(cache),
                nss_dynamic_install,
            )),
            Box::new(NssAdapter::new(
                BrowserKind::Chromium,
                Arc::clone(cache),
                nss_dynamic_install,
            )),
        ],
        Platform::Windows => vec![
            Box::new(WindowsAdapter::new()),
            Box::new(NssAdapter::new(
                BrowserKind::Firefox,
                Arc::clone(cache),
                nss_dynamic_install,
            )),
        ],
        Platform::Unsupported => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devca_core::StoreName;

    fn names(platform: Platform) -> Vec<StoreName> {
        let cache = Arc::new(DetectionCache::new());
        adapters_for(platform, &cache, false)
            .iter()
            .map(|a| a.name())
            .collect()
    }

    #[test]
    fn test_adapter_sets_per_platform() {
        assert_eq!(names(Platform::MacOs), [StoreName::Mac, StoreName::Firefox]);
        assert_eq!(
            names(Platform::Linux),
            [StoreName::Linux, StoreName::Firefox, StoreName::Chrome]
        );
        assert_eq!(
            names(Platform::Windows),
            [StoreName::Windows, StoreName::Firefox]
        );
        assert!(names(Platform::Unsupported).is_empty());
    }
}
