//! Trust store status taxonomy and the per-run trust report.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of a trust operation against one store.
///
/// A closed set: adding a new status without handling it everywhere is a
/// compile error, never a silently-unhandled string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustStatus {
    /// Certificate verified present and matching in the store
    Trusted,
    /// Store reachable, certificate absent, outdated, or removed
    NotTrusted,
    /// The store's trust state could not be determined
    Unknown,
    /// The consuming application is not installed on this machine.
    ///
    /// Not a failure: terminal for the (machine, application) pair within
    /// one run, and it short-circuits further trust operations.
    Other,
}

impl TrustStatus {
    /// Returns true if the certificate is verified trusted
    #[must_use]
    pub const fn is_trusted(self) -> bool {
        matches!(self, Self::Trusted)
    }

    /// Returns true if an `add` should be skipped for this status when
    /// only incomplete stores are being reconciled
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Trusted | Self::Other)
    }
}

impl std::fmt::Display for TrustStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trusted => write!(f, "trusted"),
            Self::NotTrusted => write!(f, "not_trusted"),
            Self::Unknown => write!(f, "unknown"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Identity of a trust store the reconciliation engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreName {
    /// macOS login keychain (Safari, Chrome and Edge on macOS read it)
    Mac,
    /// Windows user certificate store
    Windows,
    /// Linux system CA bundle
    Linux,
    /// Firefox NSS profile databases (all platforms)
    Firefox,
    /// Chromium NSS database (`~/.pki/nssdb`, Linux builds)
    Chrome,
}

impl StoreName {
    /// Store name as it appears in reports
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mac => "mac",
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Firefox => "firefox",
            Self::Chrome => "chrome",
        }
    }
}

impl std::fmt::Display for StoreName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of one store plus a diagnostic reason.
///
/// The reason is a diagnostic code for operators and logs, not user-facing
/// prose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStatus {
    /// Trust state of the store
    pub status: TrustStatus,
    /// Free-text diagnostic explaining how the state was determined
    pub reason: String,
}

impl StoreStatus {
    /// Construct a `Trusted` status
    #[must_use]
    pub fn trusted(reason: impl Into<String>) -> Self {
        Self {
            status: TrustStatus::Trusted,
            reason: reason.into(),
        }
    }

    /// Construct a `NotTrusted` status
    #[must_use]
    pub fn not_trusted(reason: impl Into<String>) -> Self {
        Self {
            status: TrustStatus::NotTrusted,
            reason: reason.into(),
        }
    }

    /// Construct an `Unknown` status
    #[must_use]
    pub fn unknown(reason: impl Into<String>) -> Self {
        Self {
            status: TrustStatus::Unknown,
            reason: reason.into(),
        }
    }

    /// Construct an `Other` (application not installed) status
    #[must_use]
    pub fn other(reason: impl Into<String>) -> Self {
        Self {
            status: TrustStatus::Other,
            reason: reason.into(),
        }
    }
}

/// Aggregated trust state across every applicable store.
///
/// Built fresh on every query; entries are only carried forward when the
/// engine explicitly skips a store that is already settled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustReport {
    entries: BTreeMap<StoreName, StoreStatus>,
}

impl TrustReport {
    /// Create an empty report
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the status for one store, replacing any previous entry
    pub fn insert(&mut self, store: StoreName, status: StoreStatus) {
        self.entries.insert(store, status);
    }

    /// Status for a single store, if present
    #[must_use]
    pub fn get(&self, store: StoreName) -> Option<&StoreStatus> {
        self.entries.get(&store)
    }

    /// Iterate over (store, status) pairs in stable order
    pub fn iter(&self) -> impl Iterator<Item = (StoreName, &StoreStatus)> {
        self.entries.iter().map(|(name, status)| (*name, status))
    }

    /// Stores currently reporting `Trusted`
    #[must_use]
    pub fn trusted_stores(&self) -> Vec<StoreName> {
        self.entries
            .iter()
            .filter(|(_, s)| s.status.is_trusted())
            .map(|(name, _)| *name)
            .collect()
    }

    /// Stores that ended `NotTrusted` after an attempted add.
    ///
    /// `Unknown` and `Other` never escalate to warnings.
    #[must_use]
    pub fn warnings(&self) -> Vec<(StoreName, &str)> {
        self.entries
            .iter()
            .filter(|(_, s)| s.status == TrustStatus::NotTrusted)
            .map(|(name, s)| (*name, s.reason.as_str()))
            .collect()
    }

    /// True if no store reported anything
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of stores in the report
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
