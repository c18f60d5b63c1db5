//! Linux system CA bundle adapter.
//!
//! Installs into `/usr/local/share/ca-certificates` and refreshes the
//! bundle with `update-ca-certificates` (Debian/Ubuntu convention).
//! Writing the anchors directory needs root, so mutation shells out via
//! `sudo`; querying only reads and needs nothing.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, warn};

use devca_core::{StoreName, StoreStatus};

use super::adapter::{CertContext, TrustStoreAdapter};
use super::exec::run_command;
use crate::inspect::same_certificate;

/// Debian/Ubuntu local CA anchors directory
const DEFAULT_ANCHORS_DIR: &str = "/usr/local/share/ca-certificates";

/// Adapter for the shared Linux system store.
pub struct LinuxAdapter {
    anchors_dir: PathBuf,
}

impl LinuxAdapter {
    /// Adapter against the standard anchors directory
    #[must_use]
    pub fn new() -> Self {
        Self {
            anchors_dir: PathBuf::from(DEFAULT_ANCHORS_DIR),
        }
    }

    /// Adapter against an explicit anchors directory (tests)
    #[must_use]
    pub fn with_anchors_dir(anchors_dir: impl Into<PathBuf>) -> Self {
        Self {
            anchors_dir: anchors_dir.into(),
        }
    }

    fn anchor_path(&self, cert: &CertContext) -> PathBuf {
        self.anchors_dir.join(format!("{}.crt", slug(&cert.common_name)))
    }

    fn installed(&self, cert: &CertContext) -> Option<bool> {
        let anchor = self.anchor_path(cert);
        if !anchor.exists() {
            return Some(false);
        }
        match std::fs::read_to_string(&anchor) {
            Ok(existing) => Some(same_certificate(&existing, &cert.certificate_pem)),
            Err(_) => None,
        }
    }

    async fn refresh_bundle(&self) -> Result<(), String> {
        let out = run_command("sudo", &["update-ca-certificates"])
            .await
            .map_err(|e| e.to_string())?;
        if out.success {
            Ok(())
        } else {
            Err(out.diagnostic())
        }
    }
}

impl Default for LinuxAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrustStoreAdapter for LinuxAdapter {
    fn name(&self) -> StoreName {
        StoreName::Linux
    }

    async fn query(&self, cert: &CertContext) -> StoreStatus {
        match self.installed(cert) {
            Some(true) => StoreStatus::trusted("anchor present and matching"),
            Some(false) => StoreStatus::not_trusted("anchor absent or outdated"),
            None => StoreStatus::unknown("anchor unreadable"),
        }
    }

    async fn add(&self, cert: &CertContext) -> StoreStatus {
        match self.installed(cert) {
            Some(true) => return StoreStatus::trusted("already trusted in system bundle"),
            Some(false) => {}
            None => return StoreStatus::unknown("anchor unreadable"),
        }

        let anchor = self.anchor_path(cert);
        let src = cert.certificate_path.to_string_lossy();
        let dst = anchor.to_string_lossy();
        let out = match run_command("sudo", &["cp", src.as_ref(), dst.as_ref()]).await {
            Ok(out) => out,
            Err(e) => return StoreStatus::unknown(format!("sudo not runnable: {e}")),
        };
        if !out.success {
            warn!(diagnostic = %out.diagnostic(), "copying anchor failed");
            return StoreStatus::not_trusted(format!("copy to anchors failed: {}", out.diagnostic()));
        }

        match self.refresh_bundle().await {
            Ok(()) => {
                debug!(anchor = %anchor.display(), "system bundle refreshed");
                StoreStatus::trusted("added to system bundle")
            }
            Err(e) => StoreStatus::not_trusted(format!("update-ca-certificates failed: {e}")),
        }
    }

    async fn remove(&self, cert: &CertContext) -> StoreStatus {
        match self.installed(cert) {
            Some(false) => return StoreStatus::not_trusted("not present in system bundle"),
            Some(true) | None => {}
        }

        let anchor = self.anchor_path(cert);
        let dst = anchor.to_string_lossy();
        let out = match run_command("sudo", &["rm", "-f", dst.as_ref()]).await {
            Ok(out) => out,
            Err(e) => return StoreStatus::unknown(format!("sudo not runnable: {e}")),
        };
        if !out.success {
            return StoreStatus::unknown(format!("removing anchor failed: {}", out.diagnostic()));
        }

        match self.refresh_bundle().await {
            Ok(()) => StoreStatus::not_trusted("removed from system bundle"),
            Err(e) => StoreStatus::unknown(format!("update-ca-certificates failed: {e}")),
        }
    }
}

/// Filesystem-safe name derived from the certificate common name.
fn slug(common_name: &str) -> String {
    let mut out: String = common_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    while out.contains("--") {
        out = out.replace("--", "-");
    }
    out.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::CertificateFactory;
    use chrono::Duration;
    use devca_core::SubjectAttributes;
    use tempfile::TempDir;

    fn context(tmp: &TempDir) -> CertContext {
        let root = CertificateFactory::create_root(
            &SubjectAttributes::new("Linux Test CA"),
            Duration::days(10),
            0,
        )
        .unwrap();
        let path = tmp.path().join("ca.crt");
        std::fs::write(&path, &root.certificate_pem).unwrap();
        CertContext {
            certificate_pem: root.certificate_pem,
            certificate_path: path,
            common_name: "Linux Test CA".to_string(),
        }
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("devca Local Development CA"), "devca-local-development-ca");
        assert_eq!(slug("--Weird__Name--"), "weird-name");
    }

    #[tokio::test]
    async fn test_query_absent_anchor() {
        let tmp = TempDir::new().unwrap();
        let anchors = TempDir::new().unwrap();
        let adapter = LinuxAdapter::with_anchors_dir(anchors.path());
        let status = adapter.query(&context(&tmp)).await;
        assert_eq!(status.status, devca_core::TrustStatus::NotTrusted);
    }

    #[tokio::test]
    async fn test_query_matching_anchor() {
        let tmp = TempDir::new().unwrap();
        let anchors = TempDir::new().unwrap();
        let adapter = LinuxAdapter::with_anchors_dir(anchors.path());
        let cert = context(&tmp);

        std::fs::write(adapter.anchor_path(&cert), &cert.certificate_pem).unwrap();
        let status = adapter.query(&cert).await;
        assert_eq!(status.status, devca_core::TrustStatus::Trusted);
    }

    #[tokio::test]
    async fn test_query_outdated_anchor() {
        let tmp = TempDir::new().unwrap();
        let anchors = TempDir::new().unwrap();
        let adapter = LinuxAdapter::with_anchors_dir(anchors.path());
        let cert = context(&tmp);

        let stale = CertificateFactory::create_root(
            &SubjectAttributes::new("Linux Test CA"),
            Duration::days(10),
            0,
        )
        .unwrap();
        std::fs::write(adapter.anchor_path(&cert), stale.certificate_pem).unwrap();

        let status = adapter.query(&cert).await;
        assert_eq!(status.status, devca_core::TrustStatus::NotTrusted);
    }
}
