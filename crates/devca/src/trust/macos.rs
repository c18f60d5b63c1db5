//! macOS login keychain adapter.
//!
//! One shared system-wide store: Safari, Chrome, and Edge on macOS all
//! read the keychain, so a single add/remove here covers every
//! OS-trusting consumer. Firefox keeps its own NSS databases and is
//! handled separately.

use async_trait::async_trait;
use tracing::{debug, warn};

use devca_core::{StoreName, StoreStatus};

use super::adapter::{CertContext, TrustStoreAdapter};
use super::exec::run_command;
use crate::inspect::bundle_contains_certificate;

/// Standard login keychain location relative to the home directory
const LOGIN_KEYCHAIN_SUFFIX: &str = "Library/Keychains/login.keychain-db";

/// Adapter for the macOS `security` tool.
pub struct MacAdapter;

impl MacAdapter {
    /// New adapter; the keychain is resolved lazily per operation.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Resolve the user's default (login) keychain.
    async fn keychain(&self) -> Result<String, String> {
        if let Ok(out) = run_command("security", &["default-keychain"]).await {
            if out.success {
                let keychain = out.stdout.trim().trim_matches('"').to_string();
                if !keychain.is_empty() {
                    return Ok(keychain);
                }
            }
        }

        if let Some(home) = dirs::home_dir() {
            let login = home.join(LOGIN_KEYCHAIN_SUFFIX);
            if login.exists() {
                return Ok(login.to_string_lossy().into_owned());
            }
        }

        Err("could not determine login keychain path".to_string())
    }

    /// Whether the exact certificate is present in the keychain.
    async fn present(&self, cert: &CertContext, keychain: &str) -> Result<bool, String> {
        let out = run_command(
            "security",
            &[
                "find-certificate",
                "-a",
                "-c",
                &cert.common_name,
                "-p",
                keychain,
            ],
        )
        .await
        .map_err(|e| e.to_string())?;

        // find-certificate fails when nothing matches; that is a clean
        // "absent", not an error.
        if !out.success {
            return Ok(false);
        }
        Ok(bundle_contains_certificate(&out.stdout, &cert.certificate_pem))
    }
}

impl Default for MacAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrustStoreAdapter for MacAdapter {
    fn name(&self) -> StoreName {
        StoreName::Mac
    }

    async fn query(&self, cert: &CertContext) -> StoreStatus {
        let keychain = match self.keychain().await {
            Ok(k) => k,
            Err(e) => return StoreStatus::unknown(e),
        };
        match self.present(cert, &keychain).await {
            Ok(true) => StoreStatus::trusted("certificate present in login keychain"),
            Ok(false) => StoreStatus::not_trusted("certificate absent from login keychain"),
            Err(e) => StoreStatus::unknown(format!("keychain query failed: {e}")),
        }
    }

    async fn add(&self, cert: &CertContext) -> StoreStatus {
        let keychain = match self.keychain().await {
            Ok(k) => k,
            Err(e) => return StoreStatus::unknown(e),
        };

        match self.present(cert, &keychain).await {
            Ok(true) => return StoreStatus::trusted("already trusted in login keychain"),
            Ok(false) => {}
            Err(e) => return StoreStatus::unknown(format!("keychain query failed: {e}")),
        }

        let path = cert.certificate_path.to_string_lossy();
        let out = match run_command(
            "security",
            &[
                "add-trusted-cert",
                "-r",
                "trustRoot",
                "-p",
                "ssl",
                "-k",
                &keychain,
                path.as_ref(),
            ],
        )
        .await
        {
            Ok(out) => out,
            Err(e) => return StoreStatus::unknown(format!("security not runnable: {e}")),
        };

        if out.success {
            debug!(keychain = %keychain, "certificate added to login keychain");
            StoreStatus::trusted("added to login keychain")
        } else if out.stderr.contains("already exists") || out.stderr.contains("duplicate") {
            StoreStatus::trusted("already present in login keychain")
        } else {
            warn!(diagnostic = %out.diagnostic(), "keychain add failed");
            StoreStatus::not_trusted(format!("add-trusted-cert failed: {}", out.diagnostic()))
        }
    }

    async fn remove(&self, cert: &CertContext) -> StoreStatus {
        let keychain = match self.keychain().await {
            Ok(k) => k,
            Err(e) => return StoreStatus::unknown(e),
        };

        match self.present(cert, &keychain).await {
            Ok(false) => return StoreStatus::not_trusted("not present in login keychain"),
            Ok(true) => {}
            Err(e) => return StoreStatus::unknown(format!("keychain query failed: {e}")),
        }

        // Drop the explicit trust settings first; a failure here is not
        // fatal since the certificate may be present without them.
        let path = cert.certificate_path.to_string_lossy();
        if let Ok(out) = run_command("security", &["remove-trusted-cert", path.as_ref()]).await {
            if !out.success {
                debug!(diagnostic = %out.diagnostic(), "remove-trusted-cert reported failure");
            }
        }

        let out = match run_command(
            "security",
            &["delete-certificate", "-c", &cert.common_name, &keychain],
        )
        .await
        {
            Ok(out) => out,
            Err(e) => return StoreStatus::unknown(format!("security not runnable: {e}")),
        };

        if out.success {
            StoreStatus::not_trusted("removed from login keychain")
        } else {
            StoreStatus::unknown(format!("delete-certificate failed: {}", out.diagnostic()))
        }
    }
}
