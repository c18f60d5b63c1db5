//! Windows user certificate store adapter.
//!
//! Uses `certutil` against the per-user Root store, which does not need
//! administrator rights. Chrome and Edge on Windows read this store, so
//! it mirrors into every OS-trusting browser.

use async_trait::async_trait;
use sha1::{Digest, Sha1};
use tracing::{debug, warn};

use devca_core::{StoreName, StoreStatus};

use super::adapter::{CertContext, TrustStoreAdapter};
use super::exec::run_command;
use crate::inspect::first_der;

/// Adapter for the Windows `certutil` tool.
pub struct WindowsAdapter;

impl WindowsAdapter {
    /// New adapter
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Whether this exact certificate is in the user Root store.
    ///
    /// Nickname and common name are not enough: a stale root from a
    /// previous generation keeps the same subject. Presence is decided
    /// by the SHA-1 hash certutil prints for every entry in its dump.
    async fn present(&self, cert: &CertContext) -> Result<bool, String> {
        let fingerprint = sha1_fingerprint(&cert.certificate_pem)
            .ok_or_else(|| "certificate PEM is not parseable".to_string())?;
        let out = run_command("certutil", &["-user", "-store", "Root"])
            .await
            .map_err(|e| e.to_string())?;
        if !out.success {
            return Err(out.diagnostic());
        }
        Ok(dump_lists_fingerprint(&out.stdout, &fingerprint))
    }
}

/// Lowercase SHA-1 hex of the first certificate in a PEM document.
fn sha1_fingerprint(pem_text: &str) -> Option<String> {
    first_der(pem_text).map(|der| hex::encode(Sha1::digest(der)))
}

/// True when any line of a certutil dump carries the given hash.
///
/// certutil prints hashes as spaced hex pairs ("d2 ab ..."), in varying
/// case across Windows versions, so each line is reduced to its hex
/// digits before comparing.
fn dump_lists_fingerprint(dump: &str, fingerprint: &str) -> bool {
    dump.lines().any(|line| {
        let hex_digits: String = line
            .chars()
            .filter(char::is_ascii_hexdigit)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        hex_digits.contains(fingerprint)
    })
}

impl Default for WindowsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrustStoreAdapter for WindowsAdapter {
    fn name(&self) -> StoreName {
        StoreName::Windows
    }

    async fn query(&self, cert: &CertContext) -> StoreStatus {
        match self.present(cert).await {
            Ok(true) => StoreStatus::trusted("certificate present in user Root store"),
            Ok(false) => StoreStatus::not_trusted("certificate absent from user Root store"),
            Err(e) => StoreStatus::unknown(format!("certutil store listing failed: {e}")),
        }
    }

    async fn add(&self, cert: &CertContext) -> StoreStatus {
        match self.present(cert).await {
            Ok(true) => return StoreStatus::trusted("already trusted in user Root store"),
            Ok(false) => {}
            Err(e) => return StoreStatus::unknown(format!("certutil store listing failed: {e}")),
        }

        let path = cert.certificate_path.to_string_lossy();
        let out = match run_command(
            "certutil",
            &["-user", "-addstore", "Root", path.as_ref()],
        )
        .await
        {
            Ok(out) => out,
            Err(e) => return StoreStatus::unknown(format!("certutil not runnable: {e}")),
        };

        if out.success {
            debug!("certificate added to Windows user Root store");
            StoreStatus::trusted("added to user Root store")
        } else if out.stdout.contains("already in store") || out.stderr.contains("already in store")
        {
            StoreStatus::trusted("already present in user Root store")
        } else {
            warn!(diagnostic = %out.diagnostic(), "certutil addstore failed");
            StoreStatus::not_trusted(format!("addstore failed: {}", out.diagnostic()))
        }
    }

    async fn remove(&self, cert: &CertContext) -> StoreStatus {
        match self.present(cert).await {
            Ok(false) => return StoreStatus::not_trusted("not present in user Root store"),
            Ok(true) => {}
            Err(e) => return StoreStatus::unknown(format!("certutil store listing failed: {e}")),
        }

        let out = match run_command(
            "certutil",
            &["-user", "-delstore", "Root", &cert.common_name],
        )
        .await
        {
            Ok(out) => out,
            Err(e) => return StoreStatus::unknown(format!("certutil not runnable: {e}")),
        };

        if out.success {
            StoreStatus::not_trusted("removed from user Root store")
        } else {
            StoreStatus::unknown(format!("delstore failed: {}", out.diagnostic()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::CertificateFactory;
    use chrono::Duration;
    use devca_core::SubjectAttributes;

    fn root_pem(common_name: &str) -> String {
        let subject = SubjectAttributes::new(common_name);
        CertificateFactory::create_root(&subject, Duration::days(100), 0)
            .unwrap()
            .certificate_pem
    }

    fn dump_with(fingerprint: &str) -> String {
        let spaced: String = fingerprint
            .as_bytes()
            .chunks(2)
            .map(|pair| format!("{} ", std::str::from_utf8(pair).unwrap().to_uppercase()))
            .collect();
        format!(
            "Root \"Trusted Root Certification Authorities\"\n\
             ================ Certificate 0 ================\n\
             Serial Number: 0c8a3d1f\n\
             Issuer: CN=Windows Test CA\n\
             Subject: CN=Windows Test CA\n\
             Cert Hash(sha1): {spaced}\n\
             No key provider information\n"
        )
    }

    #[test]
    fn test_fingerprint_found_in_certutil_dump() {
        let pem = root_pem("Windows Test CA");
        let fp = sha1_fingerprint(&pem).unwrap();
        assert!(dump_lists_fingerprint(&dump_with(&fp), &fp));
    }

    #[test]
    fn test_fingerprint_survives_pem_reflow() {
        let pem = root_pem("Windows Test CA");
        let reflowed = format!("{pem}\n\n");
        assert_eq!(sha1_fingerprint(&pem), sha1_fingerprint(&reflowed));
    }

    #[test]
    fn test_stale_root_with_same_subject_is_not_present() {
        // A regenerated authority keeps its common name; the dump of the
        // old root must not count as presence of the new one.
        let old = root_pem("Windows Test CA");
        let new = root_pem("Windows Test CA");
        let old_fp = sha1_fingerprint(&old).unwrap();
        let new_fp = sha1_fingerprint(&new).unwrap();

        assert_ne!(old_fp, new_fp);
        assert!(!dump_lists_fingerprint(&dump_with(&old_fp), &new_fp));
    }

    #[test]
    fn test_unparseable_pem_has_no_fingerprint() {
        assert!(sha1_fingerprint("not a certificate").is_none());
    }
}
