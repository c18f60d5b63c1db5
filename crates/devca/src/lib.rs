//! Locally-trusted development certificates: a per-user root CA, leaf
//! issuance for local hostnames, and reconciliation of the root across
//! the operating system and browser trust stores.
//!
//! The high-level entry points cover the whole lifecycle:
//!
//! - [`install_certificate_authority`] ensures a valid root exists
//!   (creating or regenerating as needed) and optionally pushes it into
//!   every applicable trust store
//! - [`request_certificate_for_localhost`] issues a leaf for a set of local hostnames,
//!   signed by that root
//! - [`uninstall_certificate_authority`] withdraws the root from every
//!   store and deletes its files
//!
//! # Example
//!
//! ```rust,ignore
//! use devca::{install_certificate_authority, request_certificate_for_localhost};
//! use devca_core::{AuthorityOptions, CertificateRequest};
//!
//! # async fn run() -> devca_core::Result<()> {
//! let mut options = AuthorityOptions::default();
//! options.try_to_trust = true;
//! install_certificate_authority(&options).await?;
//!
//! let issued = request_certificate_for_localhost(&CertificateRequest::for_hostnames([
//!     "myapp.local",
//! ]))?;
//! println!("{}", issued.certificate_pem);
//! # Ok(())
//! # }
//! ```

pub mod factory;
pub mod inspect;
pub mod issuer;
pub mod lifecycle;
pub mod store;
pub mod trust;

pub use factory::{CertificateFactory, LeafParams};
pub use inspect::{inspect_certificate_pem, CertificateFacts};
pub use issuer::{IssuedCertificate, LeafCertificateIssuer};
pub use lifecycle::{AuthorityState, CaLifecycleManager, EnsuredAuthority};
pub use store::{AuthorityPaths, AuthorityRecord, AuthorityStore, DEFAULT_AUTHORITY_NAME};
pub use trust::{
    adapters_for, CertContext, DetectionCache, Platform, TrustEngine, TrustStoreAdapter,
};

use std::path::Path;
use std::sync::Arc;

use devca_core::{AuthorityOptions, CertificateRequest, Result, TrustReport};

/// Lifecycle manager wired for the current platform and default state
/// location.
pub fn default_lifecycle_manager(options: AuthorityOptions) -> Result<CaLifecycleManager> {
    let store = AuthorityStore::new(DEFAULT_AUTHORITY_NAME)?;
    let cache = Arc::new(DetectionCache::new());
    let engine = TrustEngine::new(adapters_for(
        Platform::current(),
        &cache,
        options.nss_dynamic_install,
    ));
    Ok(CaLifecycleManager::new(store, engine, options))
}

/// Ensure a valid root authority exists and reconcile its trust state.
pub async fn install_certificate_authority(
    options: &AuthorityOptions,
) -> Result<EnsuredAuthority> {
    default_lifecycle_manager(options.clone())?
        .ensure_authority()
        .await
}

/// Withdraw the root authority from every store and delete its files.
pub async fn uninstall_certificate_authority(options: &AuthorityOptions) -> Result<TrustReport> {
    default_lifecycle_manager(options.clone())?.uninstall().await
}

/// Issue a leaf certificate signed by the persisted root. The returned
/// certificate always covers `localhost` in addition to the requested
/// names.
///
/// Fails with [`devca_core::CaError::AuthorityMissing`] when no authority
/// has been installed.
pub fn request_certificate_for_localhost(
    request: &CertificateRequest,
) -> Result<IssuedCertificate> {
    let store = AuthorityStore::new(DEFAULT_AUTHORITY_NAME)?;
    LeafCertificateIssuer::new(&store).issue(request)
}

/// Step-by-step instructions for trusting the root by hand, for stores
/// the engine could not reach.
#[must_use]
pub fn manual_trust_instructions(platform: Platform, certificate_path: &Path) -> String {
    let path = certificate_path.display();
    match platform {
        Platform::MacOs => format!(
            "Open Keychain Access, import {path} into the login keychain, then set \
             \"Secure Sockets Layer (SSL)\" to \"Always Trust\" in the certificate's \
             trust settings."
        ),
        Platform::Linux => format!(
            "Copy {path} into /usr/local/share/ca-certificates/ with a .crt extension \
             and run `sudo update-ca-certificates`."
        ),
        Platform::Windows => format!(
            "Run `certutil -user -addstore Root \"{path}\"` from a command prompt, or \
             import the file via certmgr.msc into Trusted Root Certification Authorities."
        ),
        Platform::Unsupported => format!(
            "Import {path} as a trusted root certificate using your operating system's \
             certificate manager."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_instructions_mention_the_file() {
        let path = Path::new("/tmp/devca.crt");
        for platform in [
            Platform::MacOs,
            Platform::Linux,
            Platform::Windows,
            Platform::Unsupported,
        ] {
            let text = manual_trust_instructions(platform, path);
            assert!(text.contains("/tmp/devca.crt"));
        }
    }
}
