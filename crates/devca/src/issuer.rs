//! Leaf certificate issuance against the persisted authority.
//!
//! Issuance never creates an authority implicitly: a missing root is an
//! error telling the caller to install first. `localhost` is always
//! covered, whether or not the caller asked for it.

use tracing::{debug, warn};

use devca_core::{
    clamp_leaf_duration, AltName, CaError, CertificateRequest, Result,
};
use std::path::PathBuf;

use crate::factory::{CertificateFactory, LeafParams};
use crate::store::AuthorityStore;

/// Name every issued leaf covers.
const IMPLICIT_HOSTNAME: &str = "localhost";

/// An issued leaf certificate with its chain context.
#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    /// PEM leaf certificate
    pub certificate_pem: String,
    /// PEM leaf private key
    pub private_key_pem: String,
    /// Serial number allocated for this leaf
    pub serial: u64,
    /// Names the certificate actually covers, implicit ones included
    pub covered_names: Vec<String>,
    /// Path to the signing root certificate, for servers that serve the
    /// chain or for manual trust instructions
    pub authority_certificate_path: PathBuf,
}

/// Issues leaves signed by the persisted root authority.
pub struct LeafCertificateIssuer<'a> {
    store: &'a AuthorityStore,
}

impl<'a> LeafCertificateIssuer<'a> {
    /// Issuer over the given authority store.
    #[must_use]
    pub const fn new(store: &'a AuthorityStore) -> Self {
        Self { store }
    }

    /// Issue a leaf certificate for the requested names.
    pub fn issue(&self, request: &CertificateRequest) -> Result<IssuedCertificate> {
        let authority = self.store.load().ok_or_else(|| {
            CaError::AuthorityMissing(
                "no certificate authority found; install one before requesting certificates"
                    .to_string(),
            )
        })?;

        let names = with_implicit_localhost(&request.alt_names);
        let clamped = clamp_leaf_duration(request.validity)?;
        if let Some(message) = &clamped.message {
            warn!("{message}");
        }

        let serial = self.store.bump_serial()?;

        let leaf = LeafParams {
            alt_names: names.iter().map(|n| AltName::classify(n)).collect(),
            validity: clamped.effective,
            serial,
            common_name: request.common_name.clone(),
            organization: request.organization.clone(),
        };
        let material = CertificateFactory::issue_leaf(
            &authority.certificate_pem,
            &authority.private_key_pem,
            &leaf,
        )?;

        debug!(serial, names = ?names, "leaf certificate issued");
        Ok(IssuedCertificate {
            certificate_pem: material.certificate_pem,
            private_key_pem: material.private_key_pem,
            serial,
            covered_names: names,
            authority_certificate_path: self.store.locate().certificate_path,
        })
    }
}

fn with_implicit_localhost(requested: &[String]) -> Vec<String> {
    let mut names: Vec<String> = requested.to_vec();
    if !names.iter().any(|n| n.eq_ignore_ascii_case(IMPLICIT_HOSTNAME)) {
        names.push(IMPLICIT_HOSTNAME.to_string());
    }
    names
}
