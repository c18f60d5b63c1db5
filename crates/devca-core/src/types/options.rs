//! Caller-facing configuration knobs.

use chrono::Duration;

use super::certificate::SubjectAttributes;

/// Default authority common name
pub const DEFAULT_CA_COMMON_NAME: &str = "devca Local Development CA";

/// Default authority organization
pub const DEFAULT_CA_ORGANIZATION: &str = "devca";

/// Default root validity (10 years; clamped to 25 at most)
pub const DEFAULT_ROOT_VALIDITY_DAYS: i64 = 3650;

/// Default leaf validity (clamped to 397 days at most)
pub const DEFAULT_LEAF_VALIDITY_DAYS: i64 = 365;

/// Default fraction of remaining lifetime below which the authority is
/// considered about to expire
pub const DEFAULT_ABOUT_TO_EXPIRE_RATIO: f64 = 0.05;

/// Options controlling authority creation, reuse, and trust provisioning.
#[derive(Debug, Clone)]
pub struct AuthorityOptions {
    /// Subject attributes for the root certificate
    pub subject: SubjectAttributes,

    /// Requested root validity; clamped to the 25-year maximum
    pub validity: Duration,

    /// Remaining-lifetime fraction that triggers early regeneration
    pub about_to_expire_ratio: f64,

    /// Attempt to add the authority to every applicable trust store
    pub try_to_trust: bool,

    /// Allow installing the NSS command-line tool via a package manager
    /// when it is missing. Off by default; declined installs are reported
    /// as `unknown`, never performed silently.
    pub nss_dynamic_install: bool,
}

impl Default for AuthorityOptions {
    fn default() -> Self {
        let mut subject = SubjectAttributes::new(DEFAULT_CA_COMMON_NAME);
        subject.organization = Some(DEFAULT_CA_ORGANIZATION.to_string());
        Self {
            subject,
            validity: Duration::days(DEFAULT_ROOT_VALIDITY_DAYS),
            about_to_expire_ratio: DEFAULT_ABOUT_TO_EXPIRE_RATIO,
            try_to_trust: false,
            nss_dynamic_install: false,
        }
    }
}

/// A request for a leaf certificate covering a set of local hostnames.
#[derive(Debug, Clone)]
pub struct CertificateRequest {
    /// Requested alt-names; `localhost` is always appended if absent
    pub alt_names: Vec<String>,

    /// Common name override; defaults to the first alt-name
    pub common_name: Option<String>,

    /// Organization override for the leaf subject
    pub organization: Option<String>,

    /// Requested leaf validity; clamped to the 397-day maximum
    pub validity: Duration,
}

impl Default for CertificateRequest {
    fn default() -> Self {
        Self {
            alt_names: Vec::new(),
            common_name: None,
            organization: None,
            validity: Duration::days(DEFAULT_LEAF_VALIDITY_DAYS),
        }
    }
}

impl CertificateRequest {
    /// Request for the given hostnames with default validity
    #[must_use]
    pub fn for_hostnames<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            alt_names: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}
