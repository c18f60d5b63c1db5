//! Subject attributes, alt-name classification, and certificate material.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Ordered X.509 subject attributes for a certificate.
///
/// Only the common name is mandatory. Field order here is the order the
/// attributes are pushed into the distinguished name, so two subjects built
/// from equal values compare bitwise equal after encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectAttributes {
    /// Common name (CN)
    pub common_name: String,
    /// Two-letter country code (C)
    #[serde(default)]
    pub country: Option<String>,
    /// State or province (ST)
    #[serde(default)]
    pub state: Option<String>,
    /// Locality/city (L)
    #[serde(default)]
    pub locality: Option<String>,
    /// Organization (O)
    #[serde(default)]
    pub organization: Option<String>,
    /// Organizational unit (OU)
    #[serde(default)]
    pub organizational_unit: Option<String>,
}

impl SubjectAttributes {
    /// Subject with only a common name set
    #[must_use]
    pub fn new(common_name: impl Into<String>) -> Self {
        Self {
            common_name: common_name.into(),
            ..Self::default()
        }
    }

    /// Attributes as ordered (key, value) pairs, skipping unset fields
    #[must_use]
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        let mut out = vec![("CN", self.common_name.as_str())];
        if let Some(c) = &self.country {
            out.push(("C", c.as_str()));
        }
        if let Some(st) = &self.state {
            out.push(("ST", st.as_str()));
        }
        if let Some(l) = &self.locality {
            out.push(("L", l.as_str()));
        }
        if let Some(o) = &self.organization {
            out.push(("O", o.as_str()));
        }
        if let Some(ou) = &self.organizational_unit {
            out.push(("OU", ou.as_str()));
        }
        out
    }
}

/// A subject-alternative-name entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum AltName {
    /// DNS hostname
    Dns(String),
    /// IP address literal
    Ip(IpAddr),
    /// URI
    Uri(String),
}

impl AltName {
    /// Classify a raw alt-name string.
    ///
    /// IP literals become [`AltName::Ip`], anything with a scheme separator
    /// becomes [`AltName::Uri`], everything else is a DNS name.
    #[must_use]
    pub fn classify(raw: &str) -> Self {
        if let Ok(ip) = raw.parse::<IpAddr>() {
            return Self::Ip(ip);
        }
        if raw.contains("://") {
            return Self::Uri(raw.to_string());
        }
        Self::Dns(raw.to_string())
    }

    /// The raw value as entered
    #[must_use]
    pub fn value(&self) -> String {
        match self {
            Self::Dns(d) | Self::Uri(d) => d.clone(),
            Self::Ip(ip) => ip.to_string(),
        }
    }
}

/// PEM-encoded certificate and matching private key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateMaterial {
    /// PEM-encoded certificate
    pub certificate_pem: String,
    /// PEM-encoded private key
    pub private_key_pem: String,
}
