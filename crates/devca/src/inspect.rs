//! Read-back inspection of persisted certificates.
//!
//! The lifecycle manager decides reuse vs. regeneration from the persisted
//! root's validity window and subject attributes, parsed with x509-parser.

use chrono::{DateTime, TimeZone, Utc};

use devca_core::{CaError, Result, SubjectAttributes};

/// The fields of a persisted certificate the lifecycle manager cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateFacts {
    /// Start of the validity window
    pub not_before: DateTime<Utc>,
    /// End of the validity window
    pub not_after: DateTime<Utc>,
    /// Subject attributes as persisted
    pub subject: SubjectAttributes,
    /// Serial number bytes, big-endian
    pub serial: Vec<u8>,
}

impl CertificateFacts {
    /// Remaining lifetime relative to now; negative when expired
    #[must_use]
    pub fn remaining(&self) -> chrono::Duration {
        self.not_after - Utc::now()
    }

    /// Total validity window length
    #[must_use]
    pub fn total(&self) -> chrono::Duration {
        self.not_after - self.not_before
    }
}

/// Parse a PEM certificate into [`CertificateFacts`].
pub fn inspect_certificate_pem(pem_text: &str, source: &str) -> Result<CertificateFacts> {
    let (_, parsed) =
        x509_parser::pem::parse_x509_pem(pem_text.as_bytes()).map_err(|e| CaError::Pem {
            path: source.to_string(),
            reason: e.to_string(),
        })?;
    let cert = parsed.parse_x509().map_err(|e| CaError::Pem {
        path: source.to_string(),
        reason: e.to_string(),
    })?;

    let subject = extract_subject(cert.subject());

    Ok(CertificateFacts {
        not_before: asn1_to_utc(cert.validity().not_before),
        not_after: asn1_to_utc(cert.validity().not_after),
        subject,
        serial: cert.serial.to_bytes_be(),
    })
}

/// Compare two PEM certificates by their DER bytes.
///
/// PEM text can differ in line wrapping and trailing whitespace while
/// encoding the same certificate.
#[must_use]
pub fn same_certificate(a_pem: &str, b_pem: &str) -> bool {
    match (first_der(a_pem), first_der(b_pem)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// True when any certificate in a PEM bundle matches `cert_pem` by DER.
///
/// Keychain and NSS tools dump whole bundles; membership has to be
/// decided on the decoded bytes, not on PEM text.
#[must_use]
pub fn bundle_contains_certificate(bundle_pem: &str, cert_pem: &str) -> bool {
    let Some(target) = first_der(cert_pem) else {
        return false;
    };
    pem::parse_many(bundle_pem.as_bytes())
        .map(|pems| {
            pems.iter()
                .filter(|p| p.tag() == "CERTIFICATE")
                .any(|p| p.contents() == target.as_slice())
        })
        .unwrap_or(false)
}

/// First certificate in a PEM document, decoded to DER bytes.
pub(crate) fn first_der(pem_text: &str) -> Option<Vec<u8>> {
    pem::parse_many(pem_text.as_bytes())
        .ok()?
        .into_iter()
        .find(|p| p.tag() == "CERTIFICATE")
        .map(|p| p.contents().to_vec())
}

fn extract_subject(name: &x509_parser::x509::X509Name<'_>) -> SubjectAttributes {
    SubjectAttributes {
        common_name: first_attr(name.iter_common_name()).unwrap_or_default(),
        country: first_attr(name.iter_country()),
        state: first_attr(name.iter_state_or_province()),
        locality: first_attr(name.iter_locality()),
        organization: first_attr(name.iter_organization()),
        organizational_unit: first_attr(name.iter_organizational_unit()),
    }
}

fn first_attr<'a>(
    mut iter: impl Iterator<Item = &'a x509_parser::x509::AttributeTypeAndValue<'a>>,
) -> Option<String> {
    iter.next()
        .and_then(|a| a.as_str().ok().map(ToString::to_string))
}

/// Convert an ASN.1 `GeneralizedTime` / `UTCTime` to `DateTime<Utc>`.
fn asn1_to_utc(t: x509_parser::time::ASN1Time) -> DateTime<Utc> {
    let epoch = t.timestamp();
    Utc.timestamp_opt(epoch, 0).single().unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::CertificateFactory;
    use chrono::Duration;

    fn subject() -> SubjectAttributes {
        let mut s = SubjectAttributes::new("Inspect Test CA");
        s.organization = Some("Inspect Org".to_string());
        s
    }

    #[test]
    fn test_roundtrip_subject_and_window() {
        let root =
            CertificateFactory::create_root(&subject(), Duration::days(100), 0).unwrap();
        let facts = inspect_certificate_pem(&root.certificate_pem, "test").unwrap();

        assert_eq!(facts.subject.common_name, "Inspect Test CA");
        assert_eq!(facts.subject.organization.as_deref(), Some("Inspect Org"));
        assert!(facts.not_after > facts.not_before);
        // 100 days plus the one-hour backdate skew
        assert!(facts.total() >= Duration::days(100));
        assert!(facts.total() < Duration::days(101));
    }

    #[test]
    fn test_same_certificate_compares_der() {
        let root =
            CertificateFactory::create_root(&subject(), Duration::days(100), 0).unwrap();
        let other =
            CertificateFactory::create_root(&subject(), Duration::days(100), 0).unwrap();

        let reflowed = format!("{}\n\n", root.certificate_pem);
        assert!(same_certificate(&root.certificate_pem, &reflowed));
        assert!(!same_certificate(&root.certificate_pem, &other.certificate_pem));
    }

    #[test]
    fn test_bundle_membership() {
        let a = CertificateFactory::create_root(&subject(), Duration::days(100), 0).unwrap();
        let b = CertificateFactory::create_root(&subject(), Duration::days(100), 0).unwrap();
        let bundle = format!("{}\n{}", a.certificate_pem, b.certificate_pem);

        assert!(bundle_contains_certificate(&bundle, &a.certificate_pem));
        assert!(bundle_contains_certificate(&bundle, &b.certificate_pem));

        let c = CertificateFactory::create_root(&subject(), Duration::days(100), 0).unwrap();
        assert!(!bundle_contains_certificate(&bundle, &c.certificate_pem));
    }

    #[test]
    fn test_garbage_pem_is_an_error() {
        assert!(matches!(
            inspect_certificate_pem("not a certificate", "test"),
            Err(CaError::Pem { .. })
        ));
    }
}
