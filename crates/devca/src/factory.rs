//! Certificate construction: self-signed roots and CA-signed leaves.
//!
//! Pure generation, no I/O. The caller persists the results; the
//! [`crate::store::AuthorityStore`] owns all files.

use chrono::Duration;
use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose, IsCa,
    KeyPair, KeyUsagePurpose, SanType, SerialNumber,
};

use devca_core::{AltName, CaError, CertificateMaterial, Result, SubjectAttributes};

/// Backdate certificates slightly so machines with drifting clocks accept
/// a freshly issued certificate.
const CLOCK_SKEW: time::Duration = time::Duration::hours(1);

/// Parameters for one leaf issuance.
#[derive(Debug, Clone)]
pub struct LeafParams {
    /// Classified subject-alternative-names
    pub alt_names: Vec<AltName>,
    /// Leaf validity, already clamped by the caller
    pub validity: Duration,
    /// Serial number allocated by the authority store
    pub serial: u64,
    /// Common name; defaults to the first alt-name value
    pub common_name: Option<String>,
    /// Organization override for the leaf subject
    pub organization: Option<String>,
}

/// Builds root and leaf certificates.
pub struct CertificateFactory;

impl CertificateFactory {
    /// Generate a fresh self-signed root CA certificate.
    ///
    /// The root carries critical CA basic constraints and
    /// {keyCertSign, cRLSign, digitalSignature} key usages, and is signed
    /// with its own newly generated key (ECDSA P-256 / SHA-256).
    pub fn create_root(
        subject: &SubjectAttributes,
        validity: Duration,
        serial: u64,
    ) -> Result<CertificateMaterial> {
        let key_pair = KeyPair::generate().map_err(certificate_error)?;

        let mut params = CertificateParams::default();
        params.distinguished_name = distinguished_name(subject);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        params.serial_number = Some(SerialNumber::from(serial));

        let now = time::OffsetDateTime::now_utc();
        params.not_before = now - CLOCK_SKEW;
        params.not_after = now + to_time_duration(validity)?;

        let certificate = params.self_signed(&key_pair).map_err(certificate_error)?;

        Ok(CertificateMaterial {
            certificate_pem: certificate.pem(),
            private_key_pem: key_pair.serialize_pem(),
        })
    }

    /// Issue a leaf certificate signed by the given authority.
    ///
    /// The issuer parameters are recovered from the persisted root
    /// certificate itself, so the leaf's issuer attributes equal the
    /// root's subject bitwise at issuance time.
    pub fn issue_leaf(
        issuer_certificate_pem: &str,
        issuer_private_key_pem: &str,
        leaf: &LeafParams,
    ) -> Result<CertificateMaterial> {
        if leaf.alt_names.is_empty() {
            return Err(CaError::Certificate(
                "leaf certificate requires at least one alt-name".to_string(),
            ));
        }

        let issuer_key = KeyPair::from_pem(issuer_private_key_pem).map_err(certificate_error)?;
        let issuer_params = CertificateParams::from_ca_cert_pem(issuer_certificate_pem)
            .map_err(certificate_error)?;
        let issuer_cert = issuer_params
            .self_signed(&issuer_key)
            .map_err(certificate_error)?;

        let key_pair = KeyPair::generate().map_err(certificate_error)?;

        let common_name = leaf
            .common_name
            .clone()
            .unwrap_or_else(|| leaf.alt_names[0].value());

        let mut params = CertificateParams::default();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, common_name);
        if let Some(org) = &leaf.organization {
            dn.push(DnType::OrganizationName, org);
        }
        params.distinguished_name = dn;

        params.is_ca = IsCa::NoCa;
        params.key_usages = vec![
            KeyUsagePurpose::DigitalSignature,
            KeyUsagePurpose::KeyEncipherment,
        ];
        params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
        params.use_authority_key_identifier_extension = true;
        params.serial_number = Some(SerialNumber::from(leaf.serial));
        params.subject_alt_names = san_entries(&leaf.alt_names)?;

        let now = time::OffsetDateTime::now_utc();
        params.not_before = now - CLOCK_SKEW;
        params.not_after = now + to_time_duration(leaf.validity)?;

        let certificate = params
            .signed_by(&key_pair, &issuer_cert, &issuer_key)
            .map_err(certificate_error)?;

        Ok(CertificateMaterial {
            certificate_pem: certificate.pem(),
            private_key_pem: key_pair.serialize_pem(),
        })
    }
}

fn distinguished_name(subject: &SubjectAttributes) -> DistinguishedName {
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, &subject.common_name);
    if let Some(c) = &subject.country {
        dn.push(DnType::CountryName, c);
    }
    if let Some(st) = &subject.state {
        dn.push(DnType::StateOrProvinceName, st);
    }
    if let Some(l) = &subject.locality {
        dn.push(DnType::LocalityName, l);
    }
    if let Some(o) = &subject.organization {
        dn.push(DnType::OrganizationName, o);
    }
    if let Some(ou) = &subject.organizational_unit {
        dn.push(DnType::OrganizationalUnitName, ou);
    }
    dn
}

fn san_entries(alt_names: &[AltName]) -> Result<Vec<SanType>> {
    let mut out = Vec::with_capacity(alt_names.len());
    for name in alt_names {
        let entry = match name {
            AltName::Dns(dns) => SanType::DnsName(dns.as_str().try_into().map_err(|e| {
                CaError::Certificate(format!("invalid DNS alt-name '{dns}': {e}"))
            })?),
            AltName::Ip(ip) => SanType::IpAddress(*ip),
            AltName::Uri(uri) => SanType::URI(uri.as_str().try_into().map_err(|e| {
                CaError::Certificate(format!("invalid URI alt-name '{uri}': {e}"))
            })?),
        };
        out.push(entry);
    }
    Ok(out)
}

fn to_time_duration(d: Duration) -> Result<time::Duration> {
    if d <= Duration::zero() {
        return Err(CaError::InvalidDuration(
            "validity must be positive".to_string(),
        ));
    }
    Ok(time::Duration::milliseconds(d.num_milliseconds()))
}

fn certificate_error(e: impl std::fmt::Display) -> CaError {
    CaError::Certificate(e.to_string())
}
