use bon::Builder;
use der::flagset::FlagSet;
use time::{Duration, OffsetDateTime};

use crate::cert::Certificate;
use crate::cert::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, ExtendedKeyUsageOption, Extension,
    KeyUsage, KeyUsages, SubjectKeyIdentifier,
};
use crate::cert::name::DistinguishedName;
use crate::error::{Result, X509KitError};
use crate::key::KeyPair;
use crate::pki::DigestAlgorithm;

/// Parameters for building an X.509 certificate.
///
/// # Fields
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_public_key` - The subject's key; only the public half is used.
/// * `usages` - A list of extended key usage options.
/// * `is_ca` - Indicates if the certificate is a CA.
/// * `path_length` - basicConstraints path length for CA certificates.
/// * `extensions` - Additional X.509 extensions, placed before the generated ones.
/// * `digest` - Digest used for the signature (ignored by Ed25519).
#[derive(Clone, Debug, Builder)]
pub struct CertificationRequestInfo {
    pub subject: DistinguishedName,
    pub subject_public_key: KeyPair,
    #[builder(default)]
    pub usages: Vec<ExtendedKeyUsageOption>,
    #[builder(default)]
    pub is_ca: bool,
    pub path_length: Option<u8>,
    #[builder(default)]
    pub extensions: Vec<Extension>,
    #[builder(default = DigestAlgorithm::Sha256)]
    pub digest: DigestAlgorithm,
}

/// Certificate validity period.
///
/// # Fields
/// * `not_before` - The start of the validity period.
/// * `not_after` - The end of the validity period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period starting now for the given number of days.
    pub fn for_days(days: i64) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            not_before: now,
            not_after: now + Duration::days(days),
        }
    }
}

fn key_identifier(key: &KeyPair) -> Result<Vec<u8>> {
    let public = key.public_key().ok_or(X509KitError::UninitializedKey)?;
    let spki = public.to_spki()?;
    Ok(SubjectKeyIdentifier::from_public_key_bits(spki.subject_public_key.raw_bytes()).0)
}

fn key_usage_flags(request: &CertificationRequestInfo) -> FlagSet<KeyUsages> {
    let mut flags: FlagSet<KeyUsages> = FlagSet::empty();
    if request.is_ca {
        flags |= KeyUsages::KeyCertSign;
        flags |= KeyUsages::CRLSign;
    }
    for usage in &request.usages {
        match usage {
            ExtendedKeyUsageOption::ClientAuth
            | ExtendedKeyUsageOption::ServerAuth
            | ExtendedKeyUsageOption::EmailProtection => {
                flags |= KeyUsages::DigitalSignature;
                flags |= KeyUsages::KeyEncipherment;
            }
            ExtendedKeyUsageOption::CodeSigning
            | ExtendedKeyUsageOption::TimeStamping
            | ExtendedKeyUsageOption::OcspSigning => {
                flags |= KeyUsages::DigitalSignature;
            }
        }
    }
    flags
}

/// Represents an entity capable of issuing certificates.
pub trait Issuer {
    /// Returns the distinguished name of the issuer.
    fn issuer_name(&self) -> DistinguishedName;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// Issues a v3 certificate for `cert_request` with a random serial number.
    ///
    /// The request's extensions come first, followed by basicConstraints,
    /// subjectKeyIdentifier, authorityKeyIdentifier and, when the request
    /// calls for them, keyUsage and extendedKeyUsage.
    fn issue(&self, cert_request: &CertificationRequestInfo, validity: Validity) -> Result<Certificate> {
        let mut cert = Certificate::new();
        cert.set_version(2);
        cert.set_serial_number(Certificate::random_serial_number());
        cert.set_issuer(&self.issuer_name());
        cert.set_subject(&cert_request.subject);
        cert.set_public_key(&cert_request.subject_public_key)?;
        cert.set_not_before_instant(validity.not_before)?;
        cert.set_not_after_instant(validity.not_after)?;

        let basic_constraints = BasicConstraints {
            is_ca: cert_request.is_ca,
            max_path_length: if cert_request.is_ca { cert_request.path_length } else { None },
        };
        let authority_key_id = AuthorityKeyIdentifier {
            key_identifier: Some(key_identifier(self.signing_key())?),
            ..Default::default()
        };

        let mut extensions = cert_request.extensions.clone();
        extensions.push(Extension::from_extension(&basic_constraints, true)?);
        extensions.push(Extension::from_extension(
            &SubjectKeyIdentifier(key_identifier(&cert_request.subject_public_key)?),
            false,
        )?);
        extensions.push(Extension::from_extension(&authority_key_id, false)?);

        let key_usage_flags = key_usage_flags(cert_request);
        if !key_usage_flags.is_empty() {
            extensions.push(Extension::from_extension(&KeyUsage(key_usage_flags), true)?);
        }
        if !cert_request.usages.is_empty() {
            let extended_key_usage = ExtendedKeyUsage {
                usage: cert_request.usages.clone(),
            };
            extensions.push(Extension::from_extension(&extended_key_usage, false)?);
        }
        cert.add_extensions(extensions);

        cert.sign(self.signing_key(), cert_request.digest.name())?;
        Ok(cert)
    }
}

// Helper struct for self-signed certificates
struct SelfIssuer<'a> {
    name: DistinguishedName,
    key: &'a KeyPair,
}

impl Issuer for SelfIssuer<'_> {
    fn issuer_name(&self) -> DistinguishedName {
        self.name.clone()
    }

    fn signing_key(&self) -> &KeyPair {
        self.key
    }
}

impl Certificate {
    /// Issues a certificate for `cert_info` signed by its own key.
    ///
    /// # Errors
    /// `PublicKeyOnly` when `key` cannot sign.
    pub fn new_self_signed(
        cert_info: &CertificationRequestInfo,
        key: &KeyPair,
        validity: Validity,
    ) -> Result<Self> {
        let self_issuer = SelfIssuer {
            name: cert_info.subject.clone(),
            key,
        };
        self_issuer.issue(cert_info, validity)
    }
}

/// A certificate together with the key that signs on its behalf.
#[derive(Debug, Clone)]
pub struct CertificateWithPrivateKey {
    pub cert: Certificate,
    pub key: KeyPair,
}

impl Issuer for CertificateWithPrivateKey {
    fn issuer_name(&self) -> DistinguishedName {
        // The name of the issuer is the subject of the certificate
        self.cert.subject().to_owned_name()
    }

    fn signing_key(&self) -> &KeyPair {
        &self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::extensions::{AUTHORITY_KEY_IDENTIFIER, SUBJECT_KEY_IDENTIFIER};

    fn request(cn: &str, key: &KeyPair, is_ca: bool) -> CertificationRequestInfo {
        CertificationRequestInfo::builder()
            .subject(
                DistinguishedName::builder()
                    .common_name(cn.to_string())
                    .build()
                    .unwrap(),
            )
            .subject_public_key(key.public_only())
            .is_ca(is_ca)
            .usages(vec![ExtendedKeyUsageOption::ServerAuth])
            .build()
    }

    #[test]
    fn self_signed_ca_links_its_own_key() {
        let key = KeyPair::generate_ecdsa_p256();
        let ca = Certificate::new_self_signed(&request("ca", &key, true), &key, Validity::for_days(30))
            .unwrap();

        assert_eq!(ca.version(), 2);
        assert!(ca.is_self_issued());
        let ski = ca
            .find_extension(SUBJECT_KEY_IDENTIFIER)
            .unwrap()
            .decode::<SubjectKeyIdentifier>()
            .unwrap();
        let aki = ca
            .find_extension(AUTHORITY_KEY_IDENTIFIER)
            .unwrap()
            .decode::<AuthorityKeyIdentifier>()
            .unwrap();
        assert_eq!(aki.key_identifier, Some(ski.0));
        ca.verify_signature(key.public_key().unwrap()).unwrap();
    }

    #[test]
    fn issued_certificate_is_signed_by_the_ca() {
        let ca_key = KeyPair::generate_ed25519();
        let ca = CertificateWithPrivateKey {
            cert: Certificate::new_self_signed(&request("ca", &ca_key, true), &ca_key, Validity::for_days(30))
                .unwrap(),
            key: ca_key.clone(),
        };
        let leaf_key = KeyPair::generate_ecdsa_p384();
        let leaf = ca
            .issue(&request("leaf", &leaf_key, false), Validity::for_days(7))
            .unwrap();

        assert!(leaf.issuer().matches(ca.cert.subject()));
        assert_eq!(leaf.signature_algorithm().unwrap(), "ED25519");
        leaf.verify_signature(ca_key.public_key().unwrap()).unwrap();
        let usage = leaf
            .extensions()
            .iter()
            .find_map(|ext| ext.decode::<KeyUsage>().ok())
            .unwrap();
        assert!(!usage.0.contains(KeyUsages::KeyCertSign));
    }

    #[test]
    fn public_only_issuer_cannot_issue() {
        let ca_key = KeyPair::generate_ecdsa_p256();
        let result = Certificate::new_self_signed(
            &request("ca", &ca_key, true),
            &ca_key.public_only(),
            Validity::for_days(1),
        );
        assert_eq!(result.unwrap_err(), X509KitError::PublicKeyOnly);
    }
}
