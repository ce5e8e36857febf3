use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use const_oid::AssociatedOid;
use der::{
    Decode, Encode,
    asn1::{Ia5String, OctetString},
    oid::ObjectIdentifier,
};
use x509_cert::ext::pkix::name::GeneralName;

use super::name::DistinguishedName;
use crate::error::{Result, X509KitError};

pub const SUBJECT_ALT_NAME: ObjectIdentifier = x509_cert::ext::pkix::SubjectAltName::OID;
pub const BASIC_CONSTRAINTS: ObjectIdentifier = x509_cert::ext::pkix::BasicConstraints::OID;
pub const KEY_USAGE: ObjectIdentifier = <x509_cert::ext::pkix::KeyUsage as AssociatedOid>::OID;
pub const EXTENDED_KEY_USAGE: ObjectIdentifier = x509_cert::ext::pkix::ExtendedKeyUsage::OID;
pub const SUBJECT_KEY_IDENTIFIER: ObjectIdentifier =
    x509_cert::ext::pkix::SubjectKeyIdentifier::OID;
pub const AUTHORITY_KEY_IDENTIFIER: ObjectIdentifier =
    x509_cert::ext::pkix::AuthorityKeyIdentifier::OID;
pub const CRL_DISTRIBUTION_POINTS: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.31");
pub const CERTIFICATE_POLICIES: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.32");
pub const POLICY_MAPPINGS: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.33");
pub const NAME_CONSTRAINTS: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.30");
pub const POLICY_CONSTRAINTS: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.36");
pub const INHIBIT_ANY_POLICY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.54");
pub const ISSUER_ALT_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.18");
pub const AUTHORITY_INFO_ACCESS: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.1.1");
pub const CRL_NUMBER: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.20");

/// A single X.509v3 extension: an OID, a critical flag and the DER-encoded value.
///
/// Certificates hold and hand out independent copies of these.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extension {
    oid: ObjectIdentifier,
    critical: bool,
    value: Vec<u8>,
}

impl Extension {
    pub fn new(oid: ObjectIdentifier, critical: bool, value: Vec<u8>) -> Self {
        Extension {
            oid,
            critical,
            value,
        }
    }

    /// Encodes a typed extension.
    ///
    /// # Example
    /// ```
    /// use x509kit::cert::extensions::{BasicConstraints, Extension};
    /// let ext = Extension::from_extension(&BasicConstraints { is_ca: true, max_path_length: None }, true).unwrap();
    /// assert_eq!(ext.short_name(), "basicConstraints");
    /// assert!(ext.critical());
    /// ```
    pub fn from_extension<E: ToAndFromX509Extension>(extension: &E, critical: bool) -> Result<Self> {
        Ok(Extension {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    /// Decodes this extension as `E`.
    ///
    /// # Errors
    /// `InvalidType` if the extension is not an `E`.
    pub fn decode<E: ToAndFromX509Extension>(&self) -> Result<E> {
        if self.oid != E::OID {
            return Err(X509KitError::InvalidType(format!(
                "extension {} is not {}",
                self.short_name(),
                E::OID
            )));
        }
        E::from_x509_extension_value(&self.value)
    }

    pub fn oid(&self) -> ObjectIdentifier {
        self.oid
    }

    pub fn critical(&self) -> bool {
        self.critical
    }

    pub fn set_critical(&mut self, critical: bool) {
        self.critical = critical;
    }

    /// DER-encoded extension value, without the wrapping OCTET STRING.
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// OpenSSL short name of the extension type, `"UNDEF"` when not known.
    pub fn short_name(&self) -> &'static str {
        match self.oid {
            SUBJECT_ALT_NAME => "subjectAltName",
            BASIC_CONSTRAINTS => "basicConstraints",
            KEY_USAGE => "keyUsage",
            EXTENDED_KEY_USAGE => "extendedKeyUsage",
            SUBJECT_KEY_IDENTIFIER => "subjectKeyIdentifier",
            AUTHORITY_KEY_IDENTIFIER => "authorityKeyIdentifier",
            CRL_DISTRIBUTION_POINTS => "crlDistributionPoints",
            CERTIFICATE_POLICIES => "certificatePolicies",
            POLICY_MAPPINGS => "policyMappings",
            NAME_CONSTRAINTS => "nameConstraints",
            POLICY_CONSTRAINTS => "policyConstraints",
            INHIBIT_ANY_POLICY => "inhibitAnyPolicy",
            ISSUER_ALT_NAME => "issuerAltName",
            AUTHORITY_INFO_ACCESS => "authorityInfoAccess",
            CRL_NUMBER => "crlNumber",
            _ => "UNDEF",
        }
    }

    pub(crate) fn to_x509(&self) -> Result<x509_cert::ext::Extension> {
        Ok(x509_cert::ext::Extension {
            extn_id: self.oid,
            critical: self.critical,
            extn_value: OctetString::new(self.value.as_slice())?,
        })
    }

    pub(crate) fn from_x509(extension: &x509_cert::ext::Extension) -> Self {
        Extension {
            oid: extension.extn_id,
            critical: extension.critical,
            value: extension.extn_value.as_bytes().to_vec(),
        }
    }
}

/// Trait for converting to and from X.509 extensions.
///
/// This trait provides methods to encode and decode X.509 extension values.
///
/// # Example
/// ```
/// use x509kit::cert::extensions::{SubjectAltName, SubjectAltNameEntry, ToAndFromX509Extension};
/// let san = SubjectAltName { names: vec![SubjectAltNameEntry::Dns("example.com".to_string())] };
/// let encoded = san.to_x509_extension_value().unwrap();
/// let decoded = SubjectAltName::from_x509_extension_value(&encoded).unwrap();
/// assert_eq!(san.names, decoded.names);
/// ```
pub trait ToAndFromX509Extension {
    /// The Object Identifier (OID) for the extension.
    const OID: ObjectIdentifier;

    /// Encodes the extension into a DER-encoded byte vector.
    fn to_x509_extension_value(&self) -> Result<Vec<u8>>;

    /// Decodes the extension from a DER-encoded byte slice.
    fn from_x509_extension_value(extension: &[u8]) -> Result<Self>
    where
        Self: Sized;
}

/// `GeneralName` choice tags, numbered as OpenSSL's `GEN_*` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GeneralNameType {
    OtherName = 0,
    Email = 1,
    Dns = 2,
    X400 = 3,
    DirName = 4,
    EdiParty = 5,
    Uri = 6,
    IpAddress = 7,
    RegisteredId = 8,
}

impl GeneralNameType {
    pub fn code(self) -> u8 {
        self as u8
    }
}

fn ip_address_text(octets: &[u8]) -> Result<String> {
    match octets.len() {
        4 => {
            let mut v4 = [0u8; 4];
            v4.copy_from_slice(octets);
            Ok(Ipv4Addr::from(v4).to_string())
        }
        16 => {
            let mut v6 = [0u8; 16];
            v6.copy_from_slice(octets);
            Ok(Ipv6Addr::from(v6).to_string())
        }
        n => Err(X509KitError::DecodingError(format!(
            "IP address entry of {} bytes",
            n
        ))),
    }
}

/// Decodes a `subjectAltName` value into `(type, text)` pairs in encounter order.
///
/// Email, DNS and URI entries are copied as text and IP addresses are formatted
/// in their usual notation. Other entry types are skipped.
pub fn decode_general_names(value: &[u8]) -> Result<Vec<(GeneralNameType, String)>> {
    let san = x509_cert::ext::pkix::SubjectAltName::from_der(value)?;
    let mut out = Vec::with_capacity(san.0.len());
    for name in san.0.iter() {
        let entry = match name {
            GeneralName::Rfc822Name(email) => (GeneralNameType::Email, email.to_string()),
            GeneralName::DnsName(dns) => (GeneralNameType::Dns, dns.to_string()),
            GeneralName::UniformResourceIdentifier(uri) => (GeneralNameType::Uri, uri.to_string()),
            GeneralName::IpAddress(ip) => (GeneralNameType::IpAddress, ip_address_text(ip.as_bytes())?),
            _ => continue,
        };
        out.push(entry);
    }
    Ok(out)
}

/// One entry of a Subject Alternative Name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectAltNameEntry {
    Dns(String),
    Ip(IpAddr),
    Email(String),
    Uri(String),
}

fn ia5(value: &str) -> Result<Ia5String> {
    Ia5String::new(value).map_err(|e| X509KitError::InvalidInput(e.to_string()))
}

impl SubjectAltNameEntry {
    fn to_general_name(&self) -> Result<GeneralName> {
        Ok(match self {
            SubjectAltNameEntry::Dns(dns) => GeneralName::DnsName(ia5(dns)?),
            SubjectAltNameEntry::Email(email) => GeneralName::Rfc822Name(ia5(email)?),
            SubjectAltNameEntry::Uri(uri) => GeneralName::UniformResourceIdentifier(ia5(uri)?),
            SubjectAltNameEntry::Ip(IpAddr::V4(v4)) => {
                GeneralName::IpAddress(OctetString::new(v4.octets().to_vec())?)
            }
            SubjectAltNameEntry::Ip(IpAddr::V6(v6)) => {
                GeneralName::IpAddress(OctetString::new(v6.octets().to_vec())?)
            }
        })
    }
}

/// Represents the Subject Alternative Name (SAN) extension.
///
/// This extension specifies additional identities for the subject of the certificate.
///
/// # Fields
/// * `names` - DNS names, IP addresses, email addresses and URIs.
#[derive(Debug, Clone, Default)]
pub struct SubjectAltName {
    pub names: Vec<SubjectAltNameEntry>,
}

impl SubjectAltName {
    pub fn dns(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        SubjectAltName {
            names: names
                .into_iter()
                .map(|name| SubjectAltNameEntry::Dns(name.into()))
                .collect(),
        }
    }
}

impl ToAndFromX509Extension for SubjectAltName {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectAltName::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let san = x509_cert::ext::pkix::SubjectAltName(
            self.names
                .iter()
                .map(SubjectAltNameEntry::to_general_name)
                .collect::<Result<Vec<_>>>()?,
        );

        Ok(san.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let san = x509_cert::ext::pkix::SubjectAltName::from_der(extension)?;
        let names = san
            .0
            .iter()
            .map(|name| match name {
                GeneralName::DnsName(dns) => Ok(SubjectAltNameEntry::Dns(dns.to_string())),
                GeneralName::Rfc822Name(email) => Ok(SubjectAltNameEntry::Email(email.to_string())),
                GeneralName::UniformResourceIdentifier(uri) => {
                    Ok(SubjectAltNameEntry::Uri(uri.to_string()))
                }
                GeneralName::IpAddress(ip) => {
                    let text = ip_address_text(ip.as_bytes())?;
                    text.parse()
                        .map(SubjectAltNameEntry::Ip)
                        .map_err(|_| X509KitError::DecodingError(text))
                }
                _ => Err(X509KitError::InvalidInput(
                    "Unsupported general name type".to_string(),
                )),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { names })
    }
}

/// Represents the Basic Constraints extension.
///
/// This extension indicates whether the certificate is a CA certificate and its path length.
///
/// # Fields
/// * `is_ca` - Indicates if the certificate is a CA.
/// * `max_path_length` - The maximum number of intermediate CAs allowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BasicConstraints {
    pub is_ca: bool,
    pub max_path_length: Option<u8>,
}

impl ToAndFromX509Extension for BasicConstraints {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::BasicConstraints::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let bc = x509_cert::ext::pkix::BasicConstraints {
            ca: self.is_ca,
            path_len_constraint: self.max_path_length,
        };

        Ok(bc.to_der()?)
    }

    fn from_x509_extension_value(der_bytes: &[u8]) -> Result<Self> {
        let bc = x509_cert::ext::pkix::BasicConstraints::from_der(der_bytes)?;
        Ok(Self {
            is_ca: bc.ca,
            max_path_length: bc.path_len_constraint,
        })
    }
}

pub use der::flagset::FlagSet;
use x509_cert::ext::pkix::KeyUsage as X509KeyUsage;
pub use x509_cert::ext::pkix::KeyUsages;

/// Represents the Key Usage extension.
///
/// This extension defines the purpose of the key contained in the certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsage(pub FlagSet<KeyUsages>);

impl ToAndFromX509Extension for KeyUsage {
    const OID: ObjectIdentifier = <X509KeyUsage as AssociatedOid>::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let ku = X509KeyUsage::from(self.0);
        Ok(ku.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let ku = X509KeyUsage::from_der(extension)?;
        Ok(Self(ku.0))
    }
}

/// Represents the Extended Key Usage extension.
///
/// This extension indicates purposes for which the public key may be used.
#[derive(Debug, Clone, Default)]
pub struct ExtendedKeyUsage {
    pub usage: Vec<ExtendedKeyUsageOption>,
}

impl ToAndFromX509Extension for ExtendedKeyUsage {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::ExtendedKeyUsage::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let oids: Vec<ObjectIdentifier> = self.usage.iter().map(|v| (*v).into()).collect();
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage(oids);
        Ok(eku.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage::from_der(extension)?;
        let usage = eku
            .0
            .iter()
            .map(|v| match *v {
                const_oid::db::rfc5912::ID_KP_OCSP_SIGNING => {
                    Ok(ExtendedKeyUsageOption::OcspSigning)
                }
                const_oid::db::rfc5912::ID_KP_SERVER_AUTH => Ok(ExtendedKeyUsageOption::ServerAuth),
                const_oid::db::rfc5912::ID_KP_CLIENT_AUTH => Ok(ExtendedKeyUsageOption::ClientAuth),
                const_oid::db::rfc5912::ID_KP_CODE_SIGNING => {
                    Ok(ExtendedKeyUsageOption::CodeSigning)
                }
                const_oid::db::rfc5912::ID_KP_EMAIL_PROTECTION => {
                    Ok(ExtendedKeyUsageOption::EmailProtection)
                }
                const_oid::db::rfc5912::ID_KP_TIME_STAMPING => {
                    Ok(ExtendedKeyUsageOption::TimeStamping)
                }
                _ => Err(X509KitError::InvalidInput(
                    "Unsupported extended key usage option".to_string(),
                )),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { usage })
    }
}

/// Represents an option for the Extended Key Usage extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExtendedKeyUsageOption {
    ServerAuth,
    ClientAuth,
    CodeSigning,
    EmailProtection,
    TimeStamping,
    OcspSigning,
}

impl From<ExtendedKeyUsageOption> for ObjectIdentifier {
    fn from(value: ExtendedKeyUsageOption) -> Self {
        match value {
            ExtendedKeyUsageOption::OcspSigning => const_oid::db::rfc5912::ID_KP_OCSP_SIGNING,
            ExtendedKeyUsageOption::ServerAuth => const_oid::db::rfc5912::ID_KP_SERVER_AUTH,
            ExtendedKeyUsageOption::ClientAuth => const_oid::db::rfc5912::ID_KP_CLIENT_AUTH,
            ExtendedKeyUsageOption::CodeSigning => const_oid::db::rfc5912::ID_KP_CODE_SIGNING,
            ExtendedKeyUsageOption::EmailProtection => {
                const_oid::db::rfc5912::ID_KP_EMAIL_PROTECTION
            }
            ExtendedKeyUsageOption::TimeStamping => const_oid::db::rfc5912::ID_KP_TIME_STAMPING,
        }
    }
}

/// Represents the Subject Key Identifier extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectKeyIdentifier(pub Vec<u8>);

impl SubjectKeyIdentifier {
    /// The RFC 5280 method 1 identifier: SHA-1 over the subject public key bits.
    pub fn from_public_key_bits(bits: &[u8]) -> Self {
        use sha1::Digest;
        SubjectKeyIdentifier(sha1::Sha1::digest(bits).to_vec())
    }
}

impl ToAndFromX509Extension for SubjectKeyIdentifier {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectKeyIdentifier::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier(OctetString::new(self.0.as_slice())?);
        Ok(ski.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier::from_der(extension)?;
        Ok(Self(ski.0.as_bytes().to_vec()))
    }
}

/// Represents the Authority Key Identifier (AKI) extension.
///
/// This extension identifies the public key corresponding to the private key used to sign the certificate.
///
/// # Fields
/// * `key_identifier` - The key identifier.
/// * `authority_cert_issuer` - The issuer's distinguished name.
/// * `authority_cert_serial_number` - The issuer's certificate serial number.
#[derive(Debug, Clone, Default)]
pub struct AuthorityKeyIdentifier {
    pub key_identifier: Option<Vec<u8>>,
    pub authority_cert_issuer: Option<DistinguishedName>,
    pub authority_cert_serial_number: Option<Vec<u8>>,
}

impl ToAndFromX509Extension for AuthorityKeyIdentifier {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::AuthorityKeyIdentifier::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let aki = x509_cert::ext::pkix::AuthorityKeyIdentifier {
            key_identifier: self
                .key_identifier
                .as_ref()
                .map(|id| OctetString::new(id.as_slice()))
                .transpose()?,
            authority_cert_issuer: self
                .authority_cert_issuer
                .as_ref()
                .map(|dn| vec![GeneralName::DirectoryName(dn.as_x509_name().clone())]),
            authority_cert_serial_number: self
                .authority_cert_serial_number
                .as_ref()
                .map(|sn| x509_cert::serial_number::SerialNumber::new(sn.as_slice()))
                .transpose()?,
        };

        Ok(aki.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let aki = x509_cert::ext::pkix::AuthorityKeyIdentifier::from_der(extension)?;

        let authority_cert_issuer = aki.authority_cert_issuer.as_ref().and_then(|names| {
            names.iter().find_map(|name| match name {
                GeneralName::DirectoryName(dn) => Some(DistinguishedName::from(dn.clone())),
                _ => None,
            })
        });

        Ok(Self {
            key_identifier: aki.key_identifier.map(|id| id.as_bytes().to_vec()),
            authority_cert_issuer,
            authority_cert_serial_number: aki
                .authority_cert_serial_number
                .map(|sn| sn.as_bytes().to_vec()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_constraints_encoding_decoding() {
        let original = BasicConstraints {
            is_ca: true,
            max_path_length: Some(3),
        };
        let encoded = original.to_x509_extension_value().unwrap();
        let decoded = BasicConstraints::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_authority_key_identifier_encoding_decoding() {
        let original = AuthorityKeyIdentifier {
            key_identifier: Some(vec![1, 2, 3, 4, 5]),
            authority_cert_issuer: Some(
                DistinguishedName::builder()
                    .common_name("Test CA".to_string())
                    .country("US".to_string())
                    .organization("Test Org".to_string())
                    .build()
                    .unwrap(),
            ),
            authority_cert_serial_number: Some(vec![6, 7, 8, 9, 10]),
        };
        let encoded = original.to_x509_extension_value().unwrap();
        let decoded = AuthorityKeyIdentifier::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original.key_identifier, decoded.key_identifier);
        assert_eq!(original.authority_cert_issuer, decoded.authority_cert_issuer);
        assert_eq!(
            original.authority_cert_serial_number,
            decoded.authority_cert_serial_number
        );
    }

    #[test]
    fn test_key_usage_encoding_decoding() {
        let original = KeyUsage(KeyUsages::DigitalSignature | KeyUsages::KeyEncipherment);
        let encoded = original.to_x509_extension_value().unwrap();
        let decoded = KeyUsage::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_extended_key_usage_encoding_decoding() {
        let original = ExtendedKeyUsage {
            usage: vec![
                ExtendedKeyUsageOption::ServerAuth,
                ExtendedKeyUsageOption::ClientAuth,
            ],
        };
        let encoded = original.to_x509_extension_value().unwrap();
        let decoded = ExtendedKeyUsage::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original.usage, decoded.usage);
    }

    #[test]
    fn general_names_keep_order_and_skip_unsupported() {
        let dir = DistinguishedName::builder()
            .common_name("dir".to_string())
            .build()
            .unwrap();
        let san = x509_cert::ext::pkix::SubjectAltName(vec![
            GeneralName::DnsName(Ia5String::new("example.com").unwrap()),
            GeneralName::DirectoryName(dir.as_x509_name().clone()),
            GeneralName::IpAddress(OctetString::new(vec![127, 0, 0, 1]).unwrap()),
            GeneralName::Rfc822Name(Ia5String::new("admin@example.com").unwrap()),
            GeneralName::UniformResourceIdentifier(Ia5String::new("https://example.com/").unwrap()),
            GeneralName::IpAddress(OctetString::new(Ipv6Addr::LOCALHOST.octets().to_vec()).unwrap()),
        ]);
        let decoded = decode_general_names(&san.to_der().unwrap()).unwrap();
        assert_eq!(
            decoded,
            vec![
                (GeneralNameType::Dns, "example.com".to_string()),
                (GeneralNameType::IpAddress, "127.0.0.1".to_string()),
                (GeneralNameType::Email, "admin@example.com".to_string()),
                (GeneralNameType::Uri, "https://example.com/".to_string()),
                (GeneralNameType::IpAddress, "::1".to_string()),
            ]
        );
        assert_eq!(GeneralNameType::Dns.code(), 2);
        assert_eq!(GeneralNameType::IpAddress.code(), 7);
    }

    #[test]
    fn odd_length_ip_is_an_error() {
        let san = x509_cert::ext::pkix::SubjectAltName(vec![GeneralName::IpAddress(
            OctetString::new(vec![10, 0, 0]).unwrap(),
        )]);
        assert!(decode_general_names(&san.to_der().unwrap()).is_err());
    }

    #[test]
    fn decode_checks_extension_type() {
        let ext = Extension::from_extension(&SubjectAltName::dns(["example.com"]), false).unwrap();
        assert_eq!(ext.short_name(), "subjectAltName");
        let san: SubjectAltName = ext.decode().unwrap();
        assert_eq!(san.names, vec![SubjectAltNameEntry::Dns("example.com".to_string())]);
        assert!(matches!(
            ext.decode::<BasicConstraints>(),
            Err(X509KitError::InvalidType(_))
        ));
    }

    #[test]
    fn unknown_extension_short_name() {
        let ext = Extension::new(ObjectIdentifier::new_unwrap("1.2.3.4"), false, vec![0x05, 0x00]);
        assert_eq!(ext.short_name(), "UNDEF");
        let x509 = ext.to_x509().unwrap();
        assert_eq!(Extension::from_x509(&x509), ext);
    }
}
