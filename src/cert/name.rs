use std::fmt;
use std::str::FromStr;

use bon::bon;
use der::asn1::{Any, PrintableStringRef, SetOfVec};
use der::{Decode, Encode, Tag, Tagged};
use sha1::{Digest, Sha1};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};
use x509_cert::spki::ObjectIdentifier;

use crate::error::{Result, X509KitError};

pub const COUNTRY_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.6");
pub const STATE_OR_PROVINCE_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.8");
pub const LOCALITY_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.7");
pub const ORGANIZATION_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
pub const ORGANIZATIONAL_UNIT_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.11");
pub const COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");
pub const EMAIL_ADDRESS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.1");

fn short_name(oid: &ObjectIdentifier) -> String {
    match *oid {
        COUNTRY_NAME => "C".to_string(),
        STATE_OR_PROVINCE_NAME => "ST".to_string(),
        LOCALITY_NAME => "L".to_string(),
        ORGANIZATION_NAME => "O".to_string(),
        ORGANIZATIONAL_UNIT_NAME => "OU".to_string(),
        COMMON_NAME => "CN".to_string(),
        EMAIL_ADDRESS => "emailAddress".to_string(),
        _ => oid.to_string(),
    }
}

/// Decodes a directory string of any of the common string types to UTF-8.
///
/// `TeletexString` is read as Latin-1 and `BMPString` as UTF-16BE.
fn attribute_text(value: &Any) -> Result<String> {
    let bytes = value.value();
    let invalid = |what: &str| X509KitError::DecodingError(format!("invalid {} in name", what));
    match value.tag() {
        Tag::Utf8String | Tag::PrintableString | Tag::Ia5String | Tag::VisibleString => {
            String::from_utf8(bytes.to_vec()).map_err(|_| invalid("string"))
        }
        Tag::TeletexString => Ok(bytes.iter().map(|&b| b as char).collect()),
        Tag::BmpString => {
            if bytes.len() % 2 != 0 {
                return Err(invalid("BMPString"));
            }
            let units = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
            char::decode_utf16(units)
                .collect::<std::result::Result<String, _>>()
                .map_err(|_| invalid("BMPString"))
        }
        other => Err(X509KitError::InvalidType(format!(
            "{} is not a directory string",
            other
        ))),
    }
}

fn is_canon_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

/// Trims, collapses internal whitespace runs to one space and lowercases ASCII.
fn canonical_text(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    let start = bytes.iter().position(|&b| !is_canon_space(b)).unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|&b| !is_canon_space(b))
        .map_or(start, |i| i + 1);

    let mut out = Vec::with_capacity(end - start);
    let mut in_space = false;
    for &b in &bytes[start..end] {
        if is_canon_space(b) {
            if !in_space {
                out.push(b' ');
            }
            in_space = true;
        } else {
            out.push(b.to_ascii_lowercase());
            in_space = false;
        }
    }
    out
}

fn canonical_value(value: &Any) -> Result<Any> {
    match value.tag() {
        Tag::Utf8String
        | Tag::PrintableString
        | Tag::Ia5String
        | Tag::VisibleString
        | Tag::TeletexString
        | Tag::BmpString => {
            let text = attribute_text(value)?;
            Ok(Any::new(Tag::Utf8String, canonical_text(&text))?)
        }
        _ => Ok(value.clone()),
    }
}

/// A borrowed view of a name held by a certificate or CRL.
///
/// The view cannot outlive its owner; call [`DistinguishedNameRef::to_owned_name`]
/// to keep a copy.
#[derive(Clone, Copy, Debug)]
pub struct DistinguishedNameRef<'a> {
    name: &'a Name,
}

impl<'a> DistinguishedNameRef<'a> {
    pub(crate) fn new(name: &'a Name) -> Self {
        DistinguishedNameRef { name }
    }

    pub fn as_x509_name(&self) -> &'a Name {
        self.name
    }

    /// Number of attribute entries across all RDNs.
    pub fn entry_count(&self) -> usize {
        self.name.0.iter().map(|rdn| rdn.0.len()).sum()
    }

    /// The first value stored under `oid`, decoded to text.
    pub fn get(&self, oid: ObjectIdentifier) -> Option<String> {
        self.name
            .0
            .iter()
            .flat_map(|rdn| rdn.0.iter())
            .find(|atv| atv.oid == oid)
            .and_then(|atv| attribute_text(&atv.value).ok())
    }

    pub fn common_name(&self) -> Option<String> {
        self.get(COMMON_NAME)
    }

    /// `(short name, value)` pairs in encoding order.
    pub fn components(&self) -> Result<Vec<(String, String)>> {
        self.name
            .0
            .iter()
            .flat_map(|rdn| rdn.0.iter())
            .map(|atv| Ok((short_name(&atv.oid), attribute_text(&atv.value)?)))
            .collect()
    }

    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(self.name.to_der()?)
    }

    /// The canonical encoding used for hashing and comparison: every RDN
    /// `SET` re-encoded with normalized string values, concatenated without
    /// the outer `SEQUENCE`.
    pub fn canonical_encoding(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for rdn in self.name.0.iter() {
            let entries = rdn
                .0
                .iter()
                .map(|atv| {
                    Ok(AttributeTypeAndValue {
                        oid: atv.oid,
                        value: canonical_value(&atv.value)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let canonical = RelativeDistinguishedName(SetOfVec::try_from(entries)?);
            canonical.encode_to_vec(&mut out)?;
        }
        Ok(out)
    }

    /// The OpenSSL subject hash: the first four bytes of the SHA-1 of the
    /// canonical encoding, read little-endian.
    pub fn hash(&self) -> Result<u32> {
        let digest = Sha1::digest(self.canonical_encoding()?);
        Ok(u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]))
    }

    /// Compares names the way chain building does, ignoring case and
    /// whitespace differences in string values.
    pub fn matches(&self, other: DistinguishedNameRef<'_>) -> bool {
        match (self.canonical_encoding(), other.canonical_encoding()) {
            (Ok(a), Ok(b)) => a == b,
            _ => self.name == other.name,
        }
    }

    pub fn to_owned_name(&self) -> DistinguishedName {
        DistinguishedName(self.name.clone())
    }
}

impl fmt::Display for DistinguishedNameRef<'_> {
    /// One-line form, `/C=US/O=Example/CN=example.com`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for atv in self.name.0.iter().flat_map(|rdn| rdn.0.iter()) {
            let value = attribute_text(&atv.value).unwrap_or_else(|_| "<binary>".to_string());
            write!(f, "/{}={}", short_name(&atv.oid), value)?;
        }
        Ok(())
    }
}

/// An owned X.509 distinguished name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DistinguishedName(Name);

#[bon]
impl DistinguishedName {
    /// Builds a name with one RDN per given attribute, in the order
    /// C, ST, L, O, OU, CN, emailAddress.
    ///
    /// # Example
    /// ```
    /// use x509kit::cert::name::DistinguishedName;
    /// let name = DistinguishedName::builder()
    ///     .common_name("example.com".to_string())
    ///     .country("US".to_string())
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(name.to_string(), "/C=US/CN=example.com");
    /// ```
    #[builder]
    pub fn new(
        common_name: Option<String>,
        country: Option<String>,
        state: Option<String>,
        locality: Option<String>,
        organization: Option<String>,
        organization_unit: Option<String>,
        email_address: Option<String>,
    ) -> Result<Self> {
        let mut name = DistinguishedName::default();
        if let Some(country) = country {
            if country.len() != 2 {
                return Err(X509KitError::InvalidInput(format!(
                    "country name must be two characters: {:?}",
                    country
                )));
            }
            PrintableStringRef::new(&country)?;
            name.push_entry(COUNTRY_NAME, Tag::PrintableString, &country)?;
        }
        for (oid, value) in [
            (STATE_OR_PROVINCE_NAME, state),
            (LOCALITY_NAME, locality),
            (ORGANIZATION_NAME, organization),
            (ORGANIZATIONAL_UNIT_NAME, organization_unit),
            (COMMON_NAME, common_name),
        ] {
            if let Some(value) = value {
                name.push_entry(oid, Tag::Utf8String, &value)?;
            }
        }
        if let Some(email) = email_address {
            if !email.is_ascii() {
                return Err(X509KitError::InvalidInput(format!(
                    "email address must be ASCII: {:?}",
                    email
                )));
            }
            name.push_entry(EMAIL_ADDRESS, Tag::Ia5String, &email)?;
        }
        Ok(name)
    }
}

impl DistinguishedName {
    /// Appends a single-valued RDN holding `value` encoded with `tag`.
    pub fn push_entry(&mut self, oid: ObjectIdentifier, tag: Tag, value: &str) -> Result<()> {
        let atv = AttributeTypeAndValue {
            oid,
            value: Any::new(tag, value.as_bytes())?,
        };
        let rdn = RelativeDistinguishedName(SetOfVec::try_from(vec![atv])?);
        self.0.0.push(rdn);
        Ok(())
    }

    pub fn view(&self) -> DistinguishedNameRef<'_> {
        DistinguishedNameRef::new(&self.0)
    }

    pub fn as_x509_name(&self) -> &Name {
        &self.0
    }

    pub fn from_der(bytes: &[u8]) -> Result<Self> {
        Ok(DistinguishedName(Name::from_der(bytes)?))
    }

    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.view().to_der()
    }

    pub fn common_name(&self) -> Option<String> {
        self.view().common_name()
    }

    pub fn hash(&self) -> Result<u32> {
        self.view().hash()
    }
}

impl From<Name> for DistinguishedName {
    fn from(name: Name) -> Self {
        DistinguishedName(name)
    }
}

impl From<DistinguishedName> for Name {
    fn from(name: DistinguishedName) -> Self {
        name.0
    }
}

impl FromStr for DistinguishedName {
    type Err = X509KitError;

    /// Parses an RFC 4514 string such as `CN=example.com,O=Example`.
    fn from_str(s: &str) -> Result<Self> {
        RdnSequence::from_str(s)
            .map(DistinguishedName)
            .map_err(|e| X509KitError::InvalidInput(e.to_string()))
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.view(), f)
    }
}
