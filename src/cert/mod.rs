pub mod extensions;
pub mod name;
pub mod time;

use std::sync::Arc;

use der::asn1::{BitString, Int};
use der::{Decode, Encode};
use num_bigint_dig::{BigInt, Sign};
use rand::RngCore;
use ::time::OffsetDateTime;
use x509_cert::name::Name;
use x509_cert::spki::{AlgorithmIdentifierOwned, ObjectIdentifier, SubjectPublicKeyInfoOwned};

use crate::error::{Result, X509KitError};
use crate::key::{KeyPair, PublicKey};
use crate::pem_utils::{CERTIFICATE_LABEL, der_to_pem, pem_to_der_labeled};
use crate::pki::{DigestAlgorithm, SignatureAlgorithm, hex_colon_upper};
use crate::tbs_certificate::{RawCertificate, RawValidity, TbsCertificate};
use crate::verify::{VerifyOptions, VerifyStatus};
use extensions::{Extension, GeneralNameType, SUBJECT_ALT_NAME, decode_general_names};
use name::{DistinguishedName, DistinguishedNameRef};
use self::time::Asn1Time;

/// A mutable X.509 certificate.
///
/// A fresh certificate has version 0, serial number 0, empty names, no key,
/// unset validity times and no extensions. Fields are then set one by one and
/// the certificate is finished with [`Certificate::sign`].
///
/// Public keys are shared: [`Certificate::set_public_key`] keeps a reference
/// to the caller's key material and [`Certificate::public_key`] hands out a
/// public-only view of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Certificate {
    version: i64,
    serial_number: BigInt,
    tbs_signature: Option<AlgorithmIdentifierOwned>,
    issuer: Name,
    subject: Name,
    not_before: Asn1Time,
    not_after: Asn1Time,
    public_key_info: Option<SubjectPublicKeyInfoOwned>,
    public_key: Option<Arc<PublicKey>>,
    issuer_unique_id: Option<BitString>,
    subject_unique_id: Option<BitString>,
    extensions: Vec<Extension>,
    signature_algorithm: Option<AlgorithmIdentifierOwned>,
    signature: Option<BitString>,
}

fn serial_to_int(serial: &BigInt) -> Result<Int> {
    Ok(Int::new(&serial.to_signed_bytes_be())?)
}

impl Certificate {
    /// Creates an empty certificate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a DER-encoded certificate.
    pub fn from_der(bytes: &[u8]) -> Result<Self> {
        let raw = RawCertificate::from_der(bytes)?;
        let tbs = raw.tbs_certificate;
        // Keys of unsupported types stay available as raw SPKI.
        let public_key = PublicKey::from_spki(&tbs.subject_public_key_info)
            .ok()
            .map(Arc::new);

        Ok(Certificate {
            version: tbs.version,
            serial_number: BigInt::from_signed_bytes_be(tbs.serial_number.as_bytes()),
            tbs_signature: Some(tbs.signature),
            issuer: tbs.issuer,
            subject: tbs.subject,
            not_before: Asn1Time::from_any(&tbs.validity.not_before)?,
            not_after: Asn1Time::from_any(&tbs.validity.not_after)?,
            public_key_info: Some(tbs.subject_public_key_info),
            public_key,
            issuer_unique_id: tbs.issuer_unique_id,
            subject_unique_id: tbs.subject_unique_id,
            extensions: tbs
                .extensions
                .unwrap_or_default()
                .iter()
                .map(Extension::from_x509)
                .collect(),
            signature_algorithm: Some(raw.signature_algorithm),
            signature: Some(raw.signature),
        })
    }

    /// Parses a PEM-encoded certificate.
    pub fn from_pem(pem: &str) -> Result<Self> {
        Self::from_der(&pem_to_der_labeled(pem, CERTIFICATE_LABEL)?)
    }

    fn build_tbs(&self, signature: AlgorithmIdentifierOwned) -> Result<TbsCertificate> {
        let subject_public_key_info = self.public_key_info.clone().ok_or_else(|| {
            X509KitError::CertificateError("certificate has no public key".to_string())
        })?;
        let extensions = if self.extensions.is_empty() {
            None
        } else {
            Some(
                self.extensions
                    .iter()
                    .map(Extension::to_x509)
                    .collect::<Result<Vec<_>>>()?,
            )
        };

        Ok(TbsCertificate {
            version: self.version,
            serial_number: serial_to_int(&self.serial_number)?,
            signature,
            issuer: self.issuer.clone(),
            validity: RawValidity {
                not_before: self.not_before.to_any()?,
                not_after: self.not_after.to_any()?,
            },
            subject: self.subject.clone(),
            subject_public_key_info,
            issuer_unique_id: self.issuer_unique_id.clone(),
            subject_unique_id: self.subject_unique_id.clone(),
            extensions,
        })
    }

    fn unsigned_error() -> X509KitError {
        X509KitError::CertificateError("certificate is not signed".to_string())
    }

    /// DER encoding of the `tbsCertificate` that the signature covers.
    pub fn tbs_der(&self) -> Result<Vec<u8>> {
        let signature = self.tbs_signature.clone().ok_or_else(Self::unsigned_error)?;
        Ok(self.build_tbs(signature)?.to_der()?)
    }

    /// Encodes the certificate into DER format.
    ///
    /// # Errors
    /// `CertificateError` if the certificate has not been signed.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        let tbs_signature = self.tbs_signature.clone().ok_or_else(Self::unsigned_error)?;
        let raw = RawCertificate {
            tbs_certificate: self.build_tbs(tbs_signature)?,
            signature_algorithm: self
                .signature_algorithm
                .clone()
                .ok_or_else(Self::unsigned_error)?,
            signature: self.signature.clone().ok_or_else(Self::unsigned_error)?,
        };
        raw.to_der()
            .map_err(|e| X509KitError::EncodingError(e.to_string()))
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> Result<String> {
        Ok(der_to_pem(&self.to_der()?, CERTIFICATE_LABEL))
    }

    /// The X.509 version field; 0 is v1 and 2 is v3.
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Sets the version field. The value is not range checked.
    pub fn set_version(&mut self, version: i64) {
        self.version = version;
    }

    pub fn serial_number(&self) -> &BigInt {
        &self.serial_number
    }

    /// Sets the serial number. Any magnitude and sign is stored as given.
    pub fn set_serial_number(&mut self, serial: impl Into<BigInt>) {
        self.serial_number = serial.into();
    }

    /// The serial number as uppercase hex in whole bytes, with a leading `-`
    /// for negative values and `"0"` for zero.
    pub fn serial_number_hex(&self) -> String {
        let (sign, magnitude) = self.serial_number.to_bytes_be();
        if magnitude.iter().all(|b| *b == 0) {
            return "0".to_string();
        }
        let hex: String = magnitude.iter().map(|b| format!("{:02X}", b)).collect();
        match sign {
            Sign::Minus => format!("-{}", hex),
            _ => hex,
        }
    }

    /// Sets the serial number from hex, accepting an optional `-` and `0x` prefix.
    pub fn set_serial_number_hex(&mut self, hex: &str) -> Result<()> {
        let invalid = || X509KitError::InvalidInput(format!("invalid hex serial number: {:?}", hex));
        let (negative, digits) = match hex.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, hex),
        };
        let digits = digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
            .unwrap_or(digits);
        if digits.is_empty() {
            return Err(invalid());
        }
        let magnitude = BigInt::parse_bytes(digits.as_bytes(), 16).ok_or_else(invalid)?;
        self.serial_number = if negative { -magnitude } else { magnitude };
        Ok(())
    }

    /// A random positive 159-bit serial number, as recommended for issued certificates.
    pub fn random_serial_number() -> BigInt {
        let mut bytes = [0u8; 20];
        rand::rng().fill_bytes(&mut bytes);
        bytes[0] &= 0x7f;
        BigInt::from_bytes_be(Sign::Plus, &bytes)
    }

    /// A view of the issuer name, valid while the certificate is borrowed.
    pub fn issuer(&self) -> DistinguishedNameRef<'_> {
        DistinguishedNameRef::new(&self.issuer)
    }

    /// Copies `name` into the issuer field.
    pub fn set_issuer(&mut self, name: &DistinguishedName) {
        self.issuer = name.as_x509_name().clone();
    }

    /// A view of the subject name, valid while the certificate is borrowed.
    pub fn subject(&self) -> DistinguishedNameRef<'_> {
        DistinguishedNameRef::new(&self.subject)
    }

    /// Copies `name` into the subject field.
    pub fn set_subject(&mut self, name: &DistinguishedName) {
        self.subject = name.as_x509_name().clone();
    }

    /// The subject public key as a public-only [`KeyPair`] sharing this
    /// certificate's key material.
    ///
    /// # Errors
    /// `CertificateError` when no key is set, `UnsupportedKey` when the
    /// key's algorithm is not supported.
    pub fn public_key(&self) -> Result<KeyPair> {
        if let Some(public) = &self.public_key {
            return Ok(KeyPair::from_shared_public(public.clone()));
        }
        let spki = self.public_key_info.as_ref().ok_or_else(|| {
            X509KitError::CertificateError("certificate has no public key".to_string())
        })?;
        Ok(KeyPair::from_public_key(PublicKey::from_spki(spki)?))
    }

    /// Installs the public half of `key`. The private half is not needed.
    ///
    /// # Errors
    /// `UninitializedKey` when `key` holds no material.
    pub fn set_public_key(&mut self, key: &KeyPair) -> Result<()> {
        let public = key.shared_public_key().ok_or(X509KitError::UninitializedKey)?;
        self.public_key_info = Some(public.to_spki()?);
        self.public_key = Some(public);
        Ok(())
    }

    /// The encoded `SubjectPublicKeyInfo`, whatever its algorithm.
    pub fn public_key_info(&self) -> Option<&SubjectPublicKeyInfoOwned> {
        self.public_key_info.as_ref()
    }

    /// `notBefore` in generalized form, or `None` when unset.
    pub fn not_before(&self) -> Result<Option<String>> {
        self.not_before.to_generalized()
    }

    /// `notAfter` in generalized form, or `None` when unset.
    pub fn not_after(&self) -> Result<Option<String>> {
        self.not_after.to_generalized()
    }

    /// Sets `notBefore` from `YYYYMMDDhhmmssZ` or `YYYYMMDDhhmmss[+-]hhmm`.
    pub fn set_not_before(&mut self, value: &str) -> Result<()> {
        self.not_before = Asn1Time::from_generalized(value)?;
        Ok(())
    }

    /// Sets `notAfter` from `YYYYMMDDhhmmssZ` or `YYYYMMDDhhmmss[+-]hhmm`.
    pub fn set_not_after(&mut self, value: &str) -> Result<()> {
        self.not_after = Asn1Time::from_generalized(value)?;
        Ok(())
    }

    pub fn set_not_before_instant(&mut self, instant: OffsetDateTime) -> Result<()> {
        self.not_before = Asn1Time::from_offset_date_time(instant)?;
        Ok(())
    }

    pub fn set_not_after_instant(&mut self, instant: OffsetDateTime) -> Result<()> {
        self.not_after = Asn1Time::from_offset_date_time(instant)?;
        Ok(())
    }

    /// Sets `notBefore` to the current time plus `seconds`, which may be negative.
    pub fn gmtime_adj_not_before(&mut self, seconds: i64) -> Result<()> {
        self.set_not_before_instant(OffsetDateTime::now_utc() + ::time::Duration::seconds(seconds))
    }

    /// Sets `notAfter` to the current time plus `seconds`, which may be negative.
    pub fn gmtime_adj_not_after(&mut self, seconds: i64) -> Result<()> {
        self.set_not_after_instant(OffsetDateTime::now_utc() + ::time::Duration::seconds(seconds))
    }

    pub fn not_before_instant(&self) -> Result<Option<OffsetDateTime>> {
        self.not_before.to_offset_date_time()
    }

    pub fn not_after_instant(&self) -> Result<Option<OffsetDateTime>> {
        self.not_after.to_offset_date_time()
    }

    /// Whether `notAfter` lies before the current time.
    pub fn has_expired(&self) -> bool {
        self.has_expired_at(OffsetDateTime::now_utc())
    }

    /// Whether `notAfter` lies before `now`, compared to the second.
    /// A certificate whose `notAfter` equals `now` has not expired.
    ///
    /// An unset or unreadable `notAfter` counts as expired.
    pub fn has_expired_at(&self, now: OffsetDateTime) -> bool {
        match self.not_after_instant() {
            Ok(Some(not_after)) => not_after.unix_timestamp() < now.unix_timestamp(),
            Ok(None) | Err(_) => true,
        }
    }

    pub fn signature_algorithm_oid(&self) -> Option<ObjectIdentifier> {
        self.signature_algorithm.as_ref().map(|alg| alg.oid)
    }

    /// Short name of the signature algorithm, such as `"RSA-SHA256"` or
    /// `"ecdsa-with-SHA384"`.
    ///
    /// # Errors
    /// `UndefinedSignatureAlgorithm` when the certificate is unsigned or the
    /// algorithm is not known.
    pub fn signature_algorithm(&self) -> Result<&'static str> {
        self.signature_algorithm_oid()
            .and_then(|oid| SignatureAlgorithm::from_oid(&oid))
            .map(|alg| alg.short_name())
            .ok_or(X509KitError::UndefinedSignatureAlgorithm)
    }

    /// Raw signature bits, if signed.
    pub fn signature(&self) -> Option<&[u8]> {
        self.signature.as_ref().and_then(|sig| sig.as_bytes())
    }

    /// Signs the certificate with `key` using the digest named by `digest`
    /// (`"sha256"`, `"SHA1"`, `"sha-384"`, ...).
    ///
    /// Replaces both signature algorithm fields and the signature. Nothing is
    /// modified when an error is returned.
    ///
    /// # Errors
    /// `UninitializedKey` or `PublicKeyOnly` when the key cannot sign,
    /// `UnknownDigest` for an unknown digest name.
    pub fn sign(&mut self, key: &KeyPair, digest: &str) -> Result<()> {
        if !key.is_initialized() {
            return Err(X509KitError::UninitializedKey);
        }
        if !key.has_private_part() {
            return Err(X509KitError::PublicKeyOnly);
        }
        let digest: DigestAlgorithm = digest.parse()?;
        let algorithm = key.signature_algorithm(digest)?;
        let algorithm_id = AlgorithmIdentifierOwned::from(algorithm);

        let tbs = self.build_tbs(algorithm_id.clone())?.to_der()?;
        let (_, signature) = key.sign(&tbs, digest)?;
        let signature = BitString::from_bytes(&signature)?;

        self.tbs_signature = Some(algorithm_id.clone());
        self.signature_algorithm = Some(algorithm_id);
        self.signature = Some(signature);
        Ok(())
    }

    /// Checks this certificate's signature against `issuer_key`.
    pub fn verify_signature(&self, issuer_key: &PublicKey) -> Result<()> {
        let algorithm = self
            .signature_algorithm_oid()
            .and_then(|oid| SignatureAlgorithm::from_oid(&oid))
            .ok_or(X509KitError::UndefinedSignatureAlgorithm)?;
        let signature = self.signature().ok_or_else(Self::unsigned_error)?;
        issuer_key.verify(algorithm, &self.tbs_der()?, signature)
    }

    /// Whether the subject and issuer names match.
    pub fn is_self_issued(&self) -> bool {
        self.subject().matches(self.issuer())
    }

    /// OpenSSL-compatible hash of the subject name, as used for the
    /// `<hash>.<n>` file names of certificate directories.
    pub fn subject_name_hash(&self) -> Result<u32> {
        self.subject().hash()
    }

    /// Digest of the DER encoding as colon-separated uppercase hex pairs,
    /// e.g. `"A1:B2:...:FF"`.
    pub fn digest(&self, digest: &str) -> Result<String> {
        let digest: DigestAlgorithm = digest.parse()?;
        Ok(hex_colon_upper(&digest.digest(&self.to_der()?)))
    }

    /// Appends copies of `extensions` in order.
    pub fn add_extensions<I>(&mut self, extensions: I)
    where
        I: IntoIterator<Item = Extension>,
    {
        self.extensions.extend(extensions);
    }

    pub fn extension_count(&self) -> usize {
        self.extensions.len()
    }

    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    /// A copy of the extension at `index`.
    ///
    /// # Errors
    /// `IndexOutOfBounds` when there is no extension at `index`.
    pub fn extension(&self, index: usize) -> Result<Extension> {
        self.extensions
            .get(index)
            .cloned()
            .ok_or(X509KitError::IndexOutOfBounds {
                index,
                count: self.extensions.len(),
            })
    }

    /// Removes the extension at `index`; later extensions move down by one.
    ///
    /// # Errors
    /// `IndexOutOfBounds` when there is no extension at `index`.
    pub fn delete_extension(&mut self, index: usize) -> Result<()> {
        if index >= self.extensions.len() {
            return Err(X509KitError::IndexOutOfBounds {
                index,
                count: self.extensions.len(),
            });
        }
        self.extensions.remove(index);
        Ok(())
    }

    /// The first extension with the given OID.
    pub fn find_extension(&self, oid: ObjectIdentifier) -> Option<&Extension> {
        self.extensions.iter().find(|ext| ext.oid() == oid)
    }

    /// Entries of the first `subjectAltName` extension, or `None` without one.
    ///
    /// See [`decode_general_names`] for the entry types that are reported.
    pub fn subject_alt_name(&self) -> Result<Option<Vec<(GeneralNameType, String)>>> {
        self.find_extension(SUBJECT_ALT_NAME)
            .map(|ext| decode_general_names(ext.value()))
            .transpose()
    }

    /// Verifies this certificate against a trust store built from `options`.
    ///
    /// Returns [`VerifyStatus::Ok`] for a valid chain, otherwise the first
    /// failure found.
    pub fn verify(&self, options: &VerifyOptions) -> VerifyStatus {
        crate::verify::verify_certificate(self, options)
    }
}
