//! Certificate revocation lists.
//!
//! [`Crl`] wraps a parsed `CertificateList`; [`CrlParams`] issues new ones
//! with a CA key.

use std::time::Duration;

use bon::Builder;
use der::asn1::{BitString, GeneralizedTime, UtcTime};
use der::{Decode, Encode};
use num_bigint_dig::BigInt;
use time::OffsetDateTime;
use x509_cert::Version;
use x509_cert::crl::{CertificateList, RevokedCert, TbsCertList};
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::AlgorithmIdentifierOwned;
use x509_cert::time::Time;

use crate::cert::name::{DistinguishedName, DistinguishedNameRef};
use crate::error::{Result, X509KitError};
use crate::key::{KeyPair, PublicKey};
use crate::pem_utils::{CRL_LABEL, der_to_pem, pem_to_der_labeled};
use crate::pki::{DigestAlgorithm, SignatureAlgorithm};

/// A parsed X.509 certificate revocation list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Crl {
    inner: CertificateList,
}

fn time_to_instant(time: &Time) -> Result<OffsetDateTime> {
    let secs = time.to_unix_duration().as_secs();
    let secs = i64::try_from(secs).map_err(|e| X509KitError::InvalidTime(e.to_string()))?;
    OffsetDateTime::from_unix_timestamp(secs).map_err(|e| X509KitError::InvalidTime(e.to_string()))
}

fn instant_to_time(instant: OffsetDateTime) -> Result<Time> {
    let secs = u64::try_from(instant.unix_timestamp())
        .map_err(|_| X509KitError::InvalidTime(format!("{} predates the unix epoch", instant)))?;
    let since_epoch = Duration::from_secs(secs);
    if instant.year() < 2050 {
        Ok(Time::UtcTime(UtcTime::from_unix_duration(since_epoch)?))
    } else {
        Ok(Time::GeneralTime(GeneralizedTime::from_unix_duration(since_epoch)?))
    }
}

impl Crl {
    pub fn from_der(bytes: &[u8]) -> Result<Self> {
        Ok(Crl {
            inner: CertificateList::from_der(bytes)?,
        })
    }

    pub fn from_pem(pem: &str) -> Result<Self> {
        Self::from_der(&pem_to_der_labeled(pem, CRL_LABEL)?)
    }

    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(self.inner.to_der()?)
    }

    pub fn to_pem(&self) -> Result<String> {
        Ok(der_to_pem(&self.to_der()?, CRL_LABEL))
    }

    pub fn issuer(&self) -> DistinguishedNameRef<'_> {
        DistinguishedNameRef::new(&self.inner.tbs_cert_list.issuer)
    }

    pub fn this_update(&self) -> Result<OffsetDateTime> {
        time_to_instant(&self.inner.tbs_cert_list.this_update)
    }

    /// `None` when the list carries no `nextUpdate`.
    pub fn next_update(&self) -> Result<Option<OffsetDateTime>> {
        self.inner
            .tbs_cert_list
            .next_update
            .as_ref()
            .map(time_to_instant)
            .transpose()
    }

    /// Serial numbers of every revoked certificate, in list order.
    pub fn revoked_serials(&self) -> Vec<BigInt> {
        self.inner
            .tbs_cert_list
            .revoked_certificates
            .iter()
            .flatten()
            .map(|revoked| BigInt::from_signed_bytes_be(revoked.serial_number.as_bytes()))
            .collect()
    }

    pub fn is_revoked(&self, serial: &BigInt) -> bool {
        self.revoked_serials().iter().any(|revoked| revoked == serial)
    }

    /// Checks the list's signature against the issuer's key.
    pub fn verify_signature(&self, issuer_key: &PublicKey) -> Result<()> {
        let algorithm = SignatureAlgorithm::from_oid(&self.inner.signature_algorithm.oid)
            .ok_or(X509KitError::UndefinedSignatureAlgorithm)?;
        let signature = self.inner.signature.as_bytes().ok_or_else(|| {
            X509KitError::DecodingError("CRL signature has unused bits".to_string())
        })?;
        issuer_key.verify(algorithm, &self.inner.tbs_cert_list.to_der()?, signature)
    }
}

/// The contents of a CRL to be issued.
///
/// # Example
/// ```
/// use x509kit::cert::name::DistinguishedName;
/// use x509kit::key::KeyPair;
/// use x509kit::verify::crl::CrlParams;
///
/// let ca_key = KeyPair::generate_ecdsa_p256();
/// let ca_name = DistinguishedName::builder().common_name("ca".to_string()).build().unwrap();
/// let crl = CrlParams::builder()
///     .issuer(ca_name)
///     .revoked(vec![7u32.into()])
///     .this_update(time::OffsetDateTime::now_utc())
///     .build()
///     .sign(&ca_key)
///     .unwrap();
/// assert!(crl.is_revoked(&7u32.into()));
/// ```
#[derive(Clone, Debug, Builder)]
pub struct CrlParams {
    pub issuer: DistinguishedName,
    #[builder(default)]
    pub revoked: Vec<BigInt>,
    pub this_update: OffsetDateTime,
    pub next_update: Option<OffsetDateTime>,
    #[builder(default = DigestAlgorithm::Sha256)]
    pub digest: DigestAlgorithm,
}

impl CrlParams {
    /// Encodes and signs the list with `key`.
    pub fn sign(&self, key: &KeyPair) -> Result<Crl> {
        let algorithm = AlgorithmIdentifierOwned::from(key.signature_algorithm(self.digest)?);
        let revocation_date = instant_to_time(self.this_update)?;

        let revoked = self
            .revoked
            .iter()
            .map(|serial| {
                Ok(RevokedCert {
                    serial_number: SerialNumber::new(&serial.to_signed_bytes_be())?,
                    revocation_date,
                    crl_entry_extensions: None,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let tbs_cert_list = TbsCertList {
            version: Version::V2,
            signature: algorithm.clone(),
            issuer: self.issuer.as_x509_name().clone(),
            this_update: revocation_date,
            next_update: self.next_update.map(instant_to_time).transpose()?,
            revoked_certificates: if revoked.is_empty() { None } else { Some(revoked) },
            crl_extensions: None,
        };

        let (_, signature) = key.sign(&tbs_cert_list.to_der()?, self.digest)?;
        Ok(Crl {
            inner: CertificateList {
                tbs_cert_list,
                signature_algorithm: algorithm,
                signature: BitString::from_bytes(&signature)?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn ca_name() -> DistinguishedName {
        DistinguishedName::builder()
            .common_name("crl issuer".to_string())
            .build()
            .unwrap()
    }

    #[test]
    fn issued_list_roundtrips_through_pem() {
        let key = KeyPair::generate_ecdsa_p256();
        let crl = CrlParams::builder()
            .issuer(ca_name())
            .revoked(vec![BigInt::from(3), BigInt::from(0x0102030405060708u64)])
            .this_update(datetime!(2024-06-01 12:00:00 UTC))
            .next_update(datetime!(2060-06-01 12:00:00 UTC))
            .build()
            .sign(&key)
            .unwrap();

        let parsed = Crl::from_pem(&crl.to_pem().unwrap()).unwrap();
        assert_eq!(parsed, crl);
        assert_eq!(parsed.this_update().unwrap(), datetime!(2024-06-01 12:00:00 UTC));
        assert_eq!(
            parsed.next_update().unwrap(),
            Some(datetime!(2060-06-01 12:00:00 UTC))
        );
        assert!(parsed.is_revoked(&BigInt::from(0x0102030405060708u64)));
        assert!(!parsed.is_revoked(&BigInt::from(4)));
        assert_eq!(parsed.issuer().common_name().as_deref(), Some("crl issuer"));
        parsed.verify_signature(key.public_key().unwrap()).unwrap();
    }

    #[test]
    fn signature_from_another_key_fails() {
        let key = KeyPair::generate_ed25519();
        let crl = CrlParams::builder()
            .issuer(ca_name())
            .this_update(datetime!(2024-06-01 12:00:00 UTC))
            .build()
            .sign(&key)
            .unwrap();
        assert!(crl.revoked_serials().is_empty());
        assert_eq!(crl.next_update().unwrap(), None);

        let other = KeyPair::generate_ed25519();
        assert!(crl.verify_signature(other.public_key().unwrap()).is_err());
    }

    #[test]
    fn public_only_key_cannot_issue() {
        let key = KeyPair::generate_ecdsa_p256().public_only();
        let result = CrlParams::builder()
            .issuer(ca_name())
            .this_update(datetime!(2024-06-01 12:00:00 UTC))
            .build()
            .sign(&key);
        assert_eq!(result.unwrap_err(), X509KitError::PublicKeyOnly);
    }
}
