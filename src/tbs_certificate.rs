//! DER layout of a certificate.
//!
//! These mirror `x509_cert::certificate::TbsCertificateInner`, but keep the
//! fields that crate validates in raw form: the version is any integer, the
//! serial number has no length limit, and validity times are kept as raw
//! `UTCTime`/`GeneralizedTime` values so that zero-length (unset) times survive
//! a round trip.

use der::Sequence;
use der::asn1::{Any, BitString, Int};
use x509_cert::ext::Extension;
use x509_cert::name::Name;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

/// `Validity ::= SEQUENCE { notBefore Time, notAfter Time }`
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub(crate) struct RawValidity {
    pub not_before: Any,
    pub not_after: Any,
}

/// The "To Be Signed" portion of an X.509 certificate.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub(crate) struct TbsCertificate {
    #[asn1(context_specific = "0", default = "Default::default")]
    pub version: i64,
    pub serial_number: Int,
    pub signature: AlgorithmIdentifierOwned,
    pub issuer: Name,
    pub validity: RawValidity,
    pub subject: Name,
    pub subject_public_key_info: SubjectPublicKeyInfoOwned,

    #[asn1(context_specific = "1", tag_mode = "IMPLICIT", optional = "true")]
    pub issuer_unique_id: Option<BitString>,

    #[asn1(context_specific = "2", tag_mode = "IMPLICIT", optional = "true")]
    pub subject_unique_id: Option<BitString>,

    #[asn1(context_specific = "3", tag_mode = "EXPLICIT", optional = "true")]
    pub extensions: Option<Vec<Extension>>,
}

/// `Certificate ::= SEQUENCE { tbsCertificate, signatureAlgorithm, signatureValue }`
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub(crate) struct RawCertificate {
    pub tbs_certificate: TbsCertificate,
    pub signature_algorithm: AlgorithmIdentifierOwned,
    pub signature: BitString,
}

#[cfg(test)]
mod tests {
    use super::*;
    use der::{Decode, Encode, Tag};

    fn sample() -> TbsCertificate {
        TbsCertificate {
            version: 0,
            serial_number: Int::new(&[0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01]).unwrap(),
            signature: AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::ECDSA_WITH_SHA_256,
                parameters: None,
            },
            issuer: Name::default(),
            validity: RawValidity {
                not_before: Any::new(Tag::UtcTime, Vec::<u8>::new()).unwrap(),
                not_after: Any::new(Tag::GeneralizedTime, b"20991231235959Z".to_vec()).unwrap(),
            },
            subject: Name::default(),
            subject_public_key_info: SubjectPublicKeyInfoOwned {
                algorithm: AlgorithmIdentifierOwned {
                    oid: const_oid::db::rfc8410::ID_ED_25519,
                    parameters: None,
                },
                subject_public_key: BitString::from_bytes(&[0u8; 32]).unwrap(),
            },
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: None,
        }
    }

    #[test]
    fn version_zero_is_omitted() {
        let tbs = sample();
        let der = tbs.to_der().unwrap();
        // SEQUENCE header followed directly by the serial INTEGER
        let body_start = if der[1] & 0x80 != 0 { 2 + (der[1] & 0x7f) as usize } else { 2 };
        assert_eq!(der[body_start], 0x02);
        assert_eq!(TbsCertificate::from_der(&der).unwrap(), tbs);
    }

    #[test]
    fn large_serial_and_unset_time_survive() {
        let mut tbs = sample();
        tbs.version = 2;
        let der = tbs.to_der().unwrap();
        let decoded = TbsCertificate::from_der(&der).unwrap();
        assert_eq!(decoded.version, 2);
        assert_eq!(decoded.serial_number.as_bytes().len(), 24);
        assert!(decoded.validity.not_before.value().is_empty());
    }
}
