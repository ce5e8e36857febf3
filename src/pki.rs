use std::fmt;
use std::str::FromStr;

use const_oid::ObjectIdentifier;
use der::asn1::Any;
use digest::Digest;
use x509_cert::spki::AlgorithmIdentifierOwned;

use crate::error::{Result, X509KitError};

/// Message digests usable for signing and fingerprinting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    /// The short name of the digest, as accepted by [`DigestAlgorithm::from_str`].
    pub fn name(self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "md5",
            DigestAlgorithm::Sha1 => "sha1",
            DigestAlgorithm::Sha224 => "sha224",
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha384 => "sha384",
            DigestAlgorithm::Sha512 => "sha512",
        }
    }

    /// Size of the digest output in bytes.
    pub fn output_len(self) -> usize {
        match self {
            DigestAlgorithm::Md5 => 16,
            DigestAlgorithm::Sha1 => 20,
            DigestAlgorithm::Sha224 => 28,
            DigestAlgorithm::Sha256 => 32,
            DigestAlgorithm::Sha384 => 48,
            DigestAlgorithm::Sha512 => 64,
        }
    }

    /// Hash `data` with this algorithm.
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            DigestAlgorithm::Md5 => md5::Md5::digest(data).to_vec(),
            DigestAlgorithm::Sha1 => sha1::Sha1::digest(data).to_vec(),
            DigestAlgorithm::Sha224 => sha2::Sha224::digest(data).to_vec(),
            DigestAlgorithm::Sha256 => sha2::Sha256::digest(data).to_vec(),
            DigestAlgorithm::Sha384 => sha2::Sha384::digest(data).to_vec(),
            DigestAlgorithm::Sha512 => sha2::Sha512::digest(data).to_vec(),
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = X509KitError;

    /// Looks a digest up by name. Matching ignores case and accepts the
    /// hyphenated spellings (`SHA-256`).
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.to_ascii_lowercase().replace('-', "");
        match normalized.as_str() {
            "md5" => Ok(DigestAlgorithm::Md5),
            "sha1" => Ok(DigestAlgorithm::Sha1),
            "sha224" => Ok(DigestAlgorithm::Sha224),
            "sha256" => Ok(DigestAlgorithm::Sha256),
            "sha384" => Ok(DigestAlgorithm::Sha384),
            "sha512" => Ok(DigestAlgorithm::Sha512),
            _ => Err(X509KitError::UnknownDigest(s.to_string())),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Key family of a signature algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureKind {
    Rsa,
    Ecdsa,
    Ed25519,
}

/// Represents the supported signature algorithms for certificates.
///
/// This enum provides a mapping to the corresponding OIDs and short names for each algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// RSA PKCS#1 v1.5 with the given digest.
    Rsa(DigestAlgorithm),
    /// ECDSA with the given digest. MD5 is not defined for ECDSA.
    Ecdsa(DigestAlgorithm),
    /// Pure EdDSA over Curve25519.
    Ed25519,
}

const MD5_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.4");
const SHA1_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.5");
const SHA224_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.14");
const SHA256_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11");
const SHA384_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.12");
const SHA512_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.13");
const ECDSA_WITH_SHA1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.1");
const ECDSA_WITH_SHA224: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.1");
const ECDSA_WITH_SHA256: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.2");
const ECDSA_WITH_SHA384: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.3");
const ECDSA_WITH_SHA512: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.4");
const ED25519: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");

impl SignatureAlgorithm {
    /// Picks the algorithm for signing with a key of `kind` using `digest`.
    ///
    /// Ed25519 signs the message directly; the digest is ignored.
    pub fn for_key(kind: SignatureKind, digest: DigestAlgorithm) -> Result<Self> {
        match (kind, digest) {
            (SignatureKind::Rsa, d) => Ok(SignatureAlgorithm::Rsa(d)),
            (SignatureKind::Ecdsa, DigestAlgorithm::Md5) => Err(X509KitError::InvalidInput(
                "md5 is not defined for ECDSA signatures".to_string(),
            )),
            (SignatureKind::Ecdsa, d) => Ok(SignatureAlgorithm::Ecdsa(d)),
            (SignatureKind::Ed25519, _) => Ok(SignatureAlgorithm::Ed25519),
        }
    }

    /// Object identifier of the algorithm.
    pub fn oid(self) -> ObjectIdentifier {
        match self {
            SignatureAlgorithm::Rsa(d) => match d {
                DigestAlgorithm::Md5 => MD5_WITH_RSA,
                DigestAlgorithm::Sha1 => SHA1_WITH_RSA,
                DigestAlgorithm::Sha224 => SHA224_WITH_RSA,
                DigestAlgorithm::Sha256 => SHA256_WITH_RSA,
                DigestAlgorithm::Sha384 => SHA384_WITH_RSA,
                DigestAlgorithm::Sha512 => SHA512_WITH_RSA,
            },
            SignatureAlgorithm::Ecdsa(d) => match d {
                // for_key never builds this pairing
                DigestAlgorithm::Md5 | DigestAlgorithm::Sha1 => ECDSA_WITH_SHA1,
                DigestAlgorithm::Sha224 => ECDSA_WITH_SHA224,
                DigestAlgorithm::Sha256 => ECDSA_WITH_SHA256,
                DigestAlgorithm::Sha384 => ECDSA_WITH_SHA384,
                DigestAlgorithm::Sha512 => ECDSA_WITH_SHA512,
            },
            SignatureAlgorithm::Ed25519 => ED25519,
        }
    }

    /// Resolves an OID back to an algorithm. Unknown OIDs yield `None`.
    pub fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        let alg = match *oid {
            MD5_WITH_RSA => SignatureAlgorithm::Rsa(DigestAlgorithm::Md5),
            SHA1_WITH_RSA => SignatureAlgorithm::Rsa(DigestAlgorithm::Sha1),
            SHA224_WITH_RSA => SignatureAlgorithm::Rsa(DigestAlgorithm::Sha224),
            SHA256_WITH_RSA => SignatureAlgorithm::Rsa(DigestAlgorithm::Sha256),
            SHA384_WITH_RSA => SignatureAlgorithm::Rsa(DigestAlgorithm::Sha384),
            SHA512_WITH_RSA => SignatureAlgorithm::Rsa(DigestAlgorithm::Sha512),
            ECDSA_WITH_SHA1 => SignatureAlgorithm::Ecdsa(DigestAlgorithm::Sha1),
            ECDSA_WITH_SHA224 => SignatureAlgorithm::Ecdsa(DigestAlgorithm::Sha224),
            ECDSA_WITH_SHA256 => SignatureAlgorithm::Ecdsa(DigestAlgorithm::Sha256),
            ECDSA_WITH_SHA384 => SignatureAlgorithm::Ecdsa(DigestAlgorithm::Sha384),
            ECDSA_WITH_SHA512 => SignatureAlgorithm::Ecdsa(DigestAlgorithm::Sha512),
            ED25519 => SignatureAlgorithm::Ed25519,
            _ => return None,
        };
        Some(alg)
    }

    /// Short name of the algorithm, spelled the way OpenSSL's object table does.
    pub fn short_name(self) -> &'static str {
        match self {
            SignatureAlgorithm::Rsa(d) => match d {
                DigestAlgorithm::Md5 => "RSA-MD5",
                DigestAlgorithm::Sha1 => "RSA-SHA1",
                DigestAlgorithm::Sha224 => "RSA-SHA224",
                DigestAlgorithm::Sha256 => "RSA-SHA256",
                DigestAlgorithm::Sha384 => "RSA-SHA384",
                DigestAlgorithm::Sha512 => "RSA-SHA512",
            },
            SignatureAlgorithm::Ecdsa(d) => match d {
                DigestAlgorithm::Md5 | DigestAlgorithm::Sha1 => "ecdsa-with-SHA1",
                DigestAlgorithm::Sha224 => "ecdsa-with-SHA224",
                DigestAlgorithm::Sha256 => "ecdsa-with-SHA256",
                DigestAlgorithm::Sha384 => "ecdsa-with-SHA384",
                DigestAlgorithm::Sha512 => "ecdsa-with-SHA512",
            },
            SignatureAlgorithm::Ed25519 => "ED25519",
        }
    }

    /// Key family the algorithm belongs to.
    pub fn kind(self) -> SignatureKind {
        match self {
            SignatureAlgorithm::Rsa(_) => SignatureKind::Rsa,
            SignatureAlgorithm::Ecdsa(_) => SignatureKind::Ecdsa,
            SignatureAlgorithm::Ed25519 => SignatureKind::Ed25519,
        }
    }

    /// The digest applied before signing, if any.
    pub fn digest(self) -> Option<DigestAlgorithm> {
        match self {
            SignatureAlgorithm::Rsa(d) | SignatureAlgorithm::Ecdsa(d) => Some(d),
            SignatureAlgorithm::Ed25519 => None,
        }
    }
}

impl From<SignatureAlgorithm> for AlgorithmIdentifierOwned {
    /// Converts a `SignatureAlgorithm` into an `AlgorithmIdentifierOwned`.
    ///
    /// RSA algorithms carry an explicit NULL parameter (RFC 4055), the others
    /// omit parameters.
    fn from(value: SignatureAlgorithm) -> Self {
        let parameters = match value {
            SignatureAlgorithm::Rsa(_) => Some(Any::null()),
            SignatureAlgorithm::Ecdsa(_) | SignatureAlgorithm::Ed25519 => None,
        };
        AlgorithmIdentifierOwned {
            oid: value.oid(),
            parameters,
        }
    }
}

/// Format bytes as colon-separated uppercase hex (e.g., "AB:CD:EF").
pub fn hex_colon_upper(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}
