//! use x509kit::error::X509KitError;

use thiserror::Error;

/// Represents errors that can occur in the x509kit library.
///
/// This enum provides detailed error messages for various failure scenarios.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum X509KitError {
    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// Error due to invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A typed view was requested over a value of a different type.
    #[error("Invalid type: {0}")]
    InvalidType(String),

    /// A time string that is not a valid ASN.1 time.
    #[error("Invalid time string: {0:?}")]
    InvalidTime(String),

    /// The requested message digest is not known.
    #[error("No such digest method: {0}")]
    UnknownDigest(String),

    /// The certificate carries no signature algorithm, or one that is not known.
    #[error("Undefined signature algorithm")]
    UndefinedSignatureAlgorithm,

    /// A signing operation was attempted with a public-only key.
    #[error("Key has only public part")]
    PublicKeyOnly,

    /// A key operation was attempted on a key with no material.
    #[error("Key is uninitialized")]
    UninitializedKey,

    /// No extension exists at the requested position.
    #[error("extension index out of bounds: index {index}, count {count}")]
    IndexOutOfBounds { index: usize, count: usize },

    /// The key algorithm is not supported by this library.
    #[error("Unsupported key: {0}")]
    UnsupportedKey(String),

    /// Error during key generation.
    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    /// Error related to certificate operations.
    #[error("Certificate error: {0}")]
    CertificateError(String),

    /// Error produced by a signature primitive.
    #[error("Signature error: {0}")]
    SignatureError(String),

    /// Error from RSA operations.
    #[error("RSA error: {0}")]
    RsaError(String),

    /// Error from RSA PKCS1 operations.
    #[error("RSA PKCS1 error: {0}")]
    RsaPkcs1Error(String),

    /// Error while reading a file.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<der::Error> for X509KitError {
    /// Converts a `der::Error` into a `X509KitError`.
    fn from(err: der::Error) -> Self {
        X509KitError::DecodingError(err.to_string())
    }
}

impl From<rsa::Error> for X509KitError {
    fn from(err: rsa::Error) -> Self {
        X509KitError::RsaError(err.to_string())
    }
}

impl From<rsa::pkcs1::Error> for X509KitError {
    fn from(err: rsa::pkcs1::Error) -> Self {
        X509KitError::RsaPkcs1Error(err.to_string())
    }
}

impl From<spki::Error> for X509KitError {
    fn from(err: spki::Error) -> Self {
        X509KitError::DecodingError(err.to_string())
    }
}

impl From<ecdsa::signature::Error> for X509KitError {
    fn from(err: ecdsa::signature::Error) -> Self {
        X509KitError::SignatureError(err.to_string())
    }
}

impl From<pem::PemError> for X509KitError {
    fn from(err: pem::PemError) -> Self {
        X509KitError::DecodingError(err.to_string())
    }
}

impl From<std::io::Error> for X509KitError {
    fn from(err: std::io::Error) -> Self {
        X509KitError::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, X509KitError>;
