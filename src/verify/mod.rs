//! Certificate chain verification against a trust store.
//!
//! The chain is built from the trust store alone: the certificate under test
//! is the only untrusted member. Checks run in OpenSSL's order and the first
//! failure is reported as a [`VerifyStatus`] carrying OpenSSL's
//! `X509_V_ERR_*` code.

mod chain;
pub mod crl;
mod store;

use std::fmt;
use std::path::PathBuf;

use bon::Builder;
use log::{debug, warn};
use time::OffsetDateTime;

use crate::cert::Certificate;
pub use store::TrustStore;

/// Chain depth allowed when none is configured.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Options controlling a verification.
///
/// # Example
/// ```
/// use x509kit::verify::VerifyOptions;
///
/// let options = VerifyOptions::builder()
///     .files(vec!["ca.pem".into()])
///     .check_crls(true)
///     .build();
/// assert_eq!(options.max_depth, 100);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct VerifyOptions {
    /// Also require an up to date CRL for every certificate below the trust
    /// anchor and reject revoked ones.
    #[builder(default)]
    pub check_crls: bool,
    /// PEM or DER files holding trusted certificates and CRLs.
    #[builder(default)]
    pub files: Vec<PathBuf>,
    /// Hashed directories in the `c_rehash` layout.
    #[builder(default)]
    pub dirs: Vec<PathBuf>,
    /// Verification time; the current time when unset.
    pub at_time: Option<OffsetDateTime>,
    /// Maximum number of intermediate certificates.
    #[builder(default = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        VerifyOptions::builder().build()
    }
}

/// Outcome of a verification, numbered as OpenSSL's `X509_V_*` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum VerifyStatus {
    Ok = 0,
    UnableToGetIssuerCert = 2,
    UnableToGetCrl = 3,
    UnableToDecodeIssuerPublicKey = 6,
    CertSignatureFailure = 7,
    CrlSignatureFailure = 8,
    CertNotYetValid = 9,
    CertHasExpired = 10,
    CrlNotYetValid = 11,
    CrlHasExpired = 12,
    ErrorInCertNotBeforeField = 13,
    ErrorInCertNotAfterField = 14,
    ErrorInCrlLastUpdateField = 15,
    ErrorInCrlNextUpdateField = 16,
    DepthZeroSelfSignedCert = 18,
    UnableToGetIssuerCertLocally = 20,
    CertChainTooLong = 22,
    CertRevoked = 23,
    InvalidCa = 24,
    PathLengthExceeded = 25,
    KeyUsageNoCertSign = 32,
    UnhandledCriticalExtension = 34,
}

impl VerifyStatus {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn is_valid(self) -> bool {
        self == VerifyStatus::Ok
    }

    fn message(self) -> &'static str {
        match self {
            VerifyStatus::Ok => "ok",
            VerifyStatus::UnableToGetIssuerCert => "unable to get issuer certificate",
            VerifyStatus::UnableToGetCrl => "unable to get certificate CRL",
            VerifyStatus::UnableToDecodeIssuerPublicKey => "unable to decode issuer public key",
            VerifyStatus::CertSignatureFailure => "certificate signature failure",
            VerifyStatus::CrlSignatureFailure => "CRL signature failure",
            VerifyStatus::CertNotYetValid => "certificate is not yet valid",
            VerifyStatus::CertHasExpired => "certificate has expired",
            VerifyStatus::CrlNotYetValid => "CRL is not yet valid",
            VerifyStatus::CrlHasExpired => "CRL has expired",
            VerifyStatus::ErrorInCertNotBeforeField => "format error in certificate's notBefore field",
            VerifyStatus::ErrorInCertNotAfterField => "format error in certificate's notAfter field",
            VerifyStatus::ErrorInCrlLastUpdateField => "format error in CRL's lastUpdate field",
            VerifyStatus::ErrorInCrlNextUpdateField => "format error in CRL's nextUpdate field",
            VerifyStatus::DepthZeroSelfSignedCert => "self-signed certificate",
            VerifyStatus::UnableToGetIssuerCertLocally => "unable to get local issuer certificate",
            VerifyStatus::CertChainTooLong => "certificate chain too long",
            VerifyStatus::CertRevoked => "certificate revoked",
            VerifyStatus::InvalidCa => "invalid CA certificate",
            VerifyStatus::PathLengthExceeded => "path length constraint exceeded",
            VerifyStatus::KeyUsageNoCertSign => "key usage does not include certificate signing",
            VerifyStatus::UnhandledCriticalExtension => "unhandled critical extension",
        }
    }
}

impl fmt::Display for VerifyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Builds a trust store from `options` and verifies `cert` against it.
///
/// Files and directories that cannot be read are skipped with a warning.
pub(crate) fn verify_certificate(cert: &Certificate, options: &VerifyOptions) -> VerifyStatus {
    let mut store = TrustStore::new();
    for file in &options.files {
        if let Err(e) = store.add_file(file) {
            warn!("skipping trust file {}: {}", file.display(), e);
        }
    }
    for dir in &options.dirs {
        if dir.is_dir() {
            store.add_hashed_dir(dir.clone());
        } else {
            warn!("skipping trust directory {}: not a directory", dir.display());
        }
    }
    verify_with_store(cert, &store, options)
}

/// Verifies `cert` against an already populated trust store.
///
/// The `files` and `dirs` of `options` are ignored.
pub fn verify_with_store(
    cert: &Certificate,
    store: &TrustStore,
    options: &VerifyOptions,
) -> VerifyStatus {
    let now = options.at_time.unwrap_or_else(OffsetDateTime::now_utc);
    debug!("verifying {} against {:?}", cert.subject(), store);

    let outcome = chain::build_chain(cert, store, options.max_depth).and_then(|built| {
        chain::check_extensions(&built)?;
        if options.check_crls {
            chain::check_revocation(&built, store, now)?;
        }
        chain::check_signatures_and_times(&built, now)?;
        Ok(built.len())
    });

    match outcome {
        Ok(length) => {
            debug!("{} verified with a chain of {}", cert.subject(), length);
            VerifyStatus::Ok
        }
        Err(failure) => {
            debug!(
                "verification of {} failed at depth {}: {} ({})",
                cert.subject(),
                failure.depth,
                failure.status,
                failure.status.code()
            );
            failure.status
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let options = VerifyOptions::default();
        assert!(!options.check_crls);
        assert!(options.files.is_empty());
        assert!(options.dirs.is_empty());
        assert_eq!(options.at_time, None);
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn status_codes_and_messages() {
        assert_eq!(VerifyStatus::Ok.code(), 0);
        assert!(VerifyStatus::Ok.is_valid());
        assert_eq!(VerifyStatus::CertHasExpired.code(), 10);
        assert_eq!(VerifyStatus::UnableToGetIssuerCertLocally.code(), 20);
        assert_eq!(VerifyStatus::CertRevoked.to_string(), "certificate revoked");
        assert!(!VerifyStatus::UnableToGetCrl.is_valid());
    }

    #[test]
    fn untrusted_self_issued_certificate() {
        let cert = Certificate::new();
        assert_eq!(
            verify_with_store(&cert, &TrustStore::new(), &VerifyOptions::default()),
            VerifyStatus::DepthZeroSelfSignedCert
        );
    }
}
