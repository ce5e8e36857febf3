//! # x509kit - An X.509 Certificate Object Model in Pure Rust
//!
//! x509kit provides a mutable X.509 certificate built on the rustcrypto libraries:
//! create a certificate, set its fields one by one (version, serial number, names,
//! public key, validity window, extensions), sign it, compute fingerprints, check
//! expiry and verify it against a trust store of CA certificates and CRLs, with
//! results reported as OpenSSL's verification codes.
//!
//! ## Supported Key Types
//!
//! - **RSA**: PKCS#1 v1.5 signatures with MD5, SHA-1 and SHA-2 digests
//! - **ECDSA**: P-256 and P-384 curves
//! - **Ed25519**: Edwards curve digital signature algorithm
//!
//! ## Key Features
//!
//! - **Arbitrary serial numbers**: no 64-bit limit, hexadecimal import/export
//! - **Borrowed name views**: issuer and subject views tied to the certificate's lifetime
//! - **Shared keys**: a certificate's public key shares material with the key it was set from
//! - **OpenSSL compatibility**: subject name hashes, `c_rehash` directories, `X509_V_*` codes
//! - **Format flexibility**: import/export in both PEM and DER formats
//!
//! ## Quick Start
//!
//! ### Building and Signing a Certificate
//!
//! ```rust
//! use x509kit::{cert::Certificate, cert::name::DistinguishedName, key::KeyPair};
//!
//! # fn main() -> Result<(), x509kit::error::X509KitError> {
//! let key = KeyPair::generate_ecdsa_p256();
//! let name = DistinguishedName::builder()
//!     .common_name("example.com".to_string())
//!     .organization("Example Corp".to_string())
//!     .country("US".to_string())
//!     .build()?;
//!
//! let mut cert = Certificate::new();
//! cert.set_version(2);
//! cert.set_serial_number(0x1000u32);
//! cert.set_subject(&name);
//! cert.set_issuer(&name);
//! cert.set_public_key(&key)?;
//! cert.gmtime_adj_not_before(0)?;
//! cert.gmtime_adj_not_after(365 * 24 * 60 * 60)?;
//! cert.sign(&key, "sha256")?;
//!
//! assert_eq!(cert.signature_algorithm()?, "ecdsa-with-SHA256");
//! println!("{}", cert.digest("sha256")?);
//! # Ok(())
//! # }
//! ```
//!
//! ### Issuing and Verifying a Chain
//!
//! ```rust,no_run
//! use x509kit::{
//!     cert::{Certificate, name::DistinguishedName},
//!     issuer::{CertificateWithPrivateKey, CertificationRequestInfo, Issuer, Validity},
//!     key::KeyPair,
//!     verify::{VerifyOptions, VerifyStatus},
//! };
//!
//! # fn main() -> Result<(), x509kit::error::X509KitError> {
//! let ca_key = KeyPair::generate_ecdsa_p256();
//! let ca_info = CertificationRequestInfo::builder()
//!     .subject(DistinguishedName::builder().common_name("Example CA".to_string()).build()?)
//!     .subject_public_key(ca_key.clone())
//!     .is_ca(true)
//!     .build();
//! let ca = CertificateWithPrivateKey {
//!     cert: Certificate::new_self_signed(&ca_info, &ca_key, Validity::for_days(3650))?,
//!     key: ca_key,
//! };
//! std::fs::write("ca.pem", ca.cert.to_pem()?)?;
//!
//! let server_key = KeyPair::generate_ed25519();
//! let server_info = CertificationRequestInfo::builder()
//!     .subject(DistinguishedName::builder().common_name("server.example.com".to_string()).build()?)
//!     .subject_public_key(server_key.public_only())
//!     .build();
//! let server = ca.issue(&server_info, Validity::for_days(365))?;
//!
//! let options = VerifyOptions::builder().files(vec!["ca.pem".into()]).build();
//! assert_eq!(server.verify(&options), VerifyStatus::Ok);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`cert`]: The certificate entity, names, extensions and time handling
//! - [`key`]: Key generation and signing/verification
//! - [`issuer`]: Certificate issuing functionality and CA operations
//! - [`verify`]: Trust stores, CRLs and chain verification
//! - [`pki`]: Digest and signature algorithm identifiers
//! - [`error`]: Error types

pub mod cert;
pub mod error;
pub mod issuer;
pub mod key;
pub mod pem_utils;
pub mod pki;
pub(crate) mod tbs_certificate;
pub mod verify;

pub use cert::Certificate;
pub use error::{Result, X509KitError};
pub use key::KeyPair;
pub use verify::{VerifyOptions, VerifyStatus};
