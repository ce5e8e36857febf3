//! Trusted certificates and CRLs used while verifying.
//!
//! Files are read eagerly. Directories are searched lazily, the way OpenSSL's
//! `-CApath` lookup works: a certificate whose subject hashes to `h` lives in
//! `<h>.0`, `<h>.1`, ... and a CRL for issuer `h` in `<h>.r0`, `<h>.r1`, ...
//! The search in a directory stops at the first missing index.

use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use super::crl::Crl;
use crate::cert::Certificate;
use crate::cert::name::DistinguishedNameRef;
use crate::error::{Result, X509KitError};
use crate::pem_utils::{CERTIFICATE_LABEL, CRL_LABEL, pem_blocks};

const TRUSTED_CERTIFICATE_LABEL: &str = "TRUSTED CERTIFICATE";

/// A set of trusted CA certificates and revocation lists.
#[derive(Clone, Default)]
pub struct TrustStore {
    certificates: Vec<Certificate>,
    crls: Vec<Crl>,
    dirs: Vec<PathBuf>,
}

impl fmt::Debug for TrustStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustStore")
            .field("certificates", &self.certificates.len())
            .field("crls", &self.crls.len())
            .field("dirs", &self.dirs)
            .finish()
    }
}

impl TrustStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_certificate(&mut self, cert: Certificate) {
        self.certificates.push(cert);
    }

    pub fn add_crl(&mut self, crl: Crl) {
        self.crls.push(crl);
    }

    /// Loads every certificate and CRL in a file.
    ///
    /// PEM files may hold any mix of `CERTIFICATE` and `X509 CRL` blocks;
    /// other blocks are skipped. A file without PEM blocks is read as a single
    /// DER certificate or CRL. Returns the number of objects loaded.
    pub fn add_file(&mut self, path: &Path) -> Result<usize> {
        let data = std::fs::read(path).map_err(|e| {
            X509KitError::Io(format!("{}: {}", path.display(), e))
        })?;

        let blocks = pem_blocks(&data)?;
        if blocks.is_empty() {
            return self.add_der(&data).map(|()| 1);
        }

        let mut added = 0;
        for (label, der) in blocks {
            match label.as_str() {
                CERTIFICATE_LABEL | TRUSTED_CERTIFICATE_LABEL => {
                    self.certificates.push(Certificate::from_der(&der)?);
                    added += 1;
                }
                CRL_LABEL => {
                    self.crls.push(Crl::from_der(&der)?);
                    added += 1;
                }
                other => debug!("skipping {} block in {}", other, path.display()),
            }
        }
        debug!("loaded {} objects from {}", added, path.display());
        Ok(added)
    }

    fn add_der(&mut self, der: &[u8]) -> Result<()> {
        match Certificate::from_der(der) {
            Ok(cert) => self.certificates.push(cert),
            Err(cert_error) => match Crl::from_der(der) {
                Ok(crl) => self.crls.push(crl),
                Err(_) => return Err(cert_error),
            },
        }
        Ok(())
    }

    /// Registers a hashed directory for lookups.
    pub fn add_hashed_dir(&mut self, dir: impl Into<PathBuf>) {
        self.dirs.push(dir.into());
    }

    /// Number of objects loaded in memory; directory contents are not counted.
    pub fn len(&self) -> usize {
        self.certificates.len() + self.crls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Trusted certificates whose subject matches `name`.
    pub fn certificates_by_subject(&self, name: DistinguishedNameRef<'_>) -> Vec<Certificate> {
        let mut found: Vec<Certificate> = self
            .certificates
            .iter()
            .filter(|cert| cert.subject().matches(name))
            .cloned()
            .collect();

        for path in self.hashed_paths(name, "") {
            match load_pem_objects(&path, CERTIFICATE_LABEL, Certificate::from_der) {
                Ok(certs) => found.extend(certs.into_iter().filter(|c| c.subject().matches(name))),
                Err(e) => warn!("skipping {}: {}", path.display(), e),
            }
        }
        found
    }

    /// Revocation lists whose issuer matches `name`.
    pub fn crls_by_issuer(&self, name: DistinguishedNameRef<'_>) -> Vec<Crl> {
        let mut found: Vec<Crl> = self
            .crls
            .iter()
            .filter(|crl| crl.issuer().matches(name))
            .cloned()
            .collect();

        for path in self.hashed_paths(name, "r") {
            match load_pem_objects(&path, CRL_LABEL, Crl::from_der) {
                Ok(crls) => found.extend(crls.into_iter().filter(|c| c.issuer().matches(name))),
                Err(e) => warn!("skipping {}: {}", path.display(), e),
            }
        }
        found
    }

    /// Existing `<hash>.<prefix><n>` files across all registered directories.
    fn hashed_paths(&self, name: DistinguishedNameRef<'_>, prefix: &str) -> Vec<PathBuf> {
        if self.dirs.is_empty() {
            return Vec::new();
        }
        let hash = match name.hash() {
            Ok(hash) => hash,
            Err(e) => {
                warn!("cannot hash name {}: {}", name, e);
                return Vec::new();
            }
        };

        let mut paths = Vec::new();
        for dir in &self.dirs {
            for index in 0.. {
                let path = dir.join(format!("{:08x}.{}{}", hash, prefix, index));
                if !path.is_file() {
                    break;
                }
                paths.push(path);
            }
        }
        paths
    }
}

fn load_pem_objects<T>(path: &Path, label: &str, parse: fn(&[u8]) -> Result<T>) -> Result<Vec<T>> {
    let data = std::fs::read(path).map_err(|e| X509KitError::Io(e.to_string()))?;
    pem_blocks(&data)?
        .into_iter()
        .filter(|(block_label, _)| block_label == label)
        .map(|(_, der)| parse(&der))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::name::DistinguishedName;
    use crate::key::KeyPair;

    fn self_signed(cn: &str) -> Certificate {
        let key = KeyPair::generate_ed25519();
        let name = DistinguishedName::builder()
            .common_name(cn.to_string())
            .build()
            .unwrap();
        let mut cert = Certificate::new();
        cert.set_subject(&name);
        cert.set_issuer(&name);
        cert.set_public_key(&key).unwrap();
        cert.set_not_before("20240101000000Z").unwrap();
        cert.set_not_after("20440101000000Z").unwrap();
        cert.sign(&key, "sha256").unwrap();
        cert
    }

    #[test]
    fn file_with_several_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.pem");
        let first = self_signed("first");
        let second = self_signed("second");
        let bundle = format!("{}{}", first.to_pem().unwrap(), second.to_pem().unwrap());
        std::fs::write(&path, bundle).unwrap();

        let mut store = TrustStore::new();
        assert_eq!(store.add_file(&path).unwrap(), 2);
        assert_eq!(store.certificates_by_subject(second.subject()), vec![second]);
    }

    #[test]
    fn der_file_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ca.der");
        let cert = self_signed("der");
        std::fs::write(&path, cert.to_der().unwrap()).unwrap();

        let mut store = TrustStore::new();
        assert_eq!(store.add_file(&path).unwrap(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn hashed_directory_lookup_stops_at_gap() {
        let dir = tempfile::tempdir().unwrap();
        let cert = self_signed("hashed");
        let hash = cert.subject_name_hash().unwrap();
        std::fs::write(dir.path().join(format!("{:08x}.0", hash)), cert.to_pem().unwrap()).unwrap();
        std::fs::write(dir.path().join(format!("{:08x}.2", hash)), cert.to_pem().unwrap()).unwrap();

        let mut store = TrustStore::new();
        store.add_hashed_dir(dir.path());
        assert!(store.is_empty());
        assert_eq!(store.certificates_by_subject(cert.subject()).len(), 1);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let mut store = TrustStore::new();
        let err = store.add_file(Path::new("/nonexistent/x509kit/ca.pem")).unwrap_err();
        assert!(matches!(err, X509KitError::Io(_)));
    }
}
