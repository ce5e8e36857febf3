mod util;

use std::path::PathBuf;

use num_bigint_dig::BigInt;
use pretty_assertions::assert_eq;
use regex::Regex;
use rstest::rstest;
use tempfile::TempDir;
use time::{Duration, OffsetDateTime};
use x509kit::cert::Certificate;
use x509kit::cert::extensions::{
    BasicConstraints, Extension, GeneralNameType, KeyUsage, KeyUsages, SubjectAltName,
    SubjectAltNameEntry,
};
use x509kit::error::X509KitError;
use x509kit::issuer::{CertificateWithPrivateKey, Validity};
use x509kit::key::KeyPair;
use x509kit::verify::crl::{Crl, CrlParams};
use x509kit::verify::{TrustStore, VerifyOptions, VerifyStatus, verify_with_store};

pub type Result<T> = std::result::Result<T, X509KitError>;

fn write_pem(dir: &TempDir, file_name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(file_name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn verify_with_files(cert: &Certificate, files: Vec<PathBuf>, check_crls: bool) -> VerifyStatus {
    cert.verify(
        &VerifyOptions::builder()
            .files(files)
            .check_crls(check_crls)
            .build(),
    )
}

fn crl_pem(ca: &CertificateWithPrivateKey, revoked: Vec<BigInt>, next_update: OffsetDateTime) -> String {
    CrlParams::builder()
        .issuer(ca.cert.subject().to_owned_name())
        .revoked(revoked)
        .this_update(OffsetDateTime::now_utc() - Duration::hours(1))
        .next_update(next_update)
        .build()
        .sign(&ca.key)
        .unwrap()
        .to_pem()
        .unwrap()
}

#[rstest]
#[case("0")]
#[case("1")]
#[case("18446744073709551616")]
#[case("1606938044258990275541962092341162602522202993782792835301376")]
#[case("-42")]
fn serial_number_roundtrips(#[case] decimal: &str) -> Result<()> {
    let serial = BigInt::parse_bytes(decimal.as_bytes(), 10).unwrap();
    let key = KeyPair::generate_ed25519();
    let mut cert = Certificate::new();
    cert.set_serial_number(serial.clone());
    assert_eq!(cert.serial_number(), &serial);

    let mut copy = Certificate::new();
    copy.set_serial_number_hex(&cert.serial_number_hex())?;
    assert_eq!(copy.serial_number(), &serial);

    cert.set_public_key(&key)?;
    cert.sign(&key, "sha256")?;
    assert_eq!(Certificate::from_der(&cert.to_der()?)?.serial_number(), &serial);
    Ok(())
}

#[test]
fn extensions_add_get_and_delete() -> Result<()> {
    let mut cert = Certificate::new();
    let first = Extension::from_extension(
        &BasicConstraints {
            is_ca: false,
            max_path_length: None,
        },
        true,
    )?;
    let second = Extension::from_extension(&KeyUsage(KeyUsages::DigitalSignature.into()), false)?;
    let third = Extension::from_extension(&SubjectAltName::dns(["example.com"]), false)?;

    cert.add_extensions([first.clone(), second.clone(), third.clone()]);
    assert_eq!(cert.extension_count(), 3);
    assert_eq!(cert.extension(0)?, first);
    assert_eq!(cert.extension(1)?, second);
    assert_eq!(cert.extension(2)?, third);
    assert_eq!(cert.extension(1)?.short_name(), "keyUsage");

    // Returned extensions are copies
    let mut copy = cert.extension(0)?;
    copy.set_critical(false);
    assert!(cert.extension(0)?.critical());

    cert.delete_extension(1)?;
    assert_eq!(cert.extension_count(), 2);
    assert_eq!(cert.extension(1)?, third);

    cert.delete_extension(1)?;
    assert_eq!(
        cert.extension(1).unwrap_err(),
        X509KitError::IndexOutOfBounds { index: 1, count: 1 }
    );
    assert!(cert.delete_extension(5).is_err());
    Ok(())
}

#[test]
fn validity_times() -> Result<()> {
    let mut cert = Certificate::new();
    assert_eq!(cert.not_before()?, None);
    assert_eq!(cert.not_after()?, None);

    cert.set_not_before("20240101000000Z")?;
    assert_eq!(cert.not_before()?.as_deref(), Some("20240101000000Z"));

    cert.set_not_after("20300615120000+0130")?;
    assert_eq!(cert.not_after()?.as_deref(), Some("20300615120000+0130"));

    assert!(matches!(
        cert.set_not_before("2024-01-01"),
        Err(X509KitError::InvalidTime(_))
    ));
    assert!(matches!(
        cert.set_not_after("\u{0662}\u{0660}\u{0662}\u{0664}0101000000Z"),
        Err(X509KitError::InvalidTime(_))
    ));
    assert_eq!(cert.not_after()?.as_deref(), Some("20300615120000+0130"));
    assert_eq!(cert.not_before()?.as_deref(), Some("20240101000000Z"));

    // Times set from an instant are stored as UTCTime but read back generalized
    cert.set_not_before_instant(time::macros::datetime!(1999-12-31 23:59:59 UTC))?;
    assert_eq!(cert.not_before()?.as_deref(), Some("19991231235959Z"));
    Ok(())
}

#[test]
fn has_expired_follows_not_after() -> Result<()> {
    let mut cert = Certificate::new();
    cert.gmtime_adj_not_after(-60)?;
    assert!(cert.has_expired());
    cert.gmtime_adj_not_after(3600)?;
    assert!(!cert.has_expired());
    Ok(())
}

#[test]
fn sign_with_public_only_key_fails() -> Result<()> {
    let key = KeyPair::generate_ecdsa_p256();
    let mut cert = Certificate::new();
    cert.set_public_key(&key)?;

    assert_eq!(
        cert.sign(&key.public_only(), "sha256").unwrap_err(),
        X509KitError::PublicKeyOnly
    );
    assert_eq!(cert.signature(), None);
    assert_eq!(
        cert.signature_algorithm().unwrap_err(),
        X509KitError::UndefinedSignatureAlgorithm
    );
    Ok(())
}

#[test]
fn subject_alt_name_entries_in_order() -> Result<()> {
    let mut cert = Certificate::new();
    assert_eq!(cert.subject_alt_name()?, None);

    let san = SubjectAltName {
        names: vec![
            SubjectAltNameEntry::Dns("example.com".to_string()),
            SubjectAltNameEntry::Ip("127.0.0.1".parse().unwrap()),
        ],
    };
    cert.add_extensions([Extension::from_extension(&san, false)?]);
    assert_eq!(
        cert.subject_alt_name()?,
        Some(vec![
            (GeneralNameType::Dns, "example.com".to_string()),
            (GeneralNameType::IpAddress, "127.0.0.1".to_string()),
        ])
    );
    Ok(())
}

#[rstest]
#[case("sha256", 32)]
#[case("SHA1", 20)]
#[case("sha-512", 64)]
#[case("md5", 16)]
fn digest_is_colon_separated_hex(#[case] digest: &str, #[case] size: usize) -> Result<()> {
    let ca = util::generate_ca_cert();
    let fingerprint = ca.cert.digest(digest)?;
    let pattern = Regex::new(r"^[0-9A-F]{2}(:[0-9A-F]{2})*$").unwrap();
    assert!(pattern.is_match(&fingerprint), "{}", fingerprint);
    assert_eq!(fingerprint.len(), 3 * size - 1);
    Ok(())
}

#[test]
fn unknown_digest_is_rejected() {
    let ca = util::generate_ca_cert();
    assert!(matches!(
        ca.cert.digest("sha3-1000"),
        Err(X509KitError::UnknownDigest(_))
    ));
}

#[test]
fn verify_valid_chain() {
    let dir = TempDir::new().unwrap();
    let ca = util::generate_ca_cert();
    let server = util::issue_server_cert(&ca, Validity::for_days(365));
    let ca_file = write_pem(&dir, "valid_ca.pem", &ca.cert.to_pem().unwrap());

    assert_eq!(verify_with_files(&server, vec![ca_file.clone()], false), VerifyStatus::Ok);
    assert_eq!(verify_with_files(&ca.cert, vec![ca_file], false), VerifyStatus::Ok);
}

#[test]
fn verify_expired_certificate() {
    let dir = TempDir::new().unwrap();
    let ca = util::generate_ca_cert();
    let server = util::issue_server_cert(&ca, util::window_ending(1, 30));
    let ca_file = write_pem(&dir, "ca.pem", &ca.cert.to_pem().unwrap());

    let status = verify_with_files(&server, vec![ca_file], false);
    assert_eq!(status, VerifyStatus::CertHasExpired);
    assert_eq!(status.code(), 10);
}

#[test]
fn verify_not_yet_valid_certificate() {
    let dir = TempDir::new().unwrap();
    let ca = util::generate_ca_cert();
    let start = OffsetDateTime::now_utc() + Duration::days(2);
    let server = util::issue_server_cert(
        &ca,
        Validity {
            not_before: start,
            not_after: start + Duration::days(30),
        },
    );
    let ca_file = write_pem(&dir, "ca.pem", &ca.cert.to_pem().unwrap());

    assert_eq!(
        verify_with_files(&server, vec![ca_file.clone()], false),
        VerifyStatus::CertNotYetValid
    );
    let at_time = VerifyOptions::builder()
        .files(vec![ca_file])
        .at_time(start + Duration::days(1))
        .build();
    assert_eq!(server.verify(&at_time), VerifyStatus::Ok);
}

#[test]
fn verify_without_trusted_issuer() {
    let dir = TempDir::new().unwrap();
    let ca = util::generate_ca_cert();
    let other_ca = util::generate_ca_cert();
    let server = util::issue_server_cert(&ca, Validity::for_days(365));
    let other_file = write_pem(&dir, "other.pem", &other_ca.cert.to_pem().unwrap());

    assert_eq!(
        verify_with_files(&server, vec![], false),
        VerifyStatus::UnableToGetIssuerCertLocally
    );
    // Same subject name, different key
    assert_eq!(
        verify_with_files(&server, vec![other_file], false),
        VerifyStatus::UnableToGetIssuerCertLocally
    );
    assert_eq!(
        verify_with_files(&ca.cert, vec![], false),
        VerifyStatus::DepthZeroSelfSignedCert
    );
}

#[test]
fn verify_skips_unreadable_files() {
    let dir = TempDir::new().unwrap();
    let ca = util::generate_ca_cert();
    let server = util::issue_server_cert(&ca, Validity::for_days(365));
    let ca_file = write_pem(&dir, "ca.pem", &ca.cert.to_pem().unwrap());
    let garbage = write_pem(&dir, "garbage.pem", "not a certificate");

    let status = verify_with_files(
        &server,
        vec![dir.path().join("missing.pem"), garbage, ca_file],
        false,
    );
    assert_eq!(status, VerifyStatus::Ok);
}

#[test]
fn verify_with_crls() {
    let dir = TempDir::new().unwrap();
    let ca = util::generate_ca_cert();
    let server = util::issue_server_cert(&ca, Validity::for_days(365));
    let ca_pem = ca.cert.to_pem().unwrap();
    let next_week = OffsetDateTime::now_utc() + Duration::days(7);

    let ca_only = write_pem(&dir, "ca.pem", &ca_pem);
    assert_eq!(
        verify_with_files(&server, vec![ca_only.clone()], true),
        VerifyStatus::UnableToGetCrl
    );
    assert_eq!(verify_with_files(&server, vec![ca_only], false), VerifyStatus::Ok);

    let clean = format!("{}{}", ca_pem, crl_pem(&ca, vec![], next_week));
    let clean = write_pem(&dir, "clean.pem", &clean);
    assert_eq!(verify_with_files(&server, vec![clean], true), VerifyStatus::Ok);

    let revoked = crl_pem(&ca, vec![server.serial_number().clone()], next_week);
    let ca_file = write_pem(&dir, "ca_again.pem", &ca_pem);
    let crl_file = write_pem(&dir, "revoked.crl", &revoked);
    let status = verify_with_files(&server, vec![ca_file.clone(), crl_file], true);
    assert_eq!(status, VerifyStatus::CertRevoked);
    assert_eq!(status.code(), 23);

    let stale = crl_pem(&ca, vec![], OffsetDateTime::now_utc() - Duration::minutes(5));
    let stale_file = write_pem(&dir, "stale.crl", &stale);
    assert_eq!(
        verify_with_files(&server, vec![ca_file, stale_file], true),
        VerifyStatus::CrlHasExpired
    );
}

#[test]
fn verify_with_in_memory_store() {
    let ca = util::generate_ca_cert();
    let server = util::issue_server_cert(&ca, Validity::for_days(365));
    let options = VerifyOptions::builder().check_crls(true).build();

    let mut store = TrustStore::new();
    store.add_certificate(ca.cert.clone());
    assert_eq!(
        verify_with_store(&server, &store, &options),
        VerifyStatus::UnableToGetCrl
    );

    let next_week = OffsetDateTime::now_utc() + Duration::days(7);
    let revoked = crl_pem(&ca, vec![server.serial_number().clone()], next_week);
    store.add_crl(Crl::from_pem(&revoked).unwrap());
    assert_eq!(store.len(), 2);
    assert_eq!(
        verify_with_store(&server, &store, &options),
        VerifyStatus::CertRevoked
    );
    assert_eq!(
        verify_with_store(&ca.cert, &store, &options),
        VerifyStatus::Ok
    );
}

#[test]
fn verify_with_hashed_directory() {
    let dir = TempDir::new().unwrap();
    let ca = util::generate_ca_cert();
    let server = util::issue_server_cert(&ca, Validity::for_days(365));
    let hash = ca.cert.subject_name_hash().unwrap();
    write_pem(&dir, &format!("{:08x}.0", hash), &ca.cert.to_pem().unwrap());

    let options = VerifyOptions::builder()
        .dirs(vec![dir.path().to_path_buf()])
        .build();
    assert_eq!(server.verify(&options), VerifyStatus::Ok);

    let crl_options = VerifyOptions::builder()
        .dirs(vec![dir.path().to_path_buf()])
        .check_crls(true)
        .build();
    assert_eq!(server.verify(&crl_options), VerifyStatus::UnableToGetCrl);

    let next_week = OffsetDateTime::now_utc() + Duration::days(7);
    write_pem(&dir, &format!("{:08x}.r0", hash), &crl_pem(&ca, vec![], next_week));
    assert_eq!(server.verify(&crl_options), VerifyStatus::Ok);
}

#[test]
fn verify_rejects_non_ca_issuer() {
    let dir = TempDir::new().unwrap();
    let ca = util::generate_ca_cert();
    let server = util::issue_server_cert(&ca, Validity::for_days(365));
    // A leaf that claims the non-CA server certificate as its issuer
    let key = KeyPair::generate_ed25519();
    let mut leaf = Certificate::new();
    leaf.set_version(2);
    leaf.set_subject(&util::name("leaf"));
    leaf.set_issuer(&server.subject().to_owned_name());
    leaf.set_public_key(&key).unwrap();
    leaf.gmtime_adj_not_before(0).unwrap();
    leaf.gmtime_adj_not_after(3600).unwrap();
    leaf.sign(&key, "sha256").unwrap();

    let bundle = format!(
        "{}{}",
        ca.cert.to_pem().unwrap(),
        server.to_pem().unwrap()
    );
    let bundle = write_pem(&dir, "bundle.pem", &bundle);
    assert_eq!(verify_with_files(&leaf, vec![bundle], false), VerifyStatus::InvalidCa);
}
