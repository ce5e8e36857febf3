#![allow(dead_code)]

use time::{Duration, OffsetDateTime};
use x509kit::cert::Certificate;
use x509kit::cert::extensions::ExtendedKeyUsageOption;
use x509kit::cert::name::DistinguishedName;
use x509kit::issuer::{CertificateWithPrivateKey, CertificationRequestInfo, Issuer, Validity};
use x509kit::key::KeyPair;

pub fn name(common_name: &str) -> DistinguishedName {
    DistinguishedName::builder()
        .common_name(common_name.to_string())
        .build()
        .unwrap()
}

pub fn generate_ca_cert() -> CertificateWithPrivateKey {
    let ca_key = KeyPair::generate_ecdsa_p256();

    let ca_cert_info = CertificationRequestInfo::builder()
        .subject(name("myca.local"))
        .subject_public_key(ca_key.public_only())
        .is_ca(true)
        .build();

    CertificateWithPrivateKey {
        cert: Certificate::new_self_signed(&ca_cert_info, &ca_key, Validity::for_days(3650)).unwrap(),
        key: ca_key,
    }
}

pub fn issue_server_cert(ca: &CertificateWithPrivateKey, validity: Validity) -> Certificate {
    let server_key = KeyPair::generate_ecdsa_p256();
    let server_cert_info = CertificationRequestInfo::builder()
        .subject(name("server.myca.local"))
        .subject_public_key(server_key.public_only())
        .usages(vec![ExtendedKeyUsageOption::ServerAuth])
        .build();
    ca.issue(&server_cert_info, validity).unwrap()
}

/// A validity window of `days` days that ended `ago` days before now.
pub fn window_ending(ago: i64, days: i64) -> Validity {
    let end = OffsetDateTime::now_utc() - Duration::days(ago);
    Validity {
        not_before: end - Duration::days(days),
        not_after: end,
    }
}
