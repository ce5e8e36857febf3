use x509kit::cert::extensions::{Extension, ExtendedKeyUsageOption, SubjectAltName};
use x509kit::cert::name::DistinguishedName;
use x509kit::issuer::{CertificateWithPrivateKey, CertificationRequestInfo, Issuer, Validity};
use x509kit::key::KeyPair;
use x509kit::verify::{TrustStore, VerifyOptions, verify_with_store};
use x509kit::{Certificate, Result};

fn main() -> Result<()> {
    // Generate a key pair for the CA using ECDSA (or choose RSA/Ed25519)
    let ca_key = KeyPair::generate_ecdsa_p256();
    let ca_info = CertificationRequestInfo::builder()
        .subject(
            DistinguishedName::builder()
                .common_name("My Test CA".to_string())
                .organization("x509kit".to_string())
                .build()?,
        )
        .subject_public_key(ca_key.public_only())
        .is_ca(true)
        .path_length(0)
        .build();
    let ca = CertificateWithPrivateKey {
        cert: Certificate::new_self_signed(&ca_info, &ca_key, Validity::for_days(3650))?,
        key: ca_key,
    };
    println!("CA Certificate PEM:\n{}", ca.cert.to_pem()?);

    // Generate a key pair for the server and let the CA sign it
    let server_key = KeyPair::generate_ed25519();
    let server_info = CertificationRequestInfo::builder()
        .subject(
            DistinguishedName::builder()
                .common_name("myserver.local".to_string())
                .build()?,
        )
        .subject_public_key(server_key.public_only())
        .usages(vec![ExtendedKeyUsageOption::ServerAuth])
        .extensions(vec![Extension::from_extension(
            &SubjectAltName::dns(["myserver.local", "localhost"]),
            false,
        )?])
        .build();
    let server = ca.issue(&server_info, Validity::for_days(825))?;
    println!("Server Certificate PEM:\n{}", server.to_pem()?);
    println!("SHA-256 fingerprint: {}", server.digest("sha256")?);
    println!("Subject alternative names: {:?}", server.subject_alt_name()?);

    let mut store = TrustStore::new();
    store.add_certificate(ca.cert.clone());
    let status = verify_with_store(&server, &store, &VerifyOptions::default());
    println!("Verification: {} ({})", status, status.code());

    Ok(())
}
