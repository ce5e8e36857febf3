//! Chain building and the per-certificate checks run over a built chain.
//!
//! Chains are ordered leaf first. Every failure carries the depth of the
//! certificate it was found on.

use der::flagset::FlagSet;
use log::debug;
use time::OffsetDateTime;
use x509_cert::spki::ObjectIdentifier;

use super::VerifyStatus;
use super::crl::Crl;
use super::store::TrustStore;
use crate::cert::Certificate;
use crate::cert::extensions::{
    AUTHORITY_KEY_IDENTIFIER, AuthorityKeyIdentifier, BASIC_CONSTRAINTS, BasicConstraints,
    CERTIFICATE_POLICIES, EXTENDED_KEY_USAGE, INHIBIT_ANY_POLICY, KEY_USAGE, KeyUsage, KeyUsages,
    NAME_CONSTRAINTS, POLICY_CONSTRAINTS, POLICY_MAPPINGS, SUBJECT_ALT_NAME,
    SUBJECT_KEY_IDENTIFIER, SubjectKeyIdentifier,
};

const NETSCAPE_CERT_TYPE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.113730.1.1");
const IP_ADDR_BLOCKS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.1.7");
const AUTONOMOUS_SYS_IDS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.1.8");
const PROXY_CERT_INFO: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.1.14");

/// Extensions that may be marked critical.
const SUPPORTED_CRITICAL: &[ObjectIdentifier] = &[
    NETSCAPE_CERT_TYPE,
    KEY_USAGE,
    SUBJECT_ALT_NAME,
    BASIC_CONSTRAINTS,
    CERTIFICATE_POLICIES,
    EXTENDED_KEY_USAGE,
    IP_ADDR_BLOCKS,
    AUTONOMOUS_SYS_IDS,
    POLICY_CONSTRAINTS,
    PROXY_CERT_INFO,
    NAME_CONSTRAINTS,
    POLICY_MAPPINGS,
    INHIBIT_ANY_POLICY,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Failure {
    pub status: VerifyStatus,
    pub depth: usize,
}

impl Failure {
    fn at(status: VerifyStatus, depth: usize) -> Self {
        Failure { status, depth }
    }
}

type Outcome<T> = std::result::Result<T, Failure>;

fn key_identifier(cert: &Certificate) -> Option<Vec<u8>> {
    cert.find_extension(SUBJECT_KEY_IDENTIFIER)?
        .decode::<SubjectKeyIdentifier>()
        .ok()
        .map(|ski| ski.0)
}

fn authority_key_identifier(cert: &Certificate) -> Option<Vec<u8>> {
    cert.find_extension(AUTHORITY_KEY_IDENTIFIER)?
        .decode::<AuthorityKeyIdentifier>()
        .ok()?
        .key_identifier
}

/// Key identifiers only rule a candidate out when both sides carry one.
fn key_ids_match(issuer: &Certificate, subject: &Certificate) -> bool {
    match (key_identifier(issuer), authority_key_identifier(subject)) {
        (Some(ski), Some(aki)) => ski == aki,
        _ => true,
    }
}

fn is_self_signed(cert: &Certificate) -> bool {
    cert.is_self_issued() && key_ids_match(cert, cert)
}

fn same_certificate(a: &Certificate, b: &Certificate) -> bool {
    match (a.to_der(), b.to_der()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// `None` without a keyUsage extension; an undecodable one allows nothing.
fn key_usage(cert: &Certificate) -> Option<FlagSet<KeyUsages>> {
    let ext = cert.find_extension(KEY_USAGE)?;
    Some(ext.decode::<KeyUsage>().map(|ku| ku.0).unwrap_or_default())
}

fn basic_constraints(cert: &Certificate) -> Option<BasicConstraints> {
    let ext = cert.find_extension(BASIC_CONSTRAINTS)?;
    Some(ext.decode::<BasicConstraints>().unwrap_or_default())
}

fn issuer_verifies(issuer: &Certificate, subject: &Certificate) -> bool {
    issuer
        .public_key()
        .ok()
        .and_then(|key| key.public_key().map(|pk| subject.verify_signature(pk).is_ok()))
        .unwrap_or(false)
}

/// Picks the trusted certificate that issued `subject`, preferring one whose
/// key verifies the signature.
fn find_issuer(subject: &Certificate, store: &TrustStore) -> Option<Certificate> {
    let mut fallback = None;
    for candidate in store.certificates_by_subject(subject.issuer()) {
        if !key_ids_match(&candidate, subject) {
            continue;
        }
        if issuer_verifies(&candidate, subject) {
            return Some(candidate);
        }
        fallback.get_or_insert(candidate);
    }
    fallback
}

/// Builds the chain from `leaf` up to a self-signed trusted certificate.
pub(super) fn build_chain(
    leaf: &Certificate,
    store: &TrustStore,
    max_depth: usize,
) -> Outcome<Vec<Certificate>> {
    let mut chain = vec![leaf.clone()];
    loop {
        let depth = chain.len() - 1;
        let current = &chain[depth];

        if is_self_signed(current) {
            if depth == 0 {
                let trusted = store
                    .certificates_by_subject(current.subject())
                    .iter()
                    .any(|anchor| same_certificate(anchor, current));
                if !trusted {
                    return Err(Failure::at(VerifyStatus::DepthZeroSelfSignedCert, 0));
                }
            }
            return Ok(chain);
        }

        // leaf, max_depth intermediates and the anchor
        if chain.len() >= max_depth + 2 {
            return Err(Failure::at(VerifyStatus::CertChainTooLong, depth));
        }

        match find_issuer(current, store) {
            Some(issuer) if !chain.iter().any(|c| same_certificate(c, &issuer)) => {
                debug!("depth {}: issuer {}", depth, issuer.subject());
                chain.push(issuer);
            }
            _ => {
                let status = if depth == 0 {
                    VerifyStatus::UnableToGetIssuerCertLocally
                } else {
                    VerifyStatus::UnableToGetIssuerCert
                };
                return Err(Failure::at(status, depth));
            }
        }
    }
}

/// Whether `cert` may act as a CA. Version 1 self-signed roots and
/// certificates whose keyUsage allows certificate signing qualify without
/// basicConstraints.
fn is_ca(cert: &Certificate) -> bool {
    let usage = key_usage(cert);
    if let Some(usage) = usage {
        if !usage.contains(KeyUsages::KeyCertSign) {
            return false;
        }
    }
    match basic_constraints(cert) {
        Some(bc) => bc.is_ca,
        None => (cert.version() == 0 && is_self_signed(cert)) || usage.is_some(),
    }
}

/// Critical extensions, CA flags and path length constraints.
pub(super) fn check_extensions(chain: &[Certificate]) -> Outcome<()> {
    let mut path_length = 0usize;
    for (depth, cert) in chain.iter().enumerate() {
        if let Some(ext) = cert
            .extensions()
            .iter()
            .find(|ext| ext.critical() && !SUPPORTED_CRITICAL.contains(&ext.oid()))
        {
            debug!("depth {}: unhandled critical extension {}", depth, ext.oid());
            return Err(Failure::at(VerifyStatus::UnhandledCriticalExtension, depth));
        }

        if depth > 0 && !is_ca(cert) {
            return Err(Failure::at(VerifyStatus::InvalidCa, depth));
        }

        let self_issued = cert.is_self_issued();
        if depth > 1 && !self_issued {
            if let Some(limit) = basic_constraints(cert).and_then(|bc| bc.max_path_length) {
                if path_length > usize::from(limit) + 1 {
                    return Err(Failure::at(VerifyStatus::PathLengthExceeded, depth));
                }
            }
        }
        if depth == 0 || !self_issued {
            path_length += 1;
        }
    }
    Ok(())
}

/// Every certificate needs an acceptable CRL from its issuer; the anchor is
/// its own issuer.
pub(super) fn check_revocation(
    chain: &[Certificate],
    store: &TrustStore,
    now: OffsetDateTime,
) -> Outcome<()> {
    for (depth, cert) in chain.iter().enumerate() {
        let issuer = chain.get(depth + 1).unwrap_or(cert);
        check_certificate_crl(cert, issuer, store, now).map_err(|status| Failure::at(status, depth))?;
    }
    Ok(())
}

fn check_certificate_crl(
    cert: &Certificate,
    issuer: &Certificate,
    store: &TrustStore,
    now: OffsetDateTime,
) -> std::result::Result<(), VerifyStatus> {
    let crls = store.crls_by_issuer(cert.issuer());
    let mut first_error = None;
    for crl in &crls {
        match check_crl(crl, issuer, now) {
            Ok(()) if crl.is_revoked(cert.serial_number()) => {
                return Err(VerifyStatus::CertRevoked);
            }
            Ok(()) => return Ok(()),
            Err(status) => {
                first_error.get_or_insert(status);
            }
        }
    }
    Err(first_error.unwrap_or(VerifyStatus::UnableToGetCrl))
}

fn check_crl(crl: &Crl, issuer: &Certificate, now: OffsetDateTime) -> std::result::Result<(), VerifyStatus> {
    let this_update = crl
        .this_update()
        .map_err(|_| VerifyStatus::ErrorInCrlLastUpdateField)?;
    if this_update > now {
        return Err(VerifyStatus::CrlNotYetValid);
    }
    let next_update = crl
        .next_update()
        .map_err(|_| VerifyStatus::ErrorInCrlNextUpdateField)?;
    if next_update.is_some_and(|next| next < now) {
        return Err(VerifyStatus::CrlHasExpired);
    }

    let key = issuer
        .public_key()
        .map_err(|_| VerifyStatus::UnableToDecodeIssuerPublicKey)?;
    let public = key
        .public_key()
        .ok_or(VerifyStatus::UnableToDecodeIssuerPublicKey)?;
    crl.verify_signature(public)
        .map_err(|_| VerifyStatus::CrlSignatureFailure)
}

fn check_validity(cert: &Certificate, now: OffsetDateTime) -> std::result::Result<(), VerifyStatus> {
    let not_before = cert
        .not_before_instant()
        .ok()
        .flatten()
        .ok_or(VerifyStatus::ErrorInCertNotBeforeField)?;
    if not_before > now {
        return Err(VerifyStatus::CertNotYetValid);
    }
    let not_after = cert
        .not_after_instant()
        .ok()
        .flatten()
        .ok_or(VerifyStatus::ErrorInCertNotAfterField)?;
    if not_after < now {
        return Err(VerifyStatus::CertHasExpired);
    }
    Ok(())
}

/// Signatures and validity windows, walking from the anchor down to the leaf.
/// The anchor's own signature is not checked.
pub(super) fn check_signatures_and_times(chain: &[Certificate], now: OffsetDateTime) -> Outcome<()> {
    for depth in (0..chain.len()).rev() {
        let cert = &chain[depth];
        if let Some(issuer) = chain.get(depth + 1) {
            if key_usage(issuer).is_some_and(|usage| !usage.contains(KeyUsages::KeyCertSign)) {
                return Err(Failure::at(VerifyStatus::KeyUsageNoCertSign, depth));
            }
            let key = issuer
                .public_key()
                .map_err(|_| Failure::at(VerifyStatus::UnableToDecodeIssuerPublicKey, depth))?;
            let public = key
                .public_key()
                .ok_or(Failure::at(VerifyStatus::UnableToDecodeIssuerPublicKey, depth))?;
            if let Err(e) = cert.verify_signature(public) {
                debug!("depth {}: {}", depth, e);
                return Err(Failure::at(VerifyStatus::CertSignatureFailure, depth));
            }
        }
        check_validity(cert, now).map_err(|status| Failure::at(status, depth))?;
    }
    Ok(())
}
