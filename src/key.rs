use std::fmt;
use std::sync::Arc;

use der::{Decode, Encode};
use ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use ed25519_dalek::{
    Signer as _, SigningKey as Ed25519SigningKey, Verifier as _,
    VerifyingKey as Ed25519VerifyingKey,
};
use p256::ecdsa::{SigningKey as P256SigningKey, VerifyingKey as P256VerifyingKey};
use p384::ecdsa::{SigningKey as P384SigningKey, VerifyingKey as P384VerifyingKey};
use pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::signature::SignatureEncoding;
use rsa::{RsaPrivateKey, RsaPublicKey};
use x509_cert::spki::{AlgorithmIdentifierOwned, ObjectIdentifier, SubjectPublicKeyInfoOwned};

use crate::error::{Result, X509KitError};
use crate::pki::{DigestAlgorithm, SignatureAlgorithm, SignatureKind};

const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const CURVE_P256: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
const CURVE_P384: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");
const ID_ED25519: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");

/// Private key material for the supported key types.
pub enum PrivateKey {
    Rsa(Box<RsaPrivateKey>),
    EcdsaP256(P256SigningKey),
    EcdsaP384(P384SigningKey),
    Ed25519(Ed25519SigningKey),
}

impl PrivateKey {
    /// Derives the matching public key.
    pub fn public_key(&self) -> PublicKey {
        match self {
            PrivateKey::Rsa(private) => PublicKey::Rsa(private.to_public_key()),
            PrivateKey::EcdsaP256(signing_key) => {
                PublicKey::EcdsaP256(P256VerifyingKey::from(signing_key))
            }
            PrivateKey::EcdsaP384(signing_key) => {
                PublicKey::EcdsaP384(P384VerifyingKey::from(signing_key))
            }
            PrivateKey::Ed25519(signing_key) => PublicKey::Ed25519(signing_key.verifying_key()),
        }
    }

    fn kind(&self) -> SignatureKind {
        match self {
            PrivateKey::Rsa(_) => SignatureKind::Rsa,
            PrivateKey::EcdsaP256(_) | PrivateKey::EcdsaP384(_) => SignatureKind::Ecdsa,
            PrivateKey::Ed25519(_) => SignatureKind::Ed25519,
        }
    }

    /// Signs `data` with the given signature algorithm, which must belong to this key's family.
    pub fn sign(&self, algorithm: SignatureAlgorithm, data: &[u8]) -> Result<Vec<u8>> {
        if algorithm.kind() != self.kind() {
            return Err(X509KitError::InvalidInput(format!(
                "{} cannot be produced by a {:?} key",
                algorithm.short_name(),
                self.kind()
            )));
        }
        match self {
            PrivateKey::Rsa(private) => {
                let digest = algorithm.digest().unwrap_or(DigestAlgorithm::Sha256);
                rsa_sign(private, digest, data)
            }
            PrivateKey::EcdsaP256(signing_key) => {
                let prehash = ecdsa_prehash(algorithm, data);
                let signature: p256::ecdsa::Signature = signing_key.sign_prehash(&prehash)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            PrivateKey::EcdsaP384(signing_key) => {
                let prehash = ecdsa_prehash(algorithm, data);
                let signature: p384::ecdsa::Signature = signing_key.sign_prehash(&prehash)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            PrivateKey::Ed25519(signing_key) => {
                let signature = signing_key.try_sign(data)?;
                Ok(signature.to_bytes().to_vec())
            }
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrivateKey::Rsa(_) => "Rsa",
            PrivateKey::EcdsaP256(_) => "EcdsaP256",
            PrivateKey::EcdsaP384(_) => "EcdsaP384",
            PrivateKey::Ed25519(_) => "Ed25519",
        };
        f.debug_tuple("PrivateKey").field(&name).finish()
    }
}

fn ecdsa_prehash(algorithm: SignatureAlgorithm, data: &[u8]) -> Vec<u8> {
    algorithm
        .digest()
        .unwrap_or(DigestAlgorithm::Sha256)
        .digest(data)
}

fn rsa_sign(private: &RsaPrivateKey, digest: DigestAlgorithm, data: &[u8]) -> Result<Vec<u8>> {
    use rsa::pkcs1v15::SigningKey;

    let key = private.clone();
    let signature = match digest {
        DigestAlgorithm::Md5 => SigningKey::<md5::Md5>::new(key).try_sign(data)?.to_vec(),
        DigestAlgorithm::Sha1 => SigningKey::<sha1::Sha1>::new(key).try_sign(data)?.to_vec(),
        DigestAlgorithm::Sha224 => SigningKey::<sha2::Sha224>::new(key).try_sign(data)?.to_vec(),
        DigestAlgorithm::Sha256 => SigningKey::<sha2::Sha256>::new(key).try_sign(data)?.to_vec(),
        DigestAlgorithm::Sha384 => SigningKey::<sha2::Sha384>::new(key).try_sign(data)?.to_vec(),
        DigestAlgorithm::Sha512 => SigningKey::<sha2::Sha512>::new(key).try_sign(data)?.to_vec(),
    };
    Ok(signature)
}

fn rsa_verify(
    public: &RsaPublicKey,
    digest: DigestAlgorithm,
    data: &[u8],
    signature: &[u8],
) -> Result<()> {
    use rsa::pkcs1v15::{Signature, VerifyingKey};

    let signature = Signature::try_from(signature)?;
    let key = public.clone();
    match digest {
        DigestAlgorithm::Md5 => VerifyingKey::<md5::Md5>::new(key).verify(data, &signature)?,
        DigestAlgorithm::Sha1 => VerifyingKey::<sha1::Sha1>::new(key).verify(data, &signature)?,
        DigestAlgorithm::Sha224 => {
            VerifyingKey::<sha2::Sha224>::new(key).verify(data, &signature)?
        }
        DigestAlgorithm::Sha256 => {
            VerifyingKey::<sha2::Sha256>::new(key).verify(data, &signature)?
        }
        DigestAlgorithm::Sha384 => {
            VerifyingKey::<sha2::Sha384>::new(key).verify(data, &signature)?
        }
        DigestAlgorithm::Sha512 => {
            VerifyingKey::<sha2::Sha512>::new(key).verify(data, &signature)?
        }
    }
    Ok(())
}

/// Public key material for the supported key types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    EcdsaP256(P256VerifyingKey),
    EcdsaP384(P384VerifyingKey),
    Ed25519(Ed25519VerifyingKey),
}

impl PublicKey {
    /// Key family of this key.
    pub fn kind(&self) -> SignatureKind {
        match self {
            PublicKey::Rsa(_) => SignatureKind::Rsa,
            PublicKey::EcdsaP256(_) | PublicKey::EcdsaP384(_) => SignatureKind::Ecdsa,
            PublicKey::Ed25519(_) => SignatureKind::Ed25519,
        }
    }

    /// Encodes the key as a `SubjectPublicKeyInfo`.
    pub fn to_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        let document = match self {
            PublicKey::Rsa(public) => public.to_public_key_der()?,
            PublicKey::EcdsaP256(verifying_key) => verifying_key.to_public_key_der()?,
            PublicKey::EcdsaP384(verifying_key) => verifying_key.to_public_key_der()?,
            PublicKey::Ed25519(verifying_key) => {
                let pk_bytes = verifying_key.to_bytes();
                return Ok(SubjectPublicKeyInfoOwned {
                    algorithm: AlgorithmIdentifierOwned {
                        oid: ID_ED25519,
                        parameters: None,
                    },
                    subject_public_key: der::asn1::BitString::from_bytes(&pk_bytes)?,
                });
            }
        };
        Ok(SubjectPublicKeyInfoOwned::from_der(document.as_bytes())?)
    }

    /// Decodes a key from a `SubjectPublicKeyInfo`.
    ///
    /// # Errors
    /// `UnsupportedKey` for algorithms or curves other than RSA, P-256, P-384 and Ed25519.
    pub fn from_spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        match spki.algorithm.oid {
            RSA_ENCRYPTION => {
                let der = spki.to_der()?;
                Ok(PublicKey::Rsa(RsaPublicKey::from_public_key_der(&der)?))
            }
            EC_PUBLIC_KEY => {
                let curve = spki
                    .algorithm
                    .parameters
                    .as_ref()
                    .and_then(|params| params.decode_as::<ObjectIdentifier>().ok())
                    .ok_or_else(|| {
                        X509KitError::DecodingError("EC key without named curve".to_string())
                    })?;
                let der = spki.to_der()?;
                match curve {
                    CURVE_P256 => {
                        let public = p256::PublicKey::from_public_key_der(&der)?;
                        Ok(PublicKey::EcdsaP256(P256VerifyingKey::from(public)))
                    }
                    CURVE_P384 => {
                        let public = p384::PublicKey::from_public_key_der(&der)?;
                        Ok(PublicKey::EcdsaP384(P384VerifyingKey::from(public)))
                    }
                    other => Err(X509KitError::UnsupportedKey(format!("EC curve {}", other))),
                }
            }
            ID_ED25519 => {
                let bytes: [u8; 32] = spki
                    .subject_public_key
                    .as_bytes()
                    .and_then(|b| b.try_into().ok())
                    .ok_or_else(|| {
                        X509KitError::DecodingError("Ed25519 key must be 32 bytes".to_string())
                    })?;
                let verifying_key = Ed25519VerifyingKey::from_bytes(&bytes)
                    .map_err(|e| X509KitError::DecodingError(e.to_string()))?;
                Ok(PublicKey::Ed25519(verifying_key))
            }
            other => Err(X509KitError::UnsupportedKey(format!("algorithm {}", other))),
        }
    }

    /// Checks `signature` over `data`.
    ///
    /// # Errors
    /// `SignatureError` when the signature does not verify, `InvalidInput`
    /// when `algorithm` does not belong to this key's family.
    pub fn verify(&self, algorithm: SignatureAlgorithm, data: &[u8], signature: &[u8]) -> Result<()> {
        if algorithm.kind() != self.kind() {
            return Err(X509KitError::InvalidInput(format!(
                "{} cannot be checked with a {:?} key",
                algorithm.short_name(),
                self.kind()
            )));
        }
        match self {
            PublicKey::Rsa(public) => {
                let digest = algorithm.digest().unwrap_or(DigestAlgorithm::Sha256);
                rsa_verify(public, digest, data, signature)
            }
            PublicKey::EcdsaP256(verifying_key) => {
                let signature = p256::ecdsa::Signature::from_der(signature)?;
                verifying_key.verify_prehash(&ecdsa_prehash(algorithm, data), &signature)?;
                Ok(())
            }
            PublicKey::EcdsaP384(verifying_key) => {
                let signature = p384::ecdsa::Signature::from_der(signature)?;
                verifying_key.verify_prehash(&ecdsa_prehash(algorithm, data), &signature)?;
                Ok(())
            }
            PublicKey::Ed25519(verifying_key) => {
                let signature = ed25519_dalek::Signature::from_slice(signature)?;
                verifying_key.verify(data, &signature)?;
                Ok(())
            }
        }
    }
}

/// An asymmetric key, possibly without its private half.
///
/// Key material sits behind [`Arc`]s: cloning a `KeyPair`, taking its
/// [`public_only`](KeyPair::public_only) view, or installing it on a
/// certificate shares the material instead of copying it.
#[derive(Clone, Default)]
pub struct KeyPair {
    private: Option<Arc<PrivateKey>>,
    public: Option<Arc<PublicKey>>,
}

impl KeyPair {
    /// Creates an uninitialized key with no material.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps private key material; the public half is derived from it.
    pub fn from_private_key(private: PrivateKey) -> Self {
        let public = private.public_key();
        KeyPair {
            private: Some(Arc::new(private)),
            public: Some(Arc::new(public)),
        }
    }

    /// Wraps public key material. The result cannot sign.
    pub fn from_public_key(public: PublicKey) -> Self {
        Self::from_shared_public(Arc::new(public))
    }

    pub(crate) fn from_shared_public(public: Arc<PublicKey>) -> Self {
        KeyPair {
            private: None,
            public: Some(public),
        }
    }

    /// Generate an RSA key pair with the specified number of bits.
    pub fn generate_rsa(bits: usize) -> Result<Self> {
        let mut rng = rand_core::OsRng;
        let private = RsaPrivateKey::new(&mut rng, bits)
            .map_err(|e| X509KitError::KeyGenerationError(e.to_string()))?;
        Ok(Self::from_private_key(PrivateKey::Rsa(Box::new(private))))
    }

    /// Generate an ECDSA P-256 key pair.
    pub fn generate_ecdsa_p256() -> Self {
        let mut rng = rand_core::OsRng;
        Self::from_private_key(PrivateKey::EcdsaP256(P256SigningKey::random(&mut rng)))
    }

    /// Generate an ECDSA P-384 key pair.
    pub fn generate_ecdsa_p384() -> Self {
        let mut rng = rand_core::OsRng;
        Self::from_private_key(PrivateKey::EcdsaP384(P384SigningKey::random(&mut rng)))
    }

    /// Generate an Ed25519 key pair.
    pub fn generate_ed25519() -> Self {
        let mut rng = rand_core::OsRng;
        Self::from_private_key(PrivateKey::Ed25519(Ed25519SigningKey::generate(&mut rng)))
    }

    /// A view of this key that shares its public material and drops the private half.
    pub fn public_only(&self) -> Self {
        KeyPair {
            private: None,
            public: self.public.clone(),
        }
    }

    pub fn has_private_part(&self) -> bool {
        self.private.is_some()
    }

    pub fn is_initialized(&self) -> bool {
        self.public.is_some()
    }

    pub fn public_key(&self) -> Option<&PublicKey> {
        self.public.as_deref()
    }

    pub(crate) fn shared_public_key(&self) -> Option<Arc<PublicKey>> {
        self.public.clone()
    }

    /// Whether both keys share the same underlying public material.
    pub fn shares_material_with(&self, other: &KeyPair) -> bool {
        match (&self.public, &other.public) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Key family, or `None` for an uninitialized key.
    pub fn kind(&self) -> Option<SignatureKind> {
        self.public.as_ref().map(|public| public.kind())
    }

    /// Signs `data`, hashing with `digest` where the key family uses one.
    ///
    /// Returns the signature algorithm that was applied with the signature bytes.
    ///
    /// # Errors
    /// `UninitializedKey` or `PublicKeyOnly` when the key cannot sign.
    pub fn sign(&self, data: &[u8], digest: DigestAlgorithm) -> Result<(SignatureAlgorithm, Vec<u8>)> {
        let algorithm = self.signature_algorithm(digest)?;
        let private = self.private.as_ref().ok_or(X509KitError::PublicKeyOnly)?;
        let signature = private.sign(algorithm, data)?;
        Ok((algorithm, signature))
    }

    /// The algorithm [`KeyPair::sign`] would apply, after checking the key can sign.
    pub fn signature_algorithm(&self, digest: DigestAlgorithm) -> Result<SignatureAlgorithm> {
        let kind = self.kind().ok_or(X509KitError::UninitializedKey)?;
        if !self.has_private_part() {
            return Err(X509KitError::PublicKeyOnly);
        }
        SignatureAlgorithm::for_key(kind, digest)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("kind", &self.kind())
            .field("has_private_part", &self.has_private_part())
            .finish()
    }
}
