//! RSASSA-PSS signing and verification.
//!
//! Both paths use the same fixed parameters: SHA-256 as the message digest,
//! MGF1 with SHA-256, and the maximum salt length the modulus allows. Any
//! divergence between the two paths makes every verification fail, so the
//! parameters are derived in one place ([`max_salt_len`]) and never exposed
//! as options.
//!
//! Files are always signed through their SHA-256 digest: [`sign_file`] is
//! `sign(key, digest_file(path))`, and [`verify_file`] mirrors it.

use std::fmt;
use std::fs;
use std::path::Path;

use base64::{engine::general_purpose, Engine as _};
use rand::rngs::OsRng;
use rsa::pss::{BlindedSigningKey, VerifyingKey};
use rsa::sha2::Sha256;
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::error::{Error, Result};
use crate::fsutil::write_atomic;
use crate::hasher::{digest_file, DIGEST_LEN};

/// Raw RSASSA-PSS signature bytes. The length equals the modulus size in bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature(Vec<u8>);

impl Signature {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.0)
    }

    pub fn from_base64(encoded: &str) -> Result<Self> {
        Ok(Self(general_purpose::STANDARD.decode(encoded.trim())?))
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Signature {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({} bytes)", self.0.len())
    }
}

/// Largest PSS salt the key's modulus can carry with a SHA-256 hash:
/// `ceil((modBits - 1) / 8) - 32 - 2`.
///
/// Returns `None` when the modulus is too small for PSS with SHA-256.
pub fn max_salt_len(public_key: &RsaPublicKey) -> Option<usize> {
    let em_bits = public_key.n().bits().checked_sub(1)?;
    let em_len = (em_bits + 7) / 8;
    em_len.checked_sub(DIGEST_LEN + 2)
}

/// Sign `payload` with RSASSA-PSS (SHA-256, MGF1-SHA-256, maximum salt).
///
/// Text is signed as its UTF-8 bytes. The salt is random, so two signatures
/// over the same payload differ but both verify.
///
/// # Errors
///
/// Returns [`Error::Signing`] if the key is too small or malformed.
pub fn sign(private_key: &RsaPrivateKey, payload: impl AsRef<[u8]>) -> Result<Signature> {
    let public_key = private_key.to_public_key();
    let salt_len = max_salt_len(&public_key).ok_or_else(|| {
        Error::Signing(format!(
            "{}-bit modulus is too small for RSASSA-PSS with SHA-256",
            public_key.n().bits()
        ))
    })?;

    let signing_key = BlindedSigningKey::<Sha256>::new_with_salt_len(private_key.clone(), salt_len);
    let signature = signing_key
        .try_sign_with_rng(&mut OsRng, payload.as_ref())
        .map_err(|e| Error::Signing(e.to_string()))?;

    log::trace!(
        "signed {} byte payload with salt length {}",
        payload.as_ref().len(),
        salt_len
    );
    Ok(Signature(signature.to_vec()))
}

/// Hash the file at `path` with SHA-256 and sign the digest.
pub fn sign_file(private_key: &RsaPrivateKey, path: impl AsRef<Path>) -> Result<Signature> {
    let digest = digest_file(path.as_ref())?;
    log::debug!("signing {} (sha256 {})", path.as_ref().display(), digest);
    sign(private_key, digest)
}

/// Check `signature` over `payload` against `public_key`.
///
/// Returns `false` for every kind of mismatch: wrong key, modified payload,
/// modified signature, a signature of the wrong length, or one made with
/// different padding parameters. Never fails.
pub fn verify(public_key: &RsaPublicKey, payload: impl AsRef<[u8]>, signature: &Signature) -> bool {
    let Some(salt_len) = max_salt_len(public_key) else {
        return false;
    };
    let Ok(signature) = rsa::pss::Signature::try_from(signature.as_bytes()) else {
        return false;
    };

    let verifying_key = VerifyingKey::<Sha256>::new_with_salt_len(public_key.clone(), salt_len);
    verifying_key.verify(payload.as_ref(), &signature).is_ok()
}

/// Hash the file at `path` and verify `signature` over the digest.
///
/// # Errors
///
/// Only I/O failures while reading the file are errors; a signature that does
/// not match is reported as `Ok(false)`.
pub fn verify_file(
    public_key: &RsaPublicKey,
    path: impl AsRef<Path>,
    signature: &Signature,
) -> Result<bool> {
    let digest = digest_file(path.as_ref())?;
    let valid = verify(public_key, digest, signature);
    log::debug!(
        "verified {} (sha256 {}): {}",
        path.as_ref().display(),
        digest,
        if valid { "valid" } else { "invalid" }
    );
    Ok(valid)
}

/// Write the raw signature bytes to `path` with no framing.
pub fn save_signature(signature: &Signature, path: impl AsRef<Path>) -> Result<()> {
    write_atomic(path, signature.as_bytes())
}

/// Read raw signature bytes from `path`.
pub fn load_signature(path: impl AsRef<Path>) -> Result<Signature> {
    Ok(Signature(fs::read(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::digest_bytes;
    use crate::keys::{generate_key_pair, KeyPair, KeySize};
    use std::sync::OnceLock;
    use tempfile::tempdir;

    fn pair() -> &'static KeyPair {
        static PAIR: OnceLock<KeyPair> = OnceLock::new();
        PAIR.get_or_init(|| generate_key_pair(KeySize::Rsa1024).unwrap())
    }

    fn other_pair() -> &'static KeyPair {
        static PAIR: OnceLock<KeyPair> = OnceLock::new();
        PAIR.get_or_init(|| generate_key_pair(KeySize::Rsa1024).unwrap())
    }

    #[test]
    fn test_max_salt_len() {
        let key = &pair().public_key;
        // 1024-bit modulus: em_len = 128, salt = 128 - 32 - 2
        assert_eq!(max_salt_len(key), Some(94));
    }

    #[test]
    fn test_sign_and_verify() {
        let keys = pair();
        let signature = sign(&keys.private_key, "Hello, World!").unwrap();
        assert_eq!(signature.len(), 128);
        assert!(verify(&keys.public_key, "Hello, World!", &signature));
        assert!(!verify(&keys.public_key, "Hello, World?", &signature));
    }

    #[test]
    fn test_signatures_are_randomized() {
        let keys = pair();
        let a = sign(&keys.private_key, b"same payload").unwrap();
        let b = sign(&keys.private_key, b"same payload").unwrap();
        assert!(verify(&keys.public_key, b"same payload", &a));
        assert!(verify(&keys.public_key, b"same payload", &b));
    }

    #[test]
    fn test_wrong_key_fails() {
        let signature = sign(&pair().private_key, b"payload").unwrap();
        assert!(!verify(&other_pair().public_key, b"payload", &signature));
    }

    #[test]
    fn test_tampered_signature_fails() {
        let keys = pair();
        let signature = sign(&keys.private_key, b"payload").unwrap();
        for index in [0, signature.len() / 2, signature.len() - 1] {
            let mut bytes = signature.clone().into_bytes();
            bytes[index] ^= 0x01;
            assert!(!verify(&keys.public_key, b"payload", &Signature::from(bytes)));
        }
    }

    #[test]
    fn test_malformed_signature_is_false() {
        let keys = pair();
        assert!(!verify(&keys.public_key, b"payload", &Signature::from(vec![])));
        assert!(!verify(&keys.public_key, b"payload", &Signature::from(vec![0u8; 5])));
        assert!(!verify(&keys.public_key, b"payload", &Signature::from(vec![0xffu8; 300])));
    }

    #[test]
    fn test_fixed_salt_signature_is_rejected() {
        let keys = pair();
        let short_salt =
            BlindedSigningKey::<Sha256>::new_with_salt_len(keys.private_key.clone(), DIGEST_LEN);
        let signature = short_salt.sign_with_rng(&mut OsRng, b"payload");
        let signature = Signature::from(signature.to_vec());
        assert!(!verify(&keys.public_key, b"payload", &signature));
    }

    #[test]
    fn test_sign_file_matches_digest_path() {
        let keys = pair();
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        fs::write(&path, b"contract text").unwrap();

        let file_sig = sign_file(&keys.private_key, &path).unwrap();
        let digest = digest_bytes(b"contract text");
        assert!(verify_file(&keys.public_key, &path, &file_sig).unwrap());
        assert!(verify(&keys.public_key, digest, &file_sig));

        let manual_sig = sign(&keys.private_key, digest).unwrap();
        assert!(verify_file(&keys.public_key, &path, &manual_sig).unwrap());

        // The file content itself is not what gets signed.
        assert!(!verify(&keys.public_key, b"contract text", &file_sig));
    }

    #[test]
    fn test_verify_file_detects_modification() {
        let keys = pair();
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        fs::write(&path, b"v1").unwrap();
        let signature = sign_file(&keys.private_key, &path).unwrap();

        fs::write(&path, b"v2").unwrap();
        assert!(!verify_file(&keys.public_key, &path, &signature).unwrap());
    }

    #[test]
    fn test_verify_file_missing_is_error() {
        let keys = pair();
        let dir = tempdir().unwrap();
        let signature = sign(&keys.private_key, b"x").unwrap();
        assert!(matches!(
            verify_file(&keys.public_key, dir.path().join("missing"), &signature),
            Err(Error::Io(_))
        ));
        assert!(matches!(
            sign_file(&keys.private_key, dir.path().join("missing")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_save_and_load_signature() {
        let keys = pair();
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.sig");
        let signature = sign(&keys.private_key, b"payload").unwrap();

        save_signature(&signature, &path).unwrap();
        assert_eq!(fs::read(&path).unwrap(), signature.as_bytes());

        let loaded = load_signature(&path).unwrap();
        assert_eq!(loaded, signature);
        assert!(verify(&keys.public_key, b"payload", &loaded));
    }

    #[test]
    fn test_base64_transport() {
        let signature = sign(&pair().private_key, b"payload").unwrap();
        let decoded = Signature::from_base64(&signature.to_base64()).unwrap();
        assert_eq!(decoded, signature);
        assert!(matches!(
            Signature::from_base64("not base64!"),
            Err(Error::Format(_))
        ));
    }
}
