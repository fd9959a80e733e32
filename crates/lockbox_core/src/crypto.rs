//! AES-256-GCM sealing for stored keys and values.
//!
//! Two ciphers with distinct derived keys cover the two roles a
//! secure-preferences store needs:
//!
//! - [`KeyCipher`] encrypts entry keys **deterministically**: the nonce is
//!   derived from the plaintext with HKDF-SHA256 under a separate derived
//!   seed, so equal keys produce equal ciphertexts and point lookup works
//!   without enumerating the store.
//! - [`ValueCipher`] encrypts entry values with a **random** nonce per
//!   write and binds the plaintext entry key as associated data, so a value
//!   ciphertext cannot be transplanted under another key.
//!
//! Sealed box layout: `nonce (12 bytes) || ciphertext || tag (16 bytes)`.

use crate::error::{EngineError, EngineResult};
use aes_gcm::{
    aead::{generic_array::GenericArray, Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;

/// Size of the AES-256 key in bytes.
pub(crate) const KEY_SIZE: usize = 32;
/// Size of the GCM nonce in bytes.
pub(crate) const NONCE_SIZE: usize = 12;
/// Size of the GCM authentication tag in bytes.
pub(crate) const TAG_SIZE: usize = 16;

/// Deterministic cipher for entry keys.
pub(crate) struct KeyCipher {
    cipher: Aes256Gcm,
    nonce_seed: [u8; KEY_SIZE],
}

impl KeyCipher {
    /// Creates a key cipher from a derived encryption key and nonce seed.
    pub(crate) fn new(key: &[u8; KEY_SIZE], nonce_seed: [u8; KEY_SIZE]) -> Self {
        let cipher = Aes256Gcm::new(GenericArray::from_slice(key));
        Self { cipher, nonce_seed }
    }

    /// Encrypts a plaintext key deterministically.
    ///
    /// Equal plaintexts seal to equal bytes, so the result can be used as
    /// the lookup key in the underlying store.
    pub(crate) fn seal(&self, plaintext: &[u8]) -> EngineResult<Vec<u8>> {
        let nonce_bytes = self.derive_nonce(plaintext)?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| EngineError::write("key encryption failed"))?;

        let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend(ciphertext);

        Ok(result)
    }

    /// Decrypts a sealed key.
    ///
    /// # Errors
    ///
    /// Returns `Corruption` if the sealed bytes are malformed or fail
    /// authentication (tamper or key mismatch).
    pub(crate) fn open(&self, sealed: &[u8]) -> EngineResult<Vec<u8>> {
        if sealed.len() < NONCE_SIZE + TAG_SIZE {
            return Err(EngineError::corruption("sealed key too short"));
        }

        let nonce = Nonce::from_slice(&sealed[..NONCE_SIZE]);
        self.cipher
            .decrypt(nonce, &sealed[NONCE_SIZE..])
            .map_err(|_| EngineError::corruption("stored key failed authentication"))
    }

    /// Derives the synthetic nonce for a plaintext key.
    ///
    /// Keyed with a seed derived separately from the encryption key, so the
    /// nonce reveals nothing about either.
    fn derive_nonce(&self, plaintext: &[u8]) -> EngineResult<[u8; NONCE_SIZE]> {
        let hk = Hkdf::<Sha256>::new(Some(&self.nonce_seed), plaintext);

        let mut nonce = [0u8; NONCE_SIZE];
        hk.expand(b"lockbox-key-nonce-v1", &mut nonce)
            .map_err(|_| EngineError::write("nonce derivation failed"))?;

        Ok(nonce)
    }
}

impl std::fmt::Debug for KeyCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyCipher")
            .field("cipher", &"Aes256Gcm")
            .finish_non_exhaustive()
    }
}

/// Randomized cipher for entry values.
pub(crate) struct ValueCipher {
    cipher: Aes256Gcm,
}

impl ValueCipher {
    /// Creates a value cipher from a derived encryption key.
    pub(crate) fn new(key: &[u8; KEY_SIZE]) -> Self {
        let cipher = Aes256Gcm::new(GenericArray::from_slice(key));
        Self { cipher }
    }

    /// Encrypts a value with a fresh random nonce.
    ///
    /// The associated data is authenticated but not encrypted; the store
    /// passes the plaintext entry key here to bind value to key.
    pub(crate) fn seal(&self, plaintext: &[u8], aad: &[u8]) -> EngineResult<Vec<u8>> {
        use aes_gcm::aead::Payload;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let payload = Payload {
            msg: plaintext,
            aad,
        };

        let ciphertext = self
            .cipher
            .encrypt(nonce, payload)
            .map_err(|_| EngineError::write("value encryption failed"))?;

        let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend(ciphertext);

        Ok(result)
    }

    /// Decrypts a sealed value.
    ///
    /// The same associated data must be provided as was used during
    /// sealing.
    ///
    /// # Errors
    ///
    /// Returns `Corruption` if the sealed bytes are malformed or fail
    /// authentication (tamper, key mismatch, or wrong associated data).
    pub(crate) fn open(&self, sealed: &[u8], aad: &[u8]) -> EngineResult<Vec<u8>> {
        use aes_gcm::aead::Payload;

        if sealed.len() < NONCE_SIZE + TAG_SIZE {
            return Err(EngineError::corruption("sealed value too short"));
        }

        let nonce = Nonce::from_slice(&sealed[..NONCE_SIZE]);
        let payload = Payload {
            msg: &sealed[NONCE_SIZE..],
            aad,
        };

        self.cipher
            .decrypt(nonce, payload)
            .map_err(|_| EngineError::corruption("stored value failed authentication"))
    }
}

impl std::fmt::Debug for ValueCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueCipher")
            .field("cipher", &"Aes256Gcm")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_cipher() -> KeyCipher {
        KeyCipher::new(&[0x42u8; KEY_SIZE], [0x17u8; KEY_SIZE])
    }

    fn value_cipher() -> ValueCipher {
        ValueCipher::new(&[0x42u8; KEY_SIZE])
    }

    #[test]
    fn key_seal_is_deterministic() {
        let cipher = key_cipher();

        let a = cipher.seal(b"user_token").unwrap();
        let b = cipher.seal(b"user_token").unwrap();
        assert_eq!(a, b);

        let c = cipher.seal(b"other_token").unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn key_seal_open_roundtrip() {
        let cipher = key_cipher();

        let sealed = cipher.seal(b"user_token").unwrap();
        assert_ne!(&sealed[NONCE_SIZE..], b"user_token");

        let opened = cipher.open(&sealed).unwrap();
        assert_eq!(opened, b"user_token");
    }

    #[test]
    fn key_open_tampered_fails() {
        let cipher = key_cipher();

        let mut sealed = cipher.seal(b"user_token").unwrap();
        let len = sealed.len();
        sealed[len - 1] ^= 0xFF;

        assert!(matches!(
            cipher.open(&sealed),
            Err(EngineError::Corruption { .. })
        ));
    }

    #[test]
    fn key_open_wrong_key_fails() {
        let sealed = key_cipher().seal(b"user_token").unwrap();

        let other = KeyCipher::new(&[0x43u8; KEY_SIZE], [0x17u8; KEY_SIZE]);
        assert!(other.open(&sealed).is_err());
    }

    #[test]
    fn key_open_too_short_fails() {
        let cipher = key_cipher();
        assert!(cipher.open(&[0u8; 10]).is_err());
    }

    #[test]
    fn value_seal_is_randomized() {
        let cipher = value_cipher();

        let a = cipher.seal(b"same data", b"key").unwrap();
        let b = cipher.seal(b"same data", b"key").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn value_seal_open_roundtrip() {
        let cipher = value_cipher();

        let sealed = cipher.seal(b"secret", b"key").unwrap();
        let opened = cipher.open(&sealed, b"key").unwrap();
        assert_eq!(opened, b"secret");
    }

    #[test]
    fn value_open_wrong_aad_fails() {
        let cipher = value_cipher();

        let sealed = cipher.seal(b"secret", b"key").unwrap();
        assert!(cipher.open(&sealed, b"other_key").is_err());
    }

    #[test]
    fn value_open_tampered_fails() {
        let cipher = value_cipher();

        let mut sealed = cipher.seal(b"secret", b"key").unwrap();
        sealed[NONCE_SIZE + 1] ^= 0xFF;

        assert!(matches!(
            cipher.open(&sealed, b"key"),
            Err(EngineError::Corruption { .. })
        ));
    }

    #[test]
    fn value_empty_plaintext() {
        let cipher = value_cipher();

        let sealed = cipher.seal(b"", b"key").unwrap();
        let opened = cipher.open(&sealed, b"key").unwrap();
        assert!(opened.is_empty());
    }
}
