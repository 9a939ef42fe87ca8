// Cryptographic utilities for cookie sealing, random tokens, and request signing

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use rand::{Rng, RngCore};
use serde::{de::DeserializeOwned, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Nonce size for AES-256-GCM encryption (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Encryption key size for AES-256 (256 bits)
pub const ENCRYPTION_KEY_SIZE: usize = 32;

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a random alphanumeric string of the given length
///
/// Used for OAuth2 anti-forgery `state` values and OAuth1 nonces, both of which
/// travel through query strings and headers without further escaping.
#[must_use]
pub fn generate_random_string(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| char::from(ALPHANUMERIC[rng.random_range(0..ALPHANUMERIC.len())]))
        .collect()
}

/// Generate a base64-encoded 256-bit secret suitable for `session_secret`
#[must_use]
pub fn generate_session_secret() -> String {
    let mut secret = [0u8; ENCRYPTION_KEY_SIZE];
    rand::rng().fill_bytes(&mut secret);
    general_purpose::STANDARD.encode(secret)
}

fn cipher(key: &[u8]) -> Result<Aes256Gcm> {
    if key.len() != ENCRYPTION_KEY_SIZE {
        return Err(anyhow!(
            "Invalid key length: expected {ENCRYPTION_KEY_SIZE} bytes, got {}",
            key.len()
        ));
    }
    Ok(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key)))
}

/// Seal any serializable value as `base64url(nonce || AES-256-GCM(json))`
///
/// # Errors
///
/// Returns an error if the key is not 32 bytes, or serialization or
/// encryption fails
pub fn encrypt_data<T: Serialize>(data: &T, key: &[u8]) -> Result<String> {
    let cipher = cipher(key)?;
    let plaintext = serde_json::to_vec(data).context("Failed to serialize data")?;

    let mut sealed = vec![0u8; NONCE_SIZE];
    rand::rng().fill_bytes(&mut sealed);
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&sealed), plaintext.as_slice())
        .map_err(|e| anyhow!("AES encryption failed: {e}"))?;
    sealed.extend_from_slice(&ciphertext);

    Ok(general_purpose::URL_SAFE_NO_PAD.encode(&sealed))
}

/// Open a value sealed by [`encrypt_data`]
///
/// # Errors
///
/// Returns an error on a bad key, malformed input, a failed authentication
/// tag (any tampering), or JSON that does not match `T`
pub fn decrypt_data<T: DeserializeOwned>(encrypted_data: &str, key: &[u8]) -> Result<T> {
    let cipher = cipher(key)?;
    let sealed = general_purpose::URL_SAFE_NO_PAD
        .decode(encrypted_data)
        .context("Failed to decode base64 data")?;
    if sealed.len() < NONCE_SIZE {
        return Err(anyhow!("Sealed value shorter than its nonce"));
    }

    let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|e| anyhow!("AES decryption failed: {e}"))?;

    serde_json::from_slice(&plaintext).context("Decrypted value is not the expected JSON")
}

/// Derive a 32-byte AES key from arbitrary secret material with SHA-256
#[must_use]
pub fn derive_encryption_key(input_key: &[u8]) -> [u8; ENCRYPTION_KEY_SIZE] {
    let digest = Sha256::digest(input_key);
    let mut encryption_key = [0u8; ENCRYPTION_KEY_SIZE];
    encryption_key.copy_from_slice(&digest);
    encryption_key
}

/// Compute a base64-encoded HMAC-SHA1 digest, as used by OAuth 1.0a signatures
///
/// # Errors
///
/// Returns an error if the HMAC cannot be initialised with the given key
pub fn hmac_sha1_base64(key: &[u8], message: &[u8]) -> Result<String> {
    type HmacSha1 = Hmac<Sha1>;

    let mut mac = <HmacSha1 as Mac>::new_from_slice(key)
        .map_err(|e| anyhow!("Failed to create HMAC-SHA1 instance: {e}"))?;
    mac.update(message);
    Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}
