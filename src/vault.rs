// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Mintara Labs

//! Key vault: deposit key generation and encryption at rest.
//!
//! Every marketplace user gets a dedicated secp256k1 deposit key. The
//! 32-byte private scalar is encrypted with AES-256-GCM under a
//! process-wide secret before it is persisted; plaintext key material only
//! exists in memory, inside this module, while a transaction is being
//! signed.
//!
//! ## Secret rotation hazard
//!
//! Rotating `WALLET_ENCRYPTION_SECRET` without re-encrypting every stored
//! key makes those keys undecryptable: the GCM tag check fails and
//! `VaultError::Decryption` is returned. The affected wallets show up as
//! `failed` in sweep runs until the old secret is restored.

use aes_gcm::{aead::Aead, Aes256Gcm, Key, KeyInit, Nonce};
use alloy::signers::local::PrivateKeySigner;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;

/// Environment variable name for the key-encryption secret.
pub const ENCRYPTION_SECRET_ENV: &str = "WALLET_ENCRYPTION_SECRET";

/// Well-known fallback secret used when the environment variable is unset.
///
/// Deliberately insecure: running with it is a misconfiguration that must be
/// loudly visible in logs, not silently papered over.
const FALLBACK_SECRET: &str = "mintara-dev-secret-do-not-use-in-production";

/// AES-GCM nonce size in bytes.
const NONCE_LEN: usize = 12;

/// Errors from vault operations.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Ciphertext is malformed or the configured secret does not match the
    /// one the key was encrypted under.
    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("invalid private key: {0}")]
    InvalidKey(String),
}

/// Encrypted private key as stored in the wallet record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EncryptedKey {
    /// AES-256-GCM ciphertext (includes the auth tag), base64.
    pub ciphertext_b64: String,
    /// Random 96-bit nonce, base64.
    pub nonce_b64: String,
}

/// Result of provisioning a fresh deposit key.
#[derive(Debug, Clone)]
pub struct ProvisionedKey {
    /// EVM address derived from the key pair, 0x-prefixed lowercase hex.
    pub address: String,
    /// Private key ciphertext for persistence.
    pub encrypted_private_key: EncryptedKey,
}

/// Vault holding the process-wide key-encryption cipher.
pub struct KeyVault {
    cipher_key: [u8; 32],
}

impl KeyVault {
    /// Create a vault from an explicit secret.
    ///
    /// The 256-bit cipher key is derived as SHA-256 of the secret, so any
    /// length of secret is accepted.
    pub fn new(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        Self {
            cipher_key: digest.into(),
        }
    }

    /// Create a vault from `WALLET_ENCRYPTION_SECRET`.
    ///
    /// Falls back to a well-known development secret when the variable is
    /// unset. The fallback keeps the service running but leaves every stored
    /// key readable to anyone with the source code, so it is logged at
    /// error level on every startup.
    pub fn from_env() -> Self {
        match std::env::var(ENCRYPTION_SECRET_ENV) {
            Ok(secret) if !secret.trim().is_empty() => Self::new(&secret),
            _ => {
                tracing::error!(
                    "{} is not set; falling back to the built-in development secret. \
                     Stored keys are NOT protected. Set the secret before taking deposits.",
                    ENCRYPTION_SECRET_ENV
                );
                Self::new(FALLBACK_SECRET)
            }
        }
    }

    /// Generate a fresh deposit key pair.
    ///
    /// Returns the derived EVM address together with the encrypted private
    /// scalar. The address and ciphertext come from the same key pair and
    /// must be persisted together.
    pub fn generate(&self) -> Result<ProvisionedKey, VaultError> {
        let signing_key = SigningKey::random(&mut OsRng);
        let address = derive_address(&signing_key);
        let encrypted_private_key = self.encrypt(signing_key.to_bytes().as_slice())?;

        Ok(ProvisionedKey {
            address,
            encrypted_private_key,
        })
    }

    /// Encrypt raw key bytes under the vault cipher.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptedKey, VaultError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.cipher_key));
        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| VaultError::Encryption(e.to_string()))?;

        Ok(EncryptedKey {
            ciphertext_b64: BASE64.encode(ciphertext),
            nonce_b64: BASE64.encode(nonce_bytes),
        })
    }

    /// Decrypt an encrypted key back to raw bytes.
    pub fn decrypt(&self, encrypted: &EncryptedKey) -> Result<Vec<u8>, VaultError> {
        let ciphertext = BASE64
            .decode(&encrypted.ciphertext_b64)
            .map_err(|e| VaultError::Decryption(format!("ciphertext decoding failed: {e}")))?;
        let nonce_bytes = BASE64
            .decode(&encrypted.nonce_b64)
            .map_err(|e| VaultError::Decryption(format!("nonce decoding failed: {e}")))?;

        if nonce_bytes.len() != NONCE_LEN {
            return Err(VaultError::Decryption(format!(
                "nonce must be {NONCE_LEN} bytes, got {}",
                nonce_bytes.len()
            )));
        }

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.cipher_key));
        cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
            .map_err(|_| {
                VaultError::Decryption(
                    "GCM tag mismatch (wrong or rotated encryption secret?)".to_string(),
                )
            })
    }

    /// Decrypt an encrypted key and construct a transaction signer.
    ///
    /// Plaintext key bytes never leave this function.
    pub fn signer(&self, encrypted: &EncryptedKey) -> Result<PrivateKeySigner, VaultError> {
        let key_bytes = self.decrypt(encrypted)?;
        PrivateKeySigner::from_slice(&key_bytes)
            .map_err(|e| VaultError::InvalidKey(e.to_string()))
    }
}

/// Derive the EVM address for a signing key.
///
/// keccak256 over the uncompressed public key (minus the 0x04 prefix byte),
/// last 20 bytes, 0x-prefixed lowercase hex.
fn derive_address(signing_key: &SigningKey) -> String {
    use alloy::primitives::keccak256;

    let verifying_key = signing_key.verifying_key();
    let public_key_uncompressed = verifying_key.to_encoded_point(false);
    let public_key_bytes = public_key_uncompressed.as_bytes();
    let hash = keccak256(&public_key_bytes[1..]);
    let address_bytes = &hash[12..];
    format!("0x{}", alloy::hex::encode(address_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    use alloy::primitives::Address;

    #[test]
    fn encrypt_decrypt_round_trip() {
        let vault = KeyVault::new("test-secret");
        let plaintext = b"thirty-two bytes of key material";

        let encrypted = vault.encrypt(plaintext).unwrap();
        let decrypted = vault.decrypt(&encrypted).unwrap();

        assert_eq!(decrypted, plaintext);
        // Ciphertext is not the plaintext
        assert_ne!(encrypted.ciphertext_b64, BASE64.encode(plaintext));
    }

    #[test]
    fn decrypt_with_wrong_secret_fails() {
        let vault = KeyVault::new("first-secret");
        let rotated = KeyVault::new("second-secret");

        let encrypted = vault.encrypt(b"key bytes").unwrap();
        let result = rotated.decrypt(&encrypted);

        assert!(matches!(result, Err(VaultError::Decryption(_))));
    }

    #[test]
    fn decrypt_malformed_ciphertext_fails() {
        let vault = KeyVault::new("test-secret");

        let garbage = EncryptedKey {
            ciphertext_b64: "not base64 at all!!".to_string(),
            nonce_b64: BASE64.encode([0u8; 12]),
        };
        assert!(matches!(
            vault.decrypt(&garbage),
            Err(VaultError::Decryption(_))
        ));

        let short_nonce = EncryptedKey {
            ciphertext_b64: BASE64.encode(b"x"),
            nonce_b64: BASE64.encode([0u8; 4]),
        };
        assert!(matches!(
            vault.decrypt(&short_nonce),
            Err(VaultError::Decryption(_))
        ));
    }

    #[test]
    fn generate_produces_valid_address() {
        let vault = KeyVault::new("test-secret");
        let provisioned = vault.generate().unwrap();

        assert!(provisioned.address.starts_with("0x"));
        assert_eq!(provisioned.address.len(), 42);
        assert!(Address::from_str(&provisioned.address).is_ok());
    }

    #[test]
    fn generated_address_matches_decrypted_signer() {
        let vault = KeyVault::new("test-secret");
        let provisioned = vault.generate().unwrap();

        let signer = vault.signer(&provisioned.encrypted_private_key).unwrap();
        let expected = Address::from_str(&provisioned.address).unwrap();

        assert_eq!(signer.address(), expected);
    }

    #[test]
    fn generate_uses_fresh_nonces() {
        let vault = KeyVault::new("test-secret");
        let a = vault.encrypt(b"same bytes").unwrap();
        let b = vault.encrypt(b"same bytes").unwrap();

        assert_ne!(a.nonce_b64, b.nonce_b64);
        assert_ne!(a.ciphertext_b64, b.ciphertext_b64);
    }
}
