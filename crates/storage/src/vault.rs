// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Vault-encoded secret handling: recognizes the `{"__ENC__": ...}`
//! wrapper form `ens_engine::expr::Tainted` serializes to, and
//! encrypts/decrypts the inner value with AES-256-GCM so a persisted
//! document never carries plaintext secrets at rest.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use serde_json::Value;

const ENC_KEY: &str = "__ENC__";

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("vault key must be exactly 32 bytes, got {0}")]
    BadKeyLength(usize),
    #[error("failed to seal secret value")]
    SealFailed,
    #[error("failed to open vault-encoded value: {0}")]
    OpenFailed(String),
    #[error("vault-encoded value is not valid base64: {0}")]
    BadEncoding(String),
}

/// An AES-256-GCM vault keyed by a 32-byte secret, mirroring the
/// passphrase-derived vaults the original project's `LocalVault`
/// implementations wrap.
pub struct Vault {
    key: LessSafeKey,
    rng: SystemRandom,
}

impl Vault {
    pub fn new(key_bytes: &[u8]) -> Result<Self, VaultError> {
        if key_bytes.len() != 32 {
            return Err(VaultError::BadKeyLength(key_bytes.len()));
        }
        let unbound = UnboundKey::new(&AES_256_GCM, key_bytes).map_err(|_| VaultError::SealFailed)?;
        Ok(Self { key: LessSafeKey::new(unbound), rng: SystemRandom::new() })
    }

    /// Encrypt `plaintext`, returning a base64 blob of `nonce || ciphertext || tag`.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng.fill(&mut nonce_bytes).map_err(|_| VaultError::SealFailed)?;
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        let mut in_out = plaintext.as_bytes().to_vec();
        self.key
            .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| VaultError::SealFailed)?;

        let mut blob = nonce_bytes.to_vec();
        blob.extend_from_slice(&in_out);
        Ok(BASE64.encode(blob))
    }

    pub fn decrypt(&self, encoded: &str) -> Result<String, VaultError> {
        let blob = BASE64.decode(encoded).map_err(|e| VaultError::BadEncoding(e.to_string()))?;
        if blob.len() < NONCE_LEN {
            return Err(VaultError::OpenFailed("truncated ciphertext".to_string()));
        }
        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes).map_err(|e| VaultError::OpenFailed(e.to_string()))?;
        let mut buf = ciphertext.to_vec();
        let plain = self
            .key
            .open_in_place(nonce, Aad::empty(), &mut buf)
            .map_err(|_| VaultError::OpenFailed("authentication failed".to_string()))?;
        String::from_utf8(plain.to_vec()).map_err(|e| VaultError::OpenFailed(e.to_string()))
    }
}

/// True if `value` is the `{"__ENC__": ...}` wrapper `Tainted` serializes
/// to.
pub fn is_vault_encoded(value: &Value) -> bool {
    matches!(value, Value::Object(m) if m.len() == 1 && m.contains_key(ENC_KEY))
}

/// Recursively encrypt every plaintext string found under an `__ENC__`
/// wrapper, so the tree is safe to persist.
pub fn seal_tree(value: &Value, vault: &Vault) -> Result<Value, VaultError> {
    match value {
        Value::Object(map) => {
            if is_vault_encoded(value) {
                let plaintext = map[ENC_KEY].as_str().unwrap_or_default();
                let sealed = vault.encrypt(plaintext)?;
                return Ok(serde_json::json!({ ENC_KEY: sealed }));
            }
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), seal_tree(v, vault)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(seal_tree(item, vault)?);
            }
            Ok(Value::Array(out))
        }
        other => Ok(other.clone()),
    }
}

/// The inverse of [`seal_tree`]: decrypt every `__ENC__` wrapper back to
/// its plaintext form (still wrapped, so callers can distinguish a
/// revealed secret from an ordinary string).
pub fn open_tree(value: &Value, vault: &Vault) -> Result<Value, VaultError> {
    match value {
        Value::Object(map) => {
            if is_vault_encoded(value) {
                let ciphertext = map[ENC_KEY].as_str().unwrap_or_default();
                let plaintext = vault.decrypt(ciphertext)?;
                return Ok(serde_json::json!({ ENC_KEY: plaintext }));
            }
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), open_tree(v, vault)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(open_tree(item, vault)?);
            }
            Ok(Value::Array(out))
        }
        other => Ok(other.clone()),
    }
}

/// A redaction placeholder for display when no vault key is configured.
pub fn redact_tree(value: &Value) -> Value {
    match value {
        Value::Object(map) if is_vault_encoded(value) => {
            serde_json::json!({ ENC_KEY: "<redacted>" })
        }
        Value::Object(map) => {
            Value::Object(map.iter().map(|(k, v)| (k.clone(), redact_tree(v))).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_tree).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_vault() -> Vault {
        Vault::new(&[7u8; 32]).unwrap()
    }

    #[test]
    fn encrypt_then_decrypt_round_trips() {
        let vault = test_vault();
        let sealed = vault.encrypt("s3cr3t").unwrap();
        assert_ne!(sealed, "s3cr3t");
        assert_eq!(vault.decrypt(&sealed).unwrap(), "s3cr3t");
    }

    #[test]
    fn rejects_keys_of_the_wrong_length() {
        assert!(Vault::new(&[1u8; 16]).is_err());
    }

    #[test]
    fn seal_tree_only_touches_enc_wrapped_leaves() {
        let vault = test_vault();
        let tree = serde_json::json!({
            "password": { "__ENC__": "hunter2" },
            "username": "admin",
        });
        let sealed = seal_tree(&tree, &vault).unwrap();
        assert_eq!(sealed["username"], "admin");
        assert!(is_vault_encoded(&sealed["password"]));
        assert_ne!(sealed["password"]["__ENC__"], "hunter2");

        let opened = open_tree(&sealed, &vault).unwrap();
        assert_eq!(opened["password"]["__ENC__"], "hunter2");
    }

    #[test]
    fn redact_tree_masks_without_a_vault() {
        let tree = serde_json::json!({ "password": { "__ENC__": "hunter2" } });
        let redacted = redact_tree(&tree);
        assert_eq!(redacted["password"]["__ENC__"], "<redacted>");
    }
}
