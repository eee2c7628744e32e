//! Encrypted credential and preference storage.
//!
//! Each entry is JSON `{ value, expiresAt }`, sealed with AES-256-GCM under a
//! fresh random nonce and stored as base64(`nonce || ciphertext`) under a
//! short key. An entry that is past its window, fails to decrypt or fails to
//! decode reads as absent and is removed.

use std::collections::BTreeMap;

use aes_gcm::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{
    engine::general_purpose::{STANDARD as BASE64, URL_SAFE_NO_PAD},
    Engine as _,
};
use chrono::{DateTime, TimeDelta, Utc};
use iterbene_shared::CredentialError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::storage::Storage;

pub const ACCESS_TOKEN_KEY: &str = "at";
pub const REFRESH_TOKEN_KEY: &str = "rt";
pub const USER_ID_KEY: &str = "uid";
pub const PREFERENCES_KEY: &str = "pf";

pub const ACCESS_TOKEN_DAYS: i64 = 7;
pub const REFRESH_TOKEN_DAYS: i64 = 30;
pub const USER_ID_DAYS: i64 = 30;
pub const PREFERENCES_DAYS: i64 = 30;

const NONCE_SIZE: usize = 12;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredValue {
    value: String,
    expires_at: DateTime<Utc>,
}

pub struct CredentialStore {
    storage: Storage,
    cipher: Aes256Gcm,
}

impl CredentialStore {
    /// The encryption key is the SHA-256 of `secret`.
    pub fn new(storage: Storage, secret: &str) -> Self {
        let key = Sha256::digest(secret.as_bytes());
        Self {
            storage,
            cipher: Aes256Gcm::new(&key),
        }
    }

    pub fn set_tokens(&self, access: &str, refresh: &str) -> Result<(), CredentialError> {
        self.put(ACCESS_TOKEN_KEY, access, TimeDelta::days(ACCESS_TOKEN_DAYS))?;
        self.put(REFRESH_TOKEN_KEY, refresh, TimeDelta::days(REFRESH_TOKEN_DAYS))
    }

    pub fn access_token(&self) -> Option<String> {
        self.get(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.get(REFRESH_TOKEN_KEY)
    }

    /// A stored access token whose `exp` claim is still in the future.
    pub fn valid_access_token(&self) -> Option<String> {
        self.access_token()
            .filter(|token| !is_token_expired(token, Utc::now()))
    }

    pub fn set_user_id(&self, user_id: &str) -> Result<(), CredentialError> {
        self.put(USER_ID_KEY, user_id, TimeDelta::days(USER_ID_DAYS))
    }

    pub fn user_id(&self) -> Option<String> {
        self.get(USER_ID_KEY)
    }

    /// Persist a named preference flag.
    pub fn set_flag(&self, name: &str, enabled: bool) -> Result<(), CredentialError> {
        let mut flags = self.flags();
        flags.insert(name.to_string(), enabled);
        let json =
            serde_json::to_string(&flags).map_err(|e| CredentialError::Malformed(e.to_string()))?;
        self.put(PREFERENCES_KEY, &json, TimeDelta::days(PREFERENCES_DAYS))
    }

    /// A preference flag, `false` when unset.
    pub fn flag(&self, name: &str) -> bool {
        self.flags().get(name).copied().unwrap_or(false)
    }

    fn flags(&self) -> BTreeMap<String, bool> {
        self.get(PREFERENCES_KEY)
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default()
    }

    /// Drop every credential and preference (logout).
    pub fn clear(&self) {
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_ID_KEY, PREFERENCES_KEY] {
            self.storage.remove(key);
        }
    }

    /// Store `value` under `key` for `ttl`.
    pub fn put(&self, key: &str, value: &str, ttl: TimeDelta) -> Result<(), CredentialError> {
        let stored = StoredValue {
            value: value.to_string(),
            expires_at: Utc::now() + ttl,
        };
        let plaintext =
            serde_json::to_vec(&stored).map_err(|e| CredentialError::Malformed(e.to_string()))?;
        let sealed = self.seal(&plaintext)?;
        if self.storage.save_raw(key, &sealed) {
            Ok(())
        } else {
            Err(CredentialError::Storage(key.to_string()))
        }
    }

    /// The value under `key` if present, unexpired and intact.
    pub fn get(&self, key: &str) -> Option<String> {
        let sealed = self.storage.load_raw(key)?;
        let stored = match self.open(&sealed) {
            Ok(stored) => stored,
            Err(e) => {
                crate::log_warn!("Discarding unreadable credential '{}': {}", key, e);
                self.storage.remove(key);
                return None;
            }
        };
        if stored.expires_at <= Utc::now() {
            crate::log_debug!("Credential '{}' expired at {}", key, stored.expires_at);
            self.storage.remove(key);
            return None;
        }
        Some(stored.value)
    }

    fn seal(&self, plaintext: &[u8]) -> Result<String, CredentialError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|_| CredentialError::Encrypt)?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(out))
    }

    fn open(&self, sealed: &str) -> Result<StoredValue, CredentialError> {
        let bytes = BASE64
            .decode(sealed.trim())
            .map_err(|e| CredentialError::Malformed(e.to_string()))?;
        if bytes.len() <= NONCE_SIZE {
            return Err(CredentialError::Malformed("value too short".to_string()));
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CredentialError::Decrypt)?;
        serde_json::from_slice(&plaintext).map_err(|e| CredentialError::Malformed(e.to_string()))
    }
}

/// Whether a JWT's `exp` claim is at or before `now`.
///
/// Anything that cannot be decoded counts as expired.
pub fn is_token_expired(token: &str, now: DateTime<Utc>) -> bool {
    match token_expiry(token) {
        Some(exp) => exp <= now.timestamp(),
        None => true,
    }
}

fn token_expiry(token: &str) -> Option<i64> {
    let mut parts = token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?;
    exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64))
}
