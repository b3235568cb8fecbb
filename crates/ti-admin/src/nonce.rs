//! Anti-replay tokens
//!
//! Tokens are signed over the action, the actor, the issue time and a
//! random salt. A token verifies only for the action and actor it was
//! issued for, only within its lifetime, and only once.
//!
//! Wire form: hex of `issued_at (8, big endian) | salt (16) | signature (64)`.

use crate::error::NonceError;
use dashmap::DashSet;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use std::fmt::{self, Display};

const SALT_LEN: usize = 16;
const TOKEN_LEN: usize = 8 + SALT_LEN + 64;

/// Action a token is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NonceAction {
    /// Create or replace an association
    CreateAssociation,
    /// Remove an association
    RemoveAssociation,
}

impl NonceAction {
    /// Action name as embedded in the signed message
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateAssociation => "taxonomy-image-plugin-create-association",
            Self::RemoveAssociation => "taxonomy-image-plugin-remove-association",
        }
    }
}

impl Display for NonceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issues and verifies single-use tokens
pub struct NonceIssuer {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
    lifetime_secs: u64,
    consumed: DashSet<String>,
}

impl fmt::Debug for NonceIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NonceIssuer")
            .field("verifying_key", &hex::encode(self.verifying_key.as_bytes()))
            .field("lifetime_secs", &self.lifetime_secs)
            .field("consumed", &self.consumed.len())
            .finish_non_exhaustive()
    }
}

impl NonceIssuer {
    /// Create issuer with a fresh key
    #[must_use]
    pub fn generate(lifetime_secs: u64) -> Self {
        let mut csprng = OsRng;
        Self::new(SigningKey::generate(&mut csprng), lifetime_secs)
    }

    /// Create issuer with a site key
    #[must_use]
    pub fn new(signing_key: SigningKey, lifetime_secs: u64) -> Self {
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
            lifetime_secs,
            consumed: DashSet::new(),
        }
    }

    /// Issue a token now
    #[must_use]
    pub fn issue(&self, action: NonceAction, actor: &str) -> String {
        self.issue_at(action, actor, now_secs())
    }

    /// Issue a token at a given time
    #[must_use]
    pub fn issue_at(&self, action: NonceAction, actor: &str, issued_at: u64) -> String {
        let salt: [u8; SALT_LEN] = rand::random();
        let message = token_message(action, actor, issued_at, &salt);
        let signature: Signature = self.signing_key.sign(&message);

        let mut raw = Vec::with_capacity(TOKEN_LEN);
        raw.extend_from_slice(&issued_at.to_be_bytes());
        raw.extend_from_slice(&salt);
        raw.extend_from_slice(&signature.to_bytes());
        hex::encode(raw)
    }

    /// Verify and consume a token now
    ///
    /// # Errors
    /// Returns error if the token is malformed, forged, expired or reused
    pub fn verify(&self, token: &str, action: NonceAction, actor: &str) -> Result<(), NonceError> {
        self.verify_at(token, action, actor, now_secs())
    }

    /// Verify and consume a token at a given time
    ///
    /// # Errors
    /// Same as [`NonceIssuer::verify`]
    pub fn verify_at(
        &self,
        token: &str,
        action: NonceAction,
        actor: &str,
        now: u64,
    ) -> Result<(), NonceError> {
        let raw = hex::decode(token.trim()).map_err(|_| NonceError::Malformed)?;
        if raw.len() != TOKEN_LEN {
            return Err(NonceError::Malformed);
        }

        let (time, rest) = raw.split_at(8);
        let (salt, signature) = rest.split_at(SALT_LEN);
        let mut time_bytes = [0u8; 8];
        time_bytes.copy_from_slice(time);
        let issued_at = u64::from_be_bytes(time_bytes);
        let signature = Signature::from_slice(signature).map_err(|_| NonceError::Malformed)?;

        let message = token_message(action, actor, issued_at, salt);
        self.verifying_key
            .verify(&message, &signature)
            .map_err(|_| NonceError::Forged)?;

        if now.saturating_sub(issued_at) > self.lifetime_secs {
            return Err(NonceError::Expired);
        }

        if !self.consumed.insert(token.trim().to_ascii_lowercase()) {
            return Err(NonceError::Replayed);
        }
        Ok(())
    }

    /// Number of consumed tokens
    #[must_use]
    pub fn consumed(&self) -> usize {
        self.consumed.len()
    }
}

fn token_message(action: NonceAction, actor: &str, issued_at: u64, salt: &[u8]) -> Vec<u8> {
    let action = action.as_str();
    let mut message = Vec::with_capacity(action.len() + actor.len() + 8 + salt.len() + 2);
    message.extend_from_slice(action.as_bytes());
    message.push(0);
    message.extend_from_slice(actor.as_bytes());
    message.push(0);
    message.extend_from_slice(&issued_at.to_be_bytes());
    message.extend_from_slice(salt);
    message
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
