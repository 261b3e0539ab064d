//! Email/password principals shared by the store implementations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::{ChatError, ChatResult};

pub const MIN_PASSWORD_CHARS: usize = 6;

/// One registered principal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub email: String,
    pub salt: String,
    #[serde(rename = "passwordHash")]
    pub password_hash: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Principal {
    fn verify(&self, password: &str) -> bool {
        hash_password(&self.salt, password) == self.password_hash
    }
}

/// Trim and lowercase; reject anything that cannot be an address.
pub fn normalize_email(email: &str) -> ChatResult<String> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(email)
    } else {
        Err(ChatError::InvalidEmail(email))
    }
}

/// Hex SHA-256 of `salt:password`.
pub fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// The principal collection, as stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrincipalTable {
    pub principals: Vec<Principal>,
}

impl PrincipalTable {
    /// Add a principal and return its user id.
    pub fn register(&mut self, email: &str, password: &str) -> ChatResult<String> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(ChatError::WeakPassword {
                min: MIN_PASSWORD_CHARS,
            });
        }
        if self.principals.iter().any(|p| p.email == email) {
            return Err(ChatError::EmailTaken(email));
        }

        let salt = uuid::Uuid::new_v4().simple().to_string();
        let principal = Principal {
            user_id: uuid::Uuid::new_v4().to_string(),
            password_hash: hash_password(&salt, password),
            salt,
            email,
            created_at: Utc::now(),
        };
        info!("Registered user {}", principal.user_id);
        let user_id = principal.user_id.clone();
        self.principals.push(principal);
        Ok(user_id)
    }

    /// Return the user id for matching credentials.
    pub fn authenticate(&self, email: &str, password: &str) -> ChatResult<String> {
        let email = normalize_email(email).map_err(|_| ChatError::InvalidCredentials)?;
        match self.principals.iter().find(|p| p.email == email) {
            Some(principal) if principal.verify(password) => Ok(principal.user_id.clone()),
            _ => {
                warn!("Rejected sign-in");
                Err(ChatError::InvalidCredentials)
            }
        }
    }
}
