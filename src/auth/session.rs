//! Session management for authentication

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::auth::User;
use crate::error::Error;

/// Session data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,

    pub refresh_token: String,

    pub token_type: String,

    /// The expiry time in seconds
    pub expires_in: i64,

    /// The expiry timestamp
    pub expires_at: Option<i64>,

    pub user: User,
}

/// Claims read from an access token
#[derive(Debug, Deserialize)]
struct AccessClaims {
    sub: Uuid,
    email: Option<String>,
    phone: Option<String>,
    exp: Option<i64>,
    #[serde(default)]
    user_metadata: HashMap<String, serde_json::Value>,
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_secs() as i64
}

impl Session {
    /// Create a new session
    pub fn new(access_token: String, refresh_token: String, user: User, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
            expires_in,
            expires_at: Some(now() + expires_in),
            user,
        }
    }

    /// Rebuild a session from a bare access token.
    ///
    /// The signature is not checked: the token is only used to recover the
    /// user identity locally, the backend verifies it on every request.
    pub fn from_access_token(access_token: &str) -> Result<Self, Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<AccessClaims>(
            access_token,
            &DecodingKey::from_secret(&[]),
            &validation,
        )?;
        let claims = data.claims;

        let user = User {
            id: claims.sub,
            email: claims.email,
            phone: claims.phone,
            user_metadata: claims.user_metadata,
            created_at: None,
        };

        Ok(Self {
            access_token: access_token.to_string(),
            refresh_token: String::new(),
            token_type: "bearer".to_string(),
            expires_in: claims.exp.map(|exp| exp - now()).unwrap_or(0),
            expires_at: claims.exp,
            user,
        })
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => now() >= expires_at,
            None => false,
        }
    }
}
