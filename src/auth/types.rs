//! Types for authentication and user management

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::auth::Session;

/// Account data returned by the auth endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,

    pub email: Option<String>,

    pub phone: Option<String>,

    #[serde(default)]
    pub user_metadata: HashMap<String, serde_json::Value>,

    pub created_at: Option<String>,
}

impl User {
    /// Display name stored in the account metadata, if any
    pub fn full_name(&self) -> Option<&str> {
        self.user_metadata
            .get("full_name")
            .or_else(|| self.user_metadata.get("name"))
            .and_then(|v| v.as_str())
    }
}

/// Body of a successful `token` grant
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub expires_in: i64,
    pub expires_at: Option<i64>,
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl From<TokenResponse> for Session {
    fn from(response: TokenResponse) -> Self {
        let mut session = Session::new(
            response.access_token,
            response.refresh_token,
            response.user,
            response.expires_in,
        );
        session.token_type = response.token_type;
        if response.expires_at.is_some() {
            session.expires_at = response.expires_at;
        }
        session
    }
}

/// The signed-in identity as the roommate and event code needs it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
}
