//! Authentication and session handling

mod session;
mod types;

use reqwest::Client;
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::Error;
use crate::fetch::Fetch;

pub use session::*;
pub use types::*;

/// Client for the auth endpoint, holding the current session
#[derive(Clone)]
pub struct Auth {
    url: String,
    key: String,
    client: Client,
    session: Arc<Mutex<Option<Session>>>,
}

impl Auth {
    pub(crate) fn new(url: &str, key: &str, client: Client) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            client,
            session: Arc::new(Mutex::new(None)),
        }
    }

    fn get_auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.url, path)
    }

    fn lock(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Sign in a user with email and password and keep the session
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, Error> {
        let url = self.get_auth_url("/token?grant_type=password");

        let response = Fetch::post(&self.client, &url)
            .header("apikey", &self.key)
            .json(&json!({ "email": email, "password": password }))?
            .execute::<TokenResponse>()
            .await
            .map_err(|e| match e {
                Error::Api { details, .. } => Error::auth(details),
                other => other,
            })?;

        let session = Session::from(response);
        log::info!("Signed in as {}", session.user.id);
        self.set_session(session.clone());
        Ok(session)
    }

    /// Sign out the current user
    pub async fn sign_out(&self) -> Result<(), Error> {
        let url = self.get_auth_url("/logout");
        let token = self.access_token()?;

        Fetch::post(&self.client, &url)
            .header("apikey", &self.key)
            .bearer_auth(&token)
            .execute_no_content()
            .await?;

        *self.lock() = None;
        Ok(())
    }

    /// Fetch the signed-in user's account from the server
    pub async fn get_user(&self) -> Result<User, Error> {
        let url = self.get_auth_url("/user");
        let token = self.access_token()?;

        let user = Fetch::get(&self.client, &url)
            .header("apikey", &self.key)
            .bearer_auth(&token)
            .execute::<User>()
            .await?;

        if let Some(session) = self.lock().as_mut() {
            session.user = user.clone();
        }
        Ok(user)
    }

    /// Get the current session
    pub fn get_session(&self) -> Option<Session> {
        self.lock().clone()
    }

    /// Set the session
    pub fn set_session(&self, session: Session) {
        *self.lock() = Some(session);
    }

    /// Access token of a live session
    pub fn access_token(&self) -> Result<String, Error> {
        match self.lock().as_ref() {
            Some(session) if session.is_expired() => Err(Error::auth("Session expired")),
            Some(session) => Ok(session.access_token.clone()),
            None => Err(Error::auth("Not logged in")),
        }
    }

    /// The signed-in user's id and email
    pub fn current_user(&self) -> Result<CurrentUser, Error> {
        let guard = self.lock();
        let session = guard.as_ref().ok_or_else(|| Error::auth("Not logged in"))?;
        let email = session
            .user
            .email
            .clone()
            .ok_or_else(|| Error::auth("Signed-in account has no email address"))?;
        Ok(CurrentUser {
            id: session.user.id,
            email,
        })
    }
}
