//! Roomshare client library
//!
//! Client for a shared-household expense tracker built on a hosted
//! PostgREST backend: roommate lists with running balances, payment
//! reminders sent through a remote email function, and a household event
//! calendar.
//!
//! ```no_run
//! use std::sync::Arc;
//! use roomshare::{notify::LogNotifier, Roomshare};
//!
//! # async fn run() -> roomshare::error::Result<()> {
//! let client = Roomshare::new("https://your-project.supabase.co", "your-anon-key")?;
//! client.auth().sign_in_with_password("me@example.com", "secret").await?;
//!
//! let roommates = client.roommates(Arc::new(LogNotifier));
//! roommates.add_roommate("friend@example.com").await;
//! for roommate in roommates.fetch_roommates().await {
//!     println!("{} owes {}", roommate.name, roommate.balance);
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod fetch;
pub mod functions;
pub mod models;
pub mod notify;
pub mod postgrest;
pub mod reminders;
pub mod roommates;
pub mod validation;

use reqwest::Client;
use std::sync::Arc;

use crate::auth::Auth;
use crate::cache::RoommateCache;
use crate::config::{ClientOptions, RoomshareConfig};
use crate::error::Result;
use crate::events::EventForm;
use crate::functions::FunctionsClient;
use crate::notify::Notifier;
use crate::postgrest::PostgrestClient;
use crate::reminders::Mailer;
use crate::roommates::Roommates;

/// The main entry point for the roomshare client. Clones share the HTTP
/// client, the session and the roommate cache.
#[derive(Clone)]
pub struct Roomshare {
    /// The base URL of the backend project, without a trailing slash
    url: String,
    /// The anonymous API key
    key: String,
    http_client: Client,
    auth: Auth,
    options: ClientOptions,
    cache: RoommateCache,
}

impl Roomshare {
    /// Create a new client with default options
    pub fn new(url: &str, key: &str) -> Result<Self> {
        Self::new_with_options(url, key, ClientOptions::default())
    }

    /// Create a new client with custom options
    pub fn new_with_options(url: &str, key: &str, options: ClientOptions) -> Result<Self> {
        let config = RoomshareConfig::new(url, key.to_string())?.with_options(options);
        Self::from_config(config)
    }

    pub fn from_config(config: RoomshareConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let url = config.base_url();
        let auth = Auth::new(&url, &config.anon_key, http_client.clone());

        log::debug!("Roomshare client initialized for {}", url);

        Ok(Self {
            url,
            key: config.anon_key,
            http_client,
            auth,
            options: config.options,
            cache: RoommateCache::new(),
        })
    }

    /// Convenience constructor reading [`RoomshareConfig::from_env`]
    pub fn from_env() -> Result<Self> {
        Self::from_config(RoomshareConfig::from_env()?)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Get a reference to the auth client
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// Client for `table` authenticated with the API key only
    pub fn from(&self, table: &str) -> PostgrestClient {
        PostgrestClient::new(&self.url, &self.key, table, self.http_client.clone())
            .with_schema(&self.options.db_schema)
    }

    /// Client for `table` acting as the signed-in user
    pub fn from_authed(&self, table: &str) -> Result<PostgrestClient> {
        let token = self.auth.access_token()?;
        Ok(self.from(table).with_auth(&token))
    }

    /// Mailer bound to the signed-in user
    pub fn mailer(&self) -> Result<Mailer> {
        let token = self.auth.access_token()?;
        let functions = FunctionsClient::new(&self.url, &self.key, self.http_client.clone())
            .with_auth(&token);
        Ok(Mailer::new(functions, &self.options))
    }

    pub fn roommate_cache(&self) -> &RoommateCache {
        &self.cache
    }

    pub fn roommates(&self, notifier: Arc<dyn Notifier>) -> Roommates {
        Roommates::new(self.clone(), notifier)
    }

    pub fn events(&self, notifier: Arc<dyn Notifier>) -> EventForm {
        EventForm::new(self.clone(), notifier)
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::{ClientOptions, RoomshareConfig};
    pub use crate::error::{Error, Result};
    pub use crate::events::{EventForm, EventInput};
    pub use crate::models::{Event, EventType, Profile, Roommate};
    pub use crate::notify::{LogNotifier, MemoryNotifier, Notification, Notifier, Severity};
    pub use crate::roommates::{AddedRoommate, Roommates};
    pub use crate::Roomshare;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn strips_trailing_slash() {
        let client = Roomshare::new("http://localhost:54321/", "anon").unwrap();
        assert_eq!(client.url(), "http://localhost:54321");
    }

    #[test]
    fn authed_table_requires_session() {
        let client = Roomshare::new("http://localhost:54321", "anon").unwrap();
        assert!(matches!(client.from_authed("roommates"), Err(Error::Auth(_))));
        assert!(matches!(client.mailer(), Err(Error::Auth(_))));
    }
}
