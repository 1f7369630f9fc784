//! Configuration options for the roomshare client

use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

/// Name of the remote function that delivers outbound email
pub const DEFAULT_EMAIL_FUNCTION: &str = "send-email";

/// Sender used when none is configured
pub const DEFAULT_EMAIL_FROM: &str = "Roomshare <noreply@roomshare.app>";

/// Configuration options for the roomshare client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// The database schema sent as `Accept-Profile`/`Content-Profile`
    pub db_schema: String,

    /// Remote function invoked to send email
    pub email_function: String,

    /// `from` address placed on outbound email
    pub email_from: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(30)),
            db_schema: "public".to_string(),
            email_function: DEFAULT_EMAIL_FUNCTION.to_string(),
            email_from: DEFAULT_EMAIL_FROM.to_string(),
        }
    }
}

impl ClientOptions {
    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the database schema
    pub fn with_db_schema(mut self, value: &str) -> Self {
        self.db_schema = value.to_string();
        self
    }

    /// Set the email function name
    pub fn with_email_function(mut self, value: &str) -> Self {
        self.email_function = value.to_string();
        self
    }

    /// Set the sender address for outbound email
    pub fn with_email_from(mut self, value: &str) -> Self {
        self.email_from = value.to_string();
        self
    }
}

/// Connection settings for a backend project.
#[derive(Debug, Clone)]
pub struct RoomshareConfig {
    pub url: Url,
    pub anon_key: String,
    pub options: ClientOptions,
}

impl RoomshareConfig {
    /// Creates a new configuration, validating the URL.
    pub fn new(url_str: &str, anon_key: String) -> Result<Self> {
        let url = Url::parse(url_str)?;
        if anon_key.is_empty() {
            return Err(Error::Config("anon_key cannot be empty".to_string()));
        }
        Ok(Self {
            url,
            anon_key,
            options: ClientOptions::default(),
        })
    }

    /// Reads `SUPABASE_URL`, `SUPABASE_ANON_KEY` and the optional
    /// `ROOMSHARE_EMAIL_FROM` from the environment.
    pub fn from_env() -> Result<Self> {
        let url_str = std::env::var("SUPABASE_URL").map_err(|_| {
            Error::Config("SUPABASE_URL environment variable not found".to_string())
        })?;
        let anon_key = std::env::var("SUPABASE_ANON_KEY").map_err(|_| {
            Error::Config("SUPABASE_ANON_KEY environment variable not found".to_string())
        })?;
        let mut config = Self::new(&url_str, anon_key)?;
        if let Ok(from) = std::env::var("ROOMSHARE_EMAIL_FROM") {
            config.options = config.options.with_email_from(&from);
        }
        Ok(config)
    }

    /// Base URL without a trailing slash, ready for path concatenation.
    pub fn base_url(&self) -> String {
        self.url.as_str().trim_end_matches('/').to_string()
    }

    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_new_valid() {
        let config = RoomshareConfig::new("http://localhost:54321", "anon".to_string()).unwrap();
        assert_eq!(config.url.to_string(), "http://localhost:54321/");
        assert_eq!(config.base_url(), "http://localhost:54321");
        assert_eq!(config.options.email_function, "send-email");
    }

    #[test]
    fn config_new_invalid_url() {
        let config = RoomshareConfig::new("not a valid url", "anon".to_string());
        assert!(matches!(config, Err(Error::Url(_))));
    }

    #[test]
    fn config_new_empty_key() {
        match RoomshareConfig::new("http://localhost:54321", String::new()) {
            Err(Error::Config(msg)) => assert!(msg.contains("anon_key cannot be empty")),
            other => panic!("Expected Config error for empty key, got {:?}", other),
        }
    }

    #[test]
    fn options_builder() {
        let options = ClientOptions::default()
            .with_request_timeout(None)
            .with_email_function("mailer")
            .with_email_from("House <house@example.com>");
        assert!(options.request_timeout.is_none());
        assert_eq!(options.email_function, "mailer");
        assert_eq!(options.email_from, "House <house@example.com>");
        assert_eq!(options.db_schema, "public");
    }
}
