use std::time::Duration;

use super::error::{CouchDaoError, CouchResult};

const DEFAULT_LONGPOLL: Duration = Duration::from_secs(30);
const DEFAULT_FEED_RETRY: Duration = Duration::from_secs(2);

/// Runtime configuration describing how to connect to CouchDB.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    /// Server root, e.g. `http://localhost:5984`.
    pub base_url: String,
    /// Database holding every game's documents; created when missing.
    pub database: String,
    /// Basic-auth user.
    pub username: Option<String>,
    /// Basic-auth password.
    pub password: Option<String>,
    /// How long a `_changes` long-poll request is held open by the server.
    pub longpoll: Duration,
    /// Pause between two attempts of a failing change feed.
    pub feed_retry: Duration,
}

impl CouchConfig {
    /// Construct a configuration from explicit base URL and database name.
    pub fn new(base_url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            database: database.into(),
            username: None,
            password: None,
            longpoll: DEFAULT_LONGPOLL,
            feed_retry: DEFAULT_FEED_RETRY,
        }
    }

    /// Attach basic-auth credentials to the configuration.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Build a configuration by reading the expected environment variables.
    ///
    /// `COUCH_BASE_URL` and `COUCH_DB` are required; credentials are only used
    /// when both `COUCH_USERNAME` and `COUCH_PASSWORD` are set.
    pub fn from_env() -> CouchResult<Self> {
        let base_url = required_env("COUCH_BASE_URL")?;
        let database = required_env("COUCH_DB")?;

        let mut config = Self::new(base_url, database);
        if let (Ok(username), Ok(password)) = (
            std::env::var("COUCH_USERNAME"),
            std::env::var("COUCH_PASSWORD"),
        ) {
            config = config.with_credentials(username, password);
        }

        Ok(config)
    }
}

fn required_env(var: &'static str) -> CouchResult<String> {
    std::env::var(var)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or(CouchDaoError::MissingEnvVar { var })
}
