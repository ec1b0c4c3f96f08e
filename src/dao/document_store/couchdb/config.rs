use std::env;

use super::error::{CouchDaoError, CouchResult};

const DEFAULT_DATABASE: &str = "rebms";

/// Runtime configuration describing how to reach CouchDB.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    pub base_url: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl CouchConfig {
    /// Construct a configuration from explicit base URL and database name.
    pub fn new(base_url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            database: database.into(),
            username: None,
            password: None,
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

    /// Read `COUCH_BASE_URL`, `COUCH_DB` and optional credentials.
    ///
    /// Returns `Ok(None)` when no base URL is set so callers can pick another backend.
    pub fn from_env() -> CouchResult<Option<Self>> {
        let Ok(base_url) = env::var("COUCH_BASE_URL") else {
            return Ok(None);
        };
        if base_url.trim().is_empty() {
            return Err(CouchDaoError::MissingEnvVar {
                var: "COUCH_BASE_URL",
            });
        }

        let database = env::var("COUCH_DB").unwrap_or_else(|_| DEFAULT_DATABASE.to_string());
        let mut config = Self::new(base_url, database);

        if let (Ok(username), Ok(password)) =
            (env::var("COUCH_USERNAME"), env::var("COUCH_PASSWORD"))
        {
            config = config.with_credentials(username, password);
        }

        Ok(Some(config))
    }
}
