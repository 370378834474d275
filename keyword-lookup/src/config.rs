use serde::Deserialize;
use std::fmt;
use url::Url;

pub const DEFAULT_PRIMARY_URL: &str = "https://api.searchad.naver.com";
pub const DEFAULT_SECONDARY_URL: &str = "https://openapi.naver.com";

pub const ENV_PRIMARY_API_KEY: &str = "NAVER_AD_API_KEY";
pub const ENV_PRIMARY_SECRET_KEY: &str = "NAVER_AD_SECRET_KEY";
pub const ENV_PRIMARY_CUSTOMER_ID: &str = "NAVER_AD_CUSTOMER_ID";
pub const ENV_SECONDARY_CLIENT_ID: &str = "NAVER_CLIENT_ID";
pub const ENV_SECONDARY_CLIENT_SECRET: &str = "NAVER_CLIENT_SECRET";

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Timeouts must be at least one second")]
    InvalidTimeout,

    #[error("Credentials for the {0} tier are only partially configured")]
    IncompleteCredentials(&'static str),
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct Listener {
    pub host: String,
    pub port: u16,
}

impl Listener {
    fn admin() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 3001,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

/// Per-tier HTTP timeouts. A tier that does not answer in time is skipped.
#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct Timeouts {
    pub connect_secs: u64,
    pub request_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            connect_secs: 10,
            request_secs: 10,
        }
    }
}

/// Signed keyword tool API.
#[derive(Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PrimaryConfig {
    pub base_url: Url,
    pub api_key: Option<String>,
    pub secret_key: Option<String>,
    pub customer_id: Option<String>,
}

#[derive(Clone, PartialEq)]
pub struct PrimaryCredentials {
    pub api_key: String,
    pub secret_key: String,
    pub customer_id: String,
}

impl PrimaryConfig {
    /// Returns the credentials when all of them are set.
    pub fn credentials(&self) -> Option<PrimaryCredentials> {
        Some(PrimaryCredentials {
            api_key: self.api_key.clone()?,
            secret_key: self.secret_key.clone()?,
            customer_id: self.customer_id.clone()?,
        })
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let set = [&self.api_key, &self.secret_key, &self.customer_id]
            .iter()
            .filter(|v| v.is_some())
            .count();
        if set != 0 && set != 3 {
            return Err(ValidationError::IncompleteCredentials("primary"));
        }
        Ok(())
    }
}

const REDACTED: &str = "<redacted>";

fn redact(value: &Option<String>) -> Option<&'static str> {
    value.as_ref().map(|_| REDACTED)
}

impl fmt::Debug for PrimaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimaryConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &redact(&self.api_key))
            .field("secret_key", &redact(&self.secret_key))
            .field("customer_id", &self.customer_id)
            .finish()
    }
}

impl fmt::Debug for PrimaryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimaryCredentials")
            .field("api_key", &REDACTED)
            .field("secret_key", &REDACTED)
            .field("customer_id", &self.customer_id)
            .finish()
    }
}

impl Default for PrimaryConfig {
    fn default() -> Self {
        PrimaryConfig {
            base_url: Url::parse(DEFAULT_PRIMARY_URL)
                .expect("default primary URL is valid"),
            api_key: None,
            secret_key: None,
            customer_id: None,
        }
    }
}

/// Public blog search API.
#[derive(Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SecondaryConfig {
    pub base_url: Url,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

#[derive(Clone, PartialEq)]
pub struct SecondaryCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl SecondaryConfig {
    pub fn credentials(&self) -> Option<SecondaryCredentials> {
        Some(SecondaryCredentials {
            client_id: self.client_id.clone()?,
            client_secret: self.client_secret.clone()?,
        })
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.client_id.is_some() != self.client_secret.is_some() {
            return Err(ValidationError::IncompleteCredentials("secondary"));
        }
        Ok(())
    }
}

impl fmt::Debug for SecondaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecondaryConfig")
            .field("base_url", &self.base_url.as_str())
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .finish()
    }
}

impl fmt::Debug for SecondaryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecondaryCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &REDACTED)
            .finish()
    }
}

impl Default for SecondaryConfig {
    fn default() -> Self {
        SecondaryConfig {
            base_url: Url::parse(DEFAULT_SECONDARY_URL)
                .expect("default secondary URL is valid"),
            client_id: None,
            client_secret: None,
        }
    }
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub listener: Listener,
    #[serde(default = "Listener::admin")]
    pub admin_listener: Listener,
    #[serde(default)]
    pub primary: PrimaryConfig,
    #[serde(default)]
    pub secondary: SecondaryConfig,
    #[serde(default)]
    pub timeouts: Timeouts,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listener: Listener::default(),
            admin_listener: Listener::admin(),
            primary: PrimaryConfig::default(),
            secondary: SecondaryConfig::default(),
            timeouts: Timeouts::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if self.timeouts.connect_secs == 0 || self.timeouts.request_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }

        self.primary.validate()?;
        self.secondary.validate()?;
        Ok(())
    }

    /// Overrides credentials with values from the process environment.
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok());
        self
    }

    /// Overrides credentials with values from `lookup`. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let overrides = [
            (ENV_PRIMARY_API_KEY, &mut self.primary.api_key),
            (ENV_PRIMARY_SECRET_KEY, &mut self.primary.secret_key),
            (ENV_PRIMARY_CUSTOMER_ID, &mut self.primary.customer_id),
            (ENV_SECONDARY_CLIENT_ID, &mut self.secondary.client_id),
            (ENV_SECONDARY_CLIENT_SECRET, &mut self.secondary.client_secret),
        ];

        for (key, slot) in overrides {
            if let Some(value) = lookup(key) {
                *slot = Some(value);
            }
        }
    }
}
