//! Application configuration.
//!
//! Settings come from the environment with a `LAUNCHDESK_` prefix, with
//! programmatic overrides through [`ConfigBuilder`]. Gateway credentials
//! are held as [`SecretString`] so they never land in debug output.

use std::net::SocketAddr;

use secrecy::SecretString;

use crate::error::{LaunchdeskError, Result};

const ENV_PREFIX: &str = "LAUNCHDESK_";

fn env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{key}"))
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// Main configuration for a Launchdesk application.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub razorpay: RazorpayConfig,
    pub paypal: PayPalConfig,
    /// Value of `GOOGLE_SERVICE_ACCOUNT_KEY`: key JSON or a path to it.
    pub google_service_account_key: Option<String>,
    /// Days of grace granted when a renewal charge fails.
    pub billing_grace_days: i64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: SecretString,
}

#[derive(Debug, Clone)]
pub struct PayPalConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub sandbox: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            razorpay: RazorpayConfig::default(),
            paypal: PayPalConfig::default(),
            google_service_account_key: None,
            billing_grace_days: default_grace_days(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Default for RazorpayConfig {
    fn default() -> Self {
        Self {
            key_id: String::new(),
            key_secret: SecretString::new(String::new()),
        }
    }
}

impl Default for PayPalConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: SecretString::new(String::new()),
            sandbox: true,
        }
    }
}

fn default_grace_days() -> i64 {
    7
}

impl ServerConfig {
    pub fn addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Builder for [`Config`] with environment variable support.
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    pub fn with_razorpay(
        mut self,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
    ) -> Self {
        self.config.razorpay.key_id = key_id.into();
        self.config.razorpay.key_secret = SecretString::from(key_secret.into());
        self
    }

    pub fn with_paypal(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.config.paypal.client_id = client_id.into();
        self.config.paypal.client_secret = SecretString::from(client_secret.into());
        self
    }

    pub fn with_paypal_sandbox(mut self, sandbox: bool) -> Self {
        self.config.paypal.sandbox = sandbox;
        self
    }

    pub fn with_google_service_account_key(mut self, key: impl Into<String>) -> Self {
        self.config.google_service_account_key = Some(key.into());
        self
    }

    pub fn with_billing_grace_days(mut self, days: i64) -> Self {
        self.config.billing_grace_days = days;
        self
    }

    /// Load configuration from environment variables with the
    /// `LAUNCHDESK_` prefix. `GOOGLE_SERVICE_ACCOUNT_KEY` is also read
    /// unprefixed, matching the convention of the hosting platforms this
    /// runs on.
    pub fn from_env(mut self) -> Self {
        if let Some(host) = env_with_prefix("HOST") {
            self.config.server.host = host;
        }
        if let Some(port) = env_with_prefix("PORT") {
            if let Ok(p) = port.parse() {
                self.config.server.port = p;
            }
        }
        if let Some(level) = env_with_prefix("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = env_with_prefix("LOG_JSON") {
            self.config.logging.json = json.parse().unwrap_or(false);
        }
        if let Some(key_id) = env_with_prefix("RAZORPAY_KEY_ID") {
            self.config.razorpay.key_id = key_id;
        }
        if let Some(secret) = env_with_prefix("RAZORPAY_KEY_SECRET") {
            self.config.razorpay.key_secret = SecretString::from(secret);
        }
        if let Some(client_id) = env_with_prefix("PAYPAL_CLIENT_ID") {
            self.config.paypal.client_id = client_id;
        }
        if let Some(secret) = env_with_prefix("PAYPAL_CLIENT_SECRET") {
            self.config.paypal.client_secret = SecretString::from(secret);
        }
        if let Some(sandbox) = env_with_prefix("PAYPAL_SANDBOX") {
            self.config.paypal.sandbox = sandbox.parse().unwrap_or(true);
        }
        if let Some(days) = env_with_prefix("BILLING_GRACE_DAYS") {
            if let Ok(d) = days.parse() {
                self.config.billing_grace_days = d;
            }
        }

        if let Some(key) = env_with_prefix("GOOGLE_SERVICE_ACCOUNT_KEY")
            .or_else(|| std::env::var("GOOGLE_SERVICE_ACCOUNT_KEY").ok())
            .filter(|v| !v.trim().is_empty())
        {
            self.config.google_service_account_key = Some(key);
        }

        self
    }

    /// Build the configuration, validating all settings.
    ///
    /// # Errors
    ///
    /// Returns an error when the server address does not parse, the log
    /// level is unknown, or the grace period is negative.
    pub fn build(self) -> Result<Config> {
        self.config.server.addr().map_err(|e| {
            LaunchdeskError::bad_request(format!(
                "Invalid server address {}:{} - {}",
                self.config.server.host, self.config.server.port, e
            ))
        })?;

        if self.config.server.port == 0 {
            return Err(LaunchdeskError::bad_request(
                "Server port must be greater than 0",
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.config.logging.level.to_lowercase().as_str()) {
            return Err(LaunchdeskError::bad_request(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.config.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        if self.config.billing_grace_days < 0 {
            return Err(LaunchdeskError::bad_request(
                "Billing grace days must not be negative",
            ));
        }

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
