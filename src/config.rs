//! Signer configuration.
//!
//! The configuration is built once at startup and handed to
//! [`UrlSigner`](crate::UrlSigner), which owns it for the rest of the process.

use figment::providers::{Env, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};
use time::Duration;
use url::Url;

use crate::error::ConfigError;
use crate::Secret;

/// Default validity of a download link: 24 hours.
pub const DEFAULT_EXPIRATION_SECS: i64 = 60 * 60 * 24;

/// Longest accepted expiration window: one year.
pub const MAX_EXPIRATION_SECS: i64 = 60 * 60 * 24 * 366;

/// Default route the download URLs point at.
pub const DEFAULT_DOWNLOAD_ROUTE: &str = "certificates/download";

/// Environment variable prefix read by [`SignerConfig::from_env`].
pub const ENV_PREFIX: &str = "CERT_LINKS_";

/// Immutable settings for the certificate URL signer.
#[derive(Debug)]
pub struct SignerConfig {
    signing_secret: Secret<Vec<u8>>,
    expiration_window: Duration,
    download_route: String,
}

impl SignerConfig {
    /// Creates a configuration with the default 24 hour window and route.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptySecret`] if the key holds no bytes.
    pub fn new(signing_secret: Secret<Vec<u8>>) -> Result<Self, ConfigError> {
        Self::build(
            signing_secret,
            DEFAULT_EXPIRATION_SECS,
            DEFAULT_DOWNLOAD_ROUTE.to_string(),
        )
    }

    /// Overrides the expiration window.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidExpirationWindow`] for a zero or
    /// negative window, or one longer than [`MAX_EXPIRATION_SECS`].
    pub fn with_expiration_window(mut self, window: Duration) -> Result<Self, ConfigError> {
        if !window.is_positive() || window > Duration::seconds(MAX_EXPIRATION_SECS) {
            return Err(ConfigError::InvalidExpirationWindow(window.whole_seconds()));
        }
        self.expiration_window = window;
        Ok(self)
    }

    /// Overrides the download route.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::EmptyRoute`] for an empty route
    /// - [`ConfigError::InvalidRoute`] for a route that could resolve outside
    ///   the base URL: absolute URLs, `.`/`..` segments, backslashes, or a
    ///   query or fragment
    pub fn with_download_route(mut self, route: impl Into<String>) -> Result<Self, ConfigError> {
        let route = route.into();
        if route.trim().is_empty() {
            return Err(ConfigError::EmptyRoute);
        }
        check_route(&route)?;
        self.download_route = route;
        Ok(self)
    }

    /// Loads the configuration from `CERT_LINKS_*` environment variables.
    ///
    /// Recognised keys: `SIGNING_SECRET` (required), `EXPIRATION_SECS`
    /// and `DOWNLOAD_ROUTE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_figment(Figment::new().merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Loads the configuration from an arbitrary figment, layered over the
    /// defaults.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let raw: RawSignerConfig = Figment::from(Serialized::defaults(RawSignerConfig::default()))
            .merge(figment)
            .extract()?;

        let config = Self::build(
            Secret::from_text(raw.signing_secret),
            raw.expiration_secs,
            raw.download_route,
        )?;

        tracing::debug!(
            expiration_secs = config.expiration_window.whole_seconds(),
            download_route = %config.download_route,
            "loaded signer configuration"
        );

        Ok(config)
    }

    fn build(
        signing_secret: Secret<Vec<u8>>,
        expiration_secs: i64,
        download_route: String,
    ) -> Result<Self, ConfigError> {
        if signing_secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }

        Self {
            signing_secret,
            expiration_window: Duration::seconds(DEFAULT_EXPIRATION_SECS),
            download_route: DEFAULT_DOWNLOAD_ROUTE.to_string(),
        }
        .with_expiration_window(Duration::seconds(expiration_secs))?
        .with_download_route(download_route)
    }

    /// Returns the HMAC key.
    pub fn signing_secret(&self) -> &Secret<Vec<u8>> {
        &self.signing_secret
    }

    /// Returns how long issued links stay valid.
    pub fn expiration_window(&self) -> Duration {
        self.expiration_window
    }

    /// Returns the route path download URLs are rendered against.
    pub fn download_route(&self) -> &str {
        &self.download_route
    }
}

fn check_route(route: &str) -> Result<(), ConfigError> {
    let invalid = Url::parse(route).is_ok()
        || route.contains(['\\', '?', '#'])
        || route.split('/').any(|segment| matches!(segment, "." | ".."));

    if invalid {
        return Err(ConfigError::InvalidRoute(route.to_string()));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
struct RawSignerConfig {
    signing_secret: String,
    expiration_secs: i64,
    download_route: String,
}

impl Default for RawSignerConfig {
    fn default() -> Self {
        Self {
            signing_secret: String::new(),
            expiration_secs: DEFAULT_EXPIRATION_SECS,
            download_route: DEFAULT_DOWNLOAD_ROUTE.to_string(),
        }
    }
}
