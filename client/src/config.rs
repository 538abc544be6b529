//! Client configuration loaded via OrthoConfig.
//!
//! Values come from `USER_DIRECTORY_*` environment variables and any
//! configuration file OrthoConfig discovers. Command-line flags are applied
//! on top by the CLI.

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Users resource used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:5015/api/users";

/// Errors raised while interpreting loaded settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The configured URL does not parse.
    #[error("invalid users API URL `{url}`: {source}")]
    InvalidUrl {
        /// Raw configured value.
        url: String,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },
    /// The configured URL is not plain HTTP(S).
    #[error("users API URL `{url}` must use http or https, not `{scheme}`")]
    UnsupportedScheme {
        /// Raw configured value.
        url: String,
        /// Scheme found in the value.
        scheme: String,
    },
}

/// Settings for the user directory client.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "USER_DIRECTORY")]
pub struct ClientSettings {
    /// Base URL of the users collection.
    pub api_url: Option<String>,
    /// Emit log lines as JSON.
    #[ortho_config(default = false)]
    pub json_logs: bool,
    /// Serve commands from an in-memory directory instead of the network.
    #[ortho_config(default = false)]
    pub offline: bool,
}

impl ClientSettings {
    /// Replace the configured URL, e.g. from a command-line flag.
    #[must_use]
    pub fn with_api_url(mut self, api_url: Option<String>) -> Self {
        if api_url.is_some() {
            self.api_url = api_url;
        }
        self
    }

    /// Switch to the in-memory directory when `offline` is set. Never turns
    /// a configured offline mode back off.
    #[must_use]
    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline |= offline;
        self
    }

    /// Configured URL, falling back to [`DEFAULT_API_URL`].
    #[must_use]
    pub fn raw_api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    /// Parse and check the configured users URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the value is not an absolute `http` or
    /// `https` URL.
    pub fn api_url(&self) -> Result<Url, ConfigError> {
        let raw = self.raw_api_url();
        let url = Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
            url: raw.to_owned(),
            source,
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ConfigError::UnsupportedScheme {
                url: raw.to_owned(),
                scheme: scheme.to_owned(),
            }),
        }
    }
}
