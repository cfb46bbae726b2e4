use std::str::FromStr;

use thiserror::Error;
use url::Url;

const AUTH_URL_VAR: &str = "LAUNCHPAD_AUTH_URL";
const ANON_KEY_VAR: &str = "LAUNCHPAD_AUTH_ANON_KEY";
const APP_URL_VAR: &str = "LAUNCHPAD_APP_URL";
const ENV_VAR: &str = "LAUNCHPAD_ENV";
const DEBUG_VAR: &str = "LAUNCHPAD_ENABLE_DEBUG";
const COOKIE_SECURE_VAR: &str = "COOKIE_SECURE";

const DEFAULT_APP_URL: &str = "http://localhost:3000";

/// Configuration problems detected at startup. All of them are fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("{var} is not a valid http(s) URL: {reason}")]
    InvalidUrl { var: &'static str, reason: String },

    #[error("{var} has an invalid value: {reason}")]
    InvalidValue { var: &'static str, reason: String },
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnv {
    #[default]
    Development,
    Production,
    Test,
}

impl AppEnv {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl FromStr for AppEnv {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(format!(
                "expected development, production or test, got {other:?}"
            )),
        }
    }
}

/// Settings for talking to the hosted auth provider.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Base URL of the provider project (e.g. `https://abcd.supabase.co`).
    pub provider_url: Url,
    /// Public (anonymous) API key sent with every provider call.
    pub anon_key: String,
    /// Public URL of this application, used for email redirect links.
    pub app_url: Url,
    pub env: AppEnv,
    pub debug: bool,
    pub cookie_secure: bool,
}

impl AuthConfig {
    /// Load from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LAUNCHPAD_AUTH_URL`: provider base URL (required)
    /// - `LAUNCHPAD_AUTH_ANON_KEY`: provider public API key (required)
    /// - `LAUNCHPAD_APP_URL`: public URL of the app (default: `http://localhost:3000`)
    /// - `LAUNCHPAD_ENV`: `development`, `production` or `test` (default: `development`)
    /// - `LAUNCHPAD_ENABLE_DEBUG`: `true` to enable debug output
    /// - `COOKIE_SECURE`: secure flag on session cookies (default: true in production)
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is absent or any value is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AuthConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider_url = non_empty(AUTH_URL_VAR).ok_or(ConfigError::Missing(AUTH_URL_VAR))?;
        let provider_url = parse_http_url(AUTH_URL_VAR, &provider_url)?;

        let anon_key = non_empty(ANON_KEY_VAR)
            .ok_or(ConfigError::Missing(ANON_KEY_VAR))?
            .trim()
            .to_string();

        let app_url = non_empty(APP_URL_VAR).unwrap_or_else(|| DEFAULT_APP_URL.to_string());
        let app_url = parse_http_url(APP_URL_VAR, &app_url)?;

        let env = match non_empty(ENV_VAR) {
            Some(value) => value
                .trim()
                .parse::<AppEnv>()
                .map_err(|reason| ConfigError::InvalidValue {
                    var: ENV_VAR,
                    reason,
                })?,
            None => AppEnv::default(),
        };

        let debug = non_empty(DEBUG_VAR)
            .map(|v| v.trim() == "true")
            .unwrap_or(false);

        let cookie_secure = non_empty(COOKIE_SECURE_VAR)
            .map(|v| v == "true" || v == "1")
            .unwrap_or(env.is_production());

        Ok(Self {
            provider_url,
            anon_key,
            app_url,
            env,
            debug,
            cookie_secure,
        })
    }

    /// Project identifier used in cookie names: the first label of the provider host.
    pub fn project_ref(&self) -> String {
        self.provider_url
            .host_str()
            .and_then(|host| host.split('.').next())
            .filter(|label| !label.is_empty())
            .unwrap_or("local")
            .to_string()
    }
}

fn parse_http_url(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl {
        var,
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            var,
            reason: format!("unsupported scheme {:?}", url.scheme()),
        });
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl {
            var,
            reason: "missing host".to_string(),
        });
    }

    Ok(url)
}
