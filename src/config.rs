//! Site configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SHARED_COOKIE_DOMAIN: &str = "ekgf.org";
pub const DEFAULT_CONTACT_TO: &str = "contact@ekgf.org";
pub const DEFAULT_CONTACT_FROM: &str = "EKGF <noreply@ekgf.org>";
pub const DEFAULT_DELIVERY_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    pub port: u16,
    /// Parent domain shared by all sibling sites (`ekgf.org`, no leading dot).
    pub shared_cookie_domain: String,
    pub cookie_secure: bool,
    pub contact_to: String,
    pub contact_from: String,
    pub resend_api_key: Option<String>,
    pub delivery_timeout: Duration,
    pub static_dir: PathBuf,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            shared_cookie_domain: DEFAULT_SHARED_COOKIE_DOMAIN.to_owned(),
            cookie_secure: false,
            contact_to: DEFAULT_CONTACT_TO.to_owned(),
            contact_from: DEFAULT_CONTACT_FROM.to_owned(),
            resend_api_key: None,
            delivery_timeout: Duration::from_secs(DEFAULT_DELIVERY_TIMEOUT_SECS),
            static_dir: default_static_dir(),
        }
    }
}

impl SiteConfig {
    /// Build typed config from environment variables.
    ///
    /// All variables are optional:
    /// - `PORT`: default 3000
    /// - `SHARED_COOKIE_DOMAIN`: default `ekgf.org`
    /// - `COOKIE_SECURE`: boolean, default false
    /// - `CONTACT_TO` / `CONTACT_FROM`: delivery addresses
    /// - `RESEND_API_KEY`: enables Resend delivery when non-empty
    /// - `CONTACT_DELIVERY_TIMEOUT_SECS`: default 10
    /// - `STATIC_DIR`: default `<crate>/static`
    ///
    /// # Errors
    ///
    /// Returns an error when a variable is present but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. `from_env` delegates here so
    /// tests can avoid touching process-global environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = parse_or("PORT", lookup("PORT"), defaults.port)?;
        let shared_cookie_domain = lookup("SHARED_COOKIE_DOMAIN")
            .map(|raw| normalize_domain(&raw))
            .filter(|domain| !domain.is_empty())
            .unwrap_or(defaults.shared_cookie_domain);
        let cookie_secure = match lookup("COOKIE_SECURE") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid { key: "COOKIE_SECURE", value: raw })?,
            None => defaults.cookie_secure,
        };
        let contact_to = non_empty(lookup("CONTACT_TO")).unwrap_or(defaults.contact_to);
        let contact_from = non_empty(lookup("CONTACT_FROM")).unwrap_or(defaults.contact_from);
        let resend_api_key = non_empty(lookup("RESEND_API_KEY"));
        let timeout_secs = parse_or(
            "CONTACT_DELIVERY_TIMEOUT_SECS",
            lookup("CONTACT_DELIVERY_TIMEOUT_SECS"),
            DEFAULT_DELIVERY_TIMEOUT_SECS,
        )?;
        let static_dir = lookup("STATIC_DIR").map_or(defaults.static_dir, PathBuf::from);

        Ok(Self {
            port,
            shared_cookie_domain,
            cookie_secure,
            contact_to,
            contact_from,
            resend_api_key,
            delivery_timeout: Duration::from_secs(timeout_secs),
            static_dir,
        })
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse::<T>().map_err(|_| ConfigError::Invalid { key, value }),
    }
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

fn normalize_domain(raw: &str) -> String {
    raw.trim().trim_start_matches('.').to_ascii_lowercase()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("static")
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
