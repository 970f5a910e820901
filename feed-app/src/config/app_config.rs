//! Runtime application configuration loaded from the environment.

use url::Url;

use crate::notification::OutputFormat;

pub const DEFAULT_ORIGIN: &str = "http://127.0.0.1:8080";

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("FEED_ORIGIN is not a valid URL: {value}")]
    InvalidOrigin {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("FEED_ORIGIN cannot be used as a base URL: {0}")]
    NotABase(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Origin the event stream path resolves against.
    pub origin: Url,
    pub output: OutputFormat,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_origin = get("FEED_ORIGIN").unwrap_or_else(|| DEFAULT_ORIGIN.to_string());
        let origin = Url::parse(raw_origin.trim()).map_err(|source| ConfigError::InvalidOrigin {
            value: raw_origin.clone(),
            source,
        })?;
        if origin.cannot_be_a_base() {
            return Err(ConfigError::NotABase(raw_origin));
        }

        let output = match get("FEED_OUTPUT") {
            Some(v) => {
                let format = OutputFormat::from_str_setting(&v);
                if format == OutputFormat::Text && !v.trim().eq_ignore_ascii_case("text") {
                    tracing::warn!("Unknown FEED_OUTPUT {v:?}, falling back to text");
                }
                format
            }
            None => OutputFormat::Text,
        };

        Ok(Self { origin, output })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.origin.as_str(), "http://127.0.0.1:8080/");
        assert_eq!(config.output, OutputFormat::Text);
    }

    #[test]
    fn reads_overrides() {
        let config = load(&[
            ("FEED_ORIGIN", "https://feed.example.com:8443"),
            ("FEED_OUTPUT", "json"),
        ])
        .unwrap();
        assert_eq!(config.origin.host_str(), Some("feed.example.com"));
        assert_eq!(config.origin.port(), Some(8443));
        assert_eq!(config.output, OutputFormat::Json);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = load(&[("FEED_ORIGIN", "  "), ("FEED_OUTPUT", "")]).unwrap();
        assert_eq!(config.origin.as_str(), "http://127.0.0.1:8080/");
        assert_eq!(config.output, OutputFormat::Text);
    }

    #[test]
    fn unknown_output_falls_back_to_text() {
        let config = load(&[("FEED_OUTPUT", "xml")]).unwrap();
        assert_eq!(config.output, OutputFormat::Text);
    }

    #[test]
    fn invalid_origin_is_rejected() {
        let err = load(&[("FEED_ORIGIN", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOrigin { .. }));

        let err = load(&[("FEED_ORIGIN", "mailto:feed@example.com")]).unwrap_err();
        assert!(matches!(err, ConfigError::NotABase(_)));
    }

    #[test]
    fn unsupported_scheme_is_not_a_config_error() {
        let config = load(&[("FEED_ORIGIN", "ftp://files.example.com")]).unwrap();
        assert_eq!(config.origin.scheme(), "ftp");
    }
}
