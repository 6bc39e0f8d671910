//! Typed configuration loaded from a YAML file.
//!
//! The file is parsed once at startup and validated before any request is
//! issued. Unknown keys are ignored.
//!
//! ```yaml
//! api_key: sk-admin-...
//! base_url: https://api.openai.com/v1   # optional
//! days_back: 7                          # optional
//! project_ids: [proj_abc]               # optional cost filter
//! generator:                            # optional, companion tool only
//!   profile: minimal
//!   requests: 3
//!   delay_ms: 1000
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::date_range::DateRange;
use crate::error::{MetricsError, MetricsResult};

/// Base URL used when the config file does not set one.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Lookback window used when the config file does not set one.
pub const DEFAULT_DAYS_BACK: i64 = 7;

/// Value shipped in the sample config; never a real key.
const PLACEHOLDER_API_KEY: &str = "your-openai-api-key-here";

/// API key wrapper that never prints its contents.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    /// Wrap a secret value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the raw secret, e.g. to build an `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl std::fmt::Display for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// How much traffic the usage generator produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorProfile {
    /// Account check plus a handful of tiny requests.
    #[default]
    Minimal,
    /// Chat completions across several models, embeddings and moderations.
    Standard,
}

impl std::fmt::Display for GeneratorProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Minimal => write!(f, "minimal"),
            Self::Standard => write!(f, "standard"),
        }
    }
}

impl std::str::FromStr for GeneratorProfile {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "minimal" => Ok(Self::Minimal),
            "standard" => Ok(Self::Standard),
            other => Err(MetricsError::Config(format!(
                "unknown generator profile '{other}' (expected minimal or standard)"
            ))),
        }
    }
}

/// Settings for the usage generator companion tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Plan profile.
    pub profile: GeneratorProfile,
    /// Override for the number of chat completion requests.
    pub requests: Option<u32>,
    /// Pause between generated calls, in milliseconds.
    pub delay_ms: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            profile: GeneratorProfile::default(),
            requests: None,
            delay_ms: 1000,
        }
    }
}

/// Raw file shape; every field optional so missing keys can be reported.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    base_url: Option<String>,
    api_key: Option<String>,
    days_back: Option<i64>,
    #[serde(default)]
    project_ids: Vec<String>,
    #[serde(default)]
    generator: GeneratorConfig,
}

/// Validated, immutable run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API root, without trailing slash (e.g. `https://api.openai.com/v1`).
    pub base_url: String,
    /// Bearer credential.
    pub api_key: SecretString,
    /// Lookback window in days.
    pub days_back: i64,
    /// Restrict cost queries to these projects.
    pub project_ids: Vec<String>,
    /// Companion tool settings.
    pub generator: GeneratorConfig,
}

impl Config {
    /// Build a config from explicit values, applying validation.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Config`] if the key or URL is missing or
    /// malformed, or [`MetricsError::Validation`] for a negative window.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        days_back: i64,
    ) -> MetricsResult<Self> {
        Self {
            base_url: base_url.into(),
            api_key: SecretString::new(api_key),
            days_back,
            project_ids: Vec::new(),
            generator: GeneratorConfig::default(),
        }
        .validated()
    }

    /// Load and validate a YAML config file.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Io`] if the file cannot be read, and
    /// [`MetricsError::Config`] if it cannot be parsed or fails validation.
    pub fn from_file(path: impl AsRef<Path>) -> MetricsResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| MetricsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate YAML config text.
    ///
    /// # Errors
    ///
    /// See [`Config::from_file`].
    pub fn from_yaml(contents: &str) -> MetricsResult<Self> {
        // An empty document deserializes to unit, not a map.
        let raw: RawConfig = if contents.trim().is_empty() {
            RawConfig::default()
        } else {
            serde_yaml::from_str(contents)
                .map_err(|e| MetricsError::Config(format!("Failed to parse config: {e}")))?
        };

        let api_key = raw
            .api_key
            .ok_or_else(|| MetricsError::Config("api_key is required".to_string()))?;

        Self {
            base_url: raw.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: SecretString::new(api_key),
            days_back: raw.days_back.unwrap_or(DEFAULT_DAYS_BACK),
            project_ids: raw.project_ids,
            generator: raw.generator,
        }
        .validated()
    }

    /// Lookback window ending today (UTC).
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Validation`] for an unusable window.
    pub fn date_range(&self) -> MetricsResult<DateRange> {
        DateRange::from_days_back(self.days_back)
    }

    fn validated(mut self) -> MetricsResult<Self> {
        let key = self.api_key.expose().trim();
        if key.is_empty() {
            return Err(MetricsError::Config("api_key must not be empty".to_string()));
        }
        if key == PLACEHOLDER_API_KEY {
            return Err(MetricsError::Config(
                "api_key is still the placeholder value; set a real key".to_string(),
            ));
        }
        self.api_key = SecretString::new(key);

        let base_url = self.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(MetricsError::Config("base_url must not be empty".to_string()));
        }
        let parsed = Url::parse(&base_url)
            .map_err(|e| MetricsError::Config(format!("base_url '{base_url}' is invalid: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(MetricsError::Config(format!(
                "base_url '{base_url}' must use http or https"
            )));
        }
        self.base_url = base_url;

        if self.days_back < 0 {
            return Err(MetricsError::Validation(format!(
                "days_back must be >= 0, got {}",
                self.days_back
            )));
        }

        if self.generator.requests == Some(0) {
            return Err(MetricsError::Config(
                "generator.requests must be at least 1".to_string(),
            ));
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_yaml("api_key: sk-admin-test\n").unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.days_back, DEFAULT_DAYS_BACK);
        assert!(config.project_ids.is_empty());
        assert_eq!(config.generator, GeneratorConfig::default());
    }

    #[test]
    fn test_full_config() {
        let yaml = r"
api_key: sk-admin-test
base_url: https://proxy.example.com/v1/
days_back: 30
project_ids: [proj_a, proj_b]
generator:
  profile: standard
  requests: 4
  delay_ms: 0
";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.base_url, "https://proxy.example.com/v1");
        assert_eq!(config.days_back, 30);
        assert_eq!(config.project_ids, vec!["proj_a", "proj_b"]);
        assert_eq!(config.generator.profile, GeneratorProfile::Standard);
        assert_eq!(config.generator.requests, Some(4));
        assert_eq!(config.generator.delay_ms, 0);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let yaml = "api_key: sk-test\norganization: org-123\nextra:\n  nested: true\n";
        assert!(Config::from_yaml(yaml).is_ok());
    }

    #[test]
    fn test_missing_api_key() {
        let err = Config::from_yaml("days_back: 3\n").unwrap_err();
        assert!(matches!(err, MetricsError::Config(_)));
    }

    #[test]
    fn test_empty_document_is_missing_api_key() {
        let err = Config::from_yaml("").unwrap_err();
        assert!(matches!(err, MetricsError::Config(_)));
    }

    #[test]
    fn test_blank_api_key() {
        let err = Config::from_yaml("api_key: '   '\n").unwrap_err();
        assert!(matches!(err, MetricsError::Config(_)));
    }

    #[test]
    fn test_placeholder_api_key() {
        let err = Config::from_yaml("api_key: your-openai-api-key-here\n").unwrap_err();
        assert!(matches!(err, MetricsError::Config(_)));
    }

    #[test]
    fn test_blank_base_url() {
        let err = Config::from_yaml("api_key: sk-test\nbase_url: ''\n").unwrap_err();
        assert!(matches!(err, MetricsError::Config(_)));
    }

    #[test]
    fn test_non_http_base_url() {
        let err = Config::from_yaml("api_key: sk-test\nbase_url: ftp://example.com\n").unwrap_err();
        assert!(matches!(err, MetricsError::Config(_)));
    }

    #[test]
    fn test_negative_days_back() {
        let err = Config::from_yaml("api_key: sk-test\ndays_back: -2\n").unwrap_err();
        assert!(matches!(err, MetricsError::Validation(_)));
    }

    #[test]
    fn test_zero_generator_requests() {
        let yaml = "api_key: sk-test\ngenerator:\n  requests: 0\n";
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, MetricsError::Config(_)));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = Config::from_yaml("api_key: [unterminated\n").unwrap_err();
        assert!(matches!(err, MetricsError::Config(_)));
    }

    #[test]
    fn test_api_key_is_redacted() {
        let config = Config::new(DEFAULT_BASE_URL, "sk-admin-secret", 7).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-admin-secret"));
        assert!(debug.contains("[REDACTED]"));
        assert_eq!(config.api_key.expose(), "sk-admin-secret");
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "api_key: sk-test\ndays_back: 1\n").unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.days_back, 1);
    }

    #[test]
    fn test_from_missing_file() {
        let err = Config::from_file("/nonexistent/config.yaml").unwrap_err();
        assert!(matches!(err, MetricsError::Io { .. }));
        assert!(err.is_config_error());
    }

    #[test]
    fn test_profile_from_str() {
        assert_eq!(
            "Standard".parse::<GeneratorProfile>().unwrap(),
            GeneratorProfile::Standard
        );
        assert!("huge".parse::<GeneratorProfile>().is_err());
    }
}
