//! Configuration file parser for ~/.config/murmur/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, though we log a warning when the file
//! contains potential typos.
use crate::reconciler::TriggerMode;
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Environment variable that overrides `api_token`.
pub const TOKEN_ENV: &str = "MURMUR_TOKEN";

/// Largest page a list may request.
pub const MAX_PAGE_SIZE: usize = 100;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// Well-formed TOML with a value outside its allowed range.
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// The Debug impl masks `api_token`.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the social API, without the `/api` suffix.
    pub api_url: String,

    /// Opaque bearer token. `MURMUR_TOKEN` takes precedence.
    pub api_token: Option<String>,

    /// Items requested per page (1-100).
    pub page_size: usize,

    /// `"auto"` loads older items when focus nears the end of the list,
    /// `"button"` waits for the load-more key.
    pub load_trigger: TriggerMode,

    /// Subscribe to live arrivals where the API offers them.
    pub live_updates: bool,

    /// Custom keybinding overrides. Keys are action names, values are key strings.
    pub keybindings: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".to_string(),
            api_token: None,
            page_size: 10,
            load_trigger: TriggerMode::default(),
            live_updates: true,
            keybindings: HashMap::new(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("page_size", &self.page_size)
            .field("load_trigger", &self.load_trigger)
            .field("live_updates", &self.live_updates)
            .field("keybindings", &self.keybindings)
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 6] = [
        "api_url",
        "api_token",
        "page_size",
        "load_trigger",
        "live_updates",
        "keybindings",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Out-of-range values → `Err(ConfigError::Invalid)`
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check size before reading so a huge file can't exhaust memory.
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // File deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        let config = Self::parse(&content)?;
        tracing::info!(
            path = %path.display(),
            api_url = %config.api_url,
            page_size = config.page_size,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }
        let url = url::Url::parse(&self.api_url)
            .map_err(|e| ConfigError::Invalid(format!("api_url '{}': {}", self.api_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "api_url must be http or https, got '{}'",
                url.scheme()
            )));
        }
        Ok(())
    }

    /// Bearer token from the environment, falling back to the config file.
    /// Empty values count as unset.
    pub fn resolve_token(&self) -> Option<SecretString> {
        Self::pick_token(std::env::var(TOKEN_ENV).ok(), self.api_token.as_deref())
    }

    fn pick_token(env: Option<String>, file: Option<&str>) -> Option<SecretString> {
        env.filter(|t| !t.trim().is_empty())
            .or_else(|| file.filter(|t| !t.trim().is_empty()).map(str::to_owned))
            .map(SecretString::from)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_url, "http://localhost:3000");
        assert_eq!(config.page_size, 10);
        assert_eq!(config.load_trigger, TriggerMode::Sentinel);
        assert!(config.live_updates);
        assert!(config.keybindings.is_empty());
        assert!(config.api_token.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/murmur_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.page_size, 10);
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let dir = std::env::temp_dir().join("murmur_config_test_whitespace");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "   \n  \n  ").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api_url, "http://localhost:3000");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let config = Config::parse(
            r#"
api_url = "https://social.example.com"
api_token = "abc"
page_size = 25
load_trigger = "button"
live_updates = false

[keybindings]
quit = "Ctrl+q"
flush = "Space"
"#,
        )
        .unwrap();
        assert_eq!(config.api_url, "https://social.example.com");
        assert_eq!(config.api_token.as_deref(), Some("abc"));
        assert_eq!(config.page_size, 25);
        assert_eq!(config.load_trigger, TriggerMode::Button);
        assert!(!config.live_updates);
        assert_eq!(
            config.keybindings.get("flush").map(String::as_str),
            Some("Space")
        );
    }

    #[test]
    fn test_auto_trigger_alias() {
        let config = Config::parse("load_trigger = \"auto\"\n").unwrap();
        assert_eq!(config.load_trigger, TriggerMode::Sentinel);
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let config = Config::parse("page_size = 50\n").unwrap();
        assert_eq!(config.page_size, 50);
        assert!(config.live_updates);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let err = Config::parse("this is not [valid toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let config = Config::parse("page_size = 5\ntheme = \"dark\"\n").unwrap();
        assert_eq!(config.page_size, 5);
    }

    #[test]
    fn test_page_size_out_of_range() {
        for bad in ["page_size = 0", "page_size = 101"] {
            let err = Config::parse(bad).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{}", bad);
        }
    }

    #[test]
    fn test_bad_api_url() {
        assert!(matches!(
            Config::parse("api_url = \"not a url\"").unwrap_err(),
            ConfigError::Invalid(_)
        ));
        assert!(matches!(
            Config::parse("api_url = \"ftp://example.com\"").unwrap_err(),
            ConfigError::Invalid(_)
        ));
    }

    #[test]
    fn test_unknown_trigger_is_parse_error() {
        assert!(matches!(
            Config::parse("load_trigger = \"scroll\"").unwrap_err(),
            ConfigError::Parse(_)
        ));
    }

    #[test]
    fn test_too_large_file_rejected() {
        let dir = std::env::temp_dir().join("murmur_config_test_too_large");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "a".repeat(1_048_577)).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_env_token_wins_over_file() {
        let token = Config::pick_token(Some("from-env".into()), Some("from-file")).unwrap();
        assert_eq!(token.expose_secret(), "from-env");

        let token = Config::pick_token(Some("  ".into()), Some("from-file")).unwrap();
        assert_eq!(token.expose_secret(), "from-file");

        assert!(Config::pick_token(None, Some("")).is_none());
    }

    #[test]
    fn test_debug_masks_api_token() {
        let config = Config {
            api_token: Some("super-secret-token-12345".to_string()),
            ..Config::default()
        };
        let debug_output = format!("{:?}", config);
        assert!(!debug_output.contains("super-secret-token-12345"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
