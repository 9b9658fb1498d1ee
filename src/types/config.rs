//! Configuration for gchat-mcp.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::{GchatError, GchatResult};

/// Main configuration for gchat-mcp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Google Chat API settings.
    #[serde(default)]
    pub chat: ChatConfig,

    /// OAuth credential and token settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Message search settings.
    #[serde(default)]
    pub search: SearchConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Timeout for each HTTP call (in seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Google Chat API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// REST endpoint base, including the version segment.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Page size used by list tools when the caller does not set one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Page size used when fetching messages to search.
    #[serde(default = "default_search_page_size")]
    pub search_page_size: u32,

    /// Maximum number of pages fetched by a single search.
    #[serde(default = "default_max_search_pages")]
    pub max_search_pages: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            default_page_size: default_page_size(),
            search_page_size: default_search_page_size(),
            max_search_pages: default_max_search_pages(),
        }
    }
}

fn default_base_url() -> String {
    "https://chat.googleapis.com/v1".to_string()
}

fn default_page_size() -> u32 {
    25
}

fn default_search_page_size() -> u32 {
    100
}

fn default_max_search_pages() -> u32 {
    5
}

/// OAuth credential and token settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// OAuth client descriptor downloaded from the Google Cloud console.
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,

    /// Where the access/refresh token is persisted.
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,

    /// Scopes requested during authorization.
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
            token_path: default_token_path(),
            scopes: default_scopes(),
        }
    }
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("credentials.json")
}

fn default_token_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gchat-mcp")
        .join("token.json")
}

fn default_scopes() -> Vec<String> {
    [
        "https://www.googleapis.com/auth/chat.spaces",
        "https://www.googleapis.com/auth/chat.messages",
        "https://www.googleapis.com/auth/chat.memberships.readonly",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Message search settings.
///
/// Loaded once at start and handed to [`crate::search::SearchEngine`];
/// nothing reads it from global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Mode used when the caller does not pick one (exact, regex, hybrid).
    #[serde(default = "default_search_mode")]
    pub default_mode: String,

    /// Per-mode settings.
    #[serde(default)]
    pub modes: SearchModesConfig,

    /// Contraction table: contracted form -> equivalent forms.
    #[serde(default = "default_contractions")]
    pub contractions: BTreeMap<String, Vec<String>>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_mode: default_search_mode(),
            modes: SearchModesConfig::default(),
            contractions: default_contractions(),
        }
    }
}

fn default_search_mode() -> String {
    "exact".to_string()
}

/// Per-mode search settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchModesConfig {
    #[serde(default)]
    pub exact: ExactModeConfig,

    #[serde(default)]
    pub regex: RegexModeConfig,

    #[serde(default)]
    pub hybrid: HybridModeConfig,
}

/// Exact (substring) mode settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExactModeConfig {
    /// Enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Score contributed to a hybrid match.
    #[serde(default = "default_exact_weight")]
    pub weight: f64,
}

impl Default for ExactModeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            weight: default_exact_weight(),
        }
    }
}

fn default_exact_weight() -> f64 {
    1.0
}

/// Regex mode settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegexModeConfig {
    /// Enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Score contributed to a hybrid match.
    #[serde(default = "default_regex_weight")]
    pub weight: f64,

    /// Case-insensitive matching.
    #[serde(default = "default_true")]
    pub ignore_case: bool,

    /// Let `.` match newlines.
    #[serde(default)]
    pub dot_all: bool,

    /// Longer patterns are rejected.
    #[serde(default = "default_max_pattern_length")]
    pub max_pattern_length: usize,
}

impl Default for RegexModeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            weight: default_regex_weight(),
            ignore_case: true,
            dot_all: false,
            max_pattern_length: default_max_pattern_length(),
        }
    }
}

fn default_regex_weight() -> f64 {
    1.2
}

fn default_max_pattern_length() -> usize {
    1000
}

/// Hybrid mode settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridModeConfig {
    /// Enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for HybridModeConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

/// Contractions shipped by default. Past and present tense variants are
/// treated as equivalent so "don't" also finds "didn't".
pub fn default_contractions() -> BTreeMap<String, Vec<String>> {
    let table: &[(&str, &[&str])] = &[
        ("don't", &["didn't", "do not", "did not"]),
        ("didn't", &["don't", "did not", "do not"]),
        ("isn't", &["wasn't", "is not", "was not"]),
        ("wasn't", &["isn't", "was not", "is not"]),
        ("can't", &["couldn't", "cannot", "could not"]),
        ("couldn't", &["can't", "could not", "cannot"]),
        ("won't", &["wouldn't", "will not", "would not"]),
        ("wouldn't", &["won't", "would not", "will not"]),
        ("aren't", &["weren't", "are not", "were not"]),
        ("weren't", &["aren't", "were not", "are not"]),
        ("haven't", &["hadn't", "have not", "had not"]),
        ("hadn't", &["haven't", "had not", "have not"]),
    ];

    table
        .iter()
        .map(|(contraction, variants)| {
            (
                contraction.to_string(),
                variants.iter().map(|v| v.to_string()).collect(),
            )
        })
        .collect()
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> GchatResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> GchatResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Creates default configuration.
    pub fn default_config() -> Self {
        Self {
            general: GeneralConfig::default(),
            chat: ChatConfig::default(),
            auth: AuthConfig::default(),
            search: SearchConfig::default(),
        }
    }

    /// Tries to load configuration from current directory or uses default.
    pub fn load_or_default() -> Self {
        Self::load("gchat.toml").unwrap_or_else(|_| Self::default_config())
    }

    /// Checks values serde cannot constrain.
    pub fn validate(&self) -> GchatResult<()> {
        let modes = &self.search.modes;

        for (name, weight) in [("exact", modes.exact.weight), ("regex", modes.regex.weight)] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(GchatError::config(format!(
                    "search.modes.{name}.weight must be a non-negative number, got {weight}"
                )));
            }
        }

        if !modes.exact.enabled && !modes.regex.enabled {
            return Err(GchatError::config(
                "at least one of search.modes.exact or search.modes.regex must be enabled",
            ));
        }

        for (name, size) in [
            ("chat.default_page_size", self.chat.default_page_size),
            ("chat.search_page_size", self.chat.search_page_size),
        ] {
            if !(1..=1000).contains(&size) {
                return Err(GchatError::config(format!(
                    "{name} must be between 1 and 1000, got {size}"
                )));
            }
        }

        if self.chat.max_search_pages == 0 {
            return Err(GchatError::config("chat.max_search_pages must be at least 1"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
