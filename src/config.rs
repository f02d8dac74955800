use serde::Deserialize;
use std::fs;
use std::path::Path;

static DEFAULT_CONFIG: &str = include_str!("default_config.toml");

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub parser: ParserConfig,
    pub suggestions: SuggestionConfig,
    pub links: LinksConfig,
    pub page: PageConfig,
    pub logging: LoggingConfig,
}

/// Limits applied by the step 5 comparison parser.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParserConfig {
    pub comparison_items: usize,
    pub min_short_highlights: usize,
    pub max_long_highlights: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            comparison_items: 3,
            min_short_highlights: 2,
            max_long_highlights: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SuggestionConfig {
    pub count: usize,
    pub max_words: usize,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            count: 3,
            max_words: 18,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LinksConfig {
    pub color: String,
    pub underline: bool,
    /// Caption of the call-to-action link under link steps and comparison cards.
    pub apply_label: String,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            color: "#1a4f8b".to_string(),
            underline: true,
            apply_label: "Apply Now".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct PageConfig {
    pub numbers: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    /// The configuration embedded at build time from `default_config.toml`.
    pub fn compiled_default() -> Self {
        toml::from_str(DEFAULT_CONFIG).unwrap_or_default()
    }

    /// Load config from a TOML file, or return defaults if not found.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content),
            Err(_) => Self::compiled_default(),
        }
    }

    /// Parse config from TOML text. Invalid input falls back to the defaults.
    pub fn from_toml(content: &str) -> Self {
        match toml::from_str(content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("ignoring invalid config: {}", e);
                Self::compiled_default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiled_default_matches_code_defaults() {
        assert_eq!(Config::compiled_default(), Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::from_toml("[parser]\nmax_long_highlights = 2\n");
        assert_eq!(config.parser.max_long_highlights, 2);
        assert_eq!(config.parser.comparison_items, 3);
        assert_eq!(config.links.apply_label, "Apply Now");
    }

    #[test]
    fn invalid_toml_falls_back() {
        let config = Config::from_toml("[parser\ncomparison_items = ");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn missing_file_falls_back() {
        let config = Config::load(Path::new("/nonexistent/cardsteps/config.toml"));
        assert_eq!(config, Config::default());
    }
}
