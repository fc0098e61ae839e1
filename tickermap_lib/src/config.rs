//! Run configuration for the matcher.
//!
//! Loaded once from TOML at startup and validated before any ticker is
//! processed. Every field is optional in the file.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::vocabulary::{Vocabulary, VocabularyError};

pub const DEFAULT_AUTO_MATCH_THRESHOLD: f64 = 90.0;
pub const DEFAULT_MIN_PROMPT_CONFIDENCE: f64 = 70.0;
pub const DEFAULT_SHORT_SYMBOL_MAX_LEN: usize = 4;
pub const DEFAULT_GENERIC_MAX_TOKENS: usize = 2;
pub const DEFAULT_FUND_MAX_LENGTH_RATIO: f64 = 0.8;
pub const DEFAULT_LEADING_TOKEN_MIN_RATIO: f64 = 85.0;
pub const DEFAULT_GENERIC_OVERLAP_MIN_SCORE: f64 = 92.0;
pub const DEFAULT_REVIEW_CANDIDATES: usize = 5;
/// The reviewer is never shown more candidates than this.
pub const MAX_REVIEW_CANDIDATES: usize = 5;

/// Error types for configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Vocabulary(#[from] VocabularyError),
    #[error("{field} must be between 0 and 100, got {value}")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("min_prompt_confidence ({min}) must not exceed auto_match_threshold ({auto})")]
    ThresholdOrder { min: f64, auto: f64 },
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
    #[error("{field} must be at most {max}, got {value}")]
    TooLarge {
        field: &'static str,
        max: usize,
        value: usize,
    },
}

/// What to do with a short-symbol ticker whose name is generic-only.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GenericMatchAction {
    #[default]
    Skip,
    Review,
}

/// Immutable matcher configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MatcherConfig {
    pub auto_match_threshold: f64,
    pub min_prompt_confidence: f64,
    /// Leave tickers that already have a mapping untouched.
    pub resume: bool,
    /// Lower-cased symbol types excluded before matching.
    pub skip_symbol_types: BTreeSet<String>,
    /// Lower-cased acronym -> expansion.
    pub acronym_expansions: BTreeMap<String, String>,
    pub generic_match_action: GenericMatchAction,
    pub short_symbol_max_len: usize,
    pub generic_max_tokens: usize,
    /// A fund-named ticker is not auto-matched to a candidate whose token
    /// count is below this fraction of the ticker's.
    pub fund_max_length_ratio: f64,
    /// 0 disables the leading-token check.
    pub leading_token_min_ratio: f64,
    /// A fuzzy top candidate sharing at most one non-geographic token with
    /// the ticker is skipped unless it scores at least this. 0 disables.
    pub generic_overlap_min_score: f64,
    pub review_candidates: usize,
    pub vocabulary: Vocabulary,
}

/// On-disk shape of the config file.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    auto_match_threshold: Option<f64>,
    min_prompt_confidence: Option<f64>,
    resume: Option<bool>,
    skip_symbol_types: Option<Vec<String>>,
    #[serde(default)]
    acronym_expansions: BTreeMap<String, String>,
    generic_match_action: Option<GenericMatchAction>,
    short_symbol_max_len: Option<usize>,
    generic_max_tokens: Option<usize>,
    fund_max_length_ratio: Option<f64>,
    leading_token_min_ratio: Option<f64>,
    generic_overlap_min_score: Option<f64>,
    review_candidates: Option<usize>,
    /// Path to a vocabulary YAML file, relative to the config file.
    vocabulary_file: Option<PathBuf>,
    /// Inline vocabulary; takes precedence over `vocabulary_file`.
    vocabulary: Option<Vocabulary>,
}

impl MatcherConfig {
    /// Default thresholds with the given vocabulary.
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self {
            auto_match_threshold: DEFAULT_AUTO_MATCH_THRESHOLD,
            min_prompt_confidence: DEFAULT_MIN_PROMPT_CONFIDENCE,
            resume: true,
            skip_symbol_types: ["index", "idx"].iter().map(|s| s.to_string()).collect(),
            acronym_expansions: BTreeMap::new(),
            generic_match_action: GenericMatchAction::default(),
            short_symbol_max_len: DEFAULT_SHORT_SYMBOL_MAX_LEN,
            generic_max_tokens: DEFAULT_GENERIC_MAX_TOKENS,
            fund_max_length_ratio: DEFAULT_FUND_MAX_LENGTH_RATIO,
            leading_token_min_ratio: DEFAULT_LEADING_TOKEN_MIN_RATIO,
            generic_overlap_min_score: DEFAULT_GENERIC_OVERLAP_MIN_SCORE,
            review_candidates: DEFAULT_REVIEW_CANDIDATES,
            vocabulary,
        }
    }

    /// Defaults with the embedded vocabulary.
    pub fn load_default() -> Result<Self, ConfigError> {
        Ok(Self::new(Vocabulary::embedded()?))
    }

    /// Parse TOML content. `base_dir` resolves a relative `vocabulary_file`.
    pub fn from_toml_str(content: &str, base_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;

        let vocabulary = match (file.vocabulary, file.vocabulary_file) {
            (Some(inline), _) => {
                inline.compile()?;
                inline
            }
            (None, Some(path)) => {
                let path = match base_dir {
                    Some(dir) if path.is_relative() => dir.join(path),
                    _ => path,
                };
                Vocabulary::from_file(path)?
            }
            (None, None) => Vocabulary::embedded()?,
        };

        let mut config = Self::new(vocabulary);
        if let Some(v) = file.auto_match_threshold {
            config.auto_match_threshold = v;
        }
        if let Some(v) = file.min_prompt_confidence {
            config.min_prompt_confidence = v;
        }
        if let Some(v) = file.resume {
            config.resume = v;
        }
        if let Some(types) = file.skip_symbol_types {
            config.skip_symbol_types = types
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect();
        }
        config.acronym_expansions = file
            .acronym_expansions
            .into_iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v))
            .collect();
        if let Some(v) = file.generic_match_action {
            config.generic_match_action = v;
        }
        if let Some(v) = file.short_symbol_max_len {
            config.short_symbol_max_len = v;
        }
        if let Some(v) = file.generic_max_tokens {
            config.generic_max_tokens = v;
        }
        if let Some(v) = file.fund_max_length_ratio {
            config.fund_max_length_ratio = v;
        }
        if let Some(v) = file.leading_token_min_ratio {
            config.leading_token_min_ratio = v;
        }
        if let Some(v) = file.generic_overlap_min_score {
            config.generic_overlap_min_score = v;
        }
        if let Some(v) = file.review_candidates {
            config.review_candidates = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content, path.parent())
    }

    /// Add an acronym expansion (key is case-folded).
    pub fn with_acronym(mut self, acronym: &str, expansion: &str) -> Self {
        self.acronym_expansions
            .insert(acronym.trim().to_lowercase(), expansion.to_string());
        self
    }

    /// Check ranges and threshold ordering.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("auto_match_threshold", self.auto_match_threshold),
            ("min_prompt_confidence", self.min_prompt_confidence),
            ("leading_token_min_ratio", self.leading_token_min_ratio),
            ("generic_overlap_min_score", self.generic_overlap_min_score),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }
        if self.min_prompt_confidence > self.auto_match_threshold {
            return Err(ConfigError::ThresholdOrder {
                min: self.min_prompt_confidence,
                auto: self.auto_match_threshold,
            });
        }
        if self.review_candidates == 0 {
            return Err(ConfigError::NotPositive("review_candidates"));
        }
        if self.review_candidates > MAX_REVIEW_CANDIDATES {
            return Err(ConfigError::TooLarge {
                field: "review_candidates",
                max: MAX_REVIEW_CANDIDATES,
                value: self.review_candidates,
            });
        }
        if self.fund_max_length_ratio.is_nan() || self.fund_max_length_ratio <= 0.0 {
            return Err(ConfigError::NotPositive("fund_max_length_ratio"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MatcherConfig::load_default().unwrap();
        assert_eq!(config.auto_match_threshold, 90.0);
        assert_eq!(config.min_prompt_confidence, 70.0);
        assert!(config.resume);
        assert!(config.skip_symbol_types.contains("index"));
        assert_eq!(config.generic_match_action, GenericMatchAction::Skip);
        assert_eq!(config.review_candidates, 5);
        assert_eq!(config.generic_overlap_min_score, 92.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = MatcherConfig::from_toml_str("", None).unwrap();
        assert_eq!(config, MatcherConfig::load_default().unwrap());
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
auto_match_threshold = 95
min_prompt_confidence = 60.5
resume = false
skip_symbol_types = ["INDEX", "ETF"]
generic_match_action = "review"
review_candidates = 3

[acronym_expansions]
BOA = "Bank of America"
"#;
        let config = MatcherConfig::from_toml_str(toml, None).unwrap();
        assert_eq!(config.auto_match_threshold, 95.0);
        assert_eq!(config.min_prompt_confidence, 60.5);
        assert!(!config.resume);
        assert!(config.skip_symbol_types.contains("etf"));
        assert!(config.skip_symbol_types.contains("index"));
        assert_eq!(config.generic_match_action, GenericMatchAction::Review);
        assert_eq!(config.review_candidates, 3);
        assert_eq!(
            config.acronym_expansions.get("boa").map(String::as_str),
            Some("Bank of America")
        );
    }

    #[test]
    fn test_threshold_order_rejected() {
        let toml = "auto_match_threshold = 70\nmin_prompt_confidence = 80\n";
        let result = MatcherConfig::from_toml_str(toml, None);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ThresholdOrder { .. }
        ));
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let toml = "auto_match_threshold = 120\n";
        let result = MatcherConfig::from_toml_str(toml, None);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::OutOfRange { field: "auto_match_threshold", .. }
        ));
    }

    #[test]
    fn test_zero_review_candidates_rejected() {
        let result = MatcherConfig::from_toml_str("review_candidates = 0\n", None);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::NotPositive("review_candidates")
        ));
    }

    #[test]
    fn test_too_many_review_candidates_rejected() {
        let result = MatcherConfig::from_toml_str("review_candidates = 8\n", None);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::TooLarge { field: "review_candidates", max: 5, value: 8 }
        ));

        let mut config = MatcherConfig::load_default().unwrap();
        config.review_candidates = 6;
        assert!(config.validate().is_err());
        config.review_candidates = 5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generic_overlap_score_parsed_and_checked() {
        let config = MatcherConfig::from_toml_str("generic_overlap_min_score = 0\n", None).unwrap();
        assert_eq!(config.generic_overlap_min_score, 0.0);
        let result = MatcherConfig::from_toml_str("generic_overlap_min_score = 101\n", None);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::OutOfRange { field: "generic_overlap_min_score", .. }
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = MatcherConfig::from_toml_str("auto_threshold = 90\n", None);
        assert!(matches!(result.unwrap_err(), ConfigError::TomlParse(_)));
    }

    #[test]
    fn test_inline_vocabulary() {
        let toml = r#"
[vocabulary]
designators = ["inc"]
generic = ["global"]

[vocabulary.sector_groups]
metals = ["gold"]
"#;
        let config = MatcherConfig::from_toml_str(toml, None).unwrap();
        assert_eq!(config.vocabulary.designators, vec!["inc".to_string()]);
        assert!(config.vocabulary.sector_groups.contains_key("metals"));
        assert!(config.vocabulary.fund_indicators.is_empty());
    }

    #[test]
    fn test_vocabulary_file_relative_to_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("words.yml"), "designators: [corp]\n").unwrap();
        let config_path = dir.path().join("tickermap.toml");
        std::fs::write(&config_path, "vocabulary_file = \"words.yml\"\n").unwrap();

        let config = MatcherConfig::from_file(&config_path).unwrap();
        assert_eq!(config.vocabulary.designators, vec!["corp".to_string()]);
    }
}
