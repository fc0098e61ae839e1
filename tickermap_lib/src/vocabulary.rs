//! Word lists driving normalization and lexical classification.
//!
//! The default vocabulary is embedded at compile time from
//! `seed_data/vocabulary.yml`. Config files may replace it wholesale.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;

/// Error types for vocabulary loading.
#[derive(Error, Debug)]
pub enum VocabularyError {
    #[error("Failed to parse vocabulary YAML: {0}")]
    YamlParse(#[from] serde_yml::Error),
    #[error("Failed to read vocabulary file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Word '{word}' appears in both sector groups '{first}' and '{second}'")]
    DuplicateSectorWord {
        word: String,
        first: String,
        second: String,
    },
    #[error("Empty word in vocabulary list '{0}'")]
    EmptyWord(&'static str),
}

/// Raw vocabulary as written in YAML.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Vocabulary {
    #[serde(default)]
    pub designators: Vec<String>,
    #[serde(default)]
    pub token_rewrites: BTreeMap<String, String>,
    #[serde(default)]
    pub sector_groups: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub fund_indicators: Vec<String>,
    #[serde(default)]
    pub generic: Vec<String>,
    /// Geographic/generic words that do not make two names the same company.
    #[serde(default)]
    pub geo_generic: Vec<String>,
}

/// Vocabulary compiled into lookup sets. Every word is lower-cased.
#[derive(Debug, Clone)]
pub struct Lexicon {
    designators: HashSet<String>,
    token_rewrites: HashMap<String, String>,
    sector_group_of: HashMap<String, String>,
    fund_indicators: HashSet<String>,
    generic: HashSet<String>,
    geo_generic: HashSet<String>,
}

impl Vocabulary {
    /// Parse a vocabulary from YAML content.
    pub fn from_yaml_str(yaml_content: &str) -> Result<Self, VocabularyError> {
        let vocabulary: Vocabulary = serde_yml::from_str(yaml_content)?;
        vocabulary.compile()?;
        Ok(vocabulary)
    }

    /// Read and parse a vocabulary YAML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, VocabularyError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load the vocabulary embedded at compile time.
    pub fn embedded() -> Result<Self, VocabularyError> {
        let yaml_content = include_str!("../../seed_data/vocabulary.yml");
        Self::from_yaml_str(yaml_content)
    }

    /// Build lookup sets, rejecting empty words and words claimed by two sector groups.
    pub fn compile(&self) -> Result<Lexicon, VocabularyError> {
        let designators = lowercase_set(&self.designators, "designators")?;
        let fund_indicators = lowercase_set(&self.fund_indicators, "fund_indicators")?;
        let generic = lowercase_set(&self.generic, "generic")?;
        let geo_generic = lowercase_set(&self.geo_generic, "geo_generic")?;

        let mut token_rewrites = HashMap::new();
        for (from, to) in &self.token_rewrites {
            let from = from.trim().to_lowercase();
            if from.is_empty() {
                return Err(VocabularyError::EmptyWord("token_rewrites"));
            }
            token_rewrites.insert(from, to.trim().to_lowercase());
        }

        let mut sector_group_of: HashMap<String, String> = HashMap::new();
        for (group, words) in &self.sector_groups {
            for word in words {
                let word = word.trim().to_lowercase();
                if word.is_empty() {
                    return Err(VocabularyError::EmptyWord("sector_groups"));
                }
                if let Some(first) = sector_group_of.get(&word) {
                    if first != group {
                        return Err(VocabularyError::DuplicateSectorWord {
                            word,
                            first: first.clone(),
                            second: group.clone(),
                        });
                    }
                    continue;
                }
                sector_group_of.insert(word, group.clone());
            }
        }

        Ok(Lexicon {
            designators,
            token_rewrites,
            sector_group_of,
            fund_indicators,
            generic,
            geo_generic,
        })
    }
}

fn lowercase_set(words: &[String], list: &'static str) -> Result<HashSet<String>, VocabularyError> {
    let mut set = HashSet::with_capacity(words.len());
    for word in words {
        let word = word.trim().to_lowercase();
        if word.is_empty() {
            return Err(VocabularyError::EmptyWord(list));
        }
        set.insert(word);
    }
    Ok(set)
}

impl Lexicon {
    pub fn is_designator(&self, token: &str) -> bool {
        self.designators.contains(token)
    }

    pub fn rewrite<'a>(&'a self, token: &'a str) -> &'a str {
        self.token_rewrites
            .get(token)
            .map(String::as_str)
            .unwrap_or(token)
    }

    /// Sector group a token belongs to, if any.
    pub fn sector_group(&self, token: &str) -> Option<&str> {
        self.sector_group_of.get(token).map(String::as_str)
    }

    pub fn is_fund_indicator(&self, token: &str) -> bool {
        self.fund_indicators.contains(token)
    }

    pub fn is_generic(&self, token: &str) -> bool {
        self.generic.contains(token)
    }

    pub fn is_geo_generic(&self, token: &str) -> bool {
        self.geo_generic.contains(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_vocabulary_loads() {
        let vocabulary = Vocabulary::embedded().unwrap();
        assert!(vocabulary.designators.iter().any(|d| d == "inc"));
        assert!(vocabulary.sector_groups.contains_key("extractive"));
        assert!(vocabulary.fund_indicators.iter().any(|f| f == "trust"));
    }

    #[test]
    fn test_embedded_lexicon_lookups() {
        let lexicon = Vocabulary::embedded().unwrap().compile().unwrap();
        assert!(lexicon.is_designator("corporation"));
        assert!(!lexicon.is_designator("bank"));
        assert_eq!(lexicon.sector_group("gold"), Some("extractive"));
        assert_eq!(lexicon.sector_group("paper"), Some("paper"));
        assert_eq!(lexicon.sector_group("apple"), None);
        assert_eq!(lexicon.rewrite("bancorporation"), "bancorp");
        assert_eq!(lexicon.rewrite("zions"), "zions");
        assert!(lexicon.is_fund_indicator("income"));
        assert!(lexicon.is_generic("global"));
        assert!(lexicon.is_geo_generic("western"));
        assert!(!lexicon.is_geo_generic("acme"));
    }

    #[test]
    fn test_words_are_lowercased() {
        let yaml = r#"
designators: [INC, " Corp "]
sector_groups:
  metals: [Gold]
"#;
        let lexicon = Vocabulary::from_yaml_str(yaml).unwrap().compile().unwrap();
        assert!(lexicon.is_designator("inc"));
        assert!(lexicon.is_designator("corp"));
        assert_eq!(lexicon.sector_group("gold"), Some("metals"));
    }

    #[test]
    fn test_duplicate_sector_word_rejected() {
        let yaml = r#"
sector_groups:
  extractive: [gold, oil]
  energy: [oil]
"#;
        let result = Vocabulary::from_yaml_str(yaml);
        assert!(matches!(
            result.unwrap_err(),
            VocabularyError::DuplicateSectorWord { .. }
        ));
    }

    #[test]
    fn test_empty_word_rejected() {
        let yaml = r#"
generic: [global, "  "]
"#;
        let result = Vocabulary::from_yaml_str(yaml);
        assert!(matches!(result.unwrap_err(), VocabularyError::EmptyWord("generic")));
    }

    #[test]
    fn test_missing_lists_default_empty() {
        let vocabulary = Vocabulary::from_yaml_str("designators: [inc]\n").unwrap();
        assert!(vocabulary.sector_groups.is_empty());
        assert!(vocabulary.generic.is_empty());
        assert!(vocabulary.geo_generic.is_empty());
    }
}
