//! Lexical classification of core names.

use std::collections::BTreeSet;

use crate::vocabulary::Lexicon;

/// A core name with the semantic signals derived from its tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedName {
    pub core: String,
    /// Core tokens found in the sector vocabulary.
    pub sector_tokens: BTreeSet<String>,
    /// Sector groups those tokens belong to.
    pub sector_groups: BTreeSet<String>,
    /// The name reads like a financial product (trust, income, fund, ...).
    pub fund_indicators: bool,
    /// Apart from sector words, the name is only generic words.
    pub generic_only: bool,
}

impl NormalizedName {
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.core.split_whitespace()
    }

    pub fn token_count(&self) -> usize {
        self.tokens().count()
    }

    pub fn leading_token(&self) -> &str {
        self.tokens().next().unwrap_or_default()
    }

    /// Both names carry sector words and share no sector group.
    pub fn sector_conflict(&self, other: &NormalizedName) -> bool {
        !self.sector_groups.is_empty()
            && !other.sector_groups.is_empty()
            && self.sector_groups.is_disjoint(&other.sector_groups)
    }

    /// Number of distinct core tokens both names share, not counting
    /// geographic/generic words like `american` or `western`.
    pub fn substantive_overlap(&self, other: &NormalizedName, lexicon: &Lexicon) -> usize {
        let mine: BTreeSet<&str> = self.tokens().collect();
        let theirs: BTreeSet<&str> = other.tokens().collect();
        mine.intersection(&theirs)
            .filter(|t| !lexicon.is_geo_generic(t))
            .count()
    }
}

/// Derive sector, fund and generic signals from a core name.
///
/// `generic_max_tokens` bounds how many non-sector tokens a generic-only
/// name may have.
pub fn classify(core: &str, lexicon: &Lexicon, generic_max_tokens: usize) -> NormalizedName {
    let mut sector_tokens = BTreeSet::new();
    let mut sector_groups = BTreeSet::new();
    let mut fund_indicators = false;
    let mut remaining = Vec::new();

    for token in core.split_whitespace() {
        if lexicon.is_fund_indicator(token) {
            fund_indicators = true;
        }
        match lexicon.sector_group(token) {
            Some(group) => {
                sector_tokens.insert(token.to_string());
                sector_groups.insert(group.to_string());
            }
            None => remaining.push(token),
        }
    }

    let generic_only = remaining.len() <= generic_max_tokens
        && remaining.iter().all(|t| lexicon.is_generic(t));

    NormalizedName {
        core: core.to_string(),
        sector_tokens,
        sector_groups,
        fund_indicators,
        generic_only,
    }
}

/// [`classify`], with fund indicators also looked for among the tokens
/// normalization removed (`plc` is a designator as well as a fund marker).
pub fn classify_with_tokens(
    core: &str,
    name_tokens: &[String],
    lexicon: &Lexicon,
    generic_max_tokens: usize,
) -> NormalizedName {
    let mut name = classify(core, lexicon, generic_max_tokens);
    if !name.fund_indicators {
        name.fund_indicators = name_tokens.iter().any(|t| lexicon.is_fund_indicator(t));
    }
    name
}
