//! Decision Engine.
//!
//! Given a ticker record and the current Mapping Store, decides whether to
//! accept a catalog candidate automatically, reject the plausible
//! candidates as known false-positive patterns, or defer to a human.
//!
//! Rules run in a fixed order per ticker:
//!
//! 1. Symbol-type pre-filter
//! 2. Resume check (ticker already mapped)
//! 3. Rank candidates: exact core matches first, then by score, ties by
//!    catalog order
//! 4. Within the top `review_candidates` of the ranking, exclude
//!    self-matches, sector conflicts, fund-vs-company pairs and candidates
//!    misaligned on the leading token. The first survivor is the top
//!    candidate.
//! 5. Exact survivor: accept unless the one-to-many safeguard blocks it
//! 6. Weak overlap: a fuzzy match sharing at most one non-geographic token
//!    needs `generic_overlap_min_score`
//! 7. Generic-name suspicion for short symbols
//! 8. One-to-many safeguard
//! 9. Threshold bands
//!
//! `Matcher` is immutable; concurrent `decide` calls are only safe if the
//! caller serializes access to the store between decisions and writes.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::catalog::{validate_catalog, CatalogEntry, CatalogError};
use crate::classify::{classify_with_tokens, NormalizedName};
use crate::config::{ConfigError, GenericMatchAction, MatcherConfig};
use crate::db::DbError;
use crate::normalize::normalize_with_tokens;
use crate::score::{score, token_ratio};
use crate::store::{MappingStore, MatchType};
use crate::ticker_source::TickerRecord;
use crate::vocabulary::{Lexicon, VocabularyError};

/// Errors that prevent a matcher from being built.
#[derive(Error, Debug)]
pub enum MatchError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Vocabulary(#[from] VocabularyError),
}

/// Outcome classification for one ticker.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    SkippedType,
    InvalidRecord,
    AlreadyMapped,
    ExactMatch,
    AutoFuzzyMatch,
    RejectedSectorConflict,
    RejectedFundVsCompany,
    RejectedLeadingToken,
    RejectedSelfMatch,
    SkippedGenericOverlap,
    SuspiciousGenericMatch,
    OneToManyBlocked,
    ManualReview,
    Manual,
    SkippedByUser,
    SkippedLowConfidence,
    SkippedNoCandidates,
    SkippedError,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SkippedType => "skipped_type",
            Self::InvalidRecord => "invalid_record",
            Self::AlreadyMapped => "already_mapped",
            Self::ExactMatch => "exact_match",
            Self::AutoFuzzyMatch => "auto_fuzzy_match",
            Self::RejectedSectorConflict => "rejected_sector_conflict",
            Self::RejectedFundVsCompany => "rejected_fund_vs_company",
            Self::RejectedLeadingToken => "rejected_leading_token",
            Self::RejectedSelfMatch => "rejected_self_match",
            Self::SkippedGenericOverlap => "skipped_generic_overlap",
            Self::SuspiciousGenericMatch => "suspicious_generic_match",
            Self::OneToManyBlocked => "one_to_many_blocked",
            Self::ManualReview => "manual_review",
            Self::Manual => "manual",
            Self::SkippedByUser => "skipped_by_user",
            Self::SkippedLowConfidence => "skipped_low_confidence",
            Self::SkippedNoCandidates => "skipped_no_candidates",
            Self::SkippedError => "skipped_error",
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::RejectedSectorConflict
                | Self::RejectedFundVsCompany
                | Self::RejectedLeadingToken
                | Self::RejectedSelfMatch
        )
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog entry scored against one ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    pub entry: CatalogEntry,
    pub score: f64,
}

/// A candidate excluded from the auto-accept path.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub verdict: Verdict,
    pub candidate: CandidateScore,
    pub reason: String,
}

/// What the caller should do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Accept {
        candidate: CandidateScore,
        match_type: MatchType,
    },
    /// Ask a human to pick from these ranked candidates or skip.
    Review(Vec<CandidateScore>),
    Skip,
}

/// Result of evaluating one ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub verdict: Verdict,
    pub action: Action,
    pub rationale: String,
    /// Normalized ticker name (empty when matching never started).
    pub core: String,
    /// Top of the raw ranking, for the audit trail.
    pub considered: Vec<CandidateScore>,
    pub rejections: Vec<Rejection>,
}

impl Decision {
    pub(crate) fn halt(verdict: Verdict, rationale: impl Into<String>) -> Self {
        Self {
            verdict,
            action: Action::Skip,
            rationale: rationale.into(),
            core: String::new(),
            considered: Vec::new(),
            rejections: Vec::new(),
        }
    }
}

struct PreparedEntry {
    entry: CatalogEntry,
    name: NormalizedName,
}

struct Ranked<'a> {
    prepared: &'a PreparedEntry,
    score: f64,
    exact: bool,
}

impl Ranked<'_> {
    fn candidate(&self) -> CandidateScore {
        CandidateScore {
            entry: self.prepared.entry.clone(),
            score: self.score,
        }
    }
}

/// The matching engine over one catalog snapshot.
pub struct Matcher {
    config: MatcherConfig,
    lexicon: Lexicon,
    catalog: Vec<PreparedEntry>,
    by_id: HashMap<String, usize>,
}

impl Matcher {
    /// Validate config and catalog, then normalize and classify every
    /// catalog name once.
    pub fn new(config: MatcherConfig, catalog: Vec<CatalogEntry>) -> Result<Self, MatchError> {
        config.validate()?;
        validate_catalog(&catalog)?;
        let lexicon = config.vocabulary.compile()?;

        let catalog: Vec<PreparedEntry> = catalog
            .into_iter()
            .map(|entry| {
                let (core, tokens) =
                    normalize_with_tokens(&entry.name, &config.acronym_expansions, &lexicon);
                let name = classify_with_tokens(&core, &tokens, &lexicon, config.generic_max_tokens);
                PreparedEntry { entry, name }
            })
            .collect();
        let by_id = catalog
            .iter()
            .enumerate()
            .map(|(i, p)| (p.entry.id.clone(), i))
            .collect();

        tracing::debug!(entries = catalog.len(), "catalog prepared");
        Ok(Self {
            config,
            lexicon,
            catalog,
            by_id,
        })
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn catalog_len(&self) -> usize {
        self.catalog.len()
    }

    pub fn entry(&self, id: &str) -> Option<&CatalogEntry> {
        self.by_id.get(id).map(|&i| &self.catalog[i].entry)
    }

    /// Normalize and classify a raw name with this matcher's configuration.
    pub fn normalize_name(&self, raw: &str) -> NormalizedName {
        let (core, tokens) = normalize_with_tokens(raw, &self.config.acronym_expansions, &self.lexicon);
        classify_with_tokens(&core, &tokens, &self.lexicon, self.config.generic_max_tokens)
    }

    /// Score a catalog entry against an already-normalized core.
    pub fn score_entry(&self, core: &str, id: &str) -> Option<f64> {
        self.by_id
            .get(id)
            .map(|&i| score(core, &self.catalog[i].name.core))
    }

    /// Decide what to do with one ticker.
    ///
    /// Only store reads can fail; the rules themselves are total.
    pub fn decide<S>(&self, ticker: &TickerRecord, store: &S) -> Result<Decision, DbError>
    where
        S: MappingStore + ?Sized,
    {
        if let Some(kind) = ticker.symbol_type.as_deref() {
            let kind = kind.trim().to_lowercase();
            if self.config.skip_symbol_types.contains(&kind) {
                return Ok(Decision::halt(
                    Verdict::SkippedType,
                    format!("symbol type '{}' is excluded", kind),
                ));
            }
        }

        if ticker.symbol.trim().is_empty() || !ticker.description.chars().any(char::is_alphanumeric) {
            return Ok(Decision::halt(
                Verdict::InvalidRecord,
                "missing symbol or usable company name",
            ));
        }

        if self.config.resume {
            if let Some(existing) = store.get(&ticker.symbol)? {
                return Ok(Decision::halt(
                    Verdict::AlreadyMapped,
                    format!("already mapped to {}", existing.company_id),
                ));
            }
        }

        let name = self.normalize_name(&ticker.description);
        let ranked = self.rank(&name);
        let considered: Vec<CandidateScore> = ranked
            .iter()
            .take(self.config.review_candidates)
            .map(Ranked::candidate)
            .collect();

        let mut rejections = Vec::new();
        let mut survivors: Vec<&Ranked<'_>> = Vec::new();
        for ranked_entry in ranked.iter().take(self.config.review_candidates) {
            match self.exclusion(ticker, &name, ranked_entry) {
                None => survivors.push(ranked_entry),
                Some((verdict, reason)) => {
                    tracing::debug!(
                        ticker = %ticker.symbol,
                        candidate = %ranked_entry.prepared.entry.name,
                        score = ranked_entry.score,
                        verdict = %verdict,
                        "candidate rejected"
                    );
                    if survivors.is_empty() {
                        rejections.push(Rejection {
                            verdict,
                            candidate: ranked_entry.candidate(),
                            reason,
                        });
                    }
                }
            }
        }

        let mut decision = Decision {
            verdict: Verdict::SkippedNoCandidates,
            action: Action::Skip,
            rationale: String::new(),
            core: name.core.clone(),
            considered,
            rejections,
        };

        let top = match survivors.first() {
            Some(top) => *top,
            None => {
                match primary_rejection(&decision.rejections) {
                    Some(first) => {
                        decision.verdict = first.verdict;
                        decision.rationale = format!(
                            "{} ({}); no other candidate survived",
                            first.reason, first.candidate.entry.name
                        );
                    }
                    None => decision.rationale = "no candidates".to_string(),
                }
                return Ok(decision);
            }
        };

        // A rejected top candidate outranks a weak survivor in the report.
        if !top.exact && top.score < self.config.min_prompt_confidence {
            if let Some(first) = primary_rejection(&decision.rejections) {
                decision.verdict = first.verdict;
                decision.rationale = format!(
                    "{} ({}); next candidate {} scored only {:.1}",
                    first.reason, first.candidate.entry.name, top.prepared.entry.name, top.score
                );
                return Ok(decision);
            }
        }

        let review: Vec<CandidateScore> = survivors.iter().map(|r| r.candidate()).collect();

        if top.exact {
            if let Some(owner) = self.other_owner(ticker, &top.prepared.entry.id, store)? {
                decision.verdict = Verdict::OneToManyBlocked;
                decision.rationale = format!(
                    "exact match {} is already mapped to {}",
                    top.prepared.entry.id, owner
                );
                decision.action = Action::Review(review);
                return Ok(decision);
            }
            decision.verdict = Verdict::ExactMatch;
            decision.rationale = format!("core name '{}' matches exactly", name.core);
            decision.action = Action::Accept {
                candidate: top.candidate(),
                match_type: MatchType::Exact,
            };
            return Ok(decision);
        }

        let overlap = name.substantive_overlap(&top.prepared.name, &self.lexicon);
        if overlap <= 1 && top.score < self.config.generic_overlap_min_score {
            decision.verdict = Verdict::SkippedGenericOverlap;
            decision.rationale = format!(
                "only {} non-generic shared token(s) with {} and score {:.1} < {:.1}",
                overlap,
                top.prepared.entry.name,
                top.score,
                self.config.generic_overlap_min_score
            );
            return Ok(decision);
        }

        if ticker.symbol.chars().count() <= self.config.short_symbol_max_len && name.generic_only {
            decision.verdict = Verdict::SuspiciousGenericMatch;
            decision.rationale = format!(
                "short symbol with generic-only name '{}' (best {:.1})",
                name.core, top.score
            );
            decision.action = match self.config.generic_match_action {
                GenericMatchAction::Skip => Action::Skip,
                GenericMatchAction::Review => Action::Review(review),
            };
            return Ok(decision);
        }

        if let Some(owner) = self.other_owner(ticker, &top.prepared.entry.id, store)? {
            decision.verdict = Verdict::OneToManyBlocked;
            decision.rationale = format!(
                "{} (score {:.1}) is already mapped to {}",
                top.prepared.entry.id, top.score, owner
            );
            decision.action = Action::Review(review);
            return Ok(decision);
        }

        if top.score >= self.config.auto_match_threshold {
            decision.verdict = Verdict::AutoFuzzyMatch;
            decision.rationale = format!(
                "score {:.1} >= auto-match threshold {:.1}",
                top.score, self.config.auto_match_threshold
            );
            decision.action = Action::Accept {
                candidate: top.candidate(),
                match_type: MatchType::Fuzzy,
            };
        } else if top.score >= self.config.min_prompt_confidence {
            decision.verdict = Verdict::ManualReview;
            decision.rationale = format!(
                "score {:.1} between {:.1} and {:.1}",
                top.score, self.config.min_prompt_confidence, self.config.auto_match_threshold
            );
            decision.action = Action::Review(review);
        } else {
            decision.verdict = Verdict::SkippedLowConfidence;
            decision.rationale = format!(
                "best score {:.1} < min prompt confidence {:.1}",
                top.score, self.config.min_prompt_confidence
            );
        }
        Ok(decision)
    }

    /// Rank the whole catalog: exact core matches first, then score
    /// descending. The sort is stable, so ties keep catalog order.
    fn rank(&self, name: &NormalizedName) -> Vec<Ranked<'_>> {
        let mut ranked: Vec<Ranked<'_>> = self
            .catalog
            .iter()
            .map(|prepared| {
                let exact = prepared.name.core.eq_ignore_ascii_case(&name.core);
                let score = if exact {
                    100.0
                } else {
                    score(&name.core, &prepared.name.core)
                };
                Ranked {
                    prepared,
                    score,
                    exact,
                }
            })
            .collect();
        ranked.sort_by(|a, b| b.exact.cmp(&a.exact).then(b.score.total_cmp(&a.score)));
        ranked
    }

    /// Why a candidate cannot be auto-accepted, if it cannot.
    fn exclusion(
        &self,
        ticker: &TickerRecord,
        name: &NormalizedName,
        candidate: &Ranked<'_>,
    ) -> Option<(Verdict, String)> {
        let entry = &candidate.prepared.entry;
        let cand = &candidate.prepared.name;

        if entry.id.eq_ignore_ascii_case(&ticker.symbol) {
            return Some((
                Verdict::RejectedSelfMatch,
                "company id equals ticker symbol".to_string(),
            ));
        }
        if candidate.exact {
            return None;
        }
        if name.sector_conflict(cand) {
            return Some((
                Verdict::RejectedSectorConflict,
                format!(
                    "sector conflict {:?} vs {:?}",
                    name.sector_tokens, cand.sector_tokens
                ),
            ));
        }
        if name.fund_indicators && self.is_parent_brand(name, cand) {
            return Some((
                Verdict::RejectedFundVsCompany,
                "fund/product name vs operating company".to_string(),
            ));
        }
        if self.config.leading_token_min_ratio > 0.0 {
            let ratio = token_ratio(name.leading_token(), cand.leading_token());
            if ratio < self.config.leading_token_min_ratio {
                return Some((
                    Verdict::RejectedLeadingToken,
                    format!(
                        "leading tokens '{}' / '{}' differ ({:.1})",
                        name.leading_token(),
                        cand.leading_token(),
                        ratio
                    ),
                ));
            }
        }
        None
    }

    /// Candidate tokens are a subset of the ticker's and materially fewer.
    fn is_parent_brand(&self, name: &NormalizedName, cand: &NormalizedName) -> bool {
        let ticker_len = name.token_count();
        let cand_len = cand.token_count();
        if cand_len == 0 || cand_len >= ticker_len {
            return false;
        }
        let ticker_tokens: Vec<&str> = name.tokens().collect();
        cand.tokens().all(|t| ticker_tokens.contains(&t))
            && (cand_len as f64) <= ticker_len as f64 * self.config.fund_max_length_ratio
    }

    /// Another ticker already holding `company_id`.
    fn other_owner<S>(
        &self,
        ticker: &TickerRecord,
        company_id: &str,
        store: &S,
    ) -> Result<Option<String>, DbError>
    where
        S: MappingStore + ?Sized,
    {
        Ok(store
            .owners_of(company_id)?
            .into_iter()
            .find(|owner| !owner.eq_ignore_ascii_case(&ticker.symbol)))
    }
}

/// The rejection that explains the outcome: the best-ranked one with a
/// semantic reason, else the best-ranked leading-token misalignment.
fn primary_rejection(rejections: &[Rejection]) -> Option<&Rejection> {
    rejections
        .iter()
        .find(|r| r.verdict != Verdict::RejectedLeadingToken)
        .or_else(|| rejections.first())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MappingEntry, MemoryStore};

    fn config() -> MatcherConfig {
        MatcherConfig::load_default().unwrap()
    }

    fn catalog(names: &[(&str, &str)]) -> Vec<CatalogEntry> {
        names
            .iter()
            .map(|(id, name)| CatalogEntry::new(id, name))
            .collect()
    }

    fn matcher(names: &[(&str, &str)]) -> Matcher {
        Matcher::new(config(), catalog(names)).unwrap()
    }

    fn accepted_id(decision: &Decision) -> Option<&str> {
        match &decision.action {
            Action::Accept { candidate, .. } => Some(candidate.entry.id.as_str()),
            _ => None,
        }
    }

    #[test]
    fn test_empty_catalog_refused() {
        let result = Matcher::new(config(), Vec::new());
        assert!(matches!(result, Err(MatchError::Catalog(CatalogError::Empty))));
    }

    #[test]
    fn test_bad_threshold_order_refused() {
        let mut cfg = config();
        cfg.min_prompt_confidence = 95.0;
        let result = Matcher::new(cfg, catalog(&[("c1", "Apple")]));
        assert!(matches!(
            result,
            Err(MatchError::Config(ConfigError::ThresholdOrder { .. }))
        ));
    }

    #[test]
    fn test_skipped_type() {
        let m = matcher(&[("c1", "S&P Global")]);
        let ticker = TickerRecord::new("SPX", "S&P 500").with_type("INDEX");
        let d = m.decide(&ticker, &MemoryStore::new()).unwrap();
        assert_eq!(d.verdict, Verdict::SkippedType);
        assert_eq!(d.action, Action::Skip);
    }

    #[test]
    fn test_invalid_record() {
        let m = matcher(&[("c1", "Apple")]);
        for ticker in [TickerRecord::new("AAPL", ""), TickerRecord::new("AAPL", " -- "), TickerRecord::new(" ", "Apple")] {
            let d = m.decide(&ticker, &MemoryStore::new()).unwrap();
            assert_eq!(d.verdict, Verdict::InvalidRecord);
        }
    }

    #[test]
    fn test_already_mapped_when_resuming() {
        let m = matcher(&[("c1", "Apple Inc")]);
        let mut store = MemoryStore::new();
        store
            .put(MappingEntry::new("AAPL", "c1", MatchType::Exact, 100.0))
            .unwrap();
        let d = m.decide(&TickerRecord::new("AAPL", "APPLE INC"), &store).unwrap();
        assert_eq!(d.verdict, Verdict::AlreadyMapped);
        assert_eq!(d.action, Action::Skip);
    }

    #[test]
    fn test_exact_match() {
        let m = matcher(&[("c0", "Applied Materials"), ("c1", "Apple Inc.")]);
        let d = m.decide(&TickerRecord::new("AAPL", "APPLE INC"), &MemoryStore::new()).unwrap();
        assert_eq!(d.verdict, Verdict::ExactMatch);
        assert_eq!(accepted_id(&d), Some("c1"));
        assert_eq!(d.considered[0].entry.id, "c1");
        assert_eq!(d.considered[0].score, 100.0);
    }

    #[test]
    fn test_exact_outranks_reordered_tokens() {
        let m = matcher(&[("c1", "America Bank of"), ("c2", "Bank of America Corp")]);
        let d = m
            .decide(&TickerRecord::new("BAC", "BANK OF AMERICA"), &MemoryStore::new())
            .unwrap();
        assert_eq!(d.verdict, Verdict::ExactMatch);
        assert_eq!(accepted_id(&d), Some("c2"));
        assert_eq!(d.considered[1].score, 100.0);
    }

    #[test]
    fn test_exact_self_match_is_disqualified() {
        let m = matcher(&[("AAPL", "Apple Inc")]);
        let d = m.decide(&TickerRecord::new("aapl", "APPLE INC"), &MemoryStore::new()).unwrap();
        assert_eq!(d.verdict, Verdict::RejectedSelfMatch);
        assert_eq!(d.action, Action::Skip);
    }

    #[test]
    fn test_self_match_falls_through_to_next_candidate() {
        let m = matcher(&[("ACME", "Acme Widgets"), ("c2", "Acme Widget")]);
        let d = m
            .decide(&TickerRecord::new("ACME", "ACME WIDGETS"), &MemoryStore::new())
            .unwrap();
        assert_eq!(d.verdict, Verdict::AutoFuzzyMatch);
        assert_eq!(accepted_id(&d), Some("c2"));
        assert_eq!(d.rejections.len(), 1);
        assert_eq!(d.rejections[0].verdict, Verdict::RejectedSelfMatch);
    }

    #[test]
    fn test_sector_conflict_rejected() {
        let m = matcher(&[("c1", "International Paper")]);
        let d = m
            .decide(
                &TickerRecord::new("IGRX", "INTERNATIONAL GOLD RESOURCES"),
                &MemoryStore::new(),
            )
            .unwrap();
        assert_eq!(d.verdict, Verdict::RejectedSectorConflict);
        assert_eq!(d.action, Action::Skip);
    }

    #[test]
    fn test_sector_conflict_not_rescued_by_weaker_candidate() {
        let m = matcher(&[("c1", "International Paper"), ("c2", "Apple")]);
        let d = m
            .decide(
                &TickerRecord::new("IGRX", "INTERNATIONAL GOLD RESOURCES"),
                &MemoryStore::new(),
            )
            .unwrap();
        assert_eq!(d.verdict, Verdict::RejectedSectorConflict);
        assert_ne!(d.verdict, Verdict::AutoFuzzyMatch);
    }

    #[test]
    fn test_fund_vs_company_rejected() {
        let m = matcher(&[("c1", "BlackRock")]);
        let d = m
            .decide(&TickerRecord::new("BKT", "BLACKROCK INCOME TRUST"), &MemoryStore::new())
            .unwrap();
        assert_eq!(d.verdict, Verdict::RejectedFundVsCompany);
        assert_eq!(d.action, Action::Skip);
    }

    #[test]
    fn test_fund_vs_fund_not_rejected() {
        let m = matcher(&[("c1", "BlackRock"), ("c2", "BlackRock Income Trust Inc")]);
        let d = m
            .decide(&TickerRecord::new("BKT", "BLACKROCK INCOME TRUST"), &MemoryStore::new())
            .unwrap();
        assert_eq!(d.verdict, Verdict::ExactMatch);
        assert_eq!(accepted_id(&d), Some("c2"));
    }

    #[test]
    fn test_leading_token_rejected() {
        let m = matcher(&[("c1", "NRG Energy")]);
        let d = m.decide(&TickerRecord::new("NGX", "NG ENERGY"), &MemoryStore::new()).unwrap();
        assert_eq!(d.verdict, Verdict::RejectedLeadingToken);
    }

    #[test]
    fn test_leading_token_check_can_be_disabled() {
        let mut cfg = config();
        cfg.leading_token_min_ratio = 0.0;
        cfg.min_prompt_confidence = 10.0;
        let m = Matcher::new(cfg, catalog(&[("c1", "NRG Energy")])).unwrap();
        let d = m.decide(&TickerRecord::new("NGX", "NG ENERGY"), &MemoryStore::new()).unwrap();
        assert_ne!(d.verdict, Verdict::RejectedLeadingToken);
    }

    #[test]
    fn test_generic_short_symbol_skipped() {
        let m = matcher(&[("c1", "Global Worlds")]);
        let d = m
            .decide(&TickerRecord::new("GLW", "GLOBAL WORLD"), &MemoryStore::new())
            .unwrap();
        assert_eq!(d.verdict, Verdict::SuspiciousGenericMatch);
        assert_eq!(d.action, Action::Skip);
    }

    #[test]
    fn test_generic_short_symbol_review_when_configured() {
        let mut cfg = config();
        cfg.generic_match_action = GenericMatchAction::Review;
        let m = Matcher::new(cfg, catalog(&[("c1", "Global Worlds")])).unwrap();
        let d = m
            .decide(&TickerRecord::new("GLW", "GLOBAL WORLD"), &MemoryStore::new())
            .unwrap();
        assert_eq!(d.verdict, Verdict::SuspiciousGenericMatch);
        assert!(matches!(d.action, Action::Review(ref c) if c.len() == 1));
    }

    #[test]
    fn test_generic_long_symbol_not_suspicious() {
        let mut cfg = config();
        cfg.min_prompt_confidence = 10.0;
        let m = Matcher::new(cfg, catalog(&[("c1", "Global Worlds")])).unwrap();
        let d = m
            .decide(&TickerRecord::new("GLOBW", "GLOBAL WORLD"), &MemoryStore::new())
            .unwrap();
        assert_ne!(d.verdict, Verdict::SuspiciousGenericMatch);
        assert_eq!(d.verdict, Verdict::AutoFuzzyMatch);
    }

    #[test]
    fn test_plural_leading_token_not_rejected() {
        let m = matcher(&[("c1", "Kraft Foods Group")]);
        let d = m.decide(&TickerRecord::new("KRFT", "KRAFTS FOODS"), &MemoryStore::new()).unwrap();
        assert!(d.rejections.is_empty());
        assert_eq!(d.verdict, Verdict::AutoFuzzyMatch);
        assert_eq!(accepted_id(&d), Some("c1"));
    }

    #[test]
    fn test_generic_overlap_skipped() {
        let m = matcher(&[("c1", "American Airways")]);
        let d = m
            .decide(&TickerRecord::new("AALX", "AMERICAN AIRLINE"), &MemoryStore::new())
            .unwrap();
        assert_eq!(d.verdict, Verdict::SkippedGenericOverlap);
        assert_eq!(d.action, Action::Skip);
        assert_eq!(d.considered[0].entry.id, "c1");
    }

    #[test]
    fn test_generic_overlap_needs_high_score_only() {
        // Shares only "acme", but scores above the overlap bar.
        let m = matcher(&[("c1", "Acme Widget")]);
        let d = m.decide(&TickerRecord::new("ACMW", "ACME WIDGETS"), &MemoryStore::new()).unwrap();
        assert_eq!(d.verdict, Verdict::AutoFuzzyMatch);

        // Two shared tokens: the band decides.
        let m = matcher(&[("c1", "Acme Widget Makers")]);
        let d = m
            .decide(&TickerRecord::new("ACMW", "ACME WIDGET MANUFACTURER"), &MemoryStore::new())
            .unwrap();
        assert_eq!(d.verdict, Verdict::ManualReview);
    }

    #[test]
    fn test_generic_overlap_check_can_be_disabled() {
        let mut cfg = config();
        cfg.generic_overlap_min_score = 0.0;
        let m = Matcher::new(cfg, catalog(&[("c1", "American Airways")])).unwrap();
        let d = m
            .decide(&TickerRecord::new("AALX", "AMERICAN AIRLINE"), &MemoryStore::new())
            .unwrap();
        assert_eq!(d.verdict, Verdict::ManualReview);
    }

    #[test]
    fn test_fund_indicator_from_designator() {
        let m = matcher(&[("c1", "Apple")]);
        let name = m.normalize_name("BAILLIE GIFFORD PLC");
        assert_eq!(name.core, "baillie gifford");
        assert!(name.fund_indicators);
    }

    #[test]
    fn test_one_to_many_blocks_fuzzy() {
        let m = matcher(&[("c1", "Acme Widget")]);
        let mut store = MemoryStore::new();
        store
            .put(MappingEntry::new("ACM", "c1", MatchType::Fuzzy, 95.0))
            .unwrap();
        let d = m.decide(&TickerRecord::new("ACMW", "ACME WIDGETS"), &store).unwrap();
        assert_eq!(d.verdict, Verdict::OneToManyBlocked);
        assert!(matches!(d.action, Action::Review(_)));
    }

    #[test]
    fn test_one_to_many_blocks_exact() {
        let m = matcher(&[("c1", "Alphabet Inc")]);
        let mut store = MemoryStore::new();
        store
            .put(MappingEntry::new("GOOGL", "c1", MatchType::Exact, 100.0))
            .unwrap();
        let d = m.decide(&TickerRecord::new("GOOG", "ALPHABET INC CLASS C"), &store).unwrap();
        assert_eq!(d.verdict, Verdict::OneToManyBlocked);
        assert!(accepted_id(&d).is_none());
    }

    #[test]
    fn test_own_mapping_not_one_to_many_without_resume() {
        let mut cfg = config();
        cfg.resume = false;
        let m = Matcher::new(cfg, catalog(&[("c1", "Apple Inc")])).unwrap();
        let mut store = MemoryStore::new();
        store
            .put(MappingEntry::new("AAPL", "c1", MatchType::Exact, 100.0))
            .unwrap();
        let d = m.decide(&TickerRecord::new("AAPL", "APPLE INC"), &store).unwrap();
        assert_eq!(d.verdict, Verdict::ExactMatch);
    }

    #[test]
    fn test_acronym_expansion_exact() {
        let cfg = config().with_acronym("BOA", "Bank of America");
        let m = Matcher::new(cfg, catalog(&[("c1", "Bank of America Corporation")])).unwrap();
        let d = m.decide(&TickerRecord::new("BAC", "BOA"), &MemoryStore::new()).unwrap();
        assert_eq!(d.verdict, Verdict::ExactMatch);
        assert_eq!(accepted_id(&d), Some("c1"));
    }

    #[test]
    fn test_threshold_bands() {
        let names = [("c1", "Acme Widget Makers")];
        let sample = Matcher::new(config(), catalog(&names)).unwrap();
        let ticker = TickerRecord::new("ACMW", "ACME WIDGET MANUFACTURER");
        let core = sample.normalize_name(&ticker.description).core;
        let s = sample.score_entry(&core, "c1").unwrap();
        assert!(s < 100.0 && s > 50.0, "score {}", s);

        // Exactly at the auto threshold: accept.
        let mut cfg = config();
        cfg.auto_match_threshold = s;
        cfg.min_prompt_confidence = s - 10.0;
        let m = Matcher::new(cfg, catalog(&names)).unwrap();
        let d = m.decide(&ticker, &MemoryStore::new()).unwrap();
        assert_eq!(d.verdict, Verdict::AutoFuzzyMatch);
        assert_eq!(accepted_id(&d), Some("c1"));

        // One point below: manual review with at most five candidates.
        let mut cfg = config();
        cfg.auto_match_threshold = s + 1.0;
        cfg.min_prompt_confidence = s - 10.0;
        let m = Matcher::new(cfg, catalog(&names)).unwrap();
        let d = m.decide(&ticker, &MemoryStore::new()).unwrap();
        assert_eq!(d.verdict, Verdict::ManualReview);
        match d.action {
            Action::Review(candidates) => {
                assert!(!candidates.is_empty() && candidates.len() <= 5);
                assert_eq!(candidates[0].entry.id, "c1");
            }
            other => panic!("expected review, got {:?}", other),
        }

        // Below min prompt confidence: skip without review.
        let mut cfg = config();
        cfg.auto_match_threshold = s + 2.0;
        cfg.min_prompt_confidence = s + 1.0;
        let m = Matcher::new(cfg, catalog(&names)).unwrap();
        let d = m.decide(&ticker, &MemoryStore::new()).unwrap();
        assert_eq!(d.verdict, Verdict::SkippedLowConfidence);
        assert_eq!(d.action, Action::Skip);
    }

    #[test]
    fn test_review_candidates_capped() {
        let names: Vec<(String, String)> = (0..8)
            .map(|i| (format!("c{}", i), format!("Acme Widget {}", i)))
            .collect();
        let entries: Vec<CatalogEntry> = names
            .iter()
            .map(|(id, name)| CatalogEntry::new(id, name))
            .collect();
        let mut cfg = config();
        cfg.auto_match_threshold = 99.0;
        cfg.min_prompt_confidence = 50.0;
        let m = Matcher::new(cfg, entries).unwrap();
        let d = m.decide(&TickerRecord::new("ACMW", "ACME WIDGET"), &MemoryStore::new()).unwrap();
        assert_eq!(d.verdict, Verdict::ManualReview);
        match d.action {
            Action::Review(candidates) => assert_eq!(candidates.len(), 5),
            other => panic!("expected review, got {:?}", other),
        }
        assert_eq!(d.considered.len(), 5);
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let m = matcher(&[("c1", "Acme Widget Zx1"), ("c2", "Acme Widget Zx2")]);
        let d = m
            .decide(&TickerRecord::new("ACMW", "ACME WIDGET ZX3"), &MemoryStore::new())
            .unwrap();
        assert_eq!(d.considered[0].score, d.considered[1].score);
        assert_eq!(d.considered[0].entry.id, "c1");
        assert_eq!(d.considered[1].entry.id, "c2");
    }

    #[test]
    fn test_verdict_names() {
        assert_eq!(Verdict::RejectedSectorConflict.to_string(), "rejected_sector_conflict");
        assert_eq!(Verdict::OneToManyBlocked.as_str(), "one_to_many_blocked");
        assert!(Verdict::RejectedFundVsCompany.is_rejection());
        assert!(!Verdict::ManualReview.is_rejection());
    }
}
