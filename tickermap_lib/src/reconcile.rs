//! Reconciliation run loop.
//!
//! Processes tickers one at a time: decide, prompt when the engine defers,
//! persist, audit. A ticker is fully resolved, including any human prompt,
//! before the next one starts, so the unit of resumption is one ticker.

use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};
use thiserror::Error;

use crate::audit::{AuditError, AuditLog, AuditRecord};
use crate::db::DbError;
use crate::engine::{Action, CandidateScore, Decision, Matcher, Verdict};
use crate::store::{MappingEntry, MappingStore, MatchType};
use crate::ticker_source::TickerRecord;

/// Errors that halt a run. Per-ticker matching failures do not end up here.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("failed to persist mapping for {ticker}: {source}")]
    Persist {
        ticker: String,
        #[source]
        source: DbError,
    },
    #[error("audit log error: {0}")]
    Audit(#[from] AuditError),
    #[error("review prompt failed: {0}")]
    Prompt(#[from] io::Error),
}

/// Reviewer's answer to a candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Candidate(String),
    Skip,
    /// Stop the run after this ticker. Everything accepted so far is kept.
    Quit,
}

/// Human review channel.
pub trait ReviewPrompt {
    /// Pick one of `candidates` (or any catalog id), skip, or quit.
    fn select(
        &mut self,
        ticker: &TickerRecord,
        decision: &Decision,
        candidates: &[CandidateScore],
    ) -> io::Result<Selection>;

    /// Yes/no confirmation for an override warning.
    fn confirm(&mut self, ticker: &TickerRecord, warning: &str) -> io::Result<bool>;
}

/// Prompt for unattended runs: every review is skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct SkipAll;

impl ReviewPrompt for SkipAll {
    fn select(
        &mut self,
        _ticker: &TickerRecord,
        _decision: &Decision,
        _candidates: &[CandidateScore],
    ) -> io::Result<Selection> {
        Ok(Selection::Skip)
    }

    fn confirm(&mut self, _ticker: &TickerRecord, _warning: &str) -> io::Result<bool> {
        Ok(false)
    }
}

/// Totals for one run.
#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    pub processed: usize,
    pub exact: usize,
    pub auto: usize,
    pub manual: usize,
    pub rejected: usize,
    pub skipped: usize,
    pub errors: usize,
    pub already_mapped: usize,
    /// Accepted by the engine but the ticker already had a mapping
    /// (only possible with resume disabled); the stored entry was kept.
    pub kept_existing: usize,
    /// Stopped early at the reviewer's request.
    pub interrupted: bool,
    /// Final verdict of every processed ticker.
    pub verdicts: BTreeMap<Verdict, usize>,
}

impl RunSummary {
    pub fn accepted(&self) -> usize {
        self.exact + self.auto + self.manual
    }

    fn count(&mut self, verdict: Verdict) {
        *self.verdicts.entry(verdict).or_default() += 1;
        match verdict {
            Verdict::ExactMatch => self.exact += 1,
            Verdict::AutoFuzzyMatch => self.auto += 1,
            Verdict::Manual => self.manual += 1,
            Verdict::AlreadyMapped => self.already_mapped += 1,
            Verdict::SkippedError => self.errors += 1,
            v if v.is_rejection() => self.rejected += 1,
            _ => self.skipped += 1,
        }
    }
}

enum Flow {
    Continue,
    Quit,
}

/// Run the matcher over `tickers`, writing accepted mappings to `store`.
///
/// A store read failing while deciding a ticker degrades that ticker to
/// `skipped_error`. A failed write halts the run with everything before it
/// already persisted.
pub fn run<S, P, W>(
    matcher: &Matcher,
    tickers: &[TickerRecord],
    store: &mut S,
    prompt: &mut P,
    audit: &mut AuditLog<W>,
) -> Result<RunSummary, RunError>
where
    S: MappingStore + ?Sized,
    P: ReviewPrompt + ?Sized,
    W: Write,
{
    let mut summary = RunSummary::default();
    tracing::info!(tickers = tickers.len(), catalog = matcher.catalog_len(), "starting run");

    for ticker in tickers {
        summary.processed += 1;

        let decision = match matcher.decide(ticker, &*store) {
            Ok(decision) => decision,
            Err(e) => {
                tracing::error!(ticker = %ticker.symbol, error = %e, "matching failed");
                Decision::halt(Verdict::SkippedError, e.to_string())
            }
        };
        log_decision(ticker, &decision);
        audit.record(&AuditRecord::from_decision(ticker, &decision))?;

        match &decision.action {
            Action::Accept {
                candidate,
                match_type,
            } => {
                let entry = MappingEntry::new(
                    &ticker.symbol,
                    &candidate.entry.id,
                    *match_type,
                    candidate.score,
                );
                if commit(store, entry)? {
                    summary.count(decision.verdict);
                } else {
                    summary.kept_existing += 1;
                    summary.count(Verdict::AlreadyMapped);
                }
            }
            Action::Review(candidates) => {
                let flow = review(matcher, ticker, &decision, candidates, store, prompt, audit, &mut summary)?;
                if let Flow::Quit = flow {
                    summary.interrupted = true;
                    tracing::warn!(ticker = %ticker.symbol, "run stopped by reviewer");
                    break;
                }
            }
            Action::Skip => summary.count(decision.verdict),
        }
    }

    tracing::info!(
        processed = summary.processed,
        accepted = summary.accepted(),
        rejected = summary.rejected,
        skipped = summary.skipped,
        errors = summary.errors,
        "run complete"
    );
    Ok(summary)
}

fn log_decision(ticker: &TickerRecord, decision: &Decision) {
    let (candidate, score) = match &decision.action {
        Action::Accept { candidate, .. } => (Some(candidate), Some(candidate.score)),
        Action::Review(candidates) => (candidates.first(), candidates.first().map(|c| c.score)),
        Action::Skip => (
            decision.considered.first(),
            decision.considered.first().map(|c| c.score),
        ),
    };
    tracing::info!(
        ticker = %ticker.symbol,
        verdict = %decision.verdict,
        candidate = candidate.map(|c| c.entry.name.as_str()).unwrap_or(""),
        score = score.unwrap_or(0.0),
        "{}",
        decision.rationale
    );
}

/// Put and persist one entry. Returns false when the ticker already had a
/// mapping, which is left untouched.
fn commit<S>(store: &mut S, entry: MappingEntry) -> Result<bool, RunError>
where
    S: MappingStore + ?Sized,
{
    let ticker = entry.ticker.clone();
    match store.put(entry) {
        Ok(()) => {}
        Err(DbError::DuplicateTicker(_)) => {
            tracing::warn!(ticker = %ticker, "ticker already mapped; keeping existing mapping");
            return Ok(false);
        }
        Err(source) => return Err(RunError::Persist { ticker, source }),
    }
    store
        .persist()
        .map_err(|source| RunError::Persist { ticker, source })?;
    Ok(true)
}

#[allow(clippy::too_many_arguments)]
fn review<S, P, W>(
    matcher: &Matcher,
    ticker: &TickerRecord,
    decision: &Decision,
    candidates: &[CandidateScore],
    store: &mut S,
    prompt: &mut P,
    audit: &mut AuditLog<W>,
    summary: &mut RunSummary,
) -> Result<Flow, RunError>
where
    S: MappingStore + ?Sized,
    P: ReviewPrompt + ?Sized,
    W: Write,
{
    let skip = |reason: &str, audit: &mut AuditLog<W>, summary: &mut RunSummary| -> Result<Flow, RunError> {
        audit.record(&AuditRecord::from_review(ticker, Verdict::SkippedByUser, None, reason))?;
        summary.count(Verdict::SkippedByUser);
        Ok(Flow::Continue)
    };

    let id = match prompt.select(ticker, decision, candidates)? {
        Selection::Candidate(id) => id.trim().to_string(),
        Selection::Skip => return skip("skipped by reviewer", audit, summary),
        Selection::Quit => {
            audit.record(&AuditRecord::from_review(
                ticker,
                Verdict::SkippedByUser,
                None,
                "reviewer stopped the run",
            ))?;
            summary.count(Verdict::SkippedByUser);
            return Ok(Flow::Quit);
        }
    };

    let Some(entry) = matcher.entry(&id) else {
        tracing::warn!(ticker = %ticker.symbol, company_id = %id, "unknown company id; skipping");
        return skip(&format!("unknown company id {}", id), audit, summary);
    };

    let mut notes = Vec::new();
    if id.eq_ignore_ascii_case(&ticker.symbol) {
        let warning = format!("company id {} equals the ticker symbol", id);
        tracing::warn!(ticker = %ticker.symbol, "{}", warning);
        if !prompt.confirm(ticker, &warning)? {
            return skip(&format!("declined: {}", warning), audit, summary);
        }
        notes.push(format!("confirmed: {}", warning));
    }

    let owners: Vec<String> = match store.owners_of(&id) {
        Ok(owners) => owners,
        Err(e) => {
            tracing::error!(ticker = %ticker.symbol, error = %e, "mapping lookup failed");
            audit.record(&AuditRecord::from_review(ticker, Verdict::SkippedError, None, &e.to_string()))?;
            summary.count(Verdict::SkippedError);
            return Ok(Flow::Continue);
        }
    };
    let others: Vec<&String> = owners
        .iter()
        .filter(|o| !o.eq_ignore_ascii_case(&ticker.symbol))
        .collect();
    if !others.is_empty() {
        let list: Vec<&str> = others.iter().map(|s| s.as_str()).collect();
        let warning = format!("company id {} is already mapped to {}", id, list.join(", "));
        tracing::warn!(ticker = %ticker.symbol, "{}", warning);
        if !prompt.confirm(ticker, &warning)? {
            return skip(&format!("declined: {}", warning), audit, summary);
        }
        notes.push(format!("confirmed: {}", warning));
    }

    let score = candidates
        .iter()
        .find(|c| c.entry.id == id)
        .map(|c| c.score)
        .or_else(|| matcher.score_entry(&decision.core, &id))
        .unwrap_or(0.0);
    let chosen = CandidateScore {
        entry: entry.clone(),
        score,
    };

    if !commit(store, MappingEntry::new(&ticker.symbol, &id, MatchType::Manual, score))? {
        summary.kept_existing += 1;
        summary.count(Verdict::AlreadyMapped);
        return Ok(Flow::Continue);
    }

    let mut rationale = format!("selected by reviewer after {}", decision.verdict);
    for note in notes {
        rationale.push_str("; ");
        rationale.push_str(&note);
    }
    tracing::info!(ticker = %ticker.symbol, company_id = %id, score, "manual mapping accepted");
    audit.record(&AuditRecord::from_review(ticker, Verdict::Manual, Some(&chosen), &rationale))?;
    summary.count(Verdict::Manual);
    Ok(Flow::Continue)
}
