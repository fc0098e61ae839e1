//! Append-only CSV audit trail of every verdict.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

use crate::engine::{Action, CandidateScore, Decision, Verdict};
use crate::store::MatchType;
use crate::ticker_source::TickerRecord;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One row of the audit log.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub ticker: String,
    pub description: String,
    pub verdict: Verdict,
    pub match_type: Option<MatchType>,
    pub candidate_name: Option<String>,
    pub candidate_id: Option<String>,
    pub score: Option<f64>,
    /// `name (id) score` for each considered candidate, `|`-separated.
    pub considered: String,
    pub rationale: String,
    pub logged_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Row for an engine decision. The reported candidate is the accepted
    /// one, else the first rejected one, else the best considered one.
    pub fn from_decision(ticker: &TickerRecord, decision: &Decision) -> Self {
        let (candidate, match_type) = match &decision.action {
            Action::Accept {
                candidate,
                match_type,
            } => (Some(candidate), Some(*match_type)),
            Action::Review(candidates) => (candidates.first(), None),
            Action::Skip => (
                decision
                    .rejections
                    .first()
                    .map(|r| &r.candidate)
                    .or_else(|| decision.considered.first()),
                None,
            ),
        };
        Self::build(
            ticker,
            decision.verdict,
            match_type,
            candidate,
            &decision.considered,
            &decision.rationale,
        )
    }

    /// Row for the outcome of a human review.
    pub fn from_review(
        ticker: &TickerRecord,
        verdict: Verdict,
        chosen: Option<&CandidateScore>,
        rationale: &str,
    ) -> Self {
        let match_type = (verdict == Verdict::Manual).then_some(MatchType::Manual);
        Self::build(ticker, verdict, match_type, chosen, &[], rationale)
    }

    fn build(
        ticker: &TickerRecord,
        verdict: Verdict,
        match_type: Option<MatchType>,
        candidate: Option<&CandidateScore>,
        considered: &[CandidateScore],
        rationale: &str,
    ) -> Self {
        Self {
            ticker: ticker.symbol.clone(),
            description: ticker.description.clone(),
            verdict,
            match_type,
            candidate_name: candidate.map(|c| c.entry.name.clone()),
            candidate_id: candidate.map(|c| c.entry.id.clone()),
            score: candidate.map(|c| (c.score * 10.0).round() / 10.0),
            considered: considered
                .iter()
                .map(|c| format!("{} ({}) {:.1}", c.entry.name, c.entry.id, c.score))
                .collect::<Vec<_>>()
                .join(" | "),
            rationale: rationale.to_string(),
            logged_at: Utc::now(),
        }
    }
}

/// CSV audit writer. Each record is flushed before `record` returns.
pub struct AuditLog<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> AuditLog<W> {
    /// Write to any sink, header first.
    pub fn from_writer(inner: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new().has_headers(true).from_writer(inner),
        }
    }

    pub fn record(&mut self, record: &AuditRecord) -> Result<(), AuditError> {
        self.writer.serialize(record)?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W, AuditError> {
        self.writer
            .into_inner()
            .map_err(|e| AuditError::Io(e.into_error()))
    }
}

impl AuditLog<File> {
    /// Open `path` for appending. The header is only written when the file
    /// is new or empty, so successive runs share one log.
    pub fn open_append(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let is_empty = file.metadata()?.len() == 0;
        Ok(Self {
            writer: csv::WriterBuilder::new()
                .has_headers(is_empty)
                .from_writer(file),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;

    fn accepted() -> Decision {
        let candidate = CandidateScore {
            entry: CatalogEntry::new("c1", "Apple Inc"),
            score: 100.0,
        };
        Decision {
            verdict: Verdict::ExactMatch,
            action: Action::Accept {
                candidate: candidate.clone(),
                match_type: MatchType::Exact,
            },
            rationale: "core name 'apple' matches exactly".to_string(),
            core: "apple".to_string(),
            considered: vec![candidate],
            rejections: Vec::new(),
        }
    }

    #[test]
    fn test_record_from_decision() {
        let record = AuditRecord::from_decision(&TickerRecord::new("AAPL", "APPLE INC"), &accepted());
        assert_eq!(record.verdict, Verdict::ExactMatch);
        assert_eq!(record.match_type, Some(MatchType::Exact));
        assert_eq!(record.candidate_id.as_deref(), Some("c1"));
        assert_eq!(record.considered, "Apple Inc (c1) 100.0");
    }

    #[test]
    fn test_writer_output() {
        let mut log = AuditLog::from_writer(Vec::new());
        let record = AuditRecord::from_decision(&TickerRecord::new("AAPL", "APPLE INC"), &accepted());
        log.record(&record).unwrap();
        let out = String::from_utf8(log.into_inner().unwrap()).unwrap();
        let mut lines = out.lines();
        assert_eq!(
            lines.next().unwrap(),
            "ticker,description,verdict,match_type,candidate_name,candidate_id,score,considered,rationale,logged_at"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("AAPL,APPLE INC,exact_match,exact,Apple Inc,c1,100.0,"));
    }

    #[test]
    fn test_append_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.csv");
        let record = AuditRecord::from_review(
            &TickerRecord::new("XYZ", "XYZ CORP"),
            Verdict::SkippedByUser,
            None,
            "skipped",
        );
        for _ in 0..2 {
            let mut log = AuditLog::open_append(&path).unwrap();
            log.record(&record).unwrap();
        }
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().filter(|l| l.starts_with("ticker,")).count(), 1);
        assert_eq!(content.lines().count(), 3);
    }
}
