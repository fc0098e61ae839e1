//! Library layer for tickermap: reconciles exchange ticker symbols with an
//! internal company catalog.
//!
//! The matching core is [`normalize`], [`classify`], [`score`] and the
//! [`engine::Matcher`]. Around it sit configuration, the SQLite mapping
//! store, catalog/ticker loading, the audit log, the run loop and
//! master-list validation.

pub mod audit;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod db;
pub mod engine;
pub mod mapping_file;
pub mod master_list;
pub mod normalize;
pub mod reconcile;
pub mod score;
pub mod store;
pub mod ticker_source;
pub mod vocabulary;

pub use finnhub_api;

pub use audit::{AuditError, AuditLog, AuditRecord};
pub use catalog::{load_catalog, CatalogEntry, CatalogError};
pub use classify::{classify, classify_with_tokens, NormalizedName};
pub use config::{ConfigError, GenericMatchAction, MatcherConfig};
pub use db::{Db, DbError};
pub use engine::{Action, CandidateScore, Decision, MatchError, Matcher, Rejection, Verdict};
pub use mapping_file::MappingFileError;
pub use master_list::{MasterList, MasterListError, ValidationReport};
pub use normalize::{normalize, normalize_with_tokens};
pub use reconcile::{run, ReviewPrompt, RunError, RunSummary, Selection, SkipAll};
pub use score::score;
pub use store::{MappingEntry, MappingStore, MatchType, MemoryStore};
pub use ticker_source::{load_tickers, TickerRecord, TickerSourceError};
pub use vocabulary::{Lexicon, Vocabulary, VocabularyError};
