//! Searchable keyword documentation for completion.
//!
//! [`KeywordIndexer`] is a run [`rfi_runtime::Listener`] that collects the
//! keywords of imported libraries and resources plus the suite's own keywords
//! into a [`KeywordIndex`]. Candidate selection follows the usual symbol search
//! layout: a trigram index for queries of three or more bytes and first-byte
//! buckets for shorter or acronym-style queries, then fuzzy ranking.

mod doc;
mod indexer;
mod search;

pub use doc::{DocKey, DocKind, KeywordDoc};
pub use indexer::KeywordIndexer;
pub use search::{CandidateStrategy, KeywordIndex, SearchHit, SearchStats};
