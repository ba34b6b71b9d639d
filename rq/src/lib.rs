//! resq - in-memory query engine for cloud resource records
//!
//! Provides the search layer behind the azscope TUI: free-text matching
//! with relevance scoring, structured `key:value` filters with alias-aware
//! type matching, shell-style wildcards, and prefix suggestions.
//!
//! The engine owns a flat slice of [`Record`]s and is rebuilt wholesale
//! whenever the caller's resource set changes. All matching is
//! case-insensitive.
//!
//! # Filter semantics
//!
//! Multiple `type:` tokens are OR-joined; the same holds within every
//! other filter kind. Filters of *different* kinds are AND-joined. A query
//! with at least one filter and no free-text terms is a "filter-only"
//! query and returns every record passing the filter set with a fixed
//! score of 100.

pub mod aliases;
pub mod engine;
pub mod query;
pub mod record;
pub mod suggest;

pub use engine::{FILTER_ONLY_SCORE, MatchType, SearchEngine, SearchResult};
pub use query::{QueryError, SearchFilters, SearchQuery};
pub use record::Record;
pub use suggest::suggestions;
