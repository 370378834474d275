//! Keyword volume lookups behind a three-tier fallback chain.
//!
//! 1. the signed keyword tool API ([`primary`]),
//! 2. the public blog search API, with volume estimated from post counts ([`secondary`]),
//! 3. deterministic synthetic metrics ([`synthetic`]).
//!
//! [`KeywordLookup`] runs the chain and [`api`] exposes it over HTTP.
pub mod api;
pub mod config;
pub mod lookup;
pub mod metrics_defs;
pub mod primary;
mod related;
pub mod secondary;
pub mod signer;
pub mod synthetic;
pub mod tier;
pub mod types;

#[cfg(test)]
mod testutils;

pub use lookup::{KeywordLookup, LookupError};
pub use related::RELATED_KEYWORD_POLICY;
pub use types::{CompetitionLevel, Keyword, KeywordLookupResult, KeywordMetrics, Source};
