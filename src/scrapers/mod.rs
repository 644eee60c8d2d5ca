//! Source page retrieval.
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | Daily news analysis | [`news_analysis`] | HTML fetch | One page per day, keyed by `DD-MM-YYYY` |
//!
//! The scraper only retrieves bytes. Parsing and rewriting happen in
//! [`crate::extract`].

pub mod news_analysis;
