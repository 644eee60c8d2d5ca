//! Turning the daily page into ranked, self-contained article segments.
//!
//! - [`classify`]: what to do with an element
//! - [`rewrite`]: in-place cleanup of an article subtree
//! - [`segment`]: locating article blocks and serializing them
//! - [`rank`]: ordering the segments for the digest

pub mod classify;
pub mod rank;
pub mod rewrite;
pub mod segment;

pub use rank::rank_and_assemble;
pub use rewrite::Rewriter;
pub use segment::Segmenter;
