//! Ordering extracted articles for the digest.

use crate::models::{ArticleSegment, RenderedSegment};

/// Sort by rank score, highest first, keeping source order among equal
/// scores, and number the result.
///
/// # Arguments
///
/// * `segments` - Segments in source order
///
/// # Returns
///
/// The segments in digest order, each with its zero-based position.
pub fn rank_and_assemble(mut segments: Vec<ArticleSegment>) -> Vec<RenderedSegment> {
    // `sort_by` is stable.
    segments.sort_by(|a, b| b.rank_score.cmp(&a.rank_score));
    segments
        .into_iter()
        .enumerate()
        .map(|(position, segment)| RenderedSegment { position, segment })
        .collect()
}
