//! Node classification for the rewriter.

use crate::dom::Element;
use crate::profile::SiteProfile;

/// What the rewriter should do with an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    /// Drop the element and its whole subtree.
    Skip,
    /// Star-rating container to normalize.
    RatingWidget,
    /// Embedded video frame.
    VideoEmbed,
    /// Regular traversal.
    Plain,
}

/// Classify an element. Pure; looks only at the tag, classes and `src`.
pub fn classify(element: &Element, profile: &SiteProfile) -> NodeClass {
    if is_skipped(element, profile) {
        return NodeClass::Skip;
    }
    if element.is("div") && element.has_class(&profile.rating_class) {
        return NodeClass::RatingWidget;
    }
    if element.is("iframe")
        && element
            .attr("src")
            .is_some_and(|src| src.contains(&profile.video_marker))
    {
        return NodeClass::VideoEmbed;
    }
    NodeClass::Plain
}

fn is_skipped(element: &Element, profile: &SiteProfile) -> bool {
    profile.skip_tags.iter().any(|t| element.is(t))
        || element
            .classes()
            .any(|c| profile.skip_classes.iter().any(|s| s == c))
}
