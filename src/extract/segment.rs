//! Locating article blocks and turning each into an [`ArticleSegment`].
//!
//! The daily page nests its articles as
//!
//! ```text
//! div.<listing_class> > <wrapper_tag> ... div.<article_class>
//! ```
//!
//! Blocks are handed out lazily by [`Segmenter::next_segment`], each one
//! rewritten in place before it is serialized. Blocks that produce no HTML are
//! skipped, so the indices of emitted segments can have gaps.

use super::rewrite::Rewriter;
use crate::assets::Transport;
use crate::dom::serialize::prettify;
use crate::dom::{Document, NodeId};
use crate::error::StructureError;
use crate::models::ArticleSegment;
use crate::profile::SiteProfile;
use html_escape::encode_text;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, instrument, warn};

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern compiles"));

/// Collapse whitespace runs to single spaces and trim.
pub fn normalize_heading(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Number of filled rating markers in the first rating widget under `block`.
pub fn rank_score(doc: &Document, block: NodeId, profile: &SiteProfile) -> usize {
    let Some(widget) = doc.find_descendant(block, |el| {
        el.is("div") && el.has_class(&profile.rating_class)
    }) else {
        return 0;
    };
    doc.find_all(widget, |el| el.is("span") && el.has_class(&profile.filled_class))
        .len()
}

/// Lazy producer of article segments for one page.
#[derive(Debug)]
pub struct Segmenter {
    blocks: Vec<NodeId>,
    next: usize,
}

impl Segmenter {
    /// Find the article blocks of `doc`.
    ///
    /// # Errors
    ///
    /// Returns a [`StructureError`] naming the first level of the
    /// listing > wrapper > article nesting that is missing.
    #[instrument(level = "info", skip_all)]
    pub fn locate(doc: &Document, profile: &SiteProfile) -> Result<Self, StructureError> {
        let listing = doc
            .find_descendant(doc.root(), |el| {
                el.is("div") && el.has_class(&profile.listing_class)
            })
            .ok_or_else(|| StructureError::MissingListing(profile.listing_class.clone()))?;

        let wrapper = doc
            .element_children(listing)
            .find(|&c| doc.tag(c) == Some(profile.wrapper_tag.as_str()))
            .ok_or_else(|| StructureError::MissingWrapper(profile.wrapper_tag.clone()))?;

        let blocks = doc.find_all(wrapper, |el| {
            el.is("div") && el.has_class(&profile.article_class)
        });
        if blocks.is_empty() {
            return Err(StructureError::NoArticles(profile.article_class.clone()));
        }

        info!(blocks = blocks.len(), "Located article blocks");
        Ok(Self { blocks, next: 0 })
    }

    /// Total number of blocks found on the page.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Rewrite and serialize the next block that yields any HTML.
    ///
    /// Returns `None` once every block has been consumed.
    pub async fn next_segment<T: Transport>(
        &mut self,
        doc: &mut Document,
        rewriter: &mut Rewriter<'_, T>,
    ) -> Option<ArticleSegment> {
        while let Some(&block) = self.blocks.get(self.next) {
            let index = self.next;
            self.next += 1;
            if !doc.is_attached(block) {
                debug!(index, "Block no longer attached; skipping");
                continue;
            }
            if let Some(segment) = build_segment(doc, block, index, rewriter).await {
                return Some(segment);
            }
            warn!(index, "Article block produced no content; skipping");
        }
        None
    }
}

async fn build_segment<T: Transport>(
    doc: &mut Document,
    block: NodeId,
    index: usize,
    rewriter: &mut Rewriter<'_, T>,
) -> Option<ArticleSegment> {
    let heading_tag = rewriter.profile().heading_tag.clone();
    let heading = doc
        .element_children(block)
        .find(|&c| doc.tag(c) == Some(heading_tag.as_str()));

    let targets = match heading {
        Some(h) => {
            let mut targets = vec![h];
            targets.extend(doc.following_element_siblings(h));
            targets
        }
        None => {
            warn!(index, tag = %heading_tag, "Article block has no heading; using all of its content");
            doc.element_children(block).collect()
        }
    };
    for target in targets {
        if doc.parent(target) == Some(block) {
            rewriter.rewrite(doc, target, index).await;
        }
    }

    let rank = rank_score(doc, block, rewriter.profile());

    // The heading may have been replaced by the rewrite, so look it up again.
    let heading = doc
        .element_children(block)
        .find(|&c| doc.tag(c) == Some(heading_tag.as_str()));
    let heading_text = heading
        .map(|h| normalize_heading(&doc.text_content(h)))
        .filter(|text| !text.is_empty());

    let fragments = match heading {
        Some(h) => std::iter::once(h)
            .chain(doc.following_element_siblings(h))
            .map(|node| prettify(doc, node))
            .filter(|html| !html.trim().is_empty())
            .collect::<Vec<_>>(),
        None => doc
            .children(block)
            .iter()
            .filter_map(|&node| {
                if doc.element(node).is_some() {
                    Some(prettify(doc, node))
                } else {
                    doc.text(node)
                        .map(str::trim)
                        .filter(|text| !text.is_empty())
                        .map(|text| encode_text(text).into_owned())
                }
            })
            .filter(|html| !html.trim().is_empty())
            .collect(),
    };

    if fragments.is_empty() {
        return None;
    }
    debug!(index, rank, fragments = fragments.len(), heading = ?heading_text, "Built article segment");
    Some(ArticleSegment {
        index,
        heading: heading_text,
        rank_score: rank,
        fragments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetDownloader;
    use crate::assets::testing::StaticTransport;
    use crate::error::StructureError;

    fn page(blocks: &str) -> String {
        format!(
            r#"<html><head><title>Daily</title></head><body>
               <div class="list-category"><article>{blocks}</article></div>
               </body></html>"#
        )
    }

    fn block(heading: &str, stars: usize, body: &str) -> String {
        let widget: String = (0..5)
            .map(|i| {
                if i < stars {
                    r#"<span class="fa fa-star checked"></span>"#
                } else {
                    r#"<span class="fa fa-star"></span>"#
                }
            })
            .collect();
        format!(
            r#"<div class="article-detail"><h1>{heading}</h1>
               <div class="starRating">{widget}</div>{body}</div>"#
        )
    }

    async fn collect(html: &str) -> Vec<ArticleSegment> {
        let profile = SiteProfile::default();
        let dir = tempfile::tempdir().unwrap();
        let assets = AssetDownloader::new(StaticTransport::new(), dir.path(), "../Output Images");
        let mut rewriter = Rewriter::new(&profile, &assets).unwrap();
        let mut doc = Document::parse(html);
        let mut segmenter = Segmenter::locate(&doc, &profile).unwrap();

        let mut out = Vec::new();
        while let Some(segment) = segmenter.next_segment(&mut doc, &mut rewriter).await {
            out.push(segment);
        }
        out
    }

    #[test]
    fn test_normalize_heading() {
        assert_eq!(normalize_heading("  India\n   and   the\tG20 "), "India and the G20");
        assert_eq!(normalize_heading("   "), "");
    }

    #[test]
    fn test_locate_reports_each_missing_level() {
        let profile = SiteProfile::default();

        let doc = Document::parse("<div class='other'></div>");
        assert!(matches!(
            Segmenter::locate(&doc, &profile),
            Err(StructureError::MissingListing(_))
        ));

        let doc = Document::parse("<div class='list-category'><section></section></div>");
        assert!(matches!(
            Segmenter::locate(&doc, &profile),
            Err(StructureError::MissingWrapper(_))
        ));

        let doc = Document::parse("<div class='list-category'><article><p>x</p></article></div>");
        assert!(matches!(
            Segmenter::locate(&doc, &profile),
            Err(StructureError::NoArticles(_))
        ));
    }

    #[test]
    fn test_locate_counts_blocks() {
        let html = page(&format!("{}{}", block("A", 1, ""), block("B", 2, "")));
        let doc = Document::parse(&html);
        let segmenter = Segmenter::locate(&doc, &SiteProfile::default()).unwrap();
        assert_eq!(segmenter.len(), 2);
    }

    #[tokio::test]
    async fn test_segments_in_source_order_with_scores() {
        let html = page(&format!(
            "{}{}",
            block("First  story", 2, "<p>one</p>"),
            block("Second story", 5, "<p>two</p>")
        ));
        let segments = collect(&html).await;

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].index, 0);
        assert_eq!(segments[0].heading.as_deref(), Some("First story"));
        assert_eq!(segments[0].rank_score, 2);
        assert_eq!(segments[1].rank_score, 5);
        assert!(segments[0].fragments[0].starts_with("<h1>"));
        assert!(segments[0].fragments.iter().any(|f| f.contains("one")));
    }

    #[tokio::test]
    async fn test_content_before_heading_is_left_out() {
        let html = page(
            r#"<div class="article-detail"><p>breadcrumb</p><h1>Title</h1><p>body</p></div>"#,
        );
        let segments = collect(&html).await;
        let joined = segments[0].fragments.join("\n");
        assert!(joined.contains("body"));
        assert!(!joined.contains("breadcrumb"));
    }

    #[tokio::test]
    async fn test_block_without_heading_uses_all_children() {
        let html = page(
            r#"<div class="article-detail">Loose intro<p>Paragraph</p></div>"#,
        );
        let segments = collect(&html).await;

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].heading, None);
        assert_eq!(segments[0].rank_score, 0);
        assert_eq!(segments[0].fragments[0], "Loose intro");
        assert!(segments[0].fragments[1].contains("Paragraph"));
    }

    #[tokio::test]
    async fn test_block_without_heading_rewrites_every_child() {
        let html = page(
            r#"<div class="article-detail">
                 <div class="advertisement"><a href="/promo">promo</a></div>
                 <p style="color:red">Read <a href="/reports/7">the report</a></p>
                 <div><div class="advertisement">inner ad</div><span style="font-weight:bold">kept</span></div>
                 <a href="/archive">archive</a>
               </div>"#,
        );
        let segments = collect(&html).await;

        assert_eq!(segments.len(), 1);
        let joined = segments[0].fragments.join("\n");
        assert!(!joined.contains("promo"));
        assert!(!joined.contains("inner ad"));
        assert!(!joined.contains("style="));
        assert!(joined.contains(r#"href="https://www.drishtiias.com/reports/7""#));
        assert!(joined.contains(r#"href="https://www.drishtiias.com/archive""#));
        assert!(joined.contains("kept"));
    }

    #[tokio::test]
    async fn test_empty_blocks_are_skipped() {
        let html = page(&format!(
            r#"<div class="article-detail"><script>x()</script></div>{}"#,
            block("Kept", 0, "<p>k</p>")
        ));
        let segments = collect(&html).await;

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].index, 1);
    }

    #[tokio::test]
    async fn test_score_without_filled_stars_is_zero() {
        let html = page(&block("Calm", 0, "<p>c</p>"));
        let segments = collect(&html).await;
        assert_eq!(segments[0].rank_score, 0);
    }
}
