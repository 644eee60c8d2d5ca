//! In-place rewriting of article subtrees for standalone viewing.
//!
//! [`Rewriter::rewrite`] walks a subtree post-order. For each element it
//! drops skipped subtrees, then after the children are done it normalizes
//! rating widgets, strips inline styles, turns video embeds into links,
//! absolutizes hrefs, collapses wrappers around a lone image and finally
//! downloads the image the element points at, if it is one.
//!
//! Running the rewriter a second time over its own output changes nothing.
//! Canonical rating markers are never treated as star sources, and local
//! image paths are not downloaded again.
//!
//! None of the steps can abort the walk. A failed download is logged,
//! recorded in [`Rewriter::into_failures`] and the original `src` is kept.

use super::classify::{NodeClass, classify};
use crate::assets::{AssetDownloader, ImageCounters, Transport};
use crate::dom::{Document, NodeId};
use crate::error::ProfileError;
use crate::models::FailedAsset;
use crate::profile::SiteProfile;
use crate::utils::truncate_for_log;
use tracing::{debug, warn};
use url::Url;

const PRESERVED_HREF_PREFIXES: [&str; 5] = ["http://", "https://", "#", "mailto:", "tel:"];

const FILLED_GLYPH: &str = "★";
const EMPTY_GLYPH: &str = "☆";

/// Absolute form of `href`, or `None` when it should stay as is.
///
/// Hrefs that are empty or already start with `http://`, `https://`, `#`,
/// `mailto:` or `tel:` are kept. Protocol-relative ones get `https:`;
/// everything else is resolved against `site`.
pub fn absolutize_href(href: &str, site: &Url) -> Option<String> {
    if href.is_empty() || PRESERVED_HREF_PREFIXES.iter().any(|p| href.starts_with(p)) {
        return None;
    }
    if href.starts_with("//") {
        return Some(format!("https:{href}"));
    }
    site.join(href)
        .ok()
        .map(|url| url.to_string())
        .filter(|absolute| absolute != href)
}

/// Absolute URL to download for an image `src`, or `None` for `data:` URIs
/// and empty sources.
pub fn remote_image_url(src: &str, site: &Url) -> Option<String> {
    let src = src.trim();
    if src.is_empty() || src.starts_with("data:") {
        return None;
    }
    if src.starts_with("http://") || src.starts_with("https://") {
        return Some(src.to_string());
    }
    site.join(src).ok().map(|url| url.to_string())
}

/// Rewrites article subtrees for one extraction run.
pub struct Rewriter<'a, T> {
    profile: &'a SiteProfile,
    site: Url,
    assets: &'a AssetDownloader<T>,
    counters: ImageCounters,
    failures: Vec<FailedAsset>,
}

impl<'a, T: Transport> Rewriter<'a, T> {
    pub fn new(profile: &'a SiteProfile, assets: &'a AssetDownloader<T>) -> Result<Self, ProfileError> {
        Ok(Self {
            profile,
            site: profile.site_url()?,
            assets,
            counters: ImageCounters::default(),
            failures: Vec::new(),
        })
    }

    pub fn profile(&self) -> &SiteProfile {
        self.profile
    }

    /// Images that could not be localized.
    pub fn into_failures(self) -> Vec<FailedAsset> {
        self.failures
    }

    /// Rewrite the subtree rooted at `id`, which belongs to article `article`.
    pub async fn rewrite(&mut self, doc: &mut Document, id: NodeId, article: usize) {
        let class = match doc.element(id) {
            Some(element) => classify(element, self.profile),
            None => return,
        };
        if class == NodeClass::Skip {
            debug!(article, tag = doc.tag(id).unwrap_or_default(), "Dropping skipped subtree");
            doc.detach(id);
            return;
        }

        let snapshot = doc.children(id).to_vec();
        for child in snapshot {
            if doc.parent(child) == Some(id) && doc.element(child).is_some() {
                Box::pin(self.rewrite(doc, child, article)).await;
            }
        }

        if class == NodeClass::RatingWidget {
            self.normalize_rating(doc, id);
        }
        self.strip_style(doc, id);

        if class == NodeClass::VideoEmbed && self.profile.video_embeds_as_links {
            self.replace_video(doc, id, article);
            return;
        }
        normalize_frame_source(doc, id);
        self.absolutize_links(doc, id);

        if unwrap_lone_image(doc, id) {
            return;
        }
        self.localize_image(doc, id, article).await;
    }

    fn normalize_rating(&self, doc: &mut Document, id: NodeId) {
        let profile = self.profile;
        let stars: Vec<bool> = doc
            .find_all(id, |el| {
                el.is("span")
                    && !el.has_class(&profile.filled_class)
                    && !el.has_class(&profile.empty_class)
                    && el.classes().any(|c| c.contains(&profile.star_marker))
            })
            .into_iter()
            .map(|star| {
                doc.element(star)
                    .is_some_and(|el| el.has_class(&profile.checked_class))
            })
            .collect();
        if stars.is_empty() {
            return;
        }

        doc.clear_children(id);
        for &filled in &stars {
            let (class, glyph) = if filled {
                (&profile.filled_class, FILLED_GLYPH)
            } else {
                (&profile.empty_class, EMPTY_GLYPH)
            };
            let marker = doc.create_element("span", vec![("class".to_string(), class.clone())]);
            let text = doc.create_text(glyph);
            doc.append(marker, text);
            doc.append(id, marker);
            let gap = doc.create_text(" ");
            doc.append(id, gap);
        }
        debug!(
            stars = stars.len(),
            filled = stars.iter().filter(|&&f| f).count(),
            "Normalized rating widget"
        );
    }

    fn strip_style(&self, doc: &mut Document, id: NodeId) {
        let Some(el) = doc.element_mut(id) else {
            return;
        };
        if el.attr("style").is_none() {
            return;
        }
        if self.profile.keeps_style(&el.name, el.classes(), el.attr("id")) {
            return;
        }
        el.remove_attr("style");
    }

    fn replace_video(&self, doc: &mut Document, id: NodeId, article: usize) {
        let src = doc
            .element(id)
            .and_then(|el| el.attr("src"))
            .unwrap_or_default()
            .to_string();
        let link = absolutize_href(&src, &self.site).unwrap_or(src);

        let paragraph = doc.create_element("p", Vec::new());
        let lead = doc.create_text(format!("[{}: ", self.profile.video_link_label));
        let anchor = doc.create_element(
            "a",
            vec![
                ("href".to_string(), link.clone()),
                ("target".to_string(), "_blank".to_string()),
            ],
        );
        let label = doc.create_text(link.clone());
        let close = doc.create_text("]");
        doc.append(anchor, label);
        doc.append(paragraph, lead);
        doc.append(paragraph, anchor);
        doc.append(paragraph, close);

        if doc.replace(id, paragraph) {
            debug!(article, url = %link, "Replaced video embed with link");
        }
    }

    fn absolutize_links(&self, doc: &mut Document, id: NodeId) {
        let mut anchors = doc.find_all(id, |el| el.is("a"));
        anchors.insert(0, id);
        for anchor in anchors {
            let Some(el) = doc.element_mut(anchor) else {
                continue;
            };
            if !el.is("a") {
                continue;
            }
            let Some(href) = el.attr("href") else {
                continue;
            };
            if let Some(absolute) = absolutize_href(href, &self.site) {
                el.set_attr("href", absolute);
            }
        }
    }

    async fn localize_image(&mut self, doc: &mut Document, id: NodeId, article: usize) {
        let Some(src) = doc
            .element(id)
            .filter(|el| el.is("img"))
            .and_then(|el| el.attr("src"))
            .map(str::to_string)
        else {
            return;
        };
        if self.assets.is_local(&src) {
            return;
        }
        let Some(remote) = remote_image_url(&src, &self.site) else {
            return;
        };

        let sequence = self.counters.next(article);
        match self.assets.fetch_asset(&remote, article, sequence).await {
            Ok(local) => {
                if let Some(el) = doc.element_mut(id) {
                    el.set_attr("src", local);
                }
            }
            Err(e) => {
                warn!(
                    article,
                    sequence,
                    url = %truncate_for_log(&remote, 200),
                    error = %e,
                    "Image download failed; keeping remote source"
                );
                self.failures.push(FailedAsset {
                    article,
                    url: remote,
                    reason: e.to_string(),
                });
            }
        }
    }
}

/// Give protocol-relative iframe sources an explicit `https:` scheme.
fn normalize_frame_source(doc: &mut Document, id: NodeId) {
    let Some(el) = doc.element_mut(id) else {
        return;
    };
    if !el.is("iframe") {
        return;
    }
    let Some(rest) = el
        .attr("src")
        .and_then(|src| src.strip_prefix("//"))
        .map(str::to_string)
    else {
        return;
    };
    el.set_attr("src", format!("https://{rest}"));
}

/// Replace `id` with its only child when that child is an `img` and there is
/// no direct text beside it.
fn unwrap_lone_image(doc: &mut Document, id: NodeId) -> bool {
    let elements: Vec<NodeId> = doc.element_children(id).collect();
    let [only] = elements[..] else {
        return false;
    };
    if doc.tag(only) != Some("img") || !doc.direct_text(id).trim().is_empty() {
        return false;
    }
    doc.replace(id, only)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::testing::StaticTransport;
    use crate::dom::serialize::{prettify, to_html};
    use tempfile::TempDir;

    const SITE: &str = "https://www.drishtiias.com";

    struct Harness {
        dir: TempDir,
        profile: SiteProfile,
        assets: AssetDownloader<StaticTransport>,
    }

    fn harness(transport: StaticTransport) -> Harness {
        harness_with(transport, SiteProfile::default())
    }

    fn harness_with(transport: StaticTransport, profile: SiteProfile) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let assets = AssetDownloader::new(transport, dir.path(), "../Output Images");
        Harness {
            dir,
            profile,
            assets,
        }
    }

    fn target(doc: &Document) -> NodeId {
        doc.find_descendant(doc.root(), |el| el.attr("id") == Some("t"))
            .expect("element with id t")
    }

    async fn rewrite_html(h: &Harness, html: &str) -> (Document, NodeId, Vec<FailedAsset>) {
        let mut doc = Document::parse(html);
        let t = target(&doc);
        let mut rewriter = Rewriter::new(&h.profile, &h.assets).unwrap();
        rewriter.rewrite(&mut doc, t, 0).await;
        (doc, t, rewriter.into_failures())
    }

    #[test]
    fn test_absolutize_href_table() {
        let site = Url::parse(SITE).unwrap();
        assert_eq!(
            absolutize_href("/page", &site).as_deref(),
            Some("https://www.drishtiias.com/page")
        );
        assert_eq!(
            absolutize_href("//cdn.example.com/x", &site).as_deref(),
            Some("https://cdn.example.com/x")
        );
        assert_eq!(absolutize_href("https://already.abs", &site), None);
        assert_eq!(absolutize_href("#anchor", &site), None);
        assert_eq!(absolutize_href("mailto:desk@example.com", &site), None);
        assert_eq!(absolutize_href("tel:+911234", &site), None);
        assert_eq!(absolutize_href("", &site), None);
        assert_eq!(
            absolutize_href("daily-updates/x", &site).as_deref(),
            Some("https://www.drishtiias.com/daily-updates/x")
        );
    }

    #[test]
    fn test_remote_image_url() {
        let site = Url::parse(SITE).unwrap();
        assert_eq!(
            remote_image_url("/img/a.png", &site).as_deref(),
            Some("https://www.drishtiias.com/img/a.png")
        );
        assert_eq!(
            remote_image_url("//cdn.example.com/a.png", &site).as_deref(),
            Some("https://cdn.example.com/a.png")
        );
        assert_eq!(
            remote_image_url("http://x.com/a.png", &site).as_deref(),
            Some("http://x.com/a.png")
        );
        assert_eq!(remote_image_url("data:image/png;base64,AAAA", &site), None);
        assert_eq!(remote_image_url("  ", &site), None);
    }

    #[tokio::test]
    async fn test_skipped_subtrees_are_removed_without_downloads() {
        let h = harness(StaticTransport::new());
        let (doc, t, failures) = rewrite_html(
            &h,
            r#"<div id="t"><p>keep</p><aside><img src="/a.png"></aside>
               <div class="box advertisement"><p><img src="/b.png"></p></div>
               <script>track()</script><nav><a href="/x">x</a></nav></div>"#,
        )
        .await;

        let out = prettify(&doc, t);
        assert!(out.contains("keep"));
        for gone in ["aside", "advertisement", "script", "track()", "nav", "/a.png", "/b.png"] {
            assert!(!out.contains(gone), "{gone} survived: {out}");
        }
        assert!(h.assets.transport().requests().is_empty());
        assert!(failures.is_empty());
    }

    #[tokio::test]
    async fn test_links_are_absolutized_inside_subtree() {
        let h = harness(StaticTransport::new());
        let mut doc = Document::parse(
            r#"<div id="t"><p><a href="/daily">d</a> and <span><a href="//cdn.example.com/f.pdf">f</a></span></p>
               <a href="mailto:desk@example.com">mail</a></div>
               <p><a id="other" href="relative">r</a></p>"#,
        );
        let t = target(&doc);
        let mut rewriter = Rewriter::new(&h.profile, &h.assets).unwrap();
        rewriter.rewrite(&mut doc, t, 0).await;

        let hrefs: Vec<String> = doc
            .find_all(doc.root(), |el| el.is("a"))
            .into_iter()
            .filter_map(|a| doc.element(a).and_then(|el| el.attr("href")).map(str::to_string))
            .collect();
        assert_eq!(
            hrefs,
            vec![
                "https://www.drishtiias.com/daily".to_string(),
                "https://cdn.example.com/f.pdf".to_string(),
                "mailto:desk@example.com".to_string(),
                "relative".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_anchor_root_is_absolutized() {
        let h = harness(StaticTransport::new());
        let (doc, t, _) = rewrite_html(&h, r#"<p><a id="t" href="/x"><span>y</span></a></p>"#).await;
        assert_eq!(
            doc.element(t).and_then(|el| el.attr("href")),
            Some("https://www.drishtiias.com/x")
        );
    }

    #[tokio::test]
    async fn test_rating_widget_is_normalized() {
        let h = harness(StaticTransport::new());
        let (doc, t, _) = rewrite_html(
            &h,
            r#"<div id="t"><div class="starRating">
                 <span class="fa fa-star checked"></span><span class="fa fa-star checked"></span>
                 <span class="fa fa-star checked"></span><span class="fa fa-star"></span>
                 <span class="fa fa-star"></span><!-- rating --></div></div>"#,
        )
        .await;

        let widget = doc
            .find_descendant(t, |el| el.has_class("starRating"))
            .unwrap();
        assert_eq!(doc.children(widget).len(), 10);
        let filled = doc.find_all(widget, |el| el.has_class("star-checked"));
        let empty = doc.find_all(widget, |el| el.has_class("star-unchecked"));
        assert_eq!(filled.len(), 3);
        assert_eq!(empty.len(), 2);
        assert_eq!(doc.text_content(widget), "★ ★ ★ ☆ ☆ ");
    }

    #[tokio::test]
    async fn test_rating_widget_without_stars_is_untouched() {
        let h = harness(StaticTransport::new());
        let (doc, t, _) = rewrite_html(
            &h,
            r#"<div id="t"><div class="starRating"><em>unrated</em></div></div>"#,
        )
        .await;
        assert!(prettify(&doc, t).contains("unrated"));
    }

    #[tokio::test]
    async fn test_styles_stripped_unless_allowed() {
        let profile = SiteProfile {
            keep_style_ids: vec!["chart".to_string()],
            ..SiteProfile::default()
        };
        let h = harness_with(StaticTransport::new(), profile);
        let (doc, t, _) = rewrite_html(
            &h,
            r#"<div id="t" style="margin:0"><p style="color:red">a</p>
               <div id="chart" style="width:50%">b</div></div>"#,
        )
        .await;

        let out = to_html(&doc, t);
        assert!(!out.contains("margin:0"));
        assert!(!out.contains("color:red"));
        assert!(out.contains("width:50%"));
    }

    #[tokio::test]
    async fn test_video_embed_becomes_link() {
        let h = harness(StaticTransport::new());
        let (doc, t, _) = rewrite_html(
            &h,
            r#"<div id="t"><p>Intro</p><iframe src="//www.youtube.com/embed/abc123" style="border:0"></iframe></div>"#,
        )
        .await;

        let out = to_html(&doc, t);
        assert!(!out.contains("<iframe"));
        assert!(out.contains(
            r#"<p>[Watch Video on YouTube: <a href="https://www.youtube.com/embed/abc123" target="_blank">https://www.youtube.com/embed/abc123</a>]</p>"#
        ));
    }

    #[tokio::test]
    async fn test_video_conversion_can_be_disabled() {
        let profile = SiteProfile {
            video_embeds_as_links: false,
            ..SiteProfile::default()
        };
        let h = harness_with(StaticTransport::new(), profile);
        let (doc, t, _) = rewrite_html(
            &h,
            r#"<div id="t"><iframe src="//www.youtube.com/embed/abc123"></iframe></div>"#,
        )
        .await;
        assert!(to_html(&doc, t).contains(r#"<iframe src="https://www.youtube.com/embed/abc123">"#));
    }

    #[tokio::test]
    async fn test_other_protocol_relative_frames_get_https() {
        let h = harness(StaticTransport::new());
        let (doc, t, _) = rewrite_html(
            &h,
            r#"<div id="t"><iframe src="//maps.example.com/embed?q=1"></iframe><p>x</p></div>"#,
        )
        .await;
        assert!(to_html(&doc, t).contains(r#"src="https://maps.example.com/embed?q=1""#));
    }

    #[tokio::test]
    async fn test_lone_image_wrappers_collapse_recursively() {
        let transport = StaticTransport::new().with("https://x.com/a.png", b"A");
        let h = harness(transport);
        let (doc, t, _) = rewrite_html(
            &h,
            r#"<section id="t"><div> <p><span><img src="https://x.com/a.png"></span></p> </div><p>caption</p></section>"#,
        )
        .await;

        let first = doc.element_children(t).next().unwrap();
        assert_eq!(doc.tag(first), Some("img"));
        assert_eq!(
            doc.element(first).and_then(|el| el.attr("src")),
            Some("../Output Images/article_0_img_1.png")
        );
    }

    #[test]
    fn test_unwrap_needs_exactly_one_image_child() {
        let mut doc = Document::parse(r#"<div id="one"><img src="a.png"></div><div id="two"><img src="a.png"><img src="b.png"></div>"#);
        let by_id = |doc: &Document, id: &str| {
            doc.find_descendant(doc.root(), |el| el.attr("id") == Some(id)).unwrap()
        };
        let one = by_id(&doc, "one");
        let two = by_id(&doc, "two");

        assert!(unwrap_lone_image(&mut doc, one));
        assert!(!doc.is_attached(one));
        assert!(!unwrap_lone_image(&mut doc, two));
        assert_eq!(doc.element_children(two).count(), 2);
    }

    #[tokio::test]
    async fn test_wrapper_with_text_is_kept() {
        let h = harness(StaticTransport::new().with("https://x.com/a.png", b"A"));
        let (doc, t, _) = rewrite_html(
            &h,
            r#"<div id="t"><p>Figure 1 <img src="https://x.com/a.png"></p><p>more</p></div>"#,
        )
        .await;
        let first = doc.element_children(t).next().unwrap();
        assert_eq!(doc.tag(first), Some("p"));
    }

    #[tokio::test]
    async fn test_images_are_localized_in_sequence() {
        let transport = StaticTransport::new()
            .with("https://www.drishtiias.com/images/a.png", b"A")
            .with("https://cdn.example.com/b?format=gif", b"B");
        let h = harness(transport);
        let (doc, t, failures) = rewrite_html(
            &h,
            r#"<div id="t"><p>one <img src="/images/a.png"></p><p>two <img src="//cdn.example.com/b?format=gif"></p></div>"#,
        )
        .await;

        let out = to_html(&doc, t);
        assert!(out.contains(r#"src="../Output Images/article_0_img_1.png""#));
        assert!(out.contains(r#"src="../Output Images/article_0_img_2.gif""#));
        assert!(failures.is_empty());
        assert!(h.dir.path().join("article_0_img_1.png").exists());
        assert!(h.dir.path().join("article_0_img_2.gif").exists());
    }

    #[tokio::test]
    async fn test_failed_download_keeps_source_and_continues() {
        let transport = StaticTransport::new().with("https://x.com/ok.png", b"OK");
        let h = harness(transport);
        let (doc, t, failures) = rewrite_html(
            &h,
            r#"<div id="t"><p>a <img src="https://x.com/missing.png"></p><p>b <img src="https://x.com/ok.png"></p></div>"#,
        )
        .await;

        let out = to_html(&doc, t);
        assert!(out.contains(r#"src="https://x.com/missing.png""#));
        assert!(out.contains(r#"src="../Output Images/article_0_img_2.png""#));
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].url, "https://x.com/missing.png");
        assert_eq!(failures[0].article, 0);
    }

    #[tokio::test]
    async fn test_data_uri_images_are_not_downloaded() {
        let h = harness(StaticTransport::new());
        let (doc, t, failures) = rewrite_html(
            &h,
            r#"<div id="t"><p>x <img src="data:image/gif;base64,R0lGOD"></p></div>"#,
        )
        .await;
        assert!(to_html(&doc, t).contains("data:image/gif"));
        assert!(h.assets.transport().requests().is_empty());
        assert!(failures.is_empty());
    }

    #[tokio::test]
    async fn test_rewriting_is_idempotent() {
        let transport = StaticTransport::new().with("https://www.drishtiias.com/img/a.jpg", b"A");
        let h = harness(transport);
        let mut doc = Document::parse(
            r##"<div id="t" style="x:y"><h2 style="color:red">Title <a href="/more">more</a></h2>
               <div class="starRating"><span class="fa fa-star checked"></span><span class="fa fa-star"></span></div>
               <p><img src="/img/a.jpg"></p>
               <iframe src="//www.youtube.com/embed/v1"></iframe>
               <div class="hidden">secret</div>
               <p>see <a href="#notes">notes</a> or <a href="//cdn.example.com/x">cdn</a></p></div>"##,
        );
        let t = target(&doc);

        let mut rewriter = Rewriter::new(&h.profile, &h.assets).unwrap();
        rewriter.rewrite(&mut doc, t, 4).await;
        let first = prettify(&doc, t);
        let requests_after_first = h.assets.transport().requests().len();

        let mut again = Rewriter::new(&h.profile, &h.assets).unwrap();
        again.rewrite(&mut doc, t, 4).await;
        let second = prettify(&doc, t);

        assert_eq!(first, second);
        assert_eq!(h.assets.transport().requests().len(), requests_after_first);
        assert!(first.contains("../Output Images/article_4_img_1.jpg"));
    }
}
