//! Site profile: everything the pipeline knows about the scraped site.
//!
//! The defaults describe the daily news-analysis pages this tool was built
//! for. A YAML file passed with `--profile` can override any subset of the
//! fields; missing fields keep their defaults.
//!
//! ```yaml
//! base_url: https://www.drishtiias.com
//! keep_style_tags: [table]
//! skip_classes: [advertisement, hidden]
//! ```

use crate::error::ProfileError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument};
use url::Url;

/// Selectors, markers and allow-lists for one site.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteProfile {
    /// Origin used to resolve relative links and image sources.
    pub base_url: String,
    /// Path of the daily listing, joined with the `DD-MM-YYYY` date.
    pub daily_path: String,
    /// Class of the `div` holding the day's listing.
    pub listing_class: String,
    /// Tag of the single wrapper directly under the listing.
    pub wrapper_tag: String,
    /// Class of each per-article block.
    pub article_class: String,
    /// Tag of the per-article heading (direct child of the block).
    pub heading_tag: String,

    /// Tags whose subtrees are discarded.
    pub skip_tags: Vec<String>,
    /// Class tokens whose subtrees are discarded.
    pub skip_classes: Vec<String>,

    /// Tags allowed to keep their inline `style`.
    pub keep_style_tags: Vec<String>,
    /// Class tokens allowed to keep their inline `style`.
    pub keep_style_classes: Vec<String>,
    /// Ids allowed to keep their inline `style`.
    pub keep_style_ids: Vec<String>,

    /// Class of the rating widget container.
    pub rating_class: String,
    /// Substring identifying a star inside the rating widget.
    pub star_marker: String,
    /// Class marking a star as selected in the source markup.
    pub checked_class: String,
    /// Class given to canonical filled markers.
    pub filled_class: String,
    /// Class given to canonical empty markers.
    pub empty_class: String,

    /// Substring of an iframe `src` identifying a video embed.
    pub video_marker: String,
    /// Replace recognised video embeds with a plain link.
    pub video_embeds_as_links: bool,
    /// Label shown before the video link.
    pub video_link_label: String,

    /// Attribution line printed under the document heading.
    pub credit: String,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            base_url: "https://www.drishtiias.com".to_string(),
            daily_path: "/current-affairs-news-analysis-editorials/news-analysis/".to_string(),
            listing_class: "list-category".to_string(),
            wrapper_tag: "article".to_string(),
            article_class: "article-detail".to_string(),
            heading_tag: "h1".to_string(),
            skip_tags: strings(&[
                "script", "style", "form", "nav", "footer", "aside", "noscript", "ins",
            ]),
            skip_classes: strings(&[
                "banner-static",
                "next-post",
                "tags-new",
                "mobile-ad-banner",
                "desktop-ad-banner",
                "advertisement",
                "social-shares",
                "comments-section",
                "hidden",
                "no-print",
                "adsbygoogle",
                "a2a_kit",
            ]),
            keep_style_tags: Vec::new(),
            keep_style_classes: Vec::new(),
            keep_style_ids: Vec::new(),
            rating_class: "starRating".to_string(),
            star_marker: "fa-star".to_string(),
            checked_class: "checked".to_string(),
            filled_class: "star-checked".to_string(),
            empty_class: "star-unchecked".to_string(),
            video_marker: "youtube.com/embed/".to_string(),
            video_embeds_as_links: true,
            video_link_label: "Watch Video on YouTube".to_string(),
            credit: "Drishti IAS".to_string(),
        }
    }
}

impl SiteProfile {
    /// Load a profile from a YAML file and validate it.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, ProfileError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let profile = Self::from_yaml(&raw)?;
        info!(base_url = %profile.base_url, "Loaded site profile");
        Ok(profile)
    }

    /// Parse and validate a YAML profile.
    pub fn from_yaml(raw: &str) -> Result<Self, ProfileError> {
        let profile: SiteProfile = serde_yaml::from_str(raw)?;
        profile.site_url()?;
        Ok(profile)
    }

    /// The parsed base URL.
    pub fn site_url(&self) -> Result<Url, ProfileError> {
        Url::parse(&self.base_url).map_err(|source| ProfileError::BaseUrl {
            url: self.base_url.clone(),
            source,
        })
    }

    /// Whether an element with this tag, class list and id keeps its `style`.
    pub fn keeps_style<'a>(
        &self,
        tag: &str,
        mut classes: impl Iterator<Item = &'a str>,
        id: Option<&str>,
    ) -> bool {
        self.keep_style_tags.iter().any(|t| t == tag)
            || classes.any(|c| self.keep_style_classes.iter().any(|k| k == c))
            || id.is_some_and(|id| self.keep_style_ids.iter().any(|k| k == id))
    }
}
