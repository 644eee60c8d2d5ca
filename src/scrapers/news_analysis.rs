//! Daily news-analysis page fetcher.
//!
//! # URL Pattern
//!
//! The page for a given day lives under the profile's daily path with the
//! date appended, e.g.
//! `https://www.drishtiias.com/current-affairs-news-analysis-editorials/news-analysis/07-03-2025`.

use crate::error::{FetchError, ProfileError};
use crate::profile::SiteProfile;
use crate::utils::date_stamp;
use chrono::NaiveDate;
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

/// Desktop browser user agent sent with the page request.
pub const PAGE_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Timeout for the page request.
pub const PAGE_TIMEOUT: Duration = Duration::from_secs(15);

/// URL of the listing page for `date`.
pub fn daily_url(profile: &SiteProfile, date: NaiveDate) -> Result<Url, ProfileError> {
    let site = profile.site_url()?;
    let mut path = profile.daily_path.clone();
    if !path.ends_with('/') {
        path.push('/');
    }
    path.push_str(&date_stamp(date));
    site.join(&path).map_err(|source| ProfileError::BaseUrl {
        url: format!("{}{}", profile.base_url, path),
        source,
    })
}

/// Fetch the raw bytes of the page at `url`.
///
/// Sends a browser User-Agent and gives up after [`PAGE_TIMEOUT`].
///
/// # Arguments
///
/// * `url` - Absolute URL of the daily page
///
/// # Returns
///
/// The response body, undecoded.
///
/// # Errors
///
/// Returns a [`FetchError`] on any transport failure or non-success status.
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn fetch_page(url: &str) -> Result<Vec<u8>, FetchError> {
    let request_error = |source| FetchError::Request {
        url: url.to_string(),
        source,
    };

    let client = reqwest::Client::builder()
        .user_agent(PAGE_USER_AGENT)
        .timeout(PAGE_TIMEOUT)
        .build()
        .map_err(request_error)?;

    let response = client.get(url).send().await.map_err(request_error)?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.bytes().await.map_err(request_error)?;
    info!(bytes = body.len(), "Fetched daily page");
    Ok(body.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_url() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        let url = daily_url(&SiteProfile::default(), date).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.drishtiias.com/current-affairs-news-analysis-editorials/news-analysis/07-03-2025"
        );
    }

    #[test]
    fn test_daily_url_adds_missing_slash() {
        let profile = SiteProfile {
            base_url: "https://example.com".to_string(),
            daily_path: "/daily".to_string(),
            ..SiteProfile::default()
        };
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let url = daily_url(&profile, date).unwrap();
        assert_eq!(url.as_str(), "https://example.com/daily/31-12-2024");
    }

    #[tokio::test]
    async fn test_fetch_page_rejects_invalid_url() {
        let err = fetch_page("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::Request { .. }));
    }
}
