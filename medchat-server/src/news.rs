//! Headline scraper for the medical news portal.
//!
//! Fetches a page over HTTP, selects anchors with a CSS selector and returns
//! `{ title, link }` pairs with links made absolute. Static HTML only: content
//! rendered client-side by script is not seen.

use std::time::Duration;

use async_trait::async_trait;
use medchat_core::config::ScraperConfig;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

/// Printed when a page yields no items.
pub const NOTHING_FOUND: &str = "未找到推荐内容。";

/// One headline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid CSS selector '{0}'")]
    InvalidSelector(String),

    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("page returned HTTP {0}")]
    Status(u16),
}

/// Anything that can turn a page URL into headlines.
#[async_trait]
pub trait NewsScraper: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<Vec<NewsItem>, ScrapeError>;
}

/// Plain HTTP fetch + CSS selection.
#[derive(Debug, Clone)]
pub struct HtmlNewsScraper {
    http: Client,
    selector: String,
    user_agent: String,
    timeout: Duration,
}

impl HtmlNewsScraper {
    #[must_use]
    pub fn new(selector: impl Into<String>, user_agent: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            http: Client::new(),
            selector: selector.into(),
            user_agent: user_agent.into(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    #[must_use]
    pub fn from_config(config: &ScraperConfig) -> Self {
        Self::new(
            config.selector.clone(),
            config.user_agent.clone(),
            config.request_timeout_ms,
        )
    }

    #[must_use]
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = selector.into();
        self
    }
}

#[async_trait]
impl NewsScraper for HtmlNewsScraper {
    async fn scrape(&self, url: &str) -> Result<Vec<NewsItem>, ScrapeError> {
        let base = Url::parse(url).map_err(|e| ScrapeError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let resp = self
            .http
            .get(base.clone())
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .timeout(self.timeout)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ScrapeError::Status(resp.status().as_u16()));
        }
        let html = resp.text().await?;
        debug!(url, bytes = html.len(), "Fetched page");

        let items = extract_items(&html, &base, &self.selector)?;
        info!(url, count = items.len(), "Scraped headlines");
        Ok(items)
    }
}

/// Select anchors from `html` and resolve their `href` against `base`.
///
/// Anchors without an `href` or without visible text are skipped. Whitespace
/// inside titles is collapsed to single spaces.
///
/// # Errors
/// [`ScrapeError::InvalidSelector`] if `selector` does not parse.
pub fn extract_items(html: &str, base: &Url, selector: &str) -> Result<Vec<NewsItem>, ScrapeError> {
    let sel = Selector::parse(selector).map_err(|_| ScrapeError::InvalidSelector(selector.to_string()))?;
    let document = Html::parse_document(html);

    let items = document
        .select(&sel)
        .filter_map(|el| {
            let href = el.value().attr("href")?;
            let link = base.join(href.trim()).ok()?;
            let title = el.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ");
            (!title.is_empty()).then(|| NewsItem {
                title,
                link: link.to_string(),
            })
        })
        .collect();
    Ok(items)
}

/// Numbered listing for the terminal, or [`NOTHING_FOUND`].
#[must_use]
pub fn format_items(items: &[NewsItem]) -> String {
    if items.is_empty() {
        return NOTHING_FOUND.to_string();
    }
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}\n   链接: {}", i + 1, item.title, item.link))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div class="ArticleList_articleList__3BrcS">
            <a href="/article/1">  春季过敏
                 高发期 </a>
            <a href="https://other.example/2">高血压用药指南</a>
            <a>没有链接</a>
            <a href="/article/4">   </a>
          </div>
          <div class="sidebar"><a href="/ad">广告</a></div>
        </body></html>"#;

    fn base() -> Url {
        Url::parse("https://www.dxy.cn/").expect("url")
    }

    #[test]
    fn extracts_titles_and_absolute_links() {
        let items =
            extract_items(PAGE, &base(), "div.ArticleList_articleList__3BrcS a").expect("extract");
        assert_eq!(
            items,
            vec![
                NewsItem {
                    title: "春季过敏 高发期".into(),
                    link: "https://www.dxy.cn/article/1".into(),
                },
                NewsItem {
                    title: "高血压用药指南".into(),
                    link: "https://other.example/2".into(),
                },
            ]
        );
    }

    #[test]
    fn bad_selector_is_an_error() {
        let err = extract_items(PAGE, &base(), "div[[").expect_err("bad selector");
        assert!(matches!(err, ScrapeError::InvalidSelector(_)));
    }

    #[test]
    fn empty_listing_prints_nothing_found() {
        assert_eq!(format_items(&[]), NOTHING_FOUND);
    }

    #[test]
    fn listing_is_numbered_from_one() {
        let out = format_items(&[
            NewsItem { title: "A".into(), link: "https://x/a".into() },
            NewsItem { title: "B".into(), link: "https://x/b".into() },
        ]);
        assert_eq!(out, "1. A\n   链接: https://x/a\n2. B\n   链接: https://x/b");
    }
}
