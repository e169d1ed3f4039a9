use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::NewsConfig;
use crate::error::NewsError;
use crate::format::time_elapsed;

use super::pager::PAGE_SIZE;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    total_results: u32,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    source: NewsApiSource,
    title: Option<String>,
    url: String,
    url_to_image: Option<String>,
    published_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSource {
    name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsItem {
    pub publication: String,
    pub title: String,
    pub image_url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub url: String,
}

impl NewsItem {
    /// e.g. `"3 hours ago"`
    pub fn age_label(&self, now: DateTime<Utc>) -> String {
        format!("{} ago", time_elapsed(self.published_at, now))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsPage {
    pub page: u32,
    pub total_results: u32,
    pub items: Vec<NewsItem>,
}

/// Client for the newsapi.org `everything` endpoint.
pub struct NewsClient {
    http_client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl NewsClient {
    pub fn new(config: &NewsConfig) -> Result<Self, NewsError> {
        let api_key = config.api_key.clone().ok_or(NewsError::MissingApiKey)?;
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            http_client,
            api_url: config.api_url.clone(),
            api_key,
        })
    }

    /// Fetch one page (1-based) of articles matching `search`, most popular first.
    pub async fn fetch_page(&self, search: &str, page: u32) -> Result<NewsPage, NewsError> {
        debug!("Fetching news page {} for {:?}", page, search);

        let page_str = page.to_string();
        let page_size = PAGE_SIZE.to_string();
        let response = self
            .http_client
            .get(&self.api_url)
            .query(&[
                ("q", search),
                ("sortBy", "popularity"),
                ("page", page_str.as_str()),
                ("language", "en"),
                ("pageSize", page_size.as_str()),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await?;

        // newsapi reports failures in the body with a non-2xx status
        let body: NewsApiResponse = response.json().await?;
        if body.status != "ok" {
            return Err(NewsError::Api {
                code: body.code.unwrap_or_else(|| "unknown".to_string()),
                message: body.message.unwrap_or_default(),
            });
        }

        let items: Vec<NewsItem> = body
            .articles
            .into_iter()
            .map(|a| NewsItem {
                publication: a.source.name.unwrap_or_default(),
                title: a.title.unwrap_or_default(),
                image_url: a.url_to_image,
                published_at: a.published_at,
                url: a.url,
            })
            .collect();

        info!("📰 Fetched {} news items (page {})", items.len(), page);
        Ok(NewsPage {
            page,
            total_results: body.total_results,
            items,
        })
    }
}
