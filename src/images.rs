use crate::cache::{DEFAULT_CAPACITY, LookupCache};
use anyhow::anyhow;
use regex::Regex;
use reqwest::header::REFERER;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_IMAGE_SEARCH_URL: &str = "https://duckduckgo.com";

static VQD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"vqd=["']([^"']+)["']"#).unwrap());

#[derive(Deserialize)]
struct ImageResults {
    #[serde(default)]
    results: Vec<ImageHit>,
}

#[derive(Deserialize)]
struct ImageHit {
    #[serde(default)]
    image: String,
}

/// Looks up a representative photo for a dish.
pub struct ImageSearch {
    client: Client,
    base_url: String,
    cache: LookupCache,
}

impl ImageSearch {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            cache: LookupCache::default(),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = LookupCache::new(ttl, DEFAULT_CAPACITY);
        self
    }

    /// Image URL for `query`, a placeholder when the search finds nothing, "" for an empty query.
    pub async fn search_image(&self, query: &str) -> String {
        if query.is_empty() {
            return String::new();
        }
        if let Some(hit) = self.cache.get(query) {
            return hit;
        }

        let search_query = format!("{query} Gericht Essen");
        match self.search_duckduckgo(&search_query).await {
            Ok(Some(url)) => {
                debug!(query, %url, "found dish image");
                self.cache.insert(query, &url);
                url
            }
            Ok(None) => placeholder_image(query),
            Err(err) => {
                warn!(query, "image search failed: {err:#}");
                placeholder_image(query)
            }
        }
    }

    pub async fn search_images_batch(&self, queries: &[String]) -> HashMap<String, String> {
        let mut out = HashMap::with_capacity(queries.len());
        for query in queries {
            let url = self.search_image(query).await;
            out.insert(query.clone(), url);
        }
        out
    }

    async fn search_duckduckgo(&self, query: &str) -> anyhow::Result<Option<String>> {
        let base = self.base_url.trim_end_matches('/');
        let page_url = Url::parse_with_params(
            &format!("{base}/"),
            &[("q", query), ("iax", "images"), ("ia", "images")],
        )?;
        let page = self.client.get(page_url).send().await?.text().await?;
        let Some(vqd) = extract_vqd(&page) else {
            debug!(query, "no vqd token in search page");
            return Ok(None);
        };

        let api_url = Url::parse_with_params(
            &format!("{base}/i.js"),
            &[("q", query), ("vqd", vqd.as_str()), ("o", "json")],
        )?;
        let resp = self
            .client
            .get(api_url)
            .header(REFERER, format!("{base}/"))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(anyhow!("image API returned {}", resp.status()));
        }
        let results: ImageResults = resp.json().await?;
        Ok(results
            .results
            .into_iter()
            .map(|hit| hit.image)
            .find(|image| !image.is_empty()))
    }
}

pub fn extract_vqd(page: &str) -> Option<String> {
    VQD.captures(page).map(|caps| caps[1].to_string())
}

pub fn placeholder_image(query: &str) -> String {
    format!(
        "https://source.unsplash.com/300x200/?{},food",
        urlencoding::encode(query)
    )
}
