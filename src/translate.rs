use crate::cache::{DEFAULT_CAPACITY, LookupCache};
use anyhow::{Context, anyhow};
use reqwest::{Client, Url};
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_TRANSLATE_URL: &str = "https://translate.google.com";

/// German to English dish translation with an in-process cache.
pub struct Translator {
    client: Client,
    base_url: String,
    cache: LookupCache,
}

impl Translator {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            cache: LookupCache::default(),
        }
    }

    /// Lets cached translations expire with the menus they annotate.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = LookupCache::new(ttl, DEFAULT_CAPACITY);
        self
    }

    /// Never fails: on any error the German text is returned unchanged.
    pub async fn translate(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        if let Some(hit) = self.cache.get(text) {
            return hit;
        }

        match self.request(text).await {
            Ok(translation) => {
                debug!(text, %translation, "translated");
                self.cache.insert(text, &translation);
                translation
            }
            Err(err) => {
                warn!(text, "translation failed: {err:#}");
                text.to_string()
            }
        }
    }

    pub async fn translate_batch(&self, texts: &[String]) -> Vec<String> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.translate(text).await);
        }
        out
    }

    async fn request(&self, text: &str) -> anyhow::Result<String> {
        let endpoint = format!("{}/m", self.base_url.trim_end_matches('/'));
        let url = Url::parse_with_params(
            &endpoint,
            &[("sl", "de"), ("tl", "en"), ("hl", "en"), ("q", text)],
        )?;
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()
            .context("translation endpoint")?
            .text()
            .await?;
        parse_translation(&body)
    }
}

pub fn parse_translation(body: &str) -> anyhow::Result<String> {
    let doc = Html::parse_document(body);
    let selector =
        Selector::parse("div.result-container").map_err(|err| anyhow!("invalid selector: {err}"))?;
    let translation = doc
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>())
        .map(|text| text.trim().to_string())
        .unwrap_or_default();
    if translation.is_empty() {
        return Err(anyhow!("no translation in response"));
    }
    Ok(translation)
}
