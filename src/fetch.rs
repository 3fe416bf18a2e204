use anyhow::{Context, anyhow};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub fn build_client(timeout: Duration) -> anyhow::Result<Client> {
    let client = Client::builder()
        // Avoid macOS system proxy lookup that can panic in sandboxed contexts.
        .no_proxy()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// Downloads source documents, retrying transient failures.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    attempts: u32,
    backoff: Duration,
}

impl Fetcher {
    pub fn new(client: Client, attempts: u32) -> Self {
        Self {
            client,
            attempts: attempts.max(1),
            backoff: Duration::from_millis(500),
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub async fn fetch_bytes(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        let mut last_err = None;
        for attempt in 1..=self.attempts {
            match self.client.get(url).send().await {
                Ok(resp) if resp.status().is_server_error() => {
                    last_err = Some(anyhow!("{url} returned {}", resp.status()));
                }
                Ok(resp) => {
                    let resp = resp
                        .error_for_status()
                        .with_context(|| format!("fetching {url}"))?;
                    let bytes = resp.bytes().await?;
                    debug!(url, bytes = bytes.len(), attempt, "fetched");
                    return Ok(bytes.to_vec());
                }
                Err(err) if err.is_timeout() || err.is_connect() => {
                    last_err = Some(anyhow::Error::new(err).context(format!("fetching {url}")));
                }
                Err(err) => {
                    return Err(anyhow::Error::new(err).context(format!("fetching {url}")));
                }
            }

            if attempt < self.attempts {
                warn!(url, attempt, "transient fetch failure, retrying");
                tokio::time::sleep(self.backoff * attempt).await;
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow!("no fetch attempt made for {url}")))
    }
}
