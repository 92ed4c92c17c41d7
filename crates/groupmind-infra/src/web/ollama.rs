//! Ollama hosted web search and fetch client.
//!
//! `POST {base}/web_search` and `POST {base}/web_fetch`, both authenticated
//! with a bearer key held as a [`SecretString`].

use std::time::Duration;

use groupmind_core::tools::provider::WebProvider;
use groupmind_types::config::WebToolConfig;
use groupmind_types::error::WebProviderError;
use groupmind_types::tool::{FetchedPage, SearchHit};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Serialize)]
struct FetchRequest<'a> {
    url: &'a str,
}

/// Web provider backed by Ollama's hosted API.
///
/// Does NOT derive Debug so the API key can never end up in logs.
pub struct OllamaWebClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl OllamaWebClient {
    pub fn new(config: &WebToolConfig) -> Result<Self, WebProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| WebProviderError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config
                .api_key
                .as_ref()
                .filter(|k| !k.trim().is_empty())
                .map(|k| SecretString::from(k.clone())),
        })
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, WebProviderError> {
        let key = self.api_key.as_ref().ok_or(WebProviderError::Http {
            status: 401,
            message: "missing API key".to_string(),
        })?;

        let response = self
            .client
            .post(format!("{}/{path}", self.base_url))
            .bearer_auth(key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(WebProviderError::Http {
                status: status.as_u16(),
                message,
            });
        }

        response.json().await.map_err(|e| {
            if e.is_timeout() {
                WebProviderError::Timeout
            } else {
                WebProviderError::Malformed(e.to_string())
            }
        })
    }
}

fn transport_error(e: reqwest::Error) -> WebProviderError {
    if e.is_timeout() {
        WebProviderError::Timeout
    } else {
        WebProviderError::Transport(e.to_string())
    }
}

impl WebProvider for OllamaWebClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    #[tracing::instrument(skip(self), fields(web.max_results = max_results))]
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, WebProviderError> {
        let response: SearchResponse = self
            .post("web_search", &SearchRequest { query, max_results })
            .await?;
        let mut hits = response.results;
        hits.truncate(max_results);
        Ok(hits)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<FetchedPage, WebProviderError> {
        self.post("web_fetch", &FetchRequest { url }).await
    }
}
