//! WebProvider trait definition.
//!
//! The external search/fetch API the web tools resolve against.
//! Implementations (e.g., `OllamaWebClient`) live in groupmind-infra.

use std::future::Future;
use std::pin::Pin;

use groupmind_types::error::WebProviderError;
use groupmind_types::tool::{FetchedPage, SearchHit};

/// Trait for a credential-keyed web search/fetch backend.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait WebProvider: Send + Sync {
    /// Whether credentials are present. Unconfigured providers are never called.
    fn is_configured(&self) -> bool;

    /// Search the web, returning at most `max_results` hits in provider order.
    fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> impl Future<Output = Result<Vec<SearchHit>, WebProviderError>> + Send;

    /// Fetch a single page.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedPage, WebProviderError>> + Send;
}

/// Object-safe version of [`WebProvider`] with boxed futures.
pub trait WebProviderDyn: Send + Sync {
    fn is_configured_dyn(&self) -> bool;

    fn search_boxed<'a>(
        &'a self,
        query: &'a str,
        max_results: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SearchHit>, WebProviderError>> + Send + 'a>>;

    fn fetch_boxed<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<FetchedPage, WebProviderError>> + Send + 'a>>;
}

impl<T: WebProvider> WebProviderDyn for T {
    fn is_configured_dyn(&self) -> bool {
        self.is_configured()
    }

    fn search_boxed<'a>(
        &'a self,
        query: &'a str,
        max_results: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SearchHit>, WebProviderError>> + Send + 'a>> {
        Box::pin(self.search(query, max_results))
    }

    fn fetch_boxed<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<FetchedPage, WebProviderError>> + Send + 'a>> {
        Box::pin(self.fetch(url))
    }
}

/// Type-erased web provider.
pub struct BoxWebProvider {
    inner: Box<dyn WebProviderDyn + Send + Sync>,
}

impl BoxWebProvider {
    pub fn new<T: WebProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_configured_dyn()
    }

    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, WebProviderError> {
        self.inner.search_boxed(query, max_results).await
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, WebProviderError> {
        self.inner.fetch_boxed(url).await
    }
}
