//! Web search and fetch tools.
//!
//! `WebToolService` turns provider results into the text the model reads:
//! normalized cache keys, URL dedup, optional reranking, a content budget
//! with a dropped-results note, and explicit "no results" / "unavailable"
//! strings so the model never has to guess. All lengths are counted in
//! characters.

use std::collections::HashSet;
use std::sync::Arc;

use groupmind_observe::genai_attrs::OP_EXECUTE_TOOL;
use groupmind_types::config::WebToolConfig;
use groupmind_types::llm::ToolCall;
use groupmind_types::tool::{SearchHit, ToolError, ToolResult};
use tracing::{Instrument, debug, info_span, warn};

use super::cache::{TtlCache, ttl_from_secs};
use super::invocation::WebToolInvocation;
use super::provider::BoxWebProvider;
use super::rerank::rerank;
use crate::clock::Clock;

const MAX_RESULTS_CAP: usize = 10;
const TRUNCATION_MARKER: &str = "\n[... truncated]";
const SNIPPET_ELLIPSIS: char = '…';
const SEARCH_UNAVAILABLE: &str = "Error: web search is unavailable (no API key configured).";
const FETCH_UNAVAILABLE: &str = "Error: web fetch is unavailable (no API key configured).";
const EMPTY_PAGE: &str = "Page content is empty.";

/// Trim and collapse internal whitespace runs to single spaces.
pub fn normalize_query(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trim, lowercase and strip trailing slashes.
pub fn normalize_url(url: &str) -> String {
    url.trim().to_lowercase().trim_end_matches('/').to_string()
}

/// Cut `text` to `budget` characters, appending `marker` when cut.
pub fn truncate_chars(text: &str, budget: usize, marker: &str) -> String {
    match text.char_indices().nth(budget) {
        None => text.to_string(),
        Some((byte_idx, _)) => format!("{}{marker}", &text[..byte_idx]),
    }
}

/// Keep the first hit for each normalized URL.
pub fn dedup_by_url(hits: Vec<SearchHit>) -> Vec<SearchHit> {
    let mut seen: HashSet<String> = HashSet::new();
    hits.into_iter()
        .filter(|hit| seen.insert(normalize_url(&hit.url)))
        .collect()
}

/// Resolves `web_search` / `web_fetch` calls with caching and result shaping.
pub struct WebToolService {
    provider: Arc<BoxWebProvider>,
    cache: TtlCache<String>,
    clock: Arc<dyn Clock>,
    max_content_length: usize,
    max_snippet_length: usize,
    rerank: bool,
    default_max_results: usize,
}

impl WebToolService {
    pub fn new(provider: Arc<BoxWebProvider>, config: &WebToolConfig, clock: Arc<dyn Clock>) -> Self {
        let ttl = ttl_from_secs(config.cache_ttl_secs);
        Self {
            provider,
            cache: TtlCache::new(ttl, config.max_cache_entries, clock.clone()),
            clock,
            max_content_length: config.effective_content_length(),
            max_snippet_length: config.effective_snippet_length(),
            rerank: config.rerank,
            default_max_results: config.default_max_results,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_configured()
    }

    /// Search the web and format the results for the model.
    ///
    /// Never fails: provider errors and missing credentials come back as
    /// descriptive text. Error text is not cached.
    pub async fn search(&self, query: &str, max_results: usize) -> String {
        if !self.provider.is_configured() {
            warn!("web search skipped, no API key configured");
            return SEARCH_UNAVAILABLE.to_string();
        }

        let query = normalize_query(query);
        let capped = max_results.clamp(1, MAX_RESULTS_CAP);
        let cache_key = format!("web_search:{query}:{capped}");

        if let Some(cached) = self.cache.get(&cache_key) {
            debug!(query = %query, "web_search cache hit");
            return cached;
        }

        let hits = match self.provider.search(&query, capped).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(query = %query, error = %e, "web_search failed");
                return format!("Web search failed: {e}");
            }
        };

        if hits.is_empty() {
            warn!(query = %query, "web_search returned no results");
            let no_results = format!(
                "No web results found for: \"{query}\". Do not answer from memory; \
                 tell the user the information is unavailable."
            );
            self.cache.insert(&cache_key, no_results.clone());
            return no_results;
        }

        let total = hits.len();
        let unique = dedup_by_url(hits);
        let unique_count = unique.len();
        let ranked = if self.rerank {
            rerank(unique, &query)
        } else {
            unique
        };
        debug!(
            query = %query,
            total,
            unique = unique_count,
            rerank = self.rerank,
            "web_search results shaped"
        );

        let header = format!(
            "[Search date: {}. Answer strictly from the results below.]\n\n",
            self.clock.now().format("%Y-%m-%d")
        );
        let formatted = self.build_from_snippets(&ranked, &header);
        self.cache.insert(&cache_key, formatted.clone());
        formatted
    }

    /// Fetch a page as `title\n\ncontent`, truncated to the content budget.
    ///
    /// The provider receives the URL as given; only the cache key is normalized.
    pub async fn fetch(&self, url: &str) -> String {
        if !self.provider.is_configured() {
            warn!("web fetch skipped, no API key configured");
            return FETCH_UNAVAILABLE.to_string();
        }

        let cache_key = format!("web_fetch:{}", normalize_url(url));
        if let Some(cached) = self.cache.get(&cache_key) {
            debug!(url = %url, "web_fetch cache hit");
            return cached;
        }

        let page = match self.provider.fetch(url.trim()).await {
            Ok(page) => page,
            Err(e) => {
                warn!(url = %url, error = %e, "web_fetch failed");
                return format!("Web fetch failed: {e}");
            }
        };

        let title = page
            .title
            .filter(|t| !t.trim().is_empty())
            .map(|t| format!("{t}\n\n"))
            .unwrap_or_default();
        let content = page.content.unwrap_or_default();
        let raw = format!("{title}{}", content.trim());
        let body = if raw.is_empty() { EMPTY_PAGE.to_string() } else { raw };

        let result = truncate_chars(&body, self.max_content_length, TRUNCATION_MARKER);
        self.cache.insert(&cache_key, result.clone());
        result
    }

    /// Decode and run a model tool call.
    ///
    /// Malformed arguments and unknown tools are returned as `ToolError`
    /// without contacting the provider.
    pub async fn resolve(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let invocation = WebToolInvocation::from_call(call)?;
        let span = info_span!(
            "gen_ai.execute_tool",
            gen_ai.operation.name = OP_EXECUTE_TOOL,
            gen_ai.tool.name = %invocation.tool_name(),
            gen_ai.tool.call.id = %call.id,
        );

        let content = async {
            match &invocation {
                WebToolInvocation::Search { query, max_results } => {
                    self.search(query, max_results.unwrap_or(self.default_max_results))
                        .await
                }
                WebToolInvocation::Fetch { url } => self.fetch(url).await,
            }
        }
        .instrument(span)
        .await;

        Ok(ToolResult {
            tool_name: invocation.tool_name().to_string(),
            content,
        })
    }

    /// Join snippets under the budget, skipping any that would overflow it.
    fn build_from_snippets(&self, hits: &[SearchHit], header: &str) -> String {
        const SEPARATOR: &str = "\n\n";
        let budget = self
            .max_content_length
            .saturating_sub(header.chars().count());

        let mut body = String::new();
        let mut used = 0usize;
        let mut dropped = 0usize;

        for hit in hits {
            let snippet = self.format_snippet(hit);
            let addition = if used == 0 {
                snippet
            } else {
                format!("{SEPARATOR}{snippet}")
            };
            let len = addition.chars().count();
            if used + len > budget {
                dropped += 1;
                continue;
            }
            body.push_str(&addition);
            used += len;
        }

        if dropped > 0 {
            body.push_str(&format!(
                "\n[... {dropped} result(s) dropped due to length limit]"
            ));
        }
        format!("{header}{body}")
    }

    fn format_snippet(&self, hit: &SearchHit) -> String {
        let content = hit.content.trim();
        let capped = match content.char_indices().nth(self.max_snippet_length) {
            None => content.to_string(),
            Some((byte_idx, _)) => format!("{}{SNIPPET_ELLIPSIS}", &content[..byte_idx]),
        };
        format!("[{}]({})\n{capped}", hit.title, hit.url)
    }
}
