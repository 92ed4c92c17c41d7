//! Global configuration types for groupmind.
//!
//! `GlobalConfig` is the top-level `config.toml`. Every engine feature switch
//! and tuning constant lives here and is passed to components at
//! construction; nothing reads ambient environment flags.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
///
/// Loaded from `~/.groupmind/config.toml`. All fields have defaults, so an
/// empty file (or no file) is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub reply: ReplyConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub indexing: IndexingConfig,
    #[serde(default)]
    pub trigger: TriggerConfig,
    #[serde(default)]
    pub web: WebToolConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub vector: VectorConfig,
}

/// Reply orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyConfig {
    /// Blend semantically similar history into the context (default: true).
    #[serde(default = "default_true")]
    pub enable_rag: bool,

    /// Declare `web_search` / `web_fetch` to the model (default: true).
    #[serde(default = "default_true")]
    pub enable_web_tools: bool,

    /// Upper bound on LLM round-trips per inbound message (default: 5).
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Characters of a tool result fed back to the model (default: 10,000).
    #[serde(default = "default_tool_result_budget")]
    pub tool_result_budget: usize,

    /// Recency window used when `enable_rag` is off (default: 20).
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Sentinel the model returns to decline replying (default: `[SKIP]`).
    #[serde(default = "default_skip_marker")]
    pub skip_marker: String,

    /// System prompt. `{skip_marker}` is replaced with the configured marker.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Case-insensitive regexes; a match appends a search hint to the turn.
    #[serde(default = "default_search_hint_patterns")]
    pub search_hint_patterns: Vec<String>,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            enable_rag: true,
            enable_web_tools: true,
            max_iterations: default_max_iterations(),
            tool_result_budget: default_tool_result_budget(),
            history_limit: default_history_limit(),
            skip_marker: default_skip_marker(),
            system_prompt: default_system_prompt(),
            search_hint_patterns: default_search_hint_patterns(),
        }
    }
}

/// Hybrid retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Most recent messages always included (default: 10).
    #[serde(default = "default_recent_messages")]
    pub recent_messages: usize,

    /// Nearest chunks requested from the vector index (default: 15).
    #[serde(default = "default_similar_limit")]
    pub similar_limit: usize,

    /// Recency window used when the semantic step fails (default: 10).
    #[serde(default = "default_recent_messages")]
    pub fallback_limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            recent_messages: default_recent_messages(),
            similar_limit: default_similar_limit(),
            fallback_limit: default_recent_messages(),
        }
    }
}

/// Chunk indexing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// Messages per chunk window (default: 8).
    #[serde(default = "default_window_size")]
    pub window_size: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
        }
    }
}

/// Decides whether an inbound group message prompts a reply attempt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Only reply when mentioned or a trigger word matches (default: false).
    #[serde(default)]
    pub trigger_on_mention: bool,

    /// Bot handle without the leading `@`.
    #[serde(default)]
    pub bot_username: String,

    /// Case-insensitive regexes that count as addressing the bot.
    #[serde(default)]
    pub trigger_words: Vec<String>,
}

/// Web search/fetch tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebToolConfig {
    /// Bearer credential. Without it both tools report "unavailable".
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_web_base_url")]
    pub base_url: String,

    /// Budget for a formatted tool result, floored at 500 (default: 4000).
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,

    /// Per-result snippet cap, floored at 100 (default: 600).
    #[serde(default = "default_max_snippet_length")]
    pub max_snippet_length: usize,

    /// Reorder search results by query term overlap (default: true).
    #[serde(default = "default_true")]
    pub rerank: bool,

    /// Cache lifetime in seconds; 0 disables caching (default: 300).
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Cache capacity before the oldest entry is evicted (default: 150).
    #[serde(default = "default_max_cache_entries")]
    pub max_cache_entries: usize,

    #[serde(default = "default_web_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Results requested when the model omits `max_results` (default: 5).
    #[serde(default = "default_max_results")]
    pub default_max_results: usize,
}

impl WebToolConfig {
    pub fn effective_content_length(&self) -> usize {
        self.max_content_length.max(MIN_CONTENT_LENGTH)
    }

    pub fn effective_snippet_length(&self) -> usize {
        self.max_snippet_length.max(MIN_SNIPPET_LENGTH)
    }
}

impl Default for WebToolConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_web_base_url(),
            max_content_length: default_max_content_length(),
            max_snippet_length: default_max_snippet_length(),
            rerank: true,
            cache_ttl_secs: default_cache_ttl_secs(),
            max_cache_entries: default_max_cache_entries(),
            request_timeout_secs: default_web_timeout_secs(),
            default_max_results: default_max_results(),
        }
    }
}

/// Chat-completion endpoint settings (OpenAI-compatible wire format).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key: None,
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

/// Embedding service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Output dimensionality; every collection is created with it.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    #[serde(default = "default_web_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_embedding_base_url(),
            model: default_embedding_model(),
            dimension: default_dimension(),
            timeout_secs: default_web_timeout_secs(),
        }
    }
}

/// Vector store location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorConfig {
    /// Defaults to `{data_dir}/vectors` when unset.
    #[serde(default)]
    pub path: Option<String>,
}

pub const MIN_CONTENT_LENGTH: usize = 500;
pub const MIN_SNIPPET_LENGTH: usize = 100;

fn default_true() -> bool {
    true
}

fn default_max_iterations() -> usize {
    5
}

fn default_tool_result_budget() -> usize {
    10_000
}

fn default_history_limit() -> usize {
    20
}

fn default_skip_marker() -> String {
    "[SKIP]".to_string()
}

fn default_system_prompt() -> String {
    "You are a member of a group chat. Talk to everyone informally and keep \
     your answers short and to the point.\n\n\
     Reply when someone addresses you directly or asks the chat a general \
     question. If this message does not need a reply from you, write exactly \
     one line without quotes: {skip_marker}"
        .to_string()
}

fn default_search_hint_patterns() -> Vec<String> {
    [
        r"\binternet\b",
        r"\bsearch",
        r"\bfind\b",
        r"\blook up\b",
        r"\bwhen\b",
        r"\bwho\b",
        r"\bmatch",
        r"\bscore",
        r"\bresults?\b",
        r"\btoday\b",
        r"\bcurrent",
        r"\blatest\b",
        r"\bnow\b",
        r"\bnews\b",
        r"\brates?\b",
        "интернет",
        "поиск",
        "найди",
        "поищи",
        "узнай",
        "когда",
        "кто",
        "матч",
        "сч[её]т",
        "результат",
        "сегодня",
        "актуальн",
        "сейчас",
        "новости",
        "курс",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_recent_messages() -> usize {
    10
}

fn default_similar_limit() -> usize {
    15
}

fn default_window_size() -> usize {
    8
}

fn default_web_base_url() -> String {
    "https://ollama.com/api".to_string()
}

fn default_max_content_length() -> usize {
    4000
}

fn default_max_snippet_length() -> usize {
    600
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_max_cache_entries() -> usize {
    150
}

fn default_web_timeout_secs() -> u64 {
    30
}

fn default_max_results() -> usize {
    5
}

fn default_llm_base_url() -> String {
    "http://localhost:11434/v1".to_string()
}

fn default_llm_model() -> String {
    "llama3.2".to_string()
}

fn default_temperature() -> f64 {
    0.5
}

fn default_llm_timeout_secs() -> u64 {
    120
}

fn default_embedding_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_dimension() -> usize {
    768
}
