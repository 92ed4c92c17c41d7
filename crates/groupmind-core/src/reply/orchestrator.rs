//! Reply orchestration for one inbound message.
//!
//! `ReplyOrchestrator` gathers context, drives the bounded tool-calling loop
//! against the LLM, applies the skip sentinel, persists the turn and kicks
//! off background chunk indexing. It never returns an error: every failure
//! is logged and either degraded around or rendered as reply text.

use std::sync::Arc;

use groupmind_observe::genai_attrs::{
    GEN_AI_RESPONSE_FINISH_REASONS, GEN_AI_USAGE_INPUT_TOKENS, GEN_AI_USAGE_OUTPUT_TOKENS, OP_CHAT,
};
use groupmind_types::config::{GlobalConfig, ReplyConfig, RetrievalConfig};
use groupmind_types::error::RepositoryError;
use groupmind_types::llm::{ChatMessage, ChatRequest, ChatResponse, LlmError};
use groupmind_types::message::{InboundMessage, Message, ReplyOutcome, Role};
use groupmind_types::tool::ToolError;
use tracing::{Instrument, debug, field, info, info_span, warn};

use super::skip::interpret_final_text;
use super::strategy::PromptPlacement;
use super::trigger::{SEARCH_HINT, SearchHint};
use crate::clock::Clock;
use crate::history::box_log::BoxMessageLog;
use crate::llm::box_provider::BoxLlmProvider;
use crate::memory::indexer::ChunkIndexer;
use crate::memory::retriever::HybridRetriever;
use crate::tools::invocation::web_tool_definitions;
use crate::tools::web::{WebToolService, truncate_chars};

/// Marker appended when a tool result exceeds the tool result budget.
pub const TOOL_RESULT_TRUNCATED: &str = "\n[... truncated]";

const DEFAULT_SENDER: &str = "User";

/// Failures that end a turn early. Both render as `Error: ...` reply text.
#[derive(Debug, thiserror::Error)]
enum TurnError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// Tuning copied out of [`GlobalConfig`] at construction.
#[derive(Debug, Clone)]
pub struct ReplySettings {
    pub reply: ReplyConfig,
    pub retrieval: RetrievalConfig,
    pub window_size: usize,
    pub model: String,
    pub temperature: f64,
}

impl ReplySettings {
    pub fn from_config(config: &GlobalConfig) -> Self {
        Self {
            reply: config.reply.clone(),
            retrieval: config.retrieval.clone(),
            window_size: config.indexing.window_size,
            model: config.llm.model.clone(),
            temperature: config.llm.temperature,
        }
    }
}

/// Produces the reply (or the decision not to reply) for inbound messages.
pub struct ReplyOrchestrator {
    log: Arc<BoxMessageLog>,
    retriever: HybridRetriever,
    indexer: ChunkIndexer,
    llm: Arc<BoxLlmProvider>,
    web: Arc<WebToolService>,
    clock: Arc<dyn Clock>,
    search_hint: SearchHint,
    settings: ReplySettings,
}

impl ReplyOrchestrator {
    pub fn new(
        log: Arc<BoxMessageLog>,
        retriever: HybridRetriever,
        indexer: ChunkIndexer,
        llm: Arc<BoxLlmProvider>,
        web: Arc<WebToolService>,
        clock: Arc<dyn Clock>,
        settings: ReplySettings,
    ) -> Self {
        Self {
            search_hint: SearchHint::new(&settings.reply.search_hint_patterns),
            log,
            retriever,
            indexer,
            llm,
            web,
            clock,
            settings,
        }
    }

    /// Handle one inbound message end to end.
    ///
    /// The inbound turn is persisted exactly once, after the LLM resolves
    /// (successfully or not). An assistant turn is persisted only for
    /// `ReplyOutcome::Reply`.
    pub async fn reply(&self, inbound: &InboundMessage) -> ReplyOutcome {
        let span = info_span!(
            "reply.turn",
            conversation.id = %inbound.conversation_id,
            private = inbound.is_private,
        );

        async {
            let history = self.load_context(inbound).await;
            let mut messages: Vec<ChatMessage> = history.iter().map(history_message).collect();
            messages.push(ChatMessage::user(self.render_turn(inbound)));

            let outcome = match self.run_tool_loop(&self.system_prompt(), messages).await {
                Ok(text) => interpret_final_text(&text, &self.settings.reply.skip_marker),
                Err(e) => {
                    warn!(error = %e, "reply turn failed");
                    ReplyOutcome::Reply(format!("Error: {e}"))
                }
            };

            self.persist_turn(inbound, &outcome).await;
            self.indexer
                .spawn_reindex(&inbound.conversation_id, self.settings.window_size);

            match &outcome {
                ReplyOutcome::Reply(text) => info!(chars = text.chars().count(), "reply produced"),
                ReplyOutcome::NoReply => info!("model chose not to reply"),
            }
            outcome
        }
        .instrument(span)
        .await
    }

    /// Persist an inbound message without attempting a reply.
    pub async fn save_incoming(&self, inbound: &InboundMessage) -> Result<Message, RepositoryError> {
        let saved = self
            .log
            .append(
                &inbound.conversation_id,
                Role::User,
                &inbound.text,
                inbound.sender_handle.as_deref(),
            )
            .await?;
        self.indexer
            .spawn_reindex(&inbound.conversation_id, self.settings.window_size);
        Ok(saved)
    }

    /// Hybrid context when RAG is on, otherwise the plain recency window.
    /// Read failures degrade to an empty history.
    async fn load_context(&self, inbound: &InboundMessage) -> Vec<Message> {
        let result = if self.settings.reply.enable_rag {
            self.retriever
                .build_context(
                    &inbound.conversation_id,
                    &inbound.text,
                    self.settings.retrieval.recent_messages,
                    self.settings.retrieval.similar_limit,
                )
                .await
        } else {
            self.log
                .recent(&inbound.conversation_id, self.settings.reply.history_limit)
                .await
        };

        result.unwrap_or_else(|e| {
            warn!(error = %e, "failed to load history, replying without context");
            Vec::new()
        })
    }

    fn system_prompt(&self) -> String {
        let reply = &self.settings.reply;
        let mut prompt = reply.system_prompt.replace("{skip_marker}", &reply.skip_marker);
        if reply.enable_web_tools {
            prompt.push_str(&format!(
                "\n\nCurrent date: {}. Use it to judge how fresh news is.",
                self.clock.now().format("%Y-%m-%d")
            ));
        }
        prompt
    }

    fn render_turn(&self, inbound: &InboundMessage) -> String {
        let handle = inbound
            .sender_handle
            .as_deref()
            .filter(|h| !h.is_empty())
            .unwrap_or(DEFAULT_SENDER);
        let mut turn = format!("{handle}: {}", inbound.text);
        if self.settings.reply.enable_web_tools && self.search_hint.matches(&inbound.text) {
            debug!("search hint appended");
            turn.push_str(SEARCH_HINT);
        }
        turn
    }

    /// The bounded call / resolve-tools / call loop.
    ///
    /// At most `max_iterations` LLM calls are made, the one-off prompt
    /// placement retry included. When no call is left for that retry, the
    /// rejection itself is returned. Exhaustion returns the last assistant
    /// text produced. A malformed or unknown tool call ends the turn with its
    /// [`ToolError`].
    async fn run_tool_loop(
        &self,
        system_prompt: &str,
        mut messages: Vec<ChatMessage>,
    ) -> Result<String, TurnError> {
        let reply = &self.settings.reply;
        let base = ChatRequest {
            model: self.settings.model.clone(),
            system_prompt: None,
            messages: Vec::new(),
            tools: if reply.enable_web_tools {
                web_tool_definitions()
            } else {
                Vec::new()
            },
            temperature: Some(self.settings.temperature),
        };
        let max_iterations = reply.max_iterations.max(1);
        let mut placement = PromptPlacement::SystemRole;
        let mut last_content = String::new();
        let mut calls = 0usize;

        while calls < max_iterations {
            calls += 1;
            let request = placement.build_request(&base, system_prompt, &messages);
            let response = match self.call_llm(&request, calls).await {
                Ok(response) => response,
                Err(e) => match placement.fallback_for(&e) {
                    Some(next) if calls == 1 && calls < max_iterations => {
                        warn!(error = %e, "system role rejected with tools, retrying with user role");
                        placement = next;
                        continue;
                    }
                    _ => return Err(e.into()),
                },
            };

            if !response.has_tool_calls() || base.tools.is_empty() {
                return Ok(response.content);
            }

            last_content = response.content.clone();
            let tool_calls = response.tool_calls;
            messages.push(ChatMessage::assistant_with_tools(
                response.content,
                tool_calls.clone(),
            ));

            for call in &tool_calls {
                let result = self.web.resolve(call).await.inspect_err(|e| {
                    warn!(tool = %call.name, error = %e, "rejected tool call, ending turn");
                })?;
                let content = truncate_chars(
                    &result.content,
                    reply.tool_result_budget,
                    TOOL_RESULT_TRUNCATED,
                );
                messages.push(ChatMessage::tool_result(call, content));
            }
        }

        warn!(
            max_iterations,
            "tool loop exhausted, returning last assistant text"
        );
        Ok(last_content)
    }

    async fn call_llm(&self, request: &ChatRequest, iteration: usize) -> Result<ChatResponse, LlmError> {
        let span = info_span!(
            "gen_ai.chat",
            gen_ai.operation.name = OP_CHAT,
            gen_ai.provider.name = self.llm.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.temperature = ?request.temperature,
            gen_ai.usage.input_tokens = field::Empty,
            gen_ai.usage.output_tokens = field::Empty,
            gen_ai.response.finish_reasons = field::Empty,
            iteration,
        );
        let response = self.llm.chat(request).instrument(span.clone()).await?;
        span.record(GEN_AI_USAGE_INPUT_TOKENS, response.usage.input_tokens);
        span.record(GEN_AI_USAGE_OUTPUT_TOKENS, response.usage.output_tokens);
        if let Some(reason) = &response.finish_reason {
            span.record(GEN_AI_RESPONSE_FINISH_REASONS, reason.as_str());
        }
        debug!(
            iteration,
            tool_calls = response.tool_calls.len(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "LLM responded"
        );
        Ok(response)
    }

    async fn persist_turn(&self, inbound: &InboundMessage, outcome: &ReplyOutcome) {
        let conversation_id = &inbound.conversation_id;
        if let Err(e) = self
            .log
            .append(
                conversation_id,
                Role::User,
                &inbound.text,
                inbound.sender_handle.as_deref(),
            )
            .await
        {
            warn!(error = %e, "failed to persist inbound message");
        }

        if let ReplyOutcome::Reply(text) = outcome {
            if let Err(e) = self
                .log
                .append(conversation_id, Role::Assistant, text, None)
                .await
            {
                warn!(error = %e, "failed to persist reply");
            }
        }
    }
}

/// History entry as a chat message; handled senders render as `handle: content`.
fn history_message(message: &Message) -> ChatMessage {
    let content = match message.sender_handle.as_deref() {
        Some(handle) if !handle.is_empty() => format!("{handle}: {}", message.content),
        _ => message.content.clone(),
    };
    match message.role {
        Role::User => ChatMessage::user(content),
        Role::Assistant => ChatMessage::assistant(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::history::in_memory::InMemoryMessageLog;
    use crate::llm::provider::LlmProvider;
    use crate::memory::box_embedder::BoxEmbedder;
    use crate::memory::box_vector::BoxVectorIndex;
    use crate::memory::embedder::Embedder;
    use crate::memory::flat::FlatVectorIndex;
    use crate::tools::provider::{BoxWebProvider, WebProvider};
    use chrono::{TimeZone, Utc};
    use groupmind_types::error::{EmbeddingError, WebProviderError};
    use groupmind_types::llm::{ChatRole, ToolCall};
    use groupmind_types::tool::{FetchedPage, SearchHit};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays scripted responses and records every request.
    struct ScriptedLlm {
        script: Mutex<VecDeque<Result<ChatResponse, LlmError>>>,
        repeat_tool_calls: bool,
        requests: Arc<Mutex<Vec<ChatRequest>>>,
    }

    impl LlmProvider for ScriptedLlm {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
            self.requests.lock().unwrap().push(request.clone());
            if self.repeat_tool_calls {
                return Ok(tool_response("still looking", search_call("again")));
            }
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(text_response("")))
        }
    }

    struct CountingWeb {
        calls: Arc<AtomicUsize>,
        content: String,
    }

    impl WebProvider for CountingWeb {
        fn is_configured(&self) -> bool {
            true
        }

        async fn search(&self, _query: &str, _max: usize) -> Result<Vec<SearchHit>, WebProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![SearchHit {
                title: "Result".to_string(),
                url: "https://news.example".to_string(),
                content: self.content.clone(),
            }])
        }

        async fn fetch(&self, _url: &str) -> Result<FetchedPage, WebProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(FetchedPage::default())
        }
    }

    struct OfflineEmbedder;

    impl Embedder for OfflineEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::NotConfigured)
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Err(EmbeddingError::NotConfigured)
        }

        fn is_configured(&self) -> bool {
            false
        }

        fn model_name(&self) -> &str {
            "offline"
        }

        fn dimension(&self) -> usize {
            0
        }
    }

    fn text_response(content: &str) -> ChatResponse {
        ChatResponse {
            content: content.to_string(),
            model: "test".to_string(),
            ..Default::default()
        }
    }

    fn tool_response(content: &str, call: ToolCall) -> ChatResponse {
        ChatResponse {
            content: content.to_string(),
            tool_calls: vec![call],
            model: "test".to_string(),
            ..Default::default()
        }
    }

    fn search_call(query: &str) -> ToolCall {
        ToolCall {
            id: format!("call_{query}"),
            name: "web_search".to_string(),
            arguments: json!({"query": query}),
        }
    }

    struct Harness {
        orchestrator: ReplyOrchestrator,
        log: Arc<BoxMessageLog>,
        requests: Arc<Mutex<Vec<ChatRequest>>>,
        web_calls: Arc<AtomicUsize>,
    }

    fn harness_with(
        script: Vec<Result<ChatResponse, LlmError>>,
        repeat_tool_calls: bool,
        configure: impl FnOnce(&mut GlobalConfig),
    ) -> Harness {
        let mut config = GlobalConfig::default();
        config.web.api_key = Some("key".to_string());
        configure(&mut config);

        let clock: Arc<dyn Clock> =
            Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap()));
        let log = Arc::new(BoxMessageLog::new(InMemoryMessageLog::new()));
        let embedder = Arc::new(BoxEmbedder::new(OfflineEmbedder));
        let index = Arc::new(BoxVectorIndex::new(FlatVectorIndex::new()));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let web_calls = Arc::new(AtomicUsize::new(0));

        let llm = ScriptedLlm {
            script: Mutex::new(script.into()),
            repeat_tool_calls,
            requests: requests.clone(),
        };
        let web = WebToolService::new(
            Arc::new(BoxWebProvider::new(CountingWeb {
                calls: web_calls.clone(),
                content: "x".repeat(3000),
            })),
            &config.web,
            clock.clone(),
        );

        let orchestrator = ReplyOrchestrator::new(
            log.clone(),
            HybridRetriever::new(log.clone(), embedder.clone(), index.clone(), 10),
            ChunkIndexer::new(log.clone(), embedder, index),
            Arc::new(BoxLlmProvider::new(llm)),
            Arc::new(web),
            clock,
            ReplySettings::from_config(&config),
        );

        Harness {
            orchestrator,
            log,
            requests,
            web_calls,
        }
    }

    fn harness(script: Vec<Result<ChatResponse, LlmError>>) -> Harness {
        harness_with(script, false, |_| {})
    }

    #[tokio::test]
    async fn tool_call_then_answer() {
        let h = harness(vec![
            Ok(tool_response("", search_call("ai news"))),
            Ok(text_response("  Here is the news.  ")),
        ]);

        let outcome = h
            .orchestrator
            .reply(&InboundMessage::new("7", "what's new in ai?").with_sender("alice"))
            .await;

        assert_eq!(outcome, ReplyOutcome::Reply("Here is the news.".to_string()));
        assert_eq!(h.web_calls.load(Ordering::SeqCst), 1);

        let requests = h.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        let second = &requests[1].messages;
        let tool_msg = second.last().unwrap();
        assert_eq!(tool_msg.role, ChatRole::Tool);
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_ai news"));
        assert!(tool_msg.content.starts_with("[Search date: 2026-03-14."));
        assert_eq!(second[second.len() - 2].tool_calls.len(), 1);
    }

    #[tokio::test]
    async fn loop_is_bounded_by_max_iterations() {
        let h = harness_with(Vec::new(), true, |_| {});

        let outcome = h.orchestrator.reply(&InboundMessage::new("7", "loop forever")).await;

        assert_eq!(h.requests.lock().unwrap().len(), 5);
        assert_eq!(outcome, ReplyOutcome::Reply("still looking".to_string()));
    }

    #[tokio::test]
    async fn skip_persists_only_the_inbound_turn() {
        let h = harness(vec![Ok(text_response(" [SKIP] "))]);

        let outcome = h.orchestrator.reply(&InboundMessage::new("9", "lol").with_sender("bob")).await;

        assert_eq!(outcome, ReplyOutcome::NoReply);
        let stored = h.log.recent("9", 10).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].role, Role::User);
        assert_eq!(stored[0].content, "lol");
        assert_eq!(stored[0].sender_handle.as_deref(), Some("bob"));
    }

    #[tokio::test]
    async fn reply_persists_user_then_assistant() {
        let h = harness(vec![Ok(text_response("[SKIP] actually, hi"))]);

        let outcome = h.orchestrator.reply(&InboundMessage::new("9", "hello bot")).await;

        assert_eq!(outcome, ReplyOutcome::Reply("actually, hi".to_string()));
        let stored = h.log.recent("9", 10).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].role, Role::User);
        assert_eq!(stored[1].role, Role::Assistant);
        assert_eq!(stored[1].content, "actually, hi");
    }

    #[tokio::test]
    async fn system_role_rejection_retries_as_user_role() {
        let h = harness(vec![
            Err(LlmError::InvalidRequest(
                "system messages are not supported together with tools".to_string(),
            )),
            Ok(text_response("ok")),
        ]);

        let outcome = h.orchestrator.reply(&InboundMessage::new("1", "hi")).await;
        assert_eq!(outcome, ReplyOutcome::Reply("ok".to_string()));

        let requests = h.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].system_prompt.is_some());
        assert!(requests[1].system_prompt.is_none());
        assert_eq!(requests[1].messages[0].role, ChatRole::User);
        assert!(requests[1].messages[0].content.contains("[SKIP]"));
    }

    fn rejection() -> Result<ChatResponse, LlmError> {
        Err(LlmError::InvalidRequest(
            "system messages are not supported with tools".to_string(),
        ))
    }

    #[tokio::test]
    async fn rejection_with_no_call_left_surfaces_the_error() {
        let h = harness_with(
            vec![rejection(), Ok(text_response("never sent"))],
            false,
            |config| config.reply.max_iterations = 1,
        );

        let outcome = h.orchestrator.reply(&InboundMessage::new("1", "hi")).await;

        assert_eq!(
            outcome,
            ReplyOutcome::Reply(
                "Error: invalid request: system messages are not supported with tools".to_string()
            )
        );
        assert_eq!(h.requests.lock().unwrap().len(), 1);
        let stored = h.log.recent("1", 10).await.unwrap();
        assert_eq!(stored[1].content, "Error: invalid request: system messages are not supported with tools");
    }

    #[tokio::test]
    async fn rejected_retry_surfaces_the_error() {
        let h = harness(vec![rejection(), rejection(), Ok(text_response("never sent"))]);

        let outcome = h.orchestrator.reply(&InboundMessage::new("1", "hi")).await;

        let ReplyOutcome::Reply(text) = outcome else {
            panic!("expected error text");
        };
        assert!(text.starts_with("Error: invalid request"));
        assert_eq!(h.requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn other_failures_become_error_text_and_are_persisted() {
        let h = harness(vec![Err(LlmError::Timeout)]);

        let outcome = h.orchestrator.reply(&InboundMessage::new("1", "hi")).await;

        assert_eq!(outcome, ReplyOutcome::Reply("Error: request timed out".to_string()));
        assert_eq!(h.requests.lock().unwrap().len(), 1);
        let stored = h.log.recent("1", 10).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1].content, "Error: request timed out");
    }

    #[tokio::test]
    async fn malformed_tool_call_ends_the_turn() {
        let bad_call = ToolCall {
            id: "call_bad".to_string(),
            name: "web_search".to_string(),
            arguments: json!({"q": 1}),
        };
        let h = harness(vec![
            Ok(tool_response("", bad_call)),
            Ok(text_response("sorry")),
        ]);

        let outcome = h.orchestrator.reply(&InboundMessage::new("1", "search please")).await;

        let ReplyOutcome::Reply(text) = outcome else {
            panic!("expected error text");
        };
        assert!(text.starts_with("Error: malformed arguments for web_search"));
        assert_eq!(h.web_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.requests.lock().unwrap().len(), 1);

        let stored = h.log.recent("1", 10).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1].content, text);
    }

    #[tokio::test]
    async fn unknown_tool_ends_the_turn() {
        let call = ToolCall {
            id: "call_x".to_string(),
            name: "run_shell".to_string(),
            arguments: json!({}),
        };
        let h = harness(vec![Ok(tool_response("", call)), Ok(text_response("never"))]);

        let outcome = h.orchestrator.reply(&InboundMessage::new("1", "do it")).await;

        assert_eq!(outcome, ReplyOutcome::Reply("Error: unknown tool: 'run_shell'".to_string()));
        assert_eq!(h.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn tool_results_are_truncated_to_budget() {
        let h = harness_with(
            vec![Ok(tool_response("", search_call("big"))), Ok(text_response("done"))],
            false,
            |config| config.reply.tool_result_budget = 100,
        );

        h.orchestrator.reply(&InboundMessage::new("1", "big results")).await;

        let requests = h.requests.lock().unwrap();
        let tool_msg = requests[1].messages.last().unwrap();
        assert!(tool_msg.content.ends_with(TOOL_RESULT_TRUNCATED));
        assert_eq!(
            tool_msg.content.chars().count(),
            100 + TOOL_RESULT_TRUNCATED.chars().count()
        );
    }

    #[tokio::test]
    async fn prompt_carries_date_hint_and_history() {
        let h = harness(vec![Ok(text_response("first")), Ok(text_response("second"))]);
        h.orchestrator
            .reply(&InboundMessage::new("5", "good morning").with_sender("carol"))
            .await;
        h.orchestrator
            .reply(&InboundMessage::new("5", "any news today?").with_sender("dave"))
            .await;

        let requests = h.requests.lock().unwrap();
        let second = &requests[1];
        let prompt = second.system_prompt.as_deref().unwrap();
        assert!(prompt.contains("Current date: 2026-03-14."));
        assert!(!prompt.contains("{skip_marker}"));
        assert_eq!(second.tools.len(), 2);

        let hinted = format!("dave: any news today?{SEARCH_HINT}");
        let contents: Vec<&str> = second.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["carol: good morning", "first", hinted.as_str()]);
        assert_eq!(requests[0].messages[0].content, "carol: good morning");
    }

    #[tokio::test]
    async fn web_tools_disabled_sends_no_tools_and_stops_after_one_call() {
        let h = harness_with(
            vec![Ok(tool_response("plain answer", search_call("x")))],
            false,
            |config| config.reply.enable_web_tools = false,
        );

        let outcome = h.orchestrator.reply(&InboundMessage::new("1", "latest news?")).await;

        assert_eq!(outcome, ReplyOutcome::Reply("plain answer".to_string()));
        let requests = h.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].tools.is_empty());
        assert!(!requests[0].system_prompt.as_deref().unwrap().contains("Current date"));
        assert_eq!(requests[0].messages[0].content, "User: latest news?");
        assert_eq!(h.web_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn save_incoming_only_appends() {
        let h = harness(Vec::new());

        h.orchestrator
            .save_incoming(&InboundMessage::new("3", "just chatting").with_sender("erin"))
            .await
            .unwrap();

        assert_eq!(h.log.count("3").await.unwrap(), 1);
        assert!(h.requests.lock().unwrap().is_empty());
    }
}
