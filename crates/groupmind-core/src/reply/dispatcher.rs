//! Per-conversation task dispatch.
//!
//! Every inbound message runs as its own tokio task. Tasks for the same
//! conversation take a shared async mutex so turns are processed one at a
//! time; different conversations proceed in parallel. A conversation's
//! mutex is dropped from the table once no task holds or waits on it.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use groupmind_types::message::{InboundMessage, ReplyOutcome};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info_span, warn};

use super::orchestrator::ReplyOrchestrator;
use super::trigger::{TriggerDecision, TriggerPolicy};

/// Failure to deliver a reply through the transport.
#[derive(Debug, thiserror::Error)]
#[error("reply delivery failed: {0}")]
pub struct SinkError(pub String);

/// Outbound half of a messaging transport.
pub trait ReplySink: Send + Sync {
    fn send_reply(
        &self,
        conversation_id: &str,
        text: &str,
    ) -> impl Future<Output = Result<(), SinkError>> + Send;
}

/// Routes inbound messages through the trigger policy and orchestrator.
pub struct ConversationDispatcher<S> {
    orchestrator: Arc<ReplyOrchestrator>,
    policy: Arc<TriggerPolicy>,
    sink: Arc<S>,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl<S> Clone for ConversationDispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: self.orchestrator.clone(),
            policy: self.policy.clone(),
            sink: self.sink.clone(),
            locks: self.locks.clone(),
        }
    }
}

impl<S: ReplySink + 'static> ConversationDispatcher<S> {
    pub fn new(orchestrator: Arc<ReplyOrchestrator>, policy: TriggerPolicy, sink: Arc<S>) -> Self {
        Self {
            orchestrator,
            policy: Arc::new(policy),
            sink,
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Process `inbound` on a background task.
    pub fn dispatch(&self, inbound: InboundMessage) -> JoinHandle<ReplyOutcome> {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.handle(inbound).await })
    }

    /// Process `inbound` in place, waiting for earlier turns of the same
    /// conversation to finish first.
    ///
    /// Messages the trigger policy does not answer are saved and reported
    /// as `NoReply`.
    pub async fn handle(&self, inbound: InboundMessage) -> ReplyOutcome {
        let lock = self.lock_for(&inbound.conversation_id);
        let span = info_span!("dispatcher.handle", conversation.id = %inbound.conversation_id);

        let outcome = async {
            let _turn = lock.lock().await;

            match self.policy.decide(&inbound) {
                TriggerDecision::SaveOnly => {
                    debug!("not addressed, saving only");
                    if let Err(e) = self.orchestrator.save_incoming(&inbound).await {
                        warn!(error = %e, "failed to save incoming message");
                    }
                    ReplyOutcome::NoReply
                }
                TriggerDecision::Reply => {
                    let outcome = self.orchestrator.reply(&inbound).await;
                    if let ReplyOutcome::Reply(text) = &outcome {
                        if let Err(e) = self.sink.send_reply(&inbound.conversation_id, text).await {
                            warn!(error = %e, "failed to deliver reply");
                        }
                    }
                    outcome
                }
            }
        }
        .instrument(span)
        .await;

        drop(lock);
        self.release_lock(&inbound.conversation_id);
        outcome
    }

    fn lock_for(&self, conversation_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(conversation_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Forget the conversation's mutex when the table holds the only reference.
    fn release_lock(&self, conversation_id: &str) {
        self.locks
            .remove_if(conversation_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::history::box_log::BoxMessageLog;
    use crate::history::in_memory::InMemoryMessageLog;
    use crate::llm::box_provider::BoxLlmProvider;
    use crate::llm::provider::LlmProvider;
    use crate::memory::box_embedder::BoxEmbedder;
    use crate::memory::box_vector::BoxVectorIndex;
    use crate::memory::embedder::Embedder;
    use crate::memory::flat::FlatVectorIndex;
    use crate::memory::indexer::ChunkIndexer;
    use crate::memory::retriever::HybridRetriever;
    use crate::reply::orchestrator::ReplySettings;
    use crate::tools::provider::{BoxWebProvider, WebProvider};
    use crate::tools::web::WebToolService;
    use groupmind_types::config::{GlobalConfig, TriggerConfig};
    use groupmind_types::error::{EmbeddingError, WebProviderError};
    use groupmind_types::llm::{ChatRequest, ChatResponse, LlmError};
    use groupmind_types::tool::{FetchedPage, SearchHit};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Sleeps inside every call and tracks the peak number of overlapping calls.
    #[derive(Default)]
    struct SlowLlm {
        active: AtomicUsize,
        peak: Arc<AtomicUsize>,
        calls: Arc<AtomicUsize>,
    }

    impl LlmProvider for SlowLlm {
        fn name(&self) -> &str {
            "slow"
        }

        async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(ChatResponse {
                content: "pong".to_string(),
                model: "slow".to_string(),
                ..Default::default()
            })
        }
    }

    struct NoEmbedder;

    impl Embedder for NoEmbedder {
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
            "none"
        }

        fn dimension(&self) -> usize {
            0
        }
    }

    struct NoWeb;

    impl WebProvider for NoWeb {
        fn is_configured(&self) -> bool {
            false
        }

        async fn search(&self, _query: &str, _max: usize) -> Result<Vec<SearchHit>, WebProviderError> {
            Ok(Vec::new())
        }

        async fn fetch(&self, _url: &str) -> Result<FetchedPage, WebProviderError> {
            Ok(FetchedPage::default())
        }
    }

    #[derive(Default)]
    struct CollectingSink {
        sent: std::sync::Mutex<Vec<(String, String)>>,
    }

    impl ReplySink for CollectingSink {
        async fn send_reply(&self, conversation_id: &str, text: &str) -> Result<(), SinkError> {
            self.sent
                .lock()
                .unwrap()
                .push((conversation_id.to_string(), text.to_string()));
            Ok(())
        }
    }

    struct Fixture {
        dispatcher: ConversationDispatcher<CollectingSink>,
        sink: Arc<CollectingSink>,
        log: Arc<BoxMessageLog>,
        peak: Arc<AtomicUsize>,
        calls: Arc<AtomicUsize>,
    }

    fn fixture(trigger: TriggerConfig) -> Fixture {
        let config = GlobalConfig::default();
        let log = Arc::new(BoxMessageLog::new(InMemoryMessageLog::new()));
        let embedder = Arc::new(BoxEmbedder::new(NoEmbedder));
        let index = Arc::new(BoxVectorIndex::new(FlatVectorIndex::new()));
        let llm = SlowLlm::default();
        let peak = llm.peak.clone();
        let calls = llm.calls.clone();

        let orchestrator = ReplyOrchestrator::new(
            log.clone(),
            HybridRetriever::new(log.clone(), embedder.clone(), index.clone(), 10),
            ChunkIndexer::new(log.clone(), embedder, index),
            Arc::new(BoxLlmProvider::new(llm)),
            Arc::new(WebToolService::new(
                Arc::new(BoxWebProvider::new(NoWeb)),
                &config.web,
                Arc::new(SystemClock),
            )),
            Arc::new(SystemClock),
            ReplySettings::from_config(&config),
        );

        let sink = Arc::new(CollectingSink::default());
        Fixture {
            dispatcher: ConversationDispatcher::new(
                Arc::new(orchestrator),
                TriggerPolicy::new(&trigger),
                sink.clone(),
            ),
            sink,
            log,
            peak,
            calls,
        }
    }

    #[tokio::test]
    async fn same_conversation_never_overlaps() {
        let f = fixture(TriggerConfig::default());

        let a = f.dispatcher.dispatch(InboundMessage::new("g1", "one"));
        let b = f.dispatcher.dispatch(InboundMessage::new("g1", "two"));
        a.await.unwrap();
        b.await.unwrap();

        assert_eq!(f.calls.load(Ordering::SeqCst), 2);
        assert_eq!(f.peak.load(Ordering::SeqCst), 1);
        assert_eq!(f.log.count("g1").await.unwrap(), 4);
        assert_eq!(f.sink.sent.lock().unwrap().len(), 2);
        assert!(f.dispatcher.locks.is_empty());
    }

    #[tokio::test]
    async fn lock_table_keeps_only_busy_conversations() {
        let f = fixture(TriggerConfig::default());

        for id in ["g1", "g2", "g3"] {
            f.dispatcher.handle(InboundMessage::new(id, "hi")).await;
        }
        assert!(f.dispatcher.locks.is_empty());

        let busy = f.dispatcher.dispatch(InboundMessage::new("g4", "slow one"));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(f.dispatcher.locks.contains_key("g4"));

        busy.await.unwrap();
        assert!(f.dispatcher.locks.is_empty());
    }

    #[tokio::test]
    async fn different_conversations_run_in_parallel() {
        let f = fixture(TriggerConfig::default());

        let a = f.dispatcher.dispatch(InboundMessage::new("g1", "one"));
        let b = f.dispatcher.dispatch(InboundMessage::new("g2", "two"));
        a.await.unwrap();
        b.await.unwrap();

        assert_eq!(f.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unaddressed_message_is_saved_without_reply() {
        let f = fixture(TriggerConfig {
            trigger_on_mention: true,
            bot_username: "gbot".to_string(),
            trigger_words: Vec::new(),
        });

        let outcome = f.dispatcher.handle(InboundMessage::new("g1", "chit chat")).await;
        assert_eq!(outcome, ReplyOutcome::NoReply);
        assert_eq!(f.calls.load(Ordering::SeqCst), 0);
        assert_eq!(f.log.count("g1").await.unwrap(), 1);
        assert!(f.sink.sent.lock().unwrap().is_empty());

        let outcome = f.dispatcher.handle(InboundMessage::new("g1", "@gbot ping")).await;
        assert_eq!(outcome, ReplyOutcome::Reply("pong".to_string()));
        assert_eq!(
            f.sink.sent.lock().unwrap().as_slice(),
            &[("g1".to_string(), "pong".to_string())]
        );
    }
}
