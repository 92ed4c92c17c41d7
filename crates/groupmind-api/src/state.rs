//! Application state wiring all services together.
//!
//! AppState pins the core engine to concrete infra implementations: SQLite
//! and LanceDB under the data directory, or in-memory stores when
//! `--ephemeral` is passed.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use groupmind_core::clock::{Clock, SystemClock};
use groupmind_core::history::box_log::BoxMessageLog;
use groupmind_core::history::in_memory::InMemoryMessageLog;
use groupmind_core::memory::box_embedder::BoxEmbedder;
use groupmind_core::memory::box_vector::BoxVectorIndex;
use groupmind_core::memory::flat::FlatVectorIndex;
use groupmind_core::memory::indexer::ChunkIndexer;
use groupmind_core::memory::retriever::HybridRetriever;
use groupmind_core::reply::orchestrator::{ReplyOrchestrator, ReplySettings};
use groupmind_core::reply::trigger::TriggerPolicy;
use groupmind_core::tools::provider::BoxWebProvider;
use groupmind_core::tools::web::WebToolService;
use groupmind_infra::config::{data_dir, load_global_config, vector_dir};
use groupmind_infra::embedding::ollama::OllamaEmbedder;
use groupmind_infra::llm::create_provider;
use groupmind_infra::sqlite::message::SqliteMessageLog;
use groupmind_infra::sqlite::pool::{DatabasePool, database_url};
use groupmind_infra::vector::chunk_index::LanceChunkIndex;
use groupmind_infra::vector::lance::LanceVectorStore;
use groupmind_infra::web::ollama::OllamaWebClient;
use groupmind_types::config::GlobalConfig;

/// Shared application state used by every CLI command.
#[derive(Clone)]
pub struct AppState {
    pub config: GlobalConfig,
    pub data_dir: PathBuf,
    pub ephemeral: bool,
    pub log: Arc<BoxMessageLog>,
    pub index: Arc<BoxVectorIndex>,
    pub retriever: HybridRetriever,
    pub indexer: ChunkIndexer,
    pub web: Arc<WebToolService>,
    pub orchestrator: Arc<ReplyOrchestrator>,
}

impl AppState {
    /// Load config, open storage and wire the reply engine.
    pub async fn init(ephemeral: bool) -> anyhow::Result<Self> {
        let data_dir = data_dir();
        let config = load_global_config(&data_dir).await;

        let (log, index) = if ephemeral {
            (
                Arc::new(BoxMessageLog::new(InMemoryMessageLog::new())),
                Arc::new(BoxVectorIndex::new(FlatVectorIndex::new())),
            )
        } else {
            tokio::fs::create_dir_all(&data_dir)
                .await
                .with_context(|| format!("failed to create {}", data_dir.display()))?;

            let pool = DatabasePool::new(&database_url(&data_dir)).await?;
            let store = LanceVectorStore::new(vector_dir(&config, &data_dir))
                .await
                .context("failed to open vector store")?;
            (
                Arc::new(BoxMessageLog::new(SqliteMessageLog::new(pool))),
                Arc::new(BoxVectorIndex::new(LanceChunkIndex::new(store))),
            )
        };

        let embedder = Arc::new(BoxEmbedder::new(OllamaEmbedder::new(&config.embedding)?));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let retriever = HybridRetriever::new(
            log.clone(),
            embedder.clone(),
            index.clone(),
            config.retrieval.fallback_limit,
        );
        let indexer = ChunkIndexer::new(log.clone(), embedder, index.clone());
        let web = Arc::new(WebToolService::new(
            Arc::new(BoxWebProvider::new(OllamaWebClient::new(&config.web)?)),
            &config.web,
            clock.clone(),
        ));
        let llm = Arc::new(create_provider(&config.llm)?);

        let orchestrator = Arc::new(ReplyOrchestrator::new(
            log.clone(),
            retriever.clone(),
            indexer.clone(),
            llm,
            web.clone(),
            clock,
            ReplySettings::from_config(&config),
        ));

        Ok(Self {
            config,
            data_dir,
            ephemeral,
            log,
            index,
            retriever,
            indexer,
            web,
            orchestrator,
        })
    }

    pub fn trigger_policy(&self) -> TriggerPolicy {
        TriggerPolicy::new(&self.config.trigger)
    }
}
