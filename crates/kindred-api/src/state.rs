//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by the REST API.
//! Services are generic over repository traits, but AppState pins them to
//! the concrete infra implementations. The LanceDB connection and the
//! embedding model are initialized once here and live for the process.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use kindred_core::chat::engine::CompanionEngine;
use kindred_core::llm::box_model::BoxChatModel;
use kindred_core::memory::box_embedder::BoxEmbedder;
use kindred_core::memory::box_index::BoxSemanticIndex;
use kindred_core::memory::service::SemanticMemory;
use kindred_core::persona::service::PersonaService;
use kindred_infra::config::{api_key_from_env, load_config, resolve_data_dir, API_KEY_ENV};
use kindred_infra::llm::groq::GroqChatModel;
use kindred_infra::sqlite::message::SqliteMessageRepository;
use kindred_infra::sqlite::persona::SqlitePersonaRepository;
use kindred_infra::sqlite::pool::DatabasePool;
use kindred_infra::sqlite::user::SqliteUserRepository;
use kindred_infra::vector::embedder::FastEmbedder;
use kindred_infra::vector::index::LanceSemanticIndex;
use kindred_infra::vector::lance::LanceVectorStore;
use kindred_types::config::AppConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteEngine = CompanionEngine<SqliteMessageRepository, SqliteUserRepository>;

pub type ConcretePersonaService = PersonaService<SqlitePersonaRepository>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ConcreteEngine>,
    pub persona_service: Arc<ConcretePersonaService>,
    pub config: AppConfig,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: connect to the stores, load the
    /// embedding model, and wire the services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;

        // Initialize database
        let db_url = format!(
            "sqlite://{}?mode=rwc",
            data_dir.join("kindred.db").display()
        );
        let db_pool = DatabasePool::new(&db_url).await?;
        tracing::info!(data_dir = %data_dir.display(), model = %config.model, "state initializing");

        // Generation model (the only secret-bearing collaborator)
        let api_key = api_key_from_env()
            .ok_or_else(|| anyhow::anyhow!("{API_KEY_ENV} must be set to serve"))?;
        let model = BoxChatModel::new(GroqChatModel::new(&api_key, &config.model));

        // Semantic memory: local embedder + LanceDB index, injected as one
        // shared handle for the process lifetime
        let embedder = BoxEmbedder::new(FastEmbedder::new()?);
        let vector_store = LanceVectorStore::new(data_dir.join("vector_store")).await?;
        let index = BoxSemanticIndex::new(LanceSemanticIndex::new(vector_store));
        let memory = SemanticMemory::new(
            embedder,
            index,
            Duration::from_millis(config.embedding_timeout_ms),
        );

        // Wire the chat engine with its repositories
        let engine = CompanionEngine::new(
            SqliteMessageRepository::new(db_pool.clone()),
            SqliteUserRepository::new(db_pool.clone()),
            memory,
            model,
            config.clone(),
        );

        let persona_service = PersonaService::new(SqlitePersonaRepository::new(db_pool.clone()));

        Ok(Self {
            engine: Arc::new(engine),
            persona_service: Arc::new(persona_service),
            config,
            data_dir,
            db_pool,
        })
    }
}
