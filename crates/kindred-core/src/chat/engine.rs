//! Companion chat orchestrator.
//!
//! Drives one chat turn end to end:
//! receive input -> retrieve context -> build prompt -> invoke model ->
//! persist -> respond. The engine is stateless across turns beyond what the
//! stores hold; per-session mutexes serialize concurrent turns for the same
//! session so a turn mid-assembly always sees a consistent history snapshot.
//!
//! Failure policy:
//! - Embedding/retrieval problems degrade to an empty context (the turn
//!   continues).
//! - A model failure or timeout is replaced with the configured fallback
//!   reply; the turn is still persisted so the conversation stays auditable.
//! - Store-level failures are the only errors that abort a turn.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::{Mutex, OnceCell};
use tracing::{info, warn};

use kindred_types::config::AppConfig;
use kindred_types::error::ChatError;
use kindred_types::identity::{NewUser, User, AI_USERNAME};
use kindred_types::llm::CompletionRequest;
use kindred_types::memory::EmbeddingRecord;
use kindred_types::message::{ChatExchange, HistoryEntry, Message, TurnRole};
use kindred_types::persona::Persona;

use crate::llm::box_model::BoxChatModel;
use crate::memory::service::SemanticMemory;
use crate::repository::message::MessageRepository;
use crate::repository::user::UserRepository;

use super::history::SessionHistory;
use super::prompt::{build_prompt, PromptOptions};

/// Result of clearing one session.
#[derive(Debug, Clone, Serialize)]
pub struct ClearedSession {
    pub messages_deleted: u64,
    pub embeddings_deleted: u64,
}

/// Orchestrates companion chat turns.
///
/// Generic over the message and user repositories; the generation model and
/// semantic memory are injected type-erased so tests can substitute fakes.
pub struct CompanionEngine<R: MessageRepository, U: UserRepository> {
    messages: R,
    users: U,
    memory: SemanticMemory,
    model: BoxChatModel,
    config: AppConfig,
    session_locks: DashMap<String, Arc<Mutex<()>>>,
    ai_user: OnceCell<User>,
}

impl<R: MessageRepository, U: UserRepository> CompanionEngine<R, U> {
    /// Create a new engine over the given collaborators.
    pub fn new(
        messages: R,
        users: U,
        memory: SemanticMemory,
        model: BoxChatModel,
        config: AppConfig,
    ) -> Self {
        Self {
            messages,
            users,
            memory,
            model,
            config,
            session_locks: DashMap::new(),
            ai_user: OnceCell::new(),
        }
    }

    /// Access the message repository.
    pub fn messages(&self) -> &R {
        &self.messages
    }

    /// Access the user repository.
    pub fn users(&self) -> &U {
        &self.users
    }

    /// Access the semantic memory service.
    pub fn memory(&self) -> &SemanticMemory {
        &self.memory
    }

    /// Load a user by id, surfacing `UserNotFound` when absent.
    pub async fn get_user(&self, id: i64) -> Result<User, ChatError> {
        self.users
            .get(id)
            .await?
            .ok_or(ChatError::UserNotFound(id))
    }

    /// The synthetic AI counterparty, created lazily on first use.
    pub async fn ai_user(&self) -> Result<User, ChatError> {
        let user = self
            .ai_user
            .get_or_try_init(|| async {
                if let Some(existing) = self.users.get_by_username(AI_USERNAME).await? {
                    return Ok(existing);
                }
                match self
                    .users
                    .create(&NewUser {
                        username: AI_USERNAME.to_string(),
                        email: None,
                    })
                    .await
                {
                    Ok(created) => {
                        info!(ai_user_id = created.id, "created AI system user");
                        Ok(created)
                    }
                    // Lost a create race with a concurrent request; read back.
                    Err(kindred_types::error::RepositoryError::Conflict(_)) => self
                        .users
                        .get_by_username(AI_USERNAME)
                        .await?
                        .ok_or(kindred_types::error::RepositoryError::NotFound),
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(ChatError::Storage)?;

        Ok(user.clone())
    }

    /// Run one companion turn: retrieve context, build the prompt, invoke
    /// the model, persist both sides, and return the exchange.
    ///
    /// `persona` must already be resolved (username substituted) and
    /// `session_id` derived from the same persona reference.
    pub async fn send_message(
        &self,
        user: &User,
        persona: &Persona,
        session_id: &str,
        input: &str,
    ) -> Result<ChatExchange, ChatError> {
        let lock = self.session_lock(session_id);
        let _guard = lock.lock().await;

        let ai_user = self.ai_user().await?;
        let history = SessionHistory::new(&self.messages, user.id, ai_user.id, session_id);

        // RETRIEVE_CONTEXT: degraded to empty on any memory failure.
        let recalled = self
            .memory
            .recall(input, session_id, self.config.recall_top_k)
            .await;

        // BUILD_PROMPT over a consistent history snapshot.
        let recent = history.history(Some(self.config.history_window)).await?;
        let opts = PromptOptions {
            max_examples: self.config.max_examples,
            history_window: self.config.history_window,
            ..Default::default()
        };
        let request = build_prompt(persona, &recent, &recalled, input, &opts).into_request(
            &self.config.model,
            self.config.temperature,
            self.config.max_tokens,
        );

        // INVOKE_MODEL: failures collapse to the fallback reply.
        let reply = self.invoke_model(&request, session_id).await;

        // PERSIST: both rows are written whatever the reply's origin.
        let user_msg = history.append_turn(TurnRole::User, input).await?;
        let ai_msg = history.append_turn(TurnRole::Assistant, &reply).await?;

        self.memory
            .remember(embedding_record(&user_msg, session_id, &persona.name, user.id))
            .await;
        self.memory
            .remember(embedding_record(&ai_msg, session_id, &persona.name, user.id))
            .await;

        Ok(ChatExchange {
            user_message: user_msg.content,
            ai_response: ai_msg.content,
            timestamp: ai_msg.created_at,
        })
    }

    /// The last `limit` turns of a session, oldest first, annotated for
    /// display (persona name for AI turns, the username otherwise).
    ///
    /// Reads go through the session history adapter, never the vector index.
    pub async fn history(
        &self,
        user: &User,
        persona_name: &str,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, ChatError> {
        let ai_user = self.ai_user().await?;
        let history = SessionHistory::new(&self.messages, user.id, ai_user.id, session_id);
        let turns = history.history(Some(limit)).await?;

        Ok(turns
            .into_iter()
            .map(|turn| HistoryEntry {
                message_id: turn.message_id,
                from: match turn.role {
                    TurnRole::Assistant => persona_name.to_string(),
                    TurnRole::User => user.username.clone(),
                },
                content: turn.content,
                timestamp: turn.created_at,
            })
            .collect())
    }

    /// Delete a session's message rows and embedding records.
    pub async fn clear_session(
        &self,
        user: &User,
        session_id: &str,
    ) -> Result<ClearedSession, ChatError> {
        let lock = self.session_lock(session_id);
        let _guard = lock.lock().await;

        let ai_user = self.ai_user().await?;
        let history = SessionHistory::new(&self.messages, user.id, ai_user.id, session_id);

        let messages_deleted = history.clear().await?;
        let embeddings_deleted = self.memory.forget_session(session_id).await;

        info!(
            session_id = %session_id,
            messages_deleted,
            embeddings_deleted,
            "session cleared"
        );

        Ok(ClearedSession {
            messages_deleted,
            embeddings_deleted,
        })
    }

    fn session_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        self.session_locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn invoke_model(&self, request: &CompletionRequest, session_id: &str) -> String {
        let timeout = Duration::from_millis(self.config.generation_timeout_ms);

        match tokio::time::timeout(timeout, self.model.complete(request)).await {
            Ok(Ok(response)) if !response.content.trim().is_empty() => response.content,
            Ok(Ok(_)) => {
                warn!(session_id = %session_id, "model returned an empty reply, using fallback");
                self.config.fallback_reply.clone()
            }
            Ok(Err(e)) => {
                warn!(session_id = %session_id, error = %e, "generation failed, using fallback");
                self.config.fallback_reply.clone()
            }
            Err(_) => {
                warn!(
                    session_id = %session_id,
                    timeout_ms = self.config.generation_timeout_ms,
                    "generation timed out, using fallback"
                );
                self.config.fallback_reply.clone()
            }
        }
    }
}

fn embedding_record(
    message: &Message,
    session_id: &str,
    persona: &str,
    user_id: i64,
) -> EmbeddingRecord {
    EmbeddingRecord {
        message_id: message.id,
        document: message.content.clone(),
        role: if message.is_ai {
            TurnRole::Assistant
        } else {
            TurnRole::User
        },
        session_id: session_id.to_string(),
        persona: persona.to_string(),
        user_id,
        created_at: message.created_at,
    }
}
