//! Session history adapter.
//!
//! Maps a logical conversation session (one user, one persona) onto a
//! filtered, ordered view over the message store. Translation is one-way in
//! each direction: stored rows become [`Turn`]s on read, and turns become
//! directed rows on write (`user` turns flow human -> AI, `assistant` turns
//! flow AI -> human).
//!
//! Only rows tagged with this session's id are visible; untagged rows for
//! the same participant pair are excluded so sessions sharing the two ids
//! cannot bleed into each other.

use kindred_types::error::RepositoryError;
use kindred_types::message::{Message, NewMessage, SortOrder, Turn, TurnRole};

use crate::repository::message::MessageRepository;

/// A session-scoped view over the message store.
pub struct SessionHistory<'a, R: MessageRepository> {
    repo: &'a R,
    user_id: i64,
    ai_user_id: i64,
    session_id: &'a str,
}

impl<'a, R: MessageRepository> SessionHistory<'a, R> {
    /// Bind a history view to a participant pair and session id.
    pub fn new(repo: &'a R, user_id: i64, ai_user_id: i64, session_id: &'a str) -> Self {
        Self {
            repo,
            user_id,
            ai_user_id,
            session_id,
        }
    }

    /// The most recent turns of this session, ascending by timestamp.
    ///
    /// With a limit, the *last* `limit` turns are returned (still oldest
    /// first); without one, the whole session.
    pub async fn history(&self, limit: Option<usize>) -> Result<Vec<Turn>, RepositoryError> {
        let messages = match limit {
            Some(n) => {
                let mut recent = self
                    .repo
                    .list_between(
                        self.user_id,
                        self.ai_user_id,
                        Some(self.session_id),
                        SortOrder::Desc,
                        Some(n as i64),
                    )
                    .await?;
                recent.reverse();
                recent
            }
            None => {
                self.repo
                    .list_between(
                        self.user_id,
                        self.ai_user_id,
                        Some(self.session_id),
                        SortOrder::Asc,
                        None,
                    )
                    .await?
            }
        };

        Ok(messages.iter().map(Turn::from_message).collect())
    }

    /// Append a turn, mapping its role to the correct sender/receiver pair.
    pub async fn append_turn(
        &self,
        role: TurnRole,
        content: &str,
    ) -> Result<Message, RepositoryError> {
        let (sender_id, receiver_id, is_ai) = match role {
            TurnRole::User => (self.user_id, self.ai_user_id, false),
            TurnRole::Assistant => (self.ai_user_id, self.user_id, true),
        };

        self.repo
            .append(&NewMessage {
                sender_id,
                receiver_id,
                content: content.to_string(),
                is_ai,
                session_id: Some(self.session_id.to_string()),
            })
            .await
    }

    /// Delete the rows tagged with this session. Returns the removed count.
    pub async fn clear(&self) -> Result<u64, RepositoryError> {
        self.repo
            .delete_session(self.user_id, self.ai_user_id, self.session_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Mutex;

    /// In-memory MessageRepository for adapter tests.
    #[derive(Default)]
    struct InMemoryMessages {
        rows: Mutex<Vec<Message>>,
        next_id: AtomicI64,
    }

    impl MessageRepository for InMemoryMessages {
        async fn append(&self, message: &NewMessage) -> Result<Message, RepositoryError> {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            let stored = Message {
                id,
                sender_id: message.sender_id,
                receiver_id: message.receiver_id,
                content: message.content.clone(),
                is_ai: message.is_ai,
                created_at: Utc::now(),
                session_id: message.session_id.clone(),
            };
            self.rows.lock().unwrap().push(stored.clone());
            Ok(stored)
        }

        async fn list_between(
            &self,
            user_a: i64,
            user_b: i64,
            session_id: Option<&str>,
            order: SortOrder,
            limit: Option<i64>,
        ) -> Result<Vec<Message>, RepositoryError> {
            let rows = self.rows.lock().unwrap();
            let mut matched: Vec<Message> = rows
                .iter()
                .filter(|m| {
                    (m.sender_id == user_a && m.receiver_id == user_b)
                        || (m.sender_id == user_b && m.receiver_id == user_a)
                })
                .filter(|m| match session_id {
                    Some(sid) => m.session_id.as_deref() == Some(sid),
                    None => true,
                })
                .cloned()
                .collect();
            matched.sort_by_key(|m| (m.created_at, m.id));
            if order == SortOrder::Desc {
                matched.reverse();
            }
            if let Some(n) = limit {
                matched.truncate(n as usize);
            }
            Ok(matched)
        }

        async fn delete_session(
            &self,
            user_a: i64,
            user_b: i64,
            session_id: &str,
        ) -> Result<u64, RepositoryError> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|m| {
                let in_pair = (m.sender_id == user_a && m.receiver_id == user_b)
                    || (m.sender_id == user_b && m.receiver_id == user_a);
                !(in_pair && m.session_id.as_deref() == Some(session_id))
            });
            Ok((before - rows.len()) as u64)
        }

        async fn count_for_session(&self, session_id: &str) -> Result<u64, RepositoryError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.session_id.as_deref() == Some(session_id))
                .count() as u64)
        }
    }

    const USER: i64 = 1;
    const AI: i64 = 2;

    #[tokio::test]
    async fn test_append_turn_maps_roles_to_directions() {
        let repo = InMemoryMessages::default();
        let history = SessionHistory::new(&repo, USER, AI, "1_Alice");

        let user_msg = history.append_turn(TurnRole::User, "hi").await.unwrap();
        assert_eq!(user_msg.sender_id, USER);
        assert_eq!(user_msg.receiver_id, AI);
        assert!(!user_msg.is_ai);

        let ai_msg = history.append_turn(TurnRole::Assistant, "hello!").await.unwrap();
        assert_eq!(ai_msg.sender_id, AI);
        assert_eq!(ai_msg.receiver_id, USER);
        assert!(ai_msg.is_ai);

        assert_eq!(user_msg.session_id.as_deref(), Some("1_Alice"));
        assert_eq!(ai_msg.session_id.as_deref(), Some("1_Alice"));
    }

    #[tokio::test]
    async fn test_history_ascending_and_session_scoped() {
        let repo = InMemoryMessages::default();
        let alice = SessionHistory::new(&repo, USER, AI, "1_Alice");
        let sage = SessionHistory::new(&repo, USER, AI, "1_Sage");

        alice.append_turn(TurnRole::User, "first").await.unwrap();
        sage.append_turn(TurnRole::User, "other session").await.unwrap();
        alice.append_turn(TurnRole::Assistant, "second").await.unwrap();
        alice.append_turn(TurnRole::User, "third").await.unwrap();

        let turns = alice.history(None).await.unwrap();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].content, "first");
        assert_eq!(turns[1].content, "second");
        assert_eq!(turns[2].content, "third");
        for window in turns.windows(2) {
            assert!(window[0].created_at <= window[1].created_at);
        }
    }

    #[tokio::test]
    async fn test_history_excludes_untagged_rows() {
        let repo = InMemoryMessages::default();
        // A legacy row between the same pair with no session tag.
        repo.append(&NewMessage {
            sender_id: USER,
            receiver_id: AI,
            content: "untagged".to_string(),
            is_ai: false,
            session_id: None,
        })
        .await
        .unwrap();

        let history = SessionHistory::new(&repo, USER, AI, "1_Alice");
        history.append_turn(TurnRole::User, "tagged").await.unwrap();

        let turns = history.history(None).await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].content, "tagged");
    }

    #[tokio::test]
    async fn test_history_limit_keeps_most_recent_oldest_first() {
        let repo = InMemoryMessages::default();
        let history = SessionHistory::new(&repo, USER, AI, "1_Alice");

        for i in 0..5 {
            history
                .append_turn(TurnRole::User, &format!("msg{i}"))
                .await
                .unwrap();
        }

        let turns = history.history(Some(2)).await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "msg3");
        assert_eq!(turns[1].content, "msg4");
    }

    #[tokio::test]
    async fn test_history_limit_larger_than_session() {
        let repo = InMemoryMessages::default();
        let history = SessionHistory::new(&repo, USER, AI, "1_Alice");

        for i in 0..5 {
            history
                .append_turn(TurnRole::User, &format!("msg{i}"))
                .await
                .unwrap();
        }

        let turns = history.history(Some(20)).await.unwrap();
        assert_eq!(turns.len(), 5);
        assert_eq!(turns[0].content, "msg0");
    }

    #[tokio::test]
    async fn test_clear_removes_only_this_session() {
        let repo = InMemoryMessages::default();
        let alice = SessionHistory::new(&repo, USER, AI, "1_Alice");
        let sage = SessionHistory::new(&repo, USER, AI, "1_Sage");

        alice.append_turn(TurnRole::User, "a1").await.unwrap();
        alice.append_turn(TurnRole::Assistant, "a2").await.unwrap();
        sage.append_turn(TurnRole::User, "s1").await.unwrap();

        let deleted = alice.clear().await.unwrap();
        assert_eq!(deleted, 2);

        assert!(alice.history(None).await.unwrap().is_empty());
        assert_eq!(sage.history(None).await.unwrap().len(), 1);
    }
}
