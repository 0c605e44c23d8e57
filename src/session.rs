//! Per-user session context: conversation history plus a lazily built agent.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::agent::{AgentFactory, AgentRuntime};
use crate::conversation::ConversationStore;
use crate::error::TurnError;
use crate::instrumentation::TurnLog;
use crate::prompt::{assemble, SYSTEM_TEMPLATE};

pub struct Session {
    id: Uuid,
    history: ConversationStore,
    agent: Option<Arc<AgentRuntime>>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            history: ConversationStore::new(),
            agent: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn history(&self) -> &ConversationStore {
        &self.history
    }

    /// The session's agent, built on first call and reused afterwards.
    pub fn agent(&mut self, factory: &dyn AgentFactory) -> Arc<AgentRuntime> {
        let id = self.id;
        self.agent
            .get_or_insert_with(|| {
                tracing::debug!(session = %id, "initialising agent");
                Arc::new(factory.build())
            })
            .clone()
    }

    /// Run one turn. History is only touched once an answer is in hand.
    pub async fn submit(
        &mut self,
        query: &str,
        factory: &dyn AgentFactory,
    ) -> Result<TurnLog, TurnError> {
        if query.trim().is_empty() {
            return Err(TurnError::EmptyQuery);
        }

        let started = Instant::now();
        let envelope = assemble(SYSTEM_TEMPLATE, &self.history, query);
        let agent = self.agent(factory);

        let answer = match agent.run(&envelope).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(session = %self.id, error = %e, "turn failed");
                return Err(e.into());
            }
        };

        self.history.append_exchange(query, answer.text.clone());

        Ok(TurnLog {
            id: Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            session_id: self.id.to_string(),
            query: query.to_string(),
            tool_calls: answer.tool_calls,
            model_calls: answer.model_calls,
            input_tokens: answer.input_tokens,
            output_tokens: answer.output_tokens,
            total_cost: answer.cost,
            total_latency_ms: started.elapsed().as_millis() as u64,
            answer: answer.text,
        })
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

struct Entry {
    session: Arc<tokio::sync::Mutex<Session>>,
    last_active: Instant,
}

/// Live sessions keyed by id. A session's mutex serialises its turns.
///
/// A session ends once it has been idle longer than `idle_timeout`; expired
/// entries are dropped the next time the store is touched.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<Uuid, Entry>>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Existing session for `id`, or a fresh one under that id.
    pub fn get_or_create(&self, id: Uuid) -> Arc<tokio::sync::Mutex<Session>> {
        self.get_or_create_at(id, Instant::now())
    }

    fn get_or_create_at(&self, id: Uuid, now: Instant) -> Arc<tokio::sync::Mutex<Session>> {
        let mut sessions = self.lock();
        self.evict_expired(&mut sessions, now);
        let entry = sessions.entry(id).or_insert_with(|| Entry {
            session: Arc::new(tokio::sync::Mutex::new(Session::with_id(id))),
            last_active: now,
        });
        entry.last_active = now;
        entry.session.clone()
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<tokio::sync::Mutex<Session>>> {
        self.get_at(id, Instant::now())
    }

    fn get_at(&self, id: &Uuid, now: Instant) -> Option<Arc<tokio::sync::Mutex<Session>>> {
        let mut sessions = self.lock();
        self.evict_expired(&mut sessions, now);
        sessions.get_mut(id).map(|entry| {
            entry.last_active = now;
            entry.session.clone()
        })
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Entry>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // Sessions with a turn in flight are held elsewhere and kept.
    fn evict_expired(&self, sessions: &mut HashMap<Uuid, Entry>, now: Instant) {
        let before = sessions.len();
        sessions.retain(|_, entry| {
            now.saturating_duration_since(entry.last_active) <= self.idle_timeout
                || Arc::strong_count(&entry.session) > 1
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = sessions.len(), "dropped idle sessions");
        }
    }
}
