//! Short-lived conversation state keyed by participant.

use crate::keys::CacheKeys;
use crate::manager::{collapse, CacheManager};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use switchboard_core::CacheResult;
use tracing::debug;

/// Position in a conversation flow: a step number or a named step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Step {
    Number(i64),
    Text(String),
}

impl From<i64> for Step {
    fn from(step: i64) -> Self {
        Self::Number(step)
    }
}

impl From<&str> for Step {
    fn from(step: &str) -> Self {
        Self::Text(step.to_string())
    }
}

impl From<String> for Step {
    fn from(step: String) -> Self {
        Self::Text(step)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Where a participant is in a conversation, plus accumulated context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationState {
    pub participant_id: String,
    pub step: Step,
    #[serde(default)]
    pub context_data: Map<String, Value>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationState {
    /// A state at `step` with empty context.
    #[must_use]
    pub fn new(participant_id: impl Into<String>, step: impl Into<Step>) -> Self {
        Self {
            participant_id: participant_id.into(),
            step: step.into(),
            context_data: Map::new(),
            updated_at: Utc::now(),
        }
    }

    /// Moves to `step` and shallow-merges `context` over the existing context.
    pub fn advance(&mut self, step: Step, context: Map<String, Value>) {
        self.step = step;
        self.context_data.extend(context);
        self.updated_at = Utc::now();
    }
}

/// Conversation state under `conversation:<participantId>`.
#[derive(Clone)]
pub struct ConversationStateCache {
    cache: CacheManager,
    keys: CacheKeys,
    ttl_secs: u64,
}

impl ConversationStateCache {
    /// Creates the cache. `ttl_secs` applies to every write without an explicit TTL.
    #[must_use]
    pub fn new(cache: CacheManager, keys: CacheKeys, ttl_secs: u64) -> Self {
        Self {
            cache,
            keys,
            ttl_secs,
        }
    }

    /// Default state lifetime in seconds.
    #[must_use]
    pub const fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Overwrites the stored state.
    pub async fn set_state(&self, participant_id: &str, state: &ConversationState) -> bool {
        self.set_state_with_ttl(participant_id, state, self.ttl_secs)
            .await
    }

    /// Overwrites the stored state with an explicit TTL.
    pub async fn set_state_with_ttl(
        &self,
        participant_id: &str,
        state: &ConversationState,
        ttl_secs: u64,
    ) -> bool {
        self.cache
            .set_with_ttl(&self.keys.conversation(participant_id), state, Some(ttl_secs))
            .await
    }

    /// Loads the stored state; `None` if absent or on failure.
    pub async fn get_state(&self, participant_id: &str) -> Option<ConversationState> {
        self.cache.get(&self.keys.conversation(participant_id)).await
    }

    /// Advances to `step`, merging `context` into the stored context, and
    /// refreshes the TTL. Returns the new state; `None` on failure.
    pub async fn update_step(
        &self,
        participant_id: &str,
        step: impl Into<Step>,
        context: Map<String, Value>,
    ) -> Option<ConversationState> {
        self.update_step_with_ttl(participant_id, step, context, self.ttl_secs)
            .await
    }

    /// Like [`ConversationStateCache::update_step`] with an explicit TTL.
    pub async fn update_step_with_ttl(
        &self,
        participant_id: &str,
        step: impl Into<Step>,
        context: Map<String, Value>,
        ttl_secs: u64,
    ) -> Option<ConversationState> {
        let key = self.keys.conversation(participant_id);
        let result = self
            .try_update_step(&key, participant_id, step.into(), context, ttl_secs)
            .await;
        collapse("update_step", &key, result)
    }

    async fn try_update_step(
        &self,
        key: &str,
        participant_id: &str,
        step: Step,
        context: Map<String, Value>,
        ttl_secs: u64,
    ) -> CacheResult<ConversationState> {
        // A failed read aborts instead of overwriting context we could not see.
        let mut state = self
            .cache
            .try_get::<ConversationState>(key)
            .await?
            .unwrap_or_else(|| ConversationState::new(participant_id, step.clone()));

        state.participant_id = participant_id.to_string();
        state.advance(step, context);
        self.cache.try_set(key, &state, Some(ttl_secs)).await?;

        debug!(participant_id, step = %state.step, "Conversation step updated");
        Ok(state)
    }

    /// Deletes the stored state. Returns `true` if it existed.
    pub async fn clear_state(&self, participant_id: &str) -> bool {
        self.cache
            .delete(&self.keys.conversation(participant_id))
            .await
    }
}
