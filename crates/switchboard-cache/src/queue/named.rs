//! Queues bound to a fixed name and payload type.

use super::{PriorityQueue, QueueJob};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::marker::PhantomData;
use switchboard_core::JobId;

/// A [`PriorityQueue`] bound to one queue name and one payload type.
pub struct NamedQueue<P> {
    queue: PriorityQueue,
    name: String,
    _payload: PhantomData<fn() -> P>,
}

impl<P> Clone for NamedQueue<P> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            name: self.name.clone(),
            _payload: PhantomData,
        }
    }
}

impl<P> fmt::Debug for NamedQueue<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedQueue")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<P> NamedQueue<P>
where
    P: Serialize + DeserializeOwned + Sync,
{
    #[must_use]
    pub fn new(queue: PriorityQueue, name: impl Into<String>) -> Self {
        Self {
            queue,
            name: name.into(),
            _payload: PhantomData,
        }
    }

    /// The queue name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enqueues a payload; `None` on failure.
    pub async fn add(&self, payload: &P, priority: f64) -> Option<JobId> {
        self.queue.add_job(&self.name, payload, priority).await
    }

    /// Pops the highest-priority job; `None` if empty or on failure.
    pub async fn pop(&self) -> Option<QueueJob<P>> {
        self.queue.get_next_job(&self.name).await
    }

    /// Number of waiting jobs; `None` on failure.
    pub async fn length(&self) -> Option<u64> {
        self.queue.get_queue_length(&self.name).await
    }
}

/// An outbound message waiting for a delivery worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    pub to: String,
    #[serde(default)]
    pub from: Option<String>,
    pub body: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl OutboundMessage {
    #[must_use]
    pub fn new(to: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            from: None,
            body: body.into(),
            tenant_id: None,
            metadata: Map::new(),
        }
    }
}

/// An event that should run a conversation automation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationTrigger {
    pub automation_id: String,
    pub participant_id: String,
    pub event: String,
    #[serde(default)]
    pub context: Map<String, Value>,
}

/// Queue of outbound messages.
pub type MessageQueue = NamedQueue<OutboundMessage>;

/// Queue of automation triggers.
pub type AutomationQueue = NamedQueue<AutomationTrigger>;
