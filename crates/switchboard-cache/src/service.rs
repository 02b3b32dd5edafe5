//! The unified state facade.

use crate::conversation::ConversationStateCache;
use crate::health::HealthMonitor;
use crate::keys::CacheKeys;
use crate::manager::CacheManager;
use crate::queue::{AutomationQueue, MessageQueue, PriorityQueue};
use crate::rate_limit::{RateLimitPolicy, RateLimiter};
use crate::session::SessionStore;
use std::sync::Arc;
use switchboard_config::{AppConfig, CacheConfig};
use switchboard_core::StoreResult;
use switchboard_store::StoreAdapter;
use tracing::info;

/// Every state component, wired to one shared store handle.
///
/// Build once per process and clone freely; clones share the store.
#[derive(Clone)]
pub struct StateService {
    store: Arc<dyn StoreAdapter>,
    cache: CacheManager,
    sessions: SessionStore,
    rate_limiter: RateLimiter,
    queue: PriorityQueue,
    messages: MessageQueue,
    automations: AutomationQueue,
    conversations: ConversationStateCache,
    health: HealthMonitor,
}

impl StateService {
    /// Wires the components over `store` using `config`.
    #[must_use]
    pub fn new(store: Arc<dyn StoreAdapter>, config: &CacheConfig) -> Self {
        let keys = CacheKeys::new(config.key_prefix.as_str());
        let cache = CacheManager::new(Arc::clone(&store), config.default_ttl_secs);
        let queue = PriorityQueue::new(Arc::clone(&store), keys.clone());

        Self {
            sessions: SessionStore::new(cache.clone(), keys.clone(), config.session_ttl_secs),
            rate_limiter: RateLimiter::new(
                Arc::clone(&store),
                keys.clone(),
                RateLimitPolicy::from(&config.rate_limit),
            ),
            messages: MessageQueue::new(queue.clone(), config.queues.messages.as_str()),
            automations: AutomationQueue::new(queue.clone(), config.queues.automations.as_str()),
            conversations: ConversationStateCache::new(
                cache.clone(),
                keys,
                config.conversation_ttl_secs,
            ),
            health: HealthMonitor::new(Arc::clone(&store)),
            queue,
            cache,
            store,
        }
    }

    /// Connects the configured store and wires the components over it.
    ///
    /// The store connects lazily, so this succeeds while the store is down.
    pub fn from_config(config: &AppConfig) -> StoreResult<Self> {
        let store = switchboard_store::connect(&config.store)?;
        info!(backend = store.backend(), "State service initialised");
        Ok(Self::new(store, &config.cache))
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn StoreAdapter> {
        &self.store
    }

    #[must_use]
    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    #[must_use]
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    #[must_use]
    pub fn queue(&self) -> &PriorityQueue {
        &self.queue
    }

    #[must_use]
    pub fn message_queue(&self) -> &MessageQueue {
        &self.messages
    }

    #[must_use]
    pub fn automation_queue(&self) -> &AutomationQueue {
        &self.automations
    }

    #[must_use]
    pub fn conversations(&self) -> &ConversationStateCache {
        &self.conversations
    }

    #[must_use]
    pub fn health(&self) -> &HealthMonitor {
        &self.health
    }
}
