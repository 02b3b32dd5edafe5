//! # Switchboard Cache
//!
//! Shared state components over one backing store:
//!
//! - [`CacheManager`]: JSON get/set with TTLs
//! - [`SessionStore`]: per-user sessions with extension and enumeration
//! - [`RateLimiter`]: fixed-window admission control that fails open
//! - [`PriorityQueue`]: priority job queues, plus the named
//!   [`MessageQueue`] and [`AutomationQueue`]
//! - [`ConversationStateCache`]: short-lived, mergeable conversation state
//! - [`HealthMonitor`]: latency and memory probe for operators
//!
//! [`StateService`] wires all of them to a single `Arc<dyn StoreAdapter>`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use switchboard_cache::StateService;
//! use switchboard_config::CacheConfig;
//! use switchboard_store::MemoryStore;
//!
//! let state = StateService::new(Arc::new(MemoryStore::new()), &CacheConfig::default());
//! let decision = state.rate_limiter().check("203.0.113.7").await;
//! if !decision.allowed {
//!     // reject with Retry-After: decision.retry_after_secs()
//! }
//! ```

pub mod conversation;
pub mod health;
pub mod keys;
pub mod manager;
pub mod metrics;
pub mod queue;
pub mod rate_limit;
pub mod service;
pub mod session;

pub use self::conversation::{ConversationState, ConversationStateCache, Step};
pub use self::health::{HealthMonitor, HealthReport, HealthStatus};
pub use self::keys::CacheKeys;
pub use self::manager::CacheManager;
pub use self::metrics::register_metrics;
pub use self::queue::{
    AutomationQueue, AutomationTrigger, JobStatus, MessageQueue, NamedQueue, OutboundMessage,
    PriorityQueue, QueueJob,
};
pub use self::rate_limit::{RateLimitPolicy, RateLimitResult, RateLimiter};
pub use self::service::StateService;
pub use self::session::{DeviceInfo, Session, SessionStatus, SessionStore};
