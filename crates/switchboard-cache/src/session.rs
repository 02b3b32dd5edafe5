//! Per-user session records.

use crate::keys::CacheKeys;
use crate::manager::{collapse, CacheManager};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use switchboard_core::{CacheResult, SessionId};
use tracing::{debug, info};

/// Client details captured when a session is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    /// `User-Agent` reported by the client, if any.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Remote address the session was created from.
    #[serde(default)]
    pub source_address: Option<String>,
    /// When the device details were captured.
    pub created_at: DateTime<Utc>,
}

impl DeviceInfo {
    /// Captures device details, stamped with the current time.
    #[must_use]
    pub fn new(user_agent: Option<String>, source_address: Option<String>) -> Self {
        Self {
            user_agent,
            source_address,
            created_at: Utc::now(),
        }
    }
}

/// A stored login session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque session identifier.
    pub session_id: String,
    /// Owner of the session.
    pub user_id: String,
    /// Client that created the session.
    pub device_info: DeviceInfo,
    /// Logical expiry; moved forward by [`SessionStore::extend_session`].
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Builds a session that expires `ttl_secs` from now.
    #[must_use]
    pub fn new(
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        device_info: DeviceInfo,
        ttl_secs: u64,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
            device_info,
            expires_at: expiry_after(Utc::now(), ttl_secs),
        }
    }

    /// Lifecycle state at `now`.
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>) -> SessionStatus {
        if self.expires_at > now {
            SessionStatus::Active
        } else {
            SessionStatus::Expired
        }
    }
}

/// Session lifecycle as observed through the store.
///
/// Expiry and revocation both remove the record, so once the key is gone the
/// two are indistinguishable and reported as [`SessionStatus::Missing`].
/// `Expired` is only seen when a record outlives its `expiresAt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Stored and not past `expiresAt`.
    Active,
    /// Stored but past `expiresAt`.
    Expired,
    /// No record under the key.
    Missing,
}

pub(crate) fn expiry_after(now: DateTime<Utc>, ttl_secs: u64) -> DateTime<Utc> {
    i64::try_from(ttl_secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Session storage under `session:<id>`.
#[derive(Clone)]
pub struct SessionStore {
    cache: CacheManager,
    keys: CacheKeys,
    default_ttl_secs: u64,
}

impl SessionStore {
    /// Creates a session store. `default_ttl_secs` applies to new sessions.
    #[must_use]
    pub fn new(cache: CacheManager, keys: CacheKeys, default_ttl_secs: u64) -> Self {
        Self {
            cache,
            keys,
            default_ttl_secs,
        }
    }

    /// Default session lifetime in seconds.
    #[must_use]
    pub const fn default_ttl_secs(&self) -> u64 {
        self.default_ttl_secs
    }

    /// Stores a session with the default TTL.
    pub async fn set_session(&self, session_id: &str, session: &Session) -> bool {
        self.set_session_with_ttl(session_id, session, self.default_ttl_secs)
            .await
    }

    /// Stores a session that expires after `ttl_secs`.
    pub async fn set_session_with_ttl(
        &self,
        session_id: &str,
        session: &Session,
        ttl_secs: u64,
    ) -> bool {
        self.cache
            .set_with_ttl(&self.keys.session(session_id), session, Some(ttl_secs))
            .await
    }

    /// Creates and stores a new session for `user_id`.
    pub async fn create_session(&self, user_id: &str, device_info: DeviceInfo) -> Option<Session> {
        let session_id = SessionId::new();
        let session = Session::new(
            session_id.as_str(),
            user_id,
            device_info,
            self.default_ttl_secs,
        );

        if self.set_session(session_id.as_str(), &session).await {
            info!(user_id, session_id = %session_id, "Session created");
            Some(session)
        } else {
            None
        }
    }

    /// Loads a session; `None` if absent or on failure.
    pub async fn get_session(&self, session_id: &str) -> Option<Session> {
        self.cache.get(&self.keys.session(session_id)).await
    }

    /// Revokes a session. Returns `true` if it existed.
    pub async fn delete_session(&self, session_id: &str) -> bool {
        let deleted = self.cache.delete(&self.keys.session(session_id)).await;
        if deleted {
            info!(session_id, "Session revoked");
        }
        deleted
    }

    /// Pushes a session's expiry `ttl_secs` into the future.
    ///
    /// The key TTL is moved first; if the session is already gone nothing is
    /// written, so an expired or revoked session is never brought back. The
    /// stored `expiresAt` is then rewritten to match.
    pub async fn extend_session(&self, session_id: &str, ttl_secs: u64) -> bool {
        let key = self.keys.session(session_id);

        if !self.cache.expire(&key, ttl_secs).await {
            debug!(session_id, "Session not extended (missing or store failure)");
            return false;
        }

        let result = self.cache.try_get::<Session>(&key).await;
        let Some(Some(mut session)) = collapse("get", &key, result) else {
            return false;
        };

        session.expires_at = expiry_after(Utc::now(), ttl_secs);
        let extended = self.cache.set_with_ttl(&key, &session, Some(ttl_secs)).await;
        if extended {
            debug!(session_id, ttl_secs, "Session extended");
        }
        extended
    }

    /// Lists every live session belonging to `user_id`, in no particular order.
    ///
    /// Enumerates all session keys, so cost grows with the total number of
    /// active sessions. Records that cannot be read are skipped.
    pub async fn try_get_user_sessions(&self, user_id: &str) -> CacheResult<Vec<Session>> {
        let entries = self.user_session_entries(user_id).await?;
        Ok(entries.into_iter().map(|(_, session)| session).collect())
    }

    /// Like [`SessionStore::try_get_user_sessions`]; empty on failure.
    pub async fn get_user_sessions(&self, user_id: &str) -> Vec<Session> {
        let prefix = self.keys.session_prefix();
        let result = self.try_get_user_sessions(user_id).await;
        collapse("get_user_sessions", &prefix, result).unwrap_or_default()
    }

    /// Revokes every session belonging to `user_id`. Returns how many keys
    /// were removed.
    ///
    /// Fails only if the sessions cannot be enumerated; a key that fails to
    /// delete is logged and not counted.
    pub async fn try_delete_user_sessions(&self, user_id: &str) -> CacheResult<usize> {
        let entries = self.user_session_entries(user_id).await?;
        let deletes = entries.into_iter().map(|(key, _)| async move {
            let result = self.cache.try_delete(&key).await;
            collapse("delete", &key, result).unwrap_or(false)
        });
        let removed = join_all(deletes).await.into_iter().filter(|d| *d).count();

        info!(user_id, removed, "User sessions revoked");
        Ok(removed)
    }

    /// Like [`SessionStore::try_delete_user_sessions`]; `None` if the
    /// sessions could not be enumerated.
    pub async fn delete_user_sessions(&self, user_id: &str) -> Option<usize> {
        let prefix = self.keys.session_prefix();
        let result = self.try_delete_user_sessions(user_id).await;
        collapse("delete_user_sessions", &prefix, result)
    }

    /// Session keys holding a record for `user_id`, paired with the record.
    ///
    /// The key is kept as enumerated; it need not match the record's own
    /// `sessionId`.
    async fn user_session_entries(&self, user_id: &str) -> CacheResult<Vec<(String, Session)>> {
        let keys = self
            .cache
            .store()
            .keys_by_prefix(&self.keys.session_prefix())
            .await?;

        let loads = keys.into_iter().map(|key| async move {
            let session = self.cache.get::<Session>(&key).await?;
            Some((key, session))
        });
        Ok(join_all(loads)
            .await
            .into_iter()
            .flatten()
            .filter(|(_, session)| session.user_id == user_id)
            .collect())
    }

    /// Fail-closed lookup for authentication.
    ///
    /// Returns the session only if it is found, decodes, and has not passed
    /// its `expiresAt`. Any failure yields `None`.
    pub async fn authenticate(&self, session_id: &str) -> Option<Session> {
        let session = self.get_session(session_id).await?;
        match session.status_at(Utc::now()) {
            SessionStatus::Active => Some(session),
            SessionStatus::Expired | SessionStatus::Missing => {
                debug!(session_id, "Rejected expired session");
                None
            }
        }
    }

    /// Reports a session's lifecycle state; `None` on failure.
    pub async fn status(&self, session_id: &str) -> Option<SessionStatus> {
        let key = self.keys.session(session_id);
        let result = self.cache.try_get::<Session>(&key).await;
        Some(match collapse("get", &key, result)? {
            Some(session) => session.status_at(Utc::now()),
            None => SessionStatus::Missing,
        })
    }
}
