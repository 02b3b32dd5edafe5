//! Key naming for everything the state layer writes.

/// Key generator with an optional namespace prefix.
///
/// With an empty prefix keys are `session:<id>`, `rate_limit:<identifier>`,
/// `queue:<name>` and `conversation:<participant>`. A prefix `p` turns them
/// into `p:session:<id>` and so on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheKeys {
    prefix: String,
}

impl CacheKeys {
    /// Creates a key generator. An empty prefix means no namespace.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let prefix = prefix.trim_end_matches(':').to_string();
        Self { prefix }
    }

    fn join(&self, kind: &str, id: &str) -> String {
        if self.prefix.is_empty() {
            format!("{kind}:{id}")
        } else {
            format!("{}:{kind}:{id}", self.prefix)
        }
    }

    /// Key of a session record.
    #[must_use]
    pub fn session(&self, session_id: &str) -> String {
        self.join("session", session_id)
    }

    /// Prefix shared by every session key.
    #[must_use]
    pub fn session_prefix(&self) -> String {
        self.join("session", "")
    }

    /// Key of a rate limit counter.
    #[must_use]
    pub fn rate_limit(&self, identifier: &str) -> String {
        self.join("rate_limit", identifier)
    }

    /// Key of a queue's sorted set.
    #[must_use]
    pub fn queue(&self, name: &str) -> String {
        self.join("queue", name)
    }

    /// Key of a conversation state record.
    #[must_use]
    pub fn conversation(&self, participant_id: &str) -> String {
        self.join("conversation", participant_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unprefixed_keys() {
        let keys = CacheKeys::default();
        assert_eq!(keys.session("abc"), "session:abc");
        assert_eq!(keys.session_prefix(), "session:");
        assert_eq!(keys.rate_limit("1.2.3.4"), "rate_limit:1.2.3.4");
        assert_eq!(keys.queue("message_queue"), "queue:message_queue");
        assert_eq!(keys.conversation("+15551234"), "conversation:+15551234");
    }

    #[test]
    fn test_prefixed_keys() {
        let keys = CacheKeys::new("tenant-a");
        assert_eq!(keys.session("abc"), "tenant-a:session:abc");
        assert_eq!(keys.session_prefix(), "tenant-a:session:");
        assert_eq!(keys.queue("q"), "tenant-a:queue:q");
    }

    #[test]
    fn test_trailing_separator_is_normalised() {
        assert_eq!(CacheKeys::new("app:"), CacheKeys::new("app"));
    }
}
