// Token Provider Port - customer ids and join tokens

/// Join token length (URL-safe, short enough to read out loud)
pub const JOIN_TOKEN_LEN: usize = 7;

/// Generates customer ids and join tokens (allows deterministic tests)
pub trait TokenProvider: Send + Sync {
    /// Generate a new unique customer ID
    fn customer_id(&self) -> String;

    /// Generate a short URL-safe join token. Uniqueness is enforced by the
    /// repository's unique index; a collision surfaces as a storage error.
    fn join_token(&self) -> String;
}

/// UUID ids + random alphanumeric tokens (production)
pub struct RandomTokenProvider;

impl TokenProvider for RandomTokenProvider {
    fn customer_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }

    fn join_token(&self) -> String {
        use rand::distributions::Alphanumeric;
        use rand::Rng;

        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(JOIN_TOKEN_LEN)
            .map(char::from)
            .collect()
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::TokenProvider;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Sequential ids and tokens (cust-1/tok-1, cust-2/tok-2, ...)
    pub struct SequenceTokenProvider {
        counter: AtomicU64,
    }

    impl SequenceTokenProvider {
        pub fn new() -> Self {
            Self {
                counter: AtomicU64::new(0),
            }
        }
    }

    impl Default for SequenceTokenProvider {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TokenProvider for SequenceTokenProvider {
        fn customer_id(&self) -> String {
            format!("cust-{}", self.counter.fetch_add(1, Ordering::SeqCst) + 1)
        }

        fn join_token(&self) -> String {
            format!("tok-{}", self.counter.load(Ordering::SeqCst))
        }
    }
}
