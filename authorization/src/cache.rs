use dashmap::DashMap;

use crate::result::AuthorizeResult;

/// Token-keyed cache of verified resolution outcomes.
///
/// Injected into the engine at construction so deployments can share one
/// cache across resolvers and tests can substitute a deterministic fake.
/// Implementations must make `get`/`put` atomic with respect to concurrent
/// callers; the engine itself never locks around them. Concurrent
/// resolutions of the same token may race to populate an entry; last
/// writer wins, and the duplicate remote verification is accepted.
pub trait AuthorizeResultCache: Send + Sync {
    fn get(&self, token: &str) -> Option<AuthorizeResult>;

    fn put(&self, token: &str, result: AuthorizeResult);
}

/// In-process cache over a concurrent map. Entries are never evicted;
/// lifecycle is tied to the resolver that owns it.
#[derive(Default)]
pub struct MemoryAuthorizeResultCache {
    entries: DashMap<String, AuthorizeResult>,
}

impl MemoryAuthorizeResultCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl AuthorizeResultCache for MemoryAuthorizeResultCache {
    fn get(&self, token: &str) -> Option<AuthorizeResult> {
        self.entries.get(token).map(|entry| entry.value().clone())
    }

    fn put(&self, token: &str, result: AuthorizeResult) {
        self.entries.insert(token.to_string(), result);
    }
}
