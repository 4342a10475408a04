use serde::{Deserialize, Serialize};

/// Configuration for [`crate::InstallationStoreAuthorize`].
///
/// Both toggles default to off, matching the most conservative behavior:
/// rich lookups with per-request remote verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuthorizeConfig {
    /// Force the legacy bot-only lookup even against stores that support
    /// the rich per-user lookup.
    #[serde(default)]
    pub bot_only: bool,

    /// Reuse verified results keyed by raw token, skipping the remote
    /// liveness check on a hit for the resolver's lifetime.
    #[serde(default)]
    pub cache_enabled: bool,
}
