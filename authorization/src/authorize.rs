use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use errors::{AuthorizeError, StoreError};
use pa_core::traits::{InstallationStore, TokenVerifier};
use pa_core::types::{EnterpriseId, Installation, RequestContext, TeamId};
use tracing::debug;

use crate::cache::{AuthorizeResultCache, MemoryAuthorizeResultCache};
use crate::config::AuthorizeConfig;
use crate::result::AuthorizeResult;

/// One resolution strategy. The transport layer invokes exactly one
/// configured resolver per request; `Ok(None)` means "deny this request".
#[async_trait]
pub trait Authorize: Send + Sync {
    async fn authorize(
        &self,
        ctx: &RequestContext,
    ) -> Result<Option<AuthorizeResult>, AuthorizeError>;
}

/// The default, production resolution strategy against a pluggable
/// installation store.
///
/// Lookup is two-tier: the rich per-user lookup first, falling back to the
/// legacy bot-only lookup when the backend reports it unsupported. The
/// downgrade is permanent for this resolver instance: the capability flag
/// only ever transitions from available to unavailable, so a race between
/// concurrent requests is harmless.
pub struct InstallationStoreAuthorize {
    store: Arc<dyn InstallationStore>,
    bot_only: bool,
    cache_enabled: bool,
    find_installation_available: AtomicBool,
    cache: Arc<dyn AuthorizeResultCache>,
}

impl InstallationStoreAuthorize {
    pub fn new(store: Arc<dyn InstallationStore>) -> Self {
        Self::with_config(store, AuthorizeConfig::default())
    }

    pub fn with_config(store: Arc<dyn InstallationStore>, config: AuthorizeConfig) -> Self {
        Self {
            store,
            bot_only: config.bot_only,
            cache_enabled: config.cache_enabled,
            find_installation_available: AtomicBool::new(true),
            cache: Arc::new(MemoryAuthorizeResultCache::new()),
        }
    }

    /// Replace the default in-process cache, e.g. to share one cache
    /// across resolvers or to observe entries from tests.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn AuthorizeResultCache>) -> Self {
        self.cache = cache;
        self
    }

    /// The rich two-step lookup: the workspace's latest installation,
    /// superseded by the requesting user's own installation when the
    /// installer is somebody else.
    async fn rich_lookup(
        &self,
        ctx: &RequestContext,
    ) -> Result<Option<Installation>, StoreError> {
        let Some(mut installation) = self
            .store
            .find_installation(
                ctx.enterprise_id.as_ref(),
                Some(&ctx.team_id),
                None,
                ctx.is_enterprise_install,
            )
            .await?
        else {
            return Ok(None);
        };

        if ctx.user_id.as_ref() != Some(&installation.user_id) {
            // Workspace installs carry the installer's tokens; the
            // requesting user may hold their own.
            let user_installation = self
                .store
                .find_installation(
                    ctx.enterprise_id.as_ref(),
                    Some(&ctx.team_id),
                    ctx.user_id.as_ref(),
                    ctx.is_enterprise_install,
                )
                .await?;
            if let Some(user_installation) = user_installation {
                installation = user_installation;
            }
        }
        Ok(Some(installation))
    }

    fn debug_log_for_not_found(enterprise_id: Option<&EnterpriseId>, team_id: &TeamId) {
        debug!(
            "No installation data found for enterprise_id: {} team_id: {}",
            enterprise_id.map_or("none", EnterpriseId::as_str),
            team_id
        );
    }
}

#[async_trait]
impl Authorize for InstallationStoreAuthorize {
    async fn authorize(
        &self,
        ctx: &RequestContext,
    ) -> Result<Option<AuthorizeResult>, AuthorizeError> {
        let mut bot_token: Option<String> = None;
        let mut user_token: Option<String> = None;

        if !self.bot_only && self.find_installation_available.load(Ordering::SeqCst) {
            match self.rich_lookup(ctx).await {
                Ok(None) => {
                    // A missing record is a deny, never a cue to retry
                    // through the legacy lookup.
                    Self::debug_log_for_not_found(ctx.enterprise_id.as_ref(), &ctx.team_id);
                    return Ok(None);
                }
                Ok(Some(installation)) => {
                    bot_token = installation.bot_token;
                    user_token = installation.user_token;
                }
                Err(StoreError::Unsupported { .. }) => {
                    self.find_installation_available
                        .store(false, Ordering::SeqCst);
                }
                Err(e) => return Err(e.into()),
            }
        }

        if self.bot_only || !self.find_installation_available.load(Ordering::SeqCst) {
            let bot = self
                .store
                .find_bot(
                    ctx.enterprise_id.as_ref(),
                    Some(&ctx.team_id),
                    ctx.is_enterprise_install,
                )
                .await?;
            match bot {
                None => {
                    Self::debug_log_for_not_found(ctx.enterprise_id.as_ref(), &ctx.team_id);
                    return Ok(None);
                }
                Some(bot) => {
                    bot_token = bot.bot_token;
                    user_token = None;
                }
            }
        }

        let Some(token) = bot_token.clone().or_else(|| user_token.clone()) else {
            return Ok(None);
        };

        if self.cache_enabled {
            if let Some(hit) = self.cache.get(&token) {
                return Ok(Some(hit));
            }
        }

        match ctx.client.verify(&token).await {
            Ok(identity) => {
                let result = AuthorizeResult::from_verify_response(
                    &identity,
                    bot_token.as_deref(),
                    user_token.as_deref(),
                );
                if self.cache_enabled {
                    self.cache.put(&token, result.clone());
                }
                Ok(Some(result))
            }
            Err(err) if err.is_remote_api_error() => {
                debug!(
                    "The stored token for enterprise_id: {} team_id: {} is no longer valid. ({err})",
                    ctx.enterprise_id
                        .as_ref()
                        .map_or("none", EnterpriseId::as_str),
                    ctx.team_id
                );
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}
