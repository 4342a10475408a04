//! Core traits for the authorization engine boundaries.

use async_trait::async_trait;
use errors::{StoreError, VerifyError};

use crate::types::{BotRecord, EnterpriseId, Installation, TeamId, UserId, VerifiedIdentity};

/// Pluggable persistence for app installations.
///
/// Backends come in two generations. Modern backends implement
/// [`find_installation`](InstallationStore::find_installation), the rich
/// lookup capable of per-user token resolution. Legacy backends only carry
/// bot records and keep the default `find_installation` body, which reports
/// [`StoreError::Unsupported`] so callers can downgrade to
/// [`find_bot`](InstallationStore::find_bot).
///
/// "Not found" is `Ok(None)`; it is never signalled through an error.
#[async_trait]
pub trait InstallationStore: Send + Sync {
    /// Rich lookup. With `user_id` set, returns that user's own
    /// installation; without it, the latest installation for the
    /// workspace.
    async fn find_installation(
        &self,
        enterprise_id: Option<&EnterpriseId>,
        team_id: Option<&TeamId>,
        user_id: Option<&UserId>,
        is_enterprise_install: bool,
    ) -> Result<Option<Installation>, StoreError> {
        let _ = (enterprise_id, team_id, user_id, is_enterprise_install);
        Err(StoreError::Unsupported {
            operation: "find_installation".to_string(),
        })
    }

    /// Legacy lookup: the workspace-wide bot record only.
    async fn find_bot(
        &self,
        enterprise_id: Option<&EnterpriseId>,
        team_id: Option<&TeamId>,
        is_enterprise_install: bool,
    ) -> Result<Option<BotRecord>, StoreError>;

    async fn save(&self, installation: &Installation) -> Result<(), StoreError>;

    /// Delete one user's installation, or every installation for the
    /// workspace when `user_id` is absent.
    async fn delete_installation(
        &self,
        enterprise_id: Option<&EnterpriseId>,
        team_id: Option<&TeamId>,
        user_id: Option<&UserId>,
    ) -> Result<(), StoreError>;
}

/// Liveness check against the platform's identity endpoint.
///
/// Implementations validate a raw token and report the identity it acts
/// as. A token the platform rejects surfaces as
/// [`VerifyError::TokenRejected`], not as a panic or an absent identity.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, VerifyError>;
}
