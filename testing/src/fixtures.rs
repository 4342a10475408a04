use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use errors::{StoreError, VerifyError};
use pa_core::traits::{InstallationStore, TokenVerifier};
use pa_core::types::{BotRecord, EnterpriseId, Installation, TeamId, UserId, VerifiedIdentity};

fn team_matches(record_team: Option<&TeamId>, query_team: Option<&TeamId>) -> bool {
    record_team == query_team
}

/// Modern-generation store fixture: supports the rich lookup and counts
/// every call.
#[derive(Default)]
pub struct FakeInstallationStore {
    installations: Mutex<Vec<Installation>>,
    bots: Mutex<Vec<BotRecord>>,
    find_installation_calls: AtomicUsize,
    find_bot_calls: AtomicUsize,
}

impl FakeInstallationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_installation(self, installation: Installation) -> Self {
        self.installations.lock().unwrap().push(installation);
        self
    }

    #[must_use]
    pub fn with_bot(self, bot: BotRecord) -> Self {
        self.bots.lock().unwrap().push(bot);
        self
    }

    pub fn rich_lookups(&self) -> usize {
        self.find_installation_calls.load(Ordering::SeqCst)
    }

    pub fn legacy_lookups(&self) -> usize {
        self.find_bot_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InstallationStore for FakeInstallationStore {
    async fn find_installation(
        &self,
        enterprise_id: Option<&EnterpriseId>,
        team_id: Option<&TeamId>,
        user_id: Option<&UserId>,
        is_enterprise_install: bool,
    ) -> Result<Option<Installation>, StoreError> {
        self.find_installation_calls.fetch_add(1, Ordering::SeqCst);
        let team_id = if is_enterprise_install { None } else { team_id };
        let found = self
            .installations
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|candidate| {
                candidate.enterprise_id.as_ref() == enterprise_id
                    && team_matches(candidate.team_id.as_ref(), team_id)
                    && user_id.is_none_or(|user_id| candidate.user_id == *user_id)
            })
            .cloned();
        Ok(found)
    }

    async fn find_bot(
        &self,
        enterprise_id: Option<&EnterpriseId>,
        team_id: Option<&TeamId>,
        is_enterprise_install: bool,
    ) -> Result<Option<BotRecord>, StoreError> {
        self.find_bot_calls.fetch_add(1, Ordering::SeqCst);
        let team_id = if is_enterprise_install { None } else { team_id };
        let found = self
            .bots
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|candidate| {
                candidate.enterprise_id.as_ref() == enterprise_id
                    && team_matches(candidate.team_id.as_ref(), team_id)
            })
            .cloned();
        Ok(found)
    }

    async fn save(&self, installation: &Installation) -> Result<(), StoreError> {
        self.installations.lock().unwrap().push(installation.clone());
        if installation.bot_token.is_some() {
            self.bots.lock().unwrap().push(installation.to_bot());
        }
        Ok(())
    }

    async fn delete_installation(
        &self,
        enterprise_id: Option<&EnterpriseId>,
        team_id: Option<&TeamId>,
        user_id: Option<&UserId>,
    ) -> Result<(), StoreError> {
        self.installations.lock().unwrap().retain(|candidate| {
            !(candidate.enterprise_id.as_ref() == enterprise_id
                && team_matches(candidate.team_id.as_ref(), team_id)
                && user_id.is_none_or(|user_id| candidate.user_id == *user_id))
        });
        Ok(())
    }
}

/// Legacy-generation store fixture: keeps the trait's default rich lookup
/// behavior (reports unsupported) while still counting the attempt.
#[derive(Default)]
pub struct LegacyInstallationStore {
    bots: Mutex<Vec<BotRecord>>,
    find_installation_calls: AtomicUsize,
    find_bot_calls: AtomicUsize,
}

impl LegacyInstallationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_bot(self, bot: BotRecord) -> Self {
        self.bots.lock().unwrap().push(bot);
        self
    }

    pub fn rich_lookups(&self) -> usize {
        self.find_installation_calls.load(Ordering::SeqCst)
    }

    pub fn legacy_lookups(&self) -> usize {
        self.find_bot_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InstallationStore for LegacyInstallationStore {
    async fn find_installation(
        &self,
        _enterprise_id: Option<&EnterpriseId>,
        _team_id: Option<&TeamId>,
        _user_id: Option<&UserId>,
        _is_enterprise_install: bool,
    ) -> Result<Option<Installation>, StoreError> {
        self.find_installation_calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unsupported {
            operation: "find_installation".to_string(),
        })
    }

    async fn find_bot(
        &self,
        enterprise_id: Option<&EnterpriseId>,
        team_id: Option<&TeamId>,
        is_enterprise_install: bool,
    ) -> Result<Option<BotRecord>, StoreError> {
        self.find_bot_calls.fetch_add(1, Ordering::SeqCst);
        let team_id = if is_enterprise_install { None } else { team_id };
        let found = self
            .bots
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|candidate| {
                candidate.enterprise_id.as_ref() == enterprise_id
                    && team_matches(candidate.team_id.as_ref(), team_id)
            })
            .cloned();
        Ok(found)
    }

    async fn save(&self, installation: &Installation) -> Result<(), StoreError> {
        if installation.bot_token.is_some() {
            self.bots.lock().unwrap().push(installation.to_bot());
        }
        Ok(())
    }

    async fn delete_installation(
        &self,
        _enterprise_id: Option<&EnterpriseId>,
        _team_id: Option<&TeamId>,
        _user_id: Option<&UserId>,
    ) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Identity-endpoint fixture. Unregistered tokens are rejected the way the
/// platform rejects a revoked credential.
#[derive(Default)]
pub struct FakeTokenVerifier {
    identities: Mutex<HashMap<String, VerifiedIdentity>>,
    verify_calls: AtomicUsize,
}

impl FakeTokenVerifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn accept(self, token: &str, identity: VerifiedIdentity) -> Self {
        self.identities
            .lock()
            .unwrap()
            .insert(token.to_string(), identity);
        self
    }

    pub fn verifications(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    /// A plausible bot identity for `team`, for tests that only care that
    /// verification succeeded.
    #[must_use]
    pub fn bot_identity(team: &str) -> VerifiedIdentity {
        VerifiedIdentity {
            team_id: TeamId::new(team.to_string()),
            enterprise_id: None,
            bot_id: Some("B111".to_string()),
            user_id: UserId::new("W111".to_string()),
        }
    }
}

#[async_trait]
impl TokenVerifier for FakeTokenVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, VerifyError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        let known = self.identities.lock().unwrap().get(token).cloned();
        known.ok_or_else(|| {
            tracing::debug!("Rejecting unregistered token");
            VerifyError::TokenRejected {
                reason: "invalid_auth".to_string(),
            }
        })
    }
}
