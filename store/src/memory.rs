//! In-process installation store backed by concurrent maps.
//!
//! Suited to tests and single-process deployments; nothing survives a
//! restart.

use async_trait::async_trait;
use dashmap::DashMap;
use errors::StoreError;
use pa_core::traits::InstallationStore;
use pa_core::types::{BotRecord, EnterpriseId, Installation, TeamId, UserId};

use crate::workspace_key;

#[derive(Default)]
pub struct MemoryInstallationStore {
    /// Per-user installations, keyed by `{workspace}-{user}`.
    installations: DashMap<String, Installation>,
    /// Latest installation per workspace, whoever installed it.
    latest: DashMap<String, Installation>,
    /// Legacy bot records, derived on save when a bot token is present.
    bots: DashMap<String, BotRecord>,
}

impl MemoryInstallationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn user_key(workspace: &str, user_id: &UserId) -> String {
        format!("{}-{}", workspace, user_id.as_str())
    }
}

#[async_trait]
impl InstallationStore for MemoryInstallationStore {
    async fn find_installation(
        &self,
        enterprise_id: Option<&EnterpriseId>,
        team_id: Option<&TeamId>,
        user_id: Option<&UserId>,
        is_enterprise_install: bool,
    ) -> Result<Option<Installation>, StoreError> {
        let team_id = if is_enterprise_install { None } else { team_id };
        let workspace = workspace_key(enterprise_id, team_id);
        let found = match user_id {
            Some(user_id) => self
                .installations
                .get(&Self::user_key(&workspace, user_id))
                .map(|entry| entry.value().clone()),
            None => self.latest.get(&workspace).map(|entry| entry.value().clone()),
        };
        Ok(found)
    }

    async fn find_bot(
        &self,
        enterprise_id: Option<&EnterpriseId>,
        team_id: Option<&TeamId>,
        is_enterprise_install: bool,
    ) -> Result<Option<BotRecord>, StoreError> {
        let team_id = if is_enterprise_install { None } else { team_id };
        let workspace = workspace_key(enterprise_id, team_id);
        Ok(self.bots.get(&workspace).map(|entry| entry.value().clone()))
    }

    async fn save(&self, installation: &Installation) -> Result<(), StoreError> {
        let team_id = if installation.is_enterprise_install {
            None
        } else {
            installation.team_id.as_ref()
        };
        let workspace = workspace_key(installation.enterprise_id.as_ref(), team_id);
        self.installations.insert(
            Self::user_key(&workspace, &installation.user_id),
            installation.clone(),
        );
        self.latest.insert(workspace.clone(), installation.clone());
        if installation.bot_token.is_some() {
            self.bots.insert(workspace.clone(), installation.to_bot());
        }
        tracing::debug!(
            "Saved installation for workspace {} user {}",
            workspace,
            installation.user_id
        );
        Ok(())
    }

    async fn delete_installation(
        &self,
        enterprise_id: Option<&EnterpriseId>,
        team_id: Option<&TeamId>,
        user_id: Option<&UserId>,
    ) -> Result<(), StoreError> {
        let workspace = workspace_key(enterprise_id, team_id);
        match user_id {
            Some(user_id) => {
                self.installations
                    .remove(&Self::user_key(&workspace, user_id));
                let latest_is_user = self
                    .latest
                    .get(&workspace)
                    .is_some_and(|entry| entry.user_id == *user_id);
                if latest_is_user {
                    self.latest.remove(&workspace);
                }
            }
            None => {
                self.latest.remove(&workspace);
                let prefix = format!("{workspace}-");
                self.installations
                    .retain(|key, _| !key.starts_with(&prefix));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn installation(team: &str, user: &str, bot_token: Option<&str>) -> Installation {
        Installation {
            bot_token: bot_token.map(str::to_string),
            ..Installation::new(
                TeamId::new(team.to_string()),
                UserId::from_str(user).unwrap(),
            )
        }
    }

    #[tokio::test]
    async fn test_latest_and_per_user_resolution() {
        let store = MemoryInstallationStore::new();
        store
            .save(&installation("T111", "U111", Some("xoxb-1")))
            .await
            .unwrap();
        store
            .save(&installation("T111", "U222", Some("xoxb-2")))
            .await
            .unwrap();

        let team = TeamId::from_str("T111").unwrap();
        let latest = store
            .find_installation(None, Some(&team), None, false)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.user_id.as_str(), "U222");

        let user = UserId::from_str("U111").unwrap();
        let theirs = store
            .find_installation(None, Some(&team), Some(&user), false)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(theirs.bot_token.as_deref(), Some("xoxb-1"));
    }

    #[tokio::test]
    async fn test_bot_record_derived_on_save() {
        let store = MemoryInstallationStore::new();
        store
            .save(&installation("T111", "U111", Some("xoxb-1")))
            .await
            .unwrap();

        let team = TeamId::from_str("T111").unwrap();
        let bot = store.find_bot(None, Some(&team), false).await.unwrap();
        assert_eq!(bot.unwrap().bot_token.as_deref(), Some("xoxb-1"));
    }

    #[tokio::test]
    async fn test_user_token_only_install_has_no_bot_record() {
        let store = MemoryInstallationStore::new();
        let mut inst = installation("T111", "U111", None);
        inst.user_token = Some("xoxp-1".to_string());
        store.save(&inst).await.unwrap();

        let team = TeamId::from_str("T111").unwrap();
        assert!(
            store
                .find_bot(None, Some(&team), false)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_enterprise_install_ignores_team_on_lookup() {
        let store = MemoryInstallationStore::new();
        let mut inst = installation("T111", "U111", Some("xoxb-1"));
        inst.enterprise_id = EnterpriseId::new("E111".to_string());
        inst.is_enterprise_install = true;
        store.save(&inst).await.unwrap();

        let enterprise = EnterpriseId::from_str("E111").unwrap();
        let other_team = TeamId::from_str("T999").unwrap();
        let found = store
            .find_installation(Some(&enterprise), Some(&other_team), None, true)
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_delete_installation_for_user() {
        let store = MemoryInstallationStore::new();
        store
            .save(&installation("T111", "U111", Some("xoxb-1")))
            .await
            .unwrap();

        let team = TeamId::from_str("T111").unwrap();
        let user = UserId::from_str("U111").unwrap();
        store
            .delete_installation(None, Some(&team), Some(&user))
            .await
            .unwrap();
        assert!(
            store
                .find_installation(None, Some(&team), Some(&user), false)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            store
                .find_installation(None, Some(&team), None, false)
                .await
                .unwrap()
                .is_none()
        );
    }
}
