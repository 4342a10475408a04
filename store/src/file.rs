//! Filesystem-backed installation store.
//!
//! Layout: one directory per workspace under the base directory, holding
//! `installer-{user}.json` per installer, `installer-latest.json` for the
//! most recent install, and `bot-latest.json` for the legacy bot shape.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use errors::StoreError;
use pa_core::traits::InstallationStore;
use pa_core::types::{BotRecord, EnterpriseId, Installation, TeamId, UserId};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::workspace_key;

pub struct FileInstallationStore {
    base_dir: PathBuf,
}

impl FileInstallationStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn workspace_dir(
        &self,
        enterprise_id: Option<&EnterpriseId>,
        team_id: Option<&TeamId>,
    ) -> PathBuf {
        self.base_dir.join(workspace_key(enterprise_id, team_id))
    }

    async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let value =
                    serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
                        reason: format!("{}: {e}", path.display()),
                    })?;
                Ok(Some(value))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(value).map_err(|e| StoreError::Serialization {
            reason: e.to_string(),
        })?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl InstallationStore for FileInstallationStore {
    async fn find_installation(
        &self,
        enterprise_id: Option<&EnterpriseId>,
        team_id: Option<&TeamId>,
        user_id: Option<&UserId>,
        is_enterprise_install: bool,
    ) -> Result<Option<Installation>, StoreError> {
        let team_id = if is_enterprise_install { None } else { team_id };
        let dir = self.workspace_dir(enterprise_id, team_id);
        let file = match user_id {
            Some(user_id) => format!("installer-{}.json", user_id.as_str()),
            None => "installer-latest.json".to_string(),
        };
        Self::read_json(&dir.join(file)).await
    }

    async fn find_bot(
        &self,
        enterprise_id: Option<&EnterpriseId>,
        team_id: Option<&TeamId>,
        is_enterprise_install: bool,
    ) -> Result<Option<BotRecord>, StoreError> {
        let team_id = if is_enterprise_install { None } else { team_id };
        let dir = self.workspace_dir(enterprise_id, team_id);
        Self::read_json(&dir.join("bot-latest.json")).await
    }

    async fn save(&self, installation: &Installation) -> Result<(), StoreError> {
        let team_id = if installation.is_enterprise_install {
            None
        } else {
            installation.team_id.as_ref()
        };
        let dir = self.workspace_dir(installation.enterprise_id.as_ref(), team_id);
        tokio::fs::create_dir_all(&dir).await?;

        let user_file = format!("installer-{}.json", installation.user_id.as_str());
        Self::write_json(&dir.join(user_file), installation).await?;
        Self::write_json(&dir.join("installer-latest.json"), installation).await?;
        if installation.bot_token.is_some() {
            Self::write_json(&dir.join("bot-latest.json"), &installation.to_bot()).await?;
        }
        tracing::debug!("Saved installation under {}", dir.display());
        Ok(())
    }

    async fn delete_installation(
        &self,
        enterprise_id: Option<&EnterpriseId>,
        team_id: Option<&TeamId>,
        user_id: Option<&UserId>,
    ) -> Result<(), StoreError> {
        let dir = self.workspace_dir(enterprise_id, team_id);
        match user_id {
            Some(user_id) => {
                let path = dir.join(format!("installer-{}.json", user_id.as_str()));
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(StoreError::Io(e)),
                }
                let latest: Option<Installation> =
                    Self::read_json(&dir.join("installer-latest.json")).await?;
                if latest.is_some_and(|entry| entry.user_id == *user_id) {
                    tokio::fs::remove_file(dir.join("installer-latest.json")).await?;
                }
            }
            None => match tokio::fs::remove_dir_all(&dir).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::Io(e)),
            },
        }
        Ok(())
    }
}
