use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::traits::TokenVerifier;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct EnterpriseId(String);

impl EnterpriseId {
    pub fn new(id: String) -> Option<Self> {
        if id.is_empty() || id.len() > 100 {
            None
        } else {
            Some(Self(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for EnterpriseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for EnterpriseId {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string()).ok_or_else(|| anyhow::anyhow!("Invalid enterprise ID"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TeamId(String);

impl TeamId {
    pub fn new(id: String) -> Option<Self> {
        if id.is_empty() || id.len() > 100 {
            None
        } else {
            Some(Self(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for TeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TeamId {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string()).ok_or_else(|| anyhow::anyhow!("Invalid team ID"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: String) -> Option<Self> {
        if id.is_empty() || id.len() > 100 {
            None
        } else {
            Some(Self(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string()).ok_or_else(|| anyhow::anyhow!("Invalid user ID"))
    }
}

/// A stored record of a successful app authorization for a workspace,
/// including the installer identity and credential tokens.
///
/// Owned by the installation store. The resolution engine only ever
/// reads these; mutation happens through [`crate::traits::InstallationStore::save`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installation {
    pub enterprise_id: Option<EnterpriseId>,
    pub team_id: Option<TeamId>,
    /// The user who performed the installation.
    pub user_id: UserId,
    pub bot_token: Option<String>,
    pub user_token: Option<String>,
    pub bot_id: Option<String>,
    pub is_enterprise_install: bool,
    /// Seconds since the epoch.
    pub installed_at: i64,
}

impl Installation {
    pub fn new(team_id: Option<TeamId>, user_id: UserId) -> Self {
        Self {
            enterprise_id: None,
            team_id,
            user_id,
            bot_token: None,
            user_token: None,
            bot_id: None,
            is_enterprise_install: false,
            installed_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Project this installation down to the legacy bot-only shape.
    #[must_use]
    pub fn to_bot(&self) -> BotRecord {
        BotRecord {
            enterprise_id: self.enterprise_id.clone(),
            team_id: self.team_id.clone(),
            bot_token: self.bot_token.clone(),
            bot_id: self.bot_id.clone(),
            installed_at: self.installed_at,
        }
    }
}

/// Legacy bot-only stored shape: a workspace-wide bot token with no
/// per-user data. Older store backends only ever carry these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotRecord {
    pub enterprise_id: Option<EnterpriseId>,
    pub team_id: Option<TeamId>,
    pub bot_token: Option<String>,
    pub bot_id: Option<String>,
    pub installed_at: i64,
}

/// Identity attributes reported by the remote verification endpoint for a
/// live token.
///
/// `user_id` is the identity the token acts as: the bot's own user when
/// `bot_id` is present, the installing human otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    pub team_id: Option<TeamId>,
    pub enterprise_id: Option<EnterpriseId>,
    pub bot_id: Option<String>,
    pub user_id: Option<UserId>,
}

/// Per-request resolution context: tenant identifiers, the remote API
/// client handle, and free-form ambient values contributed by earlier
/// middleware.
///
/// Immutable for the duration of one resolution call.
#[derive(Clone)]
pub struct RequestContext {
    pub enterprise_id: Option<EnterpriseId>,
    pub team_id: TeamId,
    pub user_id: Option<UserId>,
    pub is_enterprise_install: bool,
    pub client: Arc<dyn TokenVerifier>,
    pub extras: HashMap<String, serde_json::Value>,
}

impl RequestContext {
    pub fn new(team_id: TeamId, client: Arc<dyn TokenVerifier>) -> Self {
        Self {
            enterprise_id: None,
            team_id,
            user_id: None,
            is_enterprise_install: false,
            client,
            extras: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_enterprise(mut self, enterprise_id: EnterpriseId, is_enterprise_install: bool) -> Self {
        self.enterprise_id = Some(enterprise_id);
        self.is_enterprise_install = is_enterprise_install;
        self
    }

    #[must_use]
    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extras.insert(key.into(), value);
        self
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("enterprise_id", &self.enterprise_id)
            .field("team_id", &self.team_id)
            .field("user_id", &self.user_id)
            .field("is_enterprise_install", &self.is_enterprise_install)
            .field("extras", &self.extras)
            .finish_non_exhaustive()
    }
}
