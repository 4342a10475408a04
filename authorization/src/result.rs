use pa_core::types::{EnterpriseId, TeamId, UserId, VerifiedIdentity};
use serde::{Deserialize, Serialize};

/// The immutable outcome of a successful resolution: verified identity
/// plus the token(s) to use for subsequent API calls.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthorizeResult {
    pub enterprise_id: Option<EnterpriseId>,
    pub team_id: Option<TeamId>,
    pub bot_id: Option<String>,
    pub bot_user_id: Option<UserId>,
    pub user_id: Option<UserId>,
    pub bot_token: Option<String>,
    pub user_token: Option<String>,
}

impl AuthorizeResult {
    /// Build a result from the identity endpoint's response plus the
    /// tokens the store resolved.
    ///
    /// When the response names a bot, its `user_id` is the bot's own user;
    /// otherwise the token acts as the installing human.
    #[must_use]
    pub fn from_verify_response(
        identity: &VerifiedIdentity,
        bot_token: Option<&str>,
        user_token: Option<&str>,
    ) -> Self {
        let (bot_user_id, user_id) = if identity.bot_id.is_some() {
            (identity.user_id.clone(), None)
        } else {
            (None, identity.user_id.clone())
        };
        Self {
            enterprise_id: identity.enterprise_id.clone(),
            team_id: identity.team_id.clone(),
            bot_id: identity.bot_id.clone(),
            bot_user_id,
            user_id,
            bot_token: bot_token.map(str::to_string),
            user_token: user_token.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_bot_token_response_maps_to_bot_user() {
        let identity = VerifiedIdentity {
            team_id: Some(TeamId::from_str("T111").unwrap()),
            enterprise_id: None,
            bot_id: Some("B111".to_string()),
            user_id: Some(UserId::from_str("W111").unwrap()),
        };
        let result = AuthorizeResult::from_verify_response(&identity, Some("xoxb-1"), None);
        assert_eq!(result.bot_user_id.as_ref().map(UserId::as_str), Some("W111"));
        assert!(result.user_id.is_none());
        assert_eq!(result.bot_token.as_deref(), Some("xoxb-1"));
    }

    #[test]
    fn test_user_token_response_maps_to_human_user() {
        let identity = VerifiedIdentity {
            team_id: Some(TeamId::from_str("T111").unwrap()),
            enterprise_id: None,
            bot_id: None,
            user_id: Some(UserId::from_str("U111").unwrap()),
        };
        let result = AuthorizeResult::from_verify_response(&identity, None, Some("xoxp-1"));
        assert!(result.bot_user_id.is_none());
        assert_eq!(result.user_id.as_ref().map(UserId::as_str), Some("U111"));
        assert_eq!(result.user_token.as_deref(), Some("xoxp-1"));
    }
}
