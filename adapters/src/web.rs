use async_trait::async_trait;
use errors::VerifyError;
use pa_core::traits::TokenVerifier;
use pa_core::types::{EnterpriseId, TeamId, UserId, VerifiedIdentity};
use serde::Deserialize;

/// Identity endpoint response. `ok: false` carries the rejection reason in
/// `error`, everything else is only present on success.
#[derive(Debug, Deserialize)]
struct AuthTestResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    team_id: Option<TeamId>,
    #[serde(default)]
    enterprise_id: Option<EnterpriseId>,
    #[serde(default)]
    bot_id: Option<String>,
    #[serde(default)]
    user_id: Option<UserId>,
}

/// [`TokenVerifier`] over the platform's `auth.test` Web API method.
pub struct WebApiTokenVerifier {
    base_url: String,
    client: reqwest::Client,
}

impl WebApiTokenVerifier {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TokenVerifier for WebApiTokenVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, VerifyError> {
        let url = format!("{}/auth.test", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(VerifyError::Api {
                status: response.status().as_u16(),
            });
        }

        let body: AuthTestResponse =
            response
                .json()
                .await
                .map_err(|e| VerifyError::Malformed {
                    reason: e.to_string(),
                })?;

        if !body.ok {
            return Err(VerifyError::TokenRejected {
                reason: body.error.unwrap_or_else(|| "unknown".to_string()),
            });
        }

        Ok(VerifiedIdentity {
            team_id: body.team_id,
            enterprise_id: body.enterprise_id,
            bot_id: body.bot_id,
            user_id: body.user_id,
        })
    }
}
