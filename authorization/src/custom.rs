use std::collections::HashMap;

use async_trait::async_trait;
use errors::{AuthorizeError, VerifyError};
use futures_util::future::BoxFuture;
use pa_core::types::{EnterpriseId, RequestContext, TeamId, UserId};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::authorize::Authorize;
use crate::result::AuthorizeResult;

/// The structured inputs handed to every custom authorize function,
/// alongside whatever named parameters it registered for.
#[derive(Debug, Clone)]
pub struct AuthorizeArgs {
    pub context: RequestContext,
    pub enterprise_id: Option<EnterpriseId>,
    pub team_id: TeamId,
    pub user_id: Option<UserId>,
}

impl From<&RequestContext> for AuthorizeArgs {
    fn from(ctx: &RequestContext) -> Self {
        Self {
            context: ctx.clone(),
            enterprise_id: ctx.enterprise_id.clone(),
            team_id: ctx.team_id.clone(),
            user_id: ctx.user_id.clone(),
        }
    }
}

/// Named parameters bound for one invocation, filtered down to the names
/// the function registered.
pub type BoundParams = HashMap<String, Value>;

type CustomAuthorizeFn = Box<
    dyn Fn(AuthorizeArgs, BoundParams) -> BoxFuture<'static, Result<Value, VerifyError>>
        + Send
        + Sync,
>;

/// Wraps an operator-supplied policy function as the authorization
/// strategy.
///
/// The operator registers the parameter names the function consumes; the
/// name set is fixed for the adapter's lifetime. Per call the adapter
/// resolves each registered name against the recognized set, which is the
/// context's scalar fields plus every ambient key (ambient keys never
/// shadow the fixed names). A name it cannot resolve is bound to
/// `Value::Null` with a warning.
///
/// Output contract: `Value::Null` denies, a value deserializable as
/// [`AuthorizeResult`] authorizes, anything else is a hard
/// [`AuthorizeError::UnexpectedResolverOutput`]. An error of the
/// remote-API class (the platform invalidated a token upstream) is
/// recoverable and denies.
pub struct CustomAuthorize {
    param_names: Vec<String>,
    func: CustomAuthorizeFn,
}

impl CustomAuthorize {
    pub fn new<I, S, F>(param_names: I, func: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(AuthorizeArgs, BoundParams) -> BoxFuture<'static, Result<Value, VerifyError>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            param_names: param_names.into_iter().map(Into::into).collect(),
            func: Box::new(func),
        }
    }

    fn bind_params(&self, ctx: &RequestContext) -> BoundParams {
        let mut available: HashMap<&str, Value> = HashMap::from([
            (
                "context",
                json!({
                    "enterprise_id": ctx.enterprise_id,
                    "team_id": ctx.team_id,
                    "user_id": ctx.user_id,
                    "is_enterprise_install": ctx.is_enterprise_install,
                }),
            ),
            ("enterprise_id", json!(ctx.enterprise_id)),
            ("team_id", json!(ctx.team_id)),
            ("user_id", json!(ctx.user_id)),
            ("is_enterprise_install", json!(ctx.is_enterprise_install)),
        ]);
        for (key, value) in &ctx.extras {
            available.entry(key.as_str()).or_insert_with(|| value.clone());
        }

        let mut bound = BoundParams::new();
        for name in &self.param_names {
            match available.get(name.as_str()) {
                Some(value) => {
                    bound.insert(name.clone(), value.clone());
                }
                None => {
                    warn!("{} is not a valid authorize argument", name);
                    bound.insert(name.clone(), Value::Null);
                }
            }
        }
        bound
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl Authorize for CustomAuthorize {
    async fn authorize(
        &self,
        ctx: &RequestContext,
    ) -> Result<Option<AuthorizeResult>, AuthorizeError> {
        let bound = self.bind_params(ctx);
        let args = AuthorizeArgs::from(ctx);
        match (self.func)(args, bound).await {
            Ok(Value::Null) => Ok(None),
            Ok(value) => {
                let got = json_type_name(&value);
                match serde_json::from_value::<AuthorizeResult>(value) {
                    Ok(result) => Ok(Some(result)),
                    Err(_) => Err(AuthorizeError::UnexpectedResolverOutput {
                        got: got.to_string(),
                    }),
                }
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
            Err(err) => Err(AuthorizeError::Verify(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::sync::Arc;
    use testing::FakeTokenVerifier;

    fn context() -> RequestContext {
        RequestContext::new(
            TeamId::from_str("T1").unwrap(),
            Arc::new(FakeTokenVerifier::new()),
        )
        .with_user(UserId::from_str("U1").unwrap())
    }

    #[tokio::test]
    async fn test_unknown_declared_name_binds_null() {
        let resolver = CustomAuthorize::new(["context", "team_id", "foo"], |_args, params| {
            Box::pin(async move {
                assert_eq!(params["team_id"], json!("T1"));
                assert!(params["context"].is_object());
                assert!(params["foo"].is_null());
                Ok(Value::Null)
            })
        });
        let outcome = resolver.authorize(&context()).await.unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn test_ambient_values_bound_but_never_shadow_fixed_names() {
        let ctx = context()
            .with_extra("locale", json!("en-US"))
            .with_extra("team_id", json!("SHADOW"));
        let resolver = CustomAuthorize::new(["locale", "team_id"], |_args, params| {
            Box::pin(async move {
                assert_eq!(params["locale"], json!("en-US"));
                assert_eq!(params["team_id"], json!("T1"));
                Ok(Value::Null)
            })
        });
        assert!(resolver.authorize(&ctx).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_result_object_authorizes() {
        let resolver = CustomAuthorize::new(["team_id"], |args, _params| {
            Box::pin(async move {
                Ok(json!({
                    "team_id": args.team_id,
                    "bot_token": "xoxb-9",
                }))
            })
        });
        let result = resolver.authorize(&context()).await.unwrap().unwrap();
        assert_eq!(result.team_id.as_ref().map(TeamId::as_str), Some("T1"));
        assert_eq!(result.bot_token.as_deref(), Some("xoxb-9"));
    }

    #[tokio::test]
    async fn test_malformed_output_is_fatal() {
        let resolver = CustomAuthorize::new(["team_id"], |_args, _params| {
            Box::pin(async move { Ok(json!("approved")) })
        });
        let err = resolver.authorize(&context()).await.unwrap_err();
        assert!(matches!(
            err,
            AuthorizeError::UnexpectedResolverOutput { .. }
        ));

        let resolver = CustomAuthorize::new(["team_id"], |_args, _params| {
            Box::pin(async move { Ok(json!({ "verdict": "approved" })) })
        });
        let err = resolver.authorize(&context()).await.unwrap_err();
        assert!(matches!(
            err,
            AuthorizeError::UnexpectedResolverOutput { got } if got == "object"
        ));
    }

    #[tokio::test]
    async fn test_remote_api_error_is_recoverable() {
        let resolver = CustomAuthorize::new(["team_id"], |_args, _params| {
            Box::pin(async move {
                Err(VerifyError::TokenRejected {
                    reason: "token_revoked".to_string(),
                })
            })
        });
        assert!(resolver.authorize(&context()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let resolver = CustomAuthorize::new(["team_id"], |_args, _params| {
            Box::pin(async move {
                Err(VerifyError::Malformed {
                    reason: "connection reset".to_string(),
                })
            })
        });
        let err = resolver.authorize(&context()).await.unwrap_err();
        assert!(matches!(err, AuthorizeError::Verify(_)));
    }
}
