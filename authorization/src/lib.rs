//! # Parley Authorization
//!
//! The authorization resolution engine: turns an inbound request's tenant
//! identifiers into a verified API credential plus identity metadata.
//!
//! Two resolution strategies implement the [`Authorize`] trait:
//! - [`InstallationStoreAuthorize`]: the production default, backed by a
//!   pluggable [`pa_core::InstallationStore`] with remote liveness
//!   verification and a token-keyed result cache.
//! - [`CustomAuthorize`]: wraps an operator-supplied policy function with
//!   declarative parameter binding.
//!
//! A resolver returns `Ok(None)` to deny: the caller never learns whether
//! the workspace was uninstalled or the token expired, both collapse to
//! the same denial signal.

pub mod authorize;
pub mod cache;
pub mod config;
pub mod custom;
pub mod result;

pub use authorize::{Authorize, InstallationStoreAuthorize};
pub use cache::{AuthorizeResultCache, MemoryAuthorizeResultCache};
pub use config::AuthorizeConfig;
pub use custom::{AuthorizeArgs, BoundParams, CustomAuthorize};
pub use result::AuthorizeResult;
