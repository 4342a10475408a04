//! # Parley Errors
//!
//! Error taxonomy for the authorization resolution engine.
//!
//! The engine distinguishes recoverable conditions (no record, unsupported
//! store operation, token rejected upstream) from fatal ones (backend
//! failures, malformed custom-resolver output) at the type level. Uses
//! `thiserror` for structured error definitions.

use thiserror::Error;

/// Installation store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend does not implement this lookup. Distinct from
    /// "not found": callers downgrade to the legacy bot-only lookup
    /// when they see this on the rich lookup.
    #[error("Store operation not supported: {operation}")]
    Unsupported { operation: String },

    #[error("Query on {backend} failed: {reason}")]
    Backend { backend: String, reason: String },

    #[error("Serialization error: {reason}")]
    Serialization { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Remote identity-verification errors
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The platform rejected the token (revoked, expired, never valid).
    /// Resolution treats this as "no authorization" rather than a failure.
    #[error("Token rejected by the platform: {reason}")]
    TokenRejected { reason: String },

    /// The identity endpoint answered with a non-success status.
    #[error("Identity endpoint returned status {status}")]
    Api { status: u16 },

    #[error("Malformed identity response: {reason}")]
    Malformed { reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl VerifyError {
    /// True for errors the platform itself reported about the token or the
    /// request. These collapse to a denial during resolution; transport and
    /// decoding failures do not.
    #[must_use]
    pub fn is_remote_api_error(&self) -> bool {
        matches!(
            self,
            VerifyError::TokenRejected { .. } | VerifyError::Api { .. }
        )
    }
}

/// Authorization engine errors
#[derive(Debug, Error)]
pub enum AuthorizeError {
    /// A custom authorize function returned something that is neither
    /// absent nor an authorize result. Always a programming error in the
    /// supplied function, so it propagates instead of being absorbed
    /// into a denial.
    #[error("Unexpected returned value from authorize function (type: {got})")]
    UnexpectedResolverOutput { got: String },

    #[error("Installation store lookup failed: {0}")]
    Store(#[from] StoreError),

    #[error("Token verification failed: {0}")]
    Verify(#[from] VerifyError),
}
