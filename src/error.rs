//! Error types
//!
//! Every failure the crate surfaces to callers is one of five kinds. None of
//! them is recovered from or retried internally.

use crate::provider::TransportError;
use thiserror::Error;

/// Errors returned by the query model, translator, client cache and service
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// A model or filter was constructed with missing required input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No analytics credential is configured for the site
    #[error("No analytics credential configured for site '{site_id}'")]
    CredentialMissing { site_id: String },

    /// The credential exists but a client could not be built from it
    #[error("Failed to initialize analytics client for site '{site_id}': {reason}")]
    ClientInit { site_id: String, reason: String },

    /// The provider call failed (network, auth, API error)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The request uses something the target provider cannot express
    #[error("Translation error: {0}")]
    Translation(String),
}

impl AnalyticsError {
    pub(crate) fn client_init(site_id: &str, reason: impl ToString) -> Self {
        Self::ClientInit {
            site_id: site_id.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether a caller may reasonably retry the failed operation.
    ///
    /// Only transport failures qualify; everything else is a programming or
    /// configuration problem that a retry cannot fix.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::CredentialMissing { .. } => "CREDENTIAL_MISSING",
            Self::ClientInit { .. } => "CLIENT_INIT_ERROR",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Translation(_) => "TRANSLATION_ERROR",
        }
    }
}

/// Result type for analytics operations
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
