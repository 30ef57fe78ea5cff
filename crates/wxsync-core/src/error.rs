// ── Core error types ──
//
// Engine-level errors. Callers see which side failed (vendor auth, vendor
// fetch, platform persistence) rather than raw HTTP detail; the API error
// is kept as the source for logging.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Vendor side ──────────────────────────────────────────────────
    #[error("Netatmo authentication failed: {source}")]
    Auth {
        #[source]
        source: wxsync_api::Error,
    },

    #[error("Netatmo station fetch failed: {source}")]
    Fetch {
        #[source]
        source: wxsync_api::Error,
    },

    #[error("Netatmo returned no station data after refreshing the token")]
    EmptySnapshot,

    // ── Platform side ────────────────────────────────────────────────
    #[error("UDM persistence failed ({operation}): {source}")]
    Persistence {
        operation: &'static str,
        #[source]
        source: wxsync_api::Error,
    },

    #[error("UDM {operation} returned no state ids; the tree cannot be updated")]
    Unpersisted { operation: &'static str },

    #[error("Sync engine has no network bound; bootstrap has not completed")]
    NotBootstrapped,

    #[error("No data record exists on the platform for this integration")]
    RecordMissing,

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub fn auth(source: wxsync_api::Error) -> Self {
        Self::Auth { source }
    }

    pub fn fetch(source: wxsync_api::Error) -> Self {
        Self::Fetch { source }
    }

    pub fn persistence(operation: &'static str, source: wxsync_api::Error) -> Self {
        Self::Persistence { operation, source }
    }

    /// Whether the failure came from the platform rejecting our session.
    pub fn is_session_rejected(&self) -> bool {
        matches!(
            self,
            Self::Persistence {
                source: wxsync_api::Error::InvalidSession,
                ..
            }
        )
    }

    /// Whether retrying later could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Fetch { source } | Self::Persistence { source, .. } => source.is_transient(),
            Self::EmptySnapshot => true,
            _ => false,
        }
    }
}
