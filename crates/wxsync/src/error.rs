//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use wxsync_config::ConfigError;
use wxsync_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const BOOTSTRAP_HALTED: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach {service}")]
    #[diagnostic(
        code(wxsync::connection_failed),
        help(
            "Check network access and the base_url settings.\n\
             For self-hosted platforms with self-signed certificates, try --insecure (-k)."
        )
    )]
    ConnectionFailed {
        service: &'static str,
        #[source]
        source: CoreError,
    },

    #[error("TLS setup failed for {service}")]
    #[diagnostic(
        code(wxsync::tls_error),
        help(
            "Check that ca_cert in [defaults] points at a readable PEM file.\n\
             For self-signed certificates, try --insecure (-k)."
        )
    )]
    TlsError {
        service: &'static str,
        #[source]
        source: wxsync_api::Error,
    },

    #[error("Could not set up the client for {service}")]
    #[diagnostic(code(wxsync::client_setup), help("Check the base_url settings."))]
    ClientSetup {
        service: &'static str,
        #[source]
        source: wxsync_api::Error,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Netatmo authentication failed")]
    #[diagnostic(
        code(wxsync::auth_failed),
        help(
            "Verify client_id, client_secret, username and password in [vendor].\n\
             Secrets can also come from the keyring (service \"wxsync\") or env vars."
        )
    )]
    AuthFailed {
        #[source]
        source: CoreError,
    },

    #[error("The UDM platform rejected the session")]
    #[diagnostic(
        code(wxsync::session_rejected),
        help("Set a valid session in [platform] (session, session_env, or the keyring).")
    )]
    SessionRejected,

    // ── Platform state ───────────────────────────────────────────────
    #[error("No data record exists for this integration")]
    #[diagnostic(
        code(wxsync::record_missing),
        help("Install the integration on the platform so its data record is created.")
    )]
    RecordMissing,

    #[error("Bootstrap halted")]
    #[diagnostic(
        code(wxsync::bootstrap_halted),
        help(
            "The platform status now reads 'Failed to convert Netatmo data'.\n\
             Bootstrap is not retried automatically; fix the cause and restart."
        )
    )]
    BootstrapHalted {
        #[source]
        source: CoreError,
    },

    #[error("Sync failed")]
    #[diagnostic(code(wxsync::sync_failed))]
    SyncFailed {
        #[source]
        source: CoreError,
    },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(wxsync::config),
        help("Run: wxsync config path   to see which file is read")
    )]
    Config(#[from] ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not encode output: {0}")]
    #[diagnostic(code(wxsync::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. }
            | Self::SessionRejected
            | Self::Config(ConfigError::NoCredentials { .. }) => exit_code::AUTH,
            Self::Config(ConfigError::Validation { .. }) => exit_code::USAGE,
            Self::BootstrapHalted { .. } => exit_code::BOOTSTRAP_HALTED,
            _ => exit_code::GENERAL,
        }
    }

    /// Wrap a failure to build an API client.
    pub fn client_setup(service: &'static str, source: wxsync_api::Error) -> Self {
        match source {
            wxsync_api::Error::Tls(_) => Self::TlsError { service, source },
            _ => Self::ClientSetup { service, source },
        }
    }

    /// Wrap a bootstrap failure. Auth and session problems keep their
    /// own codes; everything else halted the conversion.
    pub fn bootstrap(err: CoreError) -> Self {
        match Self::from(err) {
            Self::SyncFailed { source } | Self::ConnectionFailed { source, .. } => {
                Self::BootstrapHalted { source }
            }
            other => other,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

fn is_unreachable(err: &CoreError) -> bool {
    match err {
        CoreError::Fetch { source } | CoreError::Persistence { source, .. } => matches!(
            source,
            wxsync_api::Error::Transport(e) if e.is_connect() || e.is_timeout()
        ),
        _ => false,
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        if err.is_session_rejected() {
            return Self::SessionRejected;
        }
        match err {
            CoreError::Auth { .. } => Self::AuthFailed { source: err },
            CoreError::RecordMissing => Self::RecordMissing,
            CoreError::Fetch { .. } if is_unreachable(&err) => Self::ConnectionFailed {
                service: "the Netatmo API",
                source: err,
            },
            CoreError::Persistence { .. } if is_unreachable(&err) => Self::ConnectionFailed {
                service: "the UDM platform",
                source: err,
            },
            other => Self::SyncFailed { source: other },
        }
    }
}
