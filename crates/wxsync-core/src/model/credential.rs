// ── OAuth credential ──

use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;

use wxsync_api::netatmo::TokenResponse;
use wxsync_api::udm::DataRecord;

/// The vendor credential owned by the engine.
///
/// Never destroyed, only replaced wholesale on exchange or refresh.
#[derive(Debug, Clone)]
pub struct Credential {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    /// Access-token validity in seconds, as reported by the vendor.
    pub expires_in: i64,
    /// When this credential was obtained (or loaded, for persisted ones).
    pub obtained_at: DateTime<Utc>,
}

impl Credential {
    /// Restore a persisted credential. Both tokens must be present.
    pub fn from_record(record: &DataRecord) -> Option<Self> {
        let access = record.access_token.as_deref().filter(|t| !t.is_empty())?;
        let refresh = record.refresh_token.as_deref().filter(|t| !t.is_empty())?;
        Some(Self {
            access_token: SecretString::from(access.to_owned()),
            refresh_token: SecretString::from(refresh.to_owned()),
            expires_in: record.expires_in.unwrap_or_default(),
            obtained_at: Utc::now(),
        })
    }

    /// Estimated expiry. Advisory only: the vendor's rejection is authoritative.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.obtained_at + Duration::seconds(self.expires_in)
    }
}

impl From<TokenResponse> for Credential {
    fn from(token: TokenResponse) -> Self {
        Self {
            access_token: SecretString::from(token.access_token),
            refresh_token: SecretString::from(token.refresh_token),
            expires_in: token.expires_in,
            obtained_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn record_without_refresh_token_is_incomplete() {
        let record = DataRecord {
            access_token: Some("a1".into()),
            ..DataRecord::default()
        };
        assert!(Credential::from_record(&record).is_none());
    }

    #[test]
    fn record_with_both_tokens_restores() {
        let record = DataRecord {
            access_token: Some("a1".into()),
            refresh_token: Some("r1".into()),
            expires_in: Some(10800),
            ..DataRecord::default()
        };
        let credential = Credential::from_record(&record).expect("complete record");
        assert_eq!(credential.access_token.expose_secret(), "a1");
        assert_eq!(credential.refresh_token.expose_secret(), "r1");
        assert_eq!(
            credential.expires_at() - credential.obtained_at,
            Duration::seconds(10800)
        );
    }
}
