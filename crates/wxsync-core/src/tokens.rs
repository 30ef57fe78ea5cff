// ── Token lifecycle ──
//
// Owns the vendor credential. Vendor calls run through `with_refresh`,
// which treats an empty result as token expiry and retries exactly once
// after a refresh.

use std::future::Future;
use std::sync::Arc;

use secrecy::ExposeSecret;
use tracing::{debug, error, info, warn};

use wxsync_api::NetatmoClient;

use crate::error::CoreError;
use crate::model::Credential;
use crate::record::RecordStore;

/// Progress of one retry-wrapped vendor call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// First attempt with the current token.
    Fetching,
    /// Token refreshed; one more attempt allowed.
    RefreshedOnce,
    /// Still empty after the refresh. Terminal.
    Failed,
}

impl RetryState {
    /// Transition after the wrapped call came back empty.
    pub fn after_empty(self) -> Self {
        match self {
            Self::Fetching => Self::RefreshedOnce,
            Self::RefreshedOnce | Self::Failed => Self::Failed,
        }
    }
}

pub struct TokenManager {
    vendor: Arc<NetatmoClient>,
    store: RecordStore,
    credential: Option<Credential>,
}

impl TokenManager {
    pub fn new(vendor: Arc<NetatmoClient>, store: RecordStore, credential: Option<Credential>) -> Self {
        Self {
            vendor,
            store,
            credential,
        }
    }

    pub fn vendor(&self) -> &Arc<NetatmoClient> {
        &self.vendor
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Return the current credential, performing the initial password
    /// grant when none is held yet.
    pub async fn ensure_access_token(&mut self) -> Result<&Credential, CoreError> {
        let credential = match self.credential.take() {
            Some(existing) => existing,
            None => {
                info!("no stored access token; performing initial token exchange");
                let token = self.vendor.get_access_token().await.map_err(|e| {
                    error!(error = %e, "initial token exchange failed");
                    CoreError::auth(e)
                })?;
                let fresh = Credential::from(token);
                self.persist(&fresh).await;
                fresh
            }
        };
        Ok(self.credential.insert(credential))
    }

    /// Exchange the stored refresh token for a new pair and persist it.
    ///
    /// Without a stored credential this falls back to the initial exchange.
    pub async fn refresh(&mut self) -> Result<&Credential, CoreError> {
        let Some(refresh_token) = self.credential.as_ref().map(|c| c.refresh_token.clone()) else {
            return self.ensure_access_token().await;
        };

        let token = self
            .vendor
            .refresh_token(&refresh_token)
            .await
            .map_err(|e| {
                error!(error = %e, "token refresh failed");
                CoreError::auth(e)
            })?;
        info!(expires_in = token.expires_in, "access token refreshed");
        let fresh = Credential::from(token);
        self.persist(&fresh).await;
        Ok(self.credential.insert(fresh))
    }

    /// Run a vendor call, refreshing and retrying once if it comes back
    /// empty. `Ok(None)` means it was still empty after the refresh.
    ///
    /// The call receives the vendor client and the current access token.
    pub async fn with_refresh<T, F, Fut>(&mut self, mut operation: F) -> Result<Option<T>, CoreError>
    where
        F: FnMut(Arc<NetatmoClient>, String) -> Fut + Send,
        Fut: Future<Output = Result<Option<T>, wxsync_api::Error>> + Send,
        T: Send,
    {
        let mut state = RetryState::Fetching;
        loop {
            if state == RetryState::Failed {
                warn!("vendor call still empty after token refresh");
                return Ok(None);
            }

            let access_token = self
                .ensure_access_token()
                .await?
                .access_token
                .expose_secret()
                .to_owned();
            let result = operation(Arc::clone(&self.vendor), access_token)
                .await
                .map_err(CoreError::fetch)?;

            if let Some(value) = result {
                return Ok(Some(value));
            }

            state = state.after_empty();
            if state == RetryState::RefreshedOnce {
                debug!("vendor call came back empty; refreshing token");
                self.refresh().await?;
            }
        }
    }

    /// Persist a new credential. The caller swaps it in regardless.
    async fn persist(&self, credential: &Credential) {
        if let Err(e) = self.store.save_credential(credential).await {
            warn!(error = %e, "could not persist credential; keeping it in memory");
        }
    }
}
