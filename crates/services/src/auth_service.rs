use std::sync::Arc;

use storage::repository::CredentialRepository;
use wordiamo_core::model::{LoginDraft, RegistrationDraft, SessionContext};

use crate::api::AccountApi;
use crate::error::AuthError;

/// Signs users in and out and keeps their credentials on disk.
#[derive(Clone)]
pub struct AuthService {
    api: Arc<dyn AccountApi>,
    credentials: Arc<dyn CredentialRepository>,
}

impl AuthService {
    #[must_use]
    pub fn new(api: Arc<dyn AccountApi>, credentials: Arc<dyn CredentialRepository>) -> Self {
        Self { api, credentials }
    }

    /// # Errors
    ///
    /// Returns `AuthError::Validation` for bad form input, `AuthError::Api` when
    /// the server refuses, and `AuthError::Storage` if credentials cannot be kept.
    pub async fn login(&self, draft: LoginDraft) -> Result<SessionContext, AuthError> {
        let login = draft.validate()?;
        let credentials = self.api.login(&login).await?;
        self.credentials.save_credentials(&credentials).await?;
        tracing::info!(username = %credentials.user.username, "signed in");
        Ok(SessionContext::new(credentials))
    }

    /// # Errors
    ///
    /// Same as `login`.
    pub async fn register(&self, draft: RegistrationDraft) -> Result<SessionContext, AuthError> {
        let registration = draft.validate()?;
        let credentials = self.api.register(&registration).await?;
        self.credentials.save_credentials(&credentials).await?;
        tracing::info!(username = %credentials.user.username, "account registered");
        Ok(SessionContext::new(credentials))
    }

    /// Tell the server, then forget local credentials whatever it said.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` only if local credentials cannot be cleared.
    pub async fn logout(&self) -> Result<(), AuthError> {
        if let Err(err) = self.api.logout().await {
            tracing::warn!(error = %err, "server logout failed; clearing local credentials anyway");
        }
        self.credentials.clear_credentials().await?;
        tracing::info!("signed out");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `AuthError::NotSignedIn` when no credentials are stored.
    pub async fn current_context(&self) -> Result<SessionContext, AuthError> {
        self.credentials
            .load_credentials()
            .await?
            .map(SessionContext::new)
            .ok_or(AuthError::NotSignedIn)
    }
}
