use std::sync::Arc;

use storage::repository::CredentialRepository;
use wordiamo_core::model::{PasswordChange, ProfileUpdate, UserProfile};

use crate::api::AccountApi;
use crate::error::ProfileError;

#[derive(Clone)]
pub struct ProfileService {
    api: Arc<dyn AccountApi>,
    credentials: Arc<dyn CredentialRepository>,
}

impl ProfileService {
    #[must_use]
    pub fn new(api: Arc<dyn AccountApi>, credentials: Arc<dyn CredentialRepository>) -> Self {
        Self { api, credentials }
    }

    /// # Errors
    ///
    /// Returns `ProfileError::Api` if the request fails.
    pub async fn profile(&self) -> Result<UserProfile, ProfileError> {
        Ok(self.api.profile().await?)
    }

    /// Validate and send an edit, then refresh the locally stored user.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::Validation` for bad input, `ProfileError::Api` when
    /// the server refuses, and `ProfileError::Storage` on local failures.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<UserProfile, ProfileError> {
        let update = update.validate()?;
        let profile = self.api.update_profile(&update).await?;
        if let Some(mut credentials) = self.credentials.load_credentials().await? {
            credentials.user = profile.clone();
            self.credentials.save_credentials(&credentials).await?;
        }
        tracing::info!(username = %profile.username, "profile updated");
        Ok(profile)
    }

    /// # Errors
    ///
    /// Returns `ProfileError::Validation` for bad input and `ProfileError::Api`
    /// when the current password is refused.
    pub async fn change_password(&self, change: PasswordChange) -> Result<(), ProfileError> {
        let change = change.validate()?;
        self.api.change_password(&change).await?;
        tracing::info!("password changed");
        Ok(())
    }
}
