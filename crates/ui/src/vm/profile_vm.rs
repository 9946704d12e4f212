use services::{AuthService, ProfileService};
use wordiamo_core::model::{
    LoginDraft, PasswordChange, ProfileUpdate, RegistrationDraft, SessionContext, UserProfile,
};

use crate::state::ViewError;

pub const PROFILE_SAVED: &str = "Profile updated successfully.";
pub const PASSWORD_CHANGED: &str = "Password changed successfully.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileVm {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub level: String,
}

impl From<&UserProfile> for ProfileVm {
    fn from(profile: &UserProfile) -> Self {
        Self {
            username: profile.username.clone(),
            email: profile.email.clone(),
            full_name: profile.full_name.clone().unwrap_or_default(),
            level: format!("Level {}", profile.current_level_id),
        }
    }
}

/// Editable copy of the profile fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub username: String,
    pub email: String,
    pub full_name: String,
}

impl ProfileForm {
    #[must_use]
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            username: profile.username.clone(),
            email: profile.email.clone(),
            full_name: profile.full_name.clone().unwrap_or_default(),
        }
    }

    /// Only the fields that differ from `current`.
    #[must_use]
    pub fn changes(&self, current: &UserProfile) -> ProfileUpdate {
        let changed = |edited: &str, stored: &str| {
            let edited = edited.trim();
            (edited != stored).then(|| edited.to_owned())
        };
        ProfileUpdate {
            username: changed(&self.username, &current.username),
            email: changed(&self.email, &current.email),
            full_name: changed(&self.full_name, current.full_name.as_deref().unwrap_or("")),
        }
    }
}

/// # Errors
///
/// Returns the mapped `ViewError` if the profile cannot be fetched.
pub async fn load_profile(profile: &ProfileService) -> Result<(UserProfile, ProfileVm), ViewError> {
    let user = profile.profile().await?;
    let vm = ProfileVm::from(&user);
    Ok((user, vm))
}

/// Send the edited fields; an unchanged form is rejected as invalid.
///
/// # Errors
///
/// Returns `ViewError::Invalid` for validation failures and the mapped
/// remote failure otherwise.
pub async fn save_profile(
    profile: &ProfileService,
    current: &UserProfile,
    form: &ProfileForm,
) -> Result<ProfileVm, ViewError> {
    let updated = profile.update_profile(form.changes(current)).await?;
    Ok(ProfileVm::from(&updated))
}

/// # Errors
///
/// Returns `ViewError::Invalid` for validation failures and the server's
/// message when the current password is wrong.
pub async fn change_password(
    profile: &ProfileService,
    change: PasswordChange,
) -> Result<&'static str, ViewError> {
    profile.change_password(change).await?;
    Ok(PASSWORD_CHANGED)
}

/// # Errors
///
/// Returns `ViewError::Invalid` for a bad form and the server's message for
/// rejected credentials.
pub async fn sign_in(auth: &AuthService, draft: LoginDraft) -> Result<SessionContext, ViewError> {
    Ok(auth.login(draft).await?)
}

/// # Errors
///
/// Returns `ViewError::Invalid` for a bad form and the server's message when
/// the account cannot be created.
pub async fn sign_up(
    auth: &AuthService,
    draft: RegistrationDraft,
) -> Result<SessionContext, ViewError> {
    Ok(auth.register(draft).await?)
}
