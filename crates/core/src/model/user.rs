use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{LevelId, UserId};

const MIN_USERNAME_LEN: usize = 3;
const MIN_LOGIN_PASSWORD_LEN: usize = 6;
const MIN_NEW_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("username must be at least {MIN_USERNAME_LEN} characters")]
    UsernameTooShort,

    #[error("username may only contain letters, numbers and underscores")]
    UsernameCharacters,

    #[error("email address is not valid")]
    InvalidEmail,

    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("nothing to update")]
    EmptyUpdate,
}

/// Account details returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub current_level_id: LevelId,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Bearer token issued by the auth endpoints.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

/// What the client persists after a successful login or registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: AuthToken,
    pub user: UserProfile,
}

/// Read-only identity handed to services at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    credentials: Credentials,
}

impl SessionContext {
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    #[must_use]
    pub fn token(&self) -> &AuthToken {
        &self.credentials.token
    }

    #[must_use]
    pub fn user(&self) -> &UserProfile {
        &self.credentials.user
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.credentials.user.username
    }

    #[must_use]
    pub fn current_level_id(&self) -> LevelId {
        self.credentials.user.current_level_id
    }

    #[must_use]
    pub fn into_credentials(self) -> Credentials {
        self.credentials
    }
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(ValidationError::UsernameTooShort);
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ValidationError::UsernameCharacters);
    }
    Ok(())
}

/// Accepts `local@domain.tld` with no whitespace anywhere.
fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidEmail);
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::InvalidEmail);
    };
    if local.is_empty() || domain.contains('@') {
        return Err(ValidationError::InvalidEmail);
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
        _ => Err(ValidationError::InvalidEmail),
    }
}

fn validate_new_password(password: &str, confirm: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_NEW_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_NEW_PASSWORD_LEN,
        });
    }
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

/// Unvalidated login form input.
#[derive(Debug, Clone, Default)]
pub struct LoginDraft {
    pub identifier: String,
    pub password: String,
}

/// Login request that passed client-side validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Login {
    identifier: String,
    password: String,
}

impl Login {
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl LoginDraft {
    /// # Errors
    ///
    /// Returns `ValidationError` if the identifier is blank or the password is too short.
    pub fn validate(self) -> Result<Login, ValidationError> {
        let identifier = self.identifier.trim().to_owned();
        if identifier.is_empty() {
            return Err(ValidationError::Missing {
                field: "email or username",
            });
        }
        if self.password.is_empty() {
            return Err(ValidationError::Missing { field: "password" });
        }
        if self.password.chars().count() < MIN_LOGIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort {
                min: MIN_LOGIN_PASSWORD_LEN,
            });
        }
        Ok(Login {
            identifier,
            password: self.password,
        })
    }
}

/// Unvalidated registration form input.
#[derive(Debug, Clone, Default)]
pub struct RegistrationDraft {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    username: String,
    email: String,
    password: String,
}

impl Registration {
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl RegistrationDraft {
    /// # Errors
    ///
    /// Returns the first `ValidationError` found, checking username, email, then password.
    pub fn validate(self) -> Result<Registration, ValidationError> {
        let username = self.username.trim().to_owned();
        let email = self.email.trim().to_owned();
        validate_username(&username)?;
        validate_email(&email)?;
        validate_new_password(&self.password, &self.confirm_password)?;
        Ok(Registration {
            username,
            email,
            password: self.password,
        })
    }
}

/// Partial profile edit; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl ProfileUpdate {
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyUpdate` when no field is set, or the field error.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let trim = |value: Option<String>| {
            value
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };
        let update = Self {
            username: trim(self.username),
            email: trim(self.email),
            full_name: trim(self.full_name),
        };
        if update.username.is_none() && update.email.is_none() && update.full_name.is_none() {
            return Err(ValidationError::EmptyUpdate);
        }
        if let Some(username) = &update.username {
            validate_username(username)?;
        }
        if let Some(email) = &update.email {
            validate_email(email)?;
        }
        Ok(update)
    }

    /// Apply the accepted fields to a locally cached profile.
    pub fn apply_to(&self, profile: &mut UserProfile) {
        if let Some(username) = &self.username {
            profile.username.clone_from(username);
        }
        if let Some(email) = &self.email {
            profile.email.clone_from(email);
        }
        if let Some(full_name) = &self.full_name {
            profile.full_name = Some(full_name.clone());
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordChange {
    /// # Errors
    ///
    /// Returns `ValidationError` if a field is blank, the new password is too
    /// short, or the confirmation does not match.
    pub fn validate(self) -> Result<Self, ValidationError> {
        if self.current_password.is_empty() {
            return Err(ValidationError::Missing {
                field: "current password",
            });
        }
        if self.new_password.is_empty() || self.confirm_password.is_empty() {
            return Err(ValidationError::Missing {
                field: "new password",
            });
        }
        validate_new_password(&self.new_password, &self.confirm_password)?;
        Ok(self)
    }
}
