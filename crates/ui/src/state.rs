use services::error::ApiError;
use services::{AuthError, CatalogError, ProfileError, QuizError, QuizErrorKind, ResultsError};
use wordiamo_core::model::ValidationError;

/// What a view can tell the user went wrong.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewError {
    Unknown,
    NotSignedIn,
    Offline,
    NoResults,
    Rejected(String),
    Invalid(String),
    LessonLocked(Option<String>),
}

impl ViewError {
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Unknown => "Something went wrong. Please try again.".to_owned(),
            Self::NotSignedIn => "Please sign in to continue.".to_owned(),
            Self::Offline => {
                "Could not reach the server. Check your connection and try again.".to_owned()
            }
            Self::NoResults => "No quiz results found. Please take a quiz first.".to_owned(),
            Self::Rejected(message) | Self::Invalid(message) => message.clone(),
            Self::LessonLocked(Some(reason)) => format!("This lesson is locked: {reason}"),
            Self::LessonLocked(None) => {
                "You need to complete lessons of your current level to unlock this content."
                    .to_owned()
            }
        }
    }
}

impl From<&ApiError> for ViewError {
    fn from(err: &ApiError) -> Self {
        match err {
            ApiError::Timeout(_) | ApiError::Http(_) | ApiError::HttpStatus(_) => Self::Offline,
            ApiError::Rejected(message) => Self::Rejected(message.clone()),
            ApiError::NotSignedIn => Self::NotSignedIn,
            _ => Self::Unknown,
        }
    }
}

impl From<&ValidationError> for ViewError {
    fn from(err: &ValidationError) -> Self {
        Self::Invalid(err.to_string())
    }
}

impl From<&QuizError> for ViewError {
    fn from(err: &QuizError) -> Self {
        match err {
            QuizError::Start(api) | QuizError::Submit(api) => Self::from(api),
            QuizError::MissingLesson | QuizError::NoSelection | QuizError::UnknownOption(_) => {
                Self::Invalid(err.to_string())
            }
            _ if err.kind() == QuizErrorKind::Usage => Self::Invalid(err.to_string()),
            _ => Self::Unknown,
        }
    }
}

impl From<AuthError> for ViewError {
    fn from(err: AuthError) -> Self {
        match &err {
            AuthError::Validation(validation) => Self::from(validation),
            AuthError::Api(api) => Self::from(api),
            AuthError::NotSignedIn => Self::NotSignedIn,
            _ => Self::Unknown,
        }
    }
}

impl From<CatalogError> for ViewError {
    fn from(err: CatalogError) -> Self {
        match &err {
            CatalogError::Api(api) => Self::from(api),
            _ => Self::Unknown,
        }
    }
}

impl From<ProfileError> for ViewError {
    fn from(err: ProfileError) -> Self {
        match &err {
            ProfileError::Validation(validation) => Self::from(validation),
            ProfileError::Api(api) => Self::from(api),
            _ => Self::Unknown,
        }
    }
}

impl From<ResultsError> for ViewError {
    fn from(err: ResultsError) -> Self {
        match err {
            ResultsError::Missing => Self::NoResults,
            _ => Self::Unknown,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Ready(T),
    Error(ViewError),
}

impl<T> ViewState<T> {
    #[must_use]
    pub fn from_result(result: Result<T, ViewError>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(err) => Self::Error(err),
        }
    }

    #[must_use]
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }
}
