//! Shared error types for the services crate.

use std::time::Duration;

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use wordiamo_core::model::{OptionId, QuestionError, QuizResultsError, ValidationError};

/// Errors raised at the remote API edge.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("server rejected the request: {0}")]
    Rejected(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("not signed in")]
    NotSignedIn,
}

impl From<QuestionError> for ApiError {
    fn from(err: QuestionError) -> Self {
        Self::Malformed(err.to_string())
    }
}

impl ApiError {
    /// Transport-level failures: the server may never have seen the request.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Http(_) | Self::HttpStatus(_))
    }
}

/// Coarse classification of `QuizError` used by the views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizErrorKind {
    /// The quiz could not be started; no session exists.
    Setup,
    /// Submitting failed; the answer may be retried.
    Submission,
    /// The server answered with something inconsistent.
    Integrity,
    /// The operation is not allowed in the current phase.
    Usage,
    /// The hand-off snapshot could not be written.
    Storage,
}

/// Errors emitted by the quiz session and `QuizLoopService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("a lesson id is required to start a quiz")]
    MissingLesson,
    #[error("could not start quiz: {0}")]
    Start(#[source] ApiError),
    #[error("could not submit answer: {0}")]
    Submit(#[source] ApiError),
    #[error("inconsistent quiz response: {0}")]
    Integrity(String),
    #[error("no option selected")]
    NoSelection,
    #[error("option {0} is not part of the current question")]
    UnknownOption(OptionId),
    #[error("operation not allowed while the quiz is {0}")]
    InvalidPhase(&'static str),
    #[error(transparent)]
    Results(#[from] QuizResultsError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl QuizError {
    #[must_use]
    pub fn kind(&self) -> QuizErrorKind {
        match self {
            Self::MissingLesson | Self::Start(_) => QuizErrorKind::Setup,
            Self::Submit(_) => QuizErrorKind::Submission,
            Self::Integrity(_) | Self::Results(_) => QuizErrorKind::Integrity,
            Self::NoSelection | Self::UnknownOption(_) | Self::InvalidPhase(_) => {
                QuizErrorKind::Usage
            }
            Self::Storage(_) => QuizErrorKind::Storage,
        }
    }

    /// A malformed response is an integrity failure whichever call produced it.
    pub(crate) fn from_start(err: ApiError) -> Self {
        match err {
            ApiError::Malformed(msg) => Self::Integrity(msg),
            other => Self::Start(other),
        }
    }

    pub(crate) fn from_submit(err: ApiError) -> Self {
        match err {
            ApiError::Malformed(msg) => Self::Integrity(msg),
            other => Self::Submit(other),
        }
    }
}

/// Errors emitted by `AuthService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("not signed in")]
    NotSignedIn,
}

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by `ProfileService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProfileError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ResultsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResultsError {
    #[error("no quiz results available")]
    Missing,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Api(#[from] ApiError),
}
