#![forbid(unsafe_code)]

pub mod api;
pub mod app_services;
pub mod auth_service;
pub mod catalog_service;
pub mod error;
pub mod profile_service;
pub mod quiz;
pub mod results_service;

pub use wordiamo_core::Clock;

pub use app_services::AppServices;
pub use auth_service::AuthService;
pub use catalog_service::{CatalogService, DEFAULT_HISTORY_LIMIT};
pub use error::{
    ApiError, AppServicesError, AuthError, CatalogError, ProfileError, QuizError, QuizErrorKind,
    ResultsError,
};
pub use profile_service::ProfileService;
pub use quiz::{ActiveQuiz, QuizLoopService, QuizPhase, QuizProgress, QuizSession, SessionTimer};
pub use results_service::ResultsService;
