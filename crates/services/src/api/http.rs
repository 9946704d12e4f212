use std::env;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;

use wordiamo_core::model::{
    AttemptRecord, Credentials, LessonAccess, LessonId, Level, LevelId, Login,
    PasswordChange, ProfileUpdate, Registration, SessionContext, UserProfile,
};

use super::wire::{
    AccessBody, AuthBody, Empty, Envelope, ErrorBody, HistoryBody, LessonsBody, LevelsBody,
    LoginRequest, PasswordRequest, ProfileBody, ProgressBody, RegisterRequest, StartBody,
    StartRequest, SubmitBody, SubmitRequest,
};
use super::{
    AccountApi, AnswerSubmission, CatalogApi, LessonListing, ProgressReport, QuizApi, StartedQuiz,
    SubmitOutcome,
};
use crate::error::ApiError;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_owned(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ApiConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout,
        }
    }

    /// Read `WORDIAMO_API_URL` and `WORDIAMO_TIMEOUT_SECS`, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_values(
            env::var("WORDIAMO_API_URL").ok(),
            env::var("WORDIAMO_TIMEOUT_SECS").ok(),
        )
    }

    fn from_values(base_url: Option<String>, timeout_secs: Option<String>) -> Self {
        let defaults = Self::default();
        let base_url = base_url
            .map(|url| url.trim().to_owned())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.base_url);
        let request_timeout = timeout_secs
            .and_then(|secs| secs.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(defaults.request_timeout, Duration::from_secs);
        Self {
            base_url,
            request_timeout,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// reqwest-backed implementation of every remote API trait.
///
/// The client itself is cheap to clone; the signed-in identity is attached
/// with `with_context` instead of living in global state.
#[derive(Clone)]
pub struct HttpApiClient {
    client: Client,
    config: Arc<ApiConfig>,
    context: Option<SessionContext>,
}

impl HttpApiClient {
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the underlying client cannot be built.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            config: Arc::new(config),
            context: None,
        })
    }

    /// A client that authenticates as `context`.
    #[must_use]
    pub fn with_context(&self, context: SessionContext) -> Self {
        Self {
            client: self.client.clone(),
            config: Arc::clone(&self.config),
            context: Some(context),
        }
    }

    #[must_use]
    pub fn without_context(&self) -> Self {
        Self {
            client: self.client.clone(),
            config: Arc::clone(&self.config),
            context: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    #[must_use]
    pub fn context(&self) -> Option<&SessionContext> {
        self.context.as_ref()
    }

    fn public(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.config.endpoint(path))
    }

    fn authenticated(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let context = self.context.as_ref().ok_or(ApiError::NotSignedIn)?;
        Ok(self
            .public(method, path)
            .bearer_auth(context.token().expose()))
    }

    fn transport_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.config.request_timeout)
        } else {
            ApiError::Http(err)
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let request = builder.build()?;
        tracing::debug!(method = ?request.method(), uri = %request.url(), "Sending API request");

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|err| self.transport_error(err))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| self.transport_error(err))?;

        if !status.is_success() {
            tracing::debug!(%status, "API request failed");
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .ok()
                .and_then(ErrorBody::into_message);
            return Err(message.map_or(ApiError::HttpStatus(status), ApiError::Rejected));
        }

        let envelope: Envelope<T> = serde_json::from_slice(&bytes)
            .map_err(|err| ApiError::Malformed(err.to_string()))?;
        envelope.into_body()
    }
}

#[async_trait]
impl QuizApi for HttpApiClient {
    async fn start_quiz(&self, lesson_id: LessonId) -> Result<StartedQuiz, ApiError> {
        let builder = self
            .authenticated(Method::POST, "quiz/start")?
            .json(&StartRequest { lesson_id });
        let body: StartBody = self.send(builder).await?;
        body.into_started()
    }

    async fn submit_answer(&self, answer: AnswerSubmission) -> Result<SubmitOutcome, ApiError> {
        let builder = self
            .authenticated(Method::POST, "quiz/submit")?
            .json(&SubmitRequest::from(answer));
        let body: SubmitBody = self.send(builder).await?;
        body.into_outcome(&answer)
    }
}

#[async_trait]
impl CatalogApi for HttpApiClient {
    async fn levels(&self) -> Result<Vec<Level>, ApiError> {
        let body: LevelsBody = self.send(self.public(Method::GET, "levels")).await?;
        Ok(body.into_levels())
    }

    async fn lessons(&self, level_id: LevelId) -> Result<LessonListing, ApiError> {
        let path = format!("levels/{level_id}/lessons");
        let builder = match self.authenticated(Method::GET, &path) {
            Ok(builder) => builder,
            Err(_) => self.public(Method::GET, &path),
        };
        let body: LessonsBody = self.send(builder).await?;
        Ok(body.into_listing())
    }

    async fn lesson_access(&self, lesson_id: LessonId) -> Result<LessonAccess, ApiError> {
        let path = format!("lesson/access-check/{lesson_id}");
        let body: AccessBody = self.send(self.authenticated(Method::GET, &path)?).await?;
        body.into_access()
    }

    async fn progress(&self) -> Result<ProgressReport, ApiError> {
        let body: ProgressBody = self
            .send(self.authenticated(Method::GET, "user/progress")?)
            .await?;
        Ok(body.into_report())
    }

    async fn history(&self, limit: u32) -> Result<Vec<AttemptRecord>, ApiError> {
        let path = format!("user/scores?limit={limit}");
        let body: HistoryBody = self.send(self.authenticated(Method::GET, &path)?).await?;
        Ok(body.into_records())
    }
}

#[async_trait]
impl AccountApi for HttpApiClient {
    async fn login(&self, login: &Login) -> Result<Credentials, ApiError> {
        let builder = self.public(Method::POST, "auth/login").json(&LoginRequest {
            email: login.identifier(),
            password: login.password(),
        });
        let body: AuthBody = self.send(builder).await?;
        body.into_credentials()
    }

    async fn register(&self, registration: &Registration) -> Result<Credentials, ApiError> {
        let builder = self
            .public(Method::POST, "auth/register")
            .json(&RegisterRequest {
                username: registration.username(),
                email: registration.email(),
                password: registration.password(),
            });
        let body: AuthBody = self.send(builder).await?;
        body.into_credentials()
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let _: Empty = self
            .send(self.authenticated(Method::POST, "auth/logout")?)
            .await?;
        Ok(())
    }

    async fn profile(&self) -> Result<UserProfile, ApiError> {
        let body: ProfileBody = self
            .send(self.authenticated(Method::GET, "user/profile")?)
            .await?;
        body.into_profile()
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ApiError> {
        let builder = self.authenticated(Method::PUT, "user/profile")?.json(update);
        let body: ProfileBody = self.send(builder).await?;
        body.into_profile()
    }

    async fn change_password(&self, change: &PasswordChange) -> Result<(), ApiError> {
        let builder = self
            .authenticated(Method::POST, "user/change-password")?
            .json(&PasswordRequest {
                current_password: &change.current_password,
                new_password: &change.new_password,
            });
        let _: Empty = self.send(builder).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wordiamo_core::model::{AuthToken, UserId};

    #[test]
    fn config_falls_back_to_defaults() {
        let config = ApiConfig::from_values(Some("  ".into()), Some("zero".into()));
        assert_eq!(config, ApiConfig::default());

        let config = ApiConfig::from_values(Some("https://wordiamo.test/".into()), Some("0".into()));
        assert_eq!(config.base_url, "https://wordiamo.test/");
        assert_eq!(config.request_timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        let config = ApiConfig::from_values(None, Some("30".into()));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn endpoint_joins_with_single_slash() {
        let config = ApiConfig::new("http://localhost:5000/", Duration::from_secs(1));
        assert_eq!(config.endpoint("/quiz/start"), "http://localhost:5000/quiz/start");
        assert_eq!(config.endpoint("levels"), "http://localhost:5000/levels");
    }

    #[tokio::test]
    async fn authenticated_calls_require_context() {
        let client = HttpApiClient::new(ApiConfig::default()).unwrap();
        let err = client.start_quiz(LessonId::new(1)).await.unwrap_err();
        assert!(matches!(err, ApiError::NotSignedIn));

        let signed_in = client.with_context(SessionContext::new(Credentials {
            token: AuthToken::new("t"),
            user: UserProfile {
                id: UserId::new(1),
                username: "maria".into(),
                email: "maria@example.com".into(),
                current_level_id: LevelId::new(1),
                full_name: None,
            },
        }));
        assert_eq!(signed_in.context().map(SessionContext::username), Some("maria"));
        assert!(client.context().is_none());
    }
}
