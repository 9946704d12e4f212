use std::sync::Arc;

use storage::repository::Storage;
use wordiamo_core::model::SessionContext;

use crate::Clock;
use crate::api::{ApiConfig, HttpApiClient};
use crate::auth_service::AuthService;
use crate::catalog_service::CatalogService;
use crate::error::AppServicesError;
use crate::profile_service::ProfileService;
use crate::quiz::QuizLoopService;
use crate::results_service::ResultsService;

/// Assembles app-facing services around one API client and one storage backend.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    storage: Storage,
    client: HttpApiClient,
    context: Option<SessionContext>,
    auth: Arc<AuthService>,
    catalog: Arc<CatalogService>,
    profile: Arc<ProfileService>,
    results: Arc<ResultsService>,
    quiz_loop: Arc<QuizLoopService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage, signed in as whoever is stored there.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage or the HTTP client cannot be initialized.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        config: ApiConfig,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::with_storage(storage, clock, config).await
    }

    /// # Errors
    ///
    /// Returns `AppServicesError` if stored credentials cannot be read or the
    /// HTTP client cannot be built.
    pub async fn with_storage(
        storage: Storage,
        clock: Clock,
        config: ApiConfig,
    ) -> Result<Self, AppServicesError> {
        let context = storage
            .credentials
            .load_credentials()
            .await?
            .map(SessionContext::new);
        let client = HttpApiClient::new(config)?;
        Ok(Self::assemble(clock, storage, client, context))
    }

    fn assemble(
        clock: Clock,
        storage: Storage,
        client: HttpApiClient,
        context: Option<SessionContext>,
    ) -> Self {
        let client = match &context {
            Some(context) => client.with_context(context.clone()),
            None => client,
        };
        let api = Arc::new(client.clone());
        let auth = Arc::new(AuthService::new(
            api.clone(),
            Arc::clone(&storage.credentials),
        ));
        let catalog = Arc::new(CatalogService::new(api.clone()));
        let profile = Arc::new(ProfileService::new(
            api.clone(),
            Arc::clone(&storage.credentials),
        ));
        let results = Arc::new(ResultsService::new(Arc::clone(&storage.handoff)));
        let quiz_loop = Arc::new(
            QuizLoopService::new(clock, api.clone(), Arc::clone(&storage.handoff))
                .with_request_timeout(client.config().request_timeout),
        );

        Self {
            clock,
            storage,
            client,
            context,
            auth,
            catalog,
            profile,
            results,
            quiz_loop,
        }
    }

    /// The same services acting as `context`.
    #[must_use]
    pub fn signed_in(&self, context: SessionContext) -> Self {
        Self::assemble(
            self.clock,
            self.storage.clone(),
            self.client.clone(),
            Some(context),
        )
    }

    /// The same services with no identity attached.
    #[must_use]
    pub fn signed_out(&self) -> Self {
        Self::assemble(
            self.clock,
            self.storage.clone(),
            self.client.without_context(),
            None,
        )
    }

    #[must_use]
    pub fn context(&self) -> Option<&SessionContext> {
        self.context.as_ref()
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn profile(&self) -> Arc<ProfileService> {
        Arc::clone(&self.profile)
    }

    #[must_use]
    pub fn results(&self) -> Arc<ResultsService> {
        Arc::clone(&self.results)
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }
}
