use std::sync::Arc;

use services::{
    AppServices, AuthService, CatalogService, ProfileService, QuizLoopService, ResultsService,
};
use wordiamo_core::model::SessionContext;

pub trait UiApp: Send + Sync {
    fn session(&self) -> Option<SessionContext>;

    fn auth(&self) -> Arc<AuthService>;
    fn catalog(&self) -> Arc<CatalogService>;
    fn profile(&self) -> Arc<ProfileService>;
    fn results(&self) -> Arc<ResultsService>;
    fn quiz_loop(&self) -> Arc<QuizLoopService>;
}

impl UiApp for AppServices {
    fn session(&self) -> Option<SessionContext> {
        self.context().cloned()
    }

    fn auth(&self) -> Arc<AuthService> {
        AppServices::auth(self)
    }

    fn catalog(&self) -> Arc<CatalogService> {
        AppServices::catalog(self)
    }

    fn profile(&self) -> Arc<ProfileService> {
        AppServices::profile(self)
    }

    fn results(&self) -> Arc<ResultsService> {
        AppServices::results(self)
    }

    fn quiz_loop(&self) -> Arc<QuizLoopService> {
        AppServices::quiz_loop(self)
    }
}

/// What every screen is handed: the signed-in identity and the services.
#[derive(Clone)]
pub struct AppContext {
    session: Option<SessionContext>,

    auth: Arc<AuthService>,
    catalog: Arc<CatalogService>,
    profile: Arc<ProfileService>,
    results: Arc<ResultsService>,
    quiz_loop: Arc<QuizLoopService>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            session: app.session(),
            auth: app.auth(),
            catalog: app.catalog(),
            profile: app.profile(),
            results: app.results(),
            quiz_loop: app.quiz_loop(),
        }
    }

    #[must_use]
    pub fn session(&self) -> Option<&SessionContext> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    /// Greeting name, or a neutral one when signed out.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.session
            .as_ref()
            .map_or("Guest", SessionContext::username)
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

// This context is provided by the application composition root (e.g. `crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use services::Clock;
    use services::api::ApiConfig;
    use storage::repository::Storage;

    #[tokio::test]
    async fn signed_out_context_has_a_guest_name() {
        let services = AppServices::with_storage(
            Storage::in_memory(),
            Clock::system(),
            ApiConfig::default(),
        )
        .await
        .unwrap();
        let app: Arc<dyn UiApp> = Arc::new(services);
        let ctx = build_app_context(&app);

        assert!(!ctx.is_signed_in());
        assert_eq!(ctx.display_name(), "Guest");
    }
}
