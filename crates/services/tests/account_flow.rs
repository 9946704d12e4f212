use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use services::api::{AccountApi, CatalogApi, LessonListing, ProgressReport};
use services::{ApiError, AuthError, AuthService, CatalogService, ProfileError, ProfileService};
use storage::repository::{CredentialRepository, InMemoryRepository};
use wordiamo_core::model::{
    AttemptId, AttemptRecord, AuthToken, Credentials, Lesson, LessonAccess, LessonId, Level,
    LevelId, Login, LoginDraft, PasswordChange, ProfileUpdate, Registration, RegistrationDraft,
    UserId, UserProfile, UserProgress, ValidationError,
};

fn profile(username: &str) -> UserProfile {
    UserProfile {
        id: UserId::new(7),
        username: username.into(),
        email: format!("{username}@example.com"),
        current_level_id: LevelId::new(1),
        full_name: None,
    }
}

#[derive(Default)]
struct FakeAccountApi {
    calls: AtomicUsize,
    logout_fails: bool,
}

impl FakeAccountApi {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountApi for FakeAccountApi {
    async fn login(&self, login: &Login) -> Result<Credentials, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if login.password() != "secret1" {
            return Err(ApiError::Rejected("Invalid email or password".into()));
        }
        Ok(Credentials {
            token: AuthToken::new("token-1"),
            user: profile("maria"),
        })
    }

    async fn register(&self, registration: &Registration) -> Result<Credentials, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Credentials {
            token: AuthToken::new("token-2"),
            user: profile(registration.username()),
        })
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.logout_fails {
            return Err(ApiError::NotSignedIn);
        }
        Ok(())
    }

    async fn profile(&self) -> Result<UserProfile, ApiError> {
        Ok(profile("maria"))
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut user = profile("maria");
        update.apply_to(&mut user);
        Ok(user)
    }

    async fn change_password(&self, _change: &PasswordChange) -> Result<(), ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn login_persists_credentials_and_logout_clears_them() {
    let api = Arc::new(FakeAccountApi {
        logout_fails: true,
        ..FakeAccountApi::default()
    });
    let repo = InMemoryRepository::new();
    let auth = AuthService::new(api.clone(), Arc::new(repo.clone()));

    let err = auth.current_context().await.unwrap_err();
    assert!(matches!(err, AuthError::NotSignedIn));

    let context = auth
        .login(LoginDraft {
            identifier: "maria@example.com".into(),
            password: "secret1".into(),
        })
        .await
        .unwrap();
    assert_eq!(context.username(), "maria");
    assert_eq!(auth.current_context().await.unwrap(), context);

    auth.logout().await.unwrap();
    assert!(repo.load_credentials().await.unwrap().is_none());
    assert_eq!(api.calls(), 2);
}

#[tokio::test]
async fn rejected_login_stores_nothing() {
    let api = Arc::new(FakeAccountApi::default());
    let repo = InMemoryRepository::new();
    let auth = AuthService::new(api, Arc::new(repo.clone()));

    let err = auth
        .login(LoginDraft {
            identifier: "maria@example.com".into(),
            password: "wrong-password".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Api(ApiError::Rejected(_))));
    assert!(repo.load_credentials().await.unwrap().is_none());
}

#[tokio::test]
async fn invalid_registration_never_reaches_server() {
    let api = Arc::new(FakeAccountApi::default());
    let auth = AuthService::new(api.clone(), Arc::new(InMemoryRepository::new()));

    let err = auth
        .register(RegistrationDraft {
            username: "luca".into(),
            email: "luca@example.com".into(),
            password: "longenough".into(),
            confirm_password: "different!".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AuthError::Validation(ValidationError::PasswordMismatch)
    ));
    assert_eq!(api.calls(), 0);

    let context = auth
        .register(RegistrationDraft {
            username: "luca".into(),
            email: "luca@example.com".into(),
            password: "longenough".into(),
            confirm_password: "longenough".into(),
        })
        .await
        .unwrap();
    assert_eq!(context.username(), "luca");
}

#[tokio::test]
async fn profile_update_refreshes_stored_user() {
    let api = Arc::new(FakeAccountApi::default());
    let repo = InMemoryRepository::new();
    repo.save_credentials(&Credentials {
        token: AuthToken::new("token-1"),
        user: profile("maria"),
    })
    .await
    .unwrap();
    let profiles = ProfileService::new(api.clone(), Arc::new(repo.clone()));

    let err = profiles
        .update_profile(ProfileUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProfileError::Validation(ValidationError::EmptyUpdate)
    ));

    let updated = profiles
        .update_profile(ProfileUpdate {
            full_name: Some("  Maria Rossi ".into()),
            ..ProfileUpdate::default()
        })
        .await
        .unwrap();
    assert_eq!(updated.full_name.as_deref(), Some("Maria Rossi"));

    let stored = repo.load_credentials().await.unwrap().unwrap();
    assert_eq!(stored.user.full_name.as_deref(), Some("Maria Rossi"));
    assert_eq!(stored.token.expose(), "token-1");

    let err = profiles
        .change_password(PasswordChange {
            current_password: "old-secret".into(),
            new_password: "short".into(),
            confirm_password: "short".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProfileError::Validation(ValidationError::PasswordTooShort { .. })
    ));
    assert_eq!(api.calls(), 1);
}

struct FakeCatalogApi {
    access_checks: AtomicUsize,
}

fn lesson(id: u64, access: LessonAccess) -> Lesson {
    Lesson {
        id: LessonId::new(id),
        level_id: LevelId::new(2),
        name: format!("Lesson {id}"),
        description: None,
        order: u32::try_from(id).unwrap(),
        estimated_minutes: Some(10),
        question_count: 5,
        average_score: None,
        access,
    }
}

#[async_trait]
impl CatalogApi for FakeCatalogApi {
    async fn levels(&self) -> Result<Vec<Level>, ApiError> {
        Ok(Vec::new())
    }

    async fn lessons(&self, level_id: LevelId) -> Result<LessonListing, ApiError> {
        Ok(LessonListing {
            level: Level {
                id: level_id,
                name: "Elementary".into(),
                description: None,
                order: 2,
                lesson_count: 2,
            },
            lessons: vec![
                lesson(1, LessonAccess::Open),
                lesson(2, LessonAccess::Unreported),
            ],
        })
    }

    async fn lesson_access(&self, _lesson_id: LessonId) -> Result<LessonAccess, ApiError> {
        self.access_checks.fetch_add(1, Ordering::SeqCst);
        Ok(LessonAccess::Locked {
            reason: Some("Complete your current level first".into()),
        })
    }

    async fn progress(&self) -> Result<ProgressReport, ApiError> {
        Ok(ProgressReport {
            username: None,
            current_level_id: None,
            progress: UserProgress::default(),
        })
    }

    async fn history(&self, limit: u32) -> Result<Vec<AttemptRecord>, ApiError> {
        Ok((1..=u64::from(limit) + 3)
            .map(|id| AttemptRecord {
                attempt_id: AttemptId::new(id),
                lesson_id: LessonId::new(1),
                lesson_name: "Greetings".into(),
                score_percentage: 80,
                correct_answers: 4,
                total_questions: 5,
                completion_time_minutes: None,
                attempted_at: None,
                passing: true,
            })
            .collect())
    }
}

#[tokio::test]
async fn lesson_access_comes_from_server_only() {
    let api = Arc::new(FakeCatalogApi {
        access_checks: AtomicUsize::new(0),
    });
    let catalog = CatalogService::new(api.clone());

    let listing = catalog.lessons(LevelId::new(2)).await.unwrap();
    assert_eq!(listing.lessons[1].access, LessonAccess::Unreported);

    let listing = catalog.lessons_with_access(LevelId::new(2)).await.unwrap();
    assert_eq!(listing.lessons[0].access, LessonAccess::Open);
    assert!(listing.lessons[1].access.is_locked());
    assert_eq!(api.access_checks.load(Ordering::SeqCst), 1);

    assert_eq!(catalog.history(2).await.unwrap().len(), 2);
}
