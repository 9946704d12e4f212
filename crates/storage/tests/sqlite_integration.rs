use chrono::Duration;
use storage::repository::{CredentialRepository, HandoffRepository};
use storage::sqlite::SqliteRepository;
use wordiamo_core::model::{
    AuthToken, Credentials, Judgement, LessonId, LevelId, OptionId, Question, QuestionId,
    QuestionType, QuizOption, QuizResults, ReviewedQuestion, UserId, UserProfile,
};
use wordiamo_core::time::fixed_now;

fn build_results(lesson: u64, correct: bool) -> QuizResults {
    let question = Question::new(
        QuestionId::new(1),
        "Choose the greeting",
        QuestionType::new("vocabulary"),
        Some("easy".into()),
        vec![
            QuizOption::new(OptionId::new(5), "Hello", 1),
            QuizOption::new(OptionId::new(6), "Table", 2),
        ],
    )
    .unwrap();
    let reviewed = ReviewedQuestion {
        question,
        selected: Some(OptionId::new(5)),
        judgement: Some(Judgement {
            is_correct: correct,
            correct_option_id: Some(OptionId::new(5)),
            explanation: Some("Hello is a greeting.".into()),
        }),
    };
    QuizResults::new(
        LessonId::new(lesson),
        "Greetings",
        vec![reviewed],
        u32::from(correct),
        None,
        None,
        fixed_now(),
        fixed_now() + Duration::seconds(42),
    )
    .unwrap()
}

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_handoff_overwrites_and_is_read_once() {
    let repo = connect("memdb_handoff").await;

    repo.save_results(&build_results(1, false)).await.unwrap();
    repo.save_results(&build_results(12, true)).await.unwrap();

    let peeked = repo.peek_results().await.unwrap().expect("snapshot");
    assert_eq!(peeked.lesson_id(), LessonId::new(12));
    assert_eq!(peeked.score_percentage(), 100);
    assert_eq!(peeked.elapsed_seconds(), 42);

    let taken = repo.take_results().await.unwrap().expect("snapshot");
    assert_eq!(taken, peeked);
    assert_eq!(
        taken.questions()[0].judgement.as_ref().unwrap().explanation.as_deref(),
        Some("Hello is a greeting.")
    );

    assert!(repo.take_results().await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_credentials_round_trip() {
    let repo = connect("memdb_credentials").await;
    assert!(repo.load_credentials().await.unwrap().is_none());

    let creds = Credentials {
        token: AuthToken::new("header.payload.sig"),
        user: UserProfile {
            id: UserId::new(7),
            username: "luca".into(),
            email: "luca@example.com".into(),
            current_level_id: LevelId::new(2),
            full_name: Some("Luca".into()),
        },
    };
    repo.save_credentials(&creds).await.unwrap();
    assert_eq!(repo.load_credentials().await.unwrap(), Some(creds));

    repo.clear_credentials().await.unwrap();
    assert!(repo.load_credentials().await.unwrap().is_none());
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
}
