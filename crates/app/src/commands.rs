use std::io::Write;

use anyhow::{Context, anyhow};
use services::QuizPhase;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use ui::AppContext;
use ui::state::ViewError;
use ui::vm::{
    DashboardVm, LessonListVm, OptionMark, QuizIntent, QuizOutcome, QuizVm, ResultsVm,
    ReviewStatus, format_date,
};
use wordiamo_core::model::{
    LessonId, LevelId, LoginDraft, PasswordChange, ProfileUpdate, RegistrationDraft,
};

use crate::opt::{
    HistoryArgs, LessonsArgs, LoginArgs, PasswordArgs, ProfileArgs, QuizArgs, RegisterArgs,
};

fn fail(err: ViewError) -> anyhow::Error {
    anyhow!(err.message())
}

// ─── ACCOUNT ────────────────────────────────────────────────────────────────

pub(crate) async fn login(ctx: &AppContext, args: LoginArgs) -> anyhow::Result<()> {
    let draft = LoginDraft {
        identifier: args.email,
        password: args.password,
    };
    let session = ui::vm::sign_in(&ctx.auth(), draft).await.map_err(fail)?;
    println!("Signed in as {}.", session.username());
    Ok(())
}

pub(crate) async fn register(ctx: &AppContext, args: RegisterArgs) -> anyhow::Result<()> {
    let confirm_password = args
        .confirm_password
        .unwrap_or_else(|| args.password.clone());
    let draft = RegistrationDraft {
        username: args.username,
        email: args.email,
        password: args.password,
        confirm_password,
    };
    let session = ui::vm::sign_up(&ctx.auth(), draft).await.map_err(fail)?;
    println!("Welcome to WORDIAMO, {}!", session.username());
    Ok(())
}

pub(crate) async fn logout(ctx: &AppContext) -> anyhow::Result<()> {
    ctx.auth()
        .logout()
        .await
        .map_err(|err| fail(err.into()))?;
    println!("Signed out.");
    Ok(())
}

pub(crate) async fn profile(ctx: &AppContext, args: ProfileArgs) -> anyhow::Result<()> {
    let service = ctx.profile();
    let (current, mut vm) = ui::vm::load_profile(&service).await.map_err(fail)?;

    if args.is_edit() {
        let update = ProfileUpdate {
            username: args.username,
            email: args.email,
            full_name: args.full_name,
        };
        let updated = service
            .update_profile(update)
            .await
            .map_err(|err| fail(err.into()))?;
        vm = ui::vm::ProfileVm::from(&updated);
        println!("{}", ui::vm::PROFILE_SAVED);
    } else {
        tracing::debug!(user_id = %current.id, "profile loaded");
    }

    println!("Username:  {}", vm.username);
    println!("Email:     {}", vm.email);
    if !vm.full_name.is_empty() {
        println!("Full name: {}", vm.full_name);
    }
    println!("Level:     {}", vm.level);
    Ok(())
}

pub(crate) async fn password(ctx: &AppContext, args: PasswordArgs) -> anyhow::Result<()> {
    let confirm_password = args
        .confirm
        .unwrap_or_else(|| args.new_password.clone());
    let change = PasswordChange {
        current_password: args.current,
        new_password: args.new_password,
        confirm_password,
    };
    let message = ui::vm::change_password(&ctx.profile(), change)
        .await
        .map_err(fail)?;
    println!("{message}");
    Ok(())
}

// ─── CATALOG ────────────────────────────────────────────────────────────────

pub(crate) async fn dashboard(ctx: &AppContext) -> anyhow::Result<()> {
    let vm: DashboardVm = ui::vm::load_dashboard(&ctx.catalog())
        .await
        .map_err(fail)?;

    println!("{}", vm.greeting);
    println!("Current level:     {}", vm.current_level);
    println!("Completed lessons: {}", vm.completed_lessons);
    println!("Average score:     {}", vm.average_score);
    if let Some(last) = &vm.last_activity {
        println!("Last activity:     {last}");
    }
    println!();
    println!("Recent activity");
    match vm.empty_message() {
        Some(message) => println!("  {message}"),
        None => {
            for card in &vm.recent {
                println!(
                    "  {:<28} {:>5}  {:<14} {}",
                    card.lesson_name, card.score, card.detail, card.date
                );
            }
        }
    }
    Ok(())
}

pub(crate) async fn levels(ctx: &AppContext) -> anyhow::Result<()> {
    let levels = ui::vm::load_levels(&ctx.catalog()).await.map_err(fail)?;
    for level in levels {
        println!("[{}] {} ({} lessons)", level.id, level.name, level.lesson_count);
        if !level.description.is_empty() {
            println!("    {}", level.description);
        }
    }
    Ok(())
}

pub(crate) async fn lessons(ctx: &AppContext, args: LessonsArgs) -> anyhow::Result<()> {
    let mut vm: LessonListVm = ui::vm::load_lessons(&ctx.catalog(), LevelId::new(args.level_id))
        .await
        .map_err(fail)?;
    if let Some(search) = args.search {
        vm.set_query(search);
    }

    println!("{}", vm.level.name);
    if let Some(message) = vm.empty_message() {
        println!("  {message}");
        return Ok(());
    }
    for lesson in vm.visible() {
        let lock = if lesson.locked { " [locked]" } else { "" };
        println!("[{}] {}{lock}", lesson.id, lesson.name);
        println!("    {}", lesson.meta);
        if let Some(score) = &lesson.average_score {
            println!("    Average score: {score}");
        }
        if let Some(reason) = &lesson.lock_reason {
            println!("    {reason}");
        }
    }
    Ok(())
}

pub(crate) async fn history(ctx: &AppContext, args: HistoryArgs) -> anyhow::Result<()> {
    let records = ctx
        .catalog()
        .history(args.limit)
        .await
        .map_err(|err| fail(err.into()))?;
    if records.is_empty() {
        println!("{}", ui::vm::NO_ACTIVITY_MESSAGE);
    }
    for record in records {
        let date = record
            .attempted_at
            .map_or_else(|| "-".to_owned(), format_date);
        let verdict = if record.passing { "passed" } else { "failed" };
        println!(
            "{date:<13} {:<28} {:>3}% ({}/{}) {verdict}",
            record.lesson_name, record.score_percentage, record.correct_answers,
            record.total_questions
        );
    }
    Ok(())
}

// ─── QUIZ ───────────────────────────────────────────────────────────────────

async fn read_line(lines: &mut Lines<BufReader<Stdin>>, prompt: &str) -> anyhow::Result<Option<String>> {
    print!("{prompt}");
    std::io::stdout().flush().context("writing prompt")?;
    let line = lines.next_line().await.context("reading answer")?;
    Ok(line.map(|line| line.trim().to_owned()))
}

fn print_question(vm: &QuizVm) {
    println!();
    println!(
        "{}  |  {}  |  score {}  |  {}",
        vm.position_label(),
        vm.question_type_label().unwrap_or("Question"),
        vm.score(),
        vm.elapsed()
    );
    if let Some(text) = vm.question_text() {
        println!("{text}");
    }
    for (index, option) in vm.options().iter().enumerate() {
        let marker = match option.mark {
            OptionMark::Neutral => " ",
            OptionMark::Selected => ">",
            OptionMark::Correct => "✓",
            OptionMark::Incorrect => "✗",
        };
        println!(" {marker} {}. {}", index + 1, option.text);
    }
}

fn print_feedback(vm: &QuizVm) {
    let Some(feedback) = vm.feedback() else {
        return;
    };
    println!("{}", feedback.headline);
    if let Some(correct) = &feedback.correct_answer {
        println!("Correct answer: {correct}");
    }
    if let Some(explanation) = &feedback.explanation {
        println!("{explanation}");
    }
}

pub(crate) async fn quiz(ctx: &AppContext, args: QuizArgs) -> anyhow::Result<()> {
    let quiz_loop = ctx.quiz_loop();
    let catalog = ctx.catalog();
    let mut vm = ui::vm::start_quiz(&quiz_loop, Some(&catalog), LessonId::new(args.lesson_id))
        .await
        .map_err(fail)?;
    println!("{}", vm.lesson_name());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut outcome = QuizOutcome::Continue;

    while outcome == QuizOutcome::Continue {
        match vm.phase() {
            QuizPhase::AwaitingAnswer => {
                print_question(&vm);
                let count = vm.options().len();
                let Some(input) =
                    read_line(&mut lines, &format!("Answer [1-{count}], q to quit: ")).await?
                else {
                    outcome = vm.dispatch(&quiz_loop, QuizIntent::Exit).await.map_err(fail)?;
                    continue;
                };
                if input.eq_ignore_ascii_case("q") {
                    outcome = vm.dispatch(&quiz_loop, QuizIntent::Exit).await.map_err(fail)?;
                    continue;
                }
                let chosen = input
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|index| vm.options().get(index).map(|option| option.id));
                let Some(option) = chosen else {
                    println!("Please enter a number between 1 and {count}.");
                    continue;
                };
                vm.dispatch(&quiz_loop, QuizIntent::Select(option))
                    .await
                    .map_err(fail)?;
                match vm.dispatch(&quiz_loop, QuizIntent::Submit).await {
                    Ok(next) => outcome = next,
                    Err(err) if vm.can_resend() => {
                        println!("{} Your answer was kept; submit again.", err.message());
                    }
                    Err(_) if vm.needs_save() => {}
                    Err(err) => return Err(fail(err)),
                }
            }
            QuizPhase::Submitted => {
                print_feedback(&vm);
                let prompt = format!("Enter for {}, q to quit: ", vm.next_label());
                match read_line(&mut lines, &prompt).await? {
                    Some(input) if input.eq_ignore_ascii_case("q") => {
                        outcome = vm.dispatch(&quiz_loop, QuizIntent::Exit).await.map_err(fail)?;
                    }
                    Some(_) => {
                        outcome = vm.dispatch(&quiz_loop, QuizIntent::Next).await.map_err(fail)?;
                    }
                    None => {
                        outcome = vm.dispatch(&quiz_loop, QuizIntent::Exit).await.map_err(fail)?;
                    }
                }
            }
            QuizPhase::Completed if vm.needs_save() => {
                let notice = vm.notice().map_or_else(String::new, ViewError::message);
                println!("Could not save your results. {notice}");
                if read_line(&mut lines, "Enter to retry, q to quit: ")
                    .await?
                    .is_some_and(|input| input.eq_ignore_ascii_case("q"))
                {
                    return Ok(());
                }
                if let Ok(next) = vm.retry_save(&quiz_loop).await {
                    outcome = next;
                }
            }
            QuizPhase::Completed => outcome = QuizOutcome::Completed,
            _ => outcome = QuizOutcome::Exited,
        }
    }

    if outcome == QuizOutcome::Completed {
        print_feedback(&vm);
        results(ctx).await?;
    } else {
        println!("Quiz abandoned. Nothing was saved.");
    }
    Ok(())
}

// ─── RESULTS ────────────────────────────────────────────────────────────────

fn print_results(vm: &ResultsVm) {
    println!();
    println!("{}: {}% ({})", vm.lesson_name, vm.score_percentage, vm.performance_label());
    println!("{}", vm.completion_message());
    println!(
        "Correct {}  Incorrect {}  Total {}  Time {}",
        vm.correct, vm.incorrect, vm.total, vm.time_taken
    );

    if let Some(upgrade) = &vm.level_upgrade {
        println!();
        println!("Level up! You reached {}.", upgrade.new_level_name);
        if let (Some(done), Some(total)) = (upgrade.completed_lessons, upgrade.total_lessons) {
            println!("Completed {done} of {total} lessons in your previous level.");
        }
    }

    if !vm.breakdown.is_empty() {
        println!();
        println!("By category");
        for row in &vm.breakdown {
            println!(
                "  {:<20} {}/{} ({}%)",
                row.label, row.correct, row.total, row.percentage
            );
        }
    }

    println!();
    println!("Review");
    for item in &vm.review {
        println!("  {}. [{}] {}", item.number, item.status.label(), item.question_text);
        println!(
            "     Your answer: {}",
            item.user_answer.as_deref().unwrap_or("(no answer)")
        );
        if item.status != ReviewStatus::Correct {
            if let Some(correct) = &item.correct_answer {
                println!("     Correct answer: {correct}");
            }
        }
        if let Some(explanation) = &item.explanation {
            println!("     {explanation}");
        }
    }

    println!();
    println!("Retake with: wordiamo quiz {}", vm.retake_lesson_id());
}

pub(crate) async fn results(ctx: &AppContext) -> anyhow::Result<()> {
    let vm = ui::vm::load_last_results(&ctx.results())
        .await
        .map_err(fail)?;
    print_results(&vm);
    Ok(())
}
