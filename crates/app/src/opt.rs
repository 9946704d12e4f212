use clap::{Args, Parser, Subcommand};

pub(crate) const DEFAULT_DB_URL: &str = "sqlite://wordiamo.sqlite3";

#[derive(Debug, Parser)]
#[command(name = "wordiamo", about = "Learn Italian one quiz at a time")]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) global: Global,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct Global {
    #[arg(long, global = true, env = "WORDIAMO_API_URL", help = "Base URL of the WORDIAMO API")]
    pub(crate) api_url: Option<String>,

    #[arg(long = "db", global = true, env = "WORDIAMO_DB_URL", default_value = DEFAULT_DB_URL)]
    pub(crate) db_url: String,

    #[arg(long, global = true, env = "WORDIAMO_TIMEOUT_SECS", help = "Per-request timeout")]
    pub(crate) timeout_secs: Option<u64>,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub(crate) log_json: bool,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Sign in and remember the session.
    Login(LoginArgs),
    /// Create an account and sign in.
    Register(RegisterArgs),
    /// Forget the stored session.
    Logout,
    /// Current level, stats and recent activity.
    Dashboard,
    /// List all levels.
    Levels,
    /// List the lessons of a level.
    Lessons(LessonsArgs),
    /// Take a lesson's quiz.
    Quiz(QuizArgs),
    /// Show the results of the last finished quiz.
    Results,
    /// Recent quiz scores.
    History(HistoryArgs),
    /// Show or edit the profile.
    Profile(ProfileArgs),
    /// Change the account password.
    Password(PasswordArgs),
}

#[derive(Debug, Clone, Args)]
pub(crate) struct LoginArgs {
    #[arg(long, help = "Email or username")]
    pub(crate) email: String,

    #[arg(long, env = "WORDIAMO_PASSWORD", hide_env_values = true)]
    pub(crate) password: String,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct RegisterArgs {
    #[arg(long)]
    pub(crate) username: String,

    #[arg(long)]
    pub(crate) email: String,

    #[arg(long, env = "WORDIAMO_PASSWORD", hide_env_values = true)]
    pub(crate) password: String,

    #[arg(long, help = "Defaults to --password")]
    pub(crate) confirm_password: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct LessonsArgs {
    pub(crate) level_id: u64,

    #[arg(long, help = "Only lessons whose name or description contains this")]
    pub(crate) search: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct QuizArgs {
    pub(crate) lesson_id: u64,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct HistoryArgs {
    #[arg(long, default_value_t = services::DEFAULT_HISTORY_LIMIT)]
    pub(crate) limit: u32,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct ProfileArgs {
    #[arg(long)]
    pub(crate) username: Option<String>,

    #[arg(long)]
    pub(crate) email: Option<String>,

    #[arg(long)]
    pub(crate) full_name: Option<String>,
}

impl ProfileArgs {
    pub(crate) fn is_edit(&self) -> bool {
        self.username.is_some() || self.email.is_some() || self.full_name.is_some()
    }
}

#[derive(Debug, Clone, Args)]
pub(crate) struct PasswordArgs {
    #[arg(long)]
    pub(crate) current: String,

    #[arg(long = "new")]
    pub(crate) new_password: String,

    #[arg(long, help = "Defaults to --new")]
    pub(crate) confirm: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_work_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "wordiamo",
            "quiz",
            "12",
            "--api-url",
            "http://localhost:5000",
            "--timeout-secs",
            "5",
        ])
        .unwrap();

        assert_eq!(cli.global.api_url.as_deref(), Some("http://localhost:5000"));
        assert_eq!(cli.global.timeout_secs, Some(5));
        assert!(matches!(cli.command, Commands::Quiz(QuizArgs { lesson_id: 12 })));
    }

    #[test]
    fn history_limit_has_a_default() {
        let cli = Cli::try_parse_from(["wordiamo", "history"]).unwrap();
        let Commands::History(args) = cli.command else {
            panic!("expected history");
        };
        assert_eq!(args.limit, services::DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn profile_without_fields_is_a_read() {
        let cli = Cli::try_parse_from(["wordiamo", "profile"]).unwrap();
        let Commands::Profile(args) = cli.command else {
            panic!("expected profile");
        };
        assert!(!args.is_edit());
    }
}
