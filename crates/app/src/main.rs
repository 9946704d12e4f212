mod commands;
mod db;
mod logging;
mod opt;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use services::api::{ApiConfig, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use services::{AppServices, Clock};
use ui::{UiApp, build_app_context};

use crate::opt::{Cli, Commands, Global};

fn api_config(global: &Global) -> ApiConfig {
    let base_url = global
        .api_url
        .clone()
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_owned());
    let timeout = global
        .timeout_secs
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    ApiConfig::new(base_url, Duration::from_secs(timeout))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    let db_url = db::normalize_sqlite_url(&cli.global.db_url)?;
    db::prepare_sqlite_file(&db_url)?;

    let config = api_config(&cli.global);
    tracing::debug!(api = %config.base_url, db = %db_url, "starting");
    let services = AppServices::new_sqlite(&db_url, Clock::system(), config)
        .await
        .with_context(|| format!("opening {db_url}"))?;
    let app: Arc<dyn UiApp> = Arc::new(services);
    let ctx = build_app_context(&app);

    match cli.command {
        Commands::Login(args) => commands::login(&ctx, args).await,
        Commands::Register(args) => commands::register(&ctx, args).await,
        Commands::Logout => commands::logout(&ctx).await,
        Commands::Dashboard => commands::dashboard(&ctx).await,
        Commands::Levels => commands::levels(&ctx).await,
        Commands::Lessons(args) => commands::lessons(&ctx, args).await,
        Commands::Quiz(args) => commands::quiz(&ctx, args).await,
        Commands::Results => commands::results(&ctx).await,
        Commands::History(args) => commands::history(&ctx, args).await,
        Commands::Profile(args) => commands::profile(&ctx, args).await,
        Commands::Password(args) => commands::password(&ctx, args).await,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.global.log_json)?;
    run(cli).await
}
