mod config;
mod digest;
mod error;
mod logs;
mod notion;
mod server;
mod summary;
mod time;
mod upsert;
mod version;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use crate::{
    config::{Config, open_config, write_default_config},
    digest::Digest,
    notion::{DatabaseSchema, NotionClient, PageStore as _},
    time::DaySelector,
    version::{long_version, short_version},
};

#[derive(Parser)]
#[command(version = short_version())]
struct Args {
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[arg(long)]
    init: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// HTTP トリガーを起動する（デフォルト）
    Serve,
    /// 1 日分の要約をその場で実行する
    Run {
        /// 対象日 (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// today / yesterday / day_before_yesterday
        #[arg(long)]
        day: Option<String>,
    },
    /// ログ・サマリーデータベースのプロパティを表示する
    CheckSchema,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    if args.init {
        write_default_config(&args.config)?;
        info!(path = ?args.config, "Created default configuration");
        return Ok(());
    }

    info!(version = long_version(), "activity-digest version");

    let config = open_config(&args.config).context("Failed to load configuration")?;
    if let Err(e) = config.validate() {
        error!(error = %e, path = ?args.config, "Invalid configuration");
        return Err(e.into());
    }
    info!(
        log_database = %config.notion.log_database_id,
        summary_database = %config.notion.summary_database_id,
        model = %config.gemini.model,
        "Configuration loaded"
    );

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let digest = Digest::from_config(&config)?;
            server::serve(digest, config.server.listen).await
        }
        Command::Run { date, day } => {
            let digest = Digest::from_config(&config)?;
            let outcome = digest
                .run(&DaySelector { date, day }, chrono::Utc::now())
                .await?;
            info!(page_id = %outcome.page.id, url = %outcome.page.url, entries = outcome.entries, "Summary page saved");
            println!("{}", outcome.message());
            Ok(())
        }
        Command::CheckSchema => check_schema(&config).await,
    }
}

/// 両データベースのプロパティを表示し、必須プロパティの有無を報告する。
async fn check_schema(config: &Config) -> Result<()> {
    let client = NotionClient::new(&config.notion.token)?;

    let log_schema = client.schema(&config.notion.log_database_id).await?;
    print_schema("log", &config.notion.log_database_id, &log_schema);
    let log_ok = log_schema.title().is_some() && log_schema.created_time().is_some();
    println!(
        "  title + created_time: {}",
        if log_ok { "ok" } else { "MISSING" }
    );

    let summary_schema = client.schema(&config.notion.summary_database_id).await?;
    print_schema("summary", &config.notion.summary_database_id, &summary_schema);
    println!(
        "  title: {}, date: {}",
        if summary_schema.title().is_some() { "ok" } else { "MISSING" },
        summary_schema.date().unwrap_or("(not set, optional)")
    );

    if !log_ok || summary_schema.title().is_none() {
        anyhow::bail!("Required properties are missing");
    }
    Ok(())
}

fn print_schema(label: &str, database_id: &str, schema: &DatabaseSchema) {
    println!("{label} database {database_id}:");
    for (name, kind) in &schema.properties {
        println!("  {name}: {}", kind.as_str());
    }
}
