use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use recordfix::config::{Config, Overrides, DEFAULT_CONFIG_PATH};
use recordfix::corrector::{self, RunMode, RunReport, RunRequest};
use recordfix::{db, report};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Fixes a student's grades, clears remarks and adds a commendation.
#[derive(Debug, Parser)]
#[command(name = "recordfix", version)]
struct Cli {
    /// TOML config file; missing file means defaults.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Substring of the student's full name.
    #[arg(long)]
    name: Option<String>,
    /// Subject title for the commendation.
    #[arg(long)]
    subject: Option<String>,
    #[arg(long)]
    database: Option<PathBuf>,
    /// Apply all changes in one transaction.
    #[arg(long)]
    atomic: bool,
    /// Roll everything back after reporting.
    #[arg(long)]
    dry_run: bool,
    /// Print a JSON object instead of status lines.
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recordfix=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let overrides = Overrides {
        name: cli.name.clone(),
        subject_title: cli.subject.clone(),
        database: cli.database.clone(),
        atomic: cli.atomic,
    };

    let config = match Config::load(&cli.config, &overrides) {
        Ok(c) => c,
        Err(e) => return fail(&cli, anyhow::Error::new(e)),
    };

    match execute(&cli, &config) {
        Ok(rep) => {
            if cli.json {
                println!("{}", report::ok(&rep));
            } else {
                for line in report::success_lines(&rep, &config.name, &config.subject_title) {
                    println!("{}", line);
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(&cli, e),
    }
}

fn execute(cli: &Cli, config: &Config) -> anyhow::Result<RunReport> {
    let conn = db::open_db(&config.database)?;
    let mode = if cli.dry_run {
        RunMode::DryRun
    } else if config.atomic {
        RunMode::Atomic
    } else {
        RunMode::Independent
    };
    tracing::info!(
        name = %config.name,
        subject = %config.subject_title,
        ?mode,
        "starting correction"
    );
    let req = RunRequest {
        name_pattern: &config.name,
        subject_title: &config.subject_title,
        mode,
    };
    Ok(corrector::run(&conn, &req, &mut rand::thread_rng())?)
}

fn fail(cli: &Cli, error: anyhow::Error) -> ExitCode {
    tracing::warn!(error = %format!("{:#}", error), "run failed");
    if cli.json {
        println!("{}", report::err(&error));
    } else {
        println!("{}", report::error_line(&error));
    }
    ExitCode::FAILURE
}
