//! Command-line front end: run drills and exams against a local database.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use assess_core::model::{ExamId, ExamType, StudentId};
use clap::{Parser, Subcommand};
use services::{AppServices, Clock, EngineConfig};
use storage::repository::StaticIdentity;
use tracing_subscriber::EnvFilter;

mod commands;
mod seed;

const DEFAULT_LOG_FILTER: &str = "assess=info,services=info,storage=info";

#[derive(Parser)]
#[command(name = "assess", version, about = "Timed vocabulary drills and exam practice")]
struct Cli {
    /// Database URL
    #[arg(long, env = "ASSESS_DB_URL", default_value = "sqlite://assess.sqlite3?mode=rwc", global = true)]
    db: String,

    /// Learner taking the session; results are not saved without one
    #[arg(long, env = "ASSESS_STUDENT_ID", global = true)]
    student: Option<StudentId>,

    /// Engine config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill the database with a demo catalog and roster
    Seed,

    /// Timed vocabulary drill
    Drill {
        /// Only practise words from this lesson
        #[arg(long)]
        lesson: Option<String>,
    },

    /// Exam practice
    Exam {
        /// Exam type: URT or TOC
        #[arg(long = "type")]
        exam_type: ExamType,

        /// Exam id; asked interactively when omitted
        #[arg(long)]
        exam: Option<ExamId>,
    },

    /// Ranked learners
    Leaderboard {
        /// Rank by average only and show class figures
        #[arg(long)]
        overview: bool,
    },

    /// History digest for the selected learner
    Stats,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    if let Commands::Seed = cli.command {
        return seed::run(&cli.db).await;
    }

    let services = AppServices::new_sqlite(
        &cli.db,
        Clock::system(),
        config,
        Arc::new(StaticIdentity(cli.student)),
    )
    .await
    .with_context(|| format!("opening {}", cli.db))?;

    match cli.command {
        Commands::Seed => Ok(()),
        Commands::Drill { lesson } => commands::drill(&services, lesson.as_deref()).await,
        Commands::Exam { exam_type, exam } => commands::exam(&services, exam_type, exam).await,
        Commands::Leaderboard { overview } => commands::leaderboard(&services, overview).await,
        Commands::Stats => {
            let student = cli
                .student
                .context("--student (or ASSESS_STUDENT_ID) is required for stats")?;
            commands::stats(&services, student).await
        }
    }
}
