use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;

use exam_analysis::db::{self, PgStore};
use exam_analysis::models::PriorityLevel;
use exam_analysis::service::{DEFAULT_PROGRESS_LIMIT, DEFAULT_TREND_LIMIT};
use exam_analysis::{report, Analyzer, EngineConfig, ExamStore, MemoryStore};

#[derive(Parser)]
#[command(name = "exam-analysis")]
#[command(about = "Exam performance analysis: study priorities, rank estimates and what-if projections", long_about = None)]
struct Cli {
    /// Read exam data from a JSON fixture instead of Postgres
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,
    /// JSON file replacing the built-in lesson coefficient table
    #[arg(long, global = true)]
    coefficients: Option<PathBuf>,
    /// Calibration year treated as current
    #[arg(long, global = true)]
    year: Option<i32>,
    /// Calibration year compared against (defaults to the year before)
    #[arg(long, global = true)]
    previous_year: Option<i32>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Import calibration buckets from a CSV file
    ImportCalibration {
        #[arg(long)]
        csv: PathBuf,
    },
    /// List calibration buckets, optionally filtered by --year and exam type
    Calibration {
        #[arg(long)]
        exam_type: Option<String>,
    },
    /// Single-exam analysis with relative (tertile) priorities
    Analyze {
        #[arg(long)]
        student: String,
        #[arg(long)]
        exam: i64,
    },
    /// Threshold priorities with coefficient-weighted lost points
    Priorities {
        #[arg(long)]
        result_id: i64,
        #[arg(long)]
        exam_type: Option<String>,
    },
    /// Estimate this year's and last year's rank for a score
    Rank {
        #[arg(long)]
        score: f64,
        #[arg(long)]
        exam_type: String,
    },
    /// Project score and rank if one priority tier's wrong answers were correct
    WhatIf {
        #[arg(long)]
        result_id: i64,
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=3))]
        level: u8,
        #[arg(long)]
        exam_type: Option<String>,
    },
    /// Priorities, rank comparison and every what-if projection for one exam
    Insight {
        #[arg(long)]
        student: String,
        #[arg(long)]
        exam: i64,
    },
    /// Per-lesson net table across a student's exams, oldest first
    Trend {
        #[arg(long)]
        student: String,
        #[arg(long, default_value_t = DEFAULT_TREND_LIMIT)]
        limit: usize,
    },
    /// Topic group breakdown for one exam
    Groups {
        #[arg(long)]
        student: String,
        #[arg(long)]
        exam: i64,
    },
    /// Score and net averages over the latest exams
    Progress {
        #[arg(long)]
        student: String,
        #[arg(long, default_value_t = DEFAULT_PROGRESS_LIMIT)]
        limit: usize,
    },
    /// Generate a markdown study report
    Report {
        #[arg(long)]
        student: String,
        #[arg(long)]
        exam: i64,
        #[arg(long, default_value_t = DEFAULT_TREND_LIMIT)]
        limit: usize,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn connect() -> anyhow::Result<PgStore> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set, or pass --fixture")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;
    Ok(PgStore::new(pool))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("exam_analysis=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::load(cli.coefficients.as_deref(), cli.year, cli.previous_year)
        .context("failed to load engine configuration")?;

    match &cli.command {
        Commands::InitDb => {
            let store = connect().await?;
            db::init_db(store.pool()).await?;
            println!("Schema ready.");
            return Ok(());
        }
        Commands::ImportCalibration { csv } => {
            let store = connect().await?;
            let written = db::import_calibration_csv(store.pool(), csv).await?;
            println!("Wrote {written} calibration rows from {}.", csv.display());
            return Ok(());
        }
        _ => {}
    }

    let store: Box<dyn ExamStore> = match &cli.fixture {
        Some(path) => Box::new(
            MemoryStore::from_json_path(path)
                .with_context(|| format!("failed to read fixture {}", path.display()))?,
        ),
        None => Box::new(connect().await?),
    };
    let analyzer = Analyzer::new(store.as_ref(), &config);

    match cli.command {
        Commands::InitDb | Commands::ImportCalibration { .. } => {}
        Commands::Calibration { exam_type } => {
            let rows = analyzer
                .calibration_rows(cli.year, exam_type.as_deref())
                .await?;
            if rows.is_empty() {
                println!("No calibration rows match.");
                return Ok(());
            }
            print_json(&rows)?;
        }
        Commands::Analyze { student, exam } => {
            print_json(&analyzer.exam_analysis(&student, exam).await?)?;
        }
        Commands::Priorities {
            result_id,
            exam_type,
        } => {
            print_json(
                &analyzer
                    .priority_analysis(result_id, exam_type.as_deref())
                    .await?,
            )?;
        }
        Commands::Rank { score, exam_type } => {
            print_json(&analyzer.rank_comparison(score, &exam_type).await?)?;
        }
        Commands::WhatIf {
            result_id,
            level,
            exam_type,
        } => {
            let target = PriorityLevel::from_number(level)
                .with_context(|| format!("priority level must be 1, 2 or 3, got {level}"))?;
            print_json(
                &analyzer
                    .what_if(result_id, target, exam_type.as_deref())
                    .await?,
            )?;
        }
        Commands::Insight { student, exam } => {
            print_json(&analyzer.insight(&student, exam).await?)?;
        }
        Commands::Trend { student, limit } => {
            print_json(&analyzer.branch_table(&student, limit).await?)?;
        }
        Commands::Groups { student, exam } => {
            print_json(&analyzer.topic_groups(&student, exam).await?)?;
        }
        Commands::Progress { student, limit } => {
            print_json(&analyzer.progress(&student, limit).await?)?;
        }
        Commands::Report {
            student,
            exam,
            limit,
            out,
        } => {
            let analysis = analyzer.exam_analysis(&student, exam).await?;
            let groups = exam_analysis::groups::analyze_groups(&analysis);
            let trend = analyzer.branch_table(&student, limit).await?;
            let progress = analyzer.progress(&student, DEFAULT_PROGRESS_LIMIT).await?;
            let report = report::build_report(&student, &analysis, &groups, &trend, &progress);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
