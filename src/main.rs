use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use attendance_calendar::config::DbConfig;
use attendance_calendar::models::{EnrollmentWindow, WeekBucket};
use attendance_calendar::{calendar, db, logging, report, source};
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

#[derive(Parser)]
#[command(name = "attendance-calendar")]
#[command(about = "Week-bucketed attendance calendars for EduCRM enrollments", long_about = None)]
struct Cli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    quiet: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Markdown,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load demo students, enrollments and attendance
    Seed,
    /// Import enrollments and attendance from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Build the calendar for a stored enrollment
    Calendar {
        #[arg(long)]
        email: String,
        #[arg(long)]
        course: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Build a calendar from a date,status CSV without a database
    Render {
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        duration: Option<String>,
        #[arg(long)]
        records: Option<PathBuf>,
        #[arg(long)]
        student: Option<String>,
        #[arg(long)]
        course: Option<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

async fn connect() -> anyhow::Result<PgPool> {
    let cfg = DbConfig::from_env()?;
    PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .connect(&cfg.database_url)
        .await
        .context("failed to connect to Postgres")
}

fn emit(
    buckets: &[WeekBucket],
    format: OutputFormat,
    student: Option<&str>,
    course: Option<&str>,
    duration_text: Option<&str>,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    let rendered = match format {
        OutputFormat::Markdown => report::build_report(student, course, duration_text, buckets),
        OutputFormat::Json => report::build_json(buckets)?,
    };

    match out {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Calendar written to {}.", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            if !rendered.ends_with('\n') {
                writeln!(stdout)?;
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose, cli.quiet)?;

    match cli.command {
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect().await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let pool = connect().await?;
            let changed = db::import_csv(&pool, &csv).await?;
            println!("Stored {changed} attendance records from {}.", csv.display());
        }
        Commands::Calendar {
            email,
            course,
            format,
            out,
        } => {
            let pool = connect().await?;
            let Some(enrollment) = db::fetch_enrollment(&pool, &email, &course).await? else {
                println!("No enrollment found for {email} in {course}.");
                return Ok(());
            };
            let records = db::fetch_attendance(&pool, enrollment.enrollment_id).await?;
            info!(
                email = %enrollment.student_email,
                course = %enrollment.course,
                records = records.len(),
                "command calendar"
            );

            let buckets = calendar::build_attendance_calendar(&enrollment.window(), &records);
            emit(
                &buckets,
                format,
                Some(&enrollment.student_name),
                Some(&enrollment.course),
                enrollment.duration_text.as_deref(),
                out.as_deref(),
            )?;
        }
        Commands::Render {
            start,
            duration,
            records,
            student,
            course,
            format,
            out,
        } => {
            let records = match records.as_deref() {
                Some(path) => source::read_attendance_csv(path)?,
                None => Vec::new(),
            };
            info!(%start, records = records.len(), "command render");

            let window = EnrollmentWindow {
                start_date: start,
                duration_text: duration.clone(),
            };
            let buckets = calendar::build_attendance_calendar(&window, &records);
            emit(
                &buckets,
                format,
                student.as_deref(),
                course.as_deref(),
                duration.as_deref(),
                out.as_deref(),
            )?;
        }
    }

    Ok(())
}
