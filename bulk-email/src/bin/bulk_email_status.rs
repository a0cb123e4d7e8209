//! Bulk email status tool
//!
//! Answers the bulk email queries against the live database, for operators
//! checking why an instructor can or cannot send course email.
//!
//! Usage:
//!   cargo run --bin bulk_email_status -- --database-url postgres://... enabled --course <id>

use anyhow::Context;
use bulk_email::{
    repository::PostgresBulkEmailRepository, BulkEmailConfig, BulkEmailQueryService, CourseId,
    UserId,
};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "bulk_email_status")]
#[command(about = "Inspect bulk email opt-outs, flag and course authorizations")]
struct Args {
    /// Database connection URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Has the user opted out of bulk email for the course?
    OptedOut {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        course: CourseId,
    },
    /// Is bulk email available, optionally for a course?
    Enabled {
        #[arg(long)]
        course: Option<CourseId>,
    },
    /// Is the course authorized to send bulk email?
    Course {
        #[arg(long)]
        course: CourseId,
    },
    /// Show the current global flag
    Flag,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut config = BulkEmailConfig::from_env()?;
    let args = Args::parse();
    if let Some(url) = args.database_url.clone() {
        config = config.with_database_url(url);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let repository = PostgresBulkEmailRepository::connect(&config)
        .await
        .context("failed to connect to the bulk email database")?;
    info!("Connected to bulk email database");

    let service = BulkEmailQueryService::new(Arc::new(repository));

    let output = match args.command {
        Command::OptedOut { user, course } => {
            let opted_out = service.has_user_opted_out(&user, &course).await?;
            json!({ "user_id": user, "course_id": course, "opted_out": opted_out })
        }
        Command::Enabled { course } => {
            let availability = service.availability(course.as_ref()).await?;
            json!({
                "course_id": course,
                "enabled": availability.is_enabled(),
                "availability": availability,
                "reason": availability.to_string(),
            })
        }
        Command::Course { course } => {
            let enabled = service.is_bulk_email_enabled_for_course(&course).await?;
            json!({ "course_id": course, "email_enabled": enabled })
        }
        Command::Flag => {
            let flag = service.current_flag().await?;
            serde_json::to_value(&flag)?
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if let Some(fields) = output.as_object() {
        for (key, value) in fields {
            match value {
                serde_json::Value::String(s) => println!("{}: {}", key, s),
                other => println!("{}: {}", key, other),
            }
        }
    }

    Ok(())
}
