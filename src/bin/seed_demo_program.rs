//! Seeds a demo training program into the local database.
//!
//! ```bash
//! cargo run --bin seed-demo-program
//! cargo run --bin seed-demo-program -- --database-url sqlite:./demo.db --days 21
//! ```

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Parser;
use serde_json::{json, Map, Value};

use programlog::db;
use programlog::migrations::run_migrations;
use programlog::models::{PrescribedExercise, ProgramPhase};
use programlog::repositories::{NewProgram, NewTemplate, ProgramRepository, TemplateRepository};

#[derive(Parser)]
#[command(
    name = "seed-demo-program",
    about = "Create a demo training program starting today"
)]
struct SeedArgs {
    /// Database URL override (defaults to DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,

    /// Program length in days, split evenly into three phases
    #[arg(long, default_value_t = 28)]
    days: i64,

    /// First day of the program (defaults to today)
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Seed even if a program with the same name already exists
    #[arg(long)]
    force: bool,
}

const PROGRAM_NAME: &str = "Demo Strength Block";

fn exercise(name: &str, sets: u32, reps: &str, load: &str, rest: &str) -> PrescribedExercise {
    PrescribedExercise {
        name: name.to_string(),
        sets: Some(sets),
        reps: Some(reps.to_string()),
        load: Some(load.to_string()),
        rest: Some(rest.to_string()),
        notes: None,
    }
}

fn metadata(focus: &str, minutes: u32) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("focus".to_string(), json!(focus));
    map.insert("estimatedMinutes".to_string(), json!(minutes));
    map
}

/// Templates for a day of the week; Sundays and Wednesdays are rest days.
fn templates_for(day_number: i64, phase_number: i64) -> Vec<NewTemplate> {
    let load = match phase_number {
        1 => "70%",
        2 => "80%",
        _ => "87%",
    };

    match day_number % 7 {
        1 | 5 => vec![
            NewTemplate {
                name: "Lower Body Strength".to_string(),
                position: 0,
                description: Some("Squat-focused lower session".to_string()),
                equipment: vec!["barbell".to_string(), "rack".to_string()],
                prescribed_exercises: vec![
                    exercise("Back Squat", 5, "5", load, "3 min"),
                    exercise("Romanian Deadlift", 3, "8", "moderate", "2 min"),
                    exercise("Walking Lunge", 3, "10", "bodyweight", "90 s"),
                ],
                metadata: metadata("lower", 60),
                ..Default::default()
            },
            NewTemplate {
                name: "Core Finisher".to_string(),
                position: 1,
                prescribed_exercises: vec![exercise("Plank", 3, "45 s", "bodyweight", "30 s")],
                metadata: metadata("core", 10),
                ..Default::default()
            },
        ],
        2 | 6 => vec![NewTemplate {
            name: "Upper Body Strength".to_string(),
            position: 0,
            description: Some("Press and pull".to_string()),
            equipment: vec!["barbell".to_string(), "bench".to_string(), "pull-up bar".to_string()],
            prescribed_exercises: vec![
                exercise("Bench Press", 5, "5", load, "3 min"),
                exercise("Pull-up", 4, "6-8", "bodyweight", "2 min"),
                exercise("Overhead Press", 3, "8", "moderate", "2 min"),
            ],
            metadata: metadata("upper", 55),
            ..Default::default()
        }],
        4 => vec![NewTemplate {
            name: "Conditioning".to_string(),
            position: 0,
            notes: Some("Keep heart rate in zone 2".to_string()),
            equipment: vec!["bike".to_string()],
            prescribed_exercises: vec![PrescribedExercise {
                name: "Easy Ride".to_string(),
                reps: Some("30 min".to_string()),
                ..Default::default()
            }],
            metadata: metadata("conditioning", 30),
            ..Default::default()
        }],
        _ => Vec::new(),
    }
}

fn phases(days: i64) -> Vec<ProgramPhase> {
    let names = ["Accumulation", "Intensification", "Realization"];
    let len = (days / 3).max(1);
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let start_day = i as i64 * len + 1;
            let end_day = if i == names.len() - 1 { days } else { start_day + len - 1 };
            ProgramPhase {
                phase_number: i as i64 + 1,
                name: name.to_string(),
                start_day,
                end_day,
            }
        })
        .filter(|p| p.start_day <= days)
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "programlog=info,seed_demo_program=info".into()),
        )
        .init();

    dotenvy::dotenv().ok();
    let args = SeedArgs::parse();

    let database_url = args
        .database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite:programlog.db?mode=rwc".to_string());

    let pool = db::create_pool(&database_url)?;
    run_migrations(&pool)?;

    let program_repo = ProgramRepository::new(pool.clone());
    let template_repo = TemplateRepository::new(pool);

    if !args.force {
        if let Some(existing) = program_repo
            .find_all()
            .await?
            .into_iter()
            .find(|p| p.name == PROGRAM_NAME)
        {
            tracing::info!(
                "Demo program already exists ({}); use --force to seed another",
                existing.id
            );
            return Ok(());
        }
    }

    let program = program_repo
        .create(NewProgram {
            name: PROGRAM_NAME.to_string(),
            description: Some("Three-phase barbell program".to_string()),
            start_date: args.start_date.unwrap_or_else(|| Local::now().date_naive()),
            total_days: args.days,
            phases: phases(args.days),
        })
        .await?;

    let mut count = 0;
    for day_number in 1..=program.total_days {
        let phase_number = program
            .phase_for_day(day_number)
            .map(|p| p.phase_number)
            .unwrap_or(1);
        for template in templates_for(day_number, phase_number) {
            template_repo.create(&program.id, day_number, template).await?;
            count += 1;
        }
    }

    tracing::info!(
        "Seeded program {} with {} templates over {} days",
        program.id,
        count,
        program.total_days
    );
    println!("{}", program.id);
    Ok(())
}
