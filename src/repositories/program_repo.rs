use chrono::{NaiveDate, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::db::{DbConnection, DbPool};
use crate::error::{AppError, Result};
use crate::models::{FromSqliteRow, Program, ProgramPhase};

#[derive(Debug, Clone)]
pub struct NewProgram {
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub total_days: i64,
    pub phases: Vec<ProgramPhase>,
}

#[derive(Clone)]
pub struct ProgramRepository {
    pool: DbPool,
}

fn load_phases(conn: &DbConnection, program_id: &str) -> rusqlite::Result<Vec<ProgramPhase>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM program_phases WHERE program_id = ? ORDER BY phase_number",
    )?;
    let phases = stmt
        .query_map([program_id], ProgramPhase::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(phases)
}

impl ProgramRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a program together with its phases.
    pub async fn create(&self, new_program: NewProgram) -> Result<Program> {
        if new_program.total_days < 1 {
            return Err(AppError::Validation(
                "A program needs at least one day".to_string(),
            ));
        }

        let program = Program {
            id: Uuid::new_v4().to_string(),
            name: new_program.name,
            description: new_program.description,
            start_date: new_program.start_date,
            total_days: new_program.total_days,
            phases: new_program.phases,
            created_at: Some(Utc::now()),
        };
        let program_clone = program.clone();

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut conn = pool.get()?;
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO programs (id, name, description, start_date, total_days, created_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    program_clone.id,
                    program_clone.name,
                    program_clone.description,
                    program_clone.start_date,
                    program_clone.total_days,
                    program_clone.created_at,
                ],
            )?;
            for phase in &program_clone.phases {
                tx.execute(
                    "INSERT INTO program_phases (program_id, phase_number, name, start_day, end_day)
                     VALUES (?, ?, ?, ?, ?)",
                    rusqlite::params![
                        program_clone.id,
                        phase.phase_number,
                        phase.name,
                        phase.start_day,
                        phase.end_day,
                    ],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

        Ok(program)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Program>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let program = conn
                .query_row("SELECT * FROM programs WHERE id = ?", [&id], Program::from_row)
                .optional()?;
            match program {
                Some(mut program) => {
                    program.phases = load_phases(&conn, &program.id)?;
                    Ok(Some(program))
                }
                None => Ok(None),
            }
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_all(&self) -> Result<Vec<Program>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM programs ORDER BY start_date DESC, name")?;
            let mut programs = stmt
                .query_map([], Program::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            for program in &mut programs {
                program.phases = load_phases(&conn, &program.id)?;
            }
            Ok(programs)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}
