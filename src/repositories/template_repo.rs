use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{FromSqliteRow, PrescribedExercise, TemplateState, WorkoutTemplate};

#[derive(Debug, Clone, Default)]
pub struct NewTemplate {
    pub name: String,
    pub position: i64,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub equipment: Vec<String>,
    pub prescribed_exercises: Vec<PrescribedExercise>,
    pub metadata: Map<String, Value>,
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| AppError::Internal(e.to_string()))
}

#[derive(Clone)]
pub struct TemplateRepository {
    pool: DbPool,
}

impl TemplateRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        program_id: &str,
        day_number: i64,
        new_template: NewTemplate,
    ) -> Result<WorkoutTemplate> {
        let equipment = to_json(&new_template.equipment)?;
        let prescribed = to_json(&new_template.prescribed_exercises)?;
        let metadata = to_json(&new_template.metadata)?;

        let template = WorkoutTemplate {
            template_id: Uuid::new_v4().to_string(),
            name: new_template.name,
            position: new_template.position,
            state: TemplateState::Pending,
            description: new_template.description,
            notes: new_template.notes,
            equipment: new_template.equipment,
            prescribed_exercises: new_template.prescribed_exercises,
            metadata: new_template.metadata,
        };

        let pool = self.pool.clone();
        let program_id = program_id.to_string();
        let id = template.template_id.clone();
        let name = template.name.clone();
        let position = template.position;
        let description = template.description.clone();
        let notes = template.notes.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO workout_templates
                    (id, program_id, day_number, position, name, description, notes,
                     equipment, prescribed_exercises, metadata, status)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'pending')",
                rusqlite::params![
                    id,
                    program_id,
                    day_number,
                    position,
                    name,
                    description,
                    notes,
                    equipment,
                    prescribed,
                    metadata,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

        Ok(template)
    }

    pub async fn find_by_program_day(
        &self,
        program_id: &str,
        day_number: i64,
    ) -> Result<Vec<WorkoutTemplate>> {
        let pool = self.pool.clone();
        let program_id = program_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "SELECT * FROM workout_templates
                 WHERE program_id = ? AND day_number = ?
                 ORDER BY position, name",
            )?;
            let templates = stmt
                .query_map(
                    rusqlite::params![program_id, day_number],
                    WorkoutTemplate::from_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(templates)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_by_id(
        &self,
        program_id: &str,
        id: &str,
    ) -> Result<Option<WorkoutTemplate>> {
        let pool = self.pool.clone();
        let program_id = program_id.to_string();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let template = conn
                .query_row(
                    "SELECT * FROM workout_templates WHERE id = ? AND program_id = ?",
                    rusqlite::params![id, program_id],
                    WorkoutTemplate::from_row,
                )
                .optional()?;
            Ok(template)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Pending -> completed. Returns false if the template was not pending.
    pub async fn mark_completed(
        &self,
        program_id: &str,
        id: &str,
        user_performance: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<bool> {
        self.update(
            "UPDATE workout_templates
             SET status = 'completed', completed_at = ?1, user_performance = ?2,
                 skip_reason = NULL, linked_workout_id = NULL
             WHERE id = ?3 AND program_id = ?4 AND status = 'pending'",
            vec![
                Some(completed_at.to_rfc3339()),
                Some(user_performance.to_string()),
                Some(id.to_string()),
                Some(program_id.to_string()),
            ],
        )
        .await
    }

    /// Pending -> skipped. Returns false if the template was not pending.
    pub async fn mark_skipped(
        &self,
        program_id: &str,
        id: &str,
        reason: Option<&str>,
        completed_at: DateTime<Utc>,
    ) -> Result<bool> {
        self.update(
            "UPDATE workout_templates
             SET status = 'skipped', completed_at = ?1, skip_reason = ?2
             WHERE id = ?3 AND program_id = ?4 AND status = 'pending'",
            vec![
                Some(completed_at.to_rfc3339()),
                reason.map(str::to_string),
                Some(id.to_string()),
                Some(program_id.to_string()),
            ],
        )
        .await
    }

    /// Skipped -> pending. Returns false if the template was not skipped.
    pub async fn mark_pending(&self, program_id: &str, id: &str) -> Result<bool> {
        self.update(
            "UPDATE workout_templates
             SET status = 'pending', completed_at = NULL, skip_reason = NULL
             WHERE id = ?1 AND program_id = ?2 AND status = 'skipped'",
            vec![Some(id.to_string()), Some(program_id.to_string())],
        )
        .await
    }

    pub async fn set_linked_workout(&self, id: &str, workout_id: &str) -> Result<bool> {
        self.update(
            "UPDATE workout_templates SET linked_workout_id = ?1
             WHERE id = ?2 AND status = 'completed'",
            vec![Some(workout_id.to_string()), Some(id.to_string())],
        )
        .await
    }

    async fn update(&self, sql: &'static str, params: Vec<Option<String>>) -> Result<bool> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let affected = conn.execute(sql, rusqlite::params_from_iter(params.iter()))?;
            Ok(affected > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}
