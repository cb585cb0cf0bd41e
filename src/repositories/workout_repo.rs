use chrono::Utc;
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{FromSqliteRow, PerformedExercise, Workout};

#[derive(Clone)]
pub struct WorkoutRepository {
    pool: DbPool,
}

impl WorkoutRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        program_id: &str,
        template_id: &str,
        title: &str,
        user_performance: &str,
        exercises: Vec<PerformedExercise>,
    ) -> Result<Workout> {
        let exercises_json =
            serde_json::to_string(&exercises).map_err(|e| AppError::Internal(e.to_string()))?;

        let workout = Workout {
            id: Uuid::new_v4().to_string(),
            program_id: program_id.to_string(),
            template_id: template_id.to_string(),
            title: title.to_string(),
            performed_at: Utc::now(),
            user_performance: user_performance.to_string(),
            exercises,
        };
        let workout_clone = workout.clone();

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO workouts
                    (id, program_id, template_id, title, performed_at, user_performance, exercises)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    workout_clone.id,
                    workout_clone.program_id,
                    workout_clone.template_id,
                    workout_clone.title,
                    workout_clone.performed_at,
                    workout_clone.user_performance,
                    exercises_json,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

        Ok(workout)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Workout>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let workout = conn
                .query_row("SELECT * FROM workouts WHERE id = ?", [&id], Workout::from_row)
                .optional()?;
            Ok(workout)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}
