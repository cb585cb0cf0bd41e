use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::from_row::{json_column, FromSqliteRow};

/// A persisted workout record produced from logged performance text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: String,
    pub program_id: String,
    pub template_id: String,
    pub title: String,
    pub performed_at: DateTime<Utc>,
    pub user_performance: String,
    #[serde(default)]
    pub exercises: Vec<PerformedExercise>,
}

impl Workout {
    pub fn total_sets(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }

    /// Sum of reps x weight over all weighted sets.
    pub fn total_volume(&self) -> f64 {
        self.exercises
            .iter()
            .flat_map(|e| e.sets.iter())
            .filter_map(|s| s.weight.map(|w| w * f64::from(s.reps)))
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformedExercise {
    pub name: String,
    #[serde(default)]
    pub sets: Vec<PerformedSet>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformedSet {
    pub reps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl FromSqliteRow for Workout {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            program_id: row.get("program_id")?,
            template_id: row.get("template_id")?,
            title: row.get("title")?,
            performed_at: row.get("performed_at")?,
            user_performance: row.get("user_performance")?,
            exercises: json_column(row, "exercises")?,
        })
    }
}
