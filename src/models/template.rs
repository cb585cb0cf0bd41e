use std::fmt;

use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::from_row::{conversion_error, json_column, FromSqliteRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateStatus {
    Pending,
    Completed,
    Skipped,
}

impl TemplateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateStatus::Pending => "pending",
            TemplateStatus::Completed => "completed",
            TemplateStatus::Skipped => "skipped",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TemplateStatus::Pending),
            "completed" => Some(TemplateStatus::Completed),
            "skipped" => Some(TemplateStatus::Skipped),
            _ => None,
        }
    }

    /// Completed and skipped templates both count towards finishing a day.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, TemplateStatus::Pending)
    }
}

impl fmt::Display for TemplateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a template. `completed_at` only exists on resolved
/// variants, so a pending template can never carry a timestamp.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateState {
    Pending,
    Completed {
        completed_at: DateTime<Utc>,
        linked_workout_id: Option<String>,
    },
    Skipped {
        completed_at: DateTime<Utc>,
        reason: Option<String>,
    },
}

#[derive(Debug, Error)]
#[error("template status '{status}' does not match completedAt ({detail})")]
pub struct InvalidTemplateState {
    pub status: TemplateStatus,
    pub detail: &'static str,
}

impl TemplateState {
    pub fn status(&self) -> TemplateStatus {
        match self {
            TemplateState::Pending => TemplateStatus::Pending,
            TemplateState::Completed { .. } => TemplateStatus::Completed,
            TemplateState::Skipped { .. } => TemplateStatus::Skipped,
        }
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        match self {
            TemplateState::Pending => None,
            TemplateState::Completed { completed_at, .. }
            | TemplateState::Skipped { completed_at, .. } => Some(*completed_at),
        }
    }

    pub fn from_parts(
        status: TemplateStatus,
        completed_at: Option<DateTime<Utc>>,
        linked_workout_id: Option<String>,
        skip_reason: Option<String>,
    ) -> Result<Self, InvalidTemplateState> {
        match (status, completed_at) {
            (TemplateStatus::Pending, None) => Ok(TemplateState::Pending),
            (TemplateStatus::Pending, Some(_)) => Err(InvalidTemplateState {
                status,
                detail: "pending template has a completion time",
            }),
            (TemplateStatus::Completed, Some(completed_at)) => Ok(TemplateState::Completed {
                completed_at,
                linked_workout_id,
            }),
            (TemplateStatus::Skipped, Some(completed_at)) => Ok(TemplateState::Skipped {
                completed_at,
                reason: skip_reason,
            }),
            (_, None) => Err(InvalidTemplateState {
                status,
                detail: "resolved template is missing its completion time",
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescribedExercise {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sets: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A prescribed workout slot within a program day.
///
/// Everything except `state` is display data owned by the program service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TemplateRecord", into = "TemplateRecord")]
pub struct WorkoutTemplate {
    pub template_id: String,
    pub name: String,
    pub position: i64,
    pub state: TemplateState,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub equipment: Vec<String>,
    pub prescribed_exercises: Vec<PrescribedExercise>,
    pub metadata: Map<String, Value>,
}

impl WorkoutTemplate {
    pub fn status(&self) -> TemplateStatus {
        self.state.status()
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.state.completed_at()
    }

    pub fn linked_workout_id(&self) -> Option<&str> {
        match &self.state {
            TemplateState::Completed {
                linked_workout_id, ..
            } => linked_workout_id.as_deref(),
            _ => None,
        }
    }

    pub fn skip_reason(&self) -> Option<&str> {
        match &self.state {
            TemplateState::Skipped { reason, .. } => reason.as_deref(),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.status().is_resolved()
    }
}

/// Flat wire shape of a template as exchanged with the program service.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplateRecord {
    template_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    position: i64,
    status: TemplateStatus,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    linked_workout_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    skip_reason: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    equipment: Vec<String>,
    #[serde(default)]
    prescribed_exercises: Vec<PrescribedExercise>,
    #[serde(default)]
    metadata: Map<String, Value>,
}

impl TryFrom<TemplateRecord> for WorkoutTemplate {
    type Error = InvalidTemplateState;

    fn try_from(record: TemplateRecord) -> Result<Self, Self::Error> {
        let state = TemplateState::from_parts(
            record.status,
            record.completed_at,
            record.linked_workout_id,
            record.skip_reason,
        )?;
        Ok(Self {
            template_id: record.template_id,
            name: record.name,
            position: record.position,
            state,
            description: record.description,
            notes: record.notes,
            equipment: record.equipment,
            prescribed_exercises: record.prescribed_exercises,
            metadata: record.metadata,
        })
    }
}

impl From<WorkoutTemplate> for TemplateRecord {
    fn from(template: WorkoutTemplate) -> Self {
        let status = template.status();
        let (completed_at, linked_workout_id, skip_reason) = match template.state {
            TemplateState::Pending => (None, None, None),
            TemplateState::Completed {
                completed_at,
                linked_workout_id,
            } => (Some(completed_at), linked_workout_id, None),
            TemplateState::Skipped {
                completed_at,
                reason,
            } => (Some(completed_at), None, reason),
        };
        Self {
            template_id: template.template_id,
            name: template.name,
            position: template.position,
            status,
            completed_at,
            linked_workout_id,
            skip_reason,
            description: template.description,
            notes: template.notes,
            equipment: template.equipment,
            prescribed_exercises: template.prescribed_exercises,
            metadata: template.metadata,
        }
    }
}

impl FromSqliteRow for WorkoutTemplate {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let status_str: String = row.get("status")?;
        let status = TemplateStatus::parse(&status_str).ok_or_else(|| {
            conversion_error(row, "status", format!("unknown status '{}'", status_str).into())
        })?;
        let state = TemplateState::from_parts(
            status,
            row.get("completed_at")?,
            row.get("linked_workout_id")?,
            row.get("skip_reason")?,
        )
        .map_err(|e| conversion_error(row, "status", Box::new(e)))?;

        Ok(Self {
            template_id: row.get("id")?,
            name: row.get("name")?,
            position: row.get("position")?,
            state,
            description: row.get("description")?,
            notes: row.get("notes")?,
            equipment: json_column(row, "equipment")?,
            prescribed_exercises: json_column(row, "prescribed_exercises")?,
            metadata: json_column(row, "metadata")?,
        })
    }
}

/// Extra data sent along with a transition request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TransitionOptions {
    pub fn with_reason(reason: Option<&str>) -> Self {
        Self {
            reason: reason
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
        }
    }
}
