use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::{FromSqliteRow, WorkoutTemplate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub total_days: i64,
    #[serde(default)]
    pub phases: Vec<ProgramPhase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Program {
    /// Day number for a calendar date, clamped to the program's length.
    pub fn day_for_date(&self, date: NaiveDate) -> i64 {
        let elapsed = (date - self.start_date).num_days() + 1;
        elapsed.clamp(1, self.total_days.max(1))
    }

    pub fn phase_for_day(&self, day_number: i64) -> Option<&ProgramPhase> {
        self.phases
            .iter()
            .find(|p| p.start_day <= day_number && day_number <= p.end_day)
    }
}

impl FromSqliteRow for Program {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            start_date: row.get("start_date")?,
            total_days: row.get("total_days")?,
            phases: Vec::new(),
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramPhase {
    pub phase_number: i64,
    pub name: String,
    pub start_day: i64,
    pub end_day: i64,
}

impl FromSqliteRow for ProgramPhase {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            phase_number: row.get("phase_number")?,
            name: row.get("name")?,
            start_day: row.get("start_day")?,
            end_day: row.get("end_day")?,
        })
    }
}

/// Templates scheduled for one program day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramDay {
    pub day_number: i64,
    #[serde(default)]
    pub phase_name: Option<String>,
    #[serde(default)]
    pub phase_number: Option<i64>,
    #[serde(default)]
    pub templates: Vec<WorkoutTemplate>,
}

/// Which day of a program to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaySelector {
    Today,
    Day(i64),
}

impl DaySelector {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            DaySelector::Today => vec![("today", "true".to_string())],
            DaySelector::Day(n) => vec![("day", n.to_string())],
        }
    }
}

impl fmt::Display for DaySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaySelector::Today => f.write_str("today"),
            DaySelector::Day(n) => write!(f, "day {}", n),
        }
    }
}
