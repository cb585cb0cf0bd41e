//! Workout template lifecycle for one program day.
//!
//! ```text
//!         log              skip
//! pending ----> completed
//! pending -----------------> skipped
//! skipped ----- unskip ----> pending
//! ```
//!
//! `completed` is terminal. Local state changes only after the gateway
//! acknowledges a transition.

pub mod controller;
pub mod registry;
pub mod store;

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::gateway::GatewayError;
use crate::models::{TemplateState, TemplateStatus};

pub use controller::TemplateLifecycleController;
pub use registry::ControllerRegistry;
pub use store::{day_complete, DaySnapshot, DayStores, TemplateStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Log,
    Skip,
    Unskip,
}

impl Transition {
    /// Status a template must have before this transition may start.
    pub fn required_status(&self) -> TemplateStatus {
        match self {
            Transition::Log | Transition::Skip => TemplateStatus::Pending,
            Transition::Unskip => TemplateStatus::Skipped,
        }
    }

    /// State a template takes once the gateway acknowledges this transition.
    pub fn target_state(&self, now: DateTime<Utc>, reason: Option<String>) -> TemplateState {
        match self {
            Transition::Log => TemplateState::Completed {
                completed_at: now,
                linked_workout_id: None,
            },
            Transition::Skip => TemplateState::Skipped {
                completed_at: now,
                reason,
            },
            Transition::Unskip => TemplateState::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Log => "log",
            Transition::Skip => "skip",
            Transition::Unskip => "unskip",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Performance description must not be empty")]
    EmptyPerformance,

    #[error("Template {0} is not part of the loaded day")]
    NotFound(String),

    #[error("Template {0} already has a change in flight")]
    InFlight(String),

    #[error("Cannot {transition} template {template_id} while it is {status}")]
    InvalidTransition {
        template_id: String,
        transition: Transition,
        status: TemplateStatus,
    },

    #[error("No program day is loaded")]
    NoDayLoaded,

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Where the workout record for a logged template stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    Awaiting { attempts: u32 },
    Linked(String),
    /// Polling gave up; the template stays completed without a record.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkPollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for LinkPollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 15,
        }
    }
}

/// Result of a day completion check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DayCompletion {
    pub complete: bool,
    /// True only on the first check after a transition finished the day.
    pub celebrate: bool,
}
