//! Program service gateway.
//!
//! Every program, template and workout read or write goes through
//! [`ProgramGateway`]. [`HttpGateway`] talks to a remote program service and
//! [`LocalGateway`] serves the same operations from SQLite.

pub mod http;
pub mod local;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AppError;
use crate::models::{DaySelector, Program, ProgramDay, TransitionOptions, Workout};

pub use http::{HttpGateway, HttpGatewayConfig};
pub use local::LocalGateway;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rejected by program service: {0}")]
    Validation(String),

    #[error("Program service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Could not decode {what}: {message}")]
    Decode { what: &'static str, message: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<AppError> for GatewayError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::NotFound(msg) => GatewayError::NotFound(msg),
            AppError::BadRequest(msg) | AppError::Validation(msg) => GatewayError::Validation(msg),
            AppError::Gateway(inner) => inner,
            other => GatewayError::Storage(other.to_string()),
        }
    }
}

/// Body of a log request: the athlete's free-text description of the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogPerformance {
    pub user_performance: String,
}

#[async_trait]
pub trait ProgramGateway: Send + Sync {
    async fn load_program(&self, program_id: &str) -> Result<Program, GatewayError>;

    async fn load_workout_templates(
        &self,
        program_id: &str,
        selector: DaySelector,
    ) -> Result<ProgramDay, GatewayError>;

    /// Hands the performance text to the service. Extraction into a workout
    /// record happens afterwards on the service side.
    async fn log_workout_from_template(
        &self,
        program_id: &str,
        template_id: &str,
        performance: &LogPerformance,
        options: &TransitionOptions,
    ) -> Result<(), GatewayError>;

    async fn skip_workout_template(
        &self,
        program_id: &str,
        template_id: &str,
        options: &TransitionOptions,
    ) -> Result<(), GatewayError>;

    async fn unskip_workout_template(
        &self,
        program_id: &str,
        template_id: &str,
        options: &TransitionOptions,
    ) -> Result<(), GatewayError>;

    async fn load_workout(&self, workout_id: &str) -> Result<Workout, GatewayError>;
}
