//! JSON program service API, served from the local database.
//!
//! These routes speak the same protocol `HttpGateway` consumes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::gateway::{LocalGateway, LogPerformance, ProgramGateway};
use crate::models::{DaySelector, Program, ProgramDay, TransitionOptions, Workout};

#[derive(Clone)]
pub struct ApiState {
    pub gateway: LocalGateway,
}

#[derive(Deserialize)]
pub struct TemplatesQuery {
    today: Option<bool>,
    day: Option<i64>,
}

#[derive(Deserialize)]
pub struct LogRequest {
    #[serde(flatten)]
    performance: LogPerformance,
    #[serde(flatten)]
    options: TransitionOptions,
}

pub async fn get_program(
    State(state): State<ApiState>,
    Path(program_id): Path<String>,
) -> Result<Json<Program>> {
    Ok(Json(state.gateway.load_program(&program_id).await?))
}

pub async fn get_templates(
    State(state): State<ApiState>,
    Path(program_id): Path<String>,
    Query(query): Query<TemplatesQuery>,
) -> Result<Json<ProgramDay>> {
    let selector = match (query.today, query.day) {
        (_, Some(day)) => DaySelector::Day(day),
        (Some(true), None) => DaySelector::Today,
        _ => {
            return Err(AppError::BadRequest(
                "Either today=true or day=<n> is required".to_string(),
            ))
        }
    };
    Ok(Json(
        state
            .gateway
            .load_workout_templates(&program_id, selector)
            .await?,
    ))
}

pub async fn log_template(
    State(state): State<ApiState>,
    Path((program_id, template_id)): Path<(String, String)>,
    Json(request): Json<LogRequest>,
) -> Result<StatusCode> {
    state
        .gateway
        .log_workout_from_template(
            &program_id,
            &template_id,
            &request.performance,
            &request.options,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn skip_template(
    State(state): State<ApiState>,
    Path((program_id, template_id)): Path<(String, String)>,
    Json(options): Json<TransitionOptions>,
) -> Result<StatusCode> {
    state
        .gateway
        .skip_workout_template(&program_id, &template_id, &options)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unskip_template(
    State(state): State<ApiState>,
    Path((program_id, template_id)): Path<(String, String)>,
    Json(options): Json<TransitionOptions>,
) -> Result<StatusCode> {
    state
        .gateway
        .unskip_workout_template(&program_id, &template_id, &options)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_workout(
    State(state): State<ApiState>,
    Path(workout_id): Path<String>,
) -> Result<Json<Workout>> {
    Ok(Json(state.gateway.load_workout(&workout_id).await?))
}
