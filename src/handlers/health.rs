use axum::{extract::State, Json};
use serde::Serialize;

use super::programs::ProgramsState;
use crate::version::GIT_VERSION;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    git_version: &'static str,
    program_service: &'static str,
}

pub async fn health_check(State(state): State<ProgramsState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        git_version: GIT_VERSION,
        program_service: state.service_mode,
    })
}
