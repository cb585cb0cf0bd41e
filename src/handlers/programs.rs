use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::lifecycle::{
    ControllerRegistry, DayCompletion, DaySnapshot, LifecycleError, TemplateLifecycleController,
};
use crate::models::DaySelector;
use crate::views::DayView;

/// Shown for every failed transition; details only go to the log.
const TRANSITION_FAILED: &str = "We couldn't save that change. Please try again.";

#[derive(Clone)]
pub struct ProgramsState {
    pub registry: ControllerRegistry,
    pub default_program_id: Option<String>,
    pub service_mode: &'static str,
}

// Templates
#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "programs/day.html")]
struct DayTemplate {
    view: DayView,
    notice: Option<String>,
}

// Forms and query params
#[derive(Deserialize)]
pub struct OpenProgramQuery {
    program_id: Option<String>,
}

#[derive(Deserialize)]
pub struct LogForm {
    pub day: i64,
    pub performance: String,
}

#[derive(Deserialize)]
pub struct SkipForm {
    pub day: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct DayForm {
    pub day: i64,
}

fn day_url(program_id: &str, day: i64) -> String {
    format!("/programs/{}/days/{}", program_id, day)
}

fn render<T: Template>(template: T) -> Result<Response> {
    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    )
    .into_response())
}

/// Fresh read of `day`, keeping the controller's tracking for it.
async fn ensure_day(controller: &TemplateLifecycleController, day: i64) -> Result<DaySnapshot> {
    Ok(controller.load_day(DaySelector::Day(day)).await?)
}

async fn render_day(
    controller: &TemplateLifecycleController,
    snapshot: DaySnapshot,
    completion: DayCompletion,
    notice: Option<String>,
) -> Result<Response> {
    let program = controller.load_program().await?;
    let template = DayTemplate {
        view: DayView::new(&program, &snapshot, completion),
        notice,
    };
    render(template)
}

// Handlers
pub async fn home(State(state): State<ProgramsState>) -> Result<Response> {
    if let Some(program_id) = &state.default_program_id {
        return Ok(Redirect::to(&format!("/programs/{}", program_id)).into_response());
    }
    render(HomeTemplate { error: None })
}

pub async fn open_program(Query(query): Query<OpenProgramQuery>) -> Result<Response> {
    match query.program_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => Ok(Redirect::to(&format!("/programs/{}", id)).into_response()),
        _ => render(HomeTemplate {
            error: Some("Enter a program id".to_string()),
        }),
    }
}

pub async fn today(
    State(state): State<ProgramsState>,
    Path(program_id): Path<String>,
) -> Result<Response> {
    let controller = state.registry.controller(&program_id);
    let snapshot = controller.load_day(DaySelector::Today).await?;
    let completion = controller.day_completion_check(snapshot.day_number);
    render_day(&controller, snapshot, completion, None).await
}

pub async fn show_day(
    State(state): State<ProgramsState>,
    Path((program_id, day)): Path<(String, i64)>,
) -> Result<Response> {
    let controller = state.registry.controller(&program_id);
    let snapshot = ensure_day(&controller, day).await?;
    let completion = controller.day_completion_check(day);
    render_day(&controller, snapshot, completion, None).await
}

/// Structured day data, so clients never need to scrape the rendered page.
pub async fn day_data(
    State(state): State<ProgramsState>,
    Path((program_id, day)): Path<(String, i64)>,
) -> Result<Json<DaySnapshot>> {
    let controller = state.registry.controller(&program_id);
    Ok(Json(ensure_day(&controller, day).await?))
}

async fn finish_transition(
    controller: Arc<TemplateLifecycleController>,
    day: i64,
    result: std::result::Result<(), LifecycleError>,
) -> Result<Response> {
    let notice = match result {
        Ok(()) => return Ok(Redirect::to(&day_url(controller.program_id(), day)).into_response()),
        // A second click while the first is processing is ignored.
        Err(LifecycleError::InFlight(template_id)) => {
            tracing::debug!("Ignoring repeated transition for template {}", template_id);
            return Ok(Redirect::to(&day_url(controller.program_id(), day)).into_response());
        }
        Err(e) => {
            tracing::warn!("Transition failed for program {}: {}", controller.program_id(), e);
            Some(TRANSITION_FAILED.to_string())
        }
    };

    let snapshot = controller.snapshot(day).ok_or(LifecycleError::NoDayLoaded)?;
    let completion = controller.day_completion_check(day);
    render_day(&controller, snapshot, completion, notice).await
}

pub async fn log_workout(
    State(state): State<ProgramsState>,
    Path((program_id, template_id)): Path<(String, String)>,
    Form(form): Form<LogForm>,
) -> Result<Response> {
    let controller = state.registry.controller(&program_id);
    ensure_day(&controller, form.day).await?;

    let result = controller
        .log_workout(&template_id, &form.performance)
        .await
        .map(|_| controller.spawn_link_watch());
    finish_transition(controller, form.day, result).await
}

pub async fn skip_workout(
    State(state): State<ProgramsState>,
    Path((program_id, template_id)): Path<(String, String)>,
    Form(form): Form<SkipForm>,
) -> Result<Response> {
    let controller = state.registry.controller(&program_id);
    ensure_day(&controller, form.day).await?;

    let result = controller
        .skip_workout(&template_id, form.reason.as_deref())
        .await
        .map(|_| ());
    finish_transition(controller, form.day, result).await
}

pub async fn unskip_workout(
    State(state): State<ProgramsState>,
    Path((program_id, template_id)): Path<(String, String)>,
    Form(form): Form<DayForm>,
) -> Result<Response> {
    let controller = state.registry.controller(&program_id);
    ensure_day(&controller, form.day).await?;

    let result = controller.unskip_workout(&template_id).await.map(|_| ());
    finish_transition(controller, form.day, result).await
}
