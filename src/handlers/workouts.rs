use askama::Template;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
};

use super::programs::ProgramsState;
use crate::error::{AppError, Result};
use crate::views::WorkoutView;

#[derive(Template)]
#[template(path = "workouts/show.html")]
struct ShowWorkoutTemplate {
    workout: WorkoutView,
}

pub async fn show(
    State(state): State<ProgramsState>,
    Path(workout_id): Path<String>,
) -> Result<Response> {
    let workout = state.registry.gateway().load_workout(&workout_id).await?;

    let template = ShowWorkoutTemplate {
        workout: WorkoutView::from(&workout),
    };

    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    )
    .into_response())
}
