use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{api, health, programs, workouts};

pub fn create_router(programs_state: programs::ProgramsState, api_state: api::ApiState) -> Router {
    Router::new()
        // Pages
        .route("/", get(programs::home))
        .route("/programs", get(programs::open_program))
        .route("/programs/{program_id}", get(programs::today))
        .route("/programs/{program_id}/days/{day}", get(programs::show_day))
        .route(
            "/programs/{program_id}/days/{day}/data",
            get(programs::day_data),
        )
        .route(
            "/programs/{program_id}/templates/{template_id}/log",
            post(programs::log_workout),
        )
        .route(
            "/programs/{program_id}/templates/{template_id}/skip",
            post(programs::skip_workout),
        )
        .route(
            "/programs/{program_id}/templates/{template_id}/unskip",
            post(programs::unskip_workout),
        )
        .route("/workouts/{workout_id}", get(workouts::show))
        .route("/health", get(health::health_check))
        .with_state(programs_state)
        // Program service API
        .route("/api/programs/{program_id}", get(api::get_program))
        .route(
            "/api/programs/{program_id}/templates",
            get(api::get_templates),
        )
        .route(
            "/api/programs/{program_id}/templates/{template_id}/log",
            post(api::log_template),
        )
        .route(
            "/api/programs/{program_id}/templates/{template_id}/skip",
            post(api::skip_template),
        )
        .route(
            "/api/programs/{program_id}/templates/{template_id}/unskip",
            post(api::unskip_template),
        )
        .route("/api/workouts/{workout_id}", get(api::get_workout))
        .with_state(api_state)
}
