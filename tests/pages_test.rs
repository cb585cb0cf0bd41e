mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

async fn post_form(app: &Router, uri: &str, form: &str) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from(form.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_home_without_default_program_shows_form() {
    let app = common::create_test_app(common::setup_test_db());

    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Open a program"));
}

#[tokio::test]
async fn test_open_program_redirects() {
    let app = common::create_test_app(common::setup_test_db());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/programs?program_id=%20abc%20")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get("location").unwrap(), "/programs/abc");

    let (status, body) = get(&app, "/programs?program_id=").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Enter a program id"));
}

#[tokio::test]
async fn test_today_page_renders_templates() {
    let pool = common::setup_test_db();
    let seeded = common::seed_program(&pool).await;
    let app = common::create_test_app(pool);

    let (status, body) = get(&app, &format!("/programs/{}", seeded.program.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Test Block"));
    assert!(body.contains("Day 1 of 3"));
    assert!(body.contains("Phase 1: Base"));
    assert!(body.contains("Lower"));
    assert!(body.contains("Back Squat"));
    assert!(body.contains("0 of 2 done"));
    assert!(body.contains(&format!(
        "/programs/{}/templates/{}/log",
        seeded.program.id, seeded.day_one[0].template_id
    )));
}

#[tokio::test]
async fn test_rest_day_and_unknown_pages() {
    let pool = common::setup_test_db();
    let seeded = common::seed_program(&pool).await;
    let app = common::create_test_app(pool);

    let (status, body) = get(&app, &format!("/programs/{}/days/3", seeded.program.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Rest day"));
    assert!(body.contains("Phase 2: Peak"));

    let (status, _) = get(&app, &format!("/programs/{}/days/9", seeded.program.id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(&app, "/programs/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(&app, "/workouts/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_skip_form_updates_day() {
    let pool = common::setup_test_db();
    let seeded = common::seed_program(&pool).await;
    let app = common::create_test_app(pool);
    let program_id = &seeded.program.id;
    let core = &seeded.day_one[1].template_id;

    let response = post_form(
        &app,
        &format!("/programs/{}/templates/{}/skip", program_id, core),
        "day=1&reason=travel",
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get("location").unwrap().to_str().unwrap(),
        format!("/programs/{}/days/1", program_id)
    );

    let (status, body) = get(&app, &format!("/programs/{}/days/1/data", program_id)).await;
    assert_eq!(status, StatusCode::OK);
    let data: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(data["dayNumber"], 1);
    assert_eq!(data["complete"], false);
    assert_eq!(data["templates"][1]["status"], "skipped");
    assert_eq!(data["templates"][1]["skipReason"], "travel");
    assert!(data["templates"][1]["completedAt"].is_string());

    let response = post_form(
        &app,
        &format!("/programs/{}/templates/{}/unskip", program_id, core),
        "day=1",
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let (_, body) = get(&app, &format!("/programs/{}/days/1/data", program_id)).await;
    let data: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(data["templates"][1]["status"], "pending");
    assert!(data["templates"][1]["completedAt"].is_null());
}

#[tokio::test]
async fn test_failed_transition_shows_notice() {
    let pool = common::setup_test_db();
    let seeded = common::seed_program(&pool).await;
    let app = common::create_test_app(pool);
    let program_id = &seeded.program.id;
    let squat = &seeded.day_one[0].template_id;

    // Blank performance text.
    let response = post_form(
        &app,
        &format!("/programs/{}/templates/{}/log", program_id, squat),
        "day=1&performance=+++",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body = String::from_utf8(body.to_vec()).unwrap();
    assert!(body.contains("save that change"));
    assert!(body.contains("0 of 2 done"));

    // Unskipping a pending template.
    let response = post_form(
        &app,
        &format!("/programs/{}/templates/{}/unskip", program_id, squat),
        "day=1",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_finishing_the_day_celebrates_once() {
    let pool = common::setup_test_db();
    let seeded = common::seed_program(&pool).await;
    let app = common::create_test_app(pool);
    let program_id = &seeded.program.id;

    let response = post_form(
        &app,
        &format!(
            "/programs/{}/templates/{}/log",
            program_id, seeded.day_one[0].template_id
        ),
        "day=1&performance=Did+5x5+squat+at+225",
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = post_form(
        &app,
        &format!(
            "/programs/{}/templates/{}/skip",
            program_id, seeded.day_one[1].template_id
        ),
        "day=1",
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let day_url = format!("/programs/{}/days/1", program_id);
    let (status, body) = get(&app, &day_url).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Day complete!"));
    assert!(body.contains("2 of 2 done"));

    let (_, body) = get(&app, &day_url).await;
    assert!(!body.contains("Day complete!"));
    assert!(body.contains("All workouts for this day are done."));
}

#[tokio::test]
async fn test_health_reports_service_mode() {
    let app = common::create_test_app(common::setup_test_db());

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    let data: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(data["status"], "ok");
    assert_eq!(data["program_service"], "local");
    assert!(data["git_version"].is_string());
}

#[tokio::test]
async fn test_api_templates_requires_selector() {
    let pool = common::setup_test_db();
    let seeded = common::seed_program(&pool).await;
    let app = common::create_test_app(pool);

    let (status, _) = get(&app, &format!("/api/programs/{}/templates", seeded.program.id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get(
        &app,
        &format!("/api/programs/{}/templates?day=2", seeded.program.id),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let data: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(data["templates"][0]["name"], "Upper");
}
