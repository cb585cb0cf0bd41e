mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, routing::get, Router};
use tokio::net::TcpListener;

use programlog::gateway::{
    GatewayError, HttpGateway, HttpGatewayConfig, LogPerformance, ProgramGateway,
};
use programlog::lifecycle::{LinkPollPolicy, LinkState, TemplateLifecycleController};
use programlog::models::{DaySelector, TemplateStatus, TransitionOptions};

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn http_gateway(base_url: String) -> HttpGateway {
    HttpGateway::new(HttpGatewayConfig {
        base_url,
        token: Some("test-token".to_string()),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

#[tokio::test]
async fn test_reads_program_and_day_over_http() {
    let pool = common::setup_test_db();
    let seeded = common::seed_program(&pool).await;
    let gateway = http_gateway(serve(common::create_test_app(pool)).await);

    let program = gateway.load_program(&seeded.program.id).await.unwrap();
    assert_eq!(program.id, seeded.program.id);
    assert_eq!(program.start_date, seeded.program.start_date);
    assert_eq!(program.phases, seeded.program.phases);

    let today = gateway
        .load_workout_templates(&seeded.program.id, DaySelector::Today)
        .await
        .unwrap();
    assert_eq!(today.day_number, 1);
    assert_eq!(today.phase_name.as_deref(), Some("Base"));
    let ids: Vec<_> = today.templates.iter().map(|t| &t.template_id).collect();
    let expected: Vec<_> = seeded.day_one.iter().map(|t| &t.template_id).collect();
    assert_eq!(ids, expected);
    assert_eq!(today.templates[0].prescribed_exercises[0].name, "Back Squat");

    let day_two = gateway
        .load_workout_templates(&seeded.program.id, DaySelector::Day(2))
        .await
        .unwrap();
    assert_eq!(day_two.templates.len(), 1);
    assert_eq!(day_two.templates[0].name, "Upper");
}

#[tokio::test]
async fn test_maps_error_statuses() {
    let pool = common::setup_test_db();
    let seeded = common::seed_program(&pool).await;
    let gateway = http_gateway(serve(common::create_test_app(pool)).await);
    let options = TransitionOptions::default();

    let err = gateway.load_program("missing").await.unwrap_err();
    assert!(matches!(err, GatewayError::NotFound(_)));

    let err = gateway
        .load_workout_templates(&seeded.program.id, DaySelector::Day(9))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::NotFound(_)));

    let err = gateway
        .unskip_workout_template(&seeded.program.id, &seeded.day_one[0].template_id, &options)
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Validation(_)));

    let err = gateway.load_workout("missing").await.unwrap_err();
    assert!(matches!(err, GatewayError::NotFound(_)));
}

#[tokio::test]
async fn test_server_error_becomes_api_error() {
    let app = Router::new().route(
        "/api/programs/{program_id}",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
    );
    let gateway = http_gateway(serve(app).await);

    match gateway.load_program("p1").await {
        Err(GatewayError::Api { status, message }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "maintenance");
        }
        other => panic!("expected an API error, got {:?}", other.map(|p| p.id)),
    }
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let app = Router::new().route(
        "/api/programs/{program_id}",
        get(|| async { "not json" }),
    );
    let gateway = http_gateway(serve(app).await);

    let err = gateway.load_program("p1").await.unwrap_err();
    assert!(matches!(err, GatewayError::Decode { what: "program", .. }));
}

#[tokio::test]
async fn test_unreachable_service_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let gateway = http_gateway(format!("http://{}", addr));
    let err = gateway.load_program("p1").await.unwrap_err();
    assert!(matches!(err, GatewayError::Network(_)));
}

#[tokio::test]
async fn test_transitions_over_http() {
    let pool = common::setup_test_db();
    let seeded = common::seed_program(&pool).await;
    let gateway = http_gateway(serve(common::create_test_app(pool)).await);
    let program_id = &seeded.program.id;
    let core = &seeded.day_one[1].template_id;

    gateway
        .skip_workout_template(
            program_id,
            core,
            &TransitionOptions::with_reason(Some("no time")),
        )
        .await
        .unwrap();
    let day = gateway
        .load_workout_templates(program_id, DaySelector::Day(1))
        .await
        .unwrap();
    assert_eq!(day.templates[1].status(), TemplateStatus::Skipped);
    assert_eq!(day.templates[1].skip_reason(), Some("no time"));

    gateway
        .unskip_workout_template(program_id, core, &TransitionOptions::default())
        .await
        .unwrap();
    gateway
        .log_workout_from_template(
            program_id,
            core,
            &LogPerformance {
                user_performance: "3x12 crunches".to_string(),
            },
            &TransitionOptions::default(),
        )
        .await
        .unwrap();
    let day = gateway
        .load_workout_templates(program_id, DaySelector::Day(1))
        .await
        .unwrap();
    assert_eq!(day.templates[1].status(), TemplateStatus::Completed);
}

#[tokio::test]
async fn test_controller_over_http_links_workout() {
    let pool = common::setup_test_db();
    let seeded = common::seed_program(&pool).await;
    let base_url = serve(common::create_test_app(pool)).await;
    let gateway = Arc::new(http_gateway(base_url));
    let policy = LinkPollPolicy {
        interval: Duration::from_millis(20),
        max_attempts: 50,
    };

    let controller = TemplateLifecycleController::new(
        gateway.clone(),
        seeded.program.id.clone(),
        policy,
    );
    controller.load_day(DaySelector::Today).await.unwrap();

    let squat = &seeded.day_one[0].template_id;
    controller
        .log_workout(squat, "Did 5x5 squat at 225")
        .await
        .unwrap();

    let mut state = controller.link_state(squat);
    for _ in 0..50 {
        if !matches!(state, Some(LinkState::Awaiting { .. })) {
            break;
        }
        tokio::time::sleep(policy.interval).await;
        controller.refresh_links().await.unwrap();
        state = controller.link_state(squat);
    }

    let workout_id = match state {
        Some(LinkState::Linked(id)) => id,
        other => panic!("workout was never linked: {:?}", other),
    };
    let workout = gateway.load_workout(&workout_id).await.unwrap();
    assert_eq!(workout.template_id, *squat);
    assert_eq!(workout.exercises[0].name, "squat");
    assert_eq!(workout.total_sets(), 5);
}
