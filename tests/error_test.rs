use axum::{http::StatusCode, response::IntoResponse};
use programlog::error::AppError;
use programlog::gateway::GatewayError;
use programlog::lifecycle::{LifecycleError, Transition};
use programlog::models::TemplateStatus;

fn status_of(error: AppError) -> StatusCode {
    error.into_response().status()
}

#[test]
fn test_not_found_returns_404() {
    let error = AppError::NotFound("Resource not found".to_string());
    assert_eq!(status_of(error), StatusCode::NOT_FOUND);
}

#[test]
fn test_bad_request_returns_400() {
    let error = AppError::BadRequest("Invalid input".to_string());
    assert_eq!(status_of(error), StatusCode::BAD_REQUEST);
}

#[test]
fn test_validation_returns_422() {
    let error = AppError::Validation("Invalid field".to_string());
    assert_eq!(status_of(error), StatusCode::UNPROCESSABLE_ENTITY);
}

#[test]
fn test_internal_returns_500() {
    let error = AppError::Internal("Something went wrong".to_string());
    assert_eq!(status_of(error), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_gateway_errors_map_by_kind() {
    assert_eq!(
        status_of(GatewayError::NotFound("p1".to_string()).into()),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        status_of(GatewayError::Validation("bad".to_string()).into()),
        StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(
        status_of(GatewayError::Storage("disk full".to_string()).into()),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        status_of(GatewayError::Network("refused".to_string()).into()),
        StatusCode::BAD_GATEWAY
    );
    assert_eq!(
        status_of(
            GatewayError::Api {
                status: 503,
                message: "down".to_string(),
            }
            .into()
        ),
        StatusCode::BAD_GATEWAY
    );
}

#[test]
fn test_lifecycle_errors_map_by_kind() {
    assert_eq!(
        status_of(LifecycleError::EmptyPerformance.into()),
        StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(
        status_of(LifecycleError::NotFound("t1".to_string()).into()),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        status_of(LifecycleError::InFlight("t1".to_string()).into()),
        StatusCode::CONFLICT
    );
    assert_eq!(
        status_of(
            LifecycleError::InvalidTransition {
                template_id: "t1".to_string(),
                transition: Transition::Unskip,
                status: TemplateStatus::Pending,
            }
            .into()
        ),
        StatusCode::CONFLICT
    );
    assert_eq!(
        status_of(LifecycleError::Gateway(GatewayError::NotFound("p1".to_string())).into()),
        StatusCode::NOT_FOUND
    );
}

#[test]
fn test_app_error_converts_back_to_gateway_error() {
    let err: GatewayError = AppError::NotFound("w1".to_string()).into();
    assert!(matches!(err, GatewayError::NotFound(_)));

    let err: GatewayError = AppError::Internal("boom".to_string()).into();
    assert!(matches!(err, GatewayError::Storage(_)));
}
