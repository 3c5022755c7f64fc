use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use event_scheduler_core::SchedulerError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("调度器错误: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("未找到资源")]
    NotFound,

    #[error("请求参数错误: {0}")]
    BadRequest(String),

    #[error("内部服务器错误: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, error_type) = match &self {
            ApiError::Scheduler(SchedulerError::EventNotFound { id }) => (
                StatusCode::NOT_FOUND,
                format!("事件 {} 不存在", id),
                "EVENT_NOT_FOUND".to_string(),
            ),
            ApiError::Scheduler(SchedulerError::InvalidTimestamp { value, .. }) => (
                StatusCode::BAD_REQUEST,
                format!("无效的时间戳: {}", value),
                "INVALID_TIMESTAMP".to_string(),
            ),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                "请求的资源不存在".to_string(),
                "NOT_FOUND".to_string(),
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                format!("请求参数错误: {}", msg),
                "BAD_REQUEST".to_string(),
            ),
            ApiError::Scheduler(_) | ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "系统内部错误".to_string(),
                "INTERNAL_ERROR".to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "type": error_type,
                "code": status.as_u16(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_error_conversion() {
        let id = uuid::Uuid::new_v4();
        let api_error: ApiError = SchedulerError::EventNotFound { id }.into();

        match api_error {
            ApiError::Scheduler(SchedulerError::EventNotFound { id: found }) => {
                assert_eq!(found, id);
            }
            _ => panic!("Expected SchedulerError::EventNotFound"),
        }
    }

    #[test]
    fn test_event_not_found_maps_to_404() {
        let error = ApiError::Scheduler(SchedulerError::EventNotFound {
            id: uuid::Uuid::new_v4(),
        });
        assert_eq!(error.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        assert_eq!(
            ApiError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_bad_request_maps_to_400() {
        let error = ApiError::BadRequest("bad".to_string());
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_database_error_maps_to_500() {
        let error = ApiError::Scheduler(SchedulerError::DatabaseOperation("boom".to_string()));
        assert_eq!(
            error.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
