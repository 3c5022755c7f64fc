use axum::{response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message),
            timestamp: chrono::Utc::now(),
        }
    }
}

impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize,
{
    fn into_response(self) -> axum::response::Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_success() {
        let response = ApiResponse::success("test_data");

        assert!(response.success);
        assert_eq!(response.data, Some("test_data"));
        assert!(response.message.is_none());
    }

    #[test]
    fn test_api_response_serialization() {
        let response = ApiResponse::success("test_data");
        let json = serde_json::to_string(&response).unwrap();

        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"data\":\"test_data\""));
        assert!(json.contains("\"timestamp\""));
    }

    #[test]
    fn test_api_response_with_message() {
        let response =
            ApiResponse::success_with_message("data", "Operation successful".to_string());

        assert!(response.success);
        assert_eq!(response.message, Some("Operation successful".to_string()));
    }
}
