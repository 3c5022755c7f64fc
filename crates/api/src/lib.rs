pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;

pub use error::{ApiError, ApiResult};
pub use response::ApiResponse;
pub use routes::{create_routes, AppState};

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// 创建API应用，附加通用中间件
pub fn create_app(state: AppState) -> Router {
    create_routes(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
