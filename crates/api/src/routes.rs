use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use event_scheduler_dispatcher::IntakeService;
use event_scheduler_domain::repositories::EventRepository;

use crate::handlers::{
    events::{get_event, submit_events},
    health::health_check,
};

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub intake: Arc<IntakeService>,
    pub event_repo: Arc<dyn EventRepository>,
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        // 健康检查
        .route("/health", get(health_check))
        // 事件提交与查询API
        .route("/api/events", post(submit_events))
        .route("/api/events/{id}", get(get_event))
        .with_state(state)
}
