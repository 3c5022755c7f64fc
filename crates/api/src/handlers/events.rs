use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use event_scheduler_domain::entities::SubmittedEvent;

use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use crate::routes::AppState;

/// 提交一批事件
///
/// 始终返回202和处理计数：逐条校验失败只通过失败通道和日志暴露，
/// 不作为HTTP错误返回。
pub async fn submit_events(
    State(state): State<AppState>,
    Json(events): Json<Vec<SubmittedEvent>>,
) -> ApiResult<impl IntoResponse> {
    let summary = state.intake.process_batch(events).await?;
    Ok((StatusCode::ACCEPTED, ApiResponse::success(summary)))
}

/// 按id查询事件记录
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let record = state
        .event_repo
        .get_by_id(id)
        .await?
        .ok_or(ApiError::Scheduler(
            event_scheduler_core::SchedulerError::EventNotFound { id },
        ))?;

    Ok(ApiResponse::success(record))
}
