//! 调度时间计算辅助函数

use chrono::{DateTime, Utc};

/// 计算距目标时间剩余的整秒数，向上取整
///
/// 向上取整避免不足一秒的事件被错误排除；目标时间已过时返回负值。
pub fn seconds_until(target: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let delta_ms = target.signed_duration_since(now).num_milliseconds();
    delta_ms.div_euclid(1000) + i64::from(delta_ms.rem_euclid(1000) > 0)
}

/// 距目标时间是否不足 `minutes` 整分钟
///
/// 剩余分钟数向零取整，已过期的目标同样成立。
pub fn within_minutes(target: DateTime<Utc>, now: DateTime<Utc>, minutes: i64) -> bool {
    seconds_until(target, now) / 60 < minutes
}
