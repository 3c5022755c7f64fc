use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use event_scheduler_core::{SchedulerError, SchedulerResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 调用方提交的原始事件，字段均可能缺失，由Intake校验
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmittedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// 接受任意JSON值以便校验"必须是字符串"的类型规则
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_topic: Option<String>,
}

/// 持久化的事件记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: Uuid,
    /// 调度时间键
    pub date: DateTime<Utc>,
    pub payload: String,
    pub target: String,
    pub status: EventStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_topic: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EventStatus {
    #[serde(rename = "NEW")]
    New,
    #[serde(rename = "SCHEDULED")]
    Scheduled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::New => "NEW",
            EventStatus::Scheduled => "SCHEDULED",
        }
    }
}

impl sqlx::Type<sqlx::Postgres> for EventStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        sqlx::postgres::PgTypeInfo::with_name("VARCHAR")
    }
}

impl sqlx::Type<sqlx::Sqlite> for EventStatus {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <str as sqlx::Type<sqlx::Sqlite>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for EventStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        match s {
            "NEW" => Ok(EventStatus::New),
            "SCHEDULED" => Ok(EventStatus::Scheduled),
            _ => Err(format!("Invalid event status: {s}").into()),
        }
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for EventStatus {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        match s {
            "NEW" => Ok(EventStatus::New),
            "SCHEDULED" => Ok(EventStatus::Scheduled),
            _ => Err(format!("Invalid event status: {s}").into()),
        }
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for EventStatus {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str(), buf)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for EventStatus {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Sqlite>>::encode(self.as_str(), buf)
    }
}

impl EventRecord {
    pub fn new(
        date: DateTime<Utc>,
        payload: String,
        target: String,
        user: Option<String>,
        failure_topic: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            payload,
            target,
            status: EventStatus::New,
            user,
            failure_topic,
            created_at: Utc::now(),
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self.status, EventStatus::New)
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.date < now
    }

    pub fn entity_description(&self) -> String {
        format!(
            "事件 {} (目标: {}, 调度时间: {})",
            self.id,
            self.target,
            self.date.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

/// 解析提交事件中的ISO-8601时间戳
///
/// 接受带时区的RFC 3339格式；不带时区的时间戳按UTC处理。
pub fn parse_event_date(value: &str) -> SchedulerResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(SchedulerError::InvalidTimestamp {
        value: value.to_string(),
        message: "无法解析为ISO-8601时间戳".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_event_status_serde_uses_wire_names() {
        assert_eq!(serde_json::to_string(&EventStatus::New).unwrap(), "\"NEW\"");
        assert_eq!(
            serde_json::to_string(&EventStatus::Scheduled).unwrap(),
            "\"SCHEDULED\""
        );
        let status: EventStatus = serde_json::from_str("\"NEW\"").unwrap();
        assert_eq!(status, EventStatus::New);
    }

    #[test]
    fn test_event_record_new_defaults() {
        let date = Utc::now();
        let record = EventRecord::new(date, "p".to_string(), "t".to_string(), None, None);
        assert_eq!(record.status, EventStatus::New);
        assert!(record.is_new());
        assert_eq!(record.date, date);
        assert!(record.user.is_none());
    }

    #[test]
    fn test_record_serialization_omits_absent_optionals() {
        let record = EventRecord::new(Utc::now(), "p".into(), "t".into(), None, None);
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("user").is_none());
        assert!(json.get("failure_topic").is_none());
        assert_eq!(json["status"], "NEW");
    }

    #[test]
    fn test_parse_event_date_rfc3339() {
        let parsed = parse_event_date("2026-08-06T12:30:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 8, 6, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_event_date_naive_is_utc() {
        let parsed = parse_event_date("2026-08-06T12:30:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 8, 6, 12, 30, 0).unwrap());

        let parsed = parse_event_date("2026-08-06T12:30:00.250").unwrap();
        assert_eq!(parsed.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_parse_event_date_date_only() {
        let parsed = parse_event_date("2026-08-06").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 8, 6, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_event_date_invalid() {
        assert!(parse_event_date("soon").is_err());
        assert!(parse_event_date("").is_err());
    }

    #[test]
    fn test_submitted_event_deserializes_partial_input() {
        let event: SubmittedEvent =
            serde_json::from_str(r#"{"payload": {"nested": true}}"#).unwrap();
        assert!(event.date.is_none());
        assert!(event.target.is_none());
        assert!(!event.payload.unwrap().is_string());
    }
}
