//! Builder helpers for constructing test entities

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use event_scheduler_domain::entities::{EventRecord, EventStatus, SubmittedEvent};

/// Builder for SubmittedEvent test fixtures
///
/// Defaults to a fully valid event scheduled one hour out.
#[derive(Debug, Clone)]
pub struct SubmittedEventBuilder {
    event: SubmittedEvent,
}

impl SubmittedEventBuilder {
    pub fn new() -> Self {
        Self {
            event: SubmittedEvent {
                date: Some((Utc::now() + Duration::hours(1)).to_rfc3339()),
                payload: Some(Value::String("test-payload".to_string())),
                target: Some("test-target".to_string()),
                user: None,
                failure_topic: None,
            },
        }
    }

    pub fn with_date(mut self, date: &str) -> Self {
        self.event.date = Some(date.to_string());
        self
    }

    /// Schedule the event `seconds` from now (negative for the past)
    pub fn due_in_seconds(mut self, seconds: i64) -> Self {
        self.event.date = Some((Utc::now() + Duration::seconds(seconds)).to_rfc3339());
        self
    }

    pub fn without_date(mut self) -> Self {
        self.event.date = None;
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.event.payload = Some(payload);
        self
    }

    pub fn without_payload(mut self) -> Self {
        self.event.payload = None;
        self
    }

    pub fn with_target(mut self, target: &str) -> Self {
        self.event.target = Some(target.to_string());
        self
    }

    pub fn without_target(mut self) -> Self {
        self.event.target = None;
        self
    }

    pub fn with_user(mut self, user: &str) -> Self {
        self.event.user = Some(user.to_string());
        self
    }

    pub fn with_failure_topic(mut self, topic: &str) -> Self {
        self.event.failure_topic = Some(topic.to_string());
        self
    }

    pub fn build(self) -> SubmittedEvent {
        self.event
    }
}

impl Default for SubmittedEventBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for EventRecord test fixtures
#[derive(Debug, Clone)]
pub struct EventRecordBuilder {
    date: DateTime<Utc>,
    payload: String,
    target: String,
    status: EventStatus,
    user: Option<String>,
    failure_topic: Option<String>,
}

impl EventRecordBuilder {
    pub fn new() -> Self {
        Self {
            date: Utc::now() + Duration::hours(1),
            payload: "test-payload".to_string(),
            target: "test-target".to_string(),
            status: EventStatus::New,
            user: None,
            failure_topic: None,
        }
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    /// Schedule the record `seconds` from now (negative for the past)
    pub fn due_in_seconds(mut self, seconds: i64) -> Self {
        self.date = Utc::now() + Duration::seconds(seconds);
        self
    }

    pub fn with_payload(mut self, payload: &str) -> Self {
        self.payload = payload.to_string();
        self
    }

    pub fn with_target(mut self, target: &str) -> Self {
        self.target = target.to_string();
        self
    }

    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }

    pub fn scheduled(self) -> Self {
        self.with_status(EventStatus::Scheduled)
    }

    pub fn with_user(mut self, user: &str) -> Self {
        self.user = Some(user.to_string());
        self
    }

    pub fn build(self) -> EventRecord {
        let mut record = EventRecord::new(
            self.date,
            self.payload,
            self.target,
            self.user,
            self.failure_topic,
        );
        record.status = self.status;
        record
    }
}

impl Default for EventRecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}
