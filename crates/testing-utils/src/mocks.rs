//! Mock implementations for repository and messaging traits
//!
//! These are in-memory implementations that can be used for unit testing
//! without requiring actual database connections or external services.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use event_scheduler_core::{SchedulerError, SchedulerResult};
use event_scheduler_domain::entities::{EventRecord, EventStatus};
use event_scheduler_domain::messaging::{FailureNotifier, InvocationClient};
use event_scheduler_domain::repositories::{EventCursor, EventPage, EventRepository};

/// Shared, ordered log of operations across mocks, used to assert
/// persist-before-dispatch ordering.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, op: &str) {
        self.entries.lock().unwrap().push(op.to_string());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }
}

/// Mock implementation of EventRepository with real keyset pagination
#[derive(Debug, Clone, Default)]
pub struct MockEventRepository {
    events: Arc<Mutex<Vec<EventRecord>>>,
    failing_inserts: Arc<Mutex<u32>>,
    insert_calls: Arc<Mutex<usize>>,
    find_calls: Arc<Mutex<usize>>,
    call_log: Option<CallLog>,
}

impl MockEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<EventRecord>) -> Self {
        Self {
            events: Arc::new(Mutex::new(events)),
            ..Self::default()
        }
    }

    pub fn with_call_log(mut self, log: CallLog) -> Self {
        self.call_log = Some(log);
        self
    }

    /// Make the next `count` insert_batch calls fail with a database error
    pub fn fail_next_inserts(&self, count: u32) {
        *self.failing_inserts.lock().unwrap() = count;
    }

    pub fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn get_all_events(&self) -> Vec<EventRecord> {
        self.events.lock().unwrap().clone()
    }

    pub fn insert_call_count(&self) -> usize {
        *self.insert_calls.lock().unwrap()
    }

    pub fn find_call_count(&self) -> usize {
        *self.find_calls.lock().unwrap()
    }
}

#[async_trait]
impl EventRepository for MockEventRepository {
    async fn insert_batch(&self, events: &[EventRecord]) -> SchedulerResult<()> {
        *self.insert_calls.lock().unwrap() += 1;
        if let Some(log) = &self.call_log {
            log.record("insert_batch");
        }

        {
            let mut failing = self.failing_inserts.lock().unwrap();
            if *failing > 0 {
                *failing -= 1;
                return Err(SchedulerError::DatabaseOperation(
                    "injected insert failure".to_string(),
                ));
            }
        }

        self.events.lock().unwrap().extend_from_slice(events);
        Ok(())
    }

    async fn find_due(
        &self,
        status: EventStatus,
        due_before: DateTime<Utc>,
        limit: i64,
        cursor: Option<EventCursor>,
    ) -> SchedulerResult<EventPage> {
        *self.find_calls.lock().unwrap() += 1;

        let mut due: Vec<(DateTime<Utc>, Uuid)> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.status == status && e.date < due_before)
            .map(|e| (e.date, e.id))
            .collect();
        due.sort();

        let taken: Vec<(DateTime<Utc>, Uuid)> = due
            .into_iter()
            .filter(|key| match &cursor {
                Some(c) => *key > (c.date, c.id),
                None => true,
            })
            .take(limit.max(0) as usize)
            .collect();

        let next_cursor = if taken.len() as i64 == limit {
            taken.last().map(|(date, id)| EventCursor {
                date: *date,
                id: *id,
            })
        } else {
            None
        };

        Ok(EventPage {
            ids: taken.into_iter().map(|(_, id)| id).collect(),
            next_cursor,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> SchedulerResult<Option<EventRecord>> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }
}

/// Repository serving a pre-programmed page script, recording every query
///
/// Useful for pagination termination tests where the page shape matters more
/// than the underlying data.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPageRepository {
    pages: Arc<Mutex<VecDeque<EventPage>>>,
    queries: Arc<Mutex<Vec<Option<EventCursor>>>>,
}

impl ScriptedPageRepository {
    pub fn new(pages: Vec<EventPage>) -> Self {
        Self {
            pages: Arc::new(Mutex::new(pages.into())),
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Cursors received, in query order
    pub fn recorded_cursors(&self) -> Vec<Option<EventCursor>> {
        self.queries.lock().unwrap().clone()
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl EventRepository for ScriptedPageRepository {
    async fn insert_batch(&self, _events: &[EventRecord]) -> SchedulerResult<()> {
        Ok(())
    }

    async fn find_due(
        &self,
        _status: EventStatus,
        _due_before: DateTime<Utc>,
        _limit: i64,
        cursor: Option<EventCursor>,
    ) -> SchedulerResult<EventPage> {
        self.queries.lock().unwrap().push(cursor);
        Ok(self.pages.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn get_by_id(&self, _id: Uuid) -> SchedulerResult<Option<EventRecord>> {
        Ok(None)
    }
}

/// Recording mock of the downstream invocation client
#[derive(Debug, Clone, Default)]
pub struct MockInvocationClient {
    calls: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    failing: Arc<Mutex<bool>>,
    call_log: Option<CallLog>,
}

impl MockInvocationClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_call_log(mut self, log: CallLog) -> Self {
        self.call_log = Some(log);
        self
    }

    /// Make every subsequent invoke call fail
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<(String, Vec<u8>)> {
        self.calls.lock().unwrap().clone()
    }

    /// Decode every recorded payload as a JSON id list
    pub fn id_list_payloads(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, payload)| serde_json::from_slice(payload).unwrap())
            .collect()
    }
}

#[async_trait]
impl InvocationClient for MockInvocationClient {
    async fn invoke(&self, target: &str, payload: Vec<u8>) -> SchedulerResult<()> {
        if let Some(log) = &self.call_log {
            log.record("invoke");
        }
        self.calls
            .lock()
            .unwrap()
            .push((target.to_string(), payload));

        if *self.failing.lock().unwrap() {
            return Err(SchedulerError::Invocation(
                "injected invoke failure".to_string(),
            ));
        }
        Ok(())
    }
}

/// Recording mock of the failure notifier
#[derive(Debug, Clone, Default)]
pub struct MockFailureNotifier {
    published: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
    failing: Arc<Mutex<bool>>,
}

impl MockFailureNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn published(&self) -> Vec<(String, serde_json::Value)> {
        self.published.lock().unwrap().clone()
    }

    pub fn publish_count(&self) -> usize {
        self.published.lock().unwrap().len()
    }
}

#[async_trait]
impl FailureNotifier for MockFailureNotifier {
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> SchedulerResult<()> {
        if *self.failing.lock().unwrap() {
            return Err(SchedulerError::Notification(
                "injected publish failure".to_string(),
            ));
        }
        let value = serde_json::from_slice(&payload)
            .map_err(|e| SchedulerError::Serialization(e.to_string()))?;
        self.published
            .lock()
            .unwrap()
            .push((channel.to_string(), value));
        Ok(())
    }
}
