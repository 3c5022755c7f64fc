//! Test utilities shared across crates
//!
//! In-memory mock implementations and entity builders for unit testing
//! without a database or live downstream services.

pub mod builders;
pub mod mocks;

pub use builders::{EventRecordBuilder, SubmittedEventBuilder};
pub use mocks::{
    CallLog, MockEventRepository, MockFailureNotifier, MockInvocationClient,
    ScriptedPageRepository,
};
