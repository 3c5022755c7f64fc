pub mod config;
pub mod errors;

pub use self::config::*;
pub use self::errors::{SchedulerError, SchedulerResult};
