pub mod entities;
pub mod messaging;
pub mod repositories;

pub use entities::*;
pub use event_scheduler_core::{SchedulerError, SchedulerResult};
pub use messaging::*;
pub use repositories::*;
