pub mod batch;
pub mod intake;
pub mod sweeper;
pub mod time_utils;

pub use batch::{make_chunks, BatchDispatcher, DispatchStats};
pub use intake::{IntakeService, IntakeSummary};
pub use sweeper::Sweeper;
