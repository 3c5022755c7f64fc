pub mod database;
pub mod http_invoker;
pub mod retry;
pub mod webhook_notifier;

pub use database::{DatabasePool, DatabaseType, PostgresEventRepository, SqliteEventRepository};
pub use http_invoker::HttpInvocationClient;
pub use retry::{RetryPolicy, RetryingEventRepository};
pub use webhook_notifier::WebhookFailureNotifier;
