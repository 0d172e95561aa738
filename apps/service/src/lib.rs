//! Keep-alive watchdog core: a store of target URLs, an HTTP checker and a
//! scheduler that pings every enabled target once its interval has elapsed.

pub mod bootstrap;
pub mod config;
pub mod database;
pub mod monitoring;
pub mod normalize;
pub mod pool;

pub use bootstrap::register_self_target;
pub use config::Config;
pub use database::{InMemoryTargetStore, LibsqlTargetStore, NewTarget, Target, TargetPatch, TargetStore};
pub use monitoring::{CheckOutcome, CheckResult, Checker, HttpChecker, Scheduler, SchedulerConfig};
pub use normalize::{ValidationError, interval_seconds_to_ms, normalize_url};
