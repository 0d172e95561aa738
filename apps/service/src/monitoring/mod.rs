//! Monitoring engine
//!
//! This module is responsible for:
//! - Probing a single url (`checker`)
//! - Deciding which targets are due and fanning checks out (`scheduler`)
//! - Keeping time injectable for deterministic tests (`clock`)

pub mod checker;
pub mod clock;
pub mod scheduler;
pub mod types;

pub use checker::{Checker, DEFAULT_CHECK_TIMEOUT, HttpChecker};
pub use clock::{Clock, ManualClock, SystemClock};
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerHandle, TickSummary};
pub use types::{CheckOutcome, CheckResult};
