//! # Reminders Feature
//!
//! Cron-driven reminder scheduling from chat records. Each record carries a
//! backtick-wrapped cron expression on its first line and a payload below;
//! the feature keeps one running timer per valid record and delivers the
//! payload on every matching minute.
//!
//! - **Version**: 1.3.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.3.0: Clock seam for deterministic timer tests
//! - 1.2.0: Startup replay through the shared create path
//! - 1.0.0: Initial release

pub mod cron;
pub mod discord;
pub mod parser;
pub mod registry;
pub mod scheduler;
pub mod service;

pub use parser::{parse_record, ParsedRecord, CRON_DELIMITER};
pub use registry::{RecordId, Reminder, ReminderRegistry};
pub use scheduler::{Clock, Scheduler, SystemClock, TimerHandle};
pub use service::{Ack, AckSink, NotificationSink, RecordEvent, RecordSource, ReminderService};
