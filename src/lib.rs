// Core layer - configuration and error types
pub mod core;

// Features layer - all feature modules
pub mod features;

// Re-export core config for convenience
pub use core::Config;

// Re-export feature items
pub use features::reminders::{
    parse_record, Ack, AckSink, Clock, NotificationSink, ParsedRecord, RecordEvent, RecordId,
    RecordSource, Reminder, ReminderRegistry, ReminderService, Scheduler, SystemClock,
    TimerHandle, CRON_DELIMITER,
};
