//! Reminder registry
//!
//! The only shared mutable structure in the feature: a concurrent map from
//! record id to its live reminder. Same-key operations serialize on the
//! map's entry lock; different keys proceed independently. Delivery never
//! happens under the lock, it runs inside each reminder's own timer task.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::{error, info};
use std::fmt;
use std::sync::Arc;

use crate::features::reminders::parser::ParsedRecord;
use crate::features::reminders::scheduler::{Scheduler, TimerHandle};
use crate::features::reminders::service::NotificationSink;

/// Opaque, externally-assigned record key. The glue layer decides what it
/// is derived from (for Discord: the message id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        RecordId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        RecordId(id.to_string())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        RecordId(id)
    }
}

/// A live reminder: immutable expression and payload plus exclusive
/// ownership of its running timer.
pub struct Reminder {
    expression: String,
    payload: String,
    handle: TimerHandle,
}

impl Reminder {
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }
}

/// Registry of all live reminders, keyed by record id.
pub struct ReminderRegistry {
    reminders: DashMap<RecordId, Reminder>,
    scheduler: Scheduler,
    sink: Arc<dyn NotificationSink>,
}

impl ReminderRegistry {
    pub fn new(scheduler: Scheduler, sink: Arc<dyn NotificationSink>) -> Self {
        ReminderRegistry {
            reminders: DashMap::new(),
            scheduler,
            sink,
        }
    }

    /// Install a reminder under `id`, replacing any existing one.
    ///
    /// Replacement stops the old timer before the new reminder becomes
    /// visible, all under the entry lock: there is never a moment with two
    /// live timers for one id, and never a stale handle left in the map.
    pub fn upsert(&self, id: RecordId, record: ParsedRecord) {
        match self.reminders.entry(id) {
            Entry::Occupied(mut entry) => {
                entry.get().handle.stop();
                info!("Reminder \"{}\" replaced", entry.get().payload);
                entry.insert(self.make_reminder(record));
            }
            Entry::Vacant(entry) => {
                let reminder = self.make_reminder(record);
                info!("Reminder \"{}\" set", reminder.payload);
                entry.insert(reminder);
            }
        }
    }

    /// Stop and forget the reminder under `id`.
    ///
    /// Returns false when the id was never registered; that is a no-op,
    /// not an error.
    pub fn remove(&self, id: &RecordId) -> bool {
        match self.reminders.remove(id) {
            Some((_, reminder)) => {
                reminder.handle.stop();
                info!("Reminder \"{}\" removed", reminder.payload);
                true
            }
            None => false,
        }
    }

    /// Stop every timer and empty the registry.
    pub fn clear(&self) {
        let count = self.reminders.len();
        // Dropping a Reminder stops its timer
        self.reminders.clear();
        if count > 0 {
            info!("Cleared {count} reminders");
        }
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.reminders.contains_key(id)
    }

    /// Expression and payload of the live reminder under `id`, if any.
    pub fn describe(&self, id: &RecordId) -> Option<(String, String)> {
        self.reminders
            .get(id)
            .map(|r| (r.expression().to_string(), r.payload().to_string()))
    }

    pub fn len(&self) -> usize {
        self.reminders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reminders.is_empty()
    }

    fn make_reminder(&self, record: ParsedRecord) -> Reminder {
        let sink = self.sink.clone();
        let payload = record.payload.clone();

        let handle = self.scheduler.schedule(record.schedule, move || {
            let sink = sink.clone();
            let payload = payload.clone();
            async move {
                match sink.deliver(&payload).await {
                    Ok(()) => info!("Reminder \"{payload}\" sent"),
                    Err(err) => error!("Reminder \"{payload}\" failed sending: {err}"),
                }
            }
        });

        Reminder {
            expression: record.expression,
            payload: record.payload,
            handle,
        }
    }
}
