//! Record event handling and startup replay
//!
//! Drives the per-record state machine: a record is ACTIVE while a valid
//! reminder exists for it, ABSENT otherwise. Created and Updated events go
//! through one shared path so a record discovered at boot behaves exactly
//! like one created live.

use async_trait::async_trait;
use log::{debug, info, warn};
use std::sync::Arc;

use crate::core::error::{DeliveryError, SourceError};
use crate::features::reminders::parser::parse_record;
use crate::features::reminders::registry::{RecordId, ReminderRegistry};

/// A change to a record, as reported by the record source.
#[derive(Debug, Clone)]
pub enum RecordEvent {
    Created { id: RecordId, body: String },
    Updated { id: RecordId, body: String },
    Deleted { id: RecordId },
}

/// Outcome reported for every Created/Updated event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    Accepted,
    Rejected,
}

/// Destination for fired reminder payloads.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, payload: &str) -> Result<(), DeliveryError>;
}

/// Acknowledgement reporting back onto the originating record.
///
/// Best effort: implementations log their own failures. The record may be
/// gone by the time an acknowledgement lands.
#[async_trait]
pub trait AckSink: Send + Sync {
    /// Remove any previous acknowledgement for the record.
    async fn clear(&self, id: &RecordId);

    /// Report whether the record was accepted or rejected.
    async fn report(&self, id: &RecordId, ack: Ack);
}

/// Supplier of the existing records at startup.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// The bounded, ordered page of currently-known records.
    async fn list_existing(&self) -> Result<Vec<(RecordId, String)>, SourceError>;
}

/// Applies record events to the registry and reports acknowledgements.
pub struct ReminderService {
    registry: ReminderRegistry,
    acks: Arc<dyn AckSink>,
}

impl ReminderService {
    pub fn new(registry: ReminderRegistry, acks: Arc<dyn AckSink>) -> Self {
        ReminderService { registry, acks }
    }

    pub fn registry(&self) -> &ReminderRegistry {
        &self.registry
    }

    /// Apply one record event.
    ///
    /// Parse and validation failures are absorbed here: a bad record gets a
    /// Rejected acknowledgement and loses any reminder it previously had,
    /// nothing else is affected.
    pub async fn apply(&self, event: RecordEvent) {
        match event {
            RecordEvent::Created { id, body } | RecordEvent::Updated { id, body } => {
                self.upsert_record(id, &body).await;
            }
            RecordEvent::Deleted { id } => {
                // Idempotent; the record may never have validated
                self.registry.remove(&id);
            }
        }
    }

    async fn upsert_record(&self, id: RecordId, body: &str) {
        self.acks.clear(&id).await;

        match parse_record(body) {
            Ok(record) => {
                debug!("Record {id} parsed as `{}`", record.expression);
                self.registry.upsert(id.clone(), record);
                self.acks.report(&id, Ack::Accepted).await;
            }
            Err(err) => {
                warn!("Rejecting record {id}: {err}");
                self.registry.remove(&id);
                self.acks.report(&id, Ack::Rejected).await;
            }
        }
    }

    /// Feed every existing record through the create path, in source order.
    ///
    /// Individual invalid records are rejected and skipped; only an
    /// unreachable source aborts the replay. Returns the number of records
    /// processed.
    pub async fn replay(&self, source: &dyn RecordSource) -> Result<usize, SourceError> {
        let records = source.list_existing().await?;
        let total = records.len();

        for (id, body) in records {
            self.apply(RecordEvent::Created { id, body }).await;
        }

        info!(
            "Replayed {total} existing records, {} reminders active",
            self.registry.len()
        );
        Ok(total)
    }
}
