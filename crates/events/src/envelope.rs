use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::Event;

/// Envelope for a committed event, carrying stream metadata.
///
/// - `sequence_number` is monotonically increasing per process.
/// - `payload` is usually the JSON form of the domain event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    aggregate_type: String,
    sequence_number: u64,
    event_type: String,
    occurred_at: NaiveDateTime,
    summary: String,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: Uuid,
        aggregate_type: impl Into<String>,
        sequence_number: u64,
        event_type: impl Into<String>,
        occurred_at: NaiveDateTime,
        summary: impl Into<String>,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            aggregate_type: aggregate_type.into(),
            sequence_number,
            event_type: event_type.into(),
            occurred_at,
            summary: summary.into(),
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn occurred_at(&self) -> NaiveDateTime {
        self.occurred_at
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

impl EventEnvelope<serde_json::Value> {
    /// Wrap a domain event, serializing its payload to JSON.
    pub fn wrap<Ev>(
        aggregate_type: &str,
        sequence_number: u64,
        event: &Ev,
    ) -> Result<Self, serde_json::Error>
    where
        Ev: Event + Serialize,
    {
        Ok(Self::new(
            Uuid::now_v7(),
            aggregate_type,
            sequence_number,
            event.event_type(),
            event.occurred_at(),
            event.summary(),
            serde_json::to_value(event)?,
        ))
    }
}
