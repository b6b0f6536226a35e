use async_trait::async_trait;
use skybook_shared::models::events::DomainEvent;
use std::sync::Mutex;

/// Destination for events emitted after a booking-core transaction commits.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, event: DomainEvent) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Sink used when no broker is configured: events only reach the log.
pub struct LogEventSink;

#[async_trait]
impl EventSink for LogEventSink {
    async fn publish(&self, event: DomainEvent) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!(topic = event.topic, key = %event.key, "event: {}", event.payload);
        Ok(())
    }
}

/// Keeps every published event in memory; for tests.
#[derive(Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topics(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .map(|events| events.iter().map(|e| e.topic).collect())
            .unwrap_or_default()
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EventSink for RecordingEventSink {
    async fn publish(&self, event: DomainEvent) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.events
            .lock()
            .map_err(|_| "recording sink poisoned")?
            .push(event);
        Ok(())
    }
}
