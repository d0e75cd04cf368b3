//! Audit events raised by the login and consent controllers

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventCategory {
    Authentication,
    Grants,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    Success,
    Failure,
    Information,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum Event {
    UserLoginSuccess {
        username: String,
        subject_id: String,
        display_name: String,
        client_id: Option<String>,
    },
    UserLoginFailure {
        username: String,
        message: String,
        client_id: Option<String>,
    },
    ConsentGranted {
        subject_id: String,
        client_id: String,
        requested_scopes: Vec<String>,
        granted_scopes: Vec<String>,
        consent_remembered: bool,
    },
}

impl Event {
    /// Numeric id, stable across releases for log queries
    pub fn id(&self) -> u32 {
        match self {
            Event::UserLoginSuccess { .. } => 1000,
            Event::UserLoginFailure { .. } => 1001,
            Event::ConsentGranted { .. } => 4000,
        }
    }

    pub fn category(&self) -> EventCategory {
        match self {
            Event::UserLoginSuccess { .. } | Event::UserLoginFailure { .. } => {
                EventCategory::Authentication
            }
            Event::ConsentGranted { .. } => EventCategory::Grants,
        }
    }

    pub fn event_type(&self) -> EventType {
        match self {
            Event::UserLoginSuccess { .. } => EventType::Success,
            Event::UserLoginFailure { .. } => EventType::Failure,
            Event::ConsentGranted { .. } => EventType::Information,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Event::UserLoginSuccess { .. } => "User Login Success",
            Event::UserLoginFailure { .. } => "User Login Failure",
            Event::ConsentGranted { .. } => "Consent granted",
        }
    }
}

/// An event plus the envelope fields added when it is raised
#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    pub id: u32,
    pub instance_id: Uuid,
    pub category: EventCategory,
    pub event_type: EventType,
    pub time_stamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventRecord {
    pub fn new(event: Event) -> Self {
        Self {
            id: event.id(),
            instance_id: Uuid::new_v4(),
            category: event.category(),
            event_type: event.event_type(),
            time_stamp: Utc::now(),
            event,
        }
    }
}

/// Destination for raised events
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn raise(&self, event: Event);
}

/// Which event types are emitted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    #[serde(default = "default_true")]
    pub raise_success_events: bool,

    #[serde(default = "default_true")]
    pub raise_failure_events: bool,

    #[serde(default = "default_true")]
    pub raise_information_events: bool,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            raise_success_events: true,
            raise_failure_events: true,
            raise_information_events: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl EventsConfig {
    pub fn can_raise(&self, event_type: EventType) -> bool {
        match event_type {
            EventType::Success => self.raise_success_events,
            EventType::Failure => self.raise_failure_events,
            EventType::Information => self.raise_information_events,
        }
    }
}

/// Writes events as structured JSON to the `events` tracing target
pub struct TracingEventSink {
    config: EventsConfig,
}

impl TracingEventSink {
    pub fn new(config: EventsConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl EventSink for TracingEventSink {
    async fn raise(&self, event: Event) {
        if !self.config.can_raise(event.event_type()) {
            return;
        }

        let record = EventRecord::new(event);
        match serde_json::to_string(&record) {
            Ok(json) => tracing::info!(
                target: "events",
                event_id = record.id,
                event_name = record.event.name(),
                "{}",
                json
            ),
            Err(e) => tracing::error!("Failed to serialize event {}: {}", record.id, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_envelope_and_payload() {
        let record = EventRecord::new(Event::UserLoginFailure {
            username: "mallory".to_string(),
            message: "invalid credentials".to_string(),
            client_id: None,
        });
        let json: serde_json::Value = serde_json::to_value(&record).unwrap();

        assert_eq!(json["id"], 1001);
        assert_eq!(json["name"], "UserLoginFailure");
        assert_eq!(json["category"], "Authentication");
        assert_eq!(json["event_type"], "Failure");
        assert_eq!(json["username"], "mallory");
        assert!(json["client_id"].is_null());
    }

    #[test]
    fn test_config_gates_event_types() {
        let config = EventsConfig {
            raise_failure_events: false,
            ..EventsConfig::default()
        };
        assert!(config.can_raise(EventType::Success));
        assert!(!config.can_raise(EventType::Failure));
        assert!(config.can_raise(EventType::Information));
    }
}
