//! Journal records — immutable entries describing what the engine did.
//!
//! Records are produced by the control loops and published through the
//! event publisher port. Their [`Severity`] maps onto the journal levels
//! DEBUG, INFO and ALERT.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::{DeviceId, RecordId};
use crate::time::{self, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Per-tick actuator chatter.
    Debug,
    /// State transitions.
    Info,
    /// Hazards and emergencies.
    Alert,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Alert => "ALERT",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    SimulationStarted,
    SimulationStopped,
    EventFired,
    HazardRaised,
    HazardCleared,
    EmergencyEntered,
    EmergencyRecovered,
    ActuatorChanged,
    DeviceUnavailable,
    StatusReport,
    InvariantViolated,
    ConfigurationFailed,
}

/// One journal record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    pub id: RecordId,
    pub severity: Severity,
    pub event_type: EventType,
    pub device_id: Option<DeviceId>,
    /// Absolute simulated minute at which the record was produced.
    pub minute: u32,
    pub message: String,
    pub data: serde_json::Value,
    pub timestamp: Timestamp,
}

impl SimEvent {
    #[must_use]
    pub fn new(
        severity: Severity,
        event_type: EventType,
        minute: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: RecordId::new(),
            severity,
            event_type,
            device_id: None,
            minute,
            message: message.into(),
            data: serde_json::Value::Null,
            timestamp: time::now(),
        }
    }

    #[must_use]
    pub fn debug(event_type: EventType, minute: u32, message: impl Into<String>) -> Self {
        Self::new(Severity::Debug, event_type, minute, message)
    }

    #[must_use]
    pub fn info(event_type: EventType, minute: u32, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, event_type, minute, message)
    }

    #[must_use]
    pub fn alert(event_type: EventType, minute: u32, message: impl Into<String>) -> Self {
        Self::new(Severity::Alert, event_type, minute, message)
    }

    #[must_use]
    pub fn with_device(mut self, device_id: DeviceId) -> Self {
        self.device_id = Some(device_id);
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    /// `HH:MM` of the simulated clock when the record was produced.
    #[must_use]
    pub fn clock(&self) -> String {
        time::format_clock(self.minute)
    }
}

impl fmt::Display for SimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] [{}]", self.clock(), self.severity)?;
        if let Some(device_id) = self.device_id {
            write!(f, " [{device_id}]")?;
        }
        write!(f, " {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_record_without_device_or_data() {
        let event = SimEvent::info(EventType::SimulationStarted, 0, "started");
        assert_eq!(event.severity, Severity::Info);
        assert_eq!(event.device_id, None);
        assert!(event.data.is_null());
    }

    #[test]
    fn should_attach_device_and_data() {
        let device = DeviceId::new();
        let event = SimEvent::debug(EventType::ActuatorChanged, 5, "ac updated")
            .with_device(device)
            .with_data(serde_json::json!({"speed": 2}));
        assert_eq!(event.device_id, Some(device));
        assert_eq!(event.data["speed"], 2);
    }

    #[test]
    fn should_order_severities() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Info < Severity::Alert);
    }

    #[test]
    fn should_display_clock_severity_and_message() {
        let event = SimEvent::alert(EventType::EmergencyEntered, 61, "co2 too high");
        assert_eq!(event.to_string(), "[01:01] [ALERT] co2 too high");
    }

    #[test]
    fn should_give_each_record_its_own_id() {
        let a = SimEvent::info(EventType::EventFired, 1, "a");
        let b = SimEvent::info(EventType::EventFired, 1, "a");
        assert_ne!(a.id, b.id);
    }
}
