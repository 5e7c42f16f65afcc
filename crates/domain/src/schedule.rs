//! Scheduled events — what happens to the home at a given minute.

use serde::{Deserialize, Serialize};

use crate::environment::EnvironmentDelta;
use crate::error::ValidationError;
use crate::hazard::HazardKind;

/// What a scheduled event does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventEffect {
    /// Ordinary event: additive change to the environment.
    Delta(EnvironmentDelta),
    /// Emergency seed: raises a hazard.
    Hazard(HazardKind),
}

/// An immutable, configured event.
///
/// The "already fired" flag lives in the scheduler, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub name: String,
    /// Absolute simulated minute at or after which the event fires.
    pub trigger_minute: u32,
    pub effect: EventEffect,
}

impl ScheduledEvent {
    /// Create a validated event.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] if `name` is blank.
    pub fn new(
        name: impl Into<String>,
        trigger_minute: u32,
        effect: EventEffect,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(Self {
            name,
            trigger_minute,
            effect,
        })
    }

    #[must_use]
    pub fn is_due(&self, minute: u32) -> bool {
        self.trigger_minute <= minute
    }

    #[must_use]
    pub fn hazard(&self) -> Option<HazardKind> {
        match self.effect {
            EventEffect::Hazard(kind) => Some(kind),
            EventEffect::Delta(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_reject_blank_name() {
        let result = ScheduledEvent::new("  ", 10, EventEffect::Hazard(HazardKind::Fire));
        assert_eq!(result.unwrap_err(), ValidationError::EmptyName);
    }

    #[test]
    fn should_be_due_at_and_after_trigger_minute() {
        let event = ScheduledEvent::new(
            "cooking",
            720,
            EventEffect::Delta(EnvironmentDelta {
                temperature: 2.0,
                ..EnvironmentDelta::default()
            }),
        )
        .unwrap();
        assert!(!event.is_due(719));
        assert!(event.is_due(720));
        assert!(event.is_due(900));
        assert_eq!(event.hazard(), None);
    }

    #[test]
    fn should_expose_hazard_kind_of_seed_event() {
        let event =
            ScheduledEvent::new("kitchen fire", 60, EventEffect::Hazard(HazardKind::Fire)).unwrap();
        assert_eq!(event.hazard(), Some(HazardKind::Fire));
    }
}
