//! Hazards and their one-shot bookkeeping.
//!
//! Every [`HazardKind`] carries a `detected` flag and a `handled` flag.
//! Raising an already detected hazard changes nothing, so the safety action
//! guarded by `handled` runs once per activation. Only [`HazardFlags::clear`]
//! ends an activation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::InvariantViolation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardKind {
    Fire,
    GasLeak,
    HighTemperature,
}

impl HazardKind {
    pub const ALL: [Self; 3] = [Self::Fire, Self::GasLeak, Self::HighTemperature];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Fire => "fire",
            Self::GasLeak => "gas_leak",
            Self::HighTemperature => "high_temperature",
        }
    }
}

impl fmt::Display for HazardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazardStatus {
    pub detected: bool,
    pub handled: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazardFlags {
    pub fire: HazardStatus,
    pub gas_leak: HazardStatus,
    pub high_temperature: HazardStatus,
}

impl HazardFlags {
    #[must_use]
    pub fn status(&self, kind: HazardKind) -> HazardStatus {
        match kind {
            HazardKind::Fire => self.fire,
            HazardKind::GasLeak => self.gas_leak,
            HazardKind::HighTemperature => self.high_temperature,
        }
    }

    fn status_mut(&mut self, kind: HazardKind) -> &mut HazardStatus {
        match kind {
            HazardKind::Fire => &mut self.fire,
            HazardKind::GasLeak => &mut self.gas_leak,
            HazardKind::HighTemperature => &mut self.high_temperature,
        }
    }

    #[must_use]
    pub fn is_detected(&self, kind: HazardKind) -> bool {
        self.status(kind).detected
    }

    /// Mark the hazard as detected. Returns `true` for a new activation.
    pub fn raise(&mut self, kind: HazardKind) -> bool {
        let status = self.status_mut(kind);
        if status.detected {
            return false;
        }
        status.detected = true;
        true
    }

    /// Whether the one-shot safety action for `kind` is still owed.
    #[must_use]
    pub fn needs_action(&self, kind: HazardKind) -> bool {
        let status = self.status(kind);
        status.detected && !status.handled
    }

    /// Record that the one-shot action for `kind` ran.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation::OneShotRepeated`] if it was already
    /// recorded for the current activation.
    pub fn mark_handled(&mut self, kind: HazardKind) -> Result<(), InvariantViolation> {
        let status = self.status_mut(kind);
        if status.handled {
            return Err(InvariantViolation::OneShotRepeated(kind.label()));
        }
        status.handled = true;
        Ok(())
    }

    /// End the activation of `kind`. Returns `true` if it was detected.
    pub fn clear(&mut self, kind: HazardKind) -> bool {
        let status = self.status_mut(kind);
        let was_detected = status.detected;
        *status = HazardStatus::default();
        was_detected
    }

    #[must_use]
    pub fn any_detected(&self) -> bool {
        HazardKind::ALL.iter().any(|kind| self.is_detected(*kind))
    }

    /// Kinds currently detected, in declaration order.
    #[must_use]
    pub fn detected(&self) -> Vec<HazardKind> {
        HazardKind::ALL
            .into_iter()
            .filter(|kind| self.is_detected(*kind))
            .collect()
    }
}
