//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`SimError`]
//! via `#[from]`.

use crate::id::DeviceId;

/// Top-level error for engine operations.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("device temporarily unavailable")]
    TransientRead(#[from] TransientReadError),

    #[error("invariant violated")]
    InvariantViolation(#[from] InvariantViolation),

    /// The environment owner task is gone (simulation stopped or never started).
    #[error("simulation is not running")]
    NotRunning,
}

/// A configuration or value failed a domain invariant.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("{field} must be strictly positive")]
    NotPositive { field: &'static str },

    #[error("name must not be empty")]
    EmptyName,

    #[error("hazard event `{name}` must not carry environment deltas")]
    HazardWithDeltas { name: String },
}

/// A device could not be read or written during this tick.
///
/// Loops skip the device for the current tick and carry on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("device {device_id} unavailable: {reason}")]
pub struct TransientReadError {
    pub device_id: DeviceId,
    pub reason: String,
}

/// A programming error detected at runtime.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("one-shot action for {0} executed twice")]
    OneShotRepeated(&'static str),

    #[error("simulation already started")]
    AlreadyStarted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_out_of_range_with_bounds() {
        let err = ValidationError::OutOfRange {
            field: "humidity",
            min: 0.0,
            max: 100.0,
            value: 120.0,
        };
        assert_eq!(
            err.to_string(),
            "humidity must be within [0, 100], got 120"
        );
    }

    #[test]
    fn should_convert_transient_read_into_sim_error() {
        let err: SimError = TransientReadError {
            device_id: DeviceId::new(),
            reason: "offline".to_string(),
        }
        .into();
        assert!(matches!(err, SimError::TransientRead(_)));
    }

    #[test]
    fn should_display_repeated_one_shot() {
        let err = InvariantViolation::OneShotRepeated("fire");
        assert_eq!(err.to_string(), "one-shot action for fire executed twice");
    }
}
