//! Devices as the engine sees them.
//!
//! The engine never owns devices; it reads and writes them through the
//! capability traits declared in the app layer. This module holds the
//! shared vocabulary: kinds, AC modes and the point-in-time snapshots
//! carried by journal records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::DeviceId;

/// Highest AC fan speed.
pub const MAX_AC_SPEED: u8 = 3;

/// Highest light brightness, in percent.
pub const MAX_BRIGHTNESS: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    AirConditioner,
    Light,
    Sensor,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AirConditioner => "air_conditioner",
            Self::Light => "light",
            Self::Sensor => "sensor",
        })
    }
}

/// Operating mode of an air conditioner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcMode {
    #[default]
    Off,
    Cool,
    Heat,
}

impl fmt::Display for AcMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "off",
            Self::Cool => "cool",
            Self::Heat => "heat",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcSnapshot {
    pub id: DeviceId,
    pub name: String,
    pub on: bool,
    pub mode: AcMode,
    pub speed: u8,
    pub target_temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightSnapshot {
    pub id: DeviceId,
    pub name: String,
    pub on: bool,
    pub brightness: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub id: DeviceId,
    pub name: String,
    pub on: bool,
    pub temperature: f64,
    pub humidity: f64,
    pub co2: f64,
}

/// State of every reachable device at one instant.
///
/// Devices that could not be read are left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshots {
    pub air_conditioners: Vec<AcSnapshot>,
    pub lights: Vec<LightSnapshot>,
    pub sensors: Vec<SensorSnapshot>,
}
