//! Virtual device implementations — air conditioner, light, sensor.
//!
//! Each virtual device holds a fixed [`DeviceId`] and keeps its attributes
//! behind a `Mutex`. A device can be marked unavailable, in which case every
//! read and write fails with a [`TransientReadError`] until it comes back.

mod air_conditioner;
mod light;
mod sensor;

pub use air_conditioner::VirtualAirConditioner;
pub use light::VirtualLight;
pub use sensor::VirtualSensor;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use homesim_app::ports::DeviceResult;
use homesim_domain::error::TransientReadError;
use homesim_domain::id::DeviceId;

/// Identity and reachability shared by every virtual device.
struct Presence {
    id: DeviceId,
    name: String,
    available: AtomicBool,
}

impl Presence {
    fn new(name: impl Into<String>) -> Self {
        Self {
            id: DeviceId::new(),
            name: name.into(),
            available: AtomicBool::new(true),
        }
    }

    fn check(&self) -> DeviceResult<()> {
        if self.available.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(TransientReadError {
                device_id: self.id,
                reason: format!("{} is unavailable", self.name),
            })
        }
    }

    fn set_available(&self, available: bool) {
        let was = self.available.swap(available, Ordering::AcqRel);
        if was != available {
            tracing::debug!(device = %self.name, available, "virtual device availability changed");
        }
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
