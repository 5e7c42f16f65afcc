//! In-memory fakes shared by the unit tests of this crate.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use homesim_domain::device::AcMode;
use homesim_domain::error::{SimError, TransientReadError};
use homesim_domain::event::{EventType, SimEvent};
use homesim_domain::id::DeviceId;

use crate::ports::{
    AirConditionerHandle, DeviceCatalog, DeviceHandle, DeviceResult, EventPublisher, LightHandle,
    SensorHandle,
};

// ── Spy publisher ──────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct SpyPublisher {
    events: Mutex<Vec<SimEvent>>,
}

impl SpyPublisher {
    pub(crate) fn events(&self) -> Vec<SimEvent> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn of_type(&self, event_type: EventType) -> Vec<SimEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }
}

impl EventPublisher for SpyPublisher {
    fn publish(&self, event: SimEvent) -> impl Future<Output = Result<(), SimError>> + Send {
        self.events.lock().unwrap().push(event);
        async { Ok(()) }
    }
}

// ── Fake devices ───────────────────────────────────────────────

struct Common {
    id: DeviceId,
    name: String,
    available: AtomicBool,
    writes: AtomicUsize,
}

impl Common {
    fn new(name: &str) -> Self {
        Self {
            id: DeviceId::new(),
            name: name.to_string(),
            available: AtomicBool::new(true),
            writes: AtomicUsize::new(0),
        }
    }

    fn check(&self) -> DeviceResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(TransientReadError {
                device_id: self.id,
                reason: "offline".to_string(),
            })
        }
    }

    fn write(&self) -> DeviceResult<()> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Clone, Copy)]
pub(crate) struct AcState {
    pub(crate) on: bool,
    pub(crate) mode: AcMode,
    pub(crate) speed: u8,
    pub(crate) target: f64,
}

pub(crate) struct FakeAc {
    common: Common,
    state: Mutex<AcState>,
}

impl FakeAc {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            common: Common::new(name),
            state: Mutex::new(AcState {
                on: false,
                mode: AcMode::Off,
                speed: 0,
                target: 22.0,
            }),
        }
    }

    pub(crate) fn state(&self) -> AcState {
        *self.state.lock().unwrap()
    }

    pub(crate) fn set_state(&self, state: AcState) {
        *self.state.lock().unwrap() = state;
    }

    pub(crate) fn writes(&self) -> usize {
        self.common.writes.load(Ordering::SeqCst)
    }

    pub(crate) fn set_available(&self, available: bool) {
        self.common.available.store(available, Ordering::SeqCst);
    }
}

impl DeviceHandle for FakeAc {
    fn id(&self) -> DeviceId {
        self.common.id
    }
    fn name(&self) -> String {
        self.common.name.clone()
    }
    fn is_on(&self) -> DeviceResult<bool> {
        self.common.check()?;
        Ok(self.state().on)
    }
    fn set_on(&self, on: bool) -> DeviceResult<()> {
        self.common.write()?;
        self.state.lock().unwrap().on = on;
        Ok(())
    }
}

impl AirConditionerHandle for FakeAc {
    fn target_temperature(&self) -> DeviceResult<f64> {
        self.common.check()?;
        Ok(self.state().target)
    }
    fn set_target_temperature(&self, celsius: f64) -> DeviceResult<()> {
        self.common.write()?;
        self.state.lock().unwrap().target = celsius;
        Ok(())
    }
    fn speed(&self) -> DeviceResult<u8> {
        self.common.check()?;
        Ok(self.state().speed)
    }
    fn set_speed(&self, speed: u8) -> DeviceResult<()> {
        self.common.write()?;
        self.state.lock().unwrap().speed = speed;
        Ok(())
    }
    fn mode(&self) -> DeviceResult<AcMode> {
        self.common.check()?;
        Ok(self.state().mode)
    }
    fn set_mode(&self, mode: AcMode) -> DeviceResult<()> {
        self.common.write()?;
        self.state.lock().unwrap().mode = mode;
        Ok(())
    }
}

pub(crate) struct FakeLight {
    common: Common,
    state: Mutex<(bool, u8)>,
}

impl FakeLight {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            common: Common::new(name),
            state: Mutex::new((false, 0)),
        }
    }

    pub(crate) fn state(&self) -> (bool, u8) {
        *self.state.lock().unwrap()
    }

    pub(crate) fn set_state(&self, on: bool, brightness: u8) {
        *self.state.lock().unwrap() = (on, brightness);
    }

    pub(crate) fn writes(&self) -> usize {
        self.common.writes.load(Ordering::SeqCst)
    }
}

impl DeviceHandle for FakeLight {
    fn id(&self) -> DeviceId {
        self.common.id
    }
    fn name(&self) -> String {
        self.common.name.clone()
    }
    fn is_on(&self) -> DeviceResult<bool> {
        self.common.check()?;
        Ok(self.state().0)
    }
    fn set_on(&self, on: bool) -> DeviceResult<()> {
        self.common.write()?;
        self.state.lock().unwrap().0 = on;
        Ok(())
    }
}

impl LightHandle for FakeLight {
    fn brightness(&self) -> DeviceResult<u8> {
        self.common.check()?;
        Ok(self.state().1)
    }
    fn set_brightness(&self, percent: u8) -> DeviceResult<()> {
        self.common.write()?;
        self.state.lock().unwrap().1 = percent;
        Ok(())
    }
}

#[derive(Clone, Copy)]
pub(crate) struct SensorState {
    pub(crate) on: bool,
    pub(crate) temperature: f64,
    pub(crate) humidity: f64,
    pub(crate) co2: f64,
}

pub(crate) struct FakeSensor {
    common: Common,
    state: Mutex<SensorState>,
}

impl FakeSensor {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            common: Common::new(name),
            state: Mutex::new(SensorState {
                on: true,
                temperature: 0.0,
                humidity: 0.0,
                co2: 0.0,
            }),
        }
    }

    pub(crate) fn state(&self) -> SensorState {
        *self.state.lock().unwrap()
    }
}

impl DeviceHandle for FakeSensor {
    fn id(&self) -> DeviceId {
        self.common.id
    }
    fn name(&self) -> String {
        self.common.name.clone()
    }
    fn is_on(&self) -> DeviceResult<bool> {
        self.common.check()?;
        Ok(self.state().on)
    }
    fn set_on(&self, on: bool) -> DeviceResult<()> {
        self.common.write()?;
        self.state.lock().unwrap().on = on;
        Ok(())
    }
}

impl SensorHandle for FakeSensor {
    fn temperature(&self) -> DeviceResult<f64> {
        self.common.check()?;
        Ok(self.state().temperature)
    }
    fn humidity(&self) -> DeviceResult<f64> {
        self.common.check()?;
        Ok(self.state().humidity)
    }
    fn co2(&self) -> DeviceResult<f64> {
        self.common.check()?;
        Ok(self.state().co2)
    }
    fn record(&self, temperature: f64, humidity: f64, co2: f64) -> DeviceResult<()> {
        self.common.write()?;
        let mut state = self.state.lock().unwrap();
        state.temperature = temperature;
        state.humidity = humidity;
        state.co2 = co2;
        Ok(())
    }
}

// ── Fake catalog ───────────────────────────────────────────────

pub(crate) struct FakeCatalog {
    pub(crate) acs: Vec<Arc<FakeAc>>,
    pub(crate) lights: Vec<Arc<FakeLight>>,
    pub(crate) sensors: Vec<Arc<FakeSensor>>,
}

impl FakeCatalog {
    /// One device of each kind.
    pub(crate) fn single() -> Self {
        Self {
            acs: vec![Arc::new(FakeAc::new("ac"))],
            lights: vec![Arc::new(FakeLight::new("light"))],
            sensors: vec![Arc::new(FakeSensor::new("sensor"))],
        }
    }

    /// A light and a sensor, no air conditioner.
    pub(crate) fn without_air_conditioners() -> Self {
        Self {
            acs: Vec::new(),
            ..Self::single()
        }
    }

    pub(crate) fn empty() -> Self {
        Self {
            acs: Vec::new(),
            lights: Vec::new(),
            sensors: Vec::new(),
        }
    }
}

impl DeviceCatalog for FakeCatalog {
    type AirConditioner = FakeAc;
    type Light = FakeLight;
    type Sensor = FakeSensor;

    fn air_conditioners(&self) -> Vec<Arc<FakeAc>> {
        self.acs.clone()
    }
    fn lights(&self) -> Vec<Arc<FakeLight>> {
        self.lights.clone()
    }
    fn sensors(&self) -> Vec<Arc<FakeSensor>> {
        self.sensors.clone()
    }
}
