//! Periodic status report. Read-only.

use std::ops::ControlFlow;

use homesim_domain::error::SimError;
use homesim_domain::event::{EventType, SimEvent};
use homesim_domain::time::format_clock;

use super::{ControlLoop, Shared};
use crate::devices;
use crate::ports::{DeviceCatalog, EventPublisher};

pub(crate) struct ReportLoop<C, P> {
    shared: Shared<C, P>,
    every: u32,
    /// `None` once the next report would overflow the clock.
    next_report: Option<u32>,
}

impl<C, P> ReportLoop<C, P> {
    pub(crate) fn new(shared: Shared<C, P>, first_report: u32, every: u32) -> Self {
        Self {
            shared,
            every,
            next_report: Some(first_report),
        }
    }
}

/// First report minute strictly after `minute`, counting from `due` in
/// steps of `every`.
fn next_after(due: u32, minute: u32, every: u32) -> Option<u32> {
    let steps = (minute - due) / every + 1;
    steps.checked_mul(every).and_then(|offset| due.checked_add(offset))
}

impl<C, P> ControlLoop for ReportLoop<C, P>
where
    C: DeviceCatalog + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    const NAME: &'static str = "reporting";

    async fn tick(&mut self) -> Result<ControlFlow<()>, SimError> {
        let state = self.shared.env.snapshot().await?;
        let Some(due) = self.next_report.filter(|due| *due <= state.minute) else {
            return Ok(ControlFlow::Continue(()));
        };
        self.next_report = next_after(due, state.minute, self.every);

        let status = self.shared.emergency.status();
        if status.active {
            let mut message = String::from("EMERGENCY MODE");
            if let (Some(since), Some(recovery)) = (status.co2_since, status.co2_recovery_at) {
                message.push_str(&format!(
                    ": CO2 since {}, recovery expected at {}",
                    format_clock(since),
                    format_clock(recovery)
                ));
            }
            if !status.hazards.is_empty() {
                let hazards: Vec<_> = status.hazards.iter().map(ToString::to_string).collect();
                message.push_str(&format!(", hazards: {}", hazards.join(", ")));
            }
            let banner = SimEvent::alert(EventType::StatusReport, state.minute, message)
                .with_data(serde_json::json!(status));
            self.shared.publish(banner).await;
        }

        let (snapshots, _) = devices::snapshot(self.shared.catalog.as_ref());
        let acs_on = snapshots.air_conditioners.iter().filter(|ac| ac.on).count();
        let lights_on = snapshots.lights.iter().filter(|light| light.on).count();
        let report = SimEvent::info(
            EventType::StatusReport,
            state.minute,
            format!(
                "{} {}: {:.1}°C, {:.1}%, CO2 {:.0} ppm, {:.0} lux, {} occupant(s), {acs_on}/{} AC on, {lights_on}/{} lights on",
                state.clock(),
                state.scenario(),
                state.temperature,
                state.humidity,
                state.co2,
                state.light_intensity(),
                state.occupancy,
                snapshots.air_conditioners.len(),
                snapshots.lights.len(),
            ),
        )
        .with_data(serde_json::json!({
            "environment": state,
            "scenario": state.scenario(),
            "devices": snapshots,
            "emergency": status,
        }));
        self.shared.publish(report).await;
        Ok(ControlFlow::Continue(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_schedule_next_report_after_current_minute() {
        assert_eq!(next_after(600, 600, 30), Some(630));
        assert_eq!(next_after(600, 629, 30), Some(630));
        assert_eq!(next_after(600, 675, 30), Some(690));
    }

    #[test]
    fn should_stop_reporting_when_clock_would_overflow() {
        assert_eq!(next_after(u32::MAX - 10, u32::MAX, 30), None);
        assert_eq!(next_after(u32::MAX, u32::MAX, 1), None);
    }
}
