//! Simulated clock driver: one minute per tick until the end minute.

use std::ops::ControlFlow;

use homesim_domain::error::SimError;

use super::ControlLoop;
use crate::environment::EnvironmentHandle;

pub(crate) struct ClockLoop {
    env: EnvironmentHandle,
    end_minute: u32,
    reached_end: bool,
}

impl ClockLoop {
    pub(crate) fn new(env: EnvironmentHandle, end_minute: u32) -> Self {
        Self {
            env,
            end_minute,
            reached_end: false,
        }
    }

    /// Whether the loop stopped because the end minute was reached.
    pub(crate) fn reached_end(&self) -> bool {
        self.reached_end
    }
}

impl ControlLoop for ClockLoop {
    const NAME: &'static str = "clock";

    async fn tick(&mut self) -> Result<ControlFlow<()>, SimError> {
        let end = self.end_minute;
        let state = self
            .env
            .modify(move |s| {
                if s.minute < end {
                    s.minute += 1;
                }
            })
            .await?;
        tracing::trace!(minute = state.minute, clock = %state.clock(), "tick");

        if state.minute >= end {
            self.reached_end = true;
            return Ok(ControlFlow::Break(()));
        }
        Ok(ControlFlow::Continue(()))
    }
}
