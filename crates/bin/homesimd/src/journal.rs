//! Journal sink — forwards simulation records from the event bus into
//! `tracing`.

use homesim_domain::event::{Severity, SimEvent};
use tokio::sync::broadcast::{self, error::RecvError};

/// Target of every forwarded record.
pub const TARGET: &str = "homesim::journal";

/// Forward records until every publisher is gone. Returns how many were
/// forwarded.
pub async fn forward(mut rx: broadcast::Receiver<SimEvent>) -> usize {
    let mut forwarded = 0;
    loop {
        match rx.recv().await {
            Ok(record) => {
                emit(&record);
                forwarded += 1;
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(target: TARGET, skipped, "journal sink lagged, records dropped");
            }
            Err(RecvError::Closed) => break,
        }
    }
    forwarded
}

fn emit(record: &SimEvent) {
    let clock = record.clock();
    let device = record.device_id.map(|id| id.to_string()).unwrap_or_default();
    let event = format!("{:?}", record.event_type);
    match record.severity {
        Severity::Debug => tracing::debug!(
            target: TARGET,
            clock = %clock,
            device = %device,
            event = %event,
            "{}",
            record.message
        ),
        Severity::Info => tracing::info!(
            target: TARGET,
            clock = %clock,
            device = %device,
            event = %event,
            "{}",
            record.message
        ),
        Severity::Alert => tracing::warn!(
            target: TARGET,
            clock = %clock,
            device = %device,
            event = %event,
            alert = true,
            "{}",
            record.message
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homesim_domain::event::EventType;

    #[tokio::test]
    async fn should_forward_until_closed() {
        let (tx, rx) = broadcast::channel(8);
        let sink = tokio::spawn(forward(rx));

        tx.send(SimEvent::info(EventType::SimulationStarted, 0, "started"))
            .unwrap();
        tx.send(SimEvent::alert(EventType::EmergencyEntered, 5, "CO2"))
            .unwrap();
        drop(tx);

        assert_eq!(sink.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn should_survive_lag() {
        let (tx, rx) = broadcast::channel(1);
        for minute in 0..3 {
            tx.send(SimEvent::debug(EventType::StatusReport, minute, "tick"))
                .unwrap();
        }
        drop(tx);

        assert_eq!(forward(rx).await, 1);
    }
}
