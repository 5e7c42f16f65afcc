//! Event scheduler — fires configured events once their minute has come.

use homesim_domain::schedule::ScheduledEvent;

/// Configured events plus one "triggered" flag each.
///
/// Events are checked in configuration order. A flag goes from `false` to
/// `true` exactly once and never back.
#[derive(Debug, Clone)]
pub struct EventScheduler {
    events: Vec<ScheduledEvent>,
    triggered: Vec<bool>,
}

impl EventScheduler {
    #[must_use]
    pub fn new(events: Vec<ScheduledEvent>) -> Self {
        let triggered = vec![false; events.len()];
        Self { events, triggered }
    }

    /// First pending event due at `minute`, with its position, without
    /// marking it.
    #[must_use]
    pub fn next_due(&self, minute: u32) -> Option<(usize, &ScheduledEvent)> {
        self.events
            .iter()
            .zip(&self.triggered)
            .enumerate()
            .find(|(_, (event, triggered))| !**triggered && event.is_due(minute))
            .map(|(index, (event, _))| (index, event))
    }

    /// Mark the event at `index` as fired. Returns `false` if it already was.
    pub fn mark_fired(&mut self, index: usize) -> bool {
        match self.triggered.get_mut(index) {
            Some(triggered) if !*triggered => {
                *triggered = true;
                true
            }
            _ => false,
        }
    }

    /// Mark and return the first pending event due at `minute`, if any.
    pub fn fire_next(&mut self, minute: u32) -> Option<&ScheduledEvent> {
        let (index, _) = self.next_due(minute)?;
        self.triggered[index] = true;
        Some(&self.events[index])
    }

    /// Mark and return every pending event due at `minute`, in
    /// configuration order.
    pub fn tick(&mut self, minute: u32) -> Vec<ScheduledEvent> {
        let mut fired = Vec::new();
        while let Some(event) = self.fire_next(minute) {
            fired.push(event.clone());
        }
        fired
    }

    /// Events that have not fired yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.triggered.iter().filter(|t| !**t).count()
    }

    #[cfg(test)]
    fn triggered(&self) -> &[bool] {
        &self.triggered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homesim_domain::environment::EnvironmentDelta;
    use homesim_domain::hazard::HazardKind;
    use homesim_domain::schedule::EventEffect;

    fn delta_event(name: &str, minute: u32) -> ScheduledEvent {
        ScheduledEvent::new(
            name,
            minute,
            EventEffect::Delta(EnvironmentDelta {
                temperature: 1.0,
                ..EnvironmentDelta::default()
            }),
        )
        .unwrap()
    }

    #[test]
    fn should_not_fire_before_trigger_minute() {
        let mut scheduler = EventScheduler::new(vec![delta_event("a", 10)]);
        assert!(scheduler.tick(9).is_empty());
        assert_eq!(scheduler.triggered(), &[false]);
    }

    #[test]
    fn should_fire_exactly_once() {
        let mut scheduler = EventScheduler::new(vec![delta_event("a", 10)]);
        assert_eq!(scheduler.tick(10).len(), 1);
        assert!(scheduler.tick(10).is_empty());
        assert!(scheduler.tick(11).is_empty());
        assert_eq!(scheduler.triggered(), &[true]);
    }

    #[test]
    fn should_fire_late_events_on_next_tick() {
        let mut scheduler = EventScheduler::new(vec![delta_event("a", 10)]);
        let fired = scheduler.tick(25);
        assert_eq!(fired[0].name, "a");
    }

    #[test]
    fn should_fire_in_configuration_order() {
        let mut scheduler = EventScheduler::new(vec![
            delta_event("second-minute", 20),
            delta_event("first-minute", 5),
            ScheduledEvent::new("fire", 20, EventEffect::Hazard(HazardKind::Fire)).unwrap(),
        ]);
        let names: Vec<_> = scheduler.tick(30).into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["second-minute", "first-minute", "fire"]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn should_peek_without_marking_until_fired() {
        let mut scheduler =
            EventScheduler::new(vec![delta_event("a", 10), delta_event("b", 5)]);

        let (index, event) = scheduler.next_due(12).unwrap();
        assert_eq!((index, event.name.as_str()), (0, "a"));
        assert_eq!(scheduler.pending(), 2);

        assert!(scheduler.mark_fired(0));
        assert!(!scheduler.mark_fired(0));
        assert!(!scheduler.mark_fired(7));
        assert_eq!(scheduler.next_due(12).map(|(index, _)| index), Some(1));
        assert_eq!(scheduler.triggered(), &[true, false]);
    }

    #[test]
    fn should_fire_one_at_a_time_with_fire_next() {
        let mut scheduler =
            EventScheduler::new(vec![delta_event("a", 1), delta_event("b", 2)]);
        assert_eq!(scheduler.fire_next(5).map(|e| e.name.clone()), Some("a".into()));
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.fire_next(5).map(|e| e.name.clone()), Some("b".into()));
        assert!(scheduler.fire_next(5).is_none());
    }
}
