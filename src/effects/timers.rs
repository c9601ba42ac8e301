use std::collections::BTreeMap;

/// Handle to a scheduled timer. Ids are never reused within one `TimerSet`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Pending<E> {
    due_at: f64,
    event: E,
}

/// Tracks every pending timeout owned by a controller so teardown can cancel
/// all of them at once. Time is host-supplied milliseconds.
#[derive(Debug, Clone)]
pub struct TimerSet<E> {
    next_id: u64,
    pending: BTreeMap<TimerId, Pending<E>>,
}

impl<E> Default for TimerSet<E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            pending: BTreeMap::new(),
        }
    }
}

impl<E> TimerSet<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now: f64, delay_ms: f64, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.insert(
            id,
            Pending {
                due_at: now + delay_ms.max(0.0),
                event,
            },
        );
        id
    }

    /// Returns true if the timer was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.pending.remove(&id).is_some()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Removes and returns every timer due at or before `now`, ordered by due
    /// time and then by scheduling order.
    pub fn take_due(&mut self, now: f64) -> Vec<(TimerId, E)> {
        let due_ids: Vec<TimerId> = self
            .pending
            .iter()
            .filter(|(_, pending)| pending.due_at <= now)
            .map(|(id, _)| *id)
            .collect();

        let mut fired: Vec<(f64, TimerId, E)> = due_ids
            .into_iter()
            .filter_map(|id| self.pending.remove(&id).map(|p| (p.due_at, id, p.event)))
            .collect();
        fired.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        fired.into_iter().map(|(_, id, event)| (id, event)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_due_order() {
        let mut timers = TimerSet::new();
        timers.schedule(0.0, 300.0, "late");
        timers.schedule(0.0, 100.0, "early");
        timers.schedule(0.0, 5000.0, "later");

        let fired: Vec<_> = timers.take_due(400.0).into_iter().map(|(_, e)| e).collect();
        assert_eq!(fired, vec!["early", "late"]);
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut timers = TimerSet::new();
        let id = timers.schedule(0.0, 10.0, ());
        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));
        assert!(timers.take_due(100.0).is_empty());
    }

    #[test]
    fn clear_drops_everything() {
        let mut timers = TimerSet::new();
        timers.schedule(0.0, 10.0, 1);
        timers.schedule(0.0, 20.0, 2);
        timers.clear();
        assert!(timers.is_empty());
        assert!(timers.take_due(f64::MAX).is_empty());
    }
}
