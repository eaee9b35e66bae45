//! Tab gating with rejection debounce
//!
//! Activating a locked tab is always rejected with [`TabLocked`]. Only the
//! first rejection of a tab inside the debounce window asks the caller to
//! notify the user; later ones in the same window come back with
//! `notify = false`. The window restarts at each notified rejection.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::domain::{reachable_tabs, EventStatus, Tab};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("The {tab} tab is locked while the event is {status}")]
pub struct TabLocked {
    pub tab: Tab,
    pub status: EventStatus,
    /// False when an identical rejection was already notified in the window
    pub notify: bool,
}

#[derive(Debug)]
pub struct TabGate {
    window: Duration,
    last_notified: HashMap<Tab, Instant>,
}

impl TabGate {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_notified: HashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Tries to activate `tab` for an event in `status` at time `now`
    pub fn activate(&mut self, status: EventStatus, tab: Tab, now: Instant) -> Result<Tab, TabLocked> {
        if reachable_tabs(status).contains(&tab) {
            return Ok(tab);
        }

        let notify = match self.last_notified.get(&tab) {
            Some(last) => now.saturating_duration_since(*last) >= self.window,
            None => true,
        };
        if notify {
            self.last_notified.insert(tab, now);
        }

        tracing::debug!(tab = %tab, status = %status, notify, "locked tab rejected");
        Err(TabLocked { tab, status, notify })
    }
}

impl Default for TabGate {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reachable_tab_is_granted() {
        let mut gate = TabGate::default();
        let now = Instant::now();

        assert_eq!(gate.activate(EventStatus::Draft, Tab::Overview, now), Ok(Tab::Overview));
        assert_eq!(gate.activate(EventStatus::Planning, Tab::Tasks, now), Ok(Tab::Tasks));
    }

    #[test]
    fn locked_tab_is_rejected_not_ignored() {
        let mut gate = TabGate::default();
        let err = gate
            .activate(EventStatus::Draft, Tab::Documents, Instant::now())
            .unwrap_err();

        assert_eq!(err.tab, Tab::Documents);
        assert!(err.notify);
    }

    #[test]
    fn repeated_rejections_inside_window_are_suppressed() {
        let mut gate = TabGate::new(Duration::from_millis(1000));
        let start = Instant::now();

        let first = gate.activate(EventStatus::Draft, Tab::Tasks, start).unwrap_err();
        let second = gate
            .activate(EventStatus::Draft, Tab::Tasks, start + Duration::from_millis(300))
            .unwrap_err();
        let third = gate
            .activate(EventStatus::Draft, Tab::Tasks, start + Duration::from_millis(999))
            .unwrap_err();

        assert!(first.notify);
        assert!(!second.notify);
        assert!(!third.notify);
    }

    #[test]
    fn rejection_after_window_notifies_again() {
        let mut gate = TabGate::new(Duration::from_millis(1000));
        let start = Instant::now();

        gate.activate(EventStatus::Draft, Tab::Tasks, start).unwrap_err();
        let later = gate
            .activate(EventStatus::Draft, Tab::Tasks, start + Duration::from_millis(1000))
            .unwrap_err();

        assert!(later.notify);
    }

    #[test]
    fn different_tabs_are_debounced_separately() {
        let mut gate = TabGate::default();
        let now = Instant::now();

        assert!(gate.activate(EventStatus::Draft, Tab::Tasks, now).unwrap_err().notify);
        assert!(gate.activate(EventStatus::Draft, Tab::Documents, now).unwrap_err().notify);
    }
}
