/// Suppression of repeated alerts.
///
/// The evaluator fires on every tick for as long as a condition holds. At a
/// 150 ms cadence that is several identical rows per second, so writers may
/// run events through an `AlertDeduplicator` first. A window of zero admits
/// everything, which matches logging every fired rule.

use std::collections::VecDeque;

use crate::model::{AlertEvent, AlertSeverity};

/// Suppresses an event whose severity and message equal one of the last
/// `window` admitted events.
#[derive(Debug, Clone)]
pub struct AlertDeduplicator {
    window: usize,
    recent: VecDeque<(AlertSeverity, String)>,
}

impl AlertDeduplicator {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            recent: VecDeque::with_capacity(window),
        }
    }

    /// Disabled policy: every event is admitted.
    pub fn disabled() -> Self {
        Self::new(0)
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Returns `true` if the event should be persisted, and records it.
    pub fn admit(&mut self, event: &AlertEvent) -> bool {
        if self.window == 0 {
            return true;
        }

        let duplicate = self
            .recent
            .iter()
            .any(|(severity, message)| *severity == event.severity && *message == event.message);
        if duplicate {
            return false;
        }

        if self.recent.len() == self.window {
            self.recent.pop_front();
        }
        self.recent.push_back((event.severity, event.message.clone()));
        true
    }

    /// Filters a tick's events down to the admitted ones, preserving order.
    pub fn filter(&mut self, events: Vec<AlertEvent>) -> (Vec<AlertEvent>, usize) {
        let total = events.len();
        let admitted: Vec<_> = events.into_iter().filter(|e| self.admit(e)).collect();
        let suppressed = total - admitted.len();
        (admitted, suppressed)
    }
}
