/// Hand-off point for the camera / object-detection collaborator.
///
/// The detector runs on its own thread at camera cadence and publishes its
/// latest result here. The simulation driver reads it once per tick: the
/// float count is sticky (the most recent count applies until replaced),
/// while an alert text is delivered to exactly one tick.

use std::sync::{Mutex, PoisonError};

/// What the vision collaborator reports per camera frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisionObservation {
    pub float_count: u32,
    pub alert_text: Option<String>,
}

#[derive(Debug, Default)]
pub struct VisionFeed {
    latest: Mutex<VisionObservation>,
}

impl VisionFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the latest observation. An empty alert text counts as none.
    pub fn publish(&self, observation: VisionObservation) {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        latest.float_count = observation.float_count;
        if let Some(text) = observation.alert_text.filter(|t| !t.trim().is_empty()) {
            latest.alert_text = Some(text);
        }
    }

    /// Current float count plus any pending alert text, which is consumed.
    pub fn take(&self) -> (u32, Option<String>) {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        (latest.float_count, latest.alert_text.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_feed_reports_zero_floats() {
        let feed = VisionFeed::new();
        assert_eq!(feed.take(), (0, None));
    }

    #[test]
    fn test_float_count_is_sticky_and_alert_is_consumed_once() {
        let feed = VisionFeed::new();
        feed.publish(VisionObservation {
            float_count: 3,
            alert_text: Some("debris near gauge".to_string()),
        });
        assert_eq!(feed.take(), (3, Some("debris near gauge".to_string())));
        assert_eq!(feed.take(), (3, None));
    }

    #[test]
    fn test_blank_alert_text_is_ignored() {
        let feed = VisionFeed::new();
        feed.publish(VisionObservation {
            float_count: 1,
            alert_text: Some("   ".to_string()),
        });
        assert_eq!(feed.take(), (1, None));
    }
}
