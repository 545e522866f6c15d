//! Alarm Controller Implementation

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cue::CueSink;

/// Output signal of the drowsiness state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlarmSignal {
    #[default]
    Silent,
    Sounding,
}

impl AlarmSignal {
    pub fn is_sounding(&self) -> bool {
        matches!(self, AlarmSignal::Sounding)
    }
}

/// Alarm transition produced on a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmEvent {
    Started,
    Stopped,
}

/// Translates alarm signal transitions into playback start/stop requests.
///
/// Playback failures are logged and not retried; the controller still tracks
/// the requested signal so a later transition is not duplicated.
pub struct AlarmController<C: CueSink> {
    sink: C,
    signal: AlarmSignal,
    /// Number of times the alarm was started
    fire_count: usize,
}

impl<C: CueSink> AlarmController<C> {
    /// Create a new controller, initially silent
    pub fn new(sink: C) -> Self {
        Self {
            sink,
            signal: AlarmSignal::Silent,
            fire_count: 0,
        }
    }

    /// Apply the current alarm signal, returning the transition it caused
    pub fn apply(&mut self, signal: AlarmSignal) -> Option<AlarmEvent> {
        if signal == self.signal {
            return None;
        }
        self.signal = signal;

        match signal {
            AlarmSignal::Sounding => {
                self.fire_count += 1;
                info!("Alarm started (count: {})", self.fire_count);
                if let Err(e) = self.sink.start_alarm() {
                    warn!("Failed to start alarm playback: {}", e);
                }
                Some(AlarmEvent::Started)
            }
            AlarmSignal::Silent => {
                info!("Alarm stopped");
                if let Err(e) = self.sink.stop_alarm() {
                    warn!("Failed to stop alarm playback: {}", e);
                }
                Some(AlarmEvent::Stopped)
            }
        }
    }

    /// Stop the alarm if it is sounding
    pub fn shutdown(&mut self) {
        self.apply(AlarmSignal::Silent);
    }

    /// Current signal
    pub fn signal(&self) -> AlarmSignal {
        self.signal
    }

    /// Number of times the alarm was started
    pub fn fire_count(&self) -> usize {
        self.fire_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AlertError, Tone};

    #[derive(Default)]
    struct RecordingSink {
        calls: Vec<&'static str>,
        fail: bool,
    }

    impl CueSink for RecordingSink {
        fn beep(&mut self, _tone: Tone) -> Result<(), AlertError> {
            self.calls.push("beep");
            Ok(())
        }

        fn start_alarm(&mut self) -> Result<(), AlertError> {
            self.calls.push("start");
            if self.fail {
                return Err(AlertError::PlayerStopped);
            }
            Ok(())
        }

        fn stop_alarm(&mut self) -> Result<(), AlertError> {
            self.calls.push("stop");
            Ok(())
        }
    }

    #[test]
    fn test_only_transitions_reach_the_sink() {
        let mut controller = AlarmController::new(RecordingSink::default());

        assert_eq!(controller.apply(AlarmSignal::Silent), None);
        assert_eq!(controller.apply(AlarmSignal::Sounding), Some(AlarmEvent::Started));
        assert_eq!(controller.apply(AlarmSignal::Sounding), None);
        assert_eq!(controller.apply(AlarmSignal::Sounding), None);
        assert_eq!(controller.apply(AlarmSignal::Silent), Some(AlarmEvent::Stopped));
        assert_eq!(controller.apply(AlarmSignal::Silent), None);

        assert_eq!(controller.sink.calls, vec!["start", "stop"]);
        assert_eq!(controller.fire_count(), 1);
    }

    #[test]
    fn test_playback_failure_is_not_retried() {
        let mut controller = AlarmController::new(RecordingSink {
            fail: true,
            ..Default::default()
        });

        assert_eq!(controller.apply(AlarmSignal::Sounding), Some(AlarmEvent::Started));
        assert_eq!(controller.apply(AlarmSignal::Sounding), None);
        assert_eq!(controller.signal(), AlarmSignal::Sounding);
        assert_eq!(controller.sink.calls, vec!["start"]);
    }

    #[test]
    fn test_shutdown_stops_sounding_alarm() {
        let mut controller = AlarmController::new(RecordingSink::default());
        controller.shutdown();
        assert!(controller.sink.calls.is_empty());

        controller.apply(AlarmSignal::Sounding);
        controller.shutdown();
        assert_eq!(controller.sink.calls, vec!["start", "stop"]);
        assert!(!controller.signal().is_sounding());
    }
}
