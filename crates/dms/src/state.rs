//! Drowsiness state tracking

use alerting::{AlarmEvent, AlarmSignal};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::DmsConfig;

/// Eye state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EyeState {
    #[default]
    Open,
    Closed,
}

/// Monitor output for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorSnapshot {
    pub state: EyeState,
    /// Time spent in the current eyes-closed run (zero while open)
    pub closed_for: Duration,
    /// Time spent in the current eyes-open run (zero while closed)
    pub open_for: Duration,
    pub alarm: AlarmSignal,
    /// Alarm transition caused by this tick
    pub event: Option<AlarmEvent>,
}

/// Two-state eye monitor with debounced alarm.
///
/// Each tick with a sample compares it against the calibrated threshold. Entering a
/// state restarts its clock and zeroes the other state's duration. The alarm starts
/// once the closed run strictly exceeds `closed_alarm_after` and stops once the open
/// run strictly exceeds `open_grace`. Ticks without a sample change nothing.
#[derive(Debug, Clone)]
pub struct DrowsinessMonitor {
    threshold: f64,
    closed_alarm_after: Duration,
    open_grace: Duration,
    state: EyeState,
    state_started: Instant,
    closed_for: Duration,
    open_for: Duration,
    alarm: AlarmSignal,
}

impl DrowsinessMonitor {
    /// Create a monitor starting in the open state at `now`
    pub fn new(threshold: f64, config: &DmsConfig, now: Instant) -> Self {
        Self::with_limits(threshold, config.closed_alarm_after(), config.open_grace(), now)
    }

    pub fn with_limits(
        threshold: f64,
        closed_alarm_after: Duration,
        open_grace: Duration,
        now: Instant,
    ) -> Self {
        Self {
            threshold,
            closed_alarm_after,
            open_grace,
            state: EyeState::Open,
            state_started: now,
            closed_for: Duration::ZERO,
            open_for: Duration::ZERO,
            alarm: AlarmSignal::Silent,
        }
    }

    /// Advance the monitor by one frame
    pub fn tick(&mut self, sample: Option<f64>, now: Instant) -> MonitorSnapshot {
        let Some(eye_height) = sample else {
            return self.snapshot();
        };

        let target = if eye_height < self.threshold {
            EyeState::Closed
        } else {
            EyeState::Open
        };

        if target != self.state {
            debug!("Eye state {:?} -> {:?} (height {:.2})", self.state, target, eye_height);
            self.state = target;
            self.state_started = now;
            match target {
                EyeState::Closed => self.open_for = Duration::ZERO,
                EyeState::Open => self.closed_for = Duration::ZERO,
            }
        }

        let elapsed = now.saturating_duration_since(self.state_started);
        let mut event = None;

        match self.state {
            EyeState::Closed => {
                self.closed_for = elapsed;
                if self.closed_for > self.closed_alarm_after && !self.alarm.is_sounding() {
                    info!("Eyes closed for {:.2}s, raising alarm", self.closed_for.as_secs_f64());
                    self.alarm = AlarmSignal::Sounding;
                    event = Some(AlarmEvent::Started);
                }
            }
            EyeState::Open => {
                self.open_for = elapsed;
                if self.open_for > self.open_grace && self.alarm.is_sounding() {
                    info!("Eyes open for {:.2}s, clearing alarm", self.open_for.as_secs_f64());
                    self.alarm = AlarmSignal::Silent;
                    event = Some(AlarmEvent::Stopped);
                }
            }
        }

        MonitorSnapshot {
            event,
            ..self.snapshot()
        }
    }

    /// Current state without advancing
    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            state: self.state,
            closed_for: self.closed_for,
            open_for: self.open_for,
            alarm: self.alarm,
            event: None,
        }
    }

    /// Return to the initial open state at `now`, keeping the threshold
    pub fn reset(&mut self, now: Instant) {
        *self = Self::with_limits(self.threshold, self.closed_alarm_after, self.open_grace, now);
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn state(&self) -> EyeState {
        self.state
    }

    /// When the current state began
    pub fn state_started(&self) -> Instant {
        self.state_started
    }

    pub fn alarm(&self) -> AlarmSignal {
        self.alarm
    }
}
