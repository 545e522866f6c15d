//! Alerting System
//!
//! Provides the audible cue interface, a terminal-bell player, and the alarm
//! controller that turns alarm signal transitions into playback requests.

mod cue;
mod manager;

pub use cue::{CueSink, TerminalBell, Tone, CALIBRATION_END_TONE, CALIBRATION_START_TONE};
pub use manager::{AlarmController, AlarmEvent, AlarmSignal};

use thiserror::Error;

/// Alerting error types
#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Audio output failed: {0}")]
    Output(#[from] std::io::Error),

    #[error("Alarm player is not running")]
    PlayerStopped,
}
