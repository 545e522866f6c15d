//! Audible cues

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use crate::AlertError;

/// A short fixed-frequency tone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tone {
    /// Frequency in Hz
    pub frequency_hz: u32,
    /// Tone length in milliseconds
    pub duration_ms: u64,
}

impl Tone {
    pub const fn new(frequency_hz: u32, duration_ms: u64) -> Self {
        Self {
            frequency_hz,
            duration_ms,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Played when calibration starts
pub const CALIBRATION_START_TONE: Tone = Tone::new(1000, 300);

/// Played when calibration ends
pub const CALIBRATION_END_TONE: Tone = Tone::new(800, 300);

/// Audible cue output.
///
/// `beep` blocks for the length of the tone. `start_alarm` and `stop_alarm`
/// return immediately; the alarm keeps sounding in the background until stopped.
pub trait CueSink {
    /// Play a short tone synchronously
    fn beep(&mut self, tone: Tone) -> Result<(), AlertError>;

    /// Start the looping alert tone
    fn start_alarm(&mut self) -> Result<(), AlertError>;

    /// Stop the looping alert tone
    fn stop_alarm(&mut self) -> Result<(), AlertError>;
}

impl<C: CueSink + ?Sized> CueSink for &mut C {
    fn beep(&mut self, tone: Tone) -> Result<(), AlertError> {
        (**self).beep(tone)
    }

    fn start_alarm(&mut self) -> Result<(), AlertError> {
        (**self).start_alarm()
    }

    fn stop_alarm(&mut self) -> Result<(), AlertError> {
        (**self).stop_alarm()
    }
}

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

const BELL: &[u8] = b"\x07";

/// Interval between bell pulses while the alarm sounds
const ALARM_PULSE: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayerCommand {
    Start,
    Stop,
}

/// Cue sink ringing the terminal bell (ASCII BEL).
///
/// The looping alarm runs on a dedicated player thread so the frame loop never
/// waits on audio output.
pub struct TerminalBell {
    writer: SharedWriter,
    commands: mpsc::UnboundedSender<PlayerCommand>,
}

impl TerminalBell {
    /// Ring the bell on stdout
    pub fn stdout() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    /// Ring the bell on an arbitrary writer
    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self::spawn(Arc::new(Mutex::new(writer)), ALARM_PULSE)
    }

    fn spawn(writer: SharedWriter, pulse: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let player_writer = writer.clone();
        std::thread::spawn(move || run_player(rx, player_writer, pulse));
        info!("Terminal bell alarm player started");
        Self {
            writer,
            commands: tx,
        }
    }

    fn send(&self, command: PlayerCommand) -> Result<(), AlertError> {
        self.commands
            .send(command)
            .map_err(|_| AlertError::PlayerStopped)
    }
}

impl CueSink for TerminalBell {
    fn beep(&mut self, tone: Tone) -> Result<(), AlertError> {
        debug!("Beep {} Hz for {} ms", tone.frequency_hz, tone.duration_ms);
        ring(&self.writer)?;
        std::thread::sleep(tone.duration());
        Ok(())
    }

    fn start_alarm(&mut self) -> Result<(), AlertError> {
        self.send(PlayerCommand::Start)
    }

    fn stop_alarm(&mut self) -> Result<(), AlertError> {
        self.send(PlayerCommand::Stop)
    }
}

fn ring(writer: &SharedWriter) -> Result<(), AlertError> {
    // A poisoned lock only means another ring panicked mid-write
    let mut out = writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    out.write_all(BELL)?;
    out.flush()?;
    Ok(())
}

fn run_player(
    mut commands: mpsc::UnboundedReceiver<PlayerCommand>,
    writer: SharedWriter,
    pulse: Duration,
) {
    let mut sounding = false;

    loop {
        let command = if sounding {
            match commands.try_recv() {
                Ok(command) => Some(command),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => break,
            }
        } else {
            match commands.blocking_recv() {
                Some(command) => Some(command),
                None => break,
            }
        };

        match command {
            Some(PlayerCommand::Start) => sounding = true,
            Some(PlayerCommand::Stop) => sounding = false,
            None => {}
        }

        if sounding {
            if let Err(e) = ring(&writer) {
                warn!("Alarm pulse failed: {}", e);
            }
            std::thread::sleep(pulse);
        }
    }

    debug!("Alarm player stopped");
}
