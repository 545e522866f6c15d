//! Frame loop driver

use alerting::{AlarmController, AlarmEvent, CueSink};
use camera_capture::FrameSource;
use dms::{DmsError, DmsModule, FrameDisplay, LandmarkDetector, MONITOR_WINDOW};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Outcome of one loop iteration
#[derive(Debug)]
pub enum LoopControl {
    Continue,
    Quit,
    Fatal(DmsError),
}

/// Counters reported when the loop ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Frames that went through detection
    pub frames: u64,
    /// Iterations where no frame was available
    pub skipped: u64,
    /// Processed frames without a face
    pub faceless: u64,
    /// Times the alarm started
    pub alarms: usize,
}

/// Single-threaded monitoring loop: acquire, analyze, alarm, display, poll quit
pub struct Monitor<S, D, V, C>
where
    S: FrameSource,
    D: LandmarkDetector,
    V: FrameDisplay,
    C: CueSink,
{
    source: S,
    dms: DmsModule<D>,
    display: V,
    alarm: AlarmController<C>,
    summary: RunSummary,
}

impl<S, D, V, C> Monitor<S, D, V, C>
where
    S: FrameSource,
    D: LandmarkDetector,
    V: FrameDisplay,
    C: CueSink,
{
    pub fn new(source: S, dms: DmsModule<D>, display: V, cues: C) -> Self {
        Self {
            source,
            dms,
            display,
            alarm: AlarmController::new(cues),
            summary: RunSummary::default(),
        }
    }

    /// Run one iteration
    pub fn step(&mut self) -> LoopControl {
        if !self.source.is_open() {
            info!("Video source closed");
            return LoopControl::Quit;
        }

        match self.source.read_frame() {
            Some(frame) => {
                let analysis = match self.dms.analyze(&frame, Instant::now()) {
                    Ok(analysis) => analysis,
                    Err(e) => return LoopControl::Fatal(e),
                };

                self.summary.frames += 1;
                if !analysis.face_detected() {
                    self.summary.faceless += 1;
                }
                if self.alarm.apply(analysis.monitor.alarm) == Some(AlarmEvent::Started) {
                    self.summary.alarms += 1;
                }

                if let Err(e) = self.display.show(MONITOR_WINDOW, &frame, &analysis.overlay()) {
                    warn!("Display failed: {}", e);
                }
            }
            None => {
                debug!("No frame available, retrying");
                self.summary.skipped += 1;
            }
        }

        if self.display.quit_requested() {
            info!("Quit requested");
            LoopControl::Quit
        } else {
            LoopControl::Continue
        }
    }

    /// Loop until quit or a fatal error, then silence the alarm and release the source
    pub fn run(mut self) -> Result<RunSummary, DmsError> {
        info!("Monitoring started");
        let outcome = loop {
            match self.step() {
                LoopControl::Continue => {}
                LoopControl::Quit => break Ok(self.summary),
                LoopControl::Fatal(e) => {
                    error!("Fatal error: {}", e);
                    break Err(e);
                }
            }
        };

        self.alarm.shutdown();
        self.source.release();
        info!(
            "Monitoring stopped: {} frames, {} skipped, {} without face, {} alarms",
            self.summary.frames, self.summary.skipped, self.summary.faceless, self.summary.alarms
        );
        outcome
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }
}
