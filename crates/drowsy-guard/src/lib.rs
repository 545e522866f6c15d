//! Drowsiness Alert Application
//!
//! Wires the camera source, face-mesh detector, calibration, drowsiness monitor,
//! overlay renderer and alarm into one frame loop.

pub mod input;
pub mod render;
pub mod runner;
pub mod settings;
#[cfg(feature = "gui")]
pub mod window;

pub use input::QuitSignal;
pub use render::ImageDisplay;
pub use runner::{LoopControl, Monitor, RunSummary};
pub use settings::{AppConfig, DisplayConfig, DisplayMode};
#[cfg(feature = "gui")]
pub use window::HighGuiDisplay;

use alerting::TerminalBell;
use anyhow::Context;
use camera_capture::{CameraConfig, FrameSource, ImageSequenceSource, SourceKind};
use dms::{calibrate, DmsModule, FaceMeshDetector, FrameDisplay};
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Initialize logging
pub fn init_logging(level: Level, json: bool) {
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())
            .expect("Failed to set tracing subscriber");
    } else {
        tracing::subscriber::set_global_default(builder.finish())
            .expect("Failed to set tracing subscriber");
    }
}

/// Calibrate, then monitor until quit, end of stream, or a fatal error
pub fn run(config: &AppConfig, quit: QuitSignal) -> anyhow::Result<RunSummary> {
    let mut source = open_source(&config.camera).context("opening video source")?;
    let mut detector = FaceMeshDetector::new(&config.dms).context("loading face-mesh model")?;
    let mut display = open_display(&config.display, quit).context("setting up display")?;
    let mut bell = TerminalBell::stdout();

    let calibration = match calibrate(
        &mut source,
        &mut detector,
        &mut display,
        &mut bell,
        config.dms.calibration_duration(),
    ) {
        Ok(calibration) => calibration,
        Err(e) => {
            source.release();
            return Err(e).context("calibration failed");
        }
    };

    if calibration.samples == 0 {
        warn!("Threshold rests on an empty calibration; every face frame will read as eyes closed");
    }
    if calibration.cancelled {
        info!("Continuing with the partial calibration");
    }

    let dms = DmsModule::new(&config.dms, detector, &calibration, Instant::now());
    let summary = Monitor::new(source, dms, display, bell)
        .run()
        .context("monitoring stopped")?;
    Ok(summary)
}

/// Open the configured frame source
pub fn open_source(config: &CameraConfig) -> anyhow::Result<Box<dyn FrameSource>> {
    match config.source {
        SourceKind::Frames => Ok(Box::new(ImageSequenceSource::open(config)?)),
        #[cfg(feature = "gui")]
        SourceKind::Webcam => Ok(Box::new(camera_capture::WebcamSource::open(config)?)),
        #[cfg(not(feature = "gui"))]
        SourceKind::Webcam => anyhow::bail!(
            "webcam capture is not compiled in; rebuild with `--features gui` or set camera.source = \"frames\""
        ),
    }
}

/// Open the configured display
pub fn open_display(config: &DisplayConfig, quit: QuitSignal) -> anyhow::Result<Box<dyn FrameDisplay>> {
    match config.mode {
        DisplayMode::Headless => Ok(Box::new(ImageDisplay::new(config, quit)?)),
        #[cfg(feature = "gui")]
        DisplayMode::Window => Ok(Box::new(HighGuiDisplay::new(quit))),
        #[cfg(not(feature = "gui"))]
        DisplayMode::Window => anyhow::bail!(
            "window display is not compiled in; rebuild with `--features gui` or set display.mode = \"headless\""
        ),
    }
}
