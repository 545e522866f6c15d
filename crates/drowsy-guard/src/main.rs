//! Drowsiness Alert - Main Entry Point

use clap::Parser;
use camera_capture::SourceKind;
use drowsy_guard::{init_logging, run, AppConfig, DisplayMode, QuitSignal};
use std::path::PathBuf;
use tracing::{info, Level};

/// Webcam drowsiness alert
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Capture device index
    #[arg(short, long)]
    device: Option<i32>,

    /// Play back a directory of frames instead of the webcam
    #[arg(short, long)]
    frames: Option<PathBuf>,

    /// Face-mesh ONNX model
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Run without a window
    #[arg(long)]
    headless: bool,

    /// Write annotated frames to this directory (headless)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TrueType font for overlay text
    #[arg(long)]
    font: Option<PathBuf>,

    /// Playback rate (0 = as fast as possible)
    #[arg(long)]
    fps: Option<u32>,

    /// Loop the frame sequence
    #[arg(long = "loop")]
    loop_playback: bool,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON logs
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn apply(self, config: &mut AppConfig) {
        if let Some(device) = self.device {
            config.camera.source = SourceKind::Webcam;
            config.camera.device = device;
        }
        if let Some(frames) = self.frames {
            config.camera.source = SourceKind::Frames;
            config.camera.frames_dir = frames;
        }
        if let Some(fps) = self.fps {
            config.camera.fps = fps;
        }
        if self.loop_playback {
            config.camera.loop_playback = true;
        }
        if let Some(model) = self.model {
            config.dms.model_path = Some(model);
        }
        if self.headless {
            config.display.mode = DisplayMode::Headless;
        }
        if let Some(output) = self.output {
            config.display.output_dir = Some(output);
        }
        if let Some(font) = self.font {
            config.display.font_path = Some(font);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(if cli.verbose { Level::DEBUG } else { Level::INFO }, cli.log_json);

    info!("=== Drowsy Guard v{} ===", env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    let quit = QuitSignal::new();
    quit.listen_ctrl_c();
    match config.display.mode {
        DisplayMode::Window => info!("Press \"q\" in the window (or Ctrl-C) to quit"),
        DisplayMode::Headless => {
            quit.listen_stdin();
            info!("Type \"q\" and Enter (or press Ctrl-C) to quit");
        }
    }

    // The frame loop blocks; keep it off the async workers
    let summary = tokio::task::block_in_place(|| run(&config, quit))?;
    info!("Session finished: {:?}", summary);

    Ok(())
}
