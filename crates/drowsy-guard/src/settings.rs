//! Application configuration

use camera_capture::CameraConfig;
use config::{Config, ConfigError, Environment, File};
use dms::DmsConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix, e.g. `DROWSY_DMS__OPEN_GRACE_MS=4000`
pub const ENV_PREFIX: &str = "DROWSY";

/// Where annotated frames go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// On-screen window with keyboard quit
    Window,
    /// Optional PNG output, quit from stdin or Ctrl-C
    Headless,
}

impl Default for DisplayMode {
    /// A window when GUI support is compiled in
    fn default() -> Self {
        if cfg!(feature = "gui") {
            DisplayMode::Window
        } else {
            DisplayMode::Headless
        }
    }
}

/// Display configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub mode: DisplayMode,
    /// Directory receiving annotated frames (nothing is written when unset)
    pub output_dir: Option<PathBuf>,
    /// TrueType font used to draw overlay text
    pub font_path: Option<PathBuf>,
}

/// Full application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub camera: CameraConfig,
    pub dms: DmsConfig,
    pub display: DisplayConfig,
}

impl AppConfig {
    /// Load defaults, then the optional config file, then `DROWSY_*` environment variables.
    ///
    /// Environment values stay strings and are converted by the target field's type,
    /// so a path such as `007` is not read as a number.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    fn load_with_prefix(path: Option<&Path>, prefix: &str) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        builder
            .add_source(
                Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_sources() {
        let config = AppConfig::load_with_prefix(None, "DROWSY_TEST_UNSET").unwrap();

        assert_eq!(config.dms.closed_alarm_ms, 3000);
        assert_eq!(config.dms.open_grace_ms, 5000);
        assert_eq!(config.dms.calibration_ms, 3000);
        assert_eq!(config.dms.threshold_margin, 2.0);
        assert_eq!(config.camera.frames_dir, PathBuf::from("frames"));
        assert!(config.display.output_dir.is_none());
        assert_eq!(config.display.mode, DisplayMode::default());
    }

    #[test]
    fn test_file_then_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drowsy.toml");
        std::fs::write(
            &path,
            r#"
[camera]
frames_dir = "/data/session-1"
fps = 30

[dms]
open_grace_ms = 4000
model_path = "/models/face_mesh.onnx"
model_layout = "nchw"
"#,
        )
        .unwrap();

        std::env::set_var("DROWSY_FILETEST_DMS__OPEN_GRACE_MS", "2500");
        let config = AppConfig::load_with_prefix(Some(&path), "DROWSY_FILETEST").unwrap();
        std::env::remove_var("DROWSY_FILETEST_DMS__OPEN_GRACE_MS");

        assert_eq!(config.camera.frames_dir, PathBuf::from("/data/session-1"));
        assert_eq!(config.camera.fps, 30);
        assert!(!config.camera.loop_playback);
        assert_eq!(config.dms.open_grace_ms, 2500);
        assert_eq!(config.dms.closed_alarm_ms, 3000);
        assert_eq!(config.dms.model_layout, dms::TensorLayout::Nchw);
        assert_eq!(
            config.dms.model_path.as_deref(),
            Some(Path::new("/models/face_mesh.onnx"))
        );
    }

    #[test]
    fn test_environment_values_follow_field_types() {
        let vars = [
            ("DROWSY_ENVTYPES_DMS__MODEL_PATH", "007"),
            ("DROWSY_ENVTYPES_CAMERA__FRAMES_DIR", "1.0"),
            ("DROWSY_ENVTYPES_CAMERA__FPS", "25"),
            ("DROWSY_ENVTYPES_CAMERA__LOOP_PLAYBACK", "true"),
            ("DROWSY_ENVTYPES_DMS__THRESHOLD_MARGIN", "1.5"),
            ("DROWSY_ENVTYPES_DISPLAY__MODE", "headless"),
        ];
        for (key, value) in vars {
            std::env::set_var(key, value);
        }
        let config = AppConfig::load_with_prefix(None, "DROWSY_ENVTYPES");
        for (key, _) in vars {
            std::env::remove_var(key);
        }
        let config = config.unwrap();

        assert_eq!(config.dms.model_path.as_deref(), Some(Path::new("007")));
        assert_eq!(config.camera.frames_dir, PathBuf::from("1.0"));
        assert_eq!(config.camera.fps, 25);
        assert!(config.camera.loop_playback);
        assert_eq!(config.dms.threshold_margin, 1.5);
        assert_eq!(config.display.mode, DisplayMode::Headless);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = AppConfig::load_with_prefix(Some(Path::new("/nonexistent/drowsy.toml")), "DROWSY_TEST_UNSET");
        assert!(result.is_err());
    }
}
