//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{SpeedrampError, SpeedrampResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Output geometry and audio format handed to ffmpeg.
    pub render: RenderDefaults,

    /// Timeline defaults.
    pub timeline: TimelineDefaults,

    /// Helper programs referenced by generated artifacts.
    pub tools: ToolPaths,

    /// Names of the generated artifact files.
    pub artifacts: ArtifactNames,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default rendering parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderDefaults {
    /// Output width in pixels.
    pub width: u32,

    /// Output height in pixels.
    pub height: u32,

    /// Sample rate of the generated sound stream.
    pub audio_sample_rate: u32,

    /// Channel count of the generated sound stream.
    pub audio_channels: u32,
}

/// Timeline defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineDefaults {
    /// Speed applied to footage not covered by any override.
    ///
    /// Expressed as output seconds per input second, so `1/3` plays
    /// three times faster than real time.
    pub default_speed: f64,
}

/// Locations of the helper programs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    /// Directory holding the helpers. Defaults to `build/` next to the executable.
    pub helper_dir: Option<PathBuf>,

    /// Overlay renderer used as the interpreter of the overlay script.
    pub overlay_renderer: String,

    /// Sound mixer invoked by the sound script.
    pub sound_generator: String,

    /// Generator producing the raw logo clip.
    pub logo_generator: String,

    /// Sound played under the logo clip. Relative to the executable directory.
    pub logo_sound: String,
}

/// File names of the generated artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactNames {
    pub sound_script: String,
    pub overlay_script: String,
    pub gpx_file: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "speedramp=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            audio_sample_rate: 48000,
            audio_channels: 2,
        }
    }
}

impl Default for TimelineDefaults {
    fn default() -> Self {
        Self {
            default_speed: 1.0 / 3.0,
        }
    }
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            helper_dir: None,
            overlay_renderer: "flootay".to_string(),
            sound_generator: "generate-sound".to_string(),
            logo_generator: "generate-logo".to_string(),
            logo_sound: "logo-sound.flac".to_string(),
        }
    }
}

impl Default for ArtifactNames {
    fn default() -> Self {
        Self {
            sound_script: "sound.sh".to_string(),
            overlay_script: "scores.flt".to_string(),
            gpx_file: "speed.gpx".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Reject settings no render can be built from.
    pub fn validate(&self) -> SpeedrampResult<()> {
        let speed = self.timeline.default_speed;
        if !(speed.is_finite() && speed > 0.0) {
            return Err(SpeedrampError::config(format!(
                "timeline.default_speed must be a positive number, got {speed}"
            )));
        }

        for (key, value) in [
            ("render.width", self.render.width),
            ("render.height", self.render.height),
            ("render.audio_sample_rate", self.render.audio_sample_rate),
            ("render.audio_channels", self.render.audio_channels),
        ] {
            if value == 0 {
                return Err(SpeedrampError::config(format!("{key} must be positive")));
            }
        }

        for (key, name) in [
            ("artifacts.sound_script", &self.artifacts.sound_script),
            ("artifacts.overlay_script", &self.artifacts.overlay_script),
        ] {
            if name.is_empty() || name.contains('/') {
                return Err(SpeedrampError::config(format!(
                    "{key} must be a plain file name, got {name:?}"
                )));
            }
        }

        Ok(())
    }
}

impl ToolPaths {
    /// Directory the helper programs live in.
    pub fn helper_dir(&self) -> PathBuf {
        self.helper_dir
            .clone()
            .unwrap_or_else(|| executable_dir().join("build"))
    }

    pub fn overlay_renderer_path(&self) -> PathBuf {
        self.helper_dir().join(&self.overlay_renderer)
    }

    pub fn sound_generator_path(&self) -> PathBuf {
        self.helper_dir().join(&self.sound_generator)
    }

    pub fn logo_generator_path(&self) -> PathBuf {
        self.helper_dir().join(&self.logo_generator)
    }

    pub fn logo_sound_path(&self) -> PathBuf {
        executable_dir().join(&self.logo_sound)
    }
}

/// Directory containing the running executable, or `.` when unknown.
fn executable_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("speedramp").join("config.json")
}
