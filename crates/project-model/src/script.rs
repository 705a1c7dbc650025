//! Editing script types.
//!
//! A script is the parsed form of the editing file: clips in timeline
//! order and the annotations that hang off them. Times are raw media
//! time of the owning clip's source; translating them onto the
//! concatenated timeline is the job of the processing core.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::media::{MediaKind, MediaTable};

/// A trimmed window of a raw media source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Filename of the raw media.
    pub media: String,

    /// Trim start in raw media time.
    pub start_secs: f64,

    /// Trim end in raw media time; `None` plays to the natural end.
    pub end_secs: Option<f64>,

    /// Sounds placed relative to this clip's raw time.
    #[serde(default)]
    pub sounds: Vec<SoundCue>,

    /// Raw overlay script lines from a `{{ ... }}` block.
    #[serde(default)]
    pub overlay_script: Vec<String>,

    /// Extra ffmpeg filters applied before scaling.
    #[serde(default)]
    pub filters: Vec<String>,

    /// Whether telemetry keyframes are generated for this clip.
    pub use_gpx: bool,
}

impl Clip {
    pub fn new(media: impl Into<String>, start_secs: f64, end_secs: Option<f64>) -> Self {
        let media = media.into();
        let use_gpx = MediaKind::classify(&media) == MediaKind::Footage;
        Self {
            media,
            start_secs,
            end_secs,
            sounds: Vec::new(),
            overlay_script: Vec::new(),
            filters: Vec::new(),
            use_gpx,
        }
    }

    pub fn kind(&self) -> MediaKind {
        MediaKind::classify(&self.media)
    }

    pub fn is_generator(&self) -> bool {
        self.kind() == MediaKind::Generator
    }

    pub fn is_image(&self) -> bool {
        self.kind() == MediaKind::Image
    }
}

/// A sound file started at a raw time of its clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundCue {
    pub start_secs: f64,
    pub file: String,
}

/// Request to play `[start, start + length)` of a media item at `speed`.
///
/// `speed` is output seconds per input second: `1.0` is real time,
/// `1/3` plays three times faster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedOverride {
    pub media: String,
    pub start_secs: f64,
    pub length_secs: f64,
    pub speed: f64,
}

/// A change to the running score at a raw time of a clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreDelta {
    /// Index of the owning clip.
    pub clip: usize,
    pub time_secs: f64,
    pub delta: i64,
}

/// An SVG shown from a raw time of a clip for `length_secs` of output time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvgOverlay {
    /// Index of the owning clip.
    pub clip: usize,
    pub file: String,
    pub start_secs: f64,
    pub length_secs: f64,
}

/// A parsed editing script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub clips: Vec<Clip>,
    pub scores: Vec<ScoreDelta>,
    pub svgs: Vec<SvgOverlay>,
    pub speed_overrides: Vec<SpeedOverride>,

    /// Unix time at raw time zero, keyed by footage basename.
    pub gpx_offsets: BTreeMap<String, f64>,

    pub show_elevation: bool,
    pub show_map: bool,

    /// Extra arguments for the sound generator.
    pub sound_args: Vec<String>,

    /// Speed for footage not covered by an override, when set by the script.
    pub default_speed: Option<f64>,
}

impl Script {
    /// Register every referenced media file in `table`.
    pub fn register_media(&self, table: &mut MediaTable) {
        for clip in &self.clips {
            table.entry(&clip.media);
            for sound in &clip.sounds {
                table.entry(&sound.file);
            }
        }
    }

    /// Build a fresh media table holding every referenced file.
    pub fn media_table(&self) -> MediaTable {
        let mut table = MediaTable::new();
        self.register_media(&mut table);
        table
    }

    /// Total number of sound cues across all clips.
    pub fn sound_count(&self) -> usize {
        self.clips.iter().map(|clip| clip.sounds.len()).sum()
    }
}
