//! Sound sequencing on the output timeline.
//!
//! Sound cues never mix: each one must start after the previous one has
//! finished playing. Gaps between them are filled with silence so the
//! sound generator can be driven from a flat list.

use serde::Serialize;
use speedramp_common::error::{SpeedrampError, SpeedrampResult};
use speedramp_project_model::{MediaTable, Script};

use crate::plan::RetimePlan;

/// A stretch of the soundtrack: a sound file, or silence when `file` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoundClip {
    pub file: Option<String>,
    pub length_secs: f64,
}

/// A sound file started at an output position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoundPlacement {
    pub position_secs: f64,
    pub file: String,
}

/// The sequenced soundtrack.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SoundTrack {
    pub clips: Vec<SoundClip>,
}

impl SoundTrack {
    /// Start positions of the sound files, skipping silence.
    pub fn placements(&self) -> Vec<SoundPlacement> {
        let mut position = 0.0;
        let mut placements = Vec::new();

        for clip in &self.clips {
            if let Some(file) = &clip.file {
                placements.push(SoundPlacement {
                    position_secs: position,
                    file: file.clone(),
                });
            }
            position += clip.length_secs;
        }

        placements
    }

    /// Output time at which the last sound stops.
    pub fn end_secs(&self) -> f64 {
        self.clips.iter().map(|clip| clip.length_secs).sum()
    }
}

/// Sequence every sound cue of `script`, clip by clip in declaration order.
///
/// Sound lengths come from `media`, which must hold probed durations.
pub fn sequence_sounds(
    script: &Script,
    plan: &RetimePlan,
    media: &MediaTable,
) -> SpeedrampResult<SoundTrack> {
    let mut track = SoundTrack::default();
    let mut cursor = 0.0;
    let mut previous: Option<&str> = None;

    for clip in &script.clips {
        for sound in &clip.sounds {
            let position = plan.output_time(&clip.media, sound.start_secs)?;

            if let Some(previous) = previous {
                if position < cursor {
                    return Err(SpeedrampError::Overlap {
                        previous: previous.to_string(),
                        next: sound.file.clone(),
                        overlap_secs: cursor - position,
                    });
                }
            }

            if position > cursor {
                track.clips.push(SoundClip {
                    file: None,
                    length_secs: position - cursor,
                });
            }

            let length_secs = media.duration_secs(&sound.file)?;
            track.clips.push(SoundClip {
                file: Some(sound.file.clone()),
                length_secs,
            });

            tracing::debug!(file = %sound.file, position, length_secs, "Placed sound");

            cursor = position + length_secs;
            previous = Some(&sound.file);
        }
    }

    Ok(track)
}
