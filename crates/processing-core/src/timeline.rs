//! The concatenated input timeline.
//!
//! Clips are laid end to end in declaration order. A clip's offset on the
//! input timeline is the sum of the trimmed lengths of all clips before it.

use serde::Serialize;
use speedramp_common::error::{SpeedrampError, SpeedrampResult};
use speedramp_project_model::{MediaTable, Script};

/// One clip placed on the input timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClipSpan {
    /// Index of the clip in the script.
    pub clip: usize,

    /// Filename of the raw media.
    pub media: String,

    /// Trim start in raw media time.
    pub start_secs: f64,

    /// Trim end in raw media time, resolved against the natural length.
    pub end_secs: f64,

    /// Where the clip begins on the input timeline.
    pub input_offset_secs: f64,
}

impl ClipSpan {
    pub fn length_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }

    pub fn input_end_secs(&self) -> f64 {
        self.input_offset_secs + self.length_secs()
    }

    /// Whether raw time `raw_secs` of `media` falls inside this clip's window.
    pub fn contains(&self, media: &str, raw_secs: f64) -> bool {
        self.media == media && raw_secs >= self.start_secs && raw_secs < self.end_secs
    }
}

/// Clips of a script laid out on the input timeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InputTimeline {
    spans: Vec<ClipSpan>,
    total_secs: f64,
}

impl InputTimeline {
    /// Lay out the clips of `script`, taking natural lengths from `media`.
    pub fn build(script: &Script, media: &MediaTable) -> SpeedrampResult<Self> {
        let mut spans = Vec::with_capacity(script.clips.len());
        let mut offset = 0.0;

        for (idx, clip) in script.clips.iter().enumerate() {
            let end_secs = match clip.end_secs {
                Some(end) => end,
                None => media.duration_secs(&clip.media)?,
            };

            if end_secs <= clip.start_secs {
                return Err(SpeedrampError::invalid_timeline(format!(
                    "clip {} of {} starts at {} but ends at {}",
                    idx + 1,
                    clip.media,
                    clip.start_secs,
                    end_secs
                )));
            }

            let span = ClipSpan {
                clip: idx,
                media: clip.media.clone(),
                start_secs: clip.start_secs,
                end_secs,
                input_offset_secs: offset,
            };
            offset += span.length_secs();
            spans.push(span);
        }

        tracing::debug!(clips = spans.len(), total_secs = offset, "Built input timeline");

        Ok(Self {
            spans,
            total_secs: offset,
        })
    }

    pub fn spans(&self) -> &[ClipSpan] {
        &self.spans
    }

    pub fn span(&self, clip: usize) -> Option<&ClipSpan> {
        self.spans.get(clip)
    }

    /// Total input duration in seconds.
    pub fn total_secs(&self) -> f64 {
        self.total_secs
    }

    /// Locate raw time `raw_secs` of `media` on the input timeline.
    ///
    /// The first clip in declaration order whose media matches and whose
    /// trim window contains the time wins.
    pub fn to_input(&self, media: &str, raw_secs: f64) -> SpeedrampResult<f64> {
        self.spans
            .iter()
            .find(|span| span.contains(media, raw_secs))
            .map(|span| span.input_offset_secs + (raw_secs - span.start_secs))
            .ok_or_else(|| {
                SpeedrampError::mapping(format!(
                    "couldn't find input time in {media} at {raw_secs}"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speedramp_project_model::{Clip, MediaInfo};

    fn fixture() -> (Script, MediaTable) {
        let script = Script {
            clips: vec![
                Clip::new("a.mp4", 10.0, Some(20.0)),
                Clip::new("b.mp4", 0.0, None),
                Clip::new("a.mp4", 30.0, None),
            ],
            ..Script::default()
        };
        let mut media = script.media_table();
        media.record_probe("a.mp4", MediaInfo::with_duration(40.0));
        media.record_probe("b.mp4", MediaInfo::with_duration(5.0));
        (script, media)
    }

    #[test]
    fn test_offsets_accumulate_trimmed_lengths() {
        let (script, media) = fixture();
        let timeline = InputTimeline::build(&script, &media).unwrap();
        let offsets: Vec<f64> = timeline
            .spans()
            .iter()
            .map(|s| s.input_offset_secs)
            .collect();
        assert_eq!(offsets, vec![0.0, 10.0, 15.0]);
        assert_eq!(timeline.total_secs(), 25.0);
    }

    #[test]
    fn test_to_input_respects_trim_window_for_reused_media() {
        let (script, media) = fixture();
        let timeline = InputTimeline::build(&script, &media).unwrap();
        assert_eq!(timeline.to_input("a.mp4", 12.0).unwrap(), 2.0);
        assert_eq!(timeline.to_input("a.mp4", 35.0).unwrap(), 20.0);
        assert_eq!(timeline.to_input("b.mp4", 0.0).unwrap(), 10.0);
    }

    #[test]
    fn test_to_input_outside_any_clip_fails() {
        let (script, media) = fixture();
        let timeline = InputTimeline::build(&script, &media).unwrap();
        assert!(matches!(
            timeline.to_input("a.mp4", 25.0),
            Err(SpeedrampError::Mapping { .. })
        ));
        // Window end is exclusive
        assert!(timeline.to_input("b.mp4", 5.0).is_err());
        assert!(timeline.to_input("c.mp4", 1.0).is_err());
    }

    #[test]
    fn test_clip_past_natural_end_fails() {
        let script = Script {
            clips: vec![Clip::new("a.mp4", 50.0, None)],
            ..Script::default()
        };
        let mut media = script.media_table();
        media.record_probe("a.mp4", MediaInfo::with_duration(40.0));
        assert!(matches!(
            InputTimeline::build(&script, &media),
            Err(SpeedrampError::InvalidTimeline { .. })
        ));
    }
}
