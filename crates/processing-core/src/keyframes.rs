//! Keyframe projection onto output frames.
//!
//! Events anchored to input time are mapped to output time and then to a
//! frame index at the fixed renderer frame rate. Two keyframes never share
//! a frame: a keyframe landing on the same frame as the previous one
//! replaces it.

use serde::Serialize;
use speedramp_common::error::SpeedrampResult;
use speedramp_common::timecode::{secs_to_frame, split_timecode_prefix};
use speedramp_project_model::{Clip, Script};

use crate::mapping::TimeMap;
use crate::plan::RetimePlan;

const KEY_FRAME: &str = "key_frame";

/// A value pinned to an output frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Keyframe<T> {
    pub frame: i64,
    pub value: T,
}

/// Ordered keyframes with at most one keyframe per frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyframeTrack<T> {
    keyframes: Vec<Keyframe<T>>,
}

impl<T> Default for KeyframeTrack<T> {
    fn default() -> Self {
        Self {
            keyframes: Vec::new(),
        }
    }
}

impl<T> KeyframeTrack<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a keyframe at `output_secs`, replacing the previous one if it
    /// rounds to the same frame.
    pub fn push(&mut self, output_secs: f64, value: T) {
        let frame = secs_to_frame(output_secs);
        if self.keyframes.last().is_some_and(|kf| kf.frame == frame) {
            self.keyframes.pop();
        }
        self.keyframes.push(Keyframe { frame, value });
    }

    pub fn keyframes(&self) -> &[Keyframe<T>] {
        &self.keyframes
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }
}

/// Project `(input_secs, value)` events onto output frames.
///
/// Events are stably sorted by input time first.
pub fn project_events<T>(
    map: &TimeMap,
    mut events: Vec<(f64, T)>,
) -> SpeedrampResult<KeyframeTrack<T>> {
    events.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut cursor = map.cursor();
    let mut track = KeyframeTrack::new();
    for (input_secs, value) in events {
        track.push(cursor.to_output(input_secs)?, value);
    }
    Ok(track)
}

/// Running score total over the output timeline.
///
/// Deltas are accumulated in input-time order. A final keyframe holds the
/// total until the end of the video. Empty when the script keeps no score.
pub fn score_track(script: &Script, plan: &RetimePlan) -> SpeedrampResult<KeyframeTrack<i64>> {
    if script.scores.is_empty() {
        return Ok(KeyframeTrack::new());
    }

    let mut deltas = script
        .scores
        .iter()
        .map(|score| {
            let media = &script.clips[score.clip].media;
            Ok((plan.timeline.to_input(media, score.time_secs)?, score.delta))
        })
        .collect::<SpeedrampResult<Vec<_>>>()?;
    deltas.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut cursor = plan.map.cursor();
    let mut track = KeyframeTrack::new();
    let mut total = 0;
    for (input_secs, delta) in deltas {
        total += delta;
        track.push(cursor.to_output(input_secs)?, total);
    }
    track.push(plan.total_output_secs(), total);

    Ok(track)
}

/// An overlay visible between two output frames.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlaySpan {
    pub file: String,
    pub start_frame: i64,
    pub end_frame: i64,
}

/// Place SVG overlays on the output timeline.
///
/// The overlay length is already in output seconds and is not retimed.
pub fn svg_spans(script: &Script, plan: &RetimePlan) -> SpeedrampResult<Vec<OverlaySpan>> {
    script
        .svgs
        .iter()
        .map(|svg| {
            let media = &script.clips[svg.clip].media;
            let start = plan.output_time(media, svg.start_secs)?;
            Ok(OverlaySpan {
                file: svg.file.clone(),
                start_frame: secs_to_frame(start),
                end_frame: secs_to_frame(start + svg.length_secs),
            })
        })
        .collect()
}

/// Rewrite a clip's raw overlay block onto output frames.
///
/// Every `key_frame <timecode>` has its timecode, read as raw time of the
/// clip's media, replaced by the output frame index. Everything else is
/// copied through.
pub fn rewrite_overlay_script(clip: &Clip, plan: &RetimePlan) -> SpeedrampResult<String> {
    let text = clip.overlay_script.join("\n");
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut search = 0;

    while let Some(found) = text[search..].find(KEY_FRAME) {
        let start = search + found;
        let after = start + KEY_FRAME.len();
        search = after;

        let at_word_start = text[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '_'));
        if !at_word_start {
            continue;
        }

        let tail = &text[after..];
        let gap = tail.len() - tail.trim_start().len();
        if gap == 0 {
            continue;
        }

        let time_start = after + gap;
        let Some((raw_secs, rest)) = split_timecode_prefix(&text[time_start..]) else {
            continue;
        };
        let time_end = text.len() - rest.len();

        let frame = secs_to_frame(plan.output_time(&clip.media, raw_secs)?);
        out.push_str(&text[copied..time_start]);
        out.push_str(&frame.to_string());
        copied = time_end;
        search = time_end;
    }

    out.push_str(&text[copied..]);
    Ok(out)
}
