//! GPS telemetry bookkeeping.
//!
//! Footage is assumed to be recorded back to back, so one declared
//! `gpx_offset` anchors every GPS-enabled file around it. The telemetry
//! tracks tell the overlay renderer which GPX timestamp each output frame
//! shows and how fast the footage plays there.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use speedramp_common::error::{SpeedrampError, SpeedrampResult};
use speedramp_common::timecode::FPS;
use speedramp_project_model::{MediaTable, Script};

use crate::keyframes::KeyframeTrack;
use crate::plan::RetimePlan;

fn basename(name: &str) -> &str {
    Path::new(name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(name)
}

/// Unix time at raw time zero for every GPS-enabled footage file, keyed by basename.
///
/// Files are ordered by basename. Each declared offset carries forward by
/// adding file durations; files before the first declared offset are
/// filled in by walking backwards.
pub fn footage_offsets(script: &Script, media: &MediaTable) -> SpeedrampResult<BTreeMap<String, f64>> {
    let mut footage = BTreeMap::new();
    for clip in script.clips.iter().filter(|clip| clip.use_gpx) {
        footage.insert(basename(&clip.media), media.duration_secs(&clip.media)?);
    }

    if let Some(name) = script
        .gpx_offsets
        .keys()
        .find(|name| !footage.contains_key(name.as_str()))
    {
        return Err(SpeedrampError::mapping(format!(
            "gpx_offset for {name} doesn't match any GPS footage"
        )));
    }

    let mut offsets = BTreeMap::new();
    let mut running: Option<f64> = None;

    for (&name, &duration) in &footage {
        if let Some(&declared) = script.gpx_offsets.get(name) {
            running = Some(declared);
        }
        if let Some(offset) = running.as_mut() {
            offsets.insert(name.to_string(), *offset);
            *offset += duration;
        }
    }

    if let Some(mut offset) = running {
        for (&name, &duration) in footage.iter().rev() {
            offset -= duration;
            offsets.entry(name.to_string()).or_insert(offset);
        }
    }

    Ok(offsets)
}

/// Playback rate and GPX timestamp from an output frame onwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TelemetryKeyframe {
    pub fps: i64,
    pub timestamp: f64,
}

/// Telemetry keyframes for one GPS-enabled clip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryTrack {
    pub clip: usize,
    pub media: String,
    pub keyframes: KeyframeTrack<TelemetryKeyframe>,
}

/// Build a telemetry track for every GPS-enabled clip.
///
/// Empty when the script declares no `gpx_offset`.
pub fn telemetry_tracks(
    script: &Script,
    plan: &RetimePlan,
    media: &MediaTable,
) -> SpeedrampResult<Vec<TelemetryTrack>> {
    if script.gpx_offsets.is_empty() {
        return Ok(Vec::new());
    }

    let offsets = footage_offsets(script, media)?;
    let mut tracks = Vec::new();

    for (idx, clip) in script.clips.iter().enumerate() {
        if !clip.use_gpx {
            continue;
        }

        let span = plan
            .timeline
            .span(idx)
            .ok_or_else(|| SpeedrampError::mapping(format!("clip {} is not on the timeline", idx + 1)))?;
        let gpx_offset = offsets.get(basename(&clip.media)).copied().ok_or_else(|| {
            SpeedrampError::mapping(format!("no gpx offset for {}", clip.media))
        })?;

        let clip_in = span.input_offset_secs;
        let clip_end = span.input_end_secs();
        let keyframe = |input_secs: f64, speed: f64| TelemetryKeyframe {
            fps: (FPS as f64 * speed).round_ties_even() as i64,
            timestamp: gpx_offset + input_secs - clip_in + clip.start_secs,
        };

        let mut keyframes = KeyframeTrack::new();
        let mut last = None;

        for seg in plan.map.segments() {
            if seg.input_start_secs >= clip_end {
                break;
            }
            last = Some(seg);

            if seg.input_end_secs() > clip_in {
                let start = seg.input_start_secs.max(clip_in);
                keyframes.push(seg.map(start), keyframe(start, seg.speed));
            }
        }

        let last = last.ok_or_else(|| {
            SpeedrampError::mapping(format!("no speed segment covers {}", clip.media))
        })?;
        keyframes.push(last.map(clip_end), keyframe(clip_end, last.speed));

        tracing::debug!(
            media = %clip.media,
            gpx_offset,
            keyframes = keyframes.len(),
            "Built telemetry track"
        );

        tracks.push(TelemetryTrack {
            clip: idx,
            media: clip.media.clone(),
            keyframes,
        });
    }

    Ok(tracks)
}
