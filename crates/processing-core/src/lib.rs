//! Speedramp Processing Core — the timeline remapping engine
//!
//! Turns a parsed script into output-timeline data:
//! - **Input timeline:** Concatenates trimmed clips and locates raw media times on it
//! - **Normalizer:** Reconciles speed overrides into contiguous constant-speed segments
//! - **Time map:** Maps input time to output time (and back)
//! - **Keyframes:** Projects scores, overlays, sounds and telemetry onto output frames
//!
//! This crate is pure computation with no I/O.
//! All inputs are data; all outputs are data.

pub mod gpx;
pub mod keyframes;
pub mod mapping;
pub mod normalize;
pub mod plan;
pub mod sound;
pub mod timeline;

pub use gpx::{footage_offsets, telemetry_tracks, TelemetryKeyframe, TelemetryTrack};
pub use keyframes::{
    project_events, rewrite_overlay_script, score_track, svg_spans, Keyframe, KeyframeTrack,
    OverlaySpan,
};
pub use mapping::{MapCursor, MappedSegment, TimeMap};
pub use normalize::{normalize, OverrideSpan, Segment};
pub use plan::RetimePlan;
pub use sound::{sequence_sounds, SoundClip, SoundPlacement, SoundTrack};
pub use timeline::{ClipSpan, InputTimeline};
