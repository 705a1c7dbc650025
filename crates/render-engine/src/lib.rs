//! Speedramp Render Engine
//!
//! Turns a retiming plan into the inputs of an ffmpeg render: the
//! `setpts` expression, the filter graph and argument list, and the
//! helper scripts that ffmpeg reads as piped inputs.
//!
//! # Pipeline Architecture
//!
//! ```text
//! edit.txt ──── parse ──── probe (ffprobe) ──── RetimePlan
//!                                                   │
//!                      ┌────────────────────────────┼──────────────────┐
//!                      ▼                            ▼                  ▼
//!                  sound.sh                    scores.flt        ffmpeg args
//!              (generate-sound)             (overlay renderer)  (setpts warp)
//! ```

pub mod artifacts;
pub mod export;
pub mod expr;
pub mod ffmpeg;
pub mod probe;

pub use artifacts::{shell_quote, Artifacts};
pub use export::*;
pub use expr::WarpExpr;
pub use ffmpeg::{build_ffmpeg_args, build_filter_graph};
pub use probe::{command_exists, probe_media, FfprobeProbe, MediaProbe};
