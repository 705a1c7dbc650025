//! Speedramp Project Model
//!
//! Defines the data contracts of an editing script:
//! - **Script:** Clips in timeline order plus speed overrides, overlays, sounds
//!   and telemetry anchors
//! - **Media:** The filename-keyed table of raw media and their probed durations
//! - **Parser:** The line-oriented script grammar
//!
//! All times in this crate are raw media time of the clip they belong to,
//! in seconds.

pub mod media;
pub mod parser;
pub mod script;

pub use media::*;
pub use parser::{parse_script, ParseOptions};
pub use script::*;
