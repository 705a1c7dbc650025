//! The retiming plan for a script: input timeline plus time map.

use speedramp_common::error::SpeedrampResult;
use speedramp_project_model::{MediaTable, Script};

use crate::mapping::TimeMap;
use crate::normalize::{normalize, resolve_overrides, Segment};
use crate::timeline::InputTimeline;

/// Everything needed to place script events on the output timeline.
#[derive(Debug, Clone)]
pub struct RetimePlan {
    pub timeline: InputTimeline,
    pub segments: Vec<Segment>,
    pub map: TimeMap,
}

impl RetimePlan {
    /// Lay out the clips, normalize the overrides, and build the time map.
    ///
    /// A speed set in the script takes precedence over `default_speed`.
    pub fn build(
        script: &Script,
        media: &MediaTable,
        default_speed: f64,
    ) -> SpeedrampResult<Self> {
        let timeline = InputTimeline::build(script, media)?;
        let overrides = resolve_overrides(&timeline, &script.speed_overrides)?;
        let default_speed = script.default_speed.unwrap_or(default_speed);
        let segments = normalize(timeline.total_secs(), &overrides, default_speed)?;
        let map = TimeMap::new(&segments);

        tracing::info!(
            clips = timeline.spans().len(),
            segments = segments.len(),
            input_secs = timeline.total_secs(),
            output_secs = map.total_output_secs(),
            "Built retiming plan"
        );

        Ok(Self {
            timeline,
            segments,
            map,
        })
    }

    /// Output time of raw time `raw_secs` of `media`.
    pub fn output_time(&self, media: &str, raw_secs: f64) -> SpeedrampResult<f64> {
        let input = self.timeline.to_input(media, raw_secs)?;
        self.map.to_output(input)
    }

    pub fn total_output_secs(&self) -> f64 {
        self.map.total_output_secs()
    }
}
