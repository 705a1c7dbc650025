//! Input-time ↔ output-time mapping over normalized segments.
//!
//! The map is right-continuous: a time exactly on a segment boundary
//! belongs to the segment that starts there. The segment start times
//! are accumulated once, in order, and shared with the filter expression
//! so the renderer and the keyframes agree on every boundary.

use serde::Serialize;
use speedramp_common::error::{SpeedrampError, SpeedrampResult};

use crate::normalize::Segment;

/// Slack allowed for queries exactly at the end of the timeline.
const END_EPSILON: f64 = 1e-9;

/// A segment with its accumulated start positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MappedSegment {
    pub input_start_secs: f64,
    pub output_start_secs: f64,
    pub length_secs: f64,
    pub speed: f64,
}

impl MappedSegment {
    pub fn input_end_secs(&self) -> f64 {
        self.input_start_secs + self.length_secs
    }

    pub fn output_end_secs(&self) -> f64 {
        self.output_start_secs + self.length_secs * self.speed
    }

    /// Output time of `input_secs`, extrapolating the segment's line.
    pub fn map(&self, input_secs: f64) -> f64 {
        self.output_start_secs + (input_secs - self.input_start_secs) * self.speed
    }
}

/// Time map built from a normalized segment list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeMap {
    segments: Vec<MappedSegment>,
    total_input_secs: f64,
    total_output_secs: f64,
}

impl TimeMap {
    pub fn new(segments: &[Segment]) -> Self {
        let mut mapped = Vec::with_capacity(segments.len());
        let mut input = 0.0;
        let mut output = 0.0;

        for seg in segments {
            mapped.push(MappedSegment {
                input_start_secs: input,
                output_start_secs: output,
                length_secs: seg.length_secs,
                speed: seg.speed,
            });
            input += seg.length_secs;
            output += seg.length_secs * seg.speed;
        }

        Self {
            segments: mapped,
            total_input_secs: input,
            total_output_secs: output,
        }
    }

    pub fn segments(&self) -> &[MappedSegment] {
        &self.segments
    }

    pub fn total_input_secs(&self) -> f64 {
        self.total_input_secs
    }

    /// Length of the rendered video in seconds.
    pub fn total_output_secs(&self) -> f64 {
        self.total_output_secs
    }

    /// Index of the segment holding `input_secs`.
    fn segment_index(&self, input_secs: f64) -> SpeedrampResult<Option<usize>> {
        if !(input_secs >= 0.0) {
            return Err(SpeedrampError::mapping(format!(
                "input time {input_secs} is before the start of the footage"
            )));
        }

        let idx = self
            .segments
            .partition_point(|seg| seg.input_end_secs() <= input_secs);

        if idx < self.segments.len() {
            Ok(Some(idx))
        } else if input_secs <= self.total_input_secs + END_EPSILON {
            Ok(None)
        } else {
            Err(SpeedrampError::mapping(format!(
                "input time {input_secs} is past the end of the footage at {}",
                self.total_input_secs
            )))
        }
    }

    /// Map an input-timeline time to the output timeline.
    ///
    /// The very end of the input maps to the very end of the output.
    pub fn to_output(&self, input_secs: f64) -> SpeedrampResult<f64> {
        Ok(match self.segment_index(input_secs)? {
            Some(idx) => self.segments[idx].map(input_secs),
            None => self.total_output_secs,
        })
    }

    /// Speed in effect at `input_secs`; the end of the timeline uses the last segment.
    pub fn speed_at(&self, input_secs: f64) -> SpeedrampResult<f64> {
        let seg = match self.segment_index(input_secs)? {
            Some(idx) => self.segments.get(idx),
            None => self.segments.last(),
        };
        seg.map(|s| s.speed)
            .ok_or_else(|| SpeedrampError::mapping("timeline has no segments"))
    }

    /// Map an output-timeline time back to the input timeline.
    pub fn input_at_output(&self, output_secs: f64) -> SpeedrampResult<f64> {
        if !(output_secs >= 0.0) {
            return Err(SpeedrampError::mapping(format!(
                "output time {output_secs} is before the start of the video"
            )));
        }

        let idx = self
            .segments
            .partition_point(|seg| seg.output_end_secs() <= output_secs);

        match self.segments.get(idx) {
            Some(seg) => {
                Ok(seg.input_start_secs + (output_secs - seg.output_start_secs) / seg.speed)
            }
            None if output_secs <= self.total_output_secs + END_EPSILON => {
                Ok(self.total_input_secs)
            }
            None => Err(SpeedrampError::mapping(format!(
                "output time {output_secs} is past the end of the video at {}",
                self.total_output_secs
            ))),
        }
    }

    /// A cursor for queries in ascending input order.
    pub fn cursor(&self) -> MapCursor<'_> {
        MapCursor { map: self, index: 0 }
    }
}

/// One-pass mapper for non-decreasing queries.
///
/// Each query resumes the segment walk where the previous one stopped;
/// a query that goes backwards restarts from the first segment.
#[derive(Debug, Clone)]
pub struct MapCursor<'a> {
    map: &'a TimeMap,
    index: usize,
}

impl MapCursor<'_> {
    pub fn to_output(&mut self, input_secs: f64) -> SpeedrampResult<f64> {
        let segments = &self.map.segments;

        if !(input_secs >= 0.0) {
            return self.map.to_output(input_secs);
        }

        if segments
            .get(self.index)
            .is_some_and(|seg| input_secs < seg.input_start_secs)
        {
            self.index = 0;
        }

        while let Some(seg) = segments.get(self.index) {
            if input_secs < seg.input_end_secs() {
                return Ok(seg.map(input_secs));
            }
            self.index += 1;
        }

        // Ran off the end; leave the cursor usable for a backwards query.
        self.index = segments.len().saturating_sub(1);
        self.map.to_output(input_secs)
    }
}
