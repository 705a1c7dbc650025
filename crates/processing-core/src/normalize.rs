//! Speed segment normalization.
//!
//! Reconciles speed overrides, which may be unordered and overlapping,
//! into an ordered list of contiguous constant-speed segments covering
//! the whole input timeline. Gaps are filled with the default speed.
//!
//! An override that starts inside the already-assigned tail is treated as
//! an extension of the previous segment: with the same speed the tail
//! grows, with a different speed only the part past the tail is appended.
//! Adjacent segments are only coalesced on that path.

use serde::{Deserialize, Serialize};
use speedramp_common::error::{SpeedrampError, SpeedrampResult};
use speedramp_project_model::SpeedOverride;

use crate::timeline::InputTimeline;

/// Slack for override bounds and segment joins.
const FIT_EPSILON: f64 = 1e-9;

/// The next `length_secs` of input time play at `speed`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub length_secs: f64,
    pub speed: f64,
}

impl Segment {
    pub fn new(length_secs: f64, speed: f64) -> Self {
        Self { length_secs, speed }
    }

    /// Duration of this segment on the output timeline.
    pub fn output_length_secs(&self) -> f64 {
        self.length_secs * self.speed
    }
}

/// A speed override placed on the input timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverrideSpan {
    pub position_secs: f64,
    pub length_secs: f64,
    pub speed: f64,
}

impl OverrideSpan {
    pub fn new(position_secs: f64, length_secs: f64, speed: f64) -> Self {
        Self {
            position_secs,
            length_secs,
            speed,
        }
    }

    pub fn end_secs(&self) -> f64 {
        self.position_secs + self.length_secs
    }
}

/// Translate script overrides onto the input timeline.
pub fn resolve_overrides(
    timeline: &InputTimeline,
    overrides: &[SpeedOverride],
) -> SpeedrampResult<Vec<OverrideSpan>> {
    overrides
        .iter()
        .map(|o| {
            Ok(OverrideSpan {
                position_secs: timeline.to_input(&o.media, o.start_secs)?,
                length_secs: o.length_secs,
                speed: o.speed,
            })
        })
        .collect()
}

/// Normalize overrides into segments covering `[0, total_secs)`.
///
/// Overrides are stably sorted by position, so ties keep declaration order.
pub fn normalize(
    total_secs: f64,
    overrides: &[OverrideSpan],
    default_speed: f64,
) -> SpeedrampResult<Vec<Segment>> {
    validate(total_secs, overrides, default_speed)?;

    let mut sorted = overrides.to_vec();
    sorted.sort_by(|a, b| a.position_secs.total_cmp(&b.position_secs));

    let mut segments: Vec<Segment> = Vec::with_capacity(sorted.len() * 2 + 1);
    let mut cursor = 0.0;

    // Gaps and overhangs within FIT_EPSILON are rounding noise from the
    // input time arithmetic, not real segments.
    for span in &sorted {
        let end = span.end_secs();

        if cursor > 0.0 && span.position_secs <= cursor + FIT_EPSILON {
            if end <= cursor + FIT_EPSILON {
                continue;
            }

            match segments.last_mut() {
                Some(last) if last.speed == span.speed => {
                    last.length_secs += end - cursor;
                }
                _ => segments.push(Segment::new(end - cursor, span.speed)),
            }
        } else {
            let start = if span.position_secs - cursor > FIT_EPSILON {
                segments.push(Segment::new(span.position_secs - cursor, default_speed));
                span.position_secs
            } else {
                cursor
            };
            segments.push(Segment::new(end - start, span.speed));
        }

        cursor = end;
    }

    if total_secs - cursor > FIT_EPSILON {
        segments.push(Segment::new(total_secs - cursor, default_speed));
    }

    tracing::debug!(
        overrides = overrides.len(),
        segments = segments.len(),
        total_secs,
        "Normalized speed segments"
    );

    Ok(segments)
}

fn validate(total_secs: f64, overrides: &[OverrideSpan], default_speed: f64) -> SpeedrampResult<()> {
    if !(total_secs.is_finite() && total_secs >= 0.0) {
        return Err(SpeedrampError::invalid_timeline(format!(
            "total length {total_secs} is not a non-negative number"
        )));
    }

    if !(default_speed.is_finite() && default_speed > 0.0) {
        return Err(SpeedrampError::invalid_timeline(format!(
            "default speed {default_speed} must be positive"
        )));
    }

    for span in overrides {
        if !(span.speed.is_finite() && span.speed > 0.0) {
            return Err(SpeedrampError::invalid_timeline(format!(
                "override at {} has non-positive speed {}",
                span.position_secs, span.speed
            )));
        }
        if !(span.length_secs.is_finite() && span.length_secs > 0.0) {
            return Err(SpeedrampError::invalid_timeline(format!(
                "override at {} has non-positive length {}",
                span.position_secs, span.length_secs
            )));
        }
        if !(span.position_secs.is_finite() && span.position_secs >= 0.0) {
            return Err(SpeedrampError::invalid_timeline(format!(
                "override starts at negative position {}",
                span.position_secs
            )));
        }
        if span.end_secs() > total_secs + FIT_EPSILON {
            return Err(SpeedrampError::invalid_timeline(format!(
                "override [{}, {}) runs past the end of the footage at {}",
                span.position_secs,
                span.end_secs(),
                total_secs
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const THIRD: f64 = 1.0 / 3.0;

    fn assert_segments(actual: &[Segment], expected: &[(f64, f64)]) {
        assert_eq!(
            actual.len(),
            expected.len(),
            "segment count differs: {actual:?}"
        );
        for (seg, (len, speed)) in actual.iter().zip(expected) {
            assert!((seg.length_secs - len).abs() < 1e-9, "{actual:?}");
            assert!((seg.speed - speed).abs() < 1e-12, "{actual:?}");
        }
    }

    #[test]
    fn test_no_overrides_is_one_default_segment() {
        let segments = normalize(10.0, &[], THIRD).unwrap();
        assert_segments(&segments, &[(10.0, THIRD)]);
    }

    #[test]
    fn test_empty_timeline_has_no_segments() {
        assert!(normalize(0.0, &[], THIRD).unwrap().is_empty());
    }

    #[test]
    fn test_single_override_is_padded_both_sides() {
        let segments = normalize(10.0, &[OverrideSpan::new(2.0, 3.0, 1.0)], THIRD).unwrap();
        assert_segments(&segments, &[(2.0, THIRD), (3.0, 1.0), (5.0, THIRD)]);
    }

    #[test]
    fn test_touching_same_speed_overrides_coalesce() {
        let overrides = [
            OverrideSpan::new(2.0, 3.0, 1.0),
            OverrideSpan::new(5.0, 2.0, 1.0),
        ];
        let segments = normalize(10.0, &overrides, THIRD).unwrap();
        assert_segments(&segments, &[(2.0, THIRD), (5.0, 1.0), (3.0, THIRD)]);
    }

    #[test]
    fn test_different_speed_override_ending_at_tail_is_absorbed() {
        let overrides = [
            OverrideSpan::new(2.0, 5.0, 1.0),
            OverrideSpan::new(4.0, 3.0, 2.0),
        ];
        let segments = normalize(10.0, &overrides, THIRD).unwrap();
        assert_segments(&segments, &[(2.0, THIRD), (5.0, 1.0), (3.0, THIRD)]);
    }

    #[test]
    fn test_different_speed_override_past_tail_appends_remainder() {
        let overrides = [
            OverrideSpan::new(2.0, 5.0, 1.0),
            OverrideSpan::new(4.0, 5.0, 2.0),
        ];
        let segments = normalize(10.0, &overrides, THIRD).unwrap();
        assert_segments(
            &segments,
            &[(2.0, THIRD), (5.0, 1.0), (2.0, 2.0), (1.0, THIRD)],
        );
    }

    #[test]
    fn test_unordered_input_is_sorted() {
        let overrides = [
            OverrideSpan::new(6.0, 1.0, 1.0),
            OverrideSpan::new(1.0, 1.0, 0.5),
        ];
        let segments = normalize(8.0, &overrides, THIRD).unwrap();
        assert_segments(
            &segments,
            &[(1.0, THIRD), (1.0, 0.5), (4.0, THIRD), (1.0, 1.0), (1.0, THIRD)],
        );
    }

    #[test]
    fn test_ties_keep_declaration_order() {
        // The second override at the same position extends the first.
        let overrides = [
            OverrideSpan::new(2.0, 1.0, 1.0),
            OverrideSpan::new(2.0, 3.0, 0.5),
        ];
        let segments = normalize(10.0, &overrides, THIRD).unwrap();
        assert_segments(
            &segments,
            &[(2.0, THIRD), (1.0, 1.0), (2.0, 0.5), (5.0, THIRD)],
        );
    }

    #[test]
    fn test_override_at_origin_is_not_treated_as_overlap() {
        let overrides = [
            OverrideSpan::new(0.0, 3.0, 1.0),
            OverrideSpan::new(0.0, 1.0, 1.0),
        ];
        let segments = normalize(5.0, &overrides, THIRD).unwrap();
        assert_segments(&segments, &[(3.0, 1.0), (2.0, THIRD)]);
    }

    #[test]
    fn test_filler_is_not_merged_with_equal_override_speed() {
        let segments = normalize(6.0, &[OverrideSpan::new(2.0, 2.0, THIRD)], THIRD).unwrap();
        assert_segments(&segments, &[(2.0, THIRD), (2.0, THIRD), (2.0, THIRD)]);
    }

    #[test]
    fn test_rounding_gap_still_counts_as_touching() {
        let overrides = [
            OverrideSpan::new(1.0, 2.0, 1.0),
            OverrideSpan::new(3.0 + 1e-12, 2.0 - 1e-12, 1.0),
        ];
        let segments = normalize(5.0, &overrides, THIRD).unwrap();
        assert_segments(&segments, &[(1.0, THIRD), (4.0, 1.0)]);
    }

    #[test]
    fn test_rounding_sliver_at_tail_is_dropped() {
        let segments = normalize(4.0, &[OverrideSpan::new(2.8, 1.2 - 1e-12, 1.0)], THIRD).unwrap();
        assert_segments(&segments, &[(2.8, THIRD), (1.2, 1.0)]);
    }

    #[test]
    fn test_rounding_gap_at_origin_adds_no_filler() {
        let segments = normalize(3.0, &[OverrideSpan::new(1e-12, 1.0, 1.0)], THIRD).unwrap();
        assert_segments(&segments, &[(1.0, 1.0), (2.0, THIRD)]);
    }

    #[test]
    fn test_contract_violations_fail_fast() {
        let cases = [
            OverrideSpan::new(-1.0, 2.0, 1.0),
            OverrideSpan::new(1.0, -2.0, 1.0),
            OverrideSpan::new(1.0, 0.0, 1.0),
            OverrideSpan::new(8.0, 3.0, 1.0),
            OverrideSpan::new(1.0, 1.0, 0.0),
            OverrideSpan::new(1.0, 1.0, f64::NAN),
        ];
        for case in cases {
            assert!(
                matches!(
                    normalize(10.0, &[case], THIRD),
                    Err(SpeedrampError::InvalidTimeline { .. })
                ),
                "{case:?} should be rejected"
            );
        }
        assert!(normalize(-1.0, &[], THIRD).is_err());
        assert!(normalize(1.0, &[], 0.0).is_err());
    }

    fn arb_overrides() -> impl Strategy<Value = (f64, Vec<OverrideSpan>)> {
        (1.0f64..200.0).prop_flat_map(|total| {
            let span = (0.0f64..1.0, 0.01f64..1.0, prop::sample::select(vec![0.25, 0.5, 1.0, 2.0]))
                .prop_map(move |(p, l, speed)| {
                    let position = p * total * 0.99;
                    let length = (l * (total - position)).max(1e-3).min(total - position);
                    OverrideSpan::new(position, length, speed)
                });
            (Just(total), prop::collection::vec(span, 0..12))
        })
    }

    proptest! {
        #[test]
        fn prop_segments_cover_total((total, overrides) in arb_overrides()) {
            let segments = normalize(total, &overrides, THIRD).unwrap();
            let sum: f64 = segments.iter().map(|s| s.length_secs).sum();
            prop_assert!((sum - total).abs() < 1e-6, "sum {} total {}", sum, total);
        }

        #[test]
        fn prop_segments_have_positive_length((total, overrides) in arb_overrides()) {
            let segments = normalize(total, &overrides, THIRD).unwrap();
            for seg in &segments {
                prop_assert!(seg.length_secs > 0.0, "{:?}", segments);
                prop_assert!(seg.speed > 0.0);
            }
        }
    }
}
