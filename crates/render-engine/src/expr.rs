//! The `setpts` expression that retimes the concatenated footage.
//!
//! The time map is turned into a chain of `if(lt(...))` selections over
//! the input time, one per segment boundary, with one linear mapping per
//! segment. Boundaries and offsets come straight from the [`TimeMap`] so
//! the rendered video agrees with every keyframe projected from it.

use std::fmt;

use speedramp_processing_core::TimeMap;

/// Expression tree over input time `t`.
#[derive(Debug, Clone, PartialEq)]
pub enum WarpExpr {
    /// Timestamps pass through unchanged.
    Identity,

    /// `output_start + (t - input_start) * speed`.
    Linear {
        input_start_secs: f64,
        output_start_secs: f64,
        speed: f64,
    },

    /// `below` while `t < threshold_secs`, otherwise `otherwise`.
    Select {
        threshold_secs: f64,
        below: Box<WarpExpr>,
        otherwise: Box<WarpExpr>,
    },
}

impl WarpExpr {
    /// Build the selection chain for `map`.
    ///
    /// The last segment is the unconditional fallback, so there is one
    /// `Select` per internal boundary.
    pub fn from_segments(map: &TimeMap) -> Self {
        let mut segments = map.segments().iter().rev();

        let Some(last) = segments.next() else {
            return Self::Identity;
        };

        let mut expr = Self::Linear {
            input_start_secs: last.input_start_secs,
            output_start_secs: last.output_start_secs,
            speed: last.speed,
        };

        for seg in segments {
            expr = Self::Select {
                threshold_secs: seg.input_end_secs(),
                below: Box::new(Self::Linear {
                    input_start_secs: seg.input_start_secs,
                    output_start_secs: seg.output_start_secs,
                    speed: seg.speed,
                }),
                otherwise: Box::new(expr),
            };
        }

        expr
    }

    /// Evaluate at input time `t`.
    pub fn eval(&self, t: f64) -> f64 {
        let mut node = self;
        loop {
            match node {
                Self::Identity => return t,
                Self::Linear {
                    input_start_secs,
                    output_start_secs,
                    speed,
                } => return output_start_secs + (t - input_start_secs) * speed,
                Self::Select {
                    threshold_secs,
                    below,
                    otherwise,
                } => {
                    node = if t < *threshold_secs {
                        below.as_ref()
                    } else {
                        otherwise.as_ref()
                    };
                }
            }
        }
    }

    /// Number of `Select` nodes along the fallback chain.
    pub fn depth(&self) -> usize {
        let mut node = self;
        let mut depth = 0;
        while let Self::Select { otherwise, .. } = node {
            depth += 1;
            node = otherwise.as_ref();
        }
        depth
    }
}

impl fmt::Display for WarpExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut node = self;
        let mut open = 0;

        loop {
            match node {
                Self::Identity => {
                    f.write_str("PTS")?;
                    break;
                }
                Self::Linear {
                    input_start_secs,
                    output_start_secs,
                    speed,
                } => {
                    write!(
                        f,
                        "STARTPTS+{output_start_secs}/TB+(PTS-STARTPTS-{input_start_secs}/TB)"
                    )?;
                    if *speed != 1.0 {
                        write!(f, "*{speed}")?;
                    }
                    break;
                }
                Self::Select {
                    threshold_secs,
                    below,
                    otherwise,
                } => {
                    write!(f, "if(lt(T-STARTT,{threshold_secs}),{below},")?;
                    open += 1;
                    node = otherwise.as_ref();
                }
            }
        }

        for _ in 0..open {
            f.write_str(")")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use speedramp_processing_core::{normalize, OverrideSpan};

    const THIRD: f64 = 1.0 / 3.0;

    fn map(total: f64, overrides: &[OverrideSpan]) -> TimeMap {
        TimeMap::new(&normalize(total, overrides, THIRD).unwrap())
    }

    /// Evaluates rendered expressions with `T = PTS = t`, `STARTT = STARTPTS = 0`, `TB = 1`.
    struct TextEval<'a> {
        text: &'a [u8],
        pos: usize,
        t: f64,
    }

    impl TextEval<'_> {
        fn run(text: &str, t: f64) -> f64 {
            let mut eval = TextEval {
                text: text.as_bytes(),
                pos: 0,
                t,
            };
            let value = eval.sum();
            assert_eq!(eval.pos, text.len(), "trailing input in {text}");
            value
        }

        fn peek(&self) -> Option<u8> {
            self.text.get(self.pos).copied()
        }

        fn expect(&mut self, byte: u8) {
            assert_eq!(self.peek(), Some(byte), "at {}", self.pos);
            self.pos += 1;
        }

        fn sum(&mut self) -> f64 {
            let mut value = self.product();
            loop {
                match self.peek() {
                    Some(b'+') => {
                        self.pos += 1;
                        value += self.product();
                    }
                    Some(b'-') => {
                        self.pos += 1;
                        value -= self.product();
                    }
                    _ => return value,
                }
            }
        }

        fn product(&mut self) -> f64 {
            let mut value = self.atom();
            loop {
                match self.peek() {
                    Some(b'*') => {
                        self.pos += 1;
                        value *= self.atom();
                    }
                    Some(b'/') => {
                        self.pos += 1;
                        value /= self.atom();
                    }
                    _ => return value,
                }
            }
        }

        fn args<const N: usize>(&mut self) -> [f64; N] {
            let mut out = [0.0; N];
            self.expect(b'(');
            for (i, slot) in out.iter_mut().enumerate() {
                if i > 0 {
                    self.expect(b',');
                }
                *slot = self.sum();
            }
            self.expect(b')');
            out
        }

        fn atom(&mut self) -> f64 {
            let start = self.pos;
            match self.peek() {
                Some(b'(') => {
                    self.pos += 1;
                    let value = self.sum();
                    self.expect(b')');
                    value
                }
                Some(b) if b.is_ascii_digit() => {
                    while self.peek().is_some_and(|b| b.is_ascii_digit() || b == b'.') {
                        self.pos += 1;
                    }
                    std::str::from_utf8(&self.text[start..self.pos])
                        .unwrap()
                        .parse()
                        .unwrap()
                }
                _ => {
                    while self.peek().is_some_and(|b| b.is_ascii_alphabetic()) {
                        self.pos += 1;
                    }
                    match std::str::from_utf8(&self.text[start..self.pos]).unwrap() {
                        "if" => {
                            let [cond, then, other] = self.args::<3>();
                            if cond != 0.0 {
                                then
                            } else {
                                other
                            }
                        }
                        "lt" => {
                            let [a, b] = self.args::<2>();
                            if a < b {
                                1.0
                            } else {
                                0.0
                            }
                        }
                        "T" | "PTS" => self.t,
                        "STARTT" | "STARTPTS" => 0.0,
                        "TB" => 1.0,
                        other => panic!("unknown identifier {other:?}"),
                    }
                }
            }
        }
    }

    #[test]
    fn test_empty_map_is_identity() {
        let expr = WarpExpr::from_segments(&TimeMap::new(&[]));
        assert_eq!(expr, WarpExpr::Identity);
        assert_eq!(expr.to_string(), "PTS");
        assert_eq!(expr.eval(4.0), 4.0);
    }

    #[test]
    fn test_real_time_segment_omits_speed() {
        let m = TimeMap::new(&normalize(2.0, &[OverrideSpan::new(0.0, 2.0, 1.0)], THIRD).unwrap());
        let expr = WarpExpr::from_segments(&m);
        assert_eq!(expr.to_string(), "STARTPTS+0/TB+(PTS-STARTPTS-0/TB)");
    }

    #[test]
    fn test_one_select_per_boundary() {
        let m = map(10.0, &[OverrideSpan::new(2.0, 3.0, 1.0)]);
        let expr = WarpExpr::from_segments(&m);
        assert_eq!(expr.depth(), 2);

        let text = expr.to_string();
        assert_eq!(
            text,
            format!(
                "if(lt(T-STARTT,2),STARTPTS+0/TB+(PTS-STARTPTS-0/TB)*{THIRD},\
                 if(lt(T-STARTT,5),STARTPTS+{o1}/TB+(PTS-STARTPTS-2/TB),\
                 STARTPTS+{o2}/TB+(PTS-STARTPTS-5/TB)*{THIRD}))",
                o1 = 2.0 * THIRD,
                o2 = 2.0 * THIRD + 3.0,
            )
        );
    }

    #[test]
    fn test_boundary_selects_next_segment() {
        let m = map(10.0, &[OverrideSpan::new(2.0, 3.0, 1.0)]);
        let expr = WarpExpr::from_segments(&m);
        assert_eq!(expr.eval(2.0), m.segments()[1].output_start_secs);
        assert_eq!(TextEval::run(&expr.to_string(), 2.0), m.segments()[1].output_start_secs);
    }

    proptest! {
        #[test]
        fn prop_expression_matches_time_map(
            cuts in prop::collection::vec((0.0f64..50.0, 0.1f64..5.0, prop::sample::select(vec![0.2, 0.5, 1.0, 3.0])), 0..8),
            t in 0.0f64..60.0,
        ) {
            let total = 60.0;
            let overrides: Vec<OverrideSpan> = cuts
                .into_iter()
                .map(|(p, l, s)| OverrideSpan::new(p, l.min(total - p), s))
                .collect();
            let m = map(total, &overrides);
            let expr = WarpExpr::from_segments(&m);
            let expected = m.to_output(t).unwrap();

            prop_assert!((expr.eval(t) - expected).abs() < 1e-6);
            prop_assert!((TextEval::run(&expr.to_string(), t) - expected).abs() < 1e-6);
        }
    }
}
