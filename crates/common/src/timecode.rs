//! Timecode parsing, formatting, and frame conversion.
//!
//! Script timestamps are written as `[MM:]SS[.frac]` and refer to the
//! raw media time of a clip. Everything downstream works in seconds
//! (`f64`) and converts to frame indices only at the very end, using
//! the fixed [`FPS`] shared with the renderer invocation.

use chrono::{DateTime, NaiveDateTime};

/// Frame rate shared by the keyframe projector and the ffmpeg invocation.
pub const FPS: u32 = 30;

/// Parse a `[MM:]SS[.frac]` timecode into seconds.
///
/// Returns `None` unless the whole string is a timecode.
pub fn parse_timecode(text: &str) -> Option<f64> {
    let (minutes, rest) = match text.split_once(':') {
        Some((m, rest)) => (Some(m), rest),
        None => (None, text),
    };

    let (whole, frac) = match rest.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (rest, None),
    };

    if !is_digits(whole) {
        return None;
    }
    let mut seconds = whole.parse::<u64>().ok()? as f64;

    if let Some(minutes) = minutes {
        if !is_digits(minutes) {
            return None;
        }
        seconds += minutes.parse::<u64>().ok()? as f64 * 60.0;
    }

    if let Some(frac) = frac {
        if !is_digits(frac) {
            return None;
        }
        seconds += format!("0.{frac}").parse::<f64>().ok()?;
    }

    Some(seconds)
}

/// Parse the longest timecode at the start of `text`, returning the rest.
pub fn split_timecode_prefix(text: &str) -> Option<(f64, &str)> {
    let digits = |s: &str| s.bytes().take_while(u8::is_ascii_digit).count();

    let first = digits(text);
    if first == 0 {
        return None;
    }
    let mut end = first;

    if text[end..].starts_with(':') {
        let seconds = digits(&text[end + 1..]);
        if seconds > 0 {
            end += 1 + seconds;
        }
    }

    if text[end..].starts_with('.') {
        let frac = digits(&text[end + 1..]);
        if frac > 0 {
            end += 1 + frac;
        }
    }

    Some((parse_timecode(&text[..end])?, &text[end..]))
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// Format seconds as `[HH:]MM:SS[.frac]`, omitting leading zero fields.
///
/// Rounded to the millisecond.
///
/// ```
/// use speedramp_common::timecode::format_timecode;
/// assert_eq!(format_timecode(5.0), "05");
/// assert_eq!(format_timecode(65.5), "01:05.5");
/// assert_eq!(format_timecode(3725.0), "01:02:05");
/// ```
pub fn format_timecode(secs: f64) -> String {
    let mut out = String::new();
    let mut num = secs;

    if num < 0.0 {
        out.push('-');
        num = -num;
    }
    num = (num * 1000.0).round() / 1000.0;

    let mut comp = 60.0;
    let mut fields = 0;
    while num >= comp {
        comp *= 60.0;
        fields += 1;
    }

    for _ in 0..fields {
        comp /= 60.0;
        out.push_str(&format!("{:02}:", (num / comp) as u64));
        num %= comp;
    }

    let whole = num.trunc();
    out.push_str(&format!("{:02}", whole as u64));

    let frac = format!("{:.3}", num - whole);
    let frac = frac.trim_end_matches('0').trim_end_matches('.');
    if let Some(decimals) = frac.strip_prefix('0') {
        out.push_str(decimals);
    }

    out
}

/// Convert an output time in seconds to a frame index.
///
/// Halfway cases round to the even frame.
pub fn secs_to_frame(secs: f64) -> i64 {
    (secs * FPS as f64).round_ties_even() as i64
}

/// Parse a UTC timestamp (RFC 3339, or naive ISO 8601 taken as UTC)
/// into Unix seconds with sub-second precision.
pub fn parse_utc_timestamp(text: &str) -> Option<f64> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp() as f64 + dt.timestamp_subsec_nanos() as f64 / 1e9);
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            let dt = naive.and_utc();
            return Some(dt.timestamp() as f64 + dt.timestamp_subsec_nanos() as f64 / 1e9);
        }
    }

    None
}
