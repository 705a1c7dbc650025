//! Line-oriented editing script parser.
//!
//! Each non-blank line is one directive. Lines are tried against the
//! directive forms in a fixed order and the first match wins; anything
//! that matches nothing else is a clip declaration
//! (`<file> [<start> [<end>]]`).

use speedramp_common::error::{SpeedrampError, SpeedrampResult};
use speedramp_common::timecode::{parse_timecode, parse_utc_timestamp};

use crate::script::{Clip, ScoreDelta, Script, SoundCue, SpeedOverride, SvgOverlay};

/// Length of the generated logo clip in seconds.
const LOGO_LENGTH_SECS: f64 = 3.0;

/// Environment-dependent inputs to the parser.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Generator command for the `logo` directive, including the leading `|`.
    pub logo_generator: String,

    /// Sound played under the logo.
    pub logo_sound: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            logo_generator: "|./build/generate-logo".to_string(),
            logo_sound: "logo-sound.flac".to_string(),
        }
    }
}

/// Parse a whole script.
pub fn parse_script(text: &str, options: &ParseOptions) -> SpeedrampResult<Script> {
    let mut parser = ScriptParser {
        script: Script::default(),
        options,
        line: 0,
    };

    let mut block_start: Option<usize> = None;

    for (idx, raw) in text.lines().enumerate() {
        parser.line = idx + 1;
        let line = raw.trim();

        if block_start.is_some() {
            if line == "}}" {
                block_start = None;
            } else {
                parser.last_clip("overlay script")?.overlay_script.push(line.to_string());
            }
            continue;
        }

        if line == "{{" {
            parser.last_clip("overlay script")?;
            block_start = Some(parser.line);
            continue;
        }

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        parser.parse_line(line)?;
    }

    if let Some(line) = block_start {
        return Err(SpeedrampError::parse(line, "unterminated {{ block"));
    }

    tracing::debug!(
        clips = parser.script.clips.len(),
        overrides = parser.script.speed_overrides.len(),
        scores = parser.script.scores.len(),
        svgs = parser.script.svgs.len(),
        sounds = parser.script.sound_count(),
        "Parsed script"
    );

    Ok(parser.script)
}

struct ScriptParser<'a> {
    script: Script,
    options: &'a ParseOptions,
    line: usize,
}

impl ScriptParser<'_> {
    fn error(&self, msg: impl Into<String>) -> SpeedrampError {
        SpeedrampError::parse(self.line, msg)
    }

    fn last_clip(&mut self, what: &str) -> SpeedrampResult<&mut Clip> {
        let line = self.line;
        self.script
            .clips
            .last_mut()
            .ok_or_else(|| SpeedrampError::parse(line, format!("{what} specified with no video")))
    }

    fn last_clip_index(&self, what: &str) -> SpeedrampResult<usize> {
        match self.script.clips.len() {
            0 => Err(self.error(format!("{what} specified with no video"))),
            n => Ok(n - 1),
        }
    }

    fn parse_line(&mut self, line: &str) -> SpeedrampResult<()> {
        match line {
            "logo" => return self.add_logo(),
            "elevation" => {
                self.script.show_elevation = true;
                return Ok(());
            }
            "map" => {
                self.script.show_map = true;
                return Ok(());
            }
            "no_gpx" => {
                self.last_clip("no_gpx")?.use_gpx = false;
                return Ok(());
            }
            _ => {}
        }

        let (word, rest) = split_word(line);

        match word {
            "filter" if !rest.is_empty() => {
                self.last_clip("filter")?.filters.push(rest.to_string());
                return Ok(());
            }
            "sound_args" if !rest.is_empty() => {
                let args = shell_split(rest).map_err(|msg| self.error(msg))?;
                self.script.sound_args.extend(args);
                return Ok(());
            }
            "default_speed" => {
                let speed = parse_speed_factor(rest)
                    .ok_or_else(|| self.error(format!("invalid default speed '{rest}'")))?;
                self.script.default_speed = Some(speed);
                return Ok(());
            }
            _ => {}
        }

        if let Some((start, end)) = time_pair(rest) {
            if word == "slow" {
                return self.add_override(start, end, 1.0, "slow");
            }
            if let Some(speed) = parse_speed_factor(word) {
                return self.add_override(start, end, speed, "speed");
            }
        }

        if word == "gpx_offset" {
            if let Some(anchor) = self.parse_gpx_offset(rest)? {
                self.script.gpx_offsets.insert(anchor.0, anchor.1);
                return Ok(());
            }
        }

        if let Some(time) = parse_timecode(word) {
            let (second, tail) = split_word(rest);

            if let Some(length) = parse_timecode(second) {
                if tail.ends_with(".svg") {
                    let clip = self.last_clip_index("svg")?;
                    self.script.svgs.push(SvgOverlay {
                        clip,
                        file: tail.to_string(),
                        start_secs: time,
                        length_secs: length,
                    });
                    return Ok(());
                }
            }

            if tail.is_empty() {
                if let Some(delta) = parse_score_delta(second) {
                    let clip = self.last_clip_index("score")?;
                    self.script.scores.push(ScoreDelta {
                        clip,
                        time_secs: time,
                        delta,
                    });
                    return Ok(());
                }
            }

            if !rest.is_empty() {
                let file = rest.to_string();
                self.last_clip("sound")?.sounds.push(SoundCue {
                    start_secs: time,
                    file,
                });
                return Ok(());
            }
        }

        self.add_clip(line)
    }

    fn add_logo(&mut self) -> SpeedrampResult<()> {
        let generator = self.options.logo_generator.clone();
        let mut clip = Clip::new(generator.clone(), 0.0, Some(LOGO_LENGTH_SECS));
        clip.sounds.push(SoundCue {
            start_secs: 0.0,
            file: self.options.logo_sound.clone(),
        });
        self.script.clips.push(clip);
        self.script.speed_overrides.push(SpeedOverride {
            media: generator,
            start_secs: 0.0,
            length_secs: LOGO_LENGTH_SECS,
            speed: 1.0,
        });
        Ok(())
    }

    fn add_override(
        &mut self,
        start: f64,
        end: f64,
        speed: f64,
        what: &str,
    ) -> SpeedrampResult<()> {
        let media = self.last_clip(what)?.media.clone();
        self.script.speed_overrides.push(SpeedOverride {
            media,
            start_secs: start,
            length_secs: end - start,
            speed,
        });
        Ok(())
    }

    fn parse_gpx_offset(&self, rest: &str) -> SpeedrampResult<Option<(String, f64)>> {
        let (file, rest) = split_word(rest);
        let (video_time, utc) = split_word(rest);

        let Some(video_time) = parse_timecode(video_time) else {
            return Ok(None);
        };
        if file.is_empty() || utc.is_empty() {
            return Ok(None);
        }

        let timestamp = parse_utc_timestamp(utc)
            .ok_or_else(|| self.error(format!("invalid UTC time '{utc}'")))?;

        Ok(Some((file.to_string(), timestamp - video_time)))
    }

    fn add_clip(&mut self, line: &str) -> SpeedrampResult<()> {
        let (file, start, end) = match strip_trailing_timecode(line) {
            Some((head, last)) => match strip_trailing_timecode(head) {
                Some((file, start)) => (file, start, Some(last)),
                None => (head, last, None),
            },
            None => (line, 0.0, None),
        };

        let clip = Clip::new(file, start, end);

        if clip.end_secs.is_none() {
            if clip.is_generator() {
                return Err(self.error(format!("generator clip '{file}' needs an end time")));
            }
            if clip.is_image() {
                return Err(self.error(format!("image clip '{file}' needs an end time")));
            }
        }

        if let Some(end) = clip.end_secs {
            if end <= clip.start_secs {
                return Err(self.error(format!(
                    "clip '{file}' ends at {end} before it starts at {start}"
                )));
            }
        }

        self.script.clips.push(clip);
        Ok(())
    }
}

/// Split off the first whitespace-delimited word.
fn split_word(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (text, ""),
    }
}

/// Exactly two timecodes.
fn time_pair(text: &str) -> Option<(f64, f64)> {
    let (first, rest) = split_word(text);
    let (second, tail) = split_word(rest);
    if !tail.is_empty() {
        return None;
    }
    Some((parse_timecode(first)?, parse_timecode(second)?))
}

/// `3x` or `2.5x` as a speed of `1/3` or `1/2.5`.
fn parse_speed_factor(text: &str) -> Option<f64> {
    let factor = text.strip_suffix('x')?;
    let (whole, frac) = match factor.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (factor, None),
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits(whole) || frac.is_some_and(|f| !digits(f)) {
        return None;
    }
    let factor: f64 = factor.parse().ok()?;
    (factor > 0.0).then(|| 1.0 / factor)
}

/// `+3` or `-1`.
fn parse_score_delta(text: &str) -> Option<i64> {
    let digits = text.strip_prefix('+').or_else(|| text.strip_prefix('-'))?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn strip_trailing_timecode(text: &str) -> Option<(&str, f64)> {
    let (head, last) = text.trim_end().rsplit_once(char::is_whitespace)?;
    let time = parse_timecode(last)?;
    let head = head.trim_end();
    (!head.is_empty()).then_some((head, time))
}

/// POSIX-shell style word splitting with single quotes, double quotes
/// and backslash escapes.
fn shell_split(text: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err("unterminated single quote".to_string()),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\' | '$' | '`')) => current.push(c),
                            Some(c) => {
                                current.push('\\');
                                current.push(c);
                            }
                            None => return Err("unterminated double quote".to_string()),
                        },
                        Some(c) => current.push(c),
                        None => return Err("unterminated double quote".to_string()),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some(c) => current.push(c),
                    None => return Err("trailing backslash".to_string()),
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }

    if in_word {
        words.push(current);
    }

    Ok(words)
}
