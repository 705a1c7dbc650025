//! Helper scripts handed to ffmpeg as piped inputs.
//!
//! The sound script execs the sound generator with every sound placement.
//! The overlay script is interpreted by the overlay renderer and holds the
//! score, SVG, telemetry and raw overlay blocks, all keyed on output frames.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use speedramp_common::config::{AppConfig, ArtifactNames};
use speedramp_common::error::SpeedrampResult;
use speedramp_processing_core::{
    rewrite_overlay_script, score_track, sequence_sounds, svg_spans, telemetry_tracks,
    RetimePlan, SoundTrack,
};
use speedramp_project_model::{MediaTable, Script};

const INDENT: &str = "        ";

/// Quote `word` for a POSIX shell.
pub fn shell_quote(word: &str) -> String {
    let safe = |c: char| c.is_alphanumeric() || "@%+=:,./-_".contains(c);
    if !word.is_empty() && word.chars().all(safe) {
        return word.to_string();
    }
    format!("'{}'", word.replace('\'', r#"'"'"'"#))
}

/// Text of the sound script.
pub fn sound_script(
    track: &SoundTrack,
    total_output_secs: f64,
    sound_args: &[String],
    generator: &Path,
) -> String {
    let mut words = vec![
        "exec".to_string(),
        shell_quote(&generator.to_string_lossy()),
        "-E".to_string(),
        total_output_secs.to_string(),
    ];
    words.extend(sound_args.iter().map(|arg| shell_quote(arg)));

    for placement in track.placements() {
        words.push("-s".to_string());
        words.push(placement.position_secs.to_string());
        words.push(shell_quote(&placement.file));
    }

    format!("#!/bin/bash\n\n{}\n", words.join(" "))
}

/// Text of the overlay script.
pub fn overlay_script(
    script: &Script,
    plan: &RetimePlan,
    media: &MediaTable,
    config: &AppConfig,
) -> SpeedrampResult<String> {
    let mut out = String::new();
    writeln!(out, "#!{}", config.tools.overlay_renderer_path().display()).ok();

    let scores = score_track(script, plan)?;
    if !scores.is_empty() {
        out.push_str("score {\n");
        for kf in scores.keyframes() {
            writeln!(out, "{INDENT}key_frame {} {{ v {} }}", kf.frame, kf.value).ok();
        }
        out.push_str("}\n\n");
    }

    for svg in svg_spans(script, plan)? {
        writeln!(out, "svg {{").ok();
        writeln!(out, "{INDENT}file \"{}\"", svg.file).ok();
        writeln!(out, "{INDENT}key_frame {} {{ }}", svg.start_frame).ok();
        writeln!(out, "{INDENT}key_frame {} {{ }}", svg.end_frame).ok();
        out.push_str("}\n\n");
    }

    for track in telemetry_tracks(script, plan, media)? {
        writeln!(out, "# {}", track.media).ok();
        out.push_str("speed {\n");
        if script.show_elevation {
            writeln!(out, "{INDENT}elevation").ok();
        }
        if script.show_map {
            writeln!(out, "{INDENT}map").ok();
        }
        writeln!(out, "{INDENT}file \"{}\"", config.artifacts.gpx_file).ok();
        for kf in track.keyframes.keyframes() {
            writeln!(
                out,
                "{INDENT}key_frame {} {{ fps {} timestamp {} }}",
                kf.frame, kf.value.fps, kf.value.timestamp
            )
            .ok();
        }
        out.push_str("}\n\n");
    }

    for clip in script.clips.iter().filter(|clip| !clip.overlay_script.is_empty()) {
        out.push_str(&rewrite_overlay_script(clip, plan)?);
        out.push('\n');
    }

    Ok(out)
}

/// Generated helper scripts for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Artifacts {
    pub sound_script: String,
    pub overlay_script: String,
}

impl Artifacts {
    pub fn build(
        script: &Script,
        plan: &RetimePlan,
        media: &MediaTable,
        config: &AppConfig,
    ) -> SpeedrampResult<Self> {
        let sounds = sequence_sounds(script, plan, media)?;
        let sound_script = sound_script(
            &sounds,
            plan.total_output_secs(),
            &script.sound_args,
            &config.tools.sound_generator_path(),
        );
        let overlay_script = overlay_script(script, plan, media, config)?;

        Ok(Self {
            sound_script,
            overlay_script,
        })
    }

    /// Write both scripts into `dir` as executables.
    pub fn write_to(&self, dir: &Path, names: &ArtifactNames) -> SpeedrampResult<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let mut written = Vec::with_capacity(2);
        for (name, content) in [
            (&names.sound_script, &self.sound_script),
            (&names.overlay_script, &self.overlay_script),
        ] {
            let path = dir.join(name);
            std::fs::write(&path, content)?;
            make_executable(&path)?;
            tracing::debug!(path = %path.display(), bytes = content.len(), "Wrote artifact");
            written.push(path);
        }

        Ok(written)
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> SpeedrampResult<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o775))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> SpeedrampResult<()> {
    Ok(())
}
