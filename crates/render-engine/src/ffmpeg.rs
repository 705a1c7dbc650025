//! ffmpeg command line construction.
//!
//! Inputs are laid out as: one input per clip in script order, then the
//! overlay renderer's raw RGBA stream, then the generated sound stream.

use speedramp_common::config::{AppConfig, RenderDefaults};
use speedramp_common::error::{SpeedrampError, SpeedrampResult};
use speedramp_common::timecode::FPS;
use speedramp_processing_core::RetimePlan;
use speedramp_project_model::{Clip, Script};

use crate::expr::WarpExpr;

/// Decoder arguments and `-i` for one clip.
pub fn input_args(clip: &Clip, render: &RenderDefaults) -> SpeedrampResult<Vec<String>> {
    let mut args = Vec::new();

    if clip.start_secs > 0.0 {
        args.extend(["-ss".to_string(), clip.start_secs.to_string()]);
    }

    if let Some(end) = clip.end_secs {
        args.extend(["-to".to_string(), end.to_string()]);
    }

    if clip.is_generator() {
        args.extend([
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pixel_format".to_string(),
            "rgb32".to_string(),
            "-video_size".to_string(),
            video_size(render),
            "-framerate".to_string(),
            FPS.to_string(),
        ]);
    } else if clip.is_image() {
        if clip.end_secs.is_none() {
            return Err(SpeedrampError::invalid_timeline(format!(
                "still image {} has no end time",
                clip.media
            )));
        }
        args.extend([
            "-framerate".to_string(),
            FPS.to_string(),
            "-loop".to_string(),
            "1".to_string(),
        ]);
    }

    args.extend(["-i".to_string(), clip.media.clone()]);
    Ok(args)
}

fn video_size(render: &RenderDefaults) -> String {
    format!("{}x{}", render.width, render.height)
}

/// The `-filter_complex` graph: scale, concatenate, retime, trim, overlay.
pub fn build_filter_graph(
    script: &Script,
    plan: &RetimePlan,
    overlay_input: usize,
    render: &RenderDefaults,
) -> String {
    let mut graph = String::new();

    for (i, clip) in script.clips.iter().enumerate() {
        if clip.is_generator() {
            continue;
        }
        graph.push_str(&format!("[{i}]"));
        if !clip.filters.is_empty() {
            graph.push_str(&clip.filters.join(","));
            graph.push(',');
        }
        graph.push_str(&format!("scale={}:{}[sv{i}];", render.width, render.height));
    }

    for (i, clip) in script.clips.iter().enumerate() {
        if clip.is_generator() {
            graph.push_str(&format!("[{i}]"));
        } else {
            graph.push_str(&format!("[sv{i}]"));
        }
    }

    let expr = WarpExpr::from_segments(&plan.map);
    graph.push_str(&format!(
        "concat=n={clips}:v=1:a=0[ccv];[ccv]setpts='{expr}',trim=duration={total}[outv];[outv][{overlay_input}]overlay[overoutv]",
        clips = script.clips.len(),
        total = plan.total_output_secs(),
    ));

    graph
}

/// Full ffmpeg argument list, without the output file.
pub fn build_ffmpeg_args(
    script: &Script,
    plan: &RetimePlan,
    config: &AppConfig,
) -> SpeedrampResult<Vec<String>> {
    let render = &config.render;
    let mut args = Vec::new();

    for clip in &script.clips {
        args.extend(input_args(clip, render)?);
    }

    let overlay_input = script.clips.len();
    args.extend([
        "-f".to_string(),
        "rawvideo".to_string(),
        "-pixel_format".to_string(),
        "rgba".to_string(),
        "-video_size".to_string(),
        video_size(render),
        "-framerate".to_string(),
        FPS.to_string(),
        "-i".to_string(),
        format!("|./{}", config.artifacts.overlay_script),
    ]);

    let sound_input = overlay_input + 1;
    args.extend([
        "-ar".to_string(),
        render.audio_sample_rate.to_string(),
        "-ac".to_string(),
        render.audio_channels.to_string(),
        "-f".to_string(),
        "s24le".to_string(),
        "-c:a".to_string(),
        "pcm_s24le".to_string(),
        "-i".to_string(),
        format!("|./{}", config.artifacts.sound_script),
    ]);

    args.extend([
        "-filter_complex".to_string(),
        build_filter_graph(script, plan, overlay_input, render),
        "-map".to_string(),
        "[overoutv]".to_string(),
        "-map".to_string(),
        format!("{sound_input}:a"),
    ]);

    tracing::debug!(args = args.len(), inputs = sound_input + 1, "Built ffmpeg arguments");

    Ok(args)
}
