//! Show the normalized speed segments of a script.

use std::path::PathBuf;
use std::sync::Arc;

use speedramp_common::config::AppConfig;
use speedramp_common::timecode::format_timecode;
use speedramp_render_engine::{plan_script, FfprobeProbe};

use super::read_script;

pub async fn run(script: Option<PathBuf>, json: bool, config: AppConfig) -> anyhow::Result<()> {
    let text = read_script(script.as_deref())?;
    let planned = plan_script(&text, &config, Arc::new(FfprobeProbe::new()))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to plan script: {e}"))?;
    let map = &planned.plan.map;

    if json {
        println!("{}", serde_json::to_string_pretty(map)?);
        return Ok(());
    }

    println!(
        "{:>3}  {:>12}  {:>12}  {:>12}  {:>12}  {:>6}",
        "#", "input from", "input to", "output from", "output to", "speed"
    );
    for (i, seg) in map.segments().iter().enumerate() {
        println!(
            "{:>3}  {:>12}  {:>12}  {:>12}  {:>12}  {:>5.2}x",
            i,
            format_timecode(seg.input_start_secs),
            format_timecode(seg.input_end_secs()),
            format_timecode(seg.output_start_secs),
            format_timecode(seg.output_end_secs()),
            1.0 / seg.speed,
        );
    }
    println!();
    println!(
        "Footage: {}  Output: {}",
        format_timecode(map.total_input_secs()),
        format_timecode(map.total_output_secs())
    );

    Ok(())
}
