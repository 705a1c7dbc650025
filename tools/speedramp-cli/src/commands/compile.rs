//! Compile an editing script.

use std::path::PathBuf;
use std::sync::Arc;

use speedramp_common::config::AppConfig;
use speedramp_render_engine::{compile_project, CompileJob, FfprobeProbe};

use super::read_script;

pub async fn run(script: Option<PathBuf>, output: PathBuf, config: AppConfig) -> anyhow::Result<()> {
    let script_text = read_script(script.as_deref())?;

    let probe = FfprobeProbe::new();
    if !probe.is_available() {
        anyhow::bail!("ffprobe not found in PATH; run `speedramp check`");
    }

    let job = CompileJob {
        script_text,
        output_dir: output,
        config,
    };

    let compiled = compile_project(job, Arc::new(probe))
        .await
        .map_err(|e| anyhow::anyhow!("Compile failed: {e}"))?;

    for path in &compiled.written {
        eprintln!("Wrote {}", path.display());
    }
    eprintln!(
        "Output length: {:.3}s from {:.3}s of footage",
        compiled.planned.plan.total_output_secs(),
        compiled.planned.plan.timeline.total_secs()
    );

    println!("{}", compiled.ffmpeg_args.join("\n"));

    Ok(())
}
