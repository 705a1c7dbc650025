//! Compile jobs: script text in, helper scripts and ffmpeg arguments out.

use std::path::PathBuf;
use std::sync::Arc;

use speedramp_common::config::AppConfig;
use speedramp_common::error::{SpeedrampError, SpeedrampResult};
use speedramp_processing_core::RetimePlan;
use speedramp_project_model::{parse_script, MediaTable, ParseOptions, Script};

use crate::artifacts::Artifacts;
use crate::ffmpeg::build_ffmpeg_args;
use crate::probe::{probe_media, MediaProbe};

/// A compile job ready to run.
#[derive(Debug, Clone)]
pub struct CompileJob {
    /// Full text of the editing script.
    pub script_text: String,

    /// Directory the helper scripts are written to.
    pub output_dir: PathBuf,

    /// Effective configuration, CLI overrides already applied.
    pub config: AppConfig,
}

/// A parsed, probed and retimed script.
#[derive(Debug, Clone)]
pub struct PlannedScript {
    pub script: Script,
    pub media: MediaTable,
    pub plan: RetimePlan,
}

/// Result of a compile job.
#[derive(Debug, Clone)]
pub struct CompiledProject {
    pub planned: PlannedScript,
    pub artifacts: Artifacts,

    /// Paths of the written helper scripts.
    pub written: Vec<PathBuf>,

    /// ffmpeg arguments, one per element, without the output file.
    pub ffmpeg_args: Vec<String>,
}

/// Parser settings derived from the configured helper locations.
pub fn parse_options(config: &AppConfig) -> ParseOptions {
    ParseOptions {
        logo_generator: format!("|{}", config.tools.logo_generator_path().display()),
        logo_sound: config.tools.logo_sound_path().display().to_string(),
    }
}

/// Parse `text`, probe its media, and build the retiming plan.
pub async fn plan_script<P: MediaProbe>(
    text: &str,
    config: &AppConfig,
    probe: Arc<P>,
) -> SpeedrampResult<PlannedScript> {
    let script = parse_script(text, &parse_options(config))?;
    if script.clips.is_empty() {
        return Err(SpeedrampError::invalid_timeline("script declares no clips"));
    }

    let mut media = script.media_table();
    probe_media(&mut media, probe).await?;

    let plan = RetimePlan::build(&script, &media, config.timeline.default_speed)?;

    Ok(PlannedScript {
        script,
        media,
        plan,
    })
}

/// Run a compile job end to end.
///
/// This is the main entry point for the `compile` command.
pub async fn compile_project<P: MediaProbe>(
    job: CompileJob,
    probe: Arc<P>,
) -> SpeedrampResult<CompiledProject> {
    tracing::info!(output_dir = %job.output_dir.display(), "Starting compile");

    let planned = plan_script(&job.script_text, &job.config, probe).await?;
    let PlannedScript {
        script,
        media,
        plan,
    } = &planned;

    let artifacts = Artifacts::build(script, plan, media, &job.config)?;
    let written = artifacts.write_to(&job.output_dir, &job.config.artifacts)?;
    let ffmpeg_args = build_ffmpeg_args(script, plan, &job.config)?;

    tracing::info!(
        clips = script.clips.len(),
        output_secs = plan.total_output_secs(),
        artifacts = written.len(),
        "Compile complete"
    );

    Ok(CompiledProject {
        planned,
        artifacts,
        written,
        ffmpeg_args,
    })
}
