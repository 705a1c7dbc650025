//! Media probing through ffprobe.

use std::future::Future;
use std::process::Command;
use std::sync::Arc;

use serde_json::Value;
use speedramp_common::error::{SpeedrampError, SpeedrampResult};
use speedramp_project_model::{MediaInfo, MediaTable};
use tokio::task::JoinSet;

/// Source of media durations and dimensions.
pub trait MediaProbe: Send + Sync + 'static {
    /// Probe one media file.
    fn probe(&self, media: &str) -> impl Future<Output = SpeedrampResult<MediaInfo>> + Send;

    /// Probe backend name.
    fn name(&self) -> &str;
}

/// Probes media by running `ffprobe` and reading its JSON output.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    binary: String,
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self {
            binary: "ffprobe".to_string(),
        }
    }
}

impl FfprobeProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_available(&self) -> bool {
        command_exists(&self.binary)
    }
}

impl MediaProbe for FfprobeProbe {
    async fn probe(&self, media: &str) -> SpeedrampResult<MediaInfo> {
        let output = tokio::process::Command::new(&self.binary)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration:stream=width,height",
                "-of",
                "json",
            ])
            .arg(media)
            .output()
            .await
            .map_err(|e| SpeedrampError::probe(media, format!("failed to run {}: {e}", self.binary)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SpeedrampError::probe(
                media,
                format!("{} exited with {}: {}", self.binary, output.status, stderr.trim()),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_ffprobe_json(media, &stdout)
    }

    fn name(&self) -> &str {
        "ffprobe"
    }
}

/// Read duration and the first video stream's size from ffprobe JSON.
pub fn parse_ffprobe_json(media: &str, json: &str) -> SpeedrampResult<MediaInfo> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| SpeedrampError::probe(media, format!("unreadable ffprobe output: {e}")))?;

    let duration_secs = value
        .pointer("/format/duration")
        .and_then(|d| match d {
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        })
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| SpeedrampError::probe(media, "no duration in ffprobe output"))?;

    let size = value
        .get("streams")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .find_map(|stream| {
            let width = stream.get("width")?.as_u64()?;
            let height = stream.get("height")?.as_u64()?;
            Some((u32::try_from(width).ok()?, u32::try_from(height).ok()?))
        });

    Ok(MediaInfo {
        duration_secs,
        width: size.map(|(w, _)| w),
        height: size.map(|(_, h)| h),
    })
}

/// Probe every media file in `table` that still needs it, concurrently.
///
/// Each distinct file is probed once. The first failure aborts the rest.
pub async fn probe_media<P: MediaProbe>(table: &mut MediaTable, probe: Arc<P>) -> SpeedrampResult<()> {
    let pending = table.pending_probes();
    if pending.is_empty() {
        return Ok(());
    }

    tracing::info!(files = pending.len(), backend = probe.name(), "Probing media");

    let mut tasks = JoinSet::new();
    for media in pending {
        let probe = Arc::clone(&probe);
        tasks.spawn(async move {
            let result = probe.probe(&media).await;
            (media, result)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (media, result) = joined.map_err(|e| SpeedrampError::Other(e.into()))?;
        match result {
            Ok(info) => {
                tracing::debug!(media = %media, duration_secs = info.duration_secs, "Probed media");
                table.record_probe(&media, info);
            }
            Err(e) => {
                tasks.abort_all();
                return Err(e);
            }
        }
    }

    Ok(())
}

/// Whether `binary` can be found on `PATH`.
pub fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
