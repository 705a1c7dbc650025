//! Check for the external tools a render needs.

use std::path::PathBuf;

use speedramp_common::config::{AppConfig, ToolPaths};
use speedramp_render_engine::command_exists;

/// Helper programs the generated artifacts invoke, and whether each exists.
fn helper_status(tools: &ToolPaths) -> Vec<(PathBuf, bool)> {
    [
        tools.overlay_renderer_path(),
        tools.sound_generator_path(),
        tools.logo_generator_path(),
    ]
    .into_iter()
    .map(|path| {
        let exists = path.exists();
        (path, exists)
    })
    .collect()
}

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("speedramp System Check");
    println!("{}", "=".repeat(50));

    let mut all_ok = true;
    for binary in ["ffmpeg", "ffprobe"] {
        if command_exists(binary) {
            println!("[OK] {binary} found in PATH");
        } else {
            println!("[MISSING] {binary} not found in PATH");
            all_ok = false;
        }
    }

    for (helper, exists) in helper_status(&config.tools) {
        if exists {
            println!("[OK] Helper: {}", helper.display());
        } else {
            println!("[WARN] Helper not built: {}", helper.display());
        }
    }

    println!();
    if all_ok {
        println!("ffmpeg and ffprobe are available. speedramp is ready.");
    } else {
        println!("Install ffmpeg (which provides ffprobe) and try again.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helper_status_uses_configured_dir() {
        let mut config = AppConfig::default();
        config.tools.helper_dir = Some(PathBuf::from("/nonexistent/speedramp-helpers"));
        config.tools.sound_generator = "mix-sound".to_string();

        let status = helper_status(&config.tools);
        let paths: Vec<PathBuf> = status.iter().map(|(path, _)| path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/nonexistent/speedramp-helpers/flootay"),
                PathBuf::from("/nonexistent/speedramp-helpers/mix-sound"),
                PathBuf::from("/nonexistent/speedramp-helpers/generate-logo"),
            ]
        );
        assert!(status.iter().all(|(_, exists)| !exists));
    }
}
