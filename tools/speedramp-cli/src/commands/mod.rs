pub mod check;
pub mod compile;
pub mod segments;

use std::io::Read;
use std::path::Path;

use anyhow::Context;

/// Read the script from `path`, or from stdin when no path is given.
pub fn read_script(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read script from stdin")?;
            Ok(text)
        }
    }
}
