//! Raw media sources and the filename-keyed media table.
//!
//! Every clip and sound cue refers to its source by filename. The
//! [`MediaTable`] owns one [`RawMedia`] per distinct filename, created on
//! first reference, and memoizes the probed duration so each file is
//! probed at most once per run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use speedramp_common::error::{SpeedrampError, SpeedrampResult};

/// What kind of source a filename denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// Regular video or audio file with a probeable duration.
    Footage,
    /// Still image, looped for as long as its clip lasts.
    Image,
    /// Subprocess streaming raw frames (`|command`), unbounded.
    Generator,
}

impl MediaKind {
    /// Classify a filename.
    pub fn classify(name: &str) -> Self {
        if name.starts_with('|') {
            Self::Generator
        } else if [".jpg", ".jpeg", ".png"]
            .iter()
            .any(|ext| name.ends_with(ext))
        {
            Self::Image
        } else {
            Self::Footage
        }
    }
}

/// Result of probing a media file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Natural duration in seconds.
    pub duration_secs: f64,

    /// Video width, when the file has a video stream.
    pub width: Option<u32>,

    /// Video height, when the file has a video stream.
    pub height: Option<u32>,
}

impl MediaInfo {
    pub fn with_duration(duration_secs: f64) -> Self {
        Self {
            duration_secs,
            width: None,
            height: None,
        }
    }
}

/// A raw media source shared by every clip that references it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMedia {
    /// Filename exactly as written in the script.
    pub name: String,

    /// Source kind derived from the filename.
    pub kind: MediaKind,

    /// Probe result, once known.
    pub info: Option<MediaInfo>,
}

impl RawMedia {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind: MediaKind::classify(&name),
            name,
            info: None,
        }
    }

    /// Only regular files are handed to the prober.
    pub fn needs_probe(&self) -> bool {
        self.kind == MediaKind::Footage && self.info.is_none()
    }

    /// Natural duration; `None` while unprobed or for unbounded sources.
    pub fn duration_secs(&self) -> Option<f64> {
        self.info.map(|info| info.duration_secs)
    }
}

/// Filename-keyed table of raw media.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaTable {
    entries: BTreeMap<String, RawMedia>,
}

impl MediaTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the entry for `name`, creating it on first reference.
    pub fn entry(&mut self, name: &str) -> &mut RawMedia {
        self.entries
            .entry(name.to_string())
            .or_insert_with(|| RawMedia::new(name))
    }

    /// Memoize a probe result.
    pub fn record_probe(&mut self, name: &str, info: MediaInfo) {
        self.entry(name).info = Some(info);
    }

    /// Filenames still waiting for a probe, in sorted order.
    pub fn pending_probes(&self) -> Vec<String> {
        self.entries
            .values()
            .filter(|media| media.needs_probe())
            .map(|media| media.name.clone())
            .collect()
    }

    /// Natural duration of `name`.
    ///
    /// Fails for unknown files, files not probed yet, and unbounded sources.
    pub fn duration_secs(&self, name: &str) -> SpeedrampResult<f64> {
        let media = self
            .entries
            .get(name)
            .ok_or_else(|| SpeedrampError::probe(name, "media was never registered"))?;

        media.duration_secs().ok_or_else(|| match media.kind {
            MediaKind::Footage => SpeedrampError::probe(name, "duration has not been probed"),
            MediaKind::Image | MediaKind::Generator => {
                SpeedrampError::probe(name, "source has no natural duration")
            }
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(MediaKind::classify("GOPR0001.MP4"), MediaKind::Footage);
        assert_eq!(MediaKind::classify("title.png"), MediaKind::Image);
        assert_eq!(MediaKind::classify("photo.jpeg"), MediaKind::Image);
        assert_eq!(MediaKind::classify("|./build/generate-logo"), MediaKind::Generator);
    }

    #[test]
    fn test_entry_is_created_once() {
        let mut table = MediaTable::new();
        table.entry("a.mp4");
        table.entry("a.mp4");
        table.entry("b.mp4");
        assert_eq!(table.len(), 2);
        assert_eq!(table.pending_probes(), vec!["a.mp4", "b.mp4"]);
    }

    #[test]
    fn test_probe_is_memoized() {
        let mut table = MediaTable::new();
        table.entry("a.mp4");
        table.record_probe("a.mp4", MediaInfo::with_duration(12.5));
        assert!(table.pending_probes().is_empty());
        assert_eq!(table.duration_secs("a.mp4").unwrap(), 12.5);
    }

    #[test]
    fn test_generators_and_images_are_not_probed() {
        let mut table = MediaTable::new();
        table.entry("|gen");
        table.entry("still.png");
        assert!(table.pending_probes().is_empty());
        assert!(matches!(
            table.duration_secs("|gen"),
            Err(SpeedrampError::Probe { .. })
        ));
    }

    #[test]
    fn test_unknown_media_fails() {
        let table = MediaTable::new();
        assert!(table.duration_secs("missing.mp4").is_err());
    }
}
