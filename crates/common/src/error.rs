//! Error types shared across speedramp crates.

/// Top-level error type for speedramp operations.
#[derive(Debug, thiserror::Error)]
pub enum SpeedrampError {
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Probe error for {media}: {message}")]
    Probe { media: String, message: String },

    #[error("Mapping error: {message}")]
    Mapping { message: String },

    #[error("Sound {next} overlaps previous sound {previous} by {overlap_secs} seconds")]
    Overlap {
        previous: String,
        next: String,
        overlap_secs: f64,
    },

    #[error("Invalid timeline: {message}")]
    InvalidTimeline { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using SpeedrampError.
pub type SpeedrampResult<T> = Result<T, SpeedrampError>;

impl SpeedrampError {
    pub fn parse(line: usize, msg: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: msg.into(),
        }
    }

    pub fn probe(media: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Probe {
            media: media.into(),
            message: msg.into(),
        }
    }

    pub fn mapping(msg: impl Into<String>) -> Self {
        Self::Mapping {
            message: msg.into(),
        }
    }

    pub fn invalid_timeline(msg: impl Into<String>) -> Self {
        Self::InvalidTimeline {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_names_line() {
        let err = SpeedrampError::parse(12, "score specified with no video");
        assert_eq!(
            err.to_string(),
            "Parse error on line 12: score specified with no video"
        );
    }

    #[test]
    fn test_overlap_error_names_both_sounds() {
        let err = SpeedrampError::Overlap {
            previous: "a.flac".to_string(),
            next: "b.flac".to_string(),
            overlap_secs: 0.5,
        };
        let msg = err.to_string();
        assert!(msg.contains("a.flac"));
        assert!(msg.contains("b.flac"));
        assert!(msg.contains("0.5"));
    }

    #[test]
    fn test_config_error_message() {
        let err = SpeedrampError::config("render.width must be positive");
        assert_eq!(
            err.to_string(),
            "Configuration error: render.width must be positive"
        );
    }
}
