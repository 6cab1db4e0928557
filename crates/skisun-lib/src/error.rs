use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the skisun library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Latitude outside [-90, 90] or a non-finite coordinate.
    #[error("invalid coordinate (lat {lat}, lng {lng})")]
    InvalidCoordinate { lat: f64, lng: f64 },

    /// Raised when a planning or scoring request is malformed.
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// Raised by the boundary check when a ski area has nothing to plan over.
    #[error("ski area {ski_area_id} has no open runs matching the selected difficulties")]
    NoEligibleTerrain { ski_area_id: String },

    /// Raised when a ski area id could not be found in the topology store.
    #[error("unknown ski area: {id}{}", format_suggestions(.suggestions))]
    UnknownSkiArea {
        id: String,
        suggestions: Vec<String>,
    },

    /// Raised when a live status snapshot belongs to a different resort.
    #[error("status snapshot is for resort {found}, expected {expected}")]
    ResortMismatch { expected: String, found: String },

    /// Raised when a run or lift descriptor fails validation.
    #[error("invalid topology: {message}")]
    InvalidTopology { message: String },

    /// Raised when the topology directory could not be resolved for this platform.
    #[error("failed to resolve project directories for the topology store")]
    ProjectDirsUnavailable,

    /// Raised when a topology or config file does not exist.
    #[error("file not found at {path}")]
    FileNotFound { path: PathBuf },

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for JSON (de)serialization errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_request(reason: impl Into<String>) -> Self {
        Error::InvalidRequest {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_topology(message: impl Into<String>) -> Self {
        Error::InvalidTopology {
            message: message.into(),
        }
    }
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else if suggestions.len() == 1 {
        format!(". Did you mean '{}'?", suggestions[0])
    } else {
        format!(
            ". Did you mean one of: {}?",
            suggestions
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}
