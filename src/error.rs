use thiserror::Error;

/// Errors surfaced by the station twin.
///
/// Every variant is a configuration problem reported straight back to the
/// caller. There is no I/O in the engine, so nothing here is retryable.
#[derive(Debug, Error)]
pub enum TwinError {
    #[error("Invalid latitude: {0} (expected a finite value in [-90, 90])")]
    InvalidLatitude(f64),

    #[error("Invalid longitude: {0} (expected a finite value in [-180, 180])")]
    InvalidLongitude(f64),

    #[error("Invalid altitude: {0} (expected a finite value)")]
    InvalidAltitude(f64),

    #[error("Invalid station id {0:?}: must be 1-64 printable characters")]
    InvalidStationId(String),

    #[error("Station already registered: {0}")]
    DuplicateStation(String),

    #[error("Unknown station: {0}")]
    UnknownStation(String),

    #[error("Invalid climate profile: {0}")]
    InvalidProfile(String),

    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("Invalid retention: window {window} exceeds retention {retention}")]
    InvalidRetention { window: usize, retention: usize },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TwinError {
    /// Whether the error stems from caller-supplied configuration.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, TwinError::Serialization(_))
    }
}

pub type Result<T> = std::result::Result<T, TwinError>;
