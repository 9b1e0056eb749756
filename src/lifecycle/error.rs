//! Failures the job lifecycle reports to the user.

use thiserror::Error;

/// Every failure collapses the client back to the upload surface; the
/// `Display` text is the toast shown for it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("Please select a valid audio file (MP3, WAV, M4A, FLAC, OGG, WMA)")]
    InvalidType { extension: Option<String> },

    #[error("File size must be less than 100MB")]
    TooLarge { size: u64 },

    #[error("Please select a file first")]
    NoFileSelected,

    #[error("An analysis is already in progress")]
    JobInProgress,

    #[error("Error uploading file: {0}")]
    UploadFailed(String),

    #[error("Error checking status: {0}")]
    StatusUnavailable(String),

    /// Carries the server-reported message verbatim.
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    #[error("Error loading results: {0}")]
    ResultsUnavailable(String),

    /// `reset()` ran while the upload was in flight.
    #[error("Analysis was reset before the upload finished")]
    Superseded,
}
