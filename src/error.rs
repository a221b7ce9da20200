use thiserror::Error;

/// Main error type for the caption pipeline
#[derive(Error, Debug)]
pub enum CaptionError {
    /// None of the format parsers accepted the input
    #[error("Unsupported subtitle file: no known format matched")]
    FormatUnrecognized,

    /// A single timestamp did not match its layout
    #[error("Unparseable timestamp: {0}")]
    TimestampUnparseable(String),

    /// An analyzer backend could not be initialised or called
    #[error("Analyzer backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Tokenization or furigana synthesis failed for one caption
    #[error("Enrichment failed: {0}")]
    EnrichmentFailed(String),

    /// A track with the same language, title and caption count is already loaded
    #[error("Duplicate track: language={language:?}, title={title:?}, captions={caption_count}")]
    DuplicateTrack {
        language: Option<String>,
        title: Option<String>,
        caption_count: usize,
    },

    /// The load was abandoned (tracks cleared) before enrichment settled
    #[error("Track load abandoned before enrichment completed")]
    LoadAbandoned,

    #[error("Track not found: {0}")]
    TrackNotFound(usize),

    #[error("Caption not found: {0}")]
    CaptionNotFound(String),

    #[error("No caption is active at {0:.3}s")]
    NoActiveCaption(f64),

    #[error("Export error: {0}")]
    Export(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, CaptionError>;
