use crate::audio::EngineError;

/// Result alias that carries the custom [`SoundRadarError`] type.
pub type Result<T> = std::result::Result<T, SoundRadarError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum SoundRadarError {
    /// The audio engine refused to initialise. This is the only failure that
    /// is surfaced to the user; the session stays stopped.
    #[error("failed to initialize capture driver (status 0x{status:08X})")]
    EngineInit { status: u32 },
    /// Any other fault reported by the audio engine outside the frame path.
    #[error("audio engine error: {0}")]
    Engine(#[from] EngineError),
    /// A device index that does not exist in the current catalog.
    #[error("device index {index} out of range (catalog has {len} entries)")]
    InvalidDeviceIndex { index: usize, len: usize },
    /// Free-form message for conditions that have no dedicated variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl SoundRadarError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for SoundRadarError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for SoundRadarError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
