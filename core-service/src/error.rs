use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// The artifact store could not be opened or migrated
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Runtime error: {0}")]
    Runtime(core_runtime::Error),

    #[error("Subtitle error: {0}")]
    Subtitle(#[from] core_subtitles::SubtitleError),
}

impl From<core_runtime::Error> for CoreError {
    fn from(err: core_runtime::Error) -> Self {
        match err {
            core_runtime::Error::CapabilityMissing {
                capability,
                message,
            } => Self::CapabilityMissing {
                capability,
                message,
            },
            other => Self::Runtime(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
