pub type ReelResult<T> = Result<T, ReelError>;

#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    #[error("engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("staging error: {0}")]
    Staging(String),

    #[error("execution error: {0}")]
    Execution(String),

    #[error("busy: {0}")]
    Busy(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse failure classification surfaced to the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    EngineUnavailable,
    Validation,
    Staging,
    Execution,
    Busy,
    Internal,
}

impl ReelError {
    pub fn engine_unavailable(msg: impl Into<String>) -> Self {
        Self::EngineUnavailable(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn staging(msg: impl Into<String>) -> Self {
        Self::Staging(msg.into())
    }

    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    pub fn busy(msg: impl Into<String>) -> Self {
        Self::Busy(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::EngineUnavailable(_) => FailureKind::EngineUnavailable,
            Self::Validation(_) => FailureKind::Validation,
            Self::Staging(_) => FailureKind::Staging,
            Self::Execution(_) => FailureKind::Execution,
            Self::Busy(_) => FailureKind::Busy,
            Self::Serde(_) | Self::Other(_) => FailureKind::Internal,
        }
    }

    /// The single status line shown to the user for this failure.
    ///
    /// Validation messages are already written for the user and pass through; everything else
    /// collapses into a generic line so engine internals never leak into the UI.
    pub fn status_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::EngineUnavailable(_) => {
                "Could not load the transcoding engine. Reload and try again.".to_string()
            }
            Self::Busy(_) => "A video is already being generated.".to_string(),
            Self::Staging(_) | Self::Execution(_) | Self::Serde(_) | Self::Other(_) => {
                "Something went wrong while exporting. Please try again.".to_string()
            }
        }
    }
}
