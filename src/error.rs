use thiserror::Error;

/// Why a pipeline stage did not complete.
#[derive(Debug, Error)]
pub enum StageError {
    /// The model or image source failed.
    #[error("upstream failure: {0:#}")]
    Upstream(anyhow::Error),

    /// Reading or writing the listing failed.
    #[error("storage failure: {0:#}")]
    Storage(anyhow::Error),

    /// The listing disappeared between stages.
    #[error("listing {0} vanished from the store")]
    EntityVanished(String),
}

impl StageError {
    pub fn is_upstream(&self) -> bool {
        matches!(self, StageError::Upstream(_))
    }
}
