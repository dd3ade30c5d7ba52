use thiserror::Error;

/// Narrative generation failures. The session absorbs all of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NarrativeError {
    #[error("narrator unavailable: {0}")]
    Unavailable(String),

    #[error("narrator timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("narrator returned an empty {0}")]
    EmptyResponse(&'static str),
}
