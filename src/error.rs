/// Errors raised by the spectral pipeline and its collaborators.
///
/// Every violated invariant surfaces here; nothing in the pipeline clamps or
/// truncates its way past bad input.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Malformed or out-of-range parameters or data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Two independently sized series disagree with the index contract.
    #[error("Alignment error: expected {expected}, got {actual} ({detail})")]
    AlignmentError {
        expected: usize,
        actual: usize,
        detail: String,
    },

    /// Upstream data source failed or had nothing to offer.
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// A rendering sink could not present the output.
    #[error("Render failed: {0}")]
    RenderFailed(String),
}

impl PipelineError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        PipelineError::InvalidInput(msg.into())
    }

    pub(crate) fn unavailable(msg: impl Into<String>) -> Self {
        PipelineError::DataUnavailable(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
