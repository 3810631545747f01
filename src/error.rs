use thiserror::Error;

/// Failure taxonomy for the request-to-chart pipeline.
///
/// Every stage returns one of these instead of throwing past the
/// orchestrator; the state machine pattern-matches on the variant to decide
/// which step to fall back to.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The completion's schema answer was unusable: transport failure,
    /// non-JSON text, or an empty metric/dimension list.
    #[error("schema inference failed: {0}")]
    SchemaParse(String),

    /// Dataset synthesis produced nothing renderable: transport failure,
    /// empty decoded row set, or rows missing a requested field.
    #[error("dataset synthesis failed: {0}")]
    Synthesis(String),

    /// No encoding could be derived from the rows (empty input or no axis
    /// candidate in the first row).
    #[error("chart encoding failed: {0}")]
    Encoding(String),
}
