use thiserror::Error;

/// Failures raised by the detection, filtering and fitting passes.
///
/// Every variant is raised at the point the precondition is violated; none of
/// them are produced mid-pass once a call has started processing samples.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Unknown strategy / filter order / generator selector.
    #[error("Unrecognized {kind} selector: '{value}'")]
    Configuration { kind: &'static str, value: String },

    #[error("Invalid window: size {window} does not fit a sequence of length {len}")]
    InvalidWindow { window: usize, len: usize },

    #[error("Insufficient data: required {required}, got {got}")]
    InsufficientData { required: usize, got: usize },

    #[error("Degenerate score: {reason}")]
    DegenerateScore { reason: &'static str },

    #[error("Invalid parameter: {name} - {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Normal equations of the least-squares fit have no unique solution.
    #[error("Singular system: normal equations cannot be solved")]
    SingularSystem,
}

pub type Result<T> = std::result::Result<T, Error>;
