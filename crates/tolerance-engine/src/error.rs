use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToleranceError {
    /// The sample is not a usable flat numeric sequence.
    #[error("Input format error: {0}")]
    InputFormat(String),

    /// A parameter lies outside the mathematical domain of the formulas.
    #[error("Domain error: {0}")]
    Domain(String),

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Invalid sidedness '{0}': expected Two Sided, Upper or Lower")]
    InvalidSidedness(String),
}

pub type Result<T> = std::result::Result<T, ToleranceError>;
