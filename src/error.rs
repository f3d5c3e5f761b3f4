use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Computation fault inside a filter or scoring stage.
///
/// The orchestrator turns these into `*_EXCEPTION` rejections; they never
/// escape an evaluation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageError {
    #[error("non-finite {what}")]
    NonFinite { what: &'static str },

    #[error("degenerate {what}")]
    Degenerate { what: &'static str },
}

impl StageError {
    pub fn non_finite(what: &'static str) -> Self {
        StageError::NonFinite { what }
    }

    pub fn degenerate(what: &'static str) -> Self {
        StageError::Degenerate { what }
    }
}

/// Fail the stage if `value` is NaN or infinite.
pub fn ensure_finite(value: f64, what: &'static str) -> std::result::Result<f64, StageError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(StageError::non_finite(what))
    }
}
