use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("shape mismatch: {left:?} vs {right:?}")]
    ShapeMismatch { left: [usize; 3], right: [usize; 3] },

    #[error("{var} is not set on this system; this data root is required here")]
    MissingRoot { var: &'static str },

    #[error("{failed} of {total} units failed")]
    UnitFailures { failed: usize, total: usize },
}

impl EvalError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
