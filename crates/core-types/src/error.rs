use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),
}

impl CoreError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::InvalidInput(field.into(), message.into())
    }

    /// The name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            CoreError::InvalidInput(field, _) => field,
        }
    }
}
