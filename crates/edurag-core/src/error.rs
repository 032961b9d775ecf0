use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid subject name '{0}': use letters, digits, '_' or '-'")]
    InvalidSubject(String),
}

pub type Result<T> = std::result::Result<T, Error>;
