
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BibliographError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Compile error: {0}")]
    Compile(String),
    #[error("Parse error: {message}")]
    Parse { message: String },
    #[error("Execution error: {0}")]
    Execution(String),
    #[error("Model transport error: {0}")]
    ModelTransport(String),
    #[error("Model response error: {0}")]
    ModelResponse(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Ingest error: {0}")]
    Ingest(String),
}

pub type Result<T> = std::result::Result<T, BibliographError>;

// Helper conversions
impl From<rusqlite::Error> for BibliographError {
    fn from(e: rusqlite::Error) -> Self { Self::Persistence(e.to_string()) }
}
impl From<csv::Error> for BibliographError {
    fn from(e: csv::Error) -> Self { Self::Ingest(e.to_string()) }
}
