/// Errors that can occur while writing batches to Parquet
#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from the Arrow library while building record batches
    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    /// Error from the Parquet library during file writing
    #[error("Parquet error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    /// Error serializing series metadata
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error reading the PI-XML source
    #[error("PI-XML error: {0}")]
    PiXmlError(#[from] crate::pixml::PiXmlError),

    /// A batch does not fit the file being written
    #[error("Invalid data: {0}")]
    InvalidData(String),
}
