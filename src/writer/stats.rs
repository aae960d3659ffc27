use std::fmt;

/// Statistics from a completed write operation
#[derive(Debug, Clone, Default)]
pub struct WriterStats {
    /// Number of batches written
    pub batches_written: usize,
    /// Number of distinct series, including those without events
    pub series_written: usize,
    /// Number of event rows written
    pub rows_written: usize,
    /// Number of Parquet row groups written
    pub row_groups_written: usize,
    /// Total uncompressed size of the row groups in bytes
    pub file_size_bytes: u64,
}

impl fmt::Display for WriterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wrote {} events of {} series from {} batches in {} row groups",
            self.rows_written, self.series_written, self.batches_written, self.row_groups_written
        )
    }
}
