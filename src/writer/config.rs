use std::collections::HashMap;

use parquet::basic::{Compression, Encoding, ZstdLevel};
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use parquet::format::KeyValue;
use parquet::schema::types::ColumnPath;

use crate::schema::columns;

/// Compression codec of the Parquet sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    /// ZSTD at the given level
    Zstd(i32),
    /// Snappy
    Snappy,
    /// No compression
    Uncompressed,
}

impl Default for CompressionType {
    fn default() -> Self {
        Self::Zstd(3)
    }
}

impl CompressionType {
    /// Smallest files, slowest write
    pub fn max_compression() -> Self {
        Self::Zstd(22)
    }

    /// ZSTD level 3
    pub fn balanced() -> Self {
        Self::Zstd(3)
    }

    /// Fastest compressed write
    pub fn fast() -> Self {
        Self::Snappy
    }

    fn to_parquet(self) -> Compression {
        match self {
            CompressionType::Zstd(level) => {
                Compression::ZSTD(ZstdLevel::try_new(level).unwrap_or_default())
            }
            CompressionType::Snappy => Compression::SNAPPY,
            CompressionType::Uncompressed => Compression::UNCOMPRESSED,
        }
    }
}

/// Configuration of the Parquet batch sink
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Compression codec
    pub compression: CompressionType,

    /// Maximum rows per row group.
    /// Aligning this with the extraction chunk size gives one row group per batch.
    pub row_group_size: usize,

    /// Data page size in bytes
    pub data_page_size: usize,

    /// Write column chunk statistics
    pub write_statistics: bool,

    /// Dictionary page size limit in bytes
    pub dictionary_page_size_limit: usize,

    /// Use BYTE_STREAM_SPLIT for the value column
    pub use_byte_stream_split: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            compression: CompressionType::Zstd(9),
            row_group_size: 250_000,
            data_page_size: 1024 * 1024,
            write_statistics: true,
            dictionary_page_size_limit: 1024 * 1024,
            use_byte_stream_split: true,
        }
    }
}

impl WriterConfig {
    /// Smallest files for archival
    pub fn max_compression() -> Self {
        Self {
            compression: CompressionType::Zstd(22),
            row_group_size: 1_000_000,
            data_page_size: 2 * 1024 * 1024,
            dictionary_page_size_limit: 2 * 1024 * 1024,
            ..Self::default()
        }
    }

    /// Fast writing, larger files
    pub fn fast_write() -> Self {
        Self {
            compression: CompressionType::Snappy,
            row_group_size: 100_000,
            data_page_size: 512 * 1024,
            dictionary_page_size_limit: 512 * 1024,
            ..Self::default()
        }
    }

    /// Same as [`WriterConfig::default`]
    pub fn balanced() -> Self {
        Self::default()
    }

    /// Build Parquet writer properties carrying `metadata` in the footer
    pub(super) fn to_writer_properties(
        &self,
        metadata: &HashMap<String, String>,
    ) -> WriterProperties {
        let statistics = if self.write_statistics {
            EnabledStatistics::Chunk
        } else {
            EnabledStatistics::None
        };

        let mut builder = WriterProperties::builder()
            .set_compression(self.compression.to_parquet())
            .set_data_page_size_limit(self.data_page_size)
            .set_dictionary_page_size_limit(self.dictionary_page_size_limit)
            .set_statistics_enabled(statistics)
            .set_max_row_group_size(self.row_group_size);

        // Series keys and annotations repeat for long runs of rows
        let dict_columns = [
            columns::CODE,
            columns::LOCATION_CODE,
            columns::FLAG,
            columns::FLAG_SOURCE,
            columns::COMMENT,
            columns::USER,
        ];
        for col in dict_columns {
            builder = builder
                .set_column_dictionary_enabled(ColumnPath::new(vec![col.to_string()]), true);
        }

        builder = builder
            .set_column_dictionary_enabled(ColumnPath::new(vec![columns::VALUE.to_string()]), false);
        if self.use_byte_stream_split {
            builder = builder.set_column_encoding(
                ColumnPath::new(vec![columns::VALUE.to_string()]),
                Encoding::BYTE_STREAM_SPLIT,
            );
        }

        let kv_metadata: Vec<KeyValue> = metadata
            .iter()
            .map(|(k, v)| KeyValue {
                key: k.clone(),
                value: Some(v.clone()),
            })
            .collect();

        builder.set_key_value_metadata(Some(kv_metadata)).build()
    }
}
