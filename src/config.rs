//! Configuration for CSV import/export and chunked streaming

use serde::{Deserialize, Serialize};

/// Default number of rows per streamed chunk
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// Options for reading and writing CSV text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    /// Field separator
    pub delimiter: u8,
    /// Field text treated as a missing value
    pub null_tokens: Vec<String>,
    /// Decimal digits written for float values
    pub float_precision: usize,
    /// Rows scanned for type inference when streaming; `None` scans the whole file
    pub max_infer_records: Option<usize>,
    /// Keep record byte offsets when streaming so chunks can be read by seeking
    pub index_offsets: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            null_tokens: vec![String::new(), "NULL".to_string()],
            float_precision: 2,
            max_infer_records: None,
            index_offsets: true,
        }
    }
}

impl CsvOptions {
    /// Set the field delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Replace the null tokens
    pub fn with_null_tokens(mut self, tokens: Vec<String>) -> Self {
        self.null_tokens = tokens;
        self
    }

    /// Set the number of decimals written for floats
    pub fn with_float_precision(mut self, precision: usize) -> Self {
        self.float_precision = precision;
        self
    }

    /// Limit how many rows type inference scans when streaming
    pub fn with_max_infer_records(mut self, max: usize) -> Self {
        self.max_infer_records = Some(max);
        self
    }

    /// Enable or disable record offset indexing when streaming
    pub fn with_index_offsets(mut self, index: bool) -> Self {
        self.index_offsets = index;
        self
    }

    /// Whether a raw field stands for a missing value
    pub fn is_null(&self, field: &str) -> bool {
        self.null_tokens.iter().any(|t| t == field)
    }
}

/// Chunk size and prefetch depth for [`crate::stream::ChunkStream`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Rows per chunk; must be positive
    pub chunk_size: usize,
    /// Chunks to read ahead (advisory, reads stay synchronous)
    pub prefetch_chunks: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            prefetch_chunks: 1,
        }
    }
}

impl StreamConfig {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            ..Default::default()
        }
    }

    pub fn with_prefetch_chunks(mut self, chunks: usize) -> Self {
        self.prefetch_chunks = chunks;
        self
    }
}

/// Combined configuration used by the command line front end
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub csv: CsvOptions,
    pub stream: StreamConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_csv(mut self, csv: CsvOptions) -> Self {
        self.csv = csv;
        self
    }

    pub fn with_stream(mut self, stream: StreamConfig) -> Self {
        self.stream = stream;
        self
    }
}
