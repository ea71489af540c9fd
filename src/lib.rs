//! tabstore - In-memory typed column store
//!
//! Named, typed columns held in contiguous buffers, with row filtering, CSV import with type
//! inference, CSV export, and chunked streaming over datasets and CSV files.

pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod parser;
pub mod stats;
pub mod stream;

pub use config::{Config, CsvOptions, StreamConfig};
pub use error::{Result, StoreError};
pub use filter::{filter, filter_with_predicate, logical_and, logical_or, Condition, FilterOp};
pub use model::{CellValue, Column, ColumnData, DataKind, Dataset, Field, TypeTag};
pub use parser::{from_csv_str, load_csv, save_csv, to_csv_string};
pub use stream::{ChunkSource, ChunkStream, CsvFileSource, MemorySource};
