//! Chunked reading of CSV files.
//!
//! Opening a file runs one scan that infers the column types (up to
//! [`CsvOptions::max_infer_records`] rows) and, when [`CsvOptions::index_offsets`] is set, records
//! the byte position of every row so any chunk can be read with a single seek. Without offsets
//! chunks are read sequentially and an earlier chunk is reached by rewinding to the first row.

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{Position, StringRecord};
use tracing::{debug, warn};

use crate::config::CsvOptions;
use crate::error::{Result, StoreError};
use crate::model::{Dataset, Field, TypeTag};
use crate::parser::{build_column, check_width, field, read_headers, reader_builder, TypeInference};

use super::ChunkSource;

/// Chunk source reading rows from a CSV file on demand
#[derive(Debug)]
pub struct CsvFileSource {
    path: PathBuf,
    options: CsvOptions,
    headers: Vec<String>,
    schema: Vec<TypeTag>,
    reader: Option<csv::Reader<File>>,
    data_start: Position,
    offsets: Option<Vec<Position>>,
    total_rows: Option<usize>,
    /// Index of the row the reader returns next
    cursor: usize,
}

impl CsvFileSource {
    /// Open a file and scan it for the column types
    pub fn open(path: impl AsRef<Path>, options: CsvOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut reader = open_reader(&path, &options)?;
        let headers = read_headers(&mut reader)?;
        let data_start = reader.position().clone();

        let mut inference = vec![TypeInference::new(); headers.len()];
        let mut offsets = options.index_offsets.then(Vec::new);
        let mut record = StringRecord::new();
        let mut rows = 0;
        let mut complete = true;
        loop {
            let position = reader.position().clone();
            if !reader.read_record(&mut record)? {
                break;
            }
            check_width(&record, headers.len())?;
            let sampling = options.max_infer_records.map_or(true, |max| rows < max);
            if sampling {
                for (idx, column) in inference.iter_mut().enumerate() {
                    column.observe(field(&record, idx, &options));
                }
            }
            match offsets.as_mut() {
                Some(offsets) => offsets.push(position),
                None if !sampling => {
                    complete = false;
                    break;
                }
                None => {}
            }
            rows += 1;
        }

        let schema: Vec<TypeTag> = inference.iter().map(TypeInference::resolve).collect();
        let total_rows = complete.then_some(rows);
        reader.seek(data_start.clone())?;
        debug!(
            path = %path.display(),
            columns = headers.len(),
            total_rows = ?total_rows,
            indexed = offsets.is_some(),
            "CSV source opened"
        );

        Ok(Self {
            path,
            options,
            headers,
            schema,
            reader: Some(reader),
            data_start,
            offsets,
            total_rows,
            cursor: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Column names and inferred tags
    pub fn schema(&self) -> Vec<Field> {
        self.headers
            .iter()
            .zip(&self.schema)
            .map(|(name, tag)| Field::new(name.clone(), *tag))
            .collect()
    }

    pub fn is_disposed(&self) -> bool {
        self.reader.is_none()
    }

    fn build_chunk(&self, records: &[StringRecord], start: usize) -> Result<Dataset> {
        let mut dataset = Dataset::new();
        for (idx, (name, tag)) in self.headers.iter().zip(&self.schema).enumerate() {
            let (data, fallbacks) =
                build_column(*tag, records.iter().map(|r| field(r, idx, &self.options)))?;
            if fallbacks > 0 {
                warn!(column = %name, %tag, fallbacks, start, "unparsable fields replaced with zero values");
            }
            dataset.add_column(name.as_str(), data)?;
        }
        dataset.set_row_offset(start);
        Ok(dataset)
    }
}

fn open_reader(path: &Path, options: &CsvOptions) -> Result<csv::Reader<File>> {
    let file = File::open(path)?;
    Ok(reader_builder(options).from_reader(file))
}

impl ChunkSource for CsvFileSource {
    fn read_chunk(&mut self, chunk_index: usize, chunk_size: usize) -> Result<Option<Dataset>> {
        let reader = self.reader.as_mut().ok_or(StoreError::SourceDisposed)?;
        let Some(start) = chunk_index.checked_mul(chunk_size) else {
            return Ok(None);
        };
        if chunk_size == 0 || self.total_rows.is_some_and(|total| start >= total) {
            return Ok(None);
        }

        let mut record = StringRecord::new();
        match &self.offsets {
            Some(offsets) => {
                let Some(position) = offsets.get(start) else {
                    return Ok(None);
                };
                reader.seek(position.clone())?;
                self.cursor = start;
            }
            None => {
                if start < self.cursor {
                    reader.seek(self.data_start.clone())?;
                    self.cursor = 0;
                }
                while self.cursor < start {
                    if !reader.read_record(&mut record)? {
                        return Ok(None);
                    }
                    self.cursor += 1;
                }
            }
        }

        let mut records = Vec::with_capacity(chunk_size.min(self.total_rows.unwrap_or(chunk_size)));
        while records.len() < chunk_size {
            if !reader.read_record(&mut record)? {
                break;
            }
            check_width(&record, self.headers.len())?;
            records.push(record.clone());
            self.cursor += 1;
        }
        if records.is_empty() {
            return Ok(None);
        }
        self.build_chunk(&records, start).map(Some)
    }

    fn reset(&mut self) -> Result<()> {
        match self.reader.as_mut() {
            Some(reader) => reader.seek(self.data_start.clone())?,
            None => {
                let mut reader = open_reader(&self.path, &self.options)?;
                read_headers(&mut reader)?;
                self.data_start = reader.position().clone();
                self.reader = Some(reader);
                debug!(path = %self.path.display(), "CSV source reopened");
            }
        }
        self.cursor = 0;
        Ok(())
    }

    fn total_rows(&self) -> Option<usize> {
        self.total_rows
    }

    fn dispose(&mut self) {
        self.reader = None;
    }
}
