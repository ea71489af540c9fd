//! CSV import with type inference, and CSV export

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, info, warn};

use crate::config::CsvOptions;
use crate::error::{Result, StoreError};
use crate::model::{ColumnData, Dataset, TypeTag};

use super::inference::{build_column, infer_type};

/// Reader turning CSV text into a typed [`Dataset`]
#[derive(Debug, Clone, Default)]
pub struct CsvParser {
    options: CsvOptions,
}

impl CsvParser {
    pub fn new(options: CsvOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CsvOptions {
        &self.options
    }

    /// Parse a file
    pub fn parse_path(&self, path: &Path) -> Result<Dataset> {
        let file = File::open(path)?;
        debug!(path = %path.display(), "reading CSV file");
        self.parse_reader(BufReader::new(file))
    }

    /// Parse CSV text held in memory
    pub fn parse_str(&self, text: &str) -> Result<Dataset> {
        self.parse_reader(text.as_bytes())
    }

    /// Parse everything from a reader.
    ///
    /// All rows are read first so each column's type is inferred from every value before any
    /// typed buffer is built.
    pub fn parse_reader<R: Read>(&self, reader: R) -> Result<Dataset> {
        let mut csv_reader = reader_builder(&self.options).from_reader(reader);
        let headers = read_headers(&mut csv_reader)?;

        let mut records = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            check_width(&record, headers.len())?;
            records.push(record);
        }

        let mut dataset = Dataset::new();
        for (idx, name) in headers.iter().enumerate() {
            let tag = infer_type(records.iter().map(|r| field(r, idx, &self.options)));
            let (data, fallbacks) =
                build_column(tag, records.iter().map(|r| field(r, idx, &self.options)))?;
            if fallbacks > 0 {
                warn!(column = %name, %tag, fallbacks, "unparsable fields replaced with zero values");
            }
            debug!(column = %name, %tag, "inferred column type");
            dataset.add_column(name.as_str(), data)?;
        }

        info!(
            rows = dataset.len(),
            columns = dataset.column_count(),
            "CSV import finished"
        );
        Ok(dataset)
    }
}

pub(crate) fn reader_builder(options: &CsvOptions) -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .flexible(true)
        .delimiter(options.delimiter)
        .trim(csv::Trim::Headers);
    builder
}

/// Column names from the first non-empty line
pub(crate) fn read_headers<R: Read>(reader: &mut csv::Reader<R>) -> Result<Vec<String>> {
    let headers = reader.headers()?;
    if headers.is_empty() {
        return Err(StoreError::EmptyFile);
    }
    Ok(headers.iter().map(|h| h.trim_matches(' ').to_string()).collect())
}

/// Reject rows carrying more fields than there are columns
pub(crate) fn check_width(record: &StringRecord, width: usize) -> Result<()> {
    if record.len() > width {
        let line = record.position().map_or(0, |p| p.line());
        return Err(StoreError::InvalidFormat {
            line,
            message: format!("expected at most {} fields, found {}", width, record.len()),
        });
    }
    Ok(())
}

/// One field of a record; missing trailing fields and null tokens are `None`
pub(crate) fn field<'r>(record: &'r StringRecord, idx: usize, options: &CsvOptions) -> Option<&'r str> {
    record.get(idx).filter(|text| !options.is_null(text))
}

/// Writer turning a [`Dataset`] into CSV text
#[derive(Debug, Clone, Default)]
pub struct CsvWriter {
    options: CsvOptions,
}

impl CsvWriter {
    pub fn new(options: CsvOptions) -> Self {
        Self { options }
    }

    /// Write a header line and one line per row.
    ///
    /// Nulls are empty fields, floats use a fixed number of decimals, and a field is quoted
    /// only when it holds a delimiter, quote or line break.
    pub fn write<W: Write>(&self, dataset: &Dataset, writer: W) -> Result<()> {
        dataset.ensure_balanced()?;
        if dataset.column_count() == 0 {
            return Ok(());
        }
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(self.options.delimiter)
            .quote_style(csv::QuoteStyle::Necessary)
            .from_writer(writer);

        csv_writer.write_record(dataset.column_names())?;
        let columns: Vec<&ColumnData> = dataset.columns().map(|c| c.data()).collect();
        let mut line: Vec<String> = Vec::with_capacity(columns.len());
        for row in 0..dataset.len() {
            line.clear();
            line.extend(
                columns
                    .iter()
                    .map(|data| format_cell(data, row, self.options.float_precision)),
            );
            csv_writer.write_record(&line)?;
        }
        csv_writer.flush()?;

        debug!(
            rows = dataset.len(),
            columns = dataset.column_count(),
            "CSV export finished"
        );
        Ok(())
    }

    pub fn write_path(&self, dataset: &Dataset, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write(dataset, BufWriter::new(file))
    }

    pub fn write_string(&self, dataset: &Dataset) -> Result<String> {
        let mut buf = Vec::new();
        self.write(dataset, &mut buf)?;
        String::from_utf8(buf).map_err(|e| StoreError::InvalidFormat {
            line: 0,
            message: e.to_string(),
        })
    }
}

/// Render one cell as CSV field text
fn format_cell(data: &ColumnData, row: usize, precision: usize) -> String {
    match data {
        ColumnData::Int32(v) => v[row].to_string(),
        ColumnData::Float32(v) => format!("{:.*}", precision, v[row]),
        ColumnData::Utf8(v) => v[row].clone(),
        ColumnData::Char(v) => char::from(v[row]).to_string(),
        ColumnData::Bool(v) => v[row].to_string(),
        ColumnData::NullableInt32(v) => v[row].map(|x| x.to_string()).unwrap_or_default(),
        ColumnData::NullableFloat32(v) => v[row]
            .map(|x| format!("{:.*}", precision, x))
            .unwrap_or_default(),
        ColumnData::NullableUtf8(v) => v[row].clone().unwrap_or_default(),
        ColumnData::NullableChar(v) => v[row]
            .map(|c| char::from(c).to_string())
            .unwrap_or_default(),
        ColumnData::NullableBool(v) => v[row].map(|b| b.to_string()).unwrap_or_default(),
    }
}

/// Parse CSV from any reader with the given options
pub fn read_csv<R: Read>(reader: R, options: &CsvOptions) -> Result<Dataset> {
    CsvParser::new(options.clone()).parse_reader(reader)
}

/// Parse a CSV file
pub fn load_csv(path: impl AsRef<Path>, options: &CsvOptions) -> Result<Dataset> {
    CsvParser::new(options.clone()).parse_path(path.as_ref())
}

/// Parse CSV text with default options
pub fn from_csv_str(text: &str) -> Result<Dataset> {
    CsvParser::default().parse_str(text)
}

/// Write a dataset as CSV to any writer
pub fn write_csv<W: Write>(dataset: &Dataset, writer: W, options: &CsvOptions) -> Result<()> {
    CsvWriter::new(options.clone()).write(dataset, writer)
}

/// Write a dataset to a CSV file
pub fn save_csv(dataset: &Dataset, path: impl AsRef<Path>, options: &CsvOptions) -> Result<()> {
    CsvWriter::new(options.clone()).write_path(dataset, path.as_ref())
}

/// Render a dataset as CSV text with default options
pub fn to_csv_string(dataset: &Dataset) -> Result<String> {
    CsvWriter::default().write_string(dataset)
}

/// Types of a CSV text's columns without building the dataset
pub fn infer_schema(text: &str, options: &CsvOptions) -> Result<Vec<(String, TypeTag)>> {
    let mut csv_reader = reader_builder(options).from_reader(text.as_bytes());
    let headers = read_headers(&mut csv_reader)?;
    let records = csv_reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(headers
        .into_iter()
        .enumerate()
        .map(|(idx, name)| {
            let tag = infer_type(records.iter().map(|r| field(r, idx, options)));
            (name, tag)
        })
        .collect())
}
