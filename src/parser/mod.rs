//! CSV codec: type-inferring import and fixed-format export

mod csv;
mod inference;

pub(crate) use self::csv::{check_width, field, read_headers, reader_builder};
pub use self::csv::{
    from_csv_str, infer_schema, load_csv, read_csv, save_csv, to_csv_string, write_csv, CsvParser,
    CsvWriter,
};
pub(crate) use self::inference::build_column;
pub use self::inference::{infer_type, TypeInference};
