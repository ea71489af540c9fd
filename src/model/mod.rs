//! Data model: type tags, cell values, typed columns and the dataset

mod column;
mod dataset;
mod schema;
mod value;

pub use column::{Column, ColumnData, ColumnElement};
pub(crate) use column::{float_to_i32, parse_cell, zero_value};
pub use dataset::Dataset;
pub use schema::{DataKind, Field, TypeTag};
pub use value::CellValue;
