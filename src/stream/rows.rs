use indexmap::IndexMap;

use crate::error::Result;
use crate::model::{CellValue, Dataset};

use super::{ChunkSource, ChunkStream};

/// One row keyed by column name, in column order
pub type Row = IndexMap<String, CellValue>;

/// Row-by-row iterator over a [`ChunkStream`]; chunks are fetched as the rows run out
pub struct RowIter<'a, S: ChunkSource> {
    stream: &'a mut ChunkStream<S>,
    current: Option<Dataset>,
    pos: usize,
}

impl<'a, S: ChunkSource> RowIter<'a, S> {
    pub fn new(stream: &'a mut ChunkStream<S>) -> Self {
        Self {
            stream,
            current: None,
            pos: 0,
        }
    }

    fn row_at(chunk: &Dataset, row: usize) -> Result<Row> {
        let values = chunk.row(row)?;
        Ok(chunk
            .column_names()
            .into_iter()
            .map(str::to_string)
            .zip(values)
            .collect())
    }
}

impl<S: ChunkSource> Iterator for RowIter<'_, S> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(chunk) = &self.current {
                if self.pos < chunk.len() {
                    let row = Self::row_at(chunk, self.pos);
                    self.pos += 1;
                    return Some(row);
                }
            }
            match self.stream.next_chunk() {
                Ok(Some(chunk)) => {
                    self.current = Some(chunk);
                    self.pos = 0;
                }
                Ok(None) => {
                    self.current = None;
                    return None;
                }
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::StreamConfig;
    use crate::model::ColumnData;

    use super::*;

    #[test]
    fn test_rows_cross_chunk_boundaries() {
        let mut ds = Dataset::new();
        ds.add_column("id", vec![1, 2, 3]).unwrap();
        ds.add_column("tag", ColumnData::from_strs(&["x", "y", "z"]))
            .unwrap();
        let mut stream = ChunkStream::from_dataset(ds, StreamConfig::new(2)).unwrap();

        let rows: Vec<Row> = stream.rows().collect::<Result<_>>().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2]["id"], CellValue::Int(Some(3)));
        assert_eq!(rows[1]["tag"], CellValue::Str(Some("y".to_string())));
        assert_eq!(rows[0].keys().collect::<Vec<_>>(), vec!["id", "tag"]);
        assert_eq!(stream.chunks_read(), 2);
    }
}
