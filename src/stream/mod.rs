//! Chunked streaming over in-memory datasets and CSV files.
//!
//! A [`ChunkSource`] hands out bounded-size [`Dataset`] chunks by index; [`ChunkStream`] drives a
//! source forward and offers iteration, mapping, filtering and collection on top of it.

mod csv_file;
mod memory;
mod rows;

use std::path::Path;

use tracing::debug;

use crate::config::{CsvOptions, StreamConfig};
use crate::error::{Result, StoreError};
use crate::filter::filter_with_predicate;
use crate::model::Dataset;

pub use csv_file::CsvFileSource;
pub use memory::MemorySource;
pub use rows::{Row, RowIter};

/// A backend that can produce a dataset in chunks
pub trait ChunkSource {
    /// Rows `[chunk_index * chunk_size, (chunk_index + 1) * chunk_size)`, or `None` once past the end
    fn read_chunk(&mut self, chunk_index: usize, chunk_size: usize) -> Result<Option<Dataset>>;

    /// Return to the first chunk
    fn reset(&mut self) -> Result<()>;

    /// Total row count, when known ahead of time
    fn total_rows(&self) -> Option<usize>;

    /// Release held resources; later reads fail until the source is reset (if it can be)
    fn dispose(&mut self);
}

impl<S: ChunkSource + ?Sized> ChunkSource for Box<S> {
    fn read_chunk(&mut self, chunk_index: usize, chunk_size: usize) -> Result<Option<Dataset>> {
        (**self).read_chunk(chunk_index, chunk_size)
    }

    fn reset(&mut self) -> Result<()> {
        (**self).reset()
    }

    fn total_rows(&self) -> Option<usize> {
        (**self).total_rows()
    }

    fn dispose(&mut self) {
        (**self).dispose()
    }
}

/// Pull-based driver reading chunks of a source in order
pub struct ChunkStream<S: ChunkSource> {
    source: S,
    config: StreamConfig,
    next_index: usize,
    exhausted: bool,
}

impl ChunkStream<MemorySource> {
    /// Stream an in-memory dataset
    pub fn from_dataset(dataset: Dataset, config: StreamConfig) -> Result<Self> {
        Self::new(MemorySource::new(dataset), config)
    }
}

impl ChunkStream<CsvFileSource> {
    /// Stream a CSV file
    pub fn from_csv(path: impl AsRef<Path>, options: CsvOptions, config: StreamConfig) -> Result<Self> {
        Self::new(CsvFileSource::open(path, options)?, config)
    }
}

impl<S: ChunkSource> ChunkStream<S> {
    /// Wrap a source; the chunk size must be positive
    pub fn new(source: S, config: StreamConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(StoreError::InvalidIndex { index: 0, len: 0 });
        }
        debug!(
            chunk_size = config.chunk_size,
            prefetch = config.prefetch_chunks,
            total_rows = ?source.total_rows(),
            "chunk stream created"
        );
        Ok(Self {
            source,
            config,
            next_index: 0,
            exhausted: false,
        })
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Chunks handed out since creation or the last reset
    pub fn chunks_read(&self) -> usize {
        self.next_index
    }

    pub fn total_rows(&self) -> Option<usize> {
        self.source.total_rows()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// The next chunk, or `None` once the source is drained.
    ///
    /// The previous chunk belongs to the caller and is released when they drop it.
    pub fn next_chunk(&mut self) -> Result<Option<Dataset>> {
        if self.exhausted {
            return Ok(None);
        }
        let chunk = match self.source.read_chunk(self.next_index, self.config.chunk_size) {
            Ok(chunk) => chunk,
            Err(err) => {
                self.exhausted = true;
                return Err(err);
            }
        };
        match chunk {
            Some(chunk) if !chunk.is_empty() => {
                debug!(index = self.next_index, rows = chunk.len(), "chunk read");
                self.next_index += 1;
                Ok(Some(chunk))
            }
            _ => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    /// Rewind the stream and its source to the first chunk
    pub fn reset(&mut self) -> Result<()> {
        self.source.reset()?;
        self.next_index = 0;
        self.exhausted = false;
        Ok(())
    }

    /// Release the source's resources
    pub fn dispose(&mut self) {
        self.source.dispose();
        self.exhausted = true;
    }

    /// Call `f` with each remaining chunk
    pub fn for_each<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(&Dataset),
    {
        while let Some(chunk) = self.next_chunk()? {
            f(&chunk);
        }
        Ok(())
    }

    /// Collect `f` applied to each remaining chunk
    pub fn map<R, F>(&mut self, mut f: F) -> Result<Vec<R>>
    where
        F: FnMut(&Dataset) -> R,
    {
        let mut out = Vec::new();
        while let Some(chunk) = self.next_chunk()? {
            out.push(f(&chunk));
        }
        Ok(out)
    }

    /// Filter every remaining chunk row by row and combine the survivors.
    ///
    /// The predicate receives the chunk-local row index and the chunk. When nothing survives the
    /// result still carries the source schema.
    pub fn filter<F>(&mut self, mut predicate: F) -> Result<Dataset>
    where
        F: FnMut(usize, &Dataset) -> bool,
    {
        let mut result: Option<Dataset> = None;
        let mut schema: Option<Dataset> = None;
        while let Some(chunk) = self.next_chunk()? {
            let kept = filter_with_predicate(&chunk, &mut predicate)?;
            if schema.is_none() {
                schema = Some(chunk.empty_like());
            }
            if kept.is_empty() {
                continue;
            }
            match result.as_mut() {
                Some(acc) => acc.append_dataset(&kept)?,
                None => result = Some(kept),
            }
        }
        Ok(result.or(schema).unwrap_or_default())
    }

    /// Concatenate every remaining chunk into one dataset
    pub fn to_dataset(&mut self) -> Result<Dataset> {
        let mut result = Dataset::new();
        while let Some(chunk) = self.next_chunk()? {
            result.append_dataset(&chunk)?;
        }
        Ok(result)
    }

    /// Iterate over the remaining chunks
    pub fn chunks(&mut self) -> Chunks<'_, S> {
        Chunks { stream: self }
    }

    /// Iterate row by row, fetching chunks as needed
    pub fn rows(&mut self) -> RowIter<'_, S> {
        RowIter::new(self)
    }
}

/// Iterator over the remaining chunks of a [`ChunkStream`]
pub struct Chunks<'a, S: ChunkSource> {
    stream: &'a mut ChunkStream<S>,
}

impl<S: ChunkSource> Iterator for Chunks<'_, S> {
    type Item = Result<Dataset>;

    fn next(&mut self) -> Option<Self::Item> {
        self.stream.next_chunk().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ColumnData;

    fn five_rows() -> Dataset {
        let mut ds = Dataset::new();
        ds.add_column("id", vec![1, 2, 3, 4, 5]).unwrap();
        ds.add_column("name", ColumnData::from_strs(&["a", "b", "c", "d", "e"]))
            .unwrap();
        ds
    }

    #[test]
    fn test_chunk_sizes_and_reset() {
        let mut stream = ChunkStream::from_dataset(five_rows(), StreamConfig::new(2)).unwrap();
        let sizes = stream.map(|c| c.len()).unwrap();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert!(stream.next_chunk().unwrap().is_none());

        stream.reset().unwrap();
        let all = stream.to_dataset().unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all.get_column::<i32>("id").unwrap(), &[1, 2, 3, 4, 5]);
        assert_eq!(all.row_id(4), Some(4));
    }

    #[test]
    fn test_empty_source_yields_no_chunks() {
        let mut stream = ChunkStream::from_dataset(Dataset::new(), StreamConfig::new(3)).unwrap();
        assert_eq!(stream.chunks().count(), 0);
        assert_eq!(stream.chunks_read(), 0);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert!(ChunkStream::from_dataset(five_rows(), StreamConfig::new(0)).is_err());
    }

    #[test]
    fn test_filter_across_chunks() {
        let mut stream = ChunkStream::from_dataset(five_rows(), StreamConfig::new(2)).unwrap();
        let odd = stream
            .filter(|row, chunk| {
                chunk
                    .get_column_value::<i32>(row, "id")
                    .map(|id| id % 2 == 1)
                    .unwrap_or(false)
            })
            .unwrap();
        assert_eq!(odd.get_column::<i32>("id").unwrap(), &[1, 3, 5]);

        stream.reset().unwrap();
        let none = stream.filter(|_, _| false).unwrap();
        assert_eq!(none.len(), 0);
        assert_eq!(none.column_names(), vec!["id", "name"]);
    }

    #[test]
    fn test_for_each_and_iterator() {
        let mut stream = ChunkStream::from_dataset(five_rows(), StreamConfig::new(4)).unwrap();
        let mut total = 0;
        stream.for_each(|c| total += c.len()).unwrap();
        assert_eq!(total, 5);

        stream.reset().unwrap();
        let chunks: Vec<Dataset> = stream.chunks().collect::<Result<_>>().unwrap();
        assert_eq!(chunks.len(), 2);
    }
}
