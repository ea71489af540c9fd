use crate::error::{Result, StoreError};
use crate::model::Dataset;

use super::ChunkSource;

/// Chunk source slicing a dataset already held in memory
#[derive(Debug, Clone)]
pub struct MemorySource {
    dataset: Dataset,
    disposed: bool,
}

impl MemorySource {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            disposed: false,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }
}

impl ChunkSource for MemorySource {
    fn read_chunk(&mut self, chunk_index: usize, chunk_size: usize) -> Result<Option<Dataset>> {
        if self.disposed {
            return Err(StoreError::SourceDisposed);
        }
        let len = self.dataset.len();
        let Some(start) = chunk_index.checked_mul(chunk_size) else {
            return Ok(None);
        };
        if start >= len || chunk_size == 0 {
            return Ok(None);
        }
        let end = start.saturating_add(chunk_size).min(len);
        self.dataset.slice(start, end).map(Some)
    }

    fn reset(&mut self) -> Result<()> {
        if self.disposed {
            return Err(StoreError::SourceDisposed);
        }
        Ok(())
    }

    fn total_rows(&self) -> Option<usize> {
        Some(self.dataset.len())
    }

    fn dispose(&mut self) {
        self.dataset = Dataset::new();
        self.disposed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(n: i32) -> Dataset {
        let mut ds = Dataset::new();
        ds.add_column("n", (0..n).collect::<Vec<i32>>()).unwrap();
        ds
    }

    #[test]
    fn test_read_chunks_by_index() {
        let mut source = MemorySource::new(numbers(7));
        let chunk = source.read_chunk(1, 3).unwrap().unwrap();
        assert_eq!(chunk.get_column::<i32>("n").unwrap(), &[3, 4, 5]);
        assert_eq!(chunk.row_id(0), Some(3));

        let last = source.read_chunk(2, 3).unwrap().unwrap();
        assert_eq!(last.len(), 1);
        assert!(source.read_chunk(3, 3).unwrap().is_none());
        assert!(source.read_chunk(usize::MAX, 2).unwrap().is_none());
    }

    #[test]
    fn test_dispose() {
        let mut source = MemorySource::new(numbers(3));
        source.dispose();
        assert!(matches!(source.read_chunk(0, 2), Err(StoreError::SourceDisposed)));
        assert!(source.reset().is_err());
        assert_eq!(source.total_rows(), Some(0));
    }
}
