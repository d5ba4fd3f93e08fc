//! Row-parallel processing utilities.
//!
//! Frame passes split their destination buffer into disjoint, row-aligned
//! chunks and hand each chunk to a rayon worker together with the index of
//! its first row. Sources are shared read-only, so no synchronization is
//! needed beyond the implicit join at the end of the parallel iterator.

use rayon::prelude::*;


/// Multiplier for number of chunks relative to CPU threads.
/// Using 3x threads provides good load balancing when some chunks finish faster.
const CHUNKS_PER_THREAD: usize = 3;

/// Rows per chunk so that `height` splits into roughly `threads * CHUNKS_PER_THREAD` chunks.
#[inline]
pub fn auto_rows_per_chunk(height: usize) -> usize {
    let num_chunks = rayon::current_num_threads() * CHUNKS_PER_THREAD;
    (height / num_chunks).max(1)
}

/// Parallel iterator that prepends `chunk_index * multiplier` to each item.
pub struct WithOffset<I> {
    inner: I,
    multiplier: usize,
}

impl<I> WithOffset<I> {
    fn new(inner: I, multiplier: usize) -> Self {
        Self { inner, multiplier }
    }
}

impl<I> ParallelIterator for WithOffset<I>
where
    I: IndexedParallelIterator,
{
    type Item = (usize, I::Item);

    fn drive_unindexed<C>(self, consumer: C) -> C::Result
    where
        C: rayon::iter::plumbing::UnindexedConsumer<Self::Item>,
    {
        let multiplier = self.multiplier;
        self.inner
            .enumerate()
            .map(move |(idx, item)| (idx * multiplier, item))
            .drive_unindexed(consumer)
    }
}

impl<I> IndexedParallelIterator for WithOffset<I>
where
    I: IndexedParallelIterator,
{
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn drive<C>(self, consumer: C) -> C::Result
    where
        C: rayon::iter::plumbing::Consumer<Self::Item>,
    {
        let multiplier = self.multiplier;
        self.inner
            .enumerate()
            .map(move |(idx, item)| (idx * multiplier, item))
            .drive(consumer)
    }

    fn with_producer<CB>(self, callback: CB) -> CB::Output
    where
        CB: rayon::iter::plumbing::ProducerCallback<Self::Item>,
    {
        let multiplier = self.multiplier;
        self.inner
            .enumerate()
            .map(move |(idx, item)| (idx * multiplier, item))
            .with_producer(callback)
    }
}

/// Parallel iterator over row-aligned mutable chunks that yields `(chunk_start_row, chunk)` pairs.
pub type ParRowsMut<'a, T> = WithOffset<rayon::slice::ChunksMut<'a, T>>;

/// Extension trait splitting a row-major slice into row-aligned parallel chunks.
pub trait ParRowsMutExt<'a, T: Send + 'a> {
    /// Chunks of exactly `rows_per_chunk` rows (the last one may be shorter).
    fn par_rows_mut(&'a mut self, width: usize, rows_per_chunk: usize) -> ParRowsMut<'a, T>;

    /// Chunks sized from the current rayon pool, see [`auto_rows_per_chunk`].
    fn par_rows_mut_auto(&'a mut self, width: usize) -> ParRowsMut<'a, T>;
}

impl<'a, T: Send + 'a> ParRowsMutExt<'a, T> for [T] {
    fn par_rows_mut(&'a mut self, width: usize, rows_per_chunk: usize) -> ParRowsMut<'a, T> {
        assert!(width > 0, "width must be > 0");
        assert!(rows_per_chunk > 0, "rows_per_chunk must be > 0");
        assert_eq!(
            self.len() % width,
            0,
            "slice length must be a multiple of width"
        );
        WithOffset::new(self.par_chunks_mut(width * rows_per_chunk), rows_per_chunk)
    }

    fn par_rows_mut_auto(&'a mut self, width: usize) -> ParRowsMut<'a, T> {
        assert!(width > 0, "width must be > 0");
        let rows_per_chunk = auto_rows_per_chunk(self.len() / width);
        self.par_rows_mut(width, rows_per_chunk)
    }
}
