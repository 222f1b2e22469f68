//! Chunk partitioning.
//!
//! A batch of `n` records is split into contiguous chunks of `⌈n / workers⌉`
//! records, preserving order. The result never has more chunks than workers
//! and has at least one chunk whenever the batch is non-empty.

/// Size of each chunk (the last one may be shorter). A worker count of zero is
/// treated as one.
pub fn chunk_size(len: usize, workers: usize) -> usize {
  len.div_ceil(workers.max(1)).max(1)
}

/// Split `items` into at most `workers` contiguous, order-preserving chunks.
pub fn partition<T>(items: Vec<T>, workers: usize) -> Vec<Vec<T>> {
  if items.is_empty() {
    return Vec::new();
  }

  let size = chunk_size(items.len(), workers);
  let mut chunks = Vec::with_capacity(items.len().div_ceil(size));
  let mut iter = items.into_iter().peekable();
  while iter.peek().is_some() {
    chunks.push(iter.by_ref().take(size).collect());
  }
  chunks
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_batch_has_no_chunks() {
    assert!(partition(Vec::<u32>::new(), 4).is_empty());
  }

  #[test]
  fn near_equal_contiguous_chunks() {
    let chunks = partition((0..10).collect::<Vec<_>>(), 4);
    assert_eq!(chunks, vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8], vec![9]]);
  }

  #[test]
  fn never_more_chunks_than_workers() {
    for len in 1..60usize {
      for workers in 1..12usize {
        let chunks = partition((0..len).collect::<Vec<_>>(), workers);
        assert!(!chunks.is_empty());
        assert!(chunks.len() <= workers, "len={len} workers={workers}");
        let flat: Vec<usize> = chunks.into_iter().flatten().collect();
        assert_eq!(flat, (0..len).collect::<Vec<_>>());
      }
    }
  }

  #[test]
  fn fewer_records_than_workers() {
    let chunks = partition(vec!['a', 'b'], 8);
    assert_eq!(chunks, vec![vec!['a'], vec!['b']]);
  }

  #[test]
  fn zero_workers_means_one_chunk() {
    assert_eq!(partition(vec![1, 2, 3], 0), vec![vec![1, 2, 3]]);
  }
}
