use sentdup_core::SentenceId;

/// Inclusive `(start, end)` id ranges covering `1..=max_id`, each at most `chunk_size` long.
#[derive(Debug, Clone)]
pub struct ChunkedRanges {
    next: SentenceId,
    chunk_size: i64,
    max_id: SentenceId,
}

/// A `chunk_size` below 1 is treated as 1.
pub fn chunked_ranges(chunk_size: i64, max_id: SentenceId) -> ChunkedRanges {
    ChunkedRanges {
        next: 1,
        chunk_size: chunk_size.max(1),
        max_id,
    }
}

impl Iterator for ChunkedRanges {
    type Item = (SentenceId, SentenceId);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.max_id {
            return None;
        }
        let start = self.next;
        let end = start
            .saturating_add(self.chunk_size - 1)
            .min(self.max_id);
        self.next = end.saturating_add(1);
        if end == SentenceId::MAX {
            self.max_id = SentenceId::MIN;
        }
        Some((start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges_cover_without_gaps() {
        let ranges: Vec<_> = chunked_ranges(10, 25).collect();
        assert_eq!(ranges, vec![(1, 10), (11, 20), (21, 25)]);
    }

    #[test]
    fn test_exact_multiple() {
        let ranges: Vec<_> = chunked_ranges(7, 21).collect();
        assert_eq!(ranges, vec![(1, 7), (8, 14), (15, 21)]);
    }

    #[test]
    fn test_empty_store_yields_nothing() {
        assert_eq!(chunked_ranges(10, 0).count(), 0);
        assert_eq!(chunked_ranges(10, -5).count(), 0);
    }

    #[test]
    fn test_chunk_larger_than_store() {
        let ranges: Vec<_> = chunked_ranges(10_000, 21).collect();
        assert_eq!(ranges, vec![(1, 21)]);
    }

    #[test]
    fn test_every_id_covered_once() {
        for size in 1..12 {
            let mut covered = Vec::new();
            for (start, end) in chunked_ranges(size, 30) {
                assert!(end - start < size);
                covered.extend(start..=end);
            }
            assert_eq!(covered, (1..=30).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_non_positive_chunk_size_is_clamped() {
        assert_eq!(chunked_ranges(0, 3).count(), 3);
    }
}
