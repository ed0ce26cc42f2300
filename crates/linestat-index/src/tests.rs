#[cfg(test)]
mod tests {
    use crate::CompressedIndex;

    /// Reference model: a plain bitmap.
    struct Bitmap(Vec<bool>);

    impl Bitmap {
        fn mark(&mut self, start: usize, end: usize) {
            let end = end.min(self.0.len());
            for i in start.min(end)..end {
                self.0[i] = true;
            }
        }

        fn check(&self, start: usize, end: usize) -> bool {
            let end = end.min(self.0.len());
            (start.min(end)..end).any(|i| self.0[i])
        }
    }

    /// Small deterministic generator so the sequences are reproducible.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self, bound: usize) -> usize {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((self.0 >> 33) as usize) % bound
        }
    }

    // ──────────────────────────────────────────
    // Construction
    // ──────────────────────────────────────────

    #[test]
    fn test_capacity_rounds_up_to_power_of_two() {
        assert_eq!(CompressedIndex::new(0).capacity(), 1);
        assert_eq!(CompressedIndex::new(5).capacity(), 8);
        assert_eq!(CompressedIndex::new(64).capacity(), 64);
        assert_eq!(CompressedIndex::new(65).capacity(), 128);
    }

    #[test]
    fn test_new_index_is_empty() {
        let index = CompressedIndex::new(100);
        assert!(index.is_empty());
        assert!(!index.check(0, 100));
    }

    // ──────────────────────────────────────────
    // Mark / check
    // ──────────────────────────────────────────

    #[test]
    fn test_check_sees_only_intersecting_marks() {
        let mut index = CompressedIndex::new(64);
        index.mark(10, 20);
        assert!(index.check(15, 16));
        assert!(index.check(0, 11));
        assert!(index.check(19, 40));
        assert!(!index.check(0, 10));
        assert!(!index.check(20, 64));
    }

    #[test]
    fn test_empty_interval_is_never_marked() {
        let mut index = CompressedIndex::new(16);
        index.mark(0, 16);
        assert!(!index.check(4, 4));
        assert!(!index.check(9, 3));
    }

    #[test]
    fn test_out_of_bounds_is_clamped() {
        let mut index = CompressedIndex::new(16);
        index.mark(12, 1000);
        assert!(index.check(15, 16));
        assert!(!index.check(16, 2000));
        assert!(!index.check(500, 600));
    }

    #[test]
    fn test_full_mark_collapses_to_single_leaf() {
        let mut index = CompressedIndex::new(1024);
        for i in (0..1024).step_by(2) {
            index.mark(i, i + 1);
        }
        assert!(index.node_count() > 1);
        for i in (1..1024).step_by(2) {
            index.mark(i, i + 1);
        }
        assert!(index.is_full());
        assert_eq!(index.node_count(), 1);
    }

    #[test]
    fn test_remarking_collapsed_region_is_noop() {
        let mut index = CompressedIndex::new(256);
        index.mark(0, 128);
        let nodes = index.node_count();
        index.mark(10, 90);
        index.mark(0, 128);
        assert_eq!(index.node_count(), nodes);
    }

    #[test]
    fn test_marked_runs_merge_adjacent_leaves() {
        let mut index = CompressedIndex::new(32);
        index.mark(3, 7);
        index.mark(7, 9);
        index.mark(20, 21);
        assert_eq!(index.marked_runs(), vec![(3, 9), (20, 21)]);
    }

    #[test]
    fn test_from_lines_marks_single_positions() {
        let index = CompressedIndex::from_lines(10, [1, 4, 5]);
        assert!(index.check(1, 2));
        assert!(!index.check(2, 4));
        assert_eq!(index.marked_runs(), vec![(1, 2), (4, 6)]);
    }

    #[test]
    fn test_clear_resets() {
        let mut index = CompressedIndex::new(8);
        index.mark(0, 3);
        index.clear();
        assert!(index.is_empty());
        assert!(!index.check(0, 8));
    }

    // ──────────────────────────────────────────
    // Agreement with a bitmap
    // ──────────────────────────────────────────

    #[test]
    fn test_matches_bitmap_model() {
        let mut rng = Lcg(7);
        for round in 0..20 {
            let capacity = 1 + rng.next(300);
            let mut index = CompressedIndex::new(capacity);
            let mut model = Bitmap(vec![false; index.capacity()]);

            for _ in 0..(5 + round) {
                let a = rng.next(capacity + 10);
                let b = a + rng.next(40);
                index.mark(a, b);
                model.mark(a, b);

                for _ in 0..30 {
                    let x = rng.next(capacity + 10);
                    let y = x + rng.next(50);
                    assert_eq!(index.check(x, y), model.check(x, y), "check({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn test_marking_is_monotonic() {
        let mut rng = Lcg(99);
        let mut index = CompressedIndex::new(128);
        let mut seen = Vec::new();
        for _ in 0..40 {
            let a = rng.next(128);
            let b = a + 1 + rng.next(10);
            index.mark(a, b);
            seen.push((a, b));
            for &(x, y) in &seen {
                assert!(index.check(x, y));
            }
        }
    }
}
