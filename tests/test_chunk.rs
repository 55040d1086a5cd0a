use edfconv::chunk::{chunk_boundaries, chunk_ranges};

#[test]
fn boundaries_cover_zero_to_stop() {
    for stop in [0usize, 1, 999, 1000, 1001, 9999, 10_000, 5_000_000] {
        for div in [1usize, 7, 1000, 3000, 5_000_000] {
            let b = chunk_boundaries(stop, div);
            assert_eq!(b[0], 0, "stop={stop} div={div}");
            assert_eq!(*b.last().unwrap(), stop, "stop={stop} div={div}");
            assert!(b.windows(2).all(|w| w[0] < w[1]), "stop={stop} div={div}: {b:?}");
        }
    }
}

#[test]
fn interior_gaps_equal_div() {
    for stop in [1usize, 2999, 3000, 3001, 10_000, 123_457] {
        for div in [1usize, 1000, 3000] {
            let b = chunk_boundaries(stop, div);
            // Every gap but the last equals div; the last holds the remainder.
            for w in b[..b.len() - 1].windows(2) {
                assert_eq!(w[1] - w[0], div, "stop={stop} div={div}");
            }
            let last_gap = b[b.len() - 1] - b[b.len() - 2];
            assert!(last_gap <= div.max(stop), "stop={stop} div={div}");
            assert!(last_gap > 0);
        }
    }
}

#[test]
fn zero_length_block_yields_no_ranges() {
    let b = chunk_boundaries(0, 3000);
    assert_eq!(b, vec![0]);
    assert_eq!(chunk_ranges(&b).count(), 0);
}

#[test]
fn exact_multiple_has_no_undersized_tail() {
    for k in 1..=5 {
        let b = chunk_boundaries(3000 * k, 3000);
        assert_eq!(b.len(), k + 1);
        assert!(b.windows(2).all(|w| w[1] - w[0] == 3000));
    }
}

#[test]
fn reference_plan_for_standard_job() {
    // 10 000 samples in 3000-sample chunks: three full ranges + remainder.
    let b = chunk_boundaries(10_000, 3000);
    assert_eq!(b, vec![0, 3000, 6000, 9000, 10_000]);
    let ranges: Vec<_> = chunk_ranges(&b).collect();
    assert_eq!(ranges, vec![(0, 3000), (3000, 6000), (6000, 9000), (9000, 10_000)]);
}

#[test]
fn block_shorter_than_chunk_is_single_range() {
    let b = chunk_boundaries(42, 3000);
    assert_eq!(b, vec![0, 42]);
}
