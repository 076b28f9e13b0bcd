use coadd::stack::select_extremes;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Check the partition property: the first `rmin` values are each <= every
/// middle value and the last `rmax` values are each >= every middle value.
fn assert_partitioned(values: &[f32], rmin: usize, rmax: usize) {
    let n = values.len();
    let middle = &values[rmin..n - rmax];
    for (i, &low) in values[..rmin].iter().enumerate() {
        for &m in middle {
            assert!(low <= m, "low[{i}]={low} > middle value {m}");
        }
    }
    for (i, &high) in values[n - rmax..].iter().enumerate() {
        for &m in middle {
            assert!(high >= m, "high[{i}]={high} < middle value {m}");
        }
    }
}

fn pseudo_random(len: usize, seed: u32) -> Vec<f32> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 8) as f32 / 16_777_216.0
        })
        .collect()
}

// ---------------------------------------------------------------------------
// select_extremes
// ---------------------------------------------------------------------------

#[test]
fn test_basic_partition() {
    let mut values = vec![5.0f32, 1.0, 9.0, 3.0, 7.0, 2.0, 8.0, 4.0, 6.0];
    select_extremes(&mut values, 2, 2);
    assert_partitioned(&values, 2, 2);
    let mut lows = values[..2].to_vec();
    lows.sort_by(f32::total_cmp);
    assert_eq!(lows, vec![1.0, 2.0]);
    let mut highs = values[7..].to_vec();
    highs.sort_by(f32::total_cmp);
    assert_eq!(highs, vec![8.0, 9.0]);
}

#[test]
fn test_zero_counts_is_noop() {
    let original = vec![3.0f32, 1.0, 2.0];
    let mut values = original.clone();
    select_extremes(&mut values, 0, 0);
    assert_eq!(values, original);
}

#[test]
fn test_only_minima() {
    let mut values = pseudo_random(50, 7);
    select_extremes(&mut values, 5, 0);
    assert_partitioned(&values, 5, 0);
}

#[test]
fn test_only_maxima() {
    let mut values = pseudo_random(50, 11);
    select_extremes(&mut values, 0, 7);
    assert_partitioned(&values, 0, 7);
}

#[test]
fn test_random_arrays_all_count_combinations() {
    for seed in [1u32, 2, 3] {
        for rmin in 0..4usize {
            for rmax in 0..4usize {
                let mut values = pseudo_random(16, seed);
                select_extremes(&mut values, rmin, rmax);
                assert_partitioned(&values, rmin, rmax);
            }
        }
    }
}

#[test]
fn test_duplicates() {
    let mut values = vec![2.0f32, 2.0, 1.0, 2.0, 3.0, 2.0, 1.0, 3.0];
    select_extremes(&mut values, 2, 2);
    assert_partitioned(&values, 2, 2);
    assert_eq!(values[0], 1.0);
    assert_eq!(values[1], 1.0);
    assert_eq!(values[6], 3.0);
    assert_eq!(values[7], 3.0);
}

#[test]
fn test_already_sorted() {
    let mut values: Vec<f32> = (0..20).map(|i| i as f32).collect();
    select_extremes(&mut values, 3, 3);
    assert_partitioned(&values, 3, 3);
}

#[test]
fn test_reverse_sorted() {
    let mut values: Vec<f32> = (0..20).rev().map(|i| i as f32).collect();
    select_extremes(&mut values, 3, 3);
    assert_partitioned(&values, 3, 3);
}

#[test]
fn test_counts_cover_whole_array() {
    // rmin + rmax == len: everything ends up selected, middle is empty.
    let mut values = vec![4.0f32, 2.0, 8.0, 6.0];
    select_extremes(&mut values, 2, 2);
    assert!(values[0] <= values[1]);
    assert!(values[2] <= values[3]);
    assert!(values[1] <= values[2]);
}

#[test]
fn test_single_element() {
    let mut values = vec![1.5f32];
    select_extremes(&mut values, 1, 0);
    assert_eq!(values, vec![1.5]);
}

#[test]
fn test_counts_exceeding_length_are_clamped() {
    let mut values = vec![3.0f32, 1.0, 2.0];
    select_extremes(&mut values, 10, 10);
    assert!(values[0] <= values[1] && values[1] <= values[2]);
}
