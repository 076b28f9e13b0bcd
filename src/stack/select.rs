/// Rearrange `values` in place so the `rmin` smallest values occupy the
/// first `rmin` positions and the `rmax` largest occupy the last `rmax`
/// positions; the middle region is left in unspecified order.
///
/// Runs `rmin + rmax` selection passes over a shrinking range, which is
/// cheaper than a full sort when `rmin + rmax` is small relative to the
/// array length. No allocation.
pub fn select_extremes<T: Copy + PartialOrd>(values: &mut [T], rmin: usize, rmax: usize) {
    let n = values.len();
    let rmin = rmin.min(n);

    for i in 0..rmin {
        let mut min_idx = i;
        for j in (i + 1)..n {
            if values[j] < values[min_idx] {
                min_idx = j;
            }
        }
        values.swap(i, min_idx);
    }

    let rmax = rmax.min(n - rmin);
    for i in 0..rmax {
        let hi = n - 1 - i;
        let mut max_idx = rmin;
        for j in (rmin + 1)..=hi {
            if values[j] > values[max_idx] {
                max_idx = j;
            }
        }
        values.swap(hi, max_idx);
    }
}
