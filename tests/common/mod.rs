#![allow(dead_code)]

use ndarray::Array2;

use coadd::frame::Frame;

/// Frame filled with a constant value.
pub fn flat_frame(h: usize, w: usize, fill: f32) -> Frame<f32> {
    Frame::new(Array2::from_elem((h, w), fill))
}

/// Deterministic pseudo-random texture in [0, 1), reproducible across runs.
pub fn texture(h: usize, w: usize, seed: u32) -> Array2<f32> {
    let mut state = seed;
    Array2::from_shape_fn((h, w), |_| {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        (state >> 8) as f32 / 16_777_216.0
    })
}

/// Cyclic translation: `out[y][x] = data[(y + dy) mod h][(x + dx) mod w]`.
///
/// A target built this way from a reference carries the alignment offset
/// `(dx, dy)` (interior windows match exactly; only the wrapped border rows
/// and columns differ from a true translation).
pub fn cyclic_shift(data: &Array2<f32>, dx: i64, dy: i64) -> Array2<f32> {
    let (h, w) = data.dim();
    Array2::from_shape_fn((h, w), |(y, x)| {
        let sy = (y as i64 + dy).rem_euclid(h as i64) as usize;
        let sx = (x as i64 + dx).rem_euclid(w as i64) as usize;
        data[[sy, sx]]
    })
}

/// Isotropic Gaussian blob of unit peak at a (possibly fractional) center.
pub fn gaussian_blob(h: usize, w: usize, cy: f64, cx: f64, sigma: f64) -> Array2<f32> {
    Array2::from_shape_fn((h, w), |(y, x)| {
        let dy = y as f64 - cy;
        let dx = x as f64 - cx;
        (-(dx * dx + dy * dy) / (2.0 * sigma * sigma)).exp() as f32
    })
}
