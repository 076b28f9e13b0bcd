//! Resampling and accumulation of an aligned frame stack onto one canvas.
//!
//! Two accumulation strategies are selected once per call: a fast path that
//! accumulates sums and narrow counters directly when no rejection and no
//! bad samples are involved, and a slow path that gathers every surviving
//! contribution per pixel, trims outliers with the partial selector, and
//! averages the remainder.

use ndarray::Array2;
use rayon::prelude::*;
use tracing::debug;

use crate::consts::{INTERP_BORDER, PARALLEL_PIXEL_THRESHOLD};
use crate::error::{CoaddError, Result};
use crate::frame::{AlignmentOffset, Frame, RejectionPolicy, Sample};
use crate::kernel::KernelProfile;

use super::geometry::{compute_canvas, CanvasLayout, GeometryMode};
use super::select::select_extremes;

/// Combined output frame and per-pixel contribution map.
///
/// Pixels that received zero surviving contributions hold zero and are
/// marked bad in the output frame's mask.
#[derive(Clone, Debug)]
pub struct CombinedResult<T: Sample> {
    pub frame: Frame<T>,
    pub contributions: Array2<u32>,
}

/// Placement of one frame on the output canvas: integer translation plus a
/// sub-pixel phase rounded to the kernel table's subdivisions, per axis.
#[derive(Clone, Copy, Debug)]
struct Placement {
    mx: i64,
    my: i64,
    phase_x: usize,
    phase_y: usize,
}

impl Placement {
    fn from_offset(layout: &CanvasLayout, offset: &AlignmentOffset) -> Self {
        let (mx, phase_x) = split_axis(layout.start_x - offset.dx);
        let (my, phase_y) = split_axis(layout.start_y - offset.dy);
        Self {
            mx,
            my,
            phase_x,
            phase_y,
        }
    }

    /// A phase of exactly (0, 0) bypasses interpolation entirely.
    fn integer_aligned(&self) -> bool {
        self.phase_x == 0 && self.phase_y == 0
    }

    fn is_identity(&self) -> bool {
        self.integer_aligned() && self.mx == 0 && self.my == 0
    }
}

fn split_axis(placement: f64) -> (i64, usize) {
    let mut int = placement.floor() as i64;
    let (phase, carry) = KernelProfile::round_phase(placement - int as f64);
    int += carry;
    (int, phase)
}

/// Combine a stack of frames into one output using the given offsets,
/// interpolation kernel, rejection policy, and canvas geometry.
pub fn combine<T: Sample>(
    frames: &[Frame<T>],
    offsets: &[AlignmentOffset],
    kernel: &KernelProfile,
    rejection: &RejectionPolicy,
    geometry: GeometryMode,
) -> Result<CombinedResult<T>> {
    let refs: Vec<&Frame<T>> = frames.iter().collect();
    combine_refs(&refs, offsets, kernel, rejection, geometry)
}

/// Like [`combine`], but borrowing frames individually so callers that
/// filter a stack need not clone the survivors.
pub fn combine_refs<T: Sample>(
    frames: &[&Frame<T>],
    offsets: &[AlignmentOffset],
    kernel: &KernelProfile,
    rejection: &RejectionPolicy,
    geometry: GeometryMode,
) -> Result<CombinedResult<T>> {
    if frames.is_empty() {
        return Err(CoaddError::IllegalInput("empty frame stack".into()));
    }
    if offsets.len() != frames.len() {
        return Err(CoaddError::IncompatibleInput(format!(
            "{} offsets for {} frames",
            offsets.len(),
            frames.len()
        )));
    }
    let dim = frames[0].data.dim();
    for (i, frame) in frames.iter().enumerate().skip(1) {
        if frame.data.dim() != dim {
            return Err(CoaddError::IncompatibleInput(format!(
                "frame {} is {:?}, expected {:?}",
                i,
                frame.data.dim(),
                dim
            )));
        }
    }

    let (src_h, src_w) = dim;
    let n = frames.len();
    let (rmin, rmax) = rejection.effective(n);
    let layout = compute_canvas(geometry, src_w, src_h, offsets, rmin, rmax)?;
    let placements: Vec<Placement> = offsets
        .iter()
        .map(|o| Placement::from_offset(&layout, o))
        .collect();

    debug!(
        frames = n,
        width = layout.width,
        height = layout.height,
        rmin,
        rmax,
        mode = %geometry,
        "combining stack"
    );

    if rmin == 0 && rmax == 0 {
        let seed_first = geometry == GeometryMode::First && placements[0].is_identity();
        let skip = if seed_first { 1 } else { 0 };
        if frames.iter().skip(skip).all(|f| !f.has_bad_samples()) {
            return combine_fast(frames, &placements, kernel, &layout, seed_first);
        }
    }
    combine_slow(frames, &placements, kernel, &layout, rmin, rmax)
}

// ---------------------------------------------------------------------------
// Fast path: direct sum/count accumulation
// ---------------------------------------------------------------------------

/// Per-pixel contribution counter: one byte per pixel until any cell
/// saturates, then the whole grid is promoted to 32 bits.
enum CounterGrid {
    Narrow(Vec<u8>),
    Wide(Vec<u32>),
}

impl CounterGrid {
    fn new(len: usize) -> Self {
        CounterGrid::Narrow(vec![0; len])
    }

    #[inline]
    fn increment(&mut self, idx: usize) {
        if let CounterGrid::Narrow(counts) = self {
            if counts[idx] < u8::MAX {
                counts[idx] += 1;
                return;
            }
            let wide: Vec<u32> = counts.iter().map(|&c| c as u32).collect();
            *self = CounterGrid::Wide(wide);
        }
        if let CounterGrid::Wide(counts) = self {
            counts[idx] += 1;
        }
    }

    #[inline]
    fn get(&self, idx: usize) -> u32 {
        match self {
            CounterGrid::Narrow(counts) => counts[idx] as u32,
            CounterGrid::Wide(counts) => counts[idx],
        }
    }
}

fn combine_fast<T: Sample>(
    frames: &[&Frame<T>],
    placements: &[Placement],
    kernel: &KernelProfile,
    layout: &CanvasLayout,
    seed_first: bool,
) -> Result<CombinedResult<T>> {
    let (out_h, out_w) = (layout.height, layout.width);
    let mut sums = vec![0.0f64; out_h * out_w];
    let mut counts = CounterGrid::new(out_h * out_w);

    let skip = if seed_first {
        // Seed the output from a duplicate of the first frame; its bad-sample
        // mask inverts into the initial contribution counts. The mask is
        // copied into fresh counts, never shared.
        let first = frames[0];
        for row in 0..out_h {
            for col in 0..out_w {
                if !first.is_bad(row, col) {
                    let idx = row * out_w + col;
                    sums[idx] = first.data[[row, col]].to_f64();
                    counts.increment(idx);
                }
            }
        }
        1
    } else {
        0
    };

    for (frame, placement) in frames.iter().zip(placements.iter()).skip(skip) {
        accumulate_frame(frame, placement, kernel, layout, &mut sums, &mut counts);
    }

    finalize(&sums, &counts, out_h, out_w)
}

/// Add one frame's contribution to the running sums and counters.
fn accumulate_frame<T: Sample>(
    frame: &Frame<T>,
    placement: &Placement,
    kernel: &KernelProfile,
    layout: &CanvasLayout,
    sums: &mut [f64],
    counts: &mut CounterGrid,
) {
    let (src_h, src_w) = frame.data.dim();
    let (out_h, out_w) = (layout.height, layout.width);

    if placement.integer_aligned() {
        // Exact integer translation: copy samples directly.
        for oy in 0..out_h {
            let sy = oy as i64 + placement.my;
            if sy < 0 || sy >= src_h as i64 {
                continue;
            }
            for ox in 0..out_w {
                let sx = ox as i64 + placement.mx;
                if sx < 0 || sx >= src_w as i64 {
                    continue;
                }
                let idx = oy * out_w + ox;
                sums[idx] += frame.data[[sy as usize, sx as usize]].to_f64();
                counts.increment(idx);
            }
        }
        return;
    }

    let wx = kernel.weights(placement.phase_x);
    let wy = kernel.weights(placement.phase_y);
    let border = INTERP_BORDER as i64;
    for oy in 0..out_h {
        let sy = oy as i64 + placement.my;
        if sy < border || sy >= src_h as i64 - border {
            continue;
        }
        for ox in 0..out_w {
            let sx = ox as i64 + placement.mx;
            if sx < border || sx >= src_w as i64 - border {
                continue;
            }
            let idx = oy * out_w + ox;
            sums[idx] += interpolate(&frame.data, sy as usize, sx as usize, &wx, &wy);
            counts.increment(idx);
        }
    }
}

/// Separable 4-tap interpolation of one sample at integer base (sy, sx).
///
/// Caller guarantees the 4x4 stencil around (sy, sx) is in bounds.
#[inline]
fn interpolate<T: Sample>(
    data: &Array2<T>,
    sy: usize,
    sx: usize,
    wx: &[f64; 4],
    wy: &[f64; 4],
) -> f64 {
    let mut acc = 0.0;
    for (j, &wyj) in wy.iter().enumerate() {
        let row = sy + j - 1;
        let mut row_acc = 0.0;
        for (i, &wxi) in wx.iter().enumerate() {
            row_acc += wxi * data[[row, sx + i - 1]].to_f64();
        }
        acc += wyj * row_acc;
    }
    acc
}

fn finalize<T: Sample>(
    sums: &[f64],
    counts: &CounterGrid,
    out_h: usize,
    out_w: usize,
) -> Result<CombinedResult<T>> {
    let mut data = Array2::from_elem((out_h, out_w), T::zero());
    let mut contributions = Array2::<u32>::zeros((out_h, out_w));
    let mut mask = Array2::from_elem((out_h, out_w), false);
    let mut any_rejected = false;

    for row in 0..out_h {
        for col in 0..out_w {
            let idx = row * out_w + col;
            let count = counts.get(idx);
            contributions[[row, col]] = count;
            if count > 0 {
                data[[row, col]] = T::from_f64(sums[idx] / count as f64);
            } else {
                mask[[row, col]] = true;
                any_rejected = true;
            }
        }
    }

    let frame = if any_rejected {
        Frame::with_mask(data, mask)?
    } else {
        Frame::new(data)
    };
    Ok(CombinedResult {
        frame,
        contributions,
    })
}

// ---------------------------------------------------------------------------
// Slow path: per-pixel sample gathering with outlier trimming
// ---------------------------------------------------------------------------

struct RowOutput<T> {
    values: Vec<T>,
    counts: Vec<u32>,
}

fn combine_slow<T: Sample>(
    frames: &[&Frame<T>],
    placements: &[Placement],
    kernel: &KernelProfile,
    layout: &CanvasLayout,
    rmin: usize,
    rmax: usize,
) -> Result<CombinedResult<T>> {
    let (out_h, out_w) = (layout.height, layout.width);

    let rows: Vec<RowOutput<T>> = if out_h * out_w >= PARALLEL_PIXEL_THRESHOLD {
        (0..out_h)
            .into_par_iter()
            .map(|oy| reduce_row(frames, placements, kernel, out_w, rmin, rmax, oy))
            .collect()
    } else {
        (0..out_h)
            .map(|oy| reduce_row(frames, placements, kernel, out_w, rmin, rmax, oy))
            .collect()
    };

    let mut data = Array2::from_elem((out_h, out_w), T::zero());
    let mut contributions = Array2::<u32>::zeros((out_h, out_w));
    let mut mask = Array2::from_elem((out_h, out_w), false);
    let mut any_rejected = false;

    for (oy, row) in rows.into_iter().enumerate() {
        for ox in 0..out_w {
            let count = row.counts[ox];
            contributions[[oy, ox]] = count;
            if count > 0 {
                data[[oy, ox]] = row.values[ox];
            } else {
                mask[[oy, ox]] = true;
                any_rejected = true;
            }
        }
    }

    let frame = if any_rejected {
        Frame::with_mask(data, mask)?
    } else {
        Frame::new(data)
    };
    Ok(CombinedResult {
        frame,
        contributions,
    })
}

/// Gather, trim, and average all contributions for one output row.
///
/// The gather buffer is laid out pixel-major (`out_w * frame_count`) so the
/// per-frame inner loops append with unit stride.
fn reduce_row<T: Sample>(
    frames: &[&Frame<T>],
    placements: &[Placement],
    kernel: &KernelProfile,
    out_w: usize,
    rmin: usize,
    rmax: usize,
    oy: usize,
) -> RowOutput<T> {
    let n = frames.len();
    let mut samples = vec![T::zero(); out_w * n];
    let mut fill: Vec<usize> = vec![0; out_w];

    for (frame, placement) in frames.iter().zip(placements.iter()) {
        gather_frame_row(frame, placement, kernel, out_w, oy, &mut samples, &mut fill, n);
    }

    let mut values = vec![T::zero(); out_w];
    let mut counts = vec![0u32; out_w];
    for ox in 0..out_w {
        let cnt = fill[ox];
        if cnt > rmin + rmax {
            let pixel = &mut samples[ox * n..ox * n + cnt];
            select_extremes(pixel, rmin, rmax);
            let survivors = cnt - rmin - rmax;
            let sum: f64 = pixel[rmin..cnt - rmax]
                .iter()
                .copied()
                .map(Sample::to_f64)
                .sum();
            values[ox] = T::from_f64(sum / survivors as f64);
            counts[ox] = survivors as u32;
        }
    }
    RowOutput { values, counts }
}

/// Append one frame's contributions to a row-sized gather buffer.
///
/// A contribution is excluded (not down-weighted) when its sample is masked
/// bad, or when any of the four interpolation taps touches a bad sample or
/// sits within the border margin of the source frame.
fn gather_frame_row<T: Sample>(
    frame: &Frame<T>,
    placement: &Placement,
    kernel: &KernelProfile,
    out_w: usize,
    oy: usize,
    samples: &mut [T],
    fill: &mut [usize],
    stride: usize,
) {
    let (src_h, src_w) = frame.data.dim();

    if placement.integer_aligned() {
        let sy = oy as i64 + placement.my;
        if sy < 0 || sy >= src_h as i64 {
            return;
        }
        let sy = sy as usize;
        for ox in 0..out_w {
            let sx = ox as i64 + placement.mx;
            if sx < 0 || sx >= src_w as i64 {
                continue;
            }
            let sx = sx as usize;
            if frame.is_bad(sy, sx) {
                continue;
            }
            samples[ox * stride + fill[ox]] = frame.data[[sy, sx]];
            fill[ox] += 1;
        }
        return;
    }

    let border = INTERP_BORDER as i64;
    let sy = oy as i64 + placement.my;
    if sy < border || sy >= src_h as i64 - border {
        return;
    }
    let sy = sy as usize;
    let wx = kernel.weights(placement.phase_x);
    let wy = kernel.weights(placement.phase_y);
    for ox in 0..out_w {
        let sx = ox as i64 + placement.mx;
        if sx < border || sx >= src_w as i64 - border {
            continue;
        }
        let sx = sx as usize;
        if let Some(mask) = &frame.mask {
            if any_bad4(mask, sy - 1, sx - 1)
                || any_bad4(mask, sy, sx - 1)
                || any_bad4(mask, sy + 1, sx - 1)
                || any_bad4(mask, sy + 2, sx - 1)
            {
                continue;
            }
        }
        let value = interpolate(&frame.data, sy, sx, &wx, &wy);
        samples[ox * stride + fill[ox]] = T::from_f64(value);
        fill[ox] += 1;
    }
}

/// Bulk-test the four adjacent mask bits of one stencil row.
#[inline]
fn any_bad4(mask: &Array2<bool>, row: usize, col_start: usize) -> bool {
    let row = mask.row(row);
    row[col_start] || row[col_start + 1] || row[col_start + 2] || row[col_start + 3]
}
