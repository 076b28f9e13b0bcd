//! Localized 2-D cross-correlation around a single anchor point.
//!
//! For each candidate integer shift inside the search range, measures the
//! mean squared sample difference over a clipped window centered on the
//! anchor, then refines the discrete minimum to sub-pixel precision with a
//! separable parabola fit.

use ndarray::Array2;

use crate::consts::{EPSILON, INVALID_SCORE};
use crate::frame::{AnchorPoint, Frame, Sample, SearchSpec};

use super::subpixel::parabola_minimum;

/// Per-anchor candidate sub-pixel delta and its minimal MSD score.
///
/// An unmeasurable anchor carries a negative sentinel score.
#[derive(Clone, Copy, Debug)]
pub struct CorrelationSample {
    pub dx: f64,
    pub dy: f64,
    pub score: f64,
}

impl CorrelationSample {
    pub fn is_valid(&self) -> bool {
        self.score >= 0.0
    }

    pub(crate) fn invalid() -> Self {
        Self {
            dx: 0.0,
            dy: 0.0,
            score: INVALID_SCORE,
        }
    }
}

/// Correlate one anchor of the reference frame against the target.
///
/// `prior_int` is the integer part of the a-priori offset estimate; the
/// anchor's counterpart in the target is the anchor position minus it.
pub(crate) fn correlate_anchor<T: Sample>(
    reference: &Frame<T>,
    target: &Frame<T>,
    anchor: AnchorPoint,
    spec: &SearchSpec,
    prior_int: (i64, i64),
) -> CorrelationSample {
    let shx = spec.search_half_width as i64;
    let shy = spec.search_half_height as i64;
    let mhx = spec.measure_half_width as i64;
    let mhy = spec.measure_half_height as i64;

    let x2 = anchor.x - prior_int.0;
    let y2 = anchor.y - prior_int.1;
    if x2 < 0 || y2 < 0 || x2 >= target.width() as i64 || y2 >= target.height() as i64 {
        return CorrelationSample::invalid();
    }

    // Score grid over all candidate integer shifts; unmeasurable candidates
    // keep the negative sentinel.
    let grid_h = (2 * shy + 1) as usize;
    let grid_w = (2 * shx + 1) as usize;
    let mut scores = Array2::<f64>::from_elem((grid_h, grid_w), INVALID_SCORE);
    for l in -shy..=shy {
        for k in -shx..=shx {
            scores[[(l + shy) as usize, (k + shx) as usize]] =
                window_msd(reference, target, anchor.x + k, anchor.y + l, x2, y2, mhx, mhy);
        }
    }

    let mut best: Option<(i64, i64, f64)> = None;
    for l in -shy..=shy {
        for k in -shx..=shx {
            let s = scores[[(l + shy) as usize, (k + shx) as usize]];
            if s >= 0.0 && best.map_or(true, |(_, _, b)| s < b) {
                best = Some((k, l, s));
            }
        }
    }
    let Some((k_min, l_min, score)) = best else {
        return CorrelationSample::invalid();
    };

    let row = (l_min + shy) as usize;
    let col = (k_min + shx) as usize;
    let mut inc_x = 0.0;
    let mut inc_y = 0.0;
    // An exact match (zero SSD) needs no refinement; candidates on the search
    // boundary are never refined.
    if score > EPSILON {
        if k_min > -shx && k_min < shx {
            let prev = scores[[row, col - 1]];
            let next = scores[[row, col + 1]];
            if prev >= 0.0 && next >= 0.0 {
                inc_x = parabola_minimum(prev, score, next);
            }
        }
        if l_min > -shy && l_min < shy {
            let prev = scores[[row - 1, col]];
            let next = scores[[row + 1, col]];
            if prev >= 0.0 && next >= 0.0 {
                inc_y = parabola_minimum(prev, score, next);
            }
        }
    }

    CorrelationSample {
        dx: k_min as f64 + inc_x,
        dy: l_min as f64 + inc_y,
        score,
    }
}

/// Mean squared sample difference over a measurement window clipped to the
/// valid extents of both frames.
///
/// Reference window is centered at `(cx1, cy1)`, target window at
/// `(cx2, cy2)`. A clipped window with fewer than `mhx + mhy` surviving
/// samples is unmeasurable.
fn window_msd<T: Sample>(
    reference: &Frame<T>,
    target: &Frame<T>,
    cx1: i64,
    cy1: i64,
    cx2: i64,
    cy2: i64,
    mhx: i64,
    mhy: i64,
) -> f64 {
    let (rh, rw) = reference.data.dim();
    let (th, tw) = target.data.dim();

    let mut sum = 0.0f64;
    let mut count: i64 = 0;
    for j in -mhy..=mhy {
        let ry = cy1 + j;
        let ty = cy2 + j;
        if ry < 0 || ty < 0 || ry >= rh as i64 || ty >= th as i64 {
            continue;
        }
        for i in -mhx..=mhx {
            let rx = cx1 + i;
            let tx = cx2 + i;
            if rx < 0 || tx < 0 || rx >= rw as i64 || tx >= tw as i64 {
                continue;
            }
            let d = reference.data[[ry as usize, rx as usize]].to_f64()
                - target.data[[ty as usize, tx as usize]].to_f64();
            sum += d * d;
            count += 1;
        }
    }

    if count < mhx + mhy {
        INVALID_SCORE
    } else {
        sum / count as f64
    }
}
