//! Robust sub-pixel offset refinement across a set of anchor points.

use rayon::prelude::*;
use tracing::debug;

use crate::consts::{INVALID_SCORE, PARALLEL_ANCHOR_THRESHOLD};
use crate::error::{CoaddError, Result};
use crate::frame::{AlignmentOffset, AnchorPoint, Frame, Sample, SearchSpec};

use super::correlate::{correlate_anchor, CorrelationSample};

/// Compute a robust sub-pixel translation of `target` relative to
/// `reference`, starting from an a-priori estimate.
///
/// Each anchor yields a candidate delta via localized MSD correlation;
/// candidates are aggregated by picking the one closest to the
/// component-wise median. Returns the refined offset and a correlation
/// quality (the winning MSD score, >= 0), or the prior unchanged with
/// quality -1 when no anchor could be measured.
pub fn refine_offset<T: Sample>(
    reference: &Frame<T>,
    target: &Frame<T>,
    anchors: &[AnchorPoint],
    spec: &SearchSpec,
    prior: &AlignmentOffset,
) -> Result<(AlignmentOffset, f64)> {
    if anchors.is_empty() {
        return Err(CoaddError::NullInput("anchor points"));
    }
    spec.validate()?;

    let prior_int = prior.floor();

    let samples: Vec<CorrelationSample> = if anchors.len() >= PARALLEL_ANCHOR_THRESHOLD {
        anchors
            .par_iter()
            .map(|&a| correlate_anchor(reference, target, a, spec, prior_int))
            .collect()
    } else {
        anchors
            .iter()
            .map(|&a| correlate_anchor(reference, target, a, spec, prior_int))
            .collect()
    };

    let valid: Vec<CorrelationSample> = samples.into_iter().filter(|s| s.is_valid()).collect();
    if valid.is_empty() {
        debug!("no anchor produced a measurable correlation");
        return Ok((*prior, INVALID_SCORE));
    }

    let chosen = if valid.len() == 1 {
        valid[0]
    } else {
        closest_to_median(&valid)
    };

    let offset = AlignmentOffset::new(
        prior_int.0 as f64 + chosen.dx,
        prior_int.1 as f64 + chosen.dy,
    );
    debug!(
        dx = offset.dx,
        dy = offset.dy,
        score = chosen.score,
        anchors = valid.len(),
        "offset refined"
    );
    Ok((offset, chosen.score))
}

/// Pick the sample whose delta is Euclidean-closest to the component-wise
/// median of all valid deltas.
fn closest_to_median(valid: &[CorrelationSample]) -> CorrelationSample {
    let mut xs: Vec<f64> = valid.iter().map(|s| s.dx).collect();
    let mut ys: Vec<f64> = valid.iter().map(|s| s.dy).collect();
    let median_x = median(&mut xs);
    let median_y = median(&mut ys);

    let mut chosen = valid[0];
    let mut best_dist = dist2(&chosen, median_x, median_y);
    for s in &valid[1..] {
        let d = dist2(s, median_x, median_y);
        if d < best_dist {
            best_dist = d;
            chosen = *s;
        }
    }
    chosen
}

fn dist2(s: &CorrelationSample, mx: f64, my: f64) -> f64 {
    let dx = s.dx - mx;
    let dy = s.dy - my;
    dx * dx + dy * dy
}

/// Median via partial selection; even-length input averages the two middles.
fn median(values: &mut [f64]) -> f64 {
    let n = values.len();
    let mid = n / 2;
    if n % 2 == 1 {
        *values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b)).1
    } else {
        values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
        values[..mid].select_nth_unstable_by(mid - 1, |a, b| a.total_cmp(b));
        (values[mid - 1] + values[mid]) / 2.0
    }
}
