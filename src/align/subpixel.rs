use crate::consts::EPSILON;

/// Fractional correction of a discrete minimum from a parabola fit through
/// the scores at the minimum and its two neighbors along one axis.
///
/// Returns 0 when the three points are degenerate (flat or collinear).
pub(crate) fn parabola_minimum(prev: f64, curr: f64, next: f64) -> f64 {
    let denom = prev - 2.0 * curr + next;
    if denom.abs() < EPSILON {
        return 0.0;
    }
    let delta = (prev - next) / (2.0 * denom);
    // The true minimum of a sampled parabola lies within half a pixel of the
    // discrete minimum.
    delta.clamp(-0.5, 0.5)
}
