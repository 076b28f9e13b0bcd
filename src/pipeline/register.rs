//! Stack registration: refine every frame against the reference, drop the
//! failures, and combine the survivors.

use tracing::{debug, warn};

use crate::align::refine_offset;
use crate::consts::INVALID_SCORE;
use crate::error::{CoaddError, Result};
use crate::frame::{AlignmentOffset, AnchorPoint, Frame, Sample, SearchSpec};
use crate::kernel::KernelProfile;
use crate::stack::{combine_refs, CombinedResult};

use super::config::RegistrationConfig;

/// Refine one frame's offset and apply the boundary-artifact rejection rule.
///
/// A refined shift whose deviation from the prior estimate comes within
/// `boundary_tolerance` pixels of a search half-extent most likely ran off
/// the edge of the search window; the frame is reported non-registrable
/// (offset (0, 0), quality -1) rather than silently accepted.
pub fn refine_frame_offset<T: Sample>(
    reference: &Frame<T>,
    target: &Frame<T>,
    anchors: &[AnchorPoint],
    search: &SearchSpec,
    prior: &AlignmentOffset,
    boundary_tolerance: f64,
) -> Result<(AlignmentOffset, f64)> {
    let (offset, quality) = refine_offset(reference, target, anchors, search, prior)?;
    if quality < 0.0 {
        return Ok((offset, quality));
    }

    let dev_x = (offset.dx - prior.dx).abs();
    let dev_y = (offset.dy - prior.dy).abs();
    if dev_x >= search.search_half_width as f64 - boundary_tolerance
        || dev_y >= search.search_half_height as f64 - boundary_tolerance
    {
        warn!(
            dev_x,
            dev_y, "refined shift sits at the search boundary, rejecting"
        );
        return Ok((AlignmentOffset::default(), INVALID_SCORE));
    }
    Ok((offset, quality))
}

/// Register every non-reference frame against frame 0, discard frames whose
/// correlation fails, and combine the survivors with their refined offsets.
pub fn register_and_combine<T: Sample>(
    frames: &[Frame<T>],
    prior_offsets: &[AlignmentOffset],
    anchors: &[AnchorPoint],
    kernel: &KernelProfile,
    config: &RegistrationConfig,
) -> Result<CombinedResult<T>> {
    if frames.is_empty() {
        return Err(CoaddError::IllegalInput("empty frame stack".into()));
    }
    if prior_offsets.len() != frames.len() {
        return Err(CoaddError::IncompatibleInput(format!(
            "{} prior offsets for {} frames",
            prior_offsets.len(),
            frames.len()
        )));
    }
    if anchors.is_empty() {
        return Err(CoaddError::NullInput("anchor points"));
    }

    let reference = &frames[0];
    let mut kept: Vec<&Frame<T>> = vec![reference];
    let mut offsets: Vec<AlignmentOffset> = vec![AlignmentOffset::default()];
    let mut dropped = 0usize;

    for (i, (frame, prior)) in frames.iter().zip(prior_offsets.iter()).enumerate().skip(1) {
        let (offset, quality) = refine_frame_offset(
            reference,
            frame,
            anchors,
            &config.search,
            prior,
            config.boundary_tolerance,
        )?;
        if quality < 0.0 {
            debug!(frame = i, "dropping unregistrable frame");
            dropped += 1;
            continue;
        }
        kept.push(frame);
        offsets.push(offset);
    }

    if dropped > 0 {
        warn!(dropped, kept = kept.len(), "frames failed registration");
    }
    if kept.len() <= 1 && frames.len() > 1 {
        return Err(CoaddError::DataNotFound(
            "no frame beyond the reference could be registered".into(),
        ));
    }

    combine_refs(&kept, &offsets, kernel, &config.rejection, config.geometry)
}
