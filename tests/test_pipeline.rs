mod common;

use coadd::error::CoaddError;
use coadd::frame::{AlignmentOffset, AnchorPoint, Frame, RejectionPolicy, SearchSpec};
use coadd::kernel::{KernelFamily, KernelProfile};
use coadd::pipeline::{refine_frame_offset, register_and_combine, RegistrationConfig};
use coadd::stack::GeometryMode;

use common::{cyclic_shift, texture};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn kernel() -> KernelProfile {
    KernelProfile::generate(KernelFamily::Lanczos, 2.0).unwrap()
}

fn config() -> RegistrationConfig {
    RegistrationConfig::new(SearchSpec::new(4, 4, 4, 4))
}

fn anchors() -> Vec<AnchorPoint> {
    vec![
        AnchorPoint::new(20, 24),
        AnchorPoint::new(44, 20),
        AnchorPoint::new(32, 44),
    ]
}

fn priors(n: usize) -> Vec<AlignmentOffset> {
    vec![AlignmentOffset::default(); n]
}

// ---------------------------------------------------------------------------
// register_and_combine — end to end
// ---------------------------------------------------------------------------

#[test]
fn test_registers_and_coadds_integer_shifted_stack() {
    let ref_data = texture(64, 64, 23);
    let frames = vec![
        Frame::new(ref_data.clone()),
        Frame::new(cyclic_shift(&ref_data, 2, 1)),
        Frame::new(cyclic_shift(&ref_data, -1, 2)),
    ];

    let result =
        register_and_combine(&frames, &priors(3), &anchors(), &kernel(), &config()).unwrap();

    // Offsets recovered exactly: (0,0), (2,1), (-1,2). Intersect canvas:
    // width 64 - 2 - 1 = 61, height 64 - 2 = 62, origin at (2, 2).
    assert_eq!(result.frame.data.dim(), (62, 61));
    assert!(result.contributions.iter().all(|&c| c == 3));
    for oy in 0..62 {
        for ox in 0..61 {
            let got = result.frame.data[[oy, ox]];
            let expected = ref_data[[oy + 2, ox + 2]];
            assert!(
                (got - expected).abs() < 1e-6,
                "pixel ({oy}, {ox}): got {got}, expected {expected}"
            );
        }
    }
}

#[test]
fn test_single_frame_stack_passes_through() {
    let ref_data = texture(64, 64, 31);
    let frames = vec![Frame::new(ref_data.clone())];
    let result =
        register_and_combine(&frames, &priors(1), &anchors(), &kernel(), &config()).unwrap();
    assert_eq!(result.frame.data, ref_data);
    assert!(result.contributions.iter().all(|&c| c == 1));
}

// ---------------------------------------------------------------------------
// Boundary-artifact rejection
// ---------------------------------------------------------------------------

#[test]
fn test_shift_at_search_boundary_is_not_registrable() {
    // The target is shifted by exactly the search half-extent; the best
    // correlation sits on the window edge and must be rejected, never
    // silently accepted.
    let ref_data = texture(64, 64, 51);
    let reference = Frame::new(ref_data.clone());
    let target = Frame::new(cyclic_shift(&ref_data, 4, 0));
    let cfg = config();

    let (offset, quality) = refine_frame_offset(
        &reference,
        &target,
        &anchors(),
        &cfg.search,
        &AlignmentOffset::default(),
        cfg.boundary_tolerance,
    )
    .unwrap();

    assert_eq!(quality, -1.0);
    assert_eq!(offset, AlignmentOffset::default());
}

#[test]
fn test_boundary_frame_dropped_from_stack() {
    let ref_data = texture(64, 64, 77);
    let frames = vec![
        Frame::new(ref_data.clone()),
        Frame::new(cyclic_shift(&ref_data, 2, 1)),
        Frame::new(cyclic_shift(&ref_data, 4, 0)), // at the boundary, dropped
    ];

    let result =
        register_and_combine(&frames, &priors(3), &anchors(), &kernel(), &config()).unwrap();

    // Two survivors: reference and the (2, 1) frame.
    assert!(result.contributions.iter().all(|&c| c == 2));
}

#[test]
fn test_all_frames_unregistrable_fails() {
    let ref_data = texture(64, 64, 91);
    let frames = vec![
        Frame::new(ref_data.clone()),
        Frame::new(cyclic_shift(&ref_data, 4, 0)),
    ];

    let result = register_and_combine(&frames, &priors(2), &anchors(), &kernel(), &config());
    assert!(matches!(result, Err(CoaddError::DataNotFound(_))));
}

// ---------------------------------------------------------------------------
// Precondition failures
// ---------------------------------------------------------------------------

#[test]
fn test_prior_count_mismatch_rejected() {
    let frames = vec![Frame::new(texture(32, 32, 1)), Frame::new(texture(32, 32, 2))];
    let result = register_and_combine(&frames, &priors(1), &anchors(), &kernel(), &config());
    assert!(matches!(result, Err(CoaddError::IncompatibleInput(_))));
}

#[test]
fn test_empty_anchor_list_rejected() {
    let frames = vec![Frame::new(texture(32, 32, 1))];
    let result = register_and_combine(&frames, &priors(1), &[], &kernel(), &config());
    assert!(matches!(result, Err(CoaddError::NullInput(_))));
}

#[test]
fn test_empty_stack_rejected() {
    let frames: Vec<Frame<f32>> = vec![];
    let result = register_and_combine(&frames, &[], &anchors(), &kernel(), &config());
    assert!(matches!(result, Err(CoaddError::IllegalInput(_))));
}

// ---------------------------------------------------------------------------
// Configuration serialization
// ---------------------------------------------------------------------------

#[test]
fn test_config_round_trips_through_json() {
    let mut cfg = config();
    cfg.rejection = RejectionPolicy::new(2, 3);
    cfg.geometry = GeometryMode::Union;

    let json = serde_json::to_string(&cfg).unwrap();
    let back: RegistrationConfig = serde_json::from_str(&json).unwrap();

    assert_eq!(back.rejection, cfg.rejection);
    assert_eq!(back.geometry, GeometryMode::Union);
    assert_eq!(back.search.search_half_width, 4);
    assert_eq!(back.boundary_tolerance, cfg.boundary_tolerance);
}

#[test]
fn test_config_defaults_fill_missing_fields() {
    let json = r#"{"search":{"search_half_width":3,"search_half_height":3,"measure_half_width":5,"measure_half_height":5}}"#;
    let cfg: RegistrationConfig = serde_json::from_str(json).unwrap();
    assert_eq!(cfg.rejection, RejectionPolicy::default());
    assert_eq!(cfg.geometry, GeometryMode::Intersect);
    assert_eq!(cfg.boundary_tolerance, 1.0);
}
