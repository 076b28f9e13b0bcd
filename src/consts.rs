/// Number of sub-pixel phases per pixel in a kernel weight table.
///
/// A `KernelProfile` table holds `KERNEL_TAPS * PHASE_SUBDIVISIONS` weights;
/// fractional placements are rounded to the nearest of these phases.
pub const PHASE_SUBDIVISIONS: usize = 32;

/// Number of source samples per axis contributing to one interpolated sample.
pub const KERNEL_TAPS: usize = 4;

/// Source samples closer than this to a frame border never contribute through
/// the interpolated path (the 4-tap stencil would read partial data there).
pub const INTERP_BORDER: usize = 2;

/// Score sentinel marking an unmeasurable correlation sample.
pub const INVALID_SCORE: f64 = -1.0;

/// Default margin (in pixels) of the boundary-artifact rejection rule: a
/// refined shift whose distance from the prior estimate comes within this
/// margin of the search half-extent is treated as non-registrable.
pub const DEFAULT_BOUNDARY_TOLERANCE: f64 = 1.0;

/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Minimum anchor count to use anchor-level Rayon parallelism in refinement.
pub const PARALLEL_ANCHOR_THRESHOLD: usize = 4;

/// Small epsilon for floating-point comparisons.
pub const EPSILON: f64 = 1e-12;
