use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_BOUNDARY_TOLERANCE;
use crate::frame::{RejectionPolicy, SearchSpec};
use crate::stack::GeometryMode;

/// Parameters for one register-and-combine run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistrationConfig {
    /// Correlation search and measurement window half-extents.
    pub search: SearchSpec,
    /// Per-pixel outlier rejection counts.
    #[serde(default)]
    pub rejection: RejectionPolicy,
    /// Output canvas geometry.
    #[serde(default)]
    pub geometry: GeometryMode,
    /// Margin (in pixels) of the boundary-artifact rejection rule: a refined
    /// shift whose deviation from the prior comes within this margin of the
    /// search half-extent is treated as having run off the search window.
    #[serde(default = "default_boundary_tolerance")]
    pub boundary_tolerance: f64,
}

fn default_boundary_tolerance() -> f64 {
    DEFAULT_BOUNDARY_TOLERANCE
}

impl RegistrationConfig {
    pub fn new(search: SearchSpec) -> Self {
        Self {
            search,
            rejection: RejectionPolicy::default(),
            geometry: GeometryMode::default(),
            boundary_tolerance: DEFAULT_BOUNDARY_TOLERANCE,
        }
    }
}
