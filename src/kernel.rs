use serde::{Deserialize, Serialize};

use crate::consts::{EPSILON, KERNEL_TAPS, PHASE_SUBDIVISIONS};
use crate::error::{CoaddError, Result};

/// Steepness of the tanh edge apodization for [`KernelFamily::TanhBox`].
const TANH_SHARPNESS: f64 = 5.0;

/// Interpolation kernel family used to generate a weight table.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum KernelFamily {
    /// Nearest-neighbor: all weight on the closest tap.
    Nearest,
    /// Box kernel with tanh-apodized edges.
    TanhBox,
    /// Truncated sinc.
    Sinc,
    /// Lanczos-windowed sinc.
    Lanczos,
    /// Hann-windowed sinc.
    Hann,
    /// Hamming-windowed sinc.
    Hamming,
}

/// A precomputed 1-D table of interpolation weights sampled at
/// [`PHASE_SUBDIVISIONS`] sub-pixel phases, used separably along X and Y.
///
/// The flat table is indexed as `phase + tap * PHASE_SUBDIVISIONS` for taps
/// 0..[`KERNEL_TAPS`]. Weights are normalized per phase so the four taps of
/// any phase sum to 1 (and the 2-D outer product of two phases sums to 1).
#[derive(Clone, Debug)]
pub struct KernelProfile {
    weights: Vec<f64>,
}

impl KernelProfile {
    /// Build a profile from a raw weight table.
    ///
    /// The table length must divide evenly into [`PHASE_SUBDIVISIONS`] and
    /// carry exactly [`KERNEL_TAPS`] taps per phase. Each phase column is
    /// renormalized to unit sum.
    pub fn from_table(table: Vec<f64>) -> Result<Self> {
        if table.len() % PHASE_SUBDIVISIONS != 0 {
            return Err(CoaddError::IllegalInput(format!(
                "kernel table length {} is not a multiple of {} phase subdivisions",
                table.len(),
                PHASE_SUBDIVISIONS
            )));
        }
        let taps = table.len() / PHASE_SUBDIVISIONS;
        if taps != KERNEL_TAPS {
            return Err(CoaddError::IllegalInput(format!(
                "kernel table carries {taps} taps per phase, expected {KERNEL_TAPS}"
            )));
        }

        let mut weights = table;
        for phase in 0..PHASE_SUBDIVISIONS {
            let sum: f64 = (0..KERNEL_TAPS)
                .map(|k| weights[phase + k * PHASE_SUBDIVISIONS])
                .sum();
            if sum.abs() < EPSILON {
                return Err(CoaddError::IllegalInput(format!(
                    "kernel table has zero total weight at phase {phase}"
                )));
            }
            for k in 0..KERNEL_TAPS {
                weights[phase + k * PHASE_SUBDIVISIONS] /= sum;
            }
        }
        Ok(Self { weights })
    }

    /// Generate the weight table for a kernel family with the given support
    /// radius (in pixels). The 4-tap stencil limits useful radii to <= 2.
    pub fn generate(family: KernelFamily, radius: f64) -> Result<Self> {
        if radius <= 0.0 {
            return Err(CoaddError::IllegalInput(format!(
                "kernel radius must be positive, got {radius}"
            )));
        }

        let mut table = vec![0.0f64; KERNEL_TAPS * PHASE_SUBDIVISIONS];
        for phase in 0..PHASE_SUBDIVISIONS {
            let frac = phase as f64 / PHASE_SUBDIVISIONS as f64;
            for k in 0..KERNEL_TAPS {
                // Tap k sits at integer offset k-1 from the base sample; the
                // interpolation point lies `frac` past the base sample.
                let x = (k as f64 - 1.0) - frac;
                table[phase + k * PHASE_SUBDIVISIONS] = eval_kernel(family, x, radius);
            }
        }
        Self::from_table(table)
    }

    /// The four tap weights for one sub-pixel phase index.
    #[inline]
    pub fn weights(&self, phase: usize) -> [f64; 4] {
        [
            self.weights[phase],
            self.weights[phase + PHASE_SUBDIVISIONS],
            self.weights[phase + 2 * PHASE_SUBDIVISIONS],
            self.weights[phase + 3 * PHASE_SUBDIVISIONS],
        ]
    }

    /// Round a fractional placement in [0, 1) to the nearest phase index.
    ///
    /// Returns `(phase, carry)`; a fraction rounding up to a full pixel wraps
    /// to phase 0 with a carry of 1 into the integer part.
    pub(crate) fn round_phase(frac: f64) -> (usize, i64) {
        let phase = (frac * PHASE_SUBDIVISIONS as f64).round() as usize;
        if phase >= PHASE_SUBDIVISIONS {
            (0, 1)
        } else {
            (phase, 0)
        }
    }
}

fn eval_kernel(family: KernelFamily, x: f64, radius: f64) -> f64 {
    match family {
        KernelFamily::Nearest => {
            if x > -0.5 && x <= 0.5 {
                1.0
            } else {
                0.0
            }
        }
        KernelFamily::TanhBox => {
            let s = TANH_SHARPNESS;
            0.5 * ((s * (x + 0.5)).tanh() - (s * (x - 0.5)).tanh())
        }
        KernelFamily::Sinc => {
            if x.abs() >= radius {
                0.0
            } else {
                sinc(x)
            }
        }
        KernelFamily::Lanczos => {
            if x.abs() >= radius {
                0.0
            } else {
                sinc(x) * sinc(x / radius)
            }
        }
        KernelFamily::Hann => {
            if x.abs() >= radius {
                0.0
            } else {
                sinc(x) * 0.5 * (1.0 + (std::f64::consts::PI * x / radius).cos())
            }
        }
        KernelFamily::Hamming => {
            if x.abs() >= radius {
                0.0
            } else {
                sinc(x) * (0.54 + 0.46 * (std::f64::consts::PI * x / radius).cos())
            }
        }
    }
}

fn sinc(x: f64) -> f64 {
    if x.abs() < EPSILON {
        1.0
    } else {
        let px = std::f64::consts::PI * x;
        px.sin() / px
    }
}
