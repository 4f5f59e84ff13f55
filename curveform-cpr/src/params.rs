//! User-controllable reformation parameters

use curveform_core::math::frames::FrameMode;
use curveform_core::volume::{Volume, Voxel};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default vertical extent of the panorama in mm
pub const DEFAULT_WIDTH_MM: f64 = 40.0;

/// Default MIP slab thickness in mm, mid-range for CBCT and CT
pub const DEFAULT_SLAB_MM: f64 = 15.0;

/// Rejection raised by parameter setters
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ParamError {
    /// The supplied value must be strictly positive
    #[error("{name} must be positive, got {value}")]
    NonPositive {
        /// Parameter name
        name: &'static str,
        /// Offending value
        value: f64,
    },
}

/// Parameters of one curved reformation
///
/// `width_mm` is the vertical extent of the output, `step_mm` the column
/// spacing reported in the header, `slab_mm` the thickness of the MIP
/// slab perpendicular to the curve. `reverse_curve` flips the column
/// order so the patient's right lands on the viewer's left; frame
/// computation defaults to the planar mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CprParams {
    /// Vertical extent of the output in mm
    pub width_mm: f64,
    /// Column spacing in mm, metadata only
    pub step_mm: f64,
    /// MIP slab thickness in mm
    pub slab_mm: f64,
    /// Reverse the resampled curve before rasterizing
    pub reverse_curve: bool,
    /// Transverse frame strategy
    pub frame_mode: FrameMode,
}

impl CprParams {
    /// Defaults for a volume: 40 mm width, pixel-pitch step, 15 mm slab
    ///
    /// # Example
    /// ```
    /// use curveform_cpr::{CprParams, Volume};
    /// use curveform_core::DVec3;
    ///
    /// let volume = Volume::new([8, 8, 8], DVec3::new(0.5, 1.0, 1.0), vec![0u8; 512]).unwrap();
    /// let params = CprParams::for_volume(&volume);
    /// assert_eq!(params.width_mm, 40.0);
    /// assert_eq!(params.step_mm, 0.5);
    /// assert!(params.reverse_curve);
    /// ```
    pub fn for_volume<T: Voxel>(volume: &Volume<T>) -> Self {
        Self {
            width_mm: DEFAULT_WIDTH_MM,
            step_mm: volume.min_spacing_mm(),
            slab_mm: DEFAULT_SLAB_MM,
            reverse_curve: true,
            frame_mode: FrameMode::default(),
        }
    }

    /// Whether all metric parameters are strictly positive
    pub fn is_valid(&self) -> bool {
        self.width_mm > 0.0 && self.step_mm > 0.0 && self.slab_mm > 0.0
    }
}

/// Validate a metric parameter value
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<(), ParamError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ParamError::NonPositive { name, value })
    }
}
