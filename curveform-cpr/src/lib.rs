//! Curveform CPR
//!
//! Curved multi-planar reformation on top of `curveform-core`. Takes a
//! volume and a polyline drawn in one of the orthogonal viewing planes
//! and produces a straightened panoramic raster: columns are arc length
//! along the curve, rows run along the drawing plane's normal, and each
//! pixel is a maximum-intensity projection across a thin slab
//! perpendicular to the curve.

pub use curveform_core::plane::ViewPlane;
pub use curveform_core::volume::{PixelFormat, Volume, VolumeError, Voxel};
pub use curveform_core::{DVec2, DVec3};

/// User-controllable reformation parameters
pub mod params;

/// Panoramic raster buffer
pub mod raster;

/// Output image metadata
pub mod metadata;

/// The reformation pipeline
pub mod renderer;

/// Persistent per-view axis object
pub mod axis;

pub use axis::CurveAxis;
pub use metadata::{PanoramicMeta, SeriesContext};
pub use params::{CprParams, ParamError};
pub use raster::PanoramicImage;
pub use renderer::{render, CprOutput, CurveDebug};
