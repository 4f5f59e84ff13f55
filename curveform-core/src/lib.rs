//! Curveform Core
//!
//! Volume sampling, viewing-plane coordinate mapping, and curve math for
//! curved multi-planar reformation (CPR) of medical volumes. This crate
//! provides the foundational building blocks used by the panoramic
//! renderer in `curveform-cpr`.

// Re-export glam types for convenience
pub use glam::{DVec2, DVec3};

/// Mathematical utilities for curve handling
pub mod math {
    //! Mathematical utilities for curve handling

    /// Catmull-Rom smoothing and arc-length resampling
    pub mod curves;

    /// Transverse frames along a resampled curve
    pub mod frames;
}

/// Scalar volume storage and trilinear sampling
pub mod volume;

/// Canonical viewing planes and image-to-voxel mapping
pub mod plane;
