//! Canonical viewing planes and image-to-voxel mapping
//!
//! The MPR host presents each orthogonal view inside a square canvas of
//! side `S = max(Nx, Ny, Nz)`, with the volume's physical extent centered
//! in the square. Converting a drawn polyline vertex back to voxel space
//! therefore undoes the centering offset and the per-axis voxel ratio,
//! then routes the two in-plane coordinates and the crosshair depth to
//! the right volume axes.

use glam::{DVec2, DVec3};

use crate::volume::{Volume, Voxel};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One of the three canonical orthogonal viewing planes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ViewPlane {
    /// Normal along +z, image axes map to (x, y)
    Axial,
    /// Normal along +y, image axes map to (x, z)
    Coronal,
    /// Normal along +x, image axes map to (y, z)
    Sagittal,
}

impl ViewPlane {
    /// Index of the volume axis this plane's normal runs along
    pub fn axis(&self) -> usize {
        match self {
            ViewPlane::Axial => 2,
            ViewPlane::Coronal => 1,
            ViewPlane::Sagittal => 0,
        }
    }

    /// Unit normal of the plane in voxel space
    pub fn normal(&self) -> DVec3 {
        match self {
            ViewPlane::Axial => DVec3::Z,
            ViewPlane::Coronal => DVec3::Y,
            ViewPlane::Sagittal => DVec3::X,
        }
    }

    /// Map an image-pixel point on this plane to voxel coordinates
    ///
    /// # Arguments
    /// * `volume` - The displayed volume, for dimensions and voxel ratio
    /// * `point` - 2D point in image-pixel coordinates of the drawing plane
    /// * `depth` - Crosshair position along the plane normal, in voxels
    ///
    /// # Example
    /// ```
    /// use curveform_core::plane::ViewPlane;
    /// use curveform_core::volume::Volume;
    /// use curveform_core::{DVec2, DVec3};
    ///
    /// // Isotropic cube: the canvas matches the volume, offsets vanish
    /// let volume = Volume::new([32, 32, 32], DVec3::ONE, vec![0u8; 32 * 32 * 32]).unwrap();
    /// let p = ViewPlane::Axial.image_to_voxel(&volume, DVec2::new(5.0, 9.0), 12.0);
    /// assert_eq!(p, DVec3::new(5.0, 9.0, 12.0));
    /// ```
    pub fn image_to_voxel<T: Voxel>(&self, volume: &Volume<T>, point: DVec2, depth: f64) -> DVec3 {
        let side = canvas_side(volume);
        let dims = volume.dims();
        let spacing = volume.spacing();

        match self {
            ViewPlane::Axial => DVec3::new(
                (point.x - centering_offset(side, dims[0], spacing.x)) / spacing.x,
                (point.y - centering_offset(side, dims[1], spacing.y)) / spacing.y,
                depth,
            ),
            ViewPlane::Coronal => DVec3::new(
                (point.x - centering_offset(side, dims[0], spacing.x)) / spacing.x,
                depth,
                (point.y - centering_offset(side, dims[2], spacing.z)) / spacing.z,
            ),
            ViewPlane::Sagittal => DVec3::new(
                depth,
                (point.x - centering_offset(side, dims[1], spacing.y)) / spacing.y,
                (point.y - centering_offset(side, dims[2], spacing.z)) / spacing.z,
            ),
        }
    }
}

/// Side of the square canvas the MPR host draws each plane into
pub fn canvas_side<T: Voxel>(volume: &Volume<T>) -> f64 {
    let [nx, ny, nz] = volume.dims();
    nx.max(ny).max(nz) as f64
}

/// Offset centering an axis of physical extent `count * ratio` in the canvas
fn centering_offset(side: f64, count: usize, ratio: f64) -> f64 {
    (side - count as f64 * ratio) / 2.0
}
