//! Scalar volume storage and trilinear sampling
//!
//! This module provides the [`Volume`] type, an immutable 3D scalar grid
//! with per-axis physical spacing, and the [`Voxel`] trait describing the
//! pixel encodings a volume can carry. Sampling is performed with
//! trilinear interpolation in `f64` regardless of the storage type.

use glam::DVec3;
use log::debug;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pixel encoding descriptor for a volume or raster
///
/// Mirrors the DICOM notion of BitsAllocated + PixelRepresentation so the
/// renderer can emit a displayable header without inspecting the buffer
/// type at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PixelFormat {
    /// Unsigned 8-bit integer
    U8,
    /// Signed 8-bit integer
    I8,
    /// Unsigned 16-bit integer
    U16,
    /// Signed 16-bit integer
    I16,
    /// Unsigned 32-bit integer
    U32,
    /// Signed 32-bit integer
    I32,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
}

impl PixelFormat {
    /// Number of bits allocated per sample
    pub fn bits_allocated(&self) -> u16 {
        match self {
            PixelFormat::U8 | PixelFormat::I8 => 8,
            PixelFormat::U16 | PixelFormat::I16 => 16,
            PixelFormat::U32 | PixelFormat::I32 | PixelFormat::F32 => 32,
            PixelFormat::F64 => 64,
        }
    }

    /// Whether the encoding is signed (two's complement or float)
    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            PixelFormat::I8 | PixelFormat::I16 | PixelFormat::I32 | PixelFormat::F32 | PixelFormat::F64
        )
    }

    /// Whether the encoding is floating point
    pub fn is_float(&self) -> bool {
        matches!(self, PixelFormat::F32 | PixelFormat::F64)
    }
}

/// A scalar sample type a [`Volume`] can store
///
/// Implemented for the integer and float encodings medical volumes come
/// in. Interpolation promotes samples to `f64`; `from_f64` is an
/// `as`-style cast back to the storage type.
pub trait Voxel: Copy + Default + PartialOrd + Send + Sync + 'static {
    /// Descriptor of this encoding for image metadata
    const FORMAT: PixelFormat;

    /// Promote to `f64` for interpolation
    fn to_f64(self) -> f64;

    /// Cast an interpolated value back to the storage type
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_voxel {
    ($($ty:ty => $format:expr),+ $(,)?) => {
        $(
            impl Voxel for $ty {
                const FORMAT: PixelFormat = $format;

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64(value: f64) -> Self {
                    value as $ty
                }
            }
        )+
    };
}

impl_voxel!(
    u8 => PixelFormat::U8,
    i8 => PixelFormat::I8,
    u16 => PixelFormat::U16,
    i16 => PixelFormat::I16,
    u32 => PixelFormat::U32,
    i32 => PixelFormat::I32,
    f32 => PixelFormat::F32,
    f64 => PixelFormat::F64,
);

/// Errors raised when constructing a [`Volume`]
#[derive(Debug, Error)]
pub enum VolumeError {
    /// The data buffer does not match the requested dimensions
    #[error("voxel data length {actual} does not match dimensions {dims:?} (expected {expected})")]
    DataLength {
        /// Requested grid dimensions
        dims: [usize; 3],
        /// Expected buffer length (`nx * ny * nz`)
        expected: usize,
        /// Actual buffer length
        actual: usize,
    },
    /// One or more dimensions are zero
    #[error("volume dimensions must all be at least 1, got {dims:?}")]
    EmptyDimension {
        /// Requested grid dimensions
        dims: [usize; 3],
    },
    /// Voxel spacing is non-positive or non-finite
    #[error("voxel spacing must be positive and finite in mm, got {spacing}")]
    InvalidSpacing {
        /// Requested spacing
        spacing: DVec3,
    },
}

/// An immutable 3D scalar grid with physical voxel spacing
///
/// Data is stored x-fastest, then y, then z. The spacing (the voxel
/// ratio) gives the physical size in millimeters of one voxel step along
/// each axis; grids may be anisotropic. Global min/max are scanned once
/// at construction and cached.
///
/// # Example
/// ```
/// use curveform_core::volume::Volume;
/// use curveform_core::DVec3;
///
/// let volume = Volume::new([4, 4, 4], DVec3::ONE, vec![100u16; 64]).unwrap();
/// assert_eq!(volume.sample(DVec3::new(1.5, 2.0, 0.5)), Some(100.0));
/// assert_eq!(volume.sample(DVec3::new(-1.0, 0.0, 0.0)), None);
/// ```
#[derive(Debug, Clone)]
pub struct Volume<T: Voxel> {
    data: Vec<T>,
    dims: [usize; 3],
    spacing: DVec3,
    min: T,
    max: T,
}

impl<T: Voxel> Volume<T> {
    /// Create a volume from raw voxel data
    ///
    /// # Arguments
    /// * `dims` - Grid size `(nx, ny, nz)`, each at least 1
    /// * `spacing` - Physical size of one voxel step along each axis, in mm
    /// * `data` - Voxel values, x-fastest then y then z, `nx * ny * nz` long
    ///
    /// # Errors
    /// Returns a [`VolumeError`] when the dimensions are empty, the
    /// spacing is non-positive, or the buffer length does not match.
    pub fn new(dims: [usize; 3], spacing: DVec3, data: Vec<T>) -> Result<Self, VolumeError> {
        if dims.iter().any(|&d| d == 0) {
            return Err(VolumeError::EmptyDimension { dims });
        }
        if !spacing.is_finite() || spacing.min_element() <= 0.0 {
            return Err(VolumeError::InvalidSpacing { spacing });
        }
        let expected = dims[0] * dims[1] * dims[2];
        if data.len() != expected {
            return Err(VolumeError::DataLength {
                dims,
                expected,
                actual: data.len(),
            });
        }

        // One-time min/max scan; NaN samples are ignored.
        let mut min: Option<T> = None;
        let mut max: Option<T> = None;
        for &value in &data {
            if value.to_f64().is_nan() {
                continue;
            }
            if min.map_or(true, |m| value < m) {
                min = Some(value);
            }
            if max.map_or(true, |m| value > m) {
                max = Some(value);
            }
        }
        let min = min.unwrap_or_default();
        let max = max.unwrap_or_default();

        debug!(
            "volume {}x{}x{}, spacing ({}, {}, {}) mm, range [{}, {}]",
            dims[0],
            dims[1],
            dims[2],
            spacing.x,
            spacing.y,
            spacing.z,
            min.to_f64(),
            max.to_f64()
        );

        Ok(Self {
            data,
            dims,
            spacing,
            min,
            max,
        })
    }

    /// Grid size `(nx, ny, nz)`
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Physical size of one voxel step along each axis, in mm
    pub fn spacing(&self) -> DVec3 {
        self.spacing
    }

    /// Smallest spacing component, the output pixel pitch in mm
    pub fn min_spacing_mm(&self) -> f64 {
        self.spacing.min_element()
    }

    /// Cached global minimum, NaN samples excluded
    pub fn min(&self) -> T {
        self.min
    }

    /// Cached global maximum, NaN samples excluded
    pub fn max(&self) -> T {
        self.max
    }

    /// Value at integer grid coordinates
    ///
    /// # Panics
    /// Panics if any index is outside the grid.
    pub fn at(&self, i: usize, j: usize, k: usize) -> T {
        let [nx, ny, nz] = self.dims;
        assert!(i < nx && j < ny && k < nz, "voxel index ({i}, {j}, {k}) outside {nx}x{ny}x{nz}");
        self.data[i + nx * (j + ny * k)]
    }

    /// Trilinearly interpolated value at real-valued voxel coordinates
    ///
    /// Returns `None` when any coordinate is non-finite, negative, or at
    /// least `Ni - 1` along its axis, or when the interpolated value is
    /// NaN. Interpolation is carried out in `f64`.
    ///
    /// # Example
    /// ```
    /// use curveform_core::volume::Volume;
    /// use curveform_core::DVec3;
    ///
    /// // 2x2x2 grid alternating 0 and 10 along x
    /// let volume = Volume::new([2, 2, 2], DVec3::ONE, vec![0u8, 10, 0, 10, 0, 10, 0, 10]).unwrap();
    /// assert_eq!(volume.sample(DVec3::new(0.5, 0.0, 0.0)), Some(5.0));
    /// ```
    pub fn sample(&self, p: DVec3) -> Option<f64> {
        if !p.is_finite() {
            return None;
        }
        let [nx, ny, nz] = self.dims;
        if p.x < 0.0
            || p.y < 0.0
            || p.z < 0.0
            || p.x >= (nx - 1) as f64
            || p.y >= (ny - 1) as f64
            || p.z >= (nz - 1) as f64
        {
            return None;
        }

        let i = p.x.floor() as usize;
        let j = p.y.floor() as usize;
        let k = p.z.floor() as usize;
        let u = p.x - i as f64;
        let v = p.y - j as f64;
        let w = p.z - k as f64;

        let c000 = self.at(i, j, k).to_f64();
        let c100 = self.at(i + 1, j, k).to_f64();
        let c010 = self.at(i, j + 1, k).to_f64();
        let c110 = self.at(i + 1, j + 1, k).to_f64();
        let c001 = self.at(i, j, k + 1).to_f64();
        let c101 = self.at(i + 1, j, k + 1).to_f64();
        let c011 = self.at(i, j + 1, k + 1).to_f64();
        let c111 = self.at(i + 1, j + 1, k + 1).to_f64();

        let x00 = c000 + (c100 - c000) * u;
        let x10 = c010 + (c110 - c010) * u;
        let x01 = c001 + (c101 - c001) * u;
        let x11 = c011 + (c111 - c011) * u;

        let y0 = x00 + (x10 - x00) * v;
        let y1 = x01 + (x11 - x01) * v;

        let value = y0 + (y1 - y0) * w;
        if value.is_nan() {
            None
        } else {
            Some(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_volume() -> Volume<u16> {
        // value = x + 10*y + 100*z
        let mut data = Vec::with_capacity(4 * 4 * 4);
        for z in 0..4u16 {
            for y in 0..4u16 {
                for x in 0..4u16 {
                    data.push(x + 10 * y + 100 * z);
                }
            }
        }
        Volume::new([4, 4, 4], DVec3::ONE, data).unwrap()
    }

    #[test]
    fn test_sample_exact_at_grid_points() {
        let volume = gradient_volume();
        assert_eq!(volume.sample(DVec3::new(2.0, 1.0, 0.0)), Some(12.0));
        assert_eq!(volume.sample(DVec3::new(0.0, 0.0, 0.0)), Some(0.0));
        assert_eq!(volume.sample(DVec3::new(2.0, 2.0, 2.0)), Some(222.0));
    }

    #[test]
    fn test_sample_interpolates_linearly() {
        let volume = gradient_volume();
        // Linear field, so trilinear interpolation reproduces it exactly
        let value = volume.sample(DVec3::new(1.5, 0.25, 2.75)).unwrap();
        assert!(
            (value - (1.5 + 2.5 + 275.0)).abs() < 1e-9,
            "Expected 279, got {}",
            value
        );
    }

    #[test]
    fn test_sample_out_of_range_returns_none() {
        let volume = gradient_volume();
        assert_eq!(volume.sample(DVec3::new(-0.1, 0.0, 0.0)), None);
        assert_eq!(volume.sample(DVec3::new(0.0, -1.0, 0.0)), None);
        // The last voxel plane is outside the interpolable domain
        assert_eq!(volume.sample(DVec3::new(3.0, 0.0, 0.0)), None);
        assert_eq!(volume.sample(DVec3::new(0.0, 0.0, 5.0)), None);
    }

    #[test]
    fn test_sample_non_finite_returns_none() {
        let volume = gradient_volume();
        assert_eq!(volume.sample(DVec3::new(f64::NAN, 1.0, 1.0)), None);
        assert_eq!(volume.sample(DVec3::new(1.0, f64::INFINITY, 1.0)), None);
    }

    #[test]
    fn test_nan_data_treated_as_out_of_range() {
        let mut data = vec![1.0f64; 8];
        data[0] = f64::NAN;
        let volume = Volume::new([2, 2, 2], DVec3::ONE, data).unwrap();
        // Interpolation touching the NaN corner yields NaN, reported as None
        assert_eq!(volume.sample(DVec3::new(0.5, 0.5, 0.5)), None);
        // Min/max scan skips the NaN sample
        assert_eq!(volume.min(), 1.0);
        assert_eq!(volume.max(), 1.0);
    }

    #[test]
    fn test_min_max_cached() {
        let volume = gradient_volume();
        assert_eq!(volume.min(), 0);
        assert_eq!(volume.max(), 333);
    }

    #[test]
    fn test_min_spacing_anisotropic() {
        let volume =
            Volume::new([2, 2, 2], DVec3::new(0.5, 1.0, 2.0), vec![0u8; 8]).unwrap();
        assert_eq!(volume.min_spacing_mm(), 0.5);
    }

    #[test]
    fn test_new_rejects_wrong_data_length() {
        let result = Volume::new([4, 4, 4], DVec3::ONE, vec![0u8; 10]);
        assert!(matches!(
            result,
            Err(VolumeError::DataLength { expected: 64, actual: 10, .. })
        ));
    }

    #[test]
    fn test_new_rejects_empty_dimension() {
        let result = Volume::new([4, 0, 4], DVec3::ONE, vec![0u8; 0]);
        assert!(matches!(result, Err(VolumeError::EmptyDimension { .. })));
    }

    #[test]
    fn test_new_rejects_bad_spacing() {
        let result = Volume::new([2, 2, 2], DVec3::new(1.0, -1.0, 1.0), vec![0u8; 8]);
        assert!(matches!(result, Err(VolumeError::InvalidSpacing { .. })));
    }

    #[test]
    fn test_pixel_format_descriptors() {
        assert_eq!(PixelFormat::U8.bits_allocated(), 8);
        assert_eq!(PixelFormat::I16.bits_allocated(), 16);
        assert_eq!(PixelFormat::F64.bits_allocated(), 64);
        assert!(PixelFormat::I16.is_signed());
        assert!(!PixelFormat::U16.is_signed());
        assert!(PixelFormat::F32.is_float());
        assert!(!PixelFormat::I32.is_float());
        assert_eq!(<i16 as Voxel>::FORMAT, PixelFormat::I16);
    }
}
