//! Transverse frames along a resampled curve
//!
//! Each raster column needs a direction perpendicular to the curve in
//! which to spread its MIP slab. The default planar mode derives it from
//! the drawing plane's normal and the local tangent, which is exact for
//! curves drawn inside one viewing plane. The parallel-transport mode
//! carries a reference direction along the curve with minimal twist and
//! also handles curves that leave their drawing plane.

use glam::DVec3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Cross products below this squared length are treated as degenerate
const DEGENERATE_EPS: f64 = 1e-12;

/// Strategy for computing per-sample transverse directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FrameMode {
    /// In-plane perpendicular from the drawing plane's normal and the
    /// local tangent. Assumes an approximately planar curve.
    #[default]
    Planar,
    /// Rotation-minimizing frame propagated between consecutive tangents
    /// with Rodrigues' formula.
    ParallelTransport,
}

/// Unit tangents along a polyline by finite differences
///
/// Central differences for interior points, one-sided differences at the
/// endpoints. A degenerate difference falls back to +x.
pub fn compute_tangents(points: &[DVec3]) -> Vec<DVec3> {
    let n = points.len();
    let mut tangents = Vec::with_capacity(n);
    for i in 0..n {
        let raw = if n < 2 {
            DVec3::X
        } else if i == 0 {
            points[1] - points[0]
        } else if i == n - 1 {
            points[n - 1] - points[n - 2]
        } else {
            points[i + 1] - points[i - 1]
        };
        tangents.push(raw.normalize_or(DVec3::X));
    }
    tangents
}

/// Per-sample unit perpendiculars for a resampled curve
///
/// Every returned vector is unit length, orthogonal to the local tangent,
/// sign-continuous along the curve, and globally oriented outward from
/// the curve's centroid (checked at the middle sample). In planar mode
/// the perpendiculars also lie in the drawing plane.
///
/// # Arguments
/// * `points` - Resampled curve points
/// * `plane_normal` - Unit normal of the drawing plane
/// * `mode` - Frame strategy, see [`FrameMode`]
pub fn compute_perpendiculars(points: &[DVec3], plane_normal: DVec3, mode: FrameMode) -> Vec<DVec3> {
    if points.is_empty() {
        return Vec::new();
    }

    let tangents = compute_tangents(points);
    let mut perps: Vec<DVec3> = Vec::with_capacity(points.len());

    match mode {
        FrameMode::Planar => {
            for (i, tangent) in tangents.iter().enumerate() {
                let cross = plane_normal.cross(*tangent);
                let perp = if cross.length_squared() > DEGENERATE_EPS {
                    cross.normalize()
                } else if i > 0 {
                    // Tangent parallel to the normal, reuse the previous frame
                    perps[i - 1]
                } else {
                    in_plane_axis(plane_normal)
                };
                let perp = if i > 0 && perp.dot(perps[i - 1]) < 0.0 {
                    -perp
                } else {
                    perp
                };
                perps.push(perp);
            }
        }
        FrameMode::ParallelTransport => {
            for (i, tangent) in tangents.iter().enumerate() {
                if i == 0 {
                    let cross = plane_normal.cross(*tangent);
                    let seed = if cross.length_squared() > DEGENERATE_EPS {
                        cross.normalize()
                    } else {
                        in_plane_axis(plane_normal)
                    };
                    perps.push(seed);
                } else {
                    let transported = transport(perps[i - 1], tangents[i - 1], *tangent);
                    // Re-orthogonalize against the current tangent
                    let ortho = transported - transported.dot(*tangent) * *tangent;
                    perps.push(ortho.normalize_or(perps[i - 1]));
                }
            }
        }
    }

    orient_outward(points, &mut perps);
    perps
}

/// Rotate `perp` by the rotation taking tangent `from` to tangent `to`
fn transport(perp: DVec3, from: DVec3, to: DVec3) -> DVec3 {
    let axis = from.cross(to);
    let sin = axis.length();
    if sin < DEGENERATE_EPS {
        // Consecutive tangents already aligned (or opposite; keep the frame)
        return perp;
    }
    let axis = axis / sin;
    let angle = from.dot(to).clamp(-1.0, 1.0).acos();
    rotate_about(perp, axis, angle)
}

/// Rodrigues rotation of `v` around unit `axis` by `angle` radians
fn rotate_about(v: DVec3, axis: DVec3, angle: f64) -> DVec3 {
    let (sin, cos) = angle.sin_cos();
    v * cos + axis.cross(v) * sin + axis * axis.dot(v) * (1.0 - cos)
}

/// A canonical unit vector lying in the plane with the given normal
fn in_plane_axis(plane_normal: DVec3) -> DVec3 {
    let candidate = if plane_normal.x.abs() < 0.9 {
        DVec3::X
    } else {
        DVec3::Y
    };
    let projected = candidate - candidate.dot(plane_normal) * plane_normal;
    projected.normalize_or(DVec3::X)
}

/// Flip every perpendicular if the middle sample points toward the centroid
fn orient_outward(points: &[DVec3], perps: &mut [DVec3]) {
    let centroid = points.iter().fold(DVec3::ZERO, |acc, &p| acc + p) / points.len() as f64;
    let mid = points.len() / 2;
    if perps[mid].dot(points[mid] - centroid) < 0.0 {
        for perp in perps.iter_mut() {
            *perp = -*perp;
        }
    }
}
