//! Catmull-Rom smoothing and arc-length resampling
//!
//! A user-drawn polyline is too coarse to sample a volume directly. This
//! module densifies it with a uniform Catmull-Rom spline through every
//! control point, then resamples the dense polyline at a fixed arc-length
//! step so downstream columns are evenly spaced along the curve.

use glam::DVec3;

/// Guards against accumulated rounding in the segment-length sum when the
/// total arc length lands on an exact multiple of the step.
const LENGTH_EPS: f64 = 1e-9;

/// Evaluate a Catmull-Rom segment at parameter t ∈ [0, 1]
///
/// The curve passes through `p1` at t=0 and `p2` at t=1; `p0` and `p3`
/// shape the tangents. Uniform formulation with tension 0.5.
///
/// # Example
/// ```
/// use curveform_core::math::curves::catmull_rom_point;
/// use curveform_core::DVec3;
///
/// let p0 = DVec3::new(0.0, 0.0, 0.0);
/// let p1 = DVec3::new(1.0, 0.0, 0.0);
/// let p2 = DVec3::new(2.0, 1.0, 0.0);
/// let p3 = DVec3::new(3.0, 1.0, 0.0);
///
/// assert!((catmull_rom_point(p0, p1, p2, p3, 0.0) - p1).length() < 1e-12);
/// assert!((catmull_rom_point(p0, p1, p2, p3, 1.0) - p2).length() < 1e-12);
/// ```
pub fn catmull_rom_point(p0: DVec3, p1: DVec3, p2: DVec3, p3: DVec3, t: f64) -> DVec3 {
    let t2 = t * t;
    let t3 = t2 * t;

    // Basis functions
    let b0 = -0.5 * t3 + t2 - 0.5 * t;
    let b1 = 1.5 * t3 - 2.5 * t2 + 1.0;
    let b2 = -1.5 * t3 + 2.0 * t2 + 0.5 * t;
    let b3 = 0.5 * t3 - 0.5 * t2;

    b0 * p0 + b1 * p1 + b2 * p2 + b3 * p3
}

/// Densify a polyline with a Catmull-Rom spline through every vertex
///
/// Each segment `(p1, p2)` uses its polyline neighbours as shaping points,
/// clamped to the endpoints at the ends of the polyline. The number of
/// interpolated points per segment scales with chord length at roughly
/// two samples per voxel, with a floor of two. The final control point is
/// appended so the dense polyline spans the full input.
///
/// Polylines with fewer than two points are returned unchanged.
///
/// # Example
/// ```
/// use curveform_core::math::curves::smooth_polyline;
/// use curveform_core::DVec3;
///
/// let control = vec![
///     DVec3::new(0.0, 0.0, 0.0),
///     DVec3::new(4.0, 2.0, 0.0),
///     DVec3::new(8.0, 0.0, 0.0),
/// ];
/// let dense = smooth_polyline(&control);
/// // Passes through every control point
/// assert_eq!(dense[0], control[0]);
/// assert_eq!(*dense.last().unwrap(), control[2]);
/// assert!(dense.len() > control.len());
/// ```
pub fn smooth_polyline(control_points: &[DVec3]) -> Vec<DVec3> {
    let n = control_points.len();
    if n < 2 {
        return control_points.to_vec();
    }

    let mut dense = Vec::new();
    for i in 0..n - 1 {
        let p1 = control_points[i];
        let p2 = control_points[i + 1];
        // Neighbours clamped to the endpoints
        let p0 = if i == 0 { p1 } else { control_points[i - 1] };
        let p3 = if i + 2 < n { control_points[i + 2] } else { p2 };

        // Density of roughly two samples per voxel of chord length
        let chord = p1.distance(p2);
        let segments = ((2.0 * chord).round() as usize).max(2);

        for k in 0..segments {
            let t = k as f64 / segments as f64;
            dense.push(catmull_rom_point(p0, p1, p2, p3, t));
        }
    }
    dense.push(control_points[n - 1]);

    dense
}

/// Cumulative arc lengths along a polyline
///
/// `lengths[i]` is the distance from the start of the polyline to point
/// `i`; the last entry is the total length.
pub fn arc_lengths(points: &[DVec3]) -> Vec<f64> {
    if points.is_empty() {
        return Vec::new();
    }
    let mut lengths = Vec::with_capacity(points.len());
    lengths.push(0.0);
    for i in 1..points.len() {
        lengths.push(lengths[i - 1] + points[i].distance(points[i - 1]));
    }
    lengths
}

/// Resample a polyline at a uniform arc-length step
///
/// Emits samples at distances `0, step, 2*step, ...` up to the total
/// length by walking the polyline and interpolating linearly inside the
/// segment containing each target distance. A polyline of length `L`
/// yields `floor(L / step) + 1` samples.
///
/// Returns an empty vector when the input has fewer than two points, the
/// step is non-positive, or the total length is zero.
///
/// # Example
/// ```
/// use curveform_core::math::curves::resample_by_arc_length;
/// use curveform_core::DVec3;
///
/// let line = vec![DVec3::ZERO, DVec3::new(2.5, 0.0, 0.0)];
/// let samples = resample_by_arc_length(&line, 1.0);
/// assert_eq!(samples.len(), 3);
/// assert_eq!(samples[1], DVec3::new(1.0, 0.0, 0.0));
/// ```
pub fn resample_by_arc_length(points: &[DVec3], step: f64) -> Vec<DVec3> {
    if points.len() < 2 || step <= 0.0 {
        return Vec::new();
    }
    let lengths = arc_lengths(points);
    let total = *lengths.last().unwrap();
    if total <= 0.0 {
        return Vec::new();
    }

    let count = ((total + LENGTH_EPS) / step).floor() as usize + 1;
    let mut samples = Vec::with_capacity(count);
    let mut seg = 0usize;
    for i in 0..count {
        let target = i as f64 * step;
        while seg + 2 < points.len() && lengths[seg + 1] < target {
            seg += 1;
        }
        let seg_len = lengths[seg + 1] - lengths[seg];
        let t = if seg_len > 0.0 {
            ((target - lengths[seg]) / seg_len).clamp(0.0, 1.0)
        } else {
            0.0
        };
        samples.push(points[seg].lerp(points[seg + 1], t));
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catmull_rom_passes_through_segment_boundaries() {
        let p0 = DVec3::new(0.0, 0.0, 0.0);
        let p1 = DVec3::new(0.0, 1.0, 0.0);
        let p2 = DVec3::new(1.0, 2.0, 0.5);
        let p3 = DVec3::new(1.0, 3.0, 1.0);

        assert!(
            (catmull_rom_point(p0, p1, p2, p3, 0.0) - p1).length() < 1e-12,
            "Should pass through p1 at t=0"
        );
        assert!(
            (catmull_rom_point(p0, p1, p2, p3, 1.0) - p2).length() < 1e-12,
            "Should pass through p2 at t=1"
        );
    }

    #[test]
    fn test_catmull_rom_straight_line_midpoint() {
        let points: Vec<DVec3> = (0..4).map(|i| DVec3::new(i as f64, 0.0, 0.0)).collect();
        let mid = catmull_rom_point(points[0], points[1], points[2], points[3], 0.5);
        assert!(
            (mid - DVec3::new(1.5, 0.0, 0.0)).length() < 1e-12,
            "Collinear controls should interpolate on the line, got {:?}",
            mid
        );
    }

    #[test]
    fn test_smooth_polyline_contains_control_points() {
        let control = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(3.0, 4.0, 0.0),
            DVec3::new(6.0, 0.0, 0.0),
        ];
        let dense = smooth_polyline(&control);

        for cp in &control {
            let nearest = dense
                .iter()
                .map(|p| p.distance(*cp))
                .fold(f64::INFINITY, f64::min);
            assert!(
                nearest < 1e-12,
                "Control point {:?} missing from dense polyline (nearest {})",
                cp,
                nearest
            );
        }
    }

    #[test]
    fn test_smooth_polyline_density_scales_with_chord() {
        // Single 10-voxel segment: max(2, round(20)) = 20 points plus endpoint
        let control = vec![DVec3::ZERO, DVec3::new(10.0, 0.0, 0.0)];
        let dense = smooth_polyline(&control);
        assert_eq!(dense.len(), 21);
    }

    #[test]
    fn test_smooth_polyline_short_chord_floor() {
        // Tiny segment still gets the two-point floor plus endpoint
        let control = vec![DVec3::ZERO, DVec3::new(0.2, 0.0, 0.0)];
        let dense = smooth_polyline(&control);
        assert_eq!(dense.len(), 3);
    }

    #[test]
    fn test_smooth_polyline_passthrough_below_two_points() {
        assert!(smooth_polyline(&[]).is_empty());
        let single = vec![DVec3::new(1.0, 2.0, 3.0)];
        assert_eq!(smooth_polyline(&single), single);
    }

    #[test]
    fn test_arc_lengths_cumulative() {
        let points = vec![
            DVec3::ZERO,
            DVec3::new(3.0, 0.0, 0.0),
            DVec3::new(3.0, 4.0, 0.0),
        ];
        let lengths = arc_lengths(&points);
        assert_eq!(lengths, vec![0.0, 3.0, 7.0]);
    }

    #[test]
    fn test_resample_straight_line_count_and_spacing() {
        // 10-voxel chord: floor(10) + 1 = 11 samples, exactly 1 voxel apart
        let line = vec![DVec3::ZERO, DVec3::new(10.0, 0.0, 0.0)];
        let samples = resample_by_arc_length(&line, 1.0);
        assert_eq!(samples.len(), 11);
        for i in 1..samples.len() {
            let spacing = samples[i].distance(samples[i - 1]);
            assert!(
                (spacing - 1.0).abs() < 1e-9,
                "Sample spacing should be 1 voxel, got {}",
                spacing
            );
        }
    }

    #[test]
    fn test_resample_fractional_length_floors() {
        let line = vec![DVec3::ZERO, DVec3::new(2.5, 0.0, 0.0)];
        let samples = resample_by_arc_length(&line, 1.0);
        assert_eq!(samples.len(), 3, "floor(2.5) + 1 samples expected");
        assert_eq!(*samples.last().unwrap(), DVec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_resample_through_smoothed_diagonal() {
        // The dense polyline of a straight diagonal keeps its chord length
        let control = vec![DVec3::new(5.0, 5.0, 10.0), DVec3::new(25.0, 25.0, 10.0)];
        let dense = smooth_polyline(&control);
        let samples = resample_by_arc_length(&dense, 1.0);
        let expected = (800.0f64.sqrt()).floor() as usize + 1;
        assert_eq!(samples.len(), expected);
        for i in 1..samples.len() {
            let spacing = samples[i].distance(samples[i - 1]);
            assert!(
                (spacing - 1.0).abs() < 1e-6,
                "Uniform spacing expected, got {}",
                spacing
            );
        }
    }

    #[test]
    fn test_resample_degenerate_inputs_are_empty() {
        assert!(resample_by_arc_length(&[], 1.0).is_empty());
        assert!(resample_by_arc_length(&[DVec3::ZERO], 1.0).is_empty());
        // Zero total length
        let stacked = vec![DVec3::ONE, DVec3::ONE];
        assert!(resample_by_arc_length(&stacked, 1.0).is_empty());
        // Non-positive step
        let line = vec![DVec3::ZERO, DVec3::X];
        assert!(resample_by_arc_length(&line, 0.0).is_empty());
    }
}
