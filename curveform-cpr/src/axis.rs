//! Persistent per-view axis object
//!
//! A [`CurveAxis`] is created when the user requests a curved view and
//! lives until that viewer closes. It holds a shared handle to the
//! volume, the converted control points, and the reformation parameters.
//! Parameter setters bump a generation counter, which drops the published
//! render; `render()` reuses the published output while it is current and
//! discards results that went stale while they were being computed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use curveform_core::math::frames::FrameMode;
use curveform_core::plane::ViewPlane;
use curveform_core::volume::{Volume, Voxel};
use curveform_core::{DVec2, DVec3};
use log::debug;

use crate::metadata::SeriesContext;
use crate::params::{ensure_positive, CprParams, ParamError};
use crate::renderer::{render, CprOutput};

/// One curved reformation view over a shared volume
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use curveform_cpr::{CurveAxis, SeriesContext, Volume};
/// use curveform_core::DVec3;
///
/// let volume = Arc::new(Volume::new([16, 16, 16], DVec3::ONE, vec![50u8; 4096]).unwrap());
/// let curve = vec![DVec3::new(2.0, 8.0, 8.0), DVec3::new(12.0, 8.0, 8.0)];
/// let axis = CurveAxis::new(volume, curve, DVec3::Z, SeriesContext::default());
///
/// let output = axis.render();
/// assert_eq!(output.image.columns(), 11);
/// ```
pub struct CurveAxis<T: Voxel> {
    volume: Arc<Volume<T>>,
    control_points: Vec<DVec3>,
    plane_normal: DVec3,
    params: CprParams,
    series: SeriesContext,
    generation: AtomicU64,
    published: RwLock<Option<(u64, Arc<CprOutput<T>>)>>,
}

impl<T: Voxel> CurveAxis<T> {
    /// Create an axis from control points already in voxel coordinates
    ///
    /// Parameters take their defaults from the volume; the plane normal
    /// is normalized.
    pub fn new(
        volume: Arc<Volume<T>>,
        control_points: Vec<DVec3>,
        plane_normal: DVec3,
        series: SeriesContext,
    ) -> Self {
        let params = CprParams::for_volume(&volume);
        Self {
            volume,
            control_points,
            plane_normal: plane_normal.normalize_or(DVec3::Z),
            params,
            series,
            generation: AtomicU64::new(0),
            published: RwLock::new(None),
        }
    }

    /// Create an axis from a polyline drawn on a viewing plane
    ///
    /// Every vertex is converted from image-pixel coordinates to voxel
    /// space at the given crosshair depth; the plane supplies the normal.
    pub fn from_polyline(
        volume: Arc<Volume<T>>,
        plane: ViewPlane,
        polyline: &[DVec2],
        depth: f64,
        series: SeriesContext,
    ) -> Self {
        let control_points = polyline
            .iter()
            .map(|&p| plane.image_to_voxel(&volume, p, depth))
            .collect();
        Self::new(volume, control_points, plane.normal(), series)
    }

    /// The shared volume handle
    pub fn volume(&self) -> &Arc<Volume<T>> {
        &self.volume
    }

    /// Control points in voxel coordinates
    pub fn control_points(&self) -> &[DVec3] {
        &self.control_points
    }

    /// Unit normal of the drawing plane
    pub fn plane_normal(&self) -> DVec3 {
        self.plane_normal
    }

    /// Current reformation parameters
    pub fn params(&self) -> &CprParams {
        &self.params
    }

    /// Invalidation counter; bumps whenever a parameter changes
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Set the vertical extent in mm
    ///
    /// Rejects non-positive values without changing anything. Setting the
    /// current value again keeps the published render valid.
    pub fn set_width_mm(&mut self, value: f64) -> Result<(), ParamError> {
        ensure_positive("width_mm", value)?;
        if value != self.params.width_mm {
            self.params.width_mm = value;
            self.invalidate();
        }
        Ok(())
    }

    /// Set the column spacing reported in the header, in mm
    pub fn set_step_mm(&mut self, value: f64) -> Result<(), ParamError> {
        ensure_positive("step_mm", value)?;
        if value != self.params.step_mm {
            self.params.step_mm = value;
            self.invalidate();
        }
        Ok(())
    }

    /// Set the MIP slab thickness in mm
    pub fn set_slab_mm(&mut self, value: f64) -> Result<(), ParamError> {
        ensure_positive("slab_mm", value)?;
        if value != self.params.slab_mm {
            self.params.slab_mm = value;
            self.invalidate();
        }
        Ok(())
    }

    /// Toggle the column-order reversal
    pub fn set_reverse_curve(&mut self, value: bool) {
        if value != self.params.reverse_curve {
            self.params.reverse_curve = value;
            self.invalidate();
        }
    }

    /// Switch the transverse frame strategy
    pub fn set_frame_mode(&mut self, value: FrameMode) {
        if value != self.params.frame_mode {
            self.params.frame_mode = value;
            self.invalidate();
        }
    }

    fn invalidate(&self) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        debug!("curve axis invalidated, generation {}", generation);
        *write_slot(&self.published) = None;
    }

    /// Render the reformation, reusing the published output if current
    ///
    /// The computation runs on the calling thread (the host schedules it
    /// on a worker). If a parameter change lands while a render is in
    /// flight, the stale result is returned to its caller but not
    /// published.
    pub fn render(&self) -> Arc<CprOutput<T>> {
        let generation = self.generation.load(Ordering::Acquire);
        if let Some((published_generation, output)) = read_slot(&self.published).as_ref() {
            if *published_generation == generation {
                return Arc::clone(output);
            }
        }

        let output = Arc::new(render(
            &self.volume,
            &self.control_points,
            self.plane_normal,
            &self.params,
            &self.series,
        ));

        if self.generation.load(Ordering::Acquire) == generation {
            *write_slot(&self.published) = Some((generation, Arc::clone(&output)));
        } else {
            debug!("discarding stale render for generation {}", generation);
        }
        output
    }

    /// The most recently published render, if any
    pub fn last_render(&self) -> Option<Arc<CprOutput<T>>> {
        read_slot(&self.published)
            .as_ref()
            .map(|(_, output)| Arc::clone(output))
    }
}

type Slot<T> = RwLock<Option<(u64, Arc<CprOutput<T>>)>>;

fn read_slot<T: Voxel>(slot: &Slot<T>) -> std::sync::RwLockReadGuard<'_, Option<(u64, Arc<CprOutput<T>>)>> {
    match slot.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write_slot<T: Voxel>(slot: &Slot<T>) -> std::sync::RwLockWriteGuard<'_, Option<(u64, Arc<CprOutput<T>>)>> {
    match slot.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
