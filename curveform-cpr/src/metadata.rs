//! Output image metadata
//!
//! The panoramic raster travels with a small DICOM-flavoured header so
//! the host viewer can display it like any other series instance. Pixel
//! geometry and encoding come from the render; patient and study
//! identifiers are supplied by the caller and passed through untouched.

use std::collections::BTreeMap;

use curveform_core::volume::PixelFormat;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generate a fresh SOP instance UID
///
/// Uses the UUID-derived `2.25.<decimal>` form, which needs no registered
/// root and is unique per call.
pub fn new_sop_instance_uid() -> String {
    format!("2.25.{}", Uuid::new_v4().as_u128())
}

/// Caller-supplied patient and study identifiers
///
/// Everything here is optional; absent fields are simply omitted from the
/// emitted tag map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesContext {
    /// PatientName (0010,0010)
    pub patient_name: Option<String>,
    /// PatientID (0010,0020)
    pub patient_id: Option<String>,
    /// StudyInstanceUID (0020,000D)
    pub study_instance_uid: Option<String>,
    /// SeriesInstanceUID (0020,000E)
    pub series_instance_uid: Option<String>,
    /// StudyDescription (0008,1030)
    pub study_description: Option<String>,
}

/// Header of a rendered panoramic image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanoramicMeta {
    /// Raster width, one column per resampled curve point
    pub columns: usize,
    /// Raster height
    pub rows: usize,
    /// Row spacing and column spacing in mm
    pub pixel_spacing: [f64; 2],
    /// Reconstruction thickness in mm
    pub slice_thickness: f64,
    /// Fresh per-render instance UID
    pub sop_instance_uid: String,
    /// Always 1; the reformation is a single-frame series
    pub instance_number: u32,
    /// Bits per stored sample
    pub bits_allocated: u16,
    /// 0 for unsigned, 1 for signed encodings
    pub pixel_representation: u16,
    /// Default display window center, from the volume's value range
    pub window_center: f64,
    /// Default display window width, from the volume's value range
    pub window_width: f64,
    /// Inherited patient and study identifiers
    pub series: SeriesContext,
}

impl PanoramicMeta {
    /// Assemble the header for a render
    ///
    /// # Arguments
    /// * `columns`, `rows` - Raster dimensions
    /// * `pmm` - Minimum voxel spacing of the source volume, in mm
    /// * `step_mm` - Column spacing parameter, in mm
    /// * `format` - Pixel encoding of the raster
    /// * `value_range` - The volume's cached (min, max) for windowing
    /// * `series` - Caller-supplied identifiers
    pub fn new(
        columns: usize,
        rows: usize,
        pmm: f64,
        step_mm: f64,
        format: PixelFormat,
        value_range: (f64, f64),
        series: SeriesContext,
    ) -> Self {
        let (min, max) = value_range;
        Self {
            columns,
            rows,
            pixel_spacing: [pmm, step_mm],
            slice_thickness: pmm,
            sop_instance_uid: new_sop_instance_uid(),
            instance_number: 1,
            bits_allocated: format.bits_allocated(),
            pixel_representation: u16::from(format.is_signed()),
            window_center: (min + max) / 2.0,
            window_width: (max - min).max(1.0),
            series,
        }
    }

    /// Flatten the header into a DICOM-style tag map
    ///
    /// Multi-valued entries use the usual backslash separator. Absent
    /// series identifiers are omitted.
    pub fn tag_map(&self) -> BTreeMap<String, String> {
        let mut tags = BTreeMap::new();
        tags.insert("Columns".to_owned(), self.columns.to_string());
        tags.insert("Rows".to_owned(), self.rows.to_string());
        tags.insert(
            "PixelSpacing".to_owned(),
            format!("{}\\{}", self.pixel_spacing[0], self.pixel_spacing[1]),
        );
        tags.insert("SliceThickness".to_owned(), self.slice_thickness.to_string());
        tags.insert("SOPInstanceUID".to_owned(), self.sop_instance_uid.clone());
        tags.insert("InstanceNumber".to_owned(), self.instance_number.to_string());
        tags.insert("BitsAllocated".to_owned(), self.bits_allocated.to_string());
        tags.insert(
            "PixelRepresentation".to_owned(),
            self.pixel_representation.to_string(),
        );
        tags.insert("WindowCenter".to_owned(), self.window_center.to_string());
        tags.insert("WindowWidth".to_owned(), self.window_width.to_string());

        let series = [
            ("PatientName", &self.series.patient_name),
            ("PatientID", &self.series.patient_id),
            ("StudyInstanceUID", &self.series.study_instance_uid),
            ("SeriesInstanceUID", &self.series.series_instance_uid),
            ("StudyDescription", &self.series.study_description),
        ];
        for (tag, value) in series {
            if let Some(value) = value {
                tags.insert(tag.to_owned(), value.clone());
            }
        }

        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_meta() -> PanoramicMeta {
        PanoramicMeta::new(
            29,
            4,
            1.0,
            1.0,
            PixelFormat::I16,
            (-1000.0, 3000.0),
            SeriesContext {
                patient_name: Some("DOE^JANE".to_owned()),
                patient_id: Some("PID-42".to_owned()),
                study_instance_uid: Some("1.2.3.4".to_owned()),
                series_instance_uid: None,
                study_description: None,
            },
        )
    }

    #[test]
    fn test_uid_shape_and_freshness() {
        let a = new_sop_instance_uid();
        let b = new_sop_instance_uid();
        assert!(a.starts_with("2.25."));
        assert_ne!(a, b, "UIDs must differ across calls");
        assert!(a[5..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_header_fields() {
        let meta = sample_meta();
        assert_eq!(meta.pixel_spacing, [1.0, 1.0]);
        assert_eq!(meta.slice_thickness, 1.0);
        assert_eq!(meta.instance_number, 1);
        assert_eq!(meta.bits_allocated, 16);
        assert_eq!(meta.pixel_representation, 1);
        assert_eq!(meta.window_center, 1000.0);
        assert_eq!(meta.window_width, 4000.0);
    }

    #[test]
    fn test_tag_map_contents() {
        let meta = sample_meta();
        let tags = meta.tag_map();
        assert_eq!(tags["Columns"], "29");
        assert_eq!(tags["Rows"], "4");
        assert_eq!(tags["PixelSpacing"], "1\\1");
        assert_eq!(tags["InstanceNumber"], "1");
        assert_eq!(tags["PatientName"], "DOE^JANE");
        assert_eq!(tags["StudyInstanceUID"], "1.2.3.4");
        assert!(!tags.contains_key("SeriesInstanceUID"));
        assert_eq!(tags["SOPInstanceUID"], meta.sop_instance_uid);
    }

    #[test]
    fn test_header_serializes_for_the_viewer() {
        let meta = sample_meta();
        let json = serde_json::to_value(&meta).expect("header should serialize");
        assert_eq!(json["columns"], 29);
        assert_eq!(json["bits_allocated"], 16);
        assert_eq!(json["series"]["patient_id"], "PID-42");
    }
}
