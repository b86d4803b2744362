//! Collimated field area derived from the beam geometry
//!
//! The dose-area product is the reference point dose times the field area at
//! the reference plane. Consoles that do not report the field area get it
//! from the inverse-square projection of the detector plane onto the
//! reference plane.

/// Assumed distance between the isocenter and the patient surface [mm]
pub const ISOCENTER_TO_PATIENT_SURFACE_OFFSET_MM: f64 = 150.;

/// Source distances of an irradiation event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamGeometry {
    /// source to isocenter distance [mm]
    pub source_to_isocenter_mm: f64,
    /// source to detector distance [mm]
    pub source_to_detector_mm: f64,
}
impl BeamGeometry {
    pub fn new(source_to_isocenter_mm: f64, source_to_detector_mm: f64) -> Self {
        Self {
            source_to_isocenter_mm,
            source_to_detector_mm,
        }
    }
    /// Ratio of the reference plane distance to the detector distance
    pub fn reference_ratio(&self) -> f64 {
        (self.source_to_isocenter_mm - ISOCENTER_TO_PATIENT_SURFACE_OFFSET_MM)
            / self.source_to_detector_mm
    }
    /// Collimated field area [m²] from the dose-area product [Gy.m²] and the reference point dose [Gy]
    ///
    /// Zero doses or distances are not guarded against, the result is then infinite or NaN.
    pub fn collimated_field_area(&self, dose_area_product_gym2: f64, dose_rp_gy: f64) -> f64 {
        dose_area_product_gym2 / (dose_rp_gy * self.reference_ratio().powi(2))
    }
}
