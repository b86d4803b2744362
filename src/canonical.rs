//! Canonical irradiation event schema
//!
//! The vendor independent event table every parser writes. Column names and
//! units are fixed: they are the contract of the downstream normalization.

use std::{fmt, io, ops::Deref, path::Path};

use itertools::Itertools;
use strum::IntoEnumIterator;
use strum_macros::{EnumIter, EnumString, IntoStaticStr};

use crate::{
    plane::Plane,
    table::Cell,
    units::{self, DELIMITER},
};

/// Canonical event table columns, in schema order
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
pub enum CanonicalColumn {
    AcquisitionPlane,
    DateTimeStarted,
    IrradiationEventType,
    AcquisitionProtocol,
    #[strum(serialize = "IrradiationEventUID")]
    IrradiationEventUid,
    #[strum(serialize = "DoseAreaProduct_Gym2")]
    DoseAreaProduct,
    #[strum(serialize = "DoseRP_Gy")]
    DoseRp,
    #[strum(serialize = "PositionerPrimaryAngle_deg")]
    PositionerPrimaryAngle,
    #[strum(serialize = "PositionerSecondaryAngle_deg")]
    PositionerSecondaryAngle,
    #[strum(serialize = "CollimatedFieldArea_m2")]
    CollimatedFieldArea,
    XRayFilterType,
    XRayFilterMaterial,
    #[strum(serialize = "XRayFilterThicknessMinimum_mm")]
    XRayFilterThicknessMinimum,
    #[strum(serialize = "XRayFilterThicknessMaximum_mm")]
    XRayFilterThicknessMaximum,
    #[strum(serialize = "PulseRate_{pulse}/s")]
    PulseRate,
    #[strum(serialize = "KVP_kV")]
    Kvp,
    #[strum(serialize = "XRayTubeCurrent_mA")]
    XRayTubeCurrent,
    #[strum(serialize = "PulseWidth_ms")]
    PulseWidth,
    #[strum(serialize = "Exposure_uAs")]
    Exposure,
    #[strum(serialize = "FocalSpotSize_mm")]
    FocalSpotSize,
    #[strum(serialize = "DistanceSourcetoDetector_mm")]
    DistanceSourceToDetector,
    #[strum(serialize = "DistanceSourcetoIsocenter_mm")]
    DistanceSourceToIsocenter,
    #[strum(serialize = "TableLongitudinalPosition_mm")]
    TableLongitudinalPosition,
    #[strum(serialize = "TableLateralPosition_mm")]
    TableLateralPosition,
    #[strum(serialize = "TableHeightPosition_mm")]
    TableHeightPosition,
    TargetRegion,
    Manufacturer,
    ManufacturerModelName,
}
impl CanonicalColumn {
    /// The column name as written in the canonical table header
    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// A field reported either once per event or once per filter slot
#[derive(Debug, Clone, PartialEq)]
pub enum PerFilter<T> {
    Single(T),
    Slots(Vec<T>),
}
impl<T: Default> Default for PerFilter<T> {
    fn default() -> Self {
        PerFilter::Single(T::default())
    }
}
impl<T> PerFilter<T> {
    /// Number of filter slots
    pub fn n_slots(&self) -> usize {
        match self {
            PerFilter::Single(_) => 1,
            PerFilter::Slots(slots) => slots.len(),
        }
    }
}
impl<T: fmt::Display> fmt::Display for PerFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PerFilter::Single(value) => write!(f, "{}", value),
            PerFilter::Slots(values) => write!(f, "{}", values.iter().join(&DELIMITER.to_string())),
        }
    }
}
impl PerFilter<f64> {
    /// Aluminum filter thickness [mm]
    ///
    /// Single filter consoles report copper only, the aluminum thickness is then 0.
    pub fn aluminum(&self) -> Option<f64> {
        match self {
            PerFilter::Single(_) => Some(0.),
            PerFilter::Slots(slots) => units::aluminum_thickness(slots),
        }
    }
    /// Copper filter thickness [mm]
    pub fn copper(&self) -> Option<f64> {
        match self {
            PerFilter::Single(value) => Some(*value),
            PerFilter::Slots(slots) => units::copper_thickness(slots),
        }
    }
}

/// One irradiation event in canonical units
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalEvent {
    pub acquisition_plane: Plane,
    pub date_time_started: Cell,
    pub irradiation_event_type: Cell,
    pub acquisition_protocol: Cell,
    /// not every export carries the event UID
    pub irradiation_event_uid: Option<Cell>,
    /// dose-area product [Gy.m²]
    pub dose_area_product_gym2: f64,
    /// reference point dose [Gy]
    pub dose_rp_gy: f64,
    pub positioner_primary_angle_deg: f64,
    pub positioner_secondary_angle_deg: f64,
    /// collimated field area [m²]
    pub collimated_field_area_m2: f64,
    pub xray_filter_type: PerFilter<String>,
    pub xray_filter_material: Cell,
    pub xray_filter_thickness_minimum_mm: PerFilter<f64>,
    pub xray_filter_thickness_maximum_mm: PerFilter<f64>,
    pub pulse_rate: f64,
    pub kvp_kv: f64,
    pub xray_tube_current_ma: f64,
    pub pulse_width_ms: f64,
    pub exposure_uas: f64,
    pub focal_spot_size_mm: Cell,
    pub distance_source_to_detector_mm: f64,
    pub distance_source_to_isocenter_mm: f64,
    pub table_longitudinal_position_mm: f64,
    pub table_lateral_position_mm: f64,
    pub table_height_position_mm: f64,
    pub target_region: Cell,
    pub manufacturer: String,
    pub manufacturer_model_name: String,
}
fn number(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}
fn thickness(value: &PerFilter<f64>) -> String {
    match value {
        PerFilter::Single(value) => number(*value),
        slots => slots.to_string(),
    }
}
impl CanonicalEvent {
    /// Returns the text of a canonical column, NaN is written blank
    pub fn value(&self, column: CanonicalColumn) -> String {
        use CanonicalColumn::*;
        match column {
            AcquisitionPlane => self.acquisition_plane.to_string(),
            DateTimeStarted => self.date_time_started.to_string(),
            IrradiationEventType => self.irradiation_event_type.to_string(),
            AcquisitionProtocol => self.acquisition_protocol.to_string(),
            IrradiationEventUid => self
                .irradiation_event_uid
                .as_ref()
                .map(|uid| uid.to_string())
                .unwrap_or_default(),
            DoseAreaProduct => number(self.dose_area_product_gym2),
            DoseRp => number(self.dose_rp_gy),
            PositionerPrimaryAngle => number(self.positioner_primary_angle_deg),
            PositionerSecondaryAngle => number(self.positioner_secondary_angle_deg),
            CollimatedFieldArea => number(self.collimated_field_area_m2),
            XRayFilterType => self.xray_filter_type.to_string(),
            XRayFilterMaterial => self.xray_filter_material.to_string(),
            XRayFilterThicknessMinimum => thickness(&self.xray_filter_thickness_minimum_mm),
            XRayFilterThicknessMaximum => thickness(&self.xray_filter_thickness_maximum_mm),
            PulseRate => number(self.pulse_rate),
            Kvp => number(self.kvp_kv),
            XRayTubeCurrent => number(self.xray_tube_current_ma),
            PulseWidth => number(self.pulse_width_ms),
            Exposure => number(self.exposure_uas),
            FocalSpotSize => self.focal_spot_size_mm.to_string(),
            DistanceSourceToDetector => number(self.distance_source_to_detector_mm),
            DistanceSourceToIsocenter => number(self.distance_source_to_isocenter_mm),
            TableLongitudinalPosition => number(self.table_longitudinal_position_mm),
            TableLateralPosition => number(self.table_lateral_position_mm),
            TableHeightPosition => number(self.table_height_position_mm),
            TargetRegion => self.target_region.to_string(),
            Manufacturer => self.manufacturer.clone(),
            ManufacturerModelName => self.manufacturer_model_name.clone(),
        }
    }
    /// Returns the event as a record in schema order
    pub fn record(&self) -> Vec<String> {
        CanonicalColumn::iter().map(|c| self.value(c)).collect()
    }
}

/// Canonical event table, one event per row of the vendor export
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalTable(Vec<CanonicalEvent>);
impl Deref for CanonicalTable {
    type Target = Vec<CanonicalEvent>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl From<Vec<CanonicalEvent>> for CanonicalTable {
    fn from(events: Vec<CanonicalEvent>) -> Self {
        Self(events)
    }
}
impl FromIterator<CanonicalEvent> for CanonicalTable {
    fn from_iter<T: IntoIterator<Item = CanonicalEvent>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
impl IntoIterator for CanonicalTable {
    type Item = CanonicalEvent;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
impl CanonicalTable {
    /// The canonical header
    pub fn columns() -> Vec<&'static str> {
        CanonicalColumn::iter().map(|c| c.name()).collect()
    }
    /// Events whose collimated field area is not a finite number
    pub fn non_finite_field_areas(&self) -> usize {
        self.iter()
            .filter(|e| !e.collimated_field_area_m2.is_finite())
            .count()
    }
    /// Writes the table as CSV
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(Self::columns())?;
        for event in self.iter() {
            wtr.write_record(event.record())?;
        }
        wtr.flush()?;
        Ok(())
    }
    /// Writes the table to a CSV file
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), csv::Error> {
        let file = std::fs::File::create(path)?;
        self.write_csv(file)
    }
    pub fn summary(&self) {
        let count_by = |values: Vec<String>| {
            values
                .into_iter()
                .counts()
                .into_iter()
                .sorted()
                .map(|(k, n)| format!("{k} ({n})"))
                .join(", ")
        };
        println!("SUMMARY:");
        println!(" - # of irradiation events: {}", self.len());
        if self.is_empty() {
            return;
        }
        println!(
            " - devices: {}",
            count_by(
                self.iter()
                    .map(|e| format!("{} {}", e.manufacturer, e.manufacturer_model_name))
                    .collect()
            )
        );
        println!(
            " - planes: {}",
            count_by(
                self.iter()
                    .map(|e| e.acquisition_plane.to_string())
                    .collect()
            )
        );
        let minmax = |x: Vec<f64>| {
            let (min, max) = x
                .into_iter()
                .filter(|x| x.is_finite())
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(a, b), x| {
                    (a.min(x), b.max(x))
                });
            format!("[{:10.3e}, {:10.3e}]", min, max)
        };
        println!(
            " - DAP [Gy.m^2]: {}",
            minmax(self.iter().map(|e| e.dose_area_product_gym2).collect())
        );
        println!(
            " - reference point dose [Gy]: {}",
            minmax(self.iter().map(|e| e.dose_rp_gy).collect())
        );
        println!(
            " - collimated field area [m^2]: {} ({} non-finite)",
            minmax(self.iter().map(|e| e.collimated_field_area_m2).collect()),
            self.non_finite_field_areas()
        );
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::error::Error;

    use super::*;

    pub(crate) fn event() -> CanonicalEvent {
        CanonicalEvent {
            acquisition_plane: Plane::Single,
            date_time_started: Cell::from("2023-03-01 10:12:00"),
            irradiation_event_type: Cell::from("Fluoroscopy"),
            acquisition_protocol: Cell::from("Abdomen"),
            irradiation_event_uid: None,
            dose_area_product_gym2: 1e-4,
            dose_rp_gy: 0.002,
            positioner_primary_angle_deg: 0.,
            positioner_secondary_angle_deg: -5.,
            collimated_field_area_m2: 0.05,
            xray_filter_type: PerFilter::Slots(vec!["Cu".into(), "Al".into()]),
            xray_filter_material: Cell::Empty,
            xray_filter_thickness_minimum_mm: PerFilter::Slots(vec![1., 0.1]),
            xray_filter_thickness_maximum_mm: PerFilter::Slots(vec![1., 0.1]),
            pulse_rate: 7.5,
            kvp_kv: 70.,
            xray_tube_current_ma: 12.,
            pulse_width_ms: 6.,
            exposure_uas: f64::NAN,
            focal_spot_size_mm: Cell::from(0.7),
            distance_source_to_detector_mm: 1100.,
            distance_source_to_isocenter_mm: 765.,
            table_longitudinal_position_mm: 10.,
            table_lateral_position_mm: -3.,
            table_height_position_mm: 190.,
            target_region: Cell::from("Abdomen"),
            manufacturer: "Philips".into(),
            manufacturer_model_name: "Allura Clarity".into(),
        }
    }

    #[test]
    fn header() {
        let columns = CanonicalTable::columns();
        assert_eq!(columns.len(), 28);
        assert_eq!(columns[0], "AcquisitionPlane");
        assert_eq!(columns[4], "IrradiationEventUID");
        assert_eq!(columns[14], "PulseRate_{pulse}/s");
        assert_eq!(CanonicalColumn::PulseRate.name(), "PulseRate_{pulse}/s");
        assert_eq!(columns[20], "DistanceSourcetoDetector_mm");
        assert_eq!(columns[27], "ManufacturerModelName");
        assert_eq!(
            "DoseRP_Gy".parse::<CanonicalColumn>().unwrap(),
            CanonicalColumn::DoseRp
        );
    }

    #[test]
    fn per_filter_thickness() {
        let single = PerFilter::Single(0.9);
        assert_eq!((single.aluminum(), single.copper()), (Some(0.), Some(0.9)));
        let slots = PerFilter::Slots(vec![2., 0.4]);
        assert_eq!((slots.aluminum(), slots.copper()), (Some(2.), Some(0.4)));
        let short = PerFilter::Slots(vec![2.]);
        assert_eq!(short.copper(), None);
        assert_eq!(slots.to_string(), "2;0.4");
    }

    #[test]
    fn csv() -> Result<(), Box<dyn Error>> {
        let table = CanonicalTable::from(vec![event(), event()]);
        let mut buf = vec![];
        table.write_csv(&mut buf)?;
        let mut rdr = csv::Reader::from_reader(buf.as_slice());
        assert_eq!(
            rdr.headers()?.iter().collect::<Vec<_>>(),
            CanonicalTable::columns()
        );
        let records = rdr.records().collect::<Result<Vec<_>, _>>()?;
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][0], "Single Plane");
        assert_eq!(&records[0][4], "");
        assert_eq!(&records[0][10], "Cu;Al");
        assert_eq!(&records[0][12], "1;0.1");
        assert_eq!(&records[0][18], "");
        Ok(())
    }
}
