//! Export source dispatcher
//!
//! An export holds the events of a single device. The identifier read on its
//! first row selects the vendor parser: DoseTrack exports are looked up by
//! equipment model, Radimetrics exports carry the manufacturer directly.

use strum_macros::{Display, EnumIter, EnumString};

use crate::{
    canonical::CanonicalTable,
    table::{RawTable, TableError},
    vendor::{dosetrack, radimetrics, Console, Manufacturer, Source, VendorError},
};

/// Equipment model to manufacturer lookup
pub const MODEL_MANUFACTURER: [(&str, Manufacturer); 3] = [
    ("Azurion", Manufacturer::Philips),
    ("AXIOM-Artis", Manufacturer::Siemens),
    ("Allura Clarity", Manufacturer::Philips),
];

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("unrecognized device {0:?}")]
    UnrecognizedDevice(String),
    #[error("the export has no irradiation event")]
    EmptyExport,
    #[error("failed to read the device identifier")]
    Table(#[from] TableError),
    #[error("failed to parse the export")]
    Vendor(#[from] VendorError),
}
type Result<T> = std::result::Result<T, DispatchError>;

/// Vendor export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum ExportFormat {
    #[strum(serialize = "dosetrack")]
    DoseTrack,
    #[strum(serialize = "radimetrics")]
    Radimetrics,
}
impl ExportFormat {
    /// The column holding the device identifier
    pub fn identifier_column(&self) -> &'static str {
        match self {
            ExportFormat::DoseTrack => dosetrack::EQUIPMENT_COLUMN,
            ExportFormat::Radimetrics => radimetrics::MANUFACTURER_COLUMN,
        }
    }
}

/// Looks up the manufacturer of an equipment model
pub fn lookup_manufacturer(model: &str) -> Option<Manufacturer> {
    let model = model.trim();
    MODEL_MANUFACTURER
        .iter()
        .find(|(name, _)| *name == model)
        .map(|(_, manufacturer)| *manufacturer)
}

/// Resolves the source of an export from its first row
///
/// A Radimetrics manufacturer name that does not start with a known
/// manufacturer falls back to the lookup of the `Device` model.
pub fn resolve(format: ExportFormat, raw: &RawTable) -> Result<Source> {
    let identifier = raw
        .column(format.identifier_column())?
        .first()
        .ok_or(DispatchError::EmptyExport)?
        .to_string();
    let source = match format {
        ExportFormat::DoseTrack => lookup_manufacturer(&identifier)
            .map(|manufacturer| Source::DoseTrack(Console::of(manufacturer))),
        ExportFormat::Radimetrics => Manufacturer::from_name(&identifier)
            .or_else(|| {
                raw.column(radimetrics::DEVICE_COLUMN)
                    .ok()
                    .and_then(|devices| devices.first())
                    .and_then(|device| lookup_manufacturer(&device.to_string()))
            })
            .map(Source::Radimetrics),
    }
    .ok_or(DispatchError::UnrecognizedDevice(identifier))?;
    log::info!("{} export of {}: {:?}", format, source.manufacturer(), source);
    Ok(source)
}

/// Parses an export with the parser of its device
pub fn parse(format: ExportFormat, raw: &RawTable) -> Result<CanonicalTable> {
    let source = resolve(format, raw)?;
    Ok(source.parse(raw)?)
}
