//! Vendor dose report ingestion
//!
//! Parses the irradiation event exports of fluoroscopy dose tracking systems
//! into a single canonical event table:
//!  - DoseTrack exports of Siemens AXIOM-Artis and Philips Allura Clarity/Azurion consoles,
//!  - Radimetrics dose management exports.
//!
//! ```no_run
//! use psd_ingest::{parse_export, ExportFormat, Sheet};
//!
//! let table = parse_export("DoseTrack.xlsx", ExportFormat::DoseTrack, Sheet::default())?;
//! table.summary();
//! table.to_csv("DoseTrack_psd.csv")?;
//! # Ok::<(), psd_ingest::Error>(())
//! ```

use std::path::Path;

pub mod canonical;
pub mod dispatch;
pub mod error;
pub mod geometry;
pub mod loader;
pub mod pipeline;
pub mod plane;
pub mod settings;
pub mod table;
pub mod units;
pub mod vendor;

pub use canonical::{CanonicalColumn, CanonicalEvent, CanonicalTable, PerFilter};
pub use dispatch::ExportFormat;
pub use error::{Error, Result};
pub use loader::{ExportLoader, Sheet};
pub use pipeline::{Analysis, NormalizedData, Pipeline, SchemaNormalizer};
pub use plane::Plane;
pub use settings::{Settings, SettingsSource};
pub use table::{Cell, RawTable};
pub use vendor::{Console, Manufacturer, Source};

/// Loads an export file and parses it into the canonical event table
pub fn parse_export<P: AsRef<Path>>(
    path: P,
    format: ExportFormat,
    sheet: Sheet,
) -> Result<CanonicalTable> {
    let raw = ExportLoader::default().data_path(path).sheet(sheet).load()?;
    Ok(dispatch::parse(format, &raw)?)
}
