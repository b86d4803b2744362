//! Normalization pipeline
//!
//! Loads an export, parses it into the canonical table, hands the table to the
//! schema normalizer, attaches the filter thicknesses by material and passes
//! the result to the analysis. The normalizer and the analysis are provided
//! by the caller.

use std::{error::Error, path::Path};

use crate::{
    canonical::CanonicalTable,
    dispatch::{self, DispatchError, ExportFormat},
    loader::{ExportLoader, LoaderError, Sheet},
    settings::{Settings, SettingsError, SettingsSource},
    units::{ALUMINUM_SLOT, COPPER_SLOT},
};

type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to load the export")]
    Loader(#[from] LoaderError),
    #[error("failed to parse the export")]
    Dispatch(#[from] DispatchError),
    #[error("failed to resolve the settings")]
    Settings(#[from] SettingsError),
    #[error("event #{row}: no filter thickness in slot {slot}")]
    FilterSlot { row: usize, slot: usize },
    #[error("schema normalization failed")]
    Normalizer(#[source] BoxError),
    #[error("analysis failed")]
    Analysis(#[source] BoxError),
}
type Result<T> = std::result::Result<T, PipelineError>;

/// Canonical table to internal records
pub trait SchemaNormalizer {
    type Records;
    type Error: Into<BoxError>;
    fn normalize(
        &self,
        table: &CanonicalTable,
        settings: &Settings,
    ) -> std::result::Result<Self::Records, Self::Error>;
}

/// Consumer of the normalized records
pub trait Analysis<R> {
    type Output;
    type Error: Into<BoxError>;
    fn analyze(
        &self,
        data: NormalizedData<R>,
        settings: &Settings,
    ) -> std::result::Result<Self::Output, Self::Error>;
}

/// Normalized records with the filter thicknesses of every event [mm]
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedData<R> {
    pub records: R,
    pub filter_thickness_al: Vec<f64>,
    pub filter_thickness_cu: Vec<f64>,
}

/// Aluminum and copper filter thicknesses [mm] read from the maximum filter thickness
///
/// A scalar thickness is a copper filter, the aluminum thickness is then 0.
pub fn filter_thickness_by_material(table: &CanonicalTable) -> Result<(Vec<f64>, Vec<f64>)> {
    let mut al = Vec::with_capacity(table.len());
    let mut cu = Vec::with_capacity(table.len());
    for (row, event) in table.iter().enumerate() {
        let thickness = &event.xray_filter_thickness_maximum_mm;
        al.push(
            thickness
                .aluminum()
                .ok_or(PipelineError::FilterSlot { row, slot: ALUMINUM_SLOT })?,
        );
        cu.push(
            thickness
                .copper()
                .ok_or(PipelineError::FilterSlot { row, slot: COPPER_SLOT })?,
        );
    }
    Ok((al, cu))
}

/// Export to analysis pipeline
pub struct Pipeline<N, A> {
    format: ExportFormat,
    normalizer: N,
    analysis: A,
}
impl<N, A> Pipeline<N, A>
where
    N: SchemaNormalizer,
    A: Analysis<N::Records>,
{
    pub fn new(format: ExportFormat, normalizer: N, analysis: A) -> Self {
        Self {
            format,
            normalizer,
            analysis,
        }
    }
    /// Normalizes a canonical table and attaches the filter thicknesses
    pub fn normalize(
        &self,
        table: &CanonicalTable,
        settings: &Settings,
    ) -> Result<NormalizedData<N::Records>> {
        let records = self
            .normalizer
            .normalize(table, settings)
            .map_err(|e| PipelineError::Normalizer(e.into()))?;
        let (filter_thickness_al, filter_thickness_cu) = filter_thickness_by_material(table)?;
        Ok(NormalizedData {
            records,
            filter_thickness_al,
            filter_thickness_cu,
        })
    }
    /// Runs the pipeline on an export file
    ///
    /// The normalization settings file, if any, replaces the normalization settings.
    /// The sheet is only used for spreadsheet exports.
    pub fn process<P, S>(
        &self,
        path: P,
        settings: S,
        normalization_settings: Option<&Path>,
        sheet: Sheet,
    ) -> Result<A::Output>
    where
        P: AsRef<Path>,
        S: Into<SettingsSource>,
    {
        let mut settings = settings.into().resolve()?;
        if let Some(path) = normalization_settings {
            settings = settings.with_normalization_settings_from(path)?;
        }
        let raw = ExportLoader::default()
            .data_path(path)
            .sheet(sheet)
            .load()?;
        let table = dispatch::parse(self.format, &raw)?;
        let data = self.normalize(&table, &settings)?;
        self.analysis
            .analyze(data, &settings)
            .map_err(|e| PipelineError::Analysis(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, io, path::PathBuf};

    use serde_json::json;

    use super::*;
    use crate::{
        canonical::{tests::event, PerFilter},
        vendor::radimetrics::tests::EXPORT,
    };

    struct Planes;
    impl SchemaNormalizer for Planes {
        type Records = Vec<String>;
        type Error = io::Error;
        fn normalize(
            &self,
            table: &CanonicalTable,
            _settings: &Settings,
        ) -> std::result::Result<Self::Records, Self::Error> {
            Ok(table
                .iter()
                .map(|e| e.acquisition_plane.to_string())
                .collect())
        }
    }

    struct Failing;
    impl SchemaNormalizer for Failing {
        type Records = ();
        type Error = io::Error;
        fn normalize(
            &self,
            _table: &CanonicalTable,
            _settings: &Settings,
        ) -> std::result::Result<Self::Records, Self::Error> {
            Err(io::Error::new(io::ErrorKind::InvalidData, "no model"))
        }
    }

    struct Passthrough;
    impl<R> Analysis<R> for Passthrough {
        type Output = (NormalizedData<R>, Settings);
        type Error = io::Error;
        fn analyze(
            &self,
            data: NormalizedData<R>,
            settings: &Settings,
        ) -> std::result::Result<Self::Output, Self::Error> {
            Ok((data, settings.clone()))
        }
    }

    fn write_fixture(name: &str, contents: &str) -> io::Result<PathBuf> {
        let path = std::env::temp_dir().join(format!("{}-{}", std::process::id(), name));
        fs::write(&path, contents)?;
        Ok(path)
    }

    #[test]
    fn thickness_by_material() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut single = event();
        single.xray_filter_thickness_maximum_mm = PerFilter::Single(0.3);
        let table = CanonicalTable::from(vec![event(), single]);
        let (al, cu) = filter_thickness_by_material(&table)?;
        assert_eq!(al, vec![1., 0.]);
        assert_eq!(cu, vec![0.1, 0.3]);
        Ok(())
    }

    #[test]
    fn missing_copper_slot() {
        let mut short = event();
        short.xray_filter_thickness_maximum_mm = PerFilter::Slots(vec![2.]);
        assert_eq!(short.xray_filter_thickness_maximum_mm.n_slots(), 1);
        let table = CanonicalTable::from(vec![event(), short]);
        assert!(matches!(
            filter_thickness_by_material(&table),
            Err(PipelineError::FilterSlot { row: 1, slot: COPPER_SLOT })
        ));
    }

    #[test]
    fn normalizer_error() {
        let pipeline = Pipeline::new(ExportFormat::Radimetrics, Failing, Passthrough);
        let table = CanonicalTable::from(vec![event()]);
        assert!(matches!(
            pipeline.normalize(&table, &Settings::default()),
            Err(PipelineError::Normalizer(_))
        ));
    }

    #[test]
    fn process() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let export = write_fixture("radimetrics.csv", EXPORT)?;
        let normalization = write_fixture("normalization.json", r#"{"kV": "KVP_kV"}"#)?;
        let pipeline = Pipeline::new(ExportFormat::Radimetrics, Planes, Passthrough);
        let settings = Settings::from_value(json!({"mode": "calculate_dose"}));
        let (data, settings) = pipeline.process(
            &export,
            settings,
            Some(normalization.as_path()),
            Sheet::default(),
        )?;
        fs::remove_file(export)?;
        fs::remove_file(normalization)?;
        assert_eq!(data.records, vec!["Single Plane", "Single Plane"]);
        assert_eq!(data.filter_thickness_al, vec![0., 0.]);
        assert_eq!(data.filter_thickness_cu, vec![0.3, 0.3]);
        assert_eq!(settings.value()["mode"], json!("calculate_dose"));
        assert_eq!(
            settings.normalization_settings(),
            Some(&json!({"kV": "KVP_kV"}))
        );
        Ok(())
    }
}
