//! Analysis settings
//!
//! Settings are opaque JSON documents forwarded to the schema normalizer and
//! the analysis. Only the `normalization_settings` entry is ever touched, when
//! it is overridden from its own file.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use serde_json::Value;

/// Settings entry replaced by a normalization settings file
pub const NORMALIZATION_SETTINGS: &str = "normalization_settings";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to open {1:?}")]
    Io(#[source] std::io::Error, PathBuf),
    #[error("failed to parse the settings")]
    Json(#[from] serde_json::Error),
}
type Result<T> = std::result::Result<T, SettingsError>;

/// Opaque analysis settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings(Value);
impl Settings {
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }
    /// Reads the settings from a JSON file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self(read_json(path.as_ref())?))
    }
    /// Replaces the normalization settings by the content of a JSON file
    pub fn with_normalization_settings_from<P: AsRef<Path>>(self, path: P) -> Result<Self> {
        let normalization = read_json(path.as_ref())?;
        log::info!("normalization settings overridden from {:?}", path.as_ref());
        Ok(self.with_normalization_settings(normalization))
    }
    pub fn with_normalization_settings(self, normalization: Value) -> Self {
        let mut value = match self.0 {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        value.insert(NORMALIZATION_SETTINGS.to_string(), normalization);
        Self(Value::Object(value))
    }
    pub fn normalization_settings(&self) -> Option<&Value> {
        self.0.get(NORMALIZATION_SETTINGS)
    }
    pub fn value(&self) -> &Value {
        &self.0
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let file = File::open(path).map_err(|e| SettingsError::Io(e, path.to_path_buf()))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Settings given either as a file or already parsed
#[derive(Debug, Clone)]
pub enum SettingsSource {
    Path(PathBuf),
    Parsed(Settings),
}
impl From<PathBuf> for SettingsSource {
    fn from(path: PathBuf) -> Self {
        SettingsSource::Path(path)
    }
}
impl From<&Path> for SettingsSource {
    fn from(path: &Path) -> Self {
        SettingsSource::Path(path.to_path_buf())
    }
}
impl From<Settings> for SettingsSource {
    fn from(settings: Settings) -> Self {
        SettingsSource::Parsed(settings)
    }
}
impl SettingsSource {
    pub fn resolve(self) -> Result<Settings> {
        match self {
            SettingsSource::Path(path) => Settings::from_path(path),
            SettingsSource::Parsed(settings) => Ok(settings),
        }
    }
}
