//! Vendor export loader
//!
//! Reads an export file into a [RawTable]: delimited text, optionally gzip or
//! bzip2 compressed, or one sheet of a spreadsheet workbook.

use std::{
    convert::Infallible,
    fmt,
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
    str::FromStr,
    time::Instant,
};

use calamine::{open_workbook_auto, Data, DataType, Reader};
use flate2::read::GzDecoder;

use crate::table::{Cell, RawTable};

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("failed to open {1:?}")]
    Io(#[source] std::io::Error, PathBuf),
    #[error("failed to read the delimited export")]
    Csv(#[from] csv::Error),
    #[error("failed to read the spreadsheet export")]
    Spreadsheet(#[from] calamine::Error),
    #[error("sheet {0} not found in the workbook")]
    MissingSheet(Sheet),
    #[error("{0:?} is not a supported export file")]
    Unsupported(PathBuf),
}
type Result<T> = std::result::Result<T, LoaderError>;

/// Spreadsheet sheet selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sheet {
    Index(usize),
    Name(String),
}
impl Default for Sheet {
    fn default() -> Self {
        Sheet::Index(0)
    }
}
impl fmt::Display for Sheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sheet::Index(index) => write!(f, "#{}", index),
            Sheet::Name(name) => write!(f, "{:?}", name),
        }
    }
}
impl FromStr for Sheet {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(s.parse::<usize>()
            .map(Sheet::Index)
            .unwrap_or_else(|_| Sheet::Name(s.to_string())))
    }
}

/// Export file kinds, from the file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExportFile {
    Csv,
    CsvGz,
    CsvBz2,
    Spreadsheet,
}
impl ExportFile {
    fn of(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_lowercase();
        let kind = match name.rsplit('.').next()? {
            "csv" | "txt" => ExportFile::Csv,
            "gz" => ExportFile::CsvGz,
            "bz2" => ExportFile::CsvBz2,
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => ExportFile::Spreadsheet,
            _ => return None,
        };
        Some(kind)
    }
}

/// Export loader
///
/// The sheet is only used for spreadsheet exports.
#[derive(Debug, Clone)]
pub struct ExportLoader {
    path: PathBuf,
    sheet: Sheet,
}
impl Default for ExportLoader {
    fn default() -> Self {
        Self {
            path: PathBuf::from("export.csv"),
            sheet: Sheet::default(),
        }
    }
}
impl ExportLoader {
    pub fn data_path<P: AsRef<Path>>(self, data_path: P) -> Self {
        Self {
            path: data_path.as_ref().to_path_buf(),
            ..self
        }
    }
    pub fn sheet(self, sheet: Sheet) -> Self {
        Self { sheet, ..self }
    }
    fn open(&self) -> Result<File> {
        File::open(&self.path).map_err(|e| LoaderError::Io(e, self.path.clone()))
    }
    #[cfg(feature = "bzip2")]
    fn decompress_bz2(&self) -> Result<RawTable> {
        let buf = BufReader::new(self.open()?);
        read_csv(bzip2::bufread::BzDecoder::new(buf))
    }
    #[cfg(not(feature = "bzip2"))]
    fn decompress_bz2(&self) -> Result<RawTable> {
        Err(LoaderError::Unsupported(self.path.clone()))
    }
    fn read_sheet(&self) -> Result<RawTable> {
        let mut workbook = open_workbook_auto(&self.path)?;
        let range = match &self.sheet {
            Sheet::Index(index) => workbook
                .worksheet_range_at(*index)
                .ok_or_else(|| LoaderError::MissingSheet(self.sheet.clone()))??,
            Sheet::Name(name) => {
                if !workbook.sheet_names().contains(name) {
                    return Err(LoaderError::MissingSheet(self.sheet.clone()));
                }
                workbook.worksheet_range(name)?
            }
        };
        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .map(|header| header.iter().map(|data| data.to_string()).collect())
            .unwrap_or_default();
        Ok(RawTable::from_rows(
            headers,
            rows.map(|row| row.iter().map(spreadsheet_cell).collect()),
        ))
    }
    pub fn load(self) -> Result<RawTable> {
        log::info!("Loading {:?}...", self.path);
        let now = Instant::now();
        let table = match ExportFile::of(&self.path) {
            Some(ExportFile::Csv) => read_csv(BufReader::new(self.open()?)),
            Some(ExportFile::CsvGz) => read_csv(GzDecoder::new(self.open()?)),
            Some(ExportFile::CsvBz2) => self.decompress_bz2(),
            Some(ExportFile::Spreadsheet) => self.read_sheet(),
            None => Err(LoaderError::Unsupported(self.path.clone())),
        }?;
        log::info!(
            "... loaded {} rows x {} columns in {:}ms",
            table.n_rows(),
            table.n_columns(),
            now.elapsed().as_millis()
        );
        Ok(table)
    }
}

/// Reads a delimited text field: blank fields are empty, numbers are inferred
pub fn text_cell(field: &str) -> Cell {
    match field.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Cell::Number(value),
        _ => Cell::from(field),
    }
}

fn spreadsheet_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::Int(value) => Cell::Number(*value as f64),
        Data::Float(value) => Cell::Number(*value),
        Data::String(value) => Cell::from(value.as_str()),
        Data::Bool(value) => Cell::Text(value.to_string()),
        Data::DateTime(value) => Cell::Text(
            data.as_datetime()
                .map(|datetime| datetime.to_string())
                .unwrap_or_else(|| value.to_string()),
        ),
        Data::DateTimeIso(value) | Data::DurationIso(value) => Cell::from(value.as_str()),
    }
}

/// Reads a delimited text export, the first record is the header
pub fn read_csv<R: Read>(reader: R) -> Result<RawTable> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let rows = rdr
        .records()
        .map(|record| record.map(|record| record.iter().map(text_cell).collect::<Vec<Cell>>()))
        .collect::<std::result::Result<Vec<_>, csv::Error>>()?;
    Ok(RawTable::from_rows(headers, rows))
}

/// File name without the export extensions
pub fn export_stem<P: AsRef<Path>>(path: P) -> String {
    let name = path
        .as_ref()
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    name.split('.').next().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use std::{error::Error, io::Write};

    use flate2::{write::GzEncoder, Compression};

    use super::*;

    const EXPORT: &str = "\
Plane Code,Study Date,DAP (Gy*cm2), Filter Thickness
1,2023-03-01,12.5,1.0;0.1
,,7,
2,,NaN,0.3
";

    #[test]
    fn csv_cells() -> std::result::Result<(), Box<dyn Error>> {
        let table = read_csv(EXPORT.as_bytes())?;
        assert_eq!(table.n_rows(), 3);
        assert_eq!(
            table.names().collect::<Vec<_>>(),
            vec!["Plane Code", "Study Date", "DAP (Gy*cm2)", "Filter Thickness"]
        );
        assert_eq!(
            table.column("Plane Code")?,
            &[Cell::Number(1.), Cell::Empty, Cell::Number(2.)]
        );
        assert_eq!(table.column("Study Date")?[0], Cell::from("2023-03-01"));
        assert_eq!(table.column("DAP (Gy*cm2)")?[2], Cell::from("NaN"));
        assert_eq!(table.column("Filter Thickness")?[0], Cell::from("1.0;0.1"));
        assert_eq!(table.column("Filter Thickness")?[2], Cell::Number(0.3));
        Ok(())
    }

    #[test]
    fn gzip_export() -> std::result::Result<(), Box<dyn Error>> {
        let mut gz = GzEncoder::new(vec![], Compression::default());
        gz.write_all(EXPORT.as_bytes())?;
        let table = read_csv(GzDecoder::new(gz.finish()?.as_slice()))?;
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.n_columns(), 4);
        Ok(())
    }

    #[test]
    fn sheet_selector() {
        assert_eq!("2".parse::<Sheet>(), Ok(Sheet::Index(2)));
        assert_eq!(
            "Dose Events".parse::<Sheet>(),
            Ok(Sheet::Name("Dose Events".to_string()))
        );
        assert_eq!(Sheet::default(), Sheet::Index(0));
    }

    #[test]
    fn file_kinds() {
        assert_eq!(ExportFile::of(Path::new("a/b.csv")), Some(ExportFile::Csv));
        assert_eq!(ExportFile::of(Path::new("b.CSV.gz")), Some(ExportFile::CsvGz));
        assert_eq!(ExportFile::of(Path::new("b.xlsx")), Some(ExportFile::Spreadsheet));
        assert_eq!(ExportFile::of(Path::new("b.pdf")), None);
        assert_eq!(export_stem("data/DoseTrack_2023.csv.gz"), "DoseTrack_2023");
    }

    #[test]
    fn missing_file() {
        let loader = ExportLoader::default().data_path("no/such/export.csv");
        assert!(matches!(loader.load(), Err(LoaderError::Io(..))));
        let loader = ExportLoader::default().data_path("export.pdf");
        assert!(matches!(loader.load(), Err(LoaderError::Unsupported(_))));
    }
}
