use std::{cmp::Ordering, fmt};

use crate::units::Conversion;

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("column {column:?} is missing from the export")]
    MissingColumn { column: String },
    #[error("column {column:?}, row {row}: {value:?} is not a number")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },
    #[error("column {column:?} has {found} rows, expected {expected}")]
    Length {
        column: String,
        found: usize,
        expected: usize,
    },
}
type Result<T> = std::result::Result<T, TableError>;

/// A single cell of a vendor export
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}
impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
    /// Returns the cell as a number
    ///
    /// Blank cells are read as NaN, text is parsed after trimming.
    /// The column name and row index are only used to report a failure.
    pub fn number(&self, column: &str, row: usize) -> Result<f64> {
        match self {
            Cell::Empty => Ok(f64::NAN),
            Cell::Number(value) => Ok(*value),
            Cell::Text(text) if text.trim().is_empty() => Ok(f64::NAN),
            Cell::Text(text) => text.trim().parse().map_err(|_| TableError::NonNumeric {
                column: column.to_string(),
                row,
                value: text.clone(),
            }),
        }
    }
    /// Total order used to rank plane codes: numbers, then text, then blanks
    pub fn code_cmp(&self, other: &Cell) -> Ordering {
        use Cell::*;
        match (self, other) {
            (Empty, Empty) => Ordering::Equal,
            (Empty, _) => Ordering::Greater,
            (_, Empty) => Ordering::Less,
            (Number(a), Number(b)) => a.total_cmp(b),
            (Number(_), Text(_)) => Ordering::Less,
            (Text(_), Number(_)) => Ordering::Greater,
            (Text(a), Text(b)) => a.cmp(b),
        }
    }
}
impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}
impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}
impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }
}
impl From<String> for Cell {
    fn from(value: String) -> Self {
        if value.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }
}
impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(value) => write!(f, "{}", value),
            Cell::Text(text) => write!(f, "{}", text),
        }
    }
}

/// Column-oriented table of an irradiation event export
///
/// One row per irradiation event, columns named after the vendor headers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    names: Vec<String>,
    columns: Vec<Vec<Cell>>,
    n_rows: usize,
}
impl RawTable {
    /// Builds a table from named columns that must all have the same length
    pub fn from_columns<S, I>(columns: I) -> Result<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, Vec<Cell>)>,
    {
        let mut this = Self::default();
        for (k, (name, column)) in columns.into_iter().enumerate() {
            let name: String = name.into();
            if k == 0 {
                this.n_rows = column.len();
            } else if column.len() != this.n_rows {
                return Err(TableError::Length {
                    column: name,
                    found: column.len(),
                    expected: this.n_rows,
                });
            }
            this.names.push(name);
            this.columns.push(column);
        }
        Ok(this)
    }
    /// Builds a table from a header and rows, short rows are padded with blanks
    pub fn from_rows<I>(headers: Vec<String>, rows: I) -> Self
    where
        I: IntoIterator<Item = Vec<Cell>>,
    {
        let mut columns: Vec<Vec<Cell>> = vec![vec![]; headers.len()];
        let mut n_rows = 0;
        for row in rows {
            let mut row = row.into_iter();
            for column in columns.iter_mut() {
                column.push(row.next().unwrap_or_default());
            }
            n_rows += 1;
        }
        Self {
            names: headers,
            columns,
            n_rows,
        }
    }
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }
    pub fn n_columns(&self) -> usize {
        self.names.len()
    }
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(|name| name.as_str())
    }
    fn position(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| TableError::MissingColumn {
                column: name.to_string(),
            })
    }
    pub fn column(&self, name: &str) -> Result<&[Cell]> {
        let k = self.position(name)?;
        Ok(&self.columns[k])
    }
    fn column_mut(&mut self, name: &str) -> Result<&mut Vec<Cell>> {
        let k = self.position(name)?;
        Ok(&mut self.columns[k])
    }
    /// Returns a new table with only the given columns, in the given order
    pub fn project<'a, I>(&self, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut this = Self {
            n_rows: self.n_rows,
            ..Default::default()
        };
        for name in names {
            let column = self.column(name)?.to_vec();
            this.names.push(name.to_string());
            this.columns.push(column);
        }
        Ok(this)
    }
    /// Replaces every blank cell with the last non-blank cell above it
    ///
    /// Leading blanks stay blank.
    pub fn forward_fill(&mut self) {
        for column in self.columns.iter_mut() {
            let mut last: Option<Cell> = None;
            for cell in column.iter_mut() {
                if cell.is_empty() {
                    if let Some(value) = &last {
                        *cell = value.clone();
                    }
                } else {
                    last = Some(cell.clone());
                }
            }
        }
    }
    /// Applies a unit conversion to every non-blank cell of a column
    pub fn convert(&mut self, name: &str, conversion: Conversion) -> Result<()> {
        let column = self.column_mut(name)?;
        for (row, cell) in column.iter_mut().enumerate() {
            if cell.is_empty() {
                continue;
            }
            let value = cell.number(name, row)?;
            *cell = Cell::Number(conversion.apply(value));
        }
        Ok(())
    }
    /// Consumes the table into its `(name, column)` pairs
    pub fn into_columns(self) -> impl Iterator<Item = (String, Vec<Cell>)> {
        self.names.into_iter().zip(self.columns)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    fn table() -> RawTable {
        RawTable::from_columns([
            (
                "a",
                vec![Cell::from(5i64), Cell::Empty, Cell::Empty, Cell::from(7i64)],
            ),
            (
                "b",
                vec![Cell::Empty, Cell::from("x"), Cell::Empty, Cell::from("y")],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn forward_fill() -> std::result::Result<(), Box<dyn Error>> {
        let mut table = table();
        table.forward_fill();
        assert_eq!(
            table.column("a")?,
            &[
                Cell::Number(5.),
                Cell::Number(5.),
                Cell::Number(5.),
                Cell::Number(7.)
            ]
        );
        assert_eq!(
            table.column("b")?,
            &[
                Cell::Empty,
                Cell::from("x"),
                Cell::from("x"),
                Cell::from("y")
            ]
        );
        Ok(())
    }

    #[test]
    fn project_missing_column() {
        let table = table();
        match table.project(["a", "c"]) {
            Err(TableError::MissingColumn { column }) => assert_eq!(column, "c"),
            other => panic!("expected a missing column error, got {other:?}"),
        }
    }

    #[test]
    fn project_keeps_requested_order() -> std::result::Result<(), Box<dyn Error>> {
        let table = table().project(["b", "a"])?;
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(table.n_rows(), 4);
        Ok(())
    }

    #[test]
    fn convert_parses_text_and_keeps_blanks() -> std::result::Result<(), Box<dyn Error>> {
        let mut table = RawTable::from_columns([(
            "Air Kerma (mGy)",
            vec![Cell::from(" 2500 "), Cell::Empty, Cell::from(40f64)],
        )])?;
        table.convert("Air Kerma (mGy)", Conversion::MilligrayToGray)?;
        assert_eq!(
            table.column("Air Kerma (mGy)")?,
            &[Cell::Number(2.5), Cell::Empty, Cell::Number(0.04)]
        );
        Ok(())
    }

    #[test]
    fn convert_rejects_text() {
        let mut table =
            RawTable::from_columns([("kVp", vec![Cell::from(70f64), Cell::from("n/a")])]).unwrap();
        match table.convert("kVp", Conversion::MilligrayToGray) {
            Err(TableError::NonNumeric { row, value, .. }) => {
                assert_eq!(row, 1);
                assert_eq!(value, "n/a");
            }
            other => panic!("expected a non-numeric error, got {other:?}"),
        }
    }

    #[test]
    fn uneven_columns() {
        let table = RawTable::from_columns([
            ("a", vec![Cell::Empty]),
            ("b", vec![Cell::Empty, Cell::Empty]),
        ]);
        assert!(matches!(table, Err(TableError::Length { found: 2, .. })));
    }

    #[test]
    fn rows_are_padded() {
        let table = RawTable::from_rows(
            vec!["a".into(), "b".into()],
            vec![vec![Cell::from(1f64)], vec![Cell::from(2f64), Cell::from("z")]],
        );
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.column("b").unwrap(), &[Cell::Empty, Cell::from("z")]);
    }
}
