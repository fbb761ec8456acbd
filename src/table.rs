use failure::{Error, Fail};
use itertools::Itertools;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Cells read as missing values, in addition to the empty cell.
static NA_TOKENS: &[&str] = &[
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "#N/A", "<NA>",
];

#[derive(Debug, Fail)]
pub enum TableError {
    #[fail(display = "CSV file {} has no header", _0)]
    EmptyFile(String),
    #[fail(
        display = "inconsistent record length: row {} has {} fields, expected {}",
        row, actual, expected
    )]
    InconsistentRecord {
        row: usize,
        actual: usize,
        expected: usize,
    },
    #[fail(display = "column {} has {} rows, expected {}", name, actual, expected)]
    InconsistentColumn {
        name: String,
        actual: usize,
        expected: usize,
    },
    #[fail(display = "column not found: {}", _0)]
    MissingColumn(String),
    #[fail(display = "column {} is not numeric", _0)]
    NotNumeric(String),
}

/// Storage of a column. Missing values are NaN for numeric columns and None for text columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<f64>),
    Text(Vec<Option<String>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(values) => values.len(),
            Column::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        match self {
            Column::Numeric(_) => true,
            Column::Text(_) => false,
        }
    }

    pub fn n_missing(&self) -> usize {
        match self {
            Column::Numeric(values) => values.iter().filter(|x| x.is_nan()).count(),
            Column::Text(values) => values.iter().filter(|x| x.is_none()).count(),
        }
    }

    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            Column::Numeric(values) => Some(values),
            Column::Text(_) => None,
        }
    }

    /// Build a column from raw CSV cells: numeric if every present cell is a float.
    /// A column without any present cell stays a text column.
    fn infer(cells: Vec<Option<String>>) -> Column {
        let values: Option<Vec<f64>> = cells
            .iter()
            .map(|cell| match cell {
                None => Some(std::f64::NAN),
                Some(cell) => cell.parse::<f64>().ok(),
            })
            .collect();
        match values {
            Some(values) if values.iter().any(|x| !x.is_nan()) => Column::Numeric(values),
            _ => Column::Text(cells),
        }
    }
}

fn parse_cell(cell: &str) -> Option<String> {
    if cell.is_empty() || NA_TOKENS.contains(&cell) {
        None
    } else {
        Some(cell.to_string())
    }
}

/// Table of named columns with the same number of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
    n_rows: usize,
}

impl Table {
    pub fn new(names: Vec<String>, columns: Vec<Column>) -> Result<Table, TableError> {
        assert_eq!(names.len(), columns.len());
        let n_rows = columns.first().map(|c| c.len()).unwrap_or(0);
        for (name, column) in names.iter().zip(&columns) {
            if column.len() != n_rows {
                return Err(TableError::InconsistentColumn {
                    name: name.clone(),
                    actual: column.len(),
                    expected: n_rows,
                });
            }
        }
        Ok(Table {
            names,
            columns,
            n_rows,
        })
    }

    /// Load a CSV with a header line.
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Table, Error> {
        let path = path.as_ref();
        let table = Table::from_reader(File::open(path)?, &path.display().to_string())?;
        info!(
            "Loaded {}: {} rows, {} columns",
            path.display(),
            table.n_rows(),
            table.n_cols()
        );
        Ok(table)
    }

    /// Parse a CSV with a header line. `source` is only used in error messages.
    pub fn from_reader(reader: impl Read, source: &str) -> Result<Table, Error> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let names: Vec<String> = rdr.headers()?.iter().map(|e| e.to_string()).collect();
        if names.is_empty() || (names.len() == 1 && names[0].is_empty()) {
            return Err(TableError::EmptyFile(source.to_string()).into());
        }

        let mut cells: Vec<Vec<Option<String>>> = names.iter().map(|_| Vec::new()).collect();
        for (n_row, record) in rdr.records().enumerate() {
            let record = record?;
            if record.len() != names.len() {
                return Err(TableError::InconsistentRecord {
                    // +1 for the header, +1 because rows start at 1 in text editors
                    row: n_row + 2,
                    actual: record.len(),
                    expected: names.len(),
                }
                .into());
            }
            for (column, cell) in cells.iter_mut().zip(record.iter()) {
                column.push(parse_cell(cell));
            }
        }

        let columns: Vec<Column> = cells.into_iter().map(Column::infer).collect();
        let text_columns = names
            .iter()
            .zip(&columns)
            .filter(|(_, column)| !column.is_numeric())
            .map(|(name, _)| name)
            .join(", ");
        if !text_columns.is_empty() {
            debug!("Text columns in {}: {}", source, text_columns);
        }
        Ok(Table::new(names, columns)?)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Column)> {
        self.names.iter().zip(self.columns.iter())
    }

    pub(crate) fn columns_mut(&mut self) -> impl Iterator<Item = (&String, &mut Column)> {
        self.names.iter().zip(self.columns.iter_mut())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|e| e == name)
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.names
            .iter()
            .position(|e| e == name)
            .map(|pos| &self.columns[pos])
    }

    /// Values of a numeric column, or an error if it's missing or not numeric.
    pub fn numeric_column(&self, name: &str) -> Result<&[f64], TableError> {
        let column = self
            .get(name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))?;
        column
            .as_numeric()
            .ok_or_else(|| TableError::NotNumeric(name.to_string()))
    }

    /// Copy of the table without the given columns. Unknown names are ignored.
    pub fn drop_columns(&self, to_drop: &[&str]) -> Table {
        let (names, columns) = self
            .iter()
            .filter(|(name, _)| !to_drop.contains(&name.as_str()))
            .map(|(name, column)| (name.clone(), column.clone()))
            .unzip();
        Table {
            names,
            columns,
            n_rows: self.n_rows,
        }
    }

    pub fn n_missing(&self) -> usize {
        self.columns.iter().map(|c| c.n_missing()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(data: &str) -> Table {
        Table::from_reader(data.as_bytes(), "test").expect("valid CSV")
    }

    #[test]
    fn test_infer_types() {
        let table = parse("a,b,c,target\n1,x,,1.5\n2.5,y,,2\n");
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.names(), &["a", "b", "c", "target"]);
        assert_eq!(table.get("a"), Some(&Column::Numeric(vec![1., 2.5])));
        assert_eq!(
            table.get("b"),
            Some(&Column::Text(vec![Some("x".to_string()), Some("y".to_string())]))
        );
        // Only missing values: text column
        assert_eq!(table.get("c"), Some(&Column::Text(vec![None, None])));
        assert_eq!(table.numeric_column("target").unwrap(), &[1.5, 2.]);
    }

    #[test]
    fn test_missing_tokens() {
        let table = parse("a,b\n1,NA\nnan,u\n3,\n");
        let a = table.numeric_column("a").unwrap();
        assert!(a[1].is_nan());
        assert_eq!(table.get("b").unwrap().n_missing(), 2);
        assert_eq!(table.n_missing(), 3);
    }

    #[test]
    fn test_quoted_decimal_comma_is_text() {
        let table = parse("a,target\n\"1,5\",1\n\"2,0\",2\n");
        assert!(!table.get("a").unwrap().is_numeric());
    }

    #[test]
    fn test_inconsistent_record() {
        let err = Table::from_reader("a,b\n1,2\n3\n".as_bytes(), "test").unwrap_err();
        assert_eq!(
            err.to_string(),
            "inconsistent record length: row 3 has 1 fields, expected 2"
        );
    }

    #[test]
    fn test_empty_file() {
        let err = Table::from_reader("".as_bytes(), "empty.csv").unwrap_err();
        assert_eq!(err.to_string(), "CSV file empty.csv has no header");
    }

    #[test]
    fn test_column_errors() {
        let table = parse("a,b\n1,x\n");
        match table.numeric_column("target") {
            Err(TableError::MissingColumn(name)) => assert_eq!(name, "target"),
            other => panic!("unexpected {:?}", other),
        }
        match table.numeric_column("b") {
            Err(TableError::NotNumeric(name)) => assert_eq!(name, "b"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_drop_columns() {
        let table = parse("a,w,target\n1,2,3\n");
        let dropped = table.drop_columns(&["w", "target", "unknown"]);
        assert_eq!(dropped.names(), &["a"]);
        assert_eq!(dropped.n_rows(), 1);
        assert!(table.contains("w"));
    }
}
