use crate::{median, Column, Table};

/// Value given to missing cells of text columns.
pub static UNKNOWN: &str = "Unknown";

/// Try to read text cells as numbers written with a decimal comma ("1,5" is 1.5).
///
/// Returns None if no cell can be parsed. Otherwise cells that can't be parsed are NaN.
fn parse_decimal_comma(cells: &[Option<String>]) -> Option<Vec<f64>> {
    let values: Vec<f64> = cells
        .iter()
        .map(|cell| {
            cell.as_ref()
                .and_then(|cell| cell.replace(',', ".").parse::<f64>().ok())
                .unwrap_or(std::f64::NAN)
        })
        .collect();
    if values.iter().all(|x| x.is_nan()) {
        None
    } else {
        Some(values)
    }
}

/// Fill the missing values: "Unknown" for text, the median for numbers.
/// A numeric column without any value has no median and becomes a text column.
fn fill_missing(name: &str, column: &mut Column) {
    let replacement = match column {
        Column::Text(cells) => {
            for cell in cells.iter_mut().filter(|cell| cell.is_none()) {
                *cell = Some(UNKNOWN.to_string());
            }
            None
        }
        Column::Numeric(values) => match median(values) {
            Some(median) => {
                debug!("Column {}: missing values set to the median {}", name, median);
                for value in values.iter_mut().filter(|x| x.is_nan()) {
                    *value = median;
                }
                None
            }
            None => {
                warn!("Column {} has no value, it's now a text column", name);
                Some(Column::Text(vec![Some(UNKNOWN.to_string()); values.len()]))
            }
        },
    };
    if let Some(replacement) = replacement {
        *column = replacement;
    }
}

/// Quick cleaning of a raw table. The input is not modified.
///
/// For every column, text is first parsed as numbers with a decimal comma; the column becomes
/// numeric as soon as one cell can be read, the others being missing. Then the missing values are
/// filled according to the type of the column *after* that parsing: a partially parsed column is
/// filled with the median of the parsed values, never with "Unknown".
pub fn preprocess_raw(table: &Table) -> Table {
    let mut clean = table.clone();
    let mut n_filled = 0;
    for (name, column) in clean.columns_mut() {
        let parsed = match column {
            Column::Text(cells) => parse_decimal_comma(cells),
            Column::Numeric(_) => None,
        };
        if let Some(values) = parsed {
            debug!("Column {} parsed as numeric", name);
            *column = Column::Numeric(values);
        }

        let n_missing = column.n_missing();
        if n_missing > 0 {
            fill_missing(name, column);
            n_filled += n_missing;
        }
    }
    info!(
        "Preprocessing done: {} missing values filled in {} columns",
        n_filled,
        clean.n_cols()
    );
    debug_assert_eq!(clean.n_missing(), 0);
    clean
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(cells: &[Option<&str>]) -> Column {
        Column::Text(cells.iter().map(|c| c.map(|c| c.to_string())).collect())
    }

    fn single_column(column: Column) -> Table {
        Table::new(vec!["a".to_string()], vec![column]).unwrap()
    }

    #[test]
    fn test_decimal_comma() {
        let table = single_column(text(&[Some("1,5"), Some("2,0")]));
        let clean = preprocess_raw(&table);
        assert_eq!(clean.get("a"), Some(&Column::Numeric(vec![1.5, 2.0])));
        // The input is untouched
        assert_eq!(table.get("a"), Some(&text(&[Some("1,5"), Some("2,0")])));
    }

    #[test]
    fn test_partial_parse_uses_median() {
        let table = single_column(text(&[Some("1,5"), Some("bad"), Some("2,0")]));
        let clean = preprocess_raw(&table);
        assert_eq!(clean.get("a"), Some(&Column::Numeric(vec![1.5, 1.75, 2.0])));
    }

    #[test]
    fn test_categorical_filled_with_unknown() {
        let table = single_column(text(&[Some("low"), None, Some("high")]));
        let clean = preprocess_raw(&table);
        assert_eq!(
            clean.get("a"),
            Some(&text(&[Some("low"), Some("Unknown"), Some("high")]))
        );
    }

    #[test]
    fn test_numeric_filled_with_median() {
        let nan = std::f64::NAN;
        let table = single_column(Column::Numeric(vec![1., nan, 3., 10.]));
        let clean = preprocess_raw(&table);
        assert_eq!(clean.get("a"), Some(&Column::Numeric(vec![1., 3., 3., 10.])));
    }

    #[test]
    fn test_empty_columns() {
        let nan = std::f64::NAN;
        let table = Table::new(
            vec!["a".to_string(), "b".to_string()],
            vec![Column::Numeric(vec![nan, nan]), text(&[None, None])],
        )
        .unwrap();
        let clean = preprocess_raw(&table);
        assert_eq!(clean.get("a"), Some(&text(&[Some("Unknown"), Some("Unknown")])));
        assert_eq!(clean.get("b"), Some(&text(&[Some("Unknown"), Some("Unknown")])));
    }

    #[test]
    fn test_no_missing_and_idempotent() {
        let data = "a,b,c,d,target\n\
                    \"1,5\",x,,7,1\n\
                    bad,,,NA,2\n\
                    \"2,0\",y,,8,3\n";
        let table = Table::from_reader(data.as_bytes(), "test").unwrap();
        assert!(table.n_missing() > 0);

        let clean = preprocess_raw(&table);
        assert_eq!(clean.n_missing(), 0);
        assert_eq!(clean.names(), table.names());
        for column in clean.columns() {
            assert_eq!(column.n_missing(), 0);
        }

        let twice = preprocess_raw(&clean);
        assert_eq!(twice, clean);
    }
}
