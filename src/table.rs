//! Turning the rows returned by the data endpoint into something displayable
//! and into the CSV export. Nothing in here touches the terminal or the network.

use serde_json::{Map, Value};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// One record from the data endpoint. Key order is the order the server sent.
pub type Row = Map<String, Value>;

pub const EXPORT_FILE_NAME: &str = "export.csv";

/// Text shown in place of the table when there is nothing to show.
pub const EMPTY_PLACEHOLDER: &str = "No data";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("No data to export")]
    Empty,
    #[error("Could not write export: {0}")]
    Io(#[from] io::Error),
}

/// A rendered-ready description of the last loaded row set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableView {
    pub columns: Vec<String>,
    pub cells: Vec<Vec<String>>,
    pub stats: String,
}

impl TableView {
    pub fn describe(rows: &[Row]) -> Self {
        if rows.is_empty() {
            return Self {
                columns: vec![],
                cells: vec![],
                stats: "0 rows".to_string(),
            };
        }

        let columns = columns(rows);
        let cells = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|c| display_value(row.get(c)))
                    .collect()
            })
            .collect();
        let stats = format!("{} rows · {} columns", rows.len(), columns.len());

        Self {
            columns,
            cells,
            stats,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Union of all keys, in the order they first show up.
pub fn columns(rows: &[Row]) -> Vec<String> {
    let mut cols: Vec<String> = Vec::new();
    for key in rows.iter().flat_map(|r| r.keys()) {
        if !cols.iter().any(|c| c == key) {
            cols.push(key.clone());
        }
    }
    cols
}

fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Header of column names, then one line per row with every cell JSON quoted.
pub fn to_csv(rows: &[Row]) -> Result<String, ExportError> {
    if rows.is_empty() {
        return Err(ExportError::Empty);
    }

    let cols = columns(rows);
    let empty = Value::String(String::new());
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(cols.join(","));

    for row in rows {
        let line = cols
            .iter()
            .map(|c| {
                let value = match row.get(c) {
                    None | Some(Value::Null) => &empty,
                    Some(v) => v,
                };
                value.to_string()
            })
            .collect::<Vec<_>>()
            .join(",");
        lines.push(line);
    }

    Ok(lines.join("\n"))
}

/// Writes `export.csv` into `dir` and returns its path.
pub fn export_csv(rows: &[Row], dir: &Path) -> Result<PathBuf, ExportError> {
    let csv = to_csv(rows)?;
    fs::create_dir_all(dir)?;
    let path = dir.join(EXPORT_FILE_NAME);
    fs::write(&path, csv)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(value: Value) -> Vec<Row> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_columns_first_seen_order() {
        let data = rows(json!([{"b": 1, "a": 2}, {"c": 3, "a": 4}]));
        assert_eq!(columns(&data), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_describe_fills_missing_cells() {
        let data = rows(json!([{"a": 1, "b": 2}, {"a": 3}]));
        let view = TableView::describe(&data);
        assert_eq!(view.columns, vec!["a", "b"]);
        assert_eq!(view.cells, vec![vec!["1", "2"], vec!["3", ""]]);
        assert_eq!(view.stats, "2 rows · 2 columns");
    }

    #[test]
    fn test_describe_value_text() {
        let data = rows(json!([{"s": "text", "n": null, "f": 1.5, "t": true}]));
        let view = TableView::describe(&data);
        assert_eq!(view.cells[0], vec!["text", "", "1.5", "true"]);
    }

    #[test]
    fn test_describe_empty() {
        let view = TableView::describe(&[]);
        assert!(view.is_empty());
        assert!(view.columns.is_empty());
        assert_eq!(view.stats, "0 rows");
    }

    #[test]
    fn test_csv() {
        let data = rows(json!([{"a": 1, "b": 2}, {"a": 3}]));
        assert_eq!(to_csv(&data).unwrap(), "a,b\n1,2\n3,\"\"");
    }

    #[test]
    fn test_csv_escapes_delimiters_and_quotes() {
        let data = rows(json!([{"name": "x, \"y\"", "ts": "2024-01-01 10:00:00"}]));
        assert_eq!(
            to_csv(&data).unwrap(),
            "name,ts\n\"x, \\\"y\\\"\",\"2024-01-01 10:00:00\""
        );
    }

    #[test]
    fn test_csv_empty() {
        assert!(matches!(to_csv(&[]), Err(ExportError::Empty)));
    }

    #[test]
    fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let data = rows(json!([{"a": 1}]));
        let path = export_csv(&data, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), EXPORT_FILE_NAME);
        assert_eq!(fs::read_to_string(path).unwrap(), "a\n1");
    }

    #[test]
    fn test_export_empty_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(export_csv(&[], dir.path()), Err(ExportError::Empty)));
        assert!(!dir.path().join(EXPORT_FILE_NAME).exists());
    }
}
