use csv::{ReaderBuilder, WriterBuilder};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

/// Errors from the persisted table layer
#[derive(Debug, Error)]
pub enum TableError {
    #[error("table resource not found: {0} (seed an initial table before the first run)")]
    NotFound(String),
    #[error("malformed table: {0}")]
    Malformed(String),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// 2-D labeled rate table: rows are currency codes, columns are `YYYY-MM-DD`
/// dates, cells are rates against the base currency. Absent cells stay empty
/// in the CSV, never zero.
#[derive(Debug, Clone)]
pub struct RateTable {
    index_label: String,
    columns: Vec<String>,
    rows: Vec<String>,
    cells: HashMap<String, Vec<Option<f64>>>,
}

impl Default for RateTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RateTable {
    pub fn new() -> Self {
        Self {
            index_label: "currency".to_string(),
            columns: Vec::new(),
            rows: Vec::new(),
            cells: HashMap::new(),
        }
    }

    /// Read the full table from a CSV file: header row, first column is the
    /// currency-code index. Fails with `NotFound` when the file is missing.
    pub fn read_csv(path: &Path) -> Result<Self, TableError> {
        if !path.exists() {
            return Err(TableError::NotFound(path.display().to_string()));
        }

        let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
        let headers = reader.headers()?.clone();
        if headers.is_empty() {
            return Err(TableError::Malformed("missing header row".to_string()));
        }

        let index_label = headers[0].to_string();
        let columns: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

        let mut rows = Vec::new();
        let mut cells: HashMap<String, Vec<Option<f64>>> = HashMap::new();
        for record in reader.records() {
            let record = record?;
            let code = record.get(0).unwrap_or("").to_string();
            if code.is_empty() {
                return Err(TableError::Malformed("row with empty currency code".to_string()));
            }
            if cells.contains_key(&code) {
                return Err(TableError::Malformed(format!("duplicate row label: {code}")));
            }

            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                let field = record.get(i + 1).unwrap_or("");
                if field.is_empty() {
                    values.push(None);
                } else {
                    let rate = field.parse::<f64>().map_err(|_| {
                        TableError::Malformed(format!("non-numeric rate {field:?} for {code}"))
                    })?;
                    values.push(Some(rate));
                }
            }
            rows.push(code.clone());
            cells.insert(code, values);
        }

        Ok(Self { index_label, columns, rows, cells })
    }

    /// Overwrite the persisted file wholesale with the current contents.
    pub fn write_csv(&self, path: &Path) -> Result<(), TableError> {
        let mut writer = WriterBuilder::new().from_path(path)?;

        let mut header = Vec::with_capacity(self.columns.len() + 1);
        header.push(self.index_label.clone());
        header.extend(self.columns.iter().cloned());
        writer.write_record(&header)?;

        for code in &self.rows {
            let mut record = Vec::with_capacity(self.columns.len() + 1);
            record.push(code.clone());
            if let Some(values) = self.cells.get(code) {
                for value in values {
                    record.push(value.map(|v| v.to_string()).unwrap_or_default());
                }
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn row_labels(&self) -> &[String] {
        &self.rows
    }

    pub fn column_labels(&self) -> &[String] {
        &self.columns
    }

    pub fn row_set(&self) -> HashSet<String> {
        self.rows.iter().cloned().collect()
    }

    pub fn column_set(&self) -> HashSet<String> {
        self.columns.iter().cloned().collect()
    }

    pub fn get(&self, code: &str, date: &str) -> Option<f64> {
        let col = self.columns.iter().position(|c| c == date)?;
        self.cells.get(code)?.get(col).copied().flatten()
    }

    /// Append one date column, aligning rows by currency code. Existing rows
    /// absent from `rates` get an empty cell; codes not yet in the table are
    /// appended (sorted) with empty cells for all prior columns. The caller
    /// guarantees `date` is not already a column.
    pub fn push_column(&mut self, date: &str, rates: &HashMap<String, f64>) {
        self.columns.push(date.to_string());
        let prior_width = self.columns.len() - 1;

        let mut new_codes: Vec<&String> =
            rates.keys().filter(|code| !self.cells.contains_key(code.as_str())).collect();
        new_codes.sort();
        for code in new_codes {
            self.rows.push(code.clone());
            self.cells.insert(code.clone(), vec![None; prior_width]);
        }

        for code in &self.rows {
            if let Some(values) = self.cells.get_mut(code) {
                values.push(rates.get(code).copied());
            }
        }
    }

    /// Column-wise concatenation: append every column of `other`, row-aligned
    /// by currency code. Rows unique to either side keep empty cells where no
    /// data exists.
    pub fn append_columns(&mut self, other: &RateTable) {
        for (idx, date) in other.columns.iter().enumerate() {
            let mut rates = HashMap::new();
            for code in &other.rows {
                if let Some(Some(rate)) = other.cells.get(code).and_then(|values| values.get(idx)) {
                    rates.insert(code.clone(), *rate);
                }
            }
            self.push_column(date, &rates);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn rates(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(code, rate)| (code.to_string(), *rate)).collect()
    }

    #[test]
    fn test_read_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let err = RateTable::read_csv(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, TableError::NotFound(_)));
    }

    #[test]
    fn test_round_trip_preserves_labels_and_cells() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rates.csv");

        let mut table = RateTable::new();
        table.push_column("2024-01-01", &rates(&[("CAD", 1.35), ("EUR", 0.91)]));
        table.push_column("2024-01-02", &rates(&[("CAD", 1.36)]));
        table.write_csv(&path).unwrap();

        let reread = RateTable::read_csv(&path).unwrap();
        assert_eq!(reread.row_labels(), table.row_labels());
        assert_eq!(reread.column_labels(), table.column_labels());
        assert_eq!(reread.get("CAD", "2024-01-01"), Some(1.35));
        assert_eq!(reread.get("EUR", "2024-01-02"), None); // empty cell survives
    }

    #[test]
    fn test_push_column_aligns_rows() {
        let mut table = RateTable::new();
        table.push_column("2024-01-01", &rates(&[("CAD", 1.35), ("EUR", 0.91)]));
        table.push_column("2024-01-02", &rates(&[("EUR", 0.92), ("HKD", 7.82)]));

        // HKD joins mid-history: empty cell for the earlier column
        assert_eq!(table.row_labels(), &["CAD", "EUR", "HKD"]);
        assert_eq!(table.get("HKD", "2024-01-01"), None);
        assert_eq!(table.get("HKD", "2024-01-02"), Some(7.82));
        assert_eq!(table.get("CAD", "2024-01-02"), None);
    }

    #[test]
    fn test_append_columns_merges_row_aligned() {
        let mut existing = RateTable::new();
        existing.push_column("2024-01-01", &rates(&[("CAD", 1.35), ("EUR", 0.91)]));

        let mut fresh = RateTable::new();
        fresh.push_column("2024-01-02", &rates(&[("CAD", 1.36), ("PHP", 55.8)]));

        existing.append_columns(&fresh);
        assert_eq!(existing.column_labels(), &["2024-01-01", "2024-01-02"]);
        assert_eq!(existing.row_labels(), &["CAD", "EUR", "PHP"]);
        assert_eq!(existing.get("PHP", "2024-01-01"), None);
        assert_eq!(existing.get("EUR", "2024-01-02"), None);
        assert_eq!(existing.get("CAD", "2024-01-02"), Some(1.36));
    }

    #[test]
    fn test_non_numeric_cell_is_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "currency,2024-01-01\nCAD,not-a-rate\n").unwrap();

        let err = RateTable::read_csv(&path).unwrap_err();
        assert!(matches!(err, TableError::Malformed(_)));
    }

    #[test]
    fn test_duplicate_row_label_is_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dup.csv");
        std::fs::write(&path, "currency,2024-01-01\nCAD,1.35\nCAD,1.36\n").unwrap();

        let err = RateTable::read_csv(&path).unwrap_err();
        assert!(matches!(err, TableError::Malformed(_)));
    }
}
