//! Minimal tabular data model for the specialist tools
//!
//! Reads and writes CSV with quoted-field support, and classifies columns as
//! numeric or categorical. The orchestration core never touches this layer;
//! only the tools do.

use std::fs;
use std::path::Path;

use crate::core::{DatalystError, Result};

/// An in-memory CSV table: one header row plus string cells
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Read a CSV file into a table
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let mut records = parse_csv(&content);

        if records.is_empty() {
            return Ok(Self::default());
        }

        let headers = records.remove(0);
        let width = headers.len();

        // Pad or truncate ragged rows to the header width
        for row in &mut records {
            row.resize(width, String::new());
        }

        Ok(Self {
            headers,
            rows: records,
        })
    }

    /// Write the table to a CSV file
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut out = String::new();
        out.push_str(&format_record(&self.headers));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&format_record(row));
            out.push('\n');
        }
        fs::write(path.as_ref(), out)?;
        Ok(())
    }

    /// Whether the table has no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Index of a named column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Parsed numeric values for a column; None for empty or non-numeric cells
    pub fn numeric_values(&self, col: usize) -> Vec<Option<f64>> {
        self.rows
            .iter()
            .map(|row| {
                let cell = row[col].trim();
                if cell.is_empty() {
                    None
                } else {
                    cell.parse::<f64>().ok()
                }
            })
            .collect()
    }

    /// A column is numeric when every non-empty cell parses as a number and
    /// at least one cell is non-empty
    pub fn is_numeric_column(&self, col: usize) -> bool {
        let mut seen = false;
        for row in &self.rows {
            let cell = row[col].trim();
            if cell.is_empty() {
                continue;
            }
            if cell.parse::<f64>().is_err() {
                return false;
            }
            seen = true;
        }
        seen
    }

    /// Indices of all numeric columns
    pub fn numeric_column_indices(&self) -> Vec<usize> {
        (0..self.column_count())
            .filter(|&c| self.is_numeric_column(c))
            .collect()
    }

    /// Fraction of empty cells in a column
    pub fn null_fraction(&self, col: usize) -> f64 {
        if self.rows.is_empty() {
            return 0.0;
        }
        let nulls = self
            .rows
            .iter()
            .filter(|row| row[col].trim().is_empty())
            .count();
        nulls as f64 / self.rows.len() as f64
    }

    /// Remove the given columns (indices into the current header order)
    pub fn drop_columns(&mut self, indices: &[usize]) {
        let mut sorted: Vec<usize> = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        for &idx in sorted.iter().rev() {
            if idx < self.headers.len() {
                self.headers.remove(idx);
                for row in &mut self.rows {
                    row.remove(idx);
                }
            }
        }
    }

    /// Keep only the rows whose flag is true
    pub fn retain_rows(&mut self, keep: &[bool]) {
        let mut it = keep.iter();
        self.rows.retain(|_| *it.next().unwrap_or(&true));
    }

    /// Append a new column with one value per row
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<String>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(DatalystError::tool(format!(
                "column length {} does not match row count {}",
                values.len(),
                self.rows.len()
            )));
        }
        self.headers.push(name.into());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(())
    }
}

/// Parse CSV content into records, honoring quoted fields (including embedded
/// commas, quotes, and newlines)
fn parse_csv(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => {
                record.push(std::mem::take(&mut field));
            }
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                if !(record.len() == 1 && record[0].is_empty()) {
                    records.push(std::mem::take(&mut record));
                } else {
                    record.clear();
                }
            }
            _ => field.push(c),
        }
    }

    // Trailing record without a final newline
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    records
}

/// Format one record, quoting fields that need it
fn format_record(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| {
            if f.contains(',') || f.contains('"') || f.contains('\n') {
                format!("\"{}\"", f.replace('"', "\"\""))
            } else {
                f.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Mean of a slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median of a slice
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

/// Linear-interpolated quantile, q in [0, 1]
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut t = Table::default();
        t.headers = vec!["name".into(), "age".into(), "score".into()];
        t.rows = vec![
            vec!["alice".into(), "30".into(), "1.5".into()],
            vec!["bob".into(), "25".into(), "2.5".into()],
        ];
        t
    }

    #[test]
    fn test_parse_quoted_fields() {
        let records = parse_csv("a,b\n\"x, y\",\"he said \"\"hi\"\"\"\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1][0], "x, y");
        assert_eq!(records[1][1], "he said \"hi\"");
    }

    #[test]
    fn test_parse_no_trailing_newline() {
        let records = parse_csv("a,b\n1,2");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1], vec!["1", "2"]);
    }

    #[test]
    fn test_numeric_column_detection() {
        let t = sample();
        assert!(!t.is_numeric_column(0));
        assert!(t.is_numeric_column(1));
        assert_eq!(t.numeric_column_indices(), vec![1, 2]);
    }

    #[test]
    fn test_drop_columns() {
        let mut t = sample();
        t.drop_columns(&[0]);
        assert_eq!(t.headers, vec!["age", "score"]);
        assert_eq!(t.rows[0], vec!["30", "1.5"]);
    }

    #[test]
    fn test_round_trip_quoting() {
        let rec = format_record(&["x, y".to_string(), "plain".to_string()]);
        assert_eq!(rec, "\"x, y\",plain");
        let parsed = parse_csv(&rec);
        assert_eq!(parsed[0][0], "x, y");
    }

    #[test]
    fn test_quantile_and_median() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(median(&values), 2.5);
        assert_eq!(quantile(&values, 0.0), 1.0);
        assert_eq!(quantile(&values, 1.0), 4.0);
        assert_eq!(quantile(&values, 0.5), 2.5);
    }
}
