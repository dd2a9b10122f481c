//! Data cleaning tool
//!
//! Handles null values, outlier removal, and column dropping. Writes the
//! `_cleaned` artifact and reports its path.

use tracing::debug;

use crate::core::{Result, ToolCall, ToolResult};
use crate::tools::data::frame::{mean, median, quantile, Table};
use crate::tools::data::cleaned_path;

/// Tool for cleaning a CSV dataset
pub struct CleanTool;

impl CleanTool {
    pub fn new() -> Self {
        Self
    }

    /// Execute the tool
    ///
    /// All failures are reported as plain text in the result; the graph never
    /// sees an error from a malformed dataset.
    pub fn execute(&self, tool_call: &ToolCall) -> Result<ToolResult> {
        let file_path = match tool_call.get_string("file_path") {
            Some(p) => p,
            None => {
                return Ok(ToolResult::failure(
                    "clean_data",
                    "Error during cleaning: missing required argument 'file_path'.",
                ))
            }
        };

        match self.clean(tool_call, &file_path) {
            Ok(report) => Ok(ToolResult::success("clean_data", report)),
            Err(e) => Ok(ToolResult::failure(
                "clean_data",
                format!("Error during cleaning: {}", e),
            )),
        }
    }

    fn clean(&self, tool_call: &ToolCall, file_path: &str) -> Result<String> {
        let drop_null_thresh = tool_call.get_f64("drop_null_thresh").unwrap_or(0.5);
        let impute_num = tool_call
            .get_string("impute_num")
            .unwrap_or_else(|| "median".to_string());
        let impute_cat = tool_call
            .get_string("impute_cat")
            .unwrap_or_else(|| "mode".to_string());
        let drop_columns = tool_call.get_string_array("drop_columns").unwrap_or_default();
        let remove_outliers = tool_call.get_bool("remove_outliers").unwrap_or(true);

        let mut table = Table::read_csv(file_path)?;
        if table.is_empty() {
            return Ok(format!("Error: The file at {} is empty.", file_path));
        }

        // Manual column dropping
        let existing_drops: Vec<String> = drop_columns
            .iter()
            .filter(|c| table.column_index(c).is_some())
            .cloned()
            .collect();
        let drop_indices: Vec<usize> = existing_drops
            .iter()
            .filter_map(|c| table.column_index(c))
            .collect();
        table.drop_columns(&drop_indices);

        // Drop columns with too many nulls
        let null_heavy: Vec<usize> = (0..table.column_count())
            .filter(|&c| table.null_fraction(c) > drop_null_thresh)
            .collect();
        table.drop_columns(&null_heavy);

        // Impute remaining nulls
        for col in 0..table.column_count() {
            if table.null_fraction(col) == 0.0 {
                continue;
            }
            let fill = if table.is_numeric_column(col) {
                let present: Vec<f64> = table
                    .numeric_values(col)
                    .into_iter()
                    .flatten()
                    .collect();
                let value = if impute_num == "mean" {
                    mean(&present)
                } else {
                    median(&present)
                };
                format_number(value)
            } else if impute_cat == "constant" {
                "Missing".to_string()
            } else {
                mode_value(&table, col)
            };

            for row in &mut table.rows {
                if row[col].trim().is_empty() {
                    row[col] = fill.clone();
                }
            }
        }

        // IQR outlier removal, one numeric column at a time, with a floor
        // guard: never let a single pass drop the table below 5 rows or
        // below 10% of its current size
        if remove_outliers && !table.is_empty() {
            for col in table.numeric_column_indices() {
                let values: Vec<f64> = table
                    .numeric_values(col)
                    .into_iter()
                    .map(|v| v.unwrap_or(0.0))
                    .collect();
                let q1 = quantile(&values, 0.25);
                let q3 = quantile(&values, 0.75);
                let iqr = q3 - q1;
                let lower = q1 - 1.5 * iqr;
                let upper = q3 + 1.5 * iqr;

                let keep: Vec<bool> = values.iter().map(|v| *v >= lower && *v <= upper).collect();
                let kept = keep.iter().filter(|k| **k).count();
                if kept > 5 && kept as f64 > table.row_count() as f64 * 0.1 {
                    table.retain_rows(&keep);
                }
            }
        }

        if table.is_empty() {
            return Ok(
                "Error: Cleaning process resulted in an empty dataset. \
                 Check your null threshold or outlier settings."
                    .to_string(),
            );
        }

        let output_path = cleaned_path(file_path);
        table.write_csv(&output_path)?;
        debug!(rows = table.row_count(), path = %output_path, "cleaning complete");

        let mut msg = format!("Data cleaning complete. Saved to: {}.", output_path);
        if !existing_drops.is_empty() {
            msg.push_str(&format!(" Dropped: {:?}.", existing_drops));
        }
        msg.push_str(&format!(
            " Handled nulls, validated types, and sanitized {} rows.",
            table.row_count()
        ));
        Ok(msg)
    }
}

impl Default for CleanTool {
    fn default() -> Self {
        Self::new()
    }
}

/// Most frequent non-empty value in a column
fn mode_value(table: &Table, col: usize) -> String {
    use std::collections::HashMap;

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for row in &table.rows {
        let cell = row[col].trim();
        if !cell.is_empty() {
            *counts.entry(cell).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .max_by_key(|(_, n)| *n)
        .map(|(v, _)| v.to_string())
        .unwrap_or_else(|| "Missing".to_string())
}

/// Format an imputed number without trailing noise
fn format_number(value: f64) -> String {
    if (value - value.round()).abs() < f64::EPSILON {
        format!("{}", value.round() as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn write_fixture(dir: &std::path::Path, name: &str, content: &str) -> String {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_clean_imputes_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            dir.path(),
            "data.csv",
            "a,b\n1,x\n2,\n3,x\n4,x\n5,x\n6,x\n7,x\n",
        );

        let call = ToolCall::new("clean_data", json!({ "file_path": path }));
        let result = CleanTool::new().execute(&call).unwrap();

        assert!(result.success);
        assert!(result.output.contains("Saved to:"));
        assert!(result.output.contains("_cleaned.csv"));

        let cleaned = Table::read_csv(dir.path().join("data_cleaned.csv")).unwrap();
        // The empty categorical cell was imputed with the mode
        assert!(cleaned.rows.iter().all(|r| !r[1].trim().is_empty()));
    }

    #[test]
    fn test_clean_empty_file_reports_error_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), "empty.csv", "");

        let call = ToolCall::new("clean_data", json!({ "file_path": path }));
        let result = CleanTool::new().execute(&call).unwrap();

        assert!(result.output.contains("is empty"));
    }

    #[test]
    fn test_clean_missing_file_recovered_as_text() {
        let call = ToolCall::new(
            "clean_data",
            json!({ "file_path": "/nonexistent/nope.csv" }),
        );
        let result = CleanTool::new().execute(&call).unwrap();

        assert!(!result.success);
        assert!(result.output.starts_with("Error during cleaning:"));
    }

    #[test]
    fn test_clean_drops_requested_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            dir.path(),
            "data.csv",
            "a,b,c\n1,2,x\n2,3,y\n3,4,z\n4,5,x\n5,6,y\n6,7,z\n",
        );

        let call = ToolCall::new(
            "clean_data",
            json!({ "file_path": path, "drop_columns": ["b"], "remove_outliers": false }),
        );
        let result = CleanTool::new().execute(&call).unwrap();
        assert!(result.output.contains("Dropped:"));

        let cleaned = Table::read_csv(dir.path().join("data_cleaned.csv")).unwrap();
        assert_eq!(cleaned.headers, vec!["a", "c"]);
    }
}
