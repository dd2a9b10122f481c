//! Exploratory data analysis tool
//!
//! Reports high correlations with drop suggestions. Produces no artifact, so
//! its output never carries a save marker.

use crate::core::{Result, ToolCall, ToolResult};
use crate::tools::data::frame::{mean, std_dev, Table};

/// Correlation threshold above which a pair is flagged
const HIGH_CORR: f64 = 0.85;

/// Tool for exploratory data analysis
pub struct EdaTool;

impl EdaTool {
    pub fn new() -> Self {
        Self
    }

    /// Execute the tool
    pub fn execute(&self, tool_call: &ToolCall) -> Result<ToolResult> {
        let file_path = match tool_call.get_string("file_path") {
            Some(p) => p,
            None => {
                return Ok(ToolResult::failure(
                    "perform_eda",
                    "Error during EDA: missing required argument 'file_path'.",
                ))
            }
        };

        match self.analyze(&file_path) {
            Ok(report) => Ok(ToolResult::success("perform_eda", report)),
            Err(e) => Ok(ToolResult::failure(
                "perform_eda",
                format!("Error during EDA: {}", e),
            )),
        }
    }

    fn analyze(&self, file_path: &str) -> Result<String> {
        let table = Table::read_csv(file_path)?;
        let numeric = table.numeric_column_indices();

        if numeric.is_empty() {
            return Ok("No numerical data available for EDA.".to_string());
        }

        // Columns as dense vectors; empty cells count as 0.0 here, matching
        // a post-cleaning dataset where nulls are already imputed
        let columns: Vec<(String, Vec<f64>)> = numeric
            .iter()
            .map(|&c| {
                (
                    table.headers[c].clone(),
                    table
                        .numeric_values(c)
                        .into_iter()
                        .map(|v| v.unwrap_or(0.0))
                        .collect(),
                )
            })
            .collect();

        let mut high_corr_pairs = Vec::new();
        let mut drop_suggestions = Vec::new();

        for i in 0..columns.len() {
            for j in 0..i {
                let r = pearson(&columns[i].1, &columns[j].1);
                if r.abs() > HIGH_CORR {
                    high_corr_pairs.push(format!(
                        "{} & {} ({:.2})",
                        columns[i].0, columns[j].0, r
                    ));
                    // Suggest dropping the second column of the pair
                    if !drop_suggestions.contains(&columns[j].0) {
                        drop_suggestions.push(columns[j].0.clone());
                    }
                }
            }
        }

        let mut report = String::from("EDA Report:\n");
        if high_corr_pairs.is_empty() {
            report.push_str("- No extreme multicollinearity detected (>0.85).\n");
        } else {
            report.push_str(&format!(
                "- High Correlations Found: {}.\n",
                high_corr_pairs.join(", ")
            ));
            report.push_str(&format!(
                "- SUGGESTED DROPS to avoid multicollinearity: {:?}\n",
                drop_suggestions
            ));
        }
        report.push_str(&format!(
            "- Data Shape: ({}, {})\n",
            table.row_count(),
            table.column_count()
        ));
        report.push_str("- Signals generated for UI: Correlation Heatmap and Feature Distributions.");

        Ok(report)
    }
}

impl Default for EdaTool {
    fn default() -> Self {
        Self::new()
    }
}

/// Pearson correlation coefficient between two equal-length columns
fn pearson(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let ma = mean(a);
    let mb = mean(b);
    let sa = std_dev(a);
    let sb = std_dev(b);
    if sa == 0.0 || sb == 0.0 {
        return 0.0;
    }
    let cov = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x - ma) * (y - mb))
        .sum::<f64>()
        / a.len() as f64;
    cov / (sa * sb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    #[test]
    fn test_pearson_perfect_correlation() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [2.0, 4.0, 6.0, 8.0];
        assert!((pearson(&a, &b) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_eda_flags_correlated_pair() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, "x,y,z\n1,2,9\n2,4,1\n3,6,5\n4,8,2\n").unwrap();

        let call = ToolCall::new(
            "perform_eda",
            json!({ "file_path": path.to_string_lossy() }),
        );
        let result = EdaTool::new().execute(&call).unwrap();

        assert!(result.success);
        assert!(result.output.contains("High Correlations Found"));
        assert!(result.output.contains("SUGGESTED DROPS"));
        // EDA never writes an artifact
        assert!(!result.output.to_lowercase().contains("saved to:"));
    }

    #[test]
    fn test_eda_no_numeric_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, "name\nalice\nbob\n").unwrap();

        let call = ToolCall::new(
            "perform_eda",
            json!({ "file_path": path.to_string_lossy() }),
        );
        let result = EdaTool::new().execute(&call).unwrap();
        assert_eq!(result.output, "No numerical data available for EDA.");
    }
}
