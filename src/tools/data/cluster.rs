//! K-Means clustering tool
//!
//! Standardizes numeric features, one-hot encodes categorical ones, runs
//! seeded K-Means, projects to two principal components for plotting, and
//! writes the `_clustered` artifact with `Cluster`, `PCA1`, `PCA2` columns.

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use tracing::debug;

use crate::core::{DatalystError, Result, ToolCall, ToolResult};
use crate::tools::data::clustered_path;
use crate::tools::data::frame::{mean, std_dev, Table};

/// Fixed seed so repeated runs over the same data agree
const KMEANS_SEED: u64 = 42;

/// Tool for K-Means clustering with a PCA projection
pub struct ClusterTool;

impl ClusterTool {
    pub fn new() -> Self {
        Self
    }

    /// Execute the tool
    pub fn execute(&self, tool_call: &ToolCall) -> Result<ToolResult> {
        let file_path = match tool_call.get_string("file_path") {
            Some(p) => p,
            None => {
                return Ok(ToolResult::failure(
                    "perform_clustering",
                    "Error during clustering: missing required argument 'file_path'.",
                ))
            }
        };

        match self.cluster(tool_call, &file_path) {
            Ok(report) => Ok(ToolResult::success("perform_clustering", report)),
            Err(e) => Ok(ToolResult::failure(
                "perform_clustering",
                format!("Error during clustering: {}", e),
            )),
        }
    }

    fn cluster(&self, tool_call: &ToolCall, file_path: &str) -> Result<String> {
        let k = tool_call.get_usize("k").unwrap_or(3);
        let requested: Option<Vec<String>> = tool_call.get_string_array("columns");

        let mut table = Table::read_csv(file_path)?;
        if table.is_empty() {
            return Err(DatalystError::tool(format!(
                "the file at {} is empty",
                file_path
            )));
        }

        // Resolve feature columns: requested ones, or every numeric column
        let feature_cols: Vec<usize> = match &requested {
            Some(names) if !names.is_empty() => {
                let mut cols = Vec::new();
                for name in names {
                    match table.column_index(name) {
                        Some(idx) => cols.push(idx),
                        None => {
                            return Err(DatalystError::tool(format!(
                                "column '{}' not found in {}",
                                name, file_path
                            )))
                        }
                    }
                }
                cols
            }
            _ => table.numeric_column_indices(),
        };

        if feature_cols.is_empty() {
            return Err(DatalystError::tool(
                "no usable feature columns for clustering",
            ));
        }
        if k == 0 || k > table.row_count() {
            return Err(DatalystError::tool(format!(
                "k={} is out of range for {} rows",
                k,
                table.row_count()
            )));
        }

        let matrix = build_feature_matrix(&table, &feature_cols);
        let labels = kmeans(&matrix, k, KMEANS_SEED);
        let (pca1, pca2) = project_2d(&matrix, KMEANS_SEED);

        table.push_column(
            "Cluster",
            labels.iter().map(|l| l.to_string()).collect(),
        )?;
        table.push_column("PCA1", pca1.iter().map(|v| format!("{:.6}", v)).collect())?;
        table.push_column("PCA2", pca2.iter().map(|v| format!("{:.6}", v)).collect())?;

        let output_path = clustered_path(file_path);
        table.write_csv(&output_path)?;
        debug!(k, rows = table.row_count(), path = %output_path, "clustering complete");

        Ok(format!(
            "Clustering complete. Results saved to: {}. \
             PCA components (PCA1, PCA2) and 'Cluster' labels added.",
            output_path
        ))
    }
}

impl Default for ClusterTool {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the preprocessed feature matrix: standardized numeric columns plus
/// one-hot encoded categorical columns
fn build_feature_matrix(table: &Table, cols: &[usize]) -> Vec<Vec<f64>> {
    let rows = table.row_count();
    let mut features: Vec<Vec<f64>> = vec![Vec::new(); rows];

    for &col in cols {
        if table.is_numeric_column(col) {
            let values: Vec<f64> = table
                .numeric_values(col)
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect();
            let m = mean(&values);
            let s = std_dev(&values);
            for (row, v) in values.into_iter().enumerate() {
                features[row].push(if s > 0.0 { (v - m) / s } else { 0.0 });
            }
        } else {
            // One column per distinct category, in first-seen order
            let mut categories: Vec<String> = Vec::new();
            for row in &table.rows {
                let cell = row[col].trim().to_string();
                if !categories.contains(&cell) {
                    categories.push(cell);
                }
            }
            for (row_idx, row) in table.rows.iter().enumerate() {
                let cell = row[col].trim();
                for category in &categories {
                    features[row_idx].push(if cell == category { 1.0 } else { 0.0 });
                }
            }
        }
    }

    features
}

/// Lloyd's algorithm with seeded initialization
fn kmeans(matrix: &[Vec<f64>], k: usize, seed: u64) -> Vec<usize> {
    let n = matrix.len();
    let dims = matrix[0].len();
    let mut rng = StdRng::seed_from_u64(seed);

    let mut centroids: Vec<Vec<f64>> = sample(&mut rng, n, k)
        .into_iter()
        .map(|i| matrix[i].clone())
        .collect();
    let mut labels = vec![0usize; n];

    for _ in 0..100 {
        let mut changed = false;

        for (i, point) in matrix.iter().enumerate() {
            let nearest = centroids
                .iter()
                .enumerate()
                .map(|(c, centroid)| (c, squared_distance(point, centroid)))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(c, _)| c)
                .unwrap_or(0);
            if labels[i] != nearest {
                labels[i] = nearest;
                changed = true;
            }
        }

        if !changed {
            break;
        }

        let mut sums = vec![vec![0.0; dims]; k];
        let mut counts = vec![0usize; k];
        for (point, &label) in matrix.iter().zip(&labels) {
            counts[label] += 1;
            for (d, v) in point.iter().enumerate() {
                sums[label][d] += v;
            }
        }
        for c in 0..k {
            if counts[c] > 0 {
                for d in 0..dims {
                    centroids[c][d] = sums[c][d] / counts[c] as f64;
                }
            }
        }
    }

    labels
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Project rows onto their first two principal components
///
/// Power iteration with deflation over the feature covariance matrix; the
/// feature count here is small enough that the dense matrix is fine.
fn project_2d(matrix: &[Vec<f64>], seed: u64) -> (Vec<f64>, Vec<f64>) {
    let n = matrix.len();
    let dims = matrix[0].len();

    // Center
    let mut means = vec![0.0; dims];
    for point in matrix {
        for (d, v) in point.iter().enumerate() {
            means[d] += v;
        }
    }
    for m in &mut means {
        *m /= n as f64;
    }
    let centered: Vec<Vec<f64>> = matrix
        .iter()
        .map(|point| point.iter().zip(&means).map(|(v, m)| v - m).collect())
        .collect();

    // Covariance
    let mut cov = vec![vec![0.0; dims]; dims];
    for point in &centered {
        for i in 0..dims {
            for j in 0..dims {
                cov[i][j] += point[i] * point[j];
            }
        }
    }
    let denom = (n.max(2) - 1) as f64;
    for row in &mut cov {
        for v in row.iter_mut() {
            *v /= denom;
        }
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let first = power_iteration(&cov, dims, &mut rng);
    deflate(&mut cov, &first);
    let second = power_iteration(&cov, dims, &mut rng);

    let project = |axis: &[f64]| -> Vec<f64> {
        centered
            .iter()
            .map(|point| point.iter().zip(axis).map(|(v, a)| v * a).sum())
            .collect()
    };

    (project(&first), project(&second))
}

fn power_iteration(cov: &[Vec<f64>], dims: usize, rng: &mut StdRng) -> Vec<f64> {
    use rand::Rng;

    let mut v: Vec<f64> = (0..dims).map(|_| rng.random::<f64>() - 0.5).collect();
    normalize(&mut v);

    for _ in 0..200 {
        let mut next = vec![0.0; dims];
        for i in 0..dims {
            for j in 0..dims {
                next[i] += cov[i][j] * v[j];
            }
        }
        if normalize(&mut next) < 1e-12 {
            // Degenerate direction; keep the previous vector
            break;
        }
        let delta: f64 = next
            .iter()
            .zip(&v)
            .map(|(a, b)| (a - b).abs())
            .sum();
        v = next;
        if delta < 1e-10 {
            break;
        }
    }

    v
}

/// Remove the component along `axis` from the covariance matrix
fn deflate(cov: &mut [Vec<f64>], axis: &[f64]) {
    let dims = axis.len();
    // eigenvalue estimate: axisᵀ C axis
    let mut c_axis = vec![0.0; dims];
    for i in 0..dims {
        for j in 0..dims {
            c_axis[i] += cov[i][j] * axis[j];
        }
    }
    let lambda: f64 = axis.iter().zip(&c_axis).map(|(a, b)| a * b).sum();
    for i in 0..dims {
        for j in 0..dims {
            cov[i][j] -= lambda * axis[i] * axis[j];
        }
    }
}

fn normalize(v: &mut [f64]) -> f64 {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
    norm
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    #[test]
    fn test_kmeans_separates_obvious_groups() {
        let matrix = vec![
            vec![0.0, 0.0],
            vec![0.1, 0.1],
            vec![0.0, 0.2],
            vec![10.0, 10.0],
            vec![10.1, 9.9],
            vec![9.9, 10.2],
        ];
        let labels = kmeans(&matrix, 2, KMEANS_SEED);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[1], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_eq!(labels[4], labels[5]);
        assert_ne!(labels[0], labels[3]);
    }

    #[test]
    fn test_cluster_writes_artifact_with_new_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.csv");
        fs::write(
            &path,
            "x,y\n0,0\n0.1,0.1\n0,0.2\n10,10\n10.1,9.9\n9.9,10.2\n",
        )
        .unwrap();

        let call = ToolCall::new(
            "perform_clustering",
            json!({ "file_path": path.to_string_lossy(), "columns": ["x", "y"], "k": 2 }),
        );
        let result = ClusterTool::new().execute(&call).unwrap();

        assert!(result.success, "{}", result.output);
        assert!(result.output.contains("saved to: ") || result.output.contains("Saved to: "));

        let clustered = Table::read_csv(dir.path().join("points_clustered.csv")).unwrap();
        assert!(clustered.column_index("Cluster").is_some());
        assert!(clustered.column_index("PCA1").is_some());
        assert!(clustered.column_index("PCA2").is_some());
        assert_eq!(clustered.row_count(), 6);
    }

    #[test]
    fn test_cluster_unknown_column_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.csv");
        fs::write(&path, "x\n1\n2\n3\n").unwrap();

        let call = ToolCall::new(
            "perform_clustering",
            json!({ "file_path": path.to_string_lossy(), "columns": ["missing"], "k": 2 }),
        );
        let result = ClusterTool::new().execute(&call).unwrap();

        assert!(!result.success);
        assert!(result.output.starts_with("Error during clustering:"));
    }
}
