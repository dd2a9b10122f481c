//! Data analysis tools and artifact path conventions
//!
//! Each tool reads a CSV artifact, does its work, and reports in plain text.
//! Tools that write a new artifact include the `Saved to: <path>` phrase in
//! their report; that phrase is the only channel through which the graph
//! learns about new artifacts.

pub mod clean;
pub mod cluster;
pub mod eda;
pub mod frame;
pub mod visualize;

pub use clean::CleanTool;
pub use cluster::ClusterTool;
pub use eda::EdaTool;
pub use visualize::VisualizeTool;

use std::path::Path;

/// Output path for a cleaning pass: `<base>_cleaned.<ext>`.
///
/// Idempotent: re-cleaning an already-cleaned file overwrites it in place
/// instead of chaining suffixes.
pub fn cleaned_path(path: &str) -> String {
    let p = Path::new(path);
    let stem = p
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    if stem.ends_with("_cleaned") {
        return path.to_string();
    }

    let ext = p
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "csv".to_string());

    p.with_file_name(format!("{}_cleaned.{}", stem, ext))
        .to_string_lossy()
        .into_owned()
}

/// Output path for a clustering pass: `<base>_clustered.<ext>`
pub fn clustered_path(path: &str) -> String {
    let p = Path::new(path);
    let stem = p
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = p
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "csv".to_string());

    p.with_file_name(format!("{}_clustered.{}", stem, ext))
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleaned_path() {
        assert_eq!(cleaned_path("data/raw.csv"), "data/raw_cleaned.csv");
    }

    #[test]
    fn test_cleaned_path_idempotent() {
        assert_eq!(
            cleaned_path("data/raw_cleaned.csv"),
            "data/raw_cleaned.csv"
        );
    }

    #[test]
    fn test_clustered_path() {
        assert_eq!(
            clustered_path("data/raw_cleaned.csv"),
            "data/raw_cleaned_clustered.csv"
        );
    }
}
