//! Snapshot files written by an external collector

use super::MetricSource;
use crate::error::{IoResultExt, Result, SnitchError};
use crate::snapshot::MetricSnapshot;
use std::path::{Path, PathBuf};

/// Loads a JSON [`MetricSnapshot`] from disk
#[derive(Debug, Clone)]
pub struct SnapshotFileSource {
    path: PathBuf,
}

impl SnapshotFileSource {
    /// Create a source reading `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Snapshot file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MetricSource for SnapshotFileSource {
    fn collect(&self) -> Result<MetricSnapshot> {
        if !self.path.exists() {
            return Err(SnitchError::NotFound(self.path.clone()));
        }

        let content = std::fs::read_to_string(&self.path).with_path(&self.path)?;
        MetricSnapshot::from_json(&content).map_err(|e| SnitchError::SnapshotParse {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    fn describe(&self) -> String {
        format!("snapshot file {}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::RunMode;
    use crate::snapshot::Metric;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_partial_snapshot() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"serverName": "sql01", "numaNodeCount": 2, "currentMaxDOP": 4, "affinityMaskPresent": null}}"#
        )
        .unwrap();

        let source = SnapshotFileSource::new(file.path());
        let snapshot = source.collect().unwrap();
        assert_eq!(source.mode(), RunMode::Live);
        assert_eq!(snapshot.server_name, Metric::Available("sql01".to_string()));
        assert_eq!(snapshot.current_max_dop, Metric::Available(4));
        assert!(snapshot.affinity_mask_present.is_unavailable());
        assert!(snapshot.memory_grants_pending.is_unavailable());
    }

    #[test]
    fn test_missing_file() {
        let err = SnapshotFileSource::new("/nonexistent/snapshot.json")
            .collect()
            .unwrap_err();
        assert!(matches!(err, SnitchError::NotFound(_)));
    }

    #[test]
    fn test_malformed_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"numaNodeCount": "two"}}"#).unwrap();

        let err = SnapshotFileSource::new(file.path()).collect().unwrap_err();
        assert!(matches!(err, SnitchError::SnapshotParse { .. }));
        assert_eq!(err.path(), Some(&file.path().to_path_buf()));
    }
}
