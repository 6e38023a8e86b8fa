// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch.
//
// Metrics recorded per epoch:
//   - epoch:          the epoch number (1, 2, 3, ...)
//   - train_loss:     mean binary cross-entropy on the training set
//   - train_accuracy: fraction of training posts classified correctly
//   - val_loss:       mean binary cross-entropy on the validation set
//   - val_accuracy:   fraction of validation posts classified correctly
//
// Validation columns are left empty when training runs without a
// validation split.
//
// Example CSV output:
//   epoch,train_loss,train_accuracy,val_loss,val_accuracy
//   1,0.693512,0.500000,0.692871,0.500000
//   2,0.689004,0.750000,0.691950,0.500000
//
// How to read the metrics:
//   - If val_loss rises while train_loss keeps falling → overfitting,
//     which is exactly what early stopping reacts to.

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    pub train_loss: f64,

    /// Range: [0.0, 1.0]
    pub train_accuracy: f64,

    /// None when there is no validation set
    pub val_loss: Option<f64>,

    pub val_accuracy: Option<f64>,
}

impl EpochMetrics {
    pub fn new(
        epoch: usize,
        train_loss: f64,
        train_accuracy: f64,
        val_loss: Option<f64>,
        val_accuracy: Option<f64>,
    ) -> Self {
        Self { epoch, train_loss, train_accuracy, val_loss, val_accuracy }
    }

    fn csv_row(&self) -> String {
        let opt = |v: Option<f64>| v.map(|x| format!("{x:.6}")).unwrap_or_default();
        format!(
            "{},{:.6},{:.6},{},{}",
            self.epoch,
            self.train_loss,
            self.train_accuracy,
            opt(self.val_loss),
            opt(self.val_accuracy),
        )
    }
}

/// Appends epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a new MetricsLogger.
    /// Writes the CSV header if the file doesn't exist yet, so
    /// repeated runs append to one log.
    pub fn new(csv_path: impl AsRef<Path>) -> Result<Self> {
        let csv_path = csv_path.as_ref().to_path_buf();

        if let Some(parent) = csv_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,train_loss,train_accuracy,val_loss,val_accuracy")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(f, "{}", m.csv_row())?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_appended_under_one_header() {
        let dir = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path().join("logs/metrics.csv")).unwrap();
        logger.log(&EpochMetrics::new(1, 0.7, 0.5, Some(0.69), Some(0.5))).unwrap();
        logger.log(&EpochMetrics::new(2, 0.6, 0.75, None, None)).unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "epoch,train_loss,train_accuracy,val_loss,val_accuracy");
        assert_eq!(lines[1], "1,0.700000,0.500000,0.690000,0.500000");
        assert_eq!(lines[2], "2,0.600000,0.750000,,");
    }
}
