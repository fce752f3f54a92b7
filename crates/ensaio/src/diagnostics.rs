//! Diagnostic markup capture.
//!
//! On any blocking failure the current document markup is serialized to a
//! debug artifact keyed by run name, step number and action, with a
//! timestamp suffix. Capture failures are logged and swallowed: diagnostics
//! must never mask the failure that triggered them.

use crate::driver::PageDriver;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes markup artifacts for a single run
#[derive(Debug, Clone)]
pub struct DiagnosticsCapturer {
    root: PathBuf,
    run_name: String,
}

impl DiagnosticsCapturer {
    /// Capturer writing under `root/run_name/`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, run_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            run_name: run_name.into(),
        }
    }

    /// Directory artifacts are written to
    #[must_use]
    pub fn dir(&self) -> PathBuf {
        self.root.join(&self.run_name)
    }

    /// Serialize the current markup to an artifact. Returns the path on
    /// success, `None` when the capture itself failed.
    pub async fn capture(
        &self,
        driver: &dyn PageDriver,
        step_number: u32,
        action: &str,
        reason: &str,
    ) -> Option<PathBuf> {
        let markup = match driver.serialize_markup().await {
            Ok(markup) => markup,
            Err(e) => {
                tracing::warn!("diagnostic capture skipped, markup unavailable: {e}");
                return None;
            }
        };

        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("step_{step_number:03}_{action}_{timestamp}.html");
        let path = self.dir().join(filename);

        match write_artifact(&path, reason, &markup) {
            Ok(()) => {
                tracing::info!("diagnostic markup written to {}", path.display());
                Some(path)
            }
            Err(e) => {
                tracing::warn!("failed to write diagnostic {}: {e}", path.display());
                None
            }
        }
    }
}

fn write_artifact(path: &Path, reason: &str, markup: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = format!("<!-- {reason} -->\n{markup}");
    fs::write(path, body)
}
