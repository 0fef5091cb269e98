//! Label-graph (`.lg`) output.
//!
//! ```text
//! O, <id>, <class>, 1.0, <stroke>, <stroke>...
//! R, <id1>, <id2>, <label>, 1.0
//! ```
//!
//! Object lines come first in group creation order, then relationship lines
//! in edge generation order.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{OutputError, OutputResult};
use crate::oracle::{OracleMode, OracleOutput};

/// Confidence written on every line; oracle output is certain.
const CONFIDENCE: &str = "1.0";

/// Display adapter rendering an [`OracleOutput`] as a label graph.
pub struct LabelGraph<'a>(pub &'a OracleOutput);

impl fmt::Display for LabelGraph<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for group in &self.0.groups {
            write!(f, "O, {}, {}, {CONFIDENCE}", group.id, group.class)?;
            for stroke in &group.strokes {
                write!(f, ", {stroke}")?;
            }
            writeln!(f)?;
        }
        for edge in &self.0.edges {
            writeln!(f, "R, {}, {}, {}, {CONFIDENCE}", edge.from, edge.to, edge.label)?;
        }
        Ok(())
    }
}

/// Render an output to a string.
pub fn render(output: &OracleOutput) -> String {
    LabelGraph(output).to_string()
}

/// `<root>/<mode dir>/<input stem>.lg`
pub fn output_path(root: &Path, mode: OracleMode, input: &Path) -> OutputResult<PathBuf> {
    let stem = input.file_stem().ok_or_else(|| OutputError::NoStem {
        path: input.display().to_string(),
    })?;
    let mut file_name = stem.to_os_string();
    file_name.push(".lg");
    Ok(root.join(mode.output_dir_name()).join(file_name))
}

/// Write `output` for `input` under `root`, creating directories as needed.
/// Returns the path written.
pub fn write(root: &Path, input: &Path, output: &OracleOutput) -> OutputResult<PathBuf> {
    let path = output_path(root, output.mode, input)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| OutputError::CreateDir {
            path: parent.display().to_string(),
            source: e,
        })?;
    }
    std::fs::write(&path, render(output)).map_err(|e| OutputError::Write {
        path: path.display().to_string(),
        source: e,
    })?;
    tracing::debug!(
        path = %path.display(),
        groups = output.groups.len(),
        edges = output.edges.len(),
        "label graph written"
    );
    Ok(path)
}
