//! Content record loading.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::builder::BuildError;

/// Read and parse the JSON content record.
///
/// Called on every render; nothing is cached between invocations.
pub fn load_content(path: &Path) -> Result<Value, BuildError> {
    let source = fs::read_to_string(path).map_err(|e| BuildError::read(path, e))?;

    serde_json::from_str(&source).map_err(|e| BuildError::DataError {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
