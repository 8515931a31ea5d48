//! Reading structure literals and operation scripts from disk.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::application::{ApplicationResult, PathContextExt};

/// Read a JSON structure literal.
#[instrument(level = "debug")]
pub fn load_literal(path: &Path) -> ApplicationResult<Value> {
    let content = fs::read_to_string(path).with_path_context("read structure", path)?;
    let value: Value = serde_json::from_str(&content).with_path_context("parse structure", path)?;
    debug!("loaded structure literal ({} bytes)", content.len());
    Ok(value)
}

/// Read a JSON-lines operation script.
#[instrument(level = "debug")]
pub fn load_script(path: &Path) -> ApplicationResult<String> {
    fs::read_to_string(path).with_path_context("read script", path)
}
