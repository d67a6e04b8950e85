// src/config/validate.rs

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::errors::{Result, SupervisorError};

/// Existence + parse check for the job's configuration file.
///
/// The supervisor does not interpret the job's settings; it only guarantees
/// that the file is there and is a JSON object, so the job does not start
/// against a broken config.
pub fn check_job_config(path: &Path) -> Result<Map<String, Value>> {
    if !path.is_file() {
        return Err(SupervisorError::ConfigMissing(path.to_path_buf()));
    }

    let contents = fs::read_to_string(path).map_err(|e| SupervisorError::ConfigInvalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let value: Value =
        serde_json::from_str(&contents).map_err(|e| SupervisorError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    match value {
        Value::Object(sections) => Ok(sections),
        other => Err(SupervisorError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: format!("expected a JSON object at top level, found {}", kind_of(&other)),
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
