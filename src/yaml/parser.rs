//! YAML parsing with error handling

use std::path::Path;

use serde::de::DeserializeOwned;
use serde_yml::Value;

use crate::yaml::diagnostics::{YamlError, YamlSyntaxError};

/// Parse YAML content into a typed value with nice error messages
pub fn parse_yaml<T: DeserializeOwned>(content: &str, filename: &str) -> Result<T, YamlError> {
    serde_yml::from_str(content).map_err(|e| {
        YamlError::Syntax(YamlSyntaxError::from_serde_error(&e, content, filename))
    })
}

/// Read one layer of a layered document
///
/// The raw value is returned for merging. When it is a mapping it must also
/// deserialize as `T` on its own, so type errors point into this file rather
/// than into the merged result.
pub fn read_layer<T: DeserializeOwned>(path: &Path) -> Result<Value, YamlError> {
    let content = std::fs::read_to_string(path)?;
    let filename = path.display().to_string();

    let value: Value = parse_yaml(&content, &filename)?;
    if value.is_mapping() {
        parse_yaml::<T>(&content, &filename)?;
    }
    Ok(value)
}
