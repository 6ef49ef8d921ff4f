// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Loading and validating a configuration document from disk

use crate::{ConfigError, Document};
use std::collections::HashSet;
use std::path::Path;

/// Reads and parses the configuration document at `path`, then validates
/// document-level invariants (unique service names). Per-condition
/// invariants (e.g. watch-create-existing-file) are validated later, at
/// watcher registration, not here.
pub fn load(path: &Path) -> Result<Document, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse(&raw)
}

/// Parses a configuration document from an in-memory YAML string.
pub fn parse(raw: &str) -> Result<Document, ConfigError> {
    let document: Document = serde_yaml::from_str(raw)?;
    validate(&document)?;
    Ok(document)
}

fn validate(document: &Document) -> Result<(), ConfigError> {
    let mut seen = HashSet::with_capacity(document.services.len());
    for service in &document.services {
        if !seen.insert(service.name.as_str()) {
            return Err(ConfigError::DuplicateServiceName(service.name.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
