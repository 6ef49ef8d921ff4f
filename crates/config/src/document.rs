// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The configuration document shape: one `services` list, each binding a
//! single condition descriptor to a single executor descriptor.

use serde::Deserialize;
use std::collections::HashMap;

/// The top-level configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub services: Vec<ServiceDef>,
}

/// A named pairing of one condition with one executor. The name is used
/// only for labelling logs and jobs — it must be unique within the
/// document, but nothing else depends on it.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceDef {
    pub name: String,
    pub condition: ConditionSpec,
    pub execute: ExecutorSpec,
}

/// A condition descriptor. Parsed as an adjacently-tagged enum mirroring
/// the document's `type` / `config` key pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "config", rename_all = "lowercase")]
pub enum ConditionSpec {
    Cron(CronConfig),
    File(FileConfig),
    Process(ProcessConfig),
}

/// An executor descriptor, tagged the same way as [`ConditionSpec`].
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "config", rename_all = "lowercase")]
pub enum ExecutorSpec {
    Shell(ShellConfig),
    Http(HttpConfig),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CronConfig {
    /// A six-field, seconds-resolution cron expression.
    pub schedule: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOperationSpec {
    Create,
    Update,
    Remove,
    Rename,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileConfig {
    pub path: String,
    pub operation: FileOperationSpec,
    #[serde(default)]
    pub recursive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStateSpec {
    Open,
    Close,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessConfig {
    pub executable: String,
    pub state: ProcessStateSpec,
}

fn default_shell_timeout() -> u64 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShellConfig {
    pub command: String,
    #[serde(default)]
    pub shell: Option<String>,
    #[serde(default = "default_shell_timeout")]
    pub timeout: u64,
    #[serde(default)]
    pub log: bool,
}

fn default_http_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub url: String,
    pub method: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default = "default_http_timeout")]
    pub timeout: u64,
    #[serde(default)]
    pub log: bool,
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
