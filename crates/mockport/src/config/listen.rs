//! Listen, metrics and recorder configuration.

use crate::recording::{DEFAULT_CAPACITY, DEFAULT_JOURNAL_BUFFER};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecorderConfig {
    /// Number of invocations kept in memory.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Optional JSON-lines file every invocation is appended to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<PathBuf>,
    #[serde(default = "default_journal_buffer")]
    pub journal_buffer: usize,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_journal_buffer() -> usize {
    DEFAULT_JOURNAL_BUFFER
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            journal: None,
            journal_buffer: default_journal_buffer(),
        }
    }
}
