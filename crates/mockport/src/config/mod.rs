//! Configuration types for mockport.

mod listen;
mod projects;

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub use listen::{ListenConfig, MetricsConfig, RecorderConfig};
pub use projects::{
    convert_project, load_project_file, load_projects, ApplicationDto, HeaderDto, MethodDto,
    MockResponseDto, OperationDto, PortDto, ProjectEntities, ProjectFile, ResourceDto,
    SettingsDto, SoapResourceDto,
};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub listen: ListenConfig,
    /// Prefix of every mock URL, e.g. `/mockport`. Empty by default.
    #[serde(default)]
    pub context_path: String,
    #[serde(default)]
    pub recorder: RecorderConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// Project files (YAML or JSON). Relative paths resolve against the
    /// directory of the configuration file.
    #[serde(default)]
    pub projects: Vec<PathBuf>,
    /// Where WSDL and schema documents of SOAP projects are stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_directory: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let mut config: ServerConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        config.validate()?;
        Ok(config)
    }

    /// Resolve relative project and resource paths against `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for project in &mut self.projects {
            if project.is_relative() {
                *project = base.join(&*project);
            }
        }
        if let Some(dir) = self.resource_directory.as_mut() {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
        if let Some(journal) = self.recorder.journal.as_mut() {
            if journal.is_relative() {
                *journal = base.join(&*journal);
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.context_path.is_empty() && !self.context_path.starts_with('/') {
            anyhow::bail!(
                "context_path '{}' must be empty or start with '/'",
                self.context_path
            );
        }
        if self.recorder.capacity == 0 {
            anyhow::bail!("recorder.capacity must be greater than zero");
        }
        if self.recorder.journal.is_some() && self.recorder.journal_buffer == 0 {
            anyhow::bail!("recorder.journal_buffer must be greater than zero");
        }
        Ok(())
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.listen.host, self.listen.port)
    }
}
