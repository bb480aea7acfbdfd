use boxgen_schema::{Partition, PartitionName};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Name of the optional configuration file looked up at the workspace root.
pub const CONFIG_FILE_NAME: &str = "boxgen.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
}

/// Naming conventions for manifest discovery and generated artifacts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct GeneratorConfig {
    /// Glob matched against file names during discovery.
    pub manifest_pattern: String,
    /// File name of the manifest rendered through the main-box template.
    pub main_manifest: String,
    pub common_artifact: String,
    pub partition_artifact_prefix: String,
    pub partition_artifact_extension: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            manifest_pattern: "box_*.xml".to_owned(),
            main_manifest: "box_main.xml".to_owned(),
            common_artifact: "partition_common.inc".to_owned(),
            partition_artifact_prefix: "partition_description_".to_owned(),
            partition_artifact_extension: "inc".to_owned(),
        }
    }
}

impl GeneratorConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load `boxgen.toml` from the workspace root, or fall back to defaults.
    pub fn load_or_default(workspace: &Path) -> Result<Self, ConfigError> {
        let path = workspace.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("manifest_pattern", &self.manifest_pattern),
            ("main_manifest", &self.main_manifest),
            ("common_artifact", &self.common_artifact),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Empty { field });
            }
        }
        Ok(())
    }

    /// File name of the per-partition artifact, e.g. `partition_description_box_led1.inc`.
    pub fn partition_artifact_name(&self, name: &PartitionName) -> String {
        if self.partition_artifact_extension.is_empty() {
            format!("{}{name}", self.partition_artifact_prefix)
        } else {
            format!(
                "{}{name}.{}",
                self.partition_artifact_prefix, self.partition_artifact_extension
            )
        }
    }

    pub fn is_main_manifest(&self, partition: &Partition) -> bool {
        partition.manifest_file_name() == Some(self.main_manifest.as_str())
    }
}
