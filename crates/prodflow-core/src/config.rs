use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(rename = "type", default = "default_project_type")]
    pub project_type: String,
}

fn default_project_type() -> String {
    "app".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SprintsConfig {
    #[serde(default = "default_current_sprint")]
    pub current: u32,
}

fn default_current_sprint() -> u32 {
    1
}

impl Default for SprintsConfig {
    fn default() -> Self {
        Self {
            current: default_current_sprint(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestingConfig {
    #[serde(default = "default_min_coverage")]
    pub min_coverage: u32,
}

fn default_min_coverage() -> u32 {
    80
}

impl Default for TestingConfig {
    fn default() -> Self {
        Self {
            min_coverage: default_min_coverage(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevelopmentConfig {
    #[serde(default)]
    pub auto_push: bool,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub project: ProjectConfig,
    #[serde(default)]
    pub sprints: SprintsConfig,
    #[serde(default)]
    pub testing: TestingConfig,
    #[serde(default)]
    pub development: DevelopmentConfig,
}

impl Config {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project: ProjectConfig {
                name: project_name.into(),
                project_type: default_project_type(),
            },
            sprints: SprintsConfig::default(),
            testing: TestingConfig::default(),
            development: DevelopmentConfig::default(),
        }
    }

    /// Load from `.prodflow/config.yaml`. A missing file yields defaults
    /// with the project named after the root directory.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            let name = root
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "project".to_string());
            return Ok(Config::new(name));
        }
        let data = std::fs::read_to_string(&path)?;
        let config: Config = serde_yaml::from_str(&data)?;
        Ok(config)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        if self.project.name.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "project.name is empty".to_string(),
            });
        }
        if self.testing.min_coverage > 100 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "testing.min_coverage is {}%, expected at most 100",
                    self.testing.min_coverage
                ),
            });
        }
        if self.sprints.current == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "sprints.current must be at least 1".to_string(),
            });
        }
        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
