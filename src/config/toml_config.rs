//! TOML file configuration for the CLI. Any option the flags accept can be
//! supplied from a `pack.toml` instead; explicit flags win on merge.

use crate::domain::model::StackPreset;
use crate::utils::error::{PackError, Result};
use crate::utils::validation::{validate_group_id, validate_path, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackTomlConfig {
    pub project: Option<ProjectSection>,
    pub inputs: Option<InputsSection>,
    pub output: Option<OutputSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectSection {
    pub name: Option<String>,
    pub group_id: Option<String>,
    pub preset: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputsSection {
    pub task: Option<String>,
    pub task_file: Option<String>,
    pub front_file: Option<String>,
    pub back_file: Option<String>,
    pub qa_file: Option<String>,
    pub contract_file: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSection {
    pub dir: Option<String>,
}

impl PackTomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PackError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);
        let config: Self = toml::from_str(&processed)?;
        config.validate()?;
        Ok(config)
    }

    /// Replaces `${VAR_NAME}` placeholders with environment values; unknown
    /// variables are left as-is.
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();
        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn project_name(&self) -> Option<&str> {
        self.project.as_ref()?.name.as_deref()
    }

    pub fn group_id(&self) -> Option<&str> {
        self.project.as_ref()?.group_id.as_deref()
    }

    pub fn preset(&self) -> Option<&str> {
        self.project.as_ref()?.preset.as_deref()
    }

    pub fn language(&self) -> Option<&str> {
        self.project.as_ref()?.language.as_deref()
    }

    pub fn output_dir(&self) -> Option<&str> {
        self.output.as_ref()?.dir.as_deref()
    }
}

impl Validate for PackTomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(preset) = self.preset() {
            if StackPreset::parse(preset).is_none() {
                return Err(PackError::ConfigError {
                    message: format!(
                        "Unknown preset '{}'. Valid presets: flask, express, spring",
                        preset
                    ),
                });
            }
        }
        if let Some(group_id) = self.group_id() {
            validate_group_id("project.group_id", group_id)?;
        }
        if let Some(dir) = self.output_dir() {
            validate_path("output.dir", dir)?;
        }
        Ok(())
    }
}
