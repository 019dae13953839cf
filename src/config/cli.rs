//! Command-line configuration. Flags mirror the options a `pack.toml` can
//! supply; on merge, explicit flags win over the file, and built-in defaults
//! fill whatever is left.

use crate::config::toml_config::PackTomlConfig;
use crate::core::contract::validate_contract;
use crate::domain::model::{Contract, StackPreset};
use crate::utils::error::{PackError, Result};
use crate::utils::validation::{validate_group_id, validate_non_empty_string, validate_path};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "draftpack")]
#[command(about = "Packages free-form model-generated code drafts into runnable project archives")]
pub struct PackArgs {
    /// Task description text (alternative to --task-file)
    #[arg(long)]
    pub task: Option<String>,

    /// File containing the task description
    #[arg(long)]
    pub task_file: Option<String>,

    /// File containing the raw front-end draft
    #[arg(long)]
    pub front_file: Option<String>,

    /// File containing the raw back-end draft
    #[arg(long)]
    pub back_file: Option<String>,

    /// File containing the raw QA draft
    #[arg(long)]
    pub qa_file: Option<String>,

    /// Requested implementation language, used for stack detection
    #[arg(long)]
    pub language: Option<String>,

    /// Target stack: flask, express or spring. Omit for flat packaging
    #[arg(long)]
    pub preset: Option<String>,

    /// Project name used in the generated scaffolding
    #[arg(long)]
    pub project_name: Option<String>,

    /// Dotted group identifier for the Spring package tree
    #[arg(long)]
    pub group_id: Option<String>,

    /// JSON file with a pre-parsed API contract
    #[arg(long)]
    pub contract_file: Option<String>,

    /// TOML config file supplying any of the above options
    #[arg(long)]
    pub config: Option<String>,

    /// Directory the archive is written to
    #[arg(long)]
    pub output_dir: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

/// Fully resolved inputs for one packaging run: blobs loaded, contract
/// parsed, defaults applied.
#[derive(Debug, Clone)]
pub struct PackSettings {
    pub task: String,
    pub language: String,
    pub front: String,
    pub back: String,
    pub qa: String,
    pub preset: Option<StackPreset>,
    pub project_name: String,
    pub group_id: String,
    pub contract: Option<Contract>,
    pub output_dir: String,
}

impl PackArgs {
    /// Merges flags with an optional file config (flags win), loads the
    /// referenced input files, and validates the result up front.
    pub fn resolve(self, file: Option<PackTomlConfig>) -> Result<PackSettings> {
        let file = file.unwrap_or_default();
        let file_inputs = file.inputs.clone().unwrap_or_default();

        let task = match (self.task, self.task_file.or(file_inputs.task_file)) {
            (Some(task), _) => task,
            (None, Some(path)) => read_input("task_file", &path)?,
            (None, None) => file_inputs.task.unwrap_or_default(),
        };
        validate_non_empty_string("task", &task)?;

        let front = read_optional(self.front_file.or(file_inputs.front_file))?;
        let back = read_optional(self.back_file.or(file_inputs.back_file))?;
        let qa = read_optional(self.qa_file.or(file_inputs.qa_file))?;

        let preset = match self
            .preset
            .as_deref()
            .or_else(|| file.preset())
        {
            Some(name) => Some(StackPreset::parse(name).ok_or_else(|| PackError::ConfigError {
                message: format!(
                    "Unknown preset '{}'. Valid presets: flask, express, spring",
                    name
                ),
            })?),
            None => None,
        };

        let project_name = self
            .project_name
            .or_else(|| file.project_name().map(str::to_string))
            .unwrap_or_else(|| "project".to_string());
        let group_id = self
            .group_id
            .or_else(|| file.group_id().map(str::to_string))
            .unwrap_or_else(|| "com.example".to_string());
        validate_group_id("group_id", &group_id)?;

        let language = self
            .language
            .or_else(|| file.language().map(str::to_string))
            .unwrap_or_default();

        let output_dir = self
            .output_dir
            .or_else(|| file.output_dir().map(str::to_string))
            .unwrap_or_else(|| "./output".to_string());
        validate_path("output_dir", &output_dir)?;

        let contract = match self
            .contract_file
            .or(file_inputs.contract_file)
        {
            Some(path) => Some(load_contract_file(&path)?),
            None => None,
        };

        Ok(PackSettings {
            task,
            language,
            front,
            back,
            qa,
            preset,
            project_name,
            group_id,
            contract,
            output_dir,
        })
    }
}

fn read_input(field: &str, path: &str) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| PackError::ConfigError {
        message: format!("Could not read {} '{}': {}", field, path, e),
    })
}

fn read_optional(path: Option<String>) -> Result<String> {
    match path {
        Some(path) => read_input("input file", &path),
        None => Ok(String::new()),
    }
}

/// An explicitly supplied contract file must be well-formed; unlike contract
/// blocks found inside drafts, it is not silently skipped.
fn load_contract_file(path: &str) -> Result<Contract> {
    let content = read_input("contract_file", path)?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    validate_contract(&value)?;
    let mut contract: Contract = serde_json::from_value(value)?;
    contract.normalize();
    Ok(contract)
}
