//! Per-instance filter properties, loaded from TOML or built programmatically.
//!
//! # TOML Format
//! ```toml
//! framework = "nfm"
//! model_files = ["./models/mobilenet.nfm"]
//!
//! [[input_info]]
//! name = "input"
//! type = "uint8"
//! dims = "3:224:224:1"
//!
//! [[output_info]]
//! type = "float32"
//! dims = "1001:1"
//! ```

use std::path::{Path, PathBuf};

use nf_tensor::TensorsInfo;
use serde::{Deserialize, Serialize};

use crate::error::{FilterError, Result};

/// Properties the pipeline hands to a filter when configuring it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterProperties {
    /// Name of the framework to instantiate from the registry.
    #[serde(default = "default_framework")]
    pub framework: String,
    /// Model files; only the first is used.
    #[serde(default)]
    pub model_files: Vec<PathBuf>,
    /// Declared input schema.
    #[serde(default)]
    pub input_info: TensorsInfo,
    /// Declared output schema.
    #[serde(default)]
    pub output_info: TensorsInfo,
}

fn default_framework() -> String {
    crate::filter::FRAMEWORK_NAME.to_string()
}

impl Default for FilterProperties {
    fn default() -> Self {
        Self {
            framework: default_framework(),
            model_files: Vec::new(),
            input_info: TensorsInfo::new(),
            output_info: TensorsInfo::new(),
        }
    }
}

impl FilterProperties {
    /// Properties for a single model with the given declared schemas.
    pub fn new(model: impl Into<PathBuf>, input_info: TensorsInfo, output_info: TensorsInfo) -> Self {
        Self {
            framework: default_framework(),
            model_files: vec![model.into()],
            input_info,
            output_info,
        }
    }

    /// Loads properties from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FilterError::Config(format!("cannot read properties '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses properties from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| FilterError::Config(format!("TOML parse error: {e}")))
    }

    /// Serialises properties to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| FilterError::Config(format!("TOML serialise error: {e}")))
    }

    /// The model file that will be loaded.
    pub fn first_model(&self) -> Option<&Path> {
        self.model_files.first().map(PathBuf::as_path)
    }

    /// Checks that at least one model is given and that every model file exists.
    pub fn verify_model_files(&self) -> Result<()> {
        if self.model_files.is_empty() {
            return Err(FilterError::NoModel);
        }
        match self.model_files.iter().find(|p| !p.is_file()) {
            Some(missing) => Err(FilterError::ModelNotFound(missing.clone())),
            None => Ok(()),
        }
    }
}
