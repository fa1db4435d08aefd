//! Combobox configuration
//!
//! Everything the option-data owner can set on a widget, loadable from TOML:
//!
//! ```toml
//! id = "country"
//! multiple = true
//! max = 2
//! taggable = true
//! comparator = "loose"
//!
//! [[options]]
//! value = "us"
//! label = "United States"
//!
//! [[groups]]
//! label = "Europe"
//! value = "eu"
//! options = [{ value = "de", label = "Germany" }]
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::option::{ComboOption, OptionGroup};
use crate::selection::{CompareMode, SelectionPolicy};

/// Configuration of one combobox instance
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboboxConfig {
    /// Instance identifier (generated when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub multiple: bool,
    /// Maximum number of selections; absent means unbounded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<usize>,
    /// Allow creating options from typed text
    pub taggable: bool,
    pub disable_clear: bool,
    pub placeholder: String,
    /// Presentation hint: do not render selected options as tags
    pub hide_tags: bool,
    pub comparator: CompareMode,
    pub options: Vec<ComboOption>,
    pub groups: Vec<OptionGroup>,
}

fn default_placeholder() -> String {
    "Search...".to_string()
}

impl Default for ComboboxConfig {
    fn default() -> Self {
        Self {
            id: None,
            multiple: false,
            max: None,
            taggable: false,
            disable_clear: false,
            placeholder: default_placeholder(),
            hide_tags: false,
            comparator: CompareMode::default(),
            options: Vec::new(),
            groups: Vec::new(),
        }
    }
}

impl ComboboxConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            options = config.options.len(),
            groups = config.groups.len(),
            "loaded combobox config"
        );
        Ok(config)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn policy(&self) -> SelectionPolicy {
        SelectionPolicy {
            multiple: self.multiple,
            max: self.max,
            disable_clear: self.disable_clear,
        }
    }
}
