//! Option model - values, options and groups
//!
//! Normalizes caller-supplied option data (a flat list or a list of groups)
//! into one addressable universe and defines the search key every filter
//! operation matches against.
//!
//! # Example
//!
//! ```rust
//! use blinc_combobox::option::{flatten, ComboOption, OptionGroup};
//!
//! let groups = vec![
//!     OptionGroup::new("eu", "Europe")
//!         .option(ComboOption::new("de", "Germany"))
//!         .option(ComboOption::new("fr", "France")),
//!     OptionGroup::new("na", "North America").option(ComboOption::new("us", "United States")),
//! ];
//!
//! let all = flatten(&groups, &[]);
//! assert_eq!(all.len(), 3);
//! assert_eq!(all[2].label, "United States");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator placed between value and label in a search key
///
/// Never appears in ordinary values or labels, so a query cannot match
/// across the value/label boundary.
pub const SEARCH_KEY_SEPARATOR: char = '\u{25EC}';

/// Identity of an option
///
/// Scalars only: anything that can be bound to a form field and compared.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl OptionValue {
    /// Whether this value counts as empty for tag creation
    pub fn is_empty(&self) -> bool {
        match self {
            OptionValue::Text(s) => s.is_empty(),
            OptionValue::Int(_) | OptionValue::Bool(_) => false,
        }
    }

    /// Copy with surrounding whitespace removed (text values only)
    pub fn trimmed(&self) -> Self {
        match self {
            OptionValue::Text(s) => OptionValue::Text(s.trim().to_string()),
            other => other.clone(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl Default for OptionValue {
    fn default() -> Self {
        OptionValue::Text(String::new())
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Int(n) => write!(f, "{}", n),
            OptionValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Text(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        OptionValue::Int(value as i64)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

/// Provenance tag carried by an option
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionTag {
    /// Created ad hoc from typed text rather than supplied by the caller
    Appended,
}

/// A selectable option
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComboOption {
    /// The value bound to the form field when selected
    pub value: OptionValue,
    /// The display label (shown in the input and used for filtering)
    pub label: String,
    /// Provenance tag, `Some(Appended)` for ad hoc tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<OptionTag>,
    /// Whether this option is disabled
    #[serde(default)]
    pub disabled: bool,
}

impl ComboOption {
    /// Create a new option with value and label
    pub fn new(value: impl Into<OptionValue>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            extra: None,
            disabled: false,
        }
    }

    /// Create an ad hoc tag option
    pub fn appended(value: impl Into<OptionValue>, label: impl Into<String>) -> Self {
        Self {
            extra: Some(OptionTag::Appended),
            ..Self::new(value, label)
        }
    }

    /// Mark this option as disabled
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn is_appended(&self) -> bool {
        self.extra == Some(OptionTag::Appended)
    }

    /// Lowercased `value + separator + label`
    pub fn search_key(&self) -> String {
        format!("{}{}{}", self.value, SEARCH_KEY_SEPARATOR, self.label).to_lowercase()
    }

    /// Check if this option matches an already-lowercased query
    ///
    /// The empty query matches everything.
    pub fn matches(&self, query_lower: &str) -> bool {
        self.search_key().contains(query_lower)
    }
}

/// A named bucket of options shown under one header
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionGroup {
    pub label: String,
    pub value: OptionValue,
    #[serde(default)]
    pub options: Vec<ComboOption>,
}

impl OptionGroup {
    pub fn new(value: impl Into<OptionValue>, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            options: Vec::new(),
        }
    }

    /// Add an option to this group
    pub fn option(mut self, option: ComboOption) -> Self {
        self.options.push(option);
        self
    }

    /// Copy of this group's header with a different option list
    pub fn with_options(&self, options: Vec<ComboOption>) -> Self {
        Self {
            label: self.label.clone(),
            value: self.value.clone(),
            options,
        }
    }
}

/// Flatten groups (when present) or return the flat option list
///
/// Groups fully replace the flat list as the source of truth.
pub fn flatten<'a>(groups: &'a [OptionGroup], options: &'a [ComboOption]) -> Vec<&'a ComboOption> {
    if groups.is_empty() {
        options.iter().collect()
    } else {
        groups.iter().flat_map(|g| g.options.iter()).collect()
    }
}
