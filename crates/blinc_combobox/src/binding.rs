//! Binding adapter
//!
//! Translates the engine's selection into the value a host form binds to,
//! keeps the text shown in the input in sync with the selection, and fans
//! out change notifications.
//!
//! # Example
//!
//! ```rust
//! use blinc_combobox::binding::BoundValue;
//! use blinc_combobox::option::OptionValue;
//!
//! let raw = serde_json::json!(["de", 7, {"bogus": true}]);
//! assert_eq!(
//!     BoundValue::from_json(raw),
//!     BoundValue::Sequence(vec![OptionValue::from("de"), OptionValue::Int(7)]),
//! );
//! ```

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::option::{ComboOption, OptionValue};
use crate::selection::SelectionState;

/// Value exchanged with the host form layer
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundValue {
    Scalar(OptionValue),
    Sequence(Vec<OptionValue>),
    #[default]
    Empty,
}

impl BoundValue {
    /// Outbound value for a selection
    ///
    /// Single-select binds the first value (or nothing), multi-select binds
    /// the whole ordered sequence.
    pub fn from_selection(values: &[OptionValue], multiple: bool) -> Self {
        if multiple {
            BoundValue::Sequence(values.to_vec())
        } else {
            values
                .first()
                .cloned()
                .map(BoundValue::Scalar)
                .unwrap_or(BoundValue::Empty)
        }
    }

    /// Decode an untyped value, degrading unexpected shapes to `Empty`
    pub fn from_json(value: JsonValue) -> Self {
        match value {
            JsonValue::Array(items) => {
                let values = items
                    .into_iter()
                    .filter_map(|item| {
                        let scalar = json_scalar(&item);
                        if scalar.is_none() {
                            tracing::warn!(%item, "ignoring malformed element in bound value");
                        }
                        scalar
                    })
                    .collect();
                BoundValue::Sequence(values)
            }
            JsonValue::Null => BoundValue::Empty,
            JsonValue::String(ref s) if s.is_empty() => BoundValue::Empty,
            other => match json_scalar(&other) {
                Some(scalar) => BoundValue::Scalar(scalar),
                None => {
                    tracing::warn!(value = %other, "malformed bound value treated as empty");
                    BoundValue::Empty
                }
            },
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            BoundValue::Scalar(value) => scalar_json(value),
            BoundValue::Sequence(values) => JsonValue::Array(values.iter().map(scalar_json).collect()),
            BoundValue::Empty => JsonValue::String(String::new()),
        }
    }

    /// Selected values this bound value stands for
    pub fn into_values(self) -> Vec<OptionValue> {
        match self {
            BoundValue::Scalar(value) => vec![value],
            BoundValue::Sequence(values) => values,
            BoundValue::Empty => Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            BoundValue::Scalar(_) => false,
            BoundValue::Sequence(values) => values.is_empty(),
            BoundValue::Empty => true,
        }
    }
}

fn json_scalar(value: &JsonValue) -> Option<OptionValue> {
    match value {
        JsonValue::String(s) => Some(OptionValue::Text(s.clone())),
        JsonValue::Bool(b) => Some(OptionValue::Bool(*b)),
        JsonValue::Number(n) => n.as_i64().map(OptionValue::Int),
        _ => None,
    }
}

fn scalar_json(value: &OptionValue) -> JsonValue {
    match value {
        OptionValue::Text(s) => JsonValue::String(s.clone()),
        OptionValue::Int(n) => JsonValue::from(*n),
        OptionValue::Bool(b) => JsonValue::Bool(*b),
    }
}

/// Payload of a selection-change notification
///
/// `selected` is the option that triggered the change; bulk clears leave it
/// unset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectChange {
    pub selected_options: Vec<ComboOption>,
    pub selected: Option<ComboOption>,
}

pub type ChangeCallback = Arc<dyn Fn(&BoundValue) + Send + Sync>;
pub type TouchedCallback = Arc<dyn Fn() + Send + Sync>;
pub type SelectChangeCallback = Arc<dyn Fn(&SelectChange) + Send + Sync>;

thread_local! {
    /// Adapters whose notifications are running on this thread
    static EMITTING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Whether the adapter identified by `key` is notifying on this thread
///
/// True only inside that adapter's own callbacks, where its widget is
/// already locked by the caller.
pub(crate) fn is_emitting(key: usize) -> bool {
    EMITTING.with(|emitting| emitting.borrow().contains(&key))
}

/// Marks an adapter as notifying until dropped
struct EmitScope {
    key: usize,
}

impl EmitScope {
    fn enter(key: usize) -> Self {
        EMITTING.with(|emitting| emitting.borrow_mut().push(key));
        Self { key }
    }
}

impl Drop for EmitScope {
    fn drop(&mut self) {
        EMITTING.with(|emitting| {
            let mut emitting = emitting.borrow_mut();
            if let Some(index) = emitting.iter().rposition(|&k| k == self.key) {
                emitting.remove(index);
            }
        });
    }
}

/// The narrow contract a host form layer talks to
pub trait ValueAccessor {
    /// Push a value into the widget (programmatic write)
    fn write_value(&mut self, value: BoundValue);

    /// Callback receiving every value the widget produces
    fn register_on_change(&mut self, callback: ChangeCallback);

    /// Callback fired when the widget loses focus
    fn register_on_touched(&mut self, callback: TouchedCallback);

    fn set_disabled(&mut self, disabled: bool);
}

/// Display text, disabled flag and outward notifications of one widget
#[derive(Default)]
pub struct BindingAdapter {
    display_text: String,
    disabled: bool,
    on_change: Option<ChangeCallback>,
    on_touched: Option<TouchedCallback>,
    select_listeners: Vec<SelectChangeCallback>,
}

impl fmt::Debug for BindingAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingAdapter")
            .field("display_text", &self.display_text)
            .field("disabled", &self.disabled)
            .field("on_change", &self.on_change.is_some())
            .field("on_touched", &self.on_touched.is_some())
            .field("select_listeners", &self.select_listeners.len())
            .finish()
    }
}

impl BindingAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text currently shown in the input
    pub fn display_text(&self) -> &str {
        &self.display_text
    }

    /// Replace the input text (typing)
    pub fn set_display_text(&mut self, text: impl Into<String>) {
        self.display_text = text.into();
    }

    pub fn reset_input(&mut self) {
        self.display_text.clear();
    }

    /// Mirror the selection into the input
    ///
    /// Single-select shows the first selected label; multi-select renders
    /// selections as tags, so the input stays empty.
    pub fn refresh_label(&mut self, multiple: bool, selected_options: &[ComboOption]) {
        self.display_text = if multiple {
            String::new()
        } else {
            selected_options
                .first()
                .map(|o| o.label.clone())
                .unwrap_or_default()
        };
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn register_on_change(&mut self, callback: ChangeCallback) {
        self.on_change = Some(callback);
    }

    pub fn register_on_touched(&mut self, callback: TouchedCallback) {
        self.on_touched = Some(callback);
    }

    pub fn add_select_listener(&mut self, listener: SelectChangeCallback) {
        self.select_listeners.push(listener);
    }

    /// Identity of this adapter while it lives at a fixed address
    pub(crate) fn emit_key(&self) -> usize {
        self as *const Self as usize
    }

    /// Report a selection change to the bound value and to listeners
    pub fn emit(&self, state: &SelectionState, multiple: bool, selected: Option<ComboOption>) {
        let _scope = EmitScope::enter(self.emit_key());
        let value = BoundValue::from_selection(state.values(), multiple);
        if let Some(on_change) = &self.on_change {
            on_change(&value);
        }

        let change = SelectChange {
            selected_options: state.options().to_vec(),
            selected,
        };
        for listener in &self.select_listeners {
            listener(&change);
        }
    }

    pub fn emit_touched(&self) {
        let _scope = EmitScope::enter(self.emit_key());
        if let Some(on_touched) = &self.on_touched {
            on_touched();
        }
    }
}
