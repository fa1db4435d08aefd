//! Selection engine
//!
//! Owns the option universe (flat options or groups, plus ad hoc tags) and
//! the authoritative selection. Applies the single-select, multi-select
//! toggle, tag and max-count policies, and re-derives the selected options
//! whenever the universe changes underneath the selection.
//!
//! Nothing here fails: rejected operations return `None`/`false` and leave
//! the state untouched.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::option::{flatten, ComboOption, OptionGroup, OptionValue};
use crate::tags::{AddedOptions, TagKey};

/// Equality used to match values against each other
pub type Comparator = Arc<dyn Fn(&OptionValue, &OptionValue) -> bool + Send + Sync>;

/// Built-in comparators
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareMode {
    /// Structural equality (`Int(1) != Text("1")`)
    #[default]
    Strict,
    /// Compare textual renderings (`Int(1) == Text("1")`)
    Loose,
}

impl CompareMode {
    pub fn comparator(self) -> Comparator {
        match self {
            CompareMode::Strict => Arc::new(|a: &OptionValue, b: &OptionValue| a == b),
            CompareMode::Loose => {
                Arc::new(|a: &OptionValue, b: &OptionValue| a == b || a.to_string() == b.to_string())
            }
        }
    }
}

/// Flags that shape how selections are applied
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectionPolicy {
    pub multiple: bool,
    /// Maximum number of selected options; `Some(0)` blocks every new selection
    pub max: Option<usize>,
    pub disable_clear: bool,
}

/// Selected values and the options they resolve to
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionState {
    values: Vec<OptionValue>,
    options: Vec<ComboOption>,
}

impl SelectionState {
    pub fn values(&self) -> &[OptionValue] {
        &self.values
    }

    pub fn options(&self) -> &[ComboOption] {
        &self.options
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The selection state machine
pub struct SelectionEngine {
    options: Vec<ComboOption>,
    groups: Vec<OptionGroup>,
    added: AddedOptions,
    state: SelectionState,
    policy: SelectionPolicy,
    compare: Comparator,
}

impl fmt::Debug for SelectionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionEngine")
            .field("options", &self.options.len())
            .field("groups", &self.groups.len())
            .field("added", &self.added.len())
            .field("state", &self.state)
            .field("policy", &self.policy)
            .finish()
    }
}

impl Default for SelectionEngine {
    fn default() -> Self {
        Self::new(SelectionPolicy::default(), CompareMode::Strict.comparator())
    }
}

impl SelectionEngine {
    pub fn new(policy: SelectionPolicy, compare: Comparator) -> Self {
        Self {
            options: Vec::new(),
            groups: Vec::new(),
            added: AddedOptions::new(),
            state: SelectionState::default(),
            policy,
            compare,
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn options(&self) -> &[ComboOption] {
        &self.options
    }

    pub fn groups(&self) -> &[OptionGroup] {
        &self.groups
    }

    pub fn added(&self) -> &AddedOptions {
        &self.added
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    pub fn compare(&self, a: &OptionValue, b: &OptionValue) -> bool {
        (self.compare)(a, b)
    }

    /// Every option a selected value can resolve to
    ///
    /// Flattened groups in grouped mode, otherwise primary options followed
    /// by ad hoc tags that are not already primary options.
    pub fn universe(&self) -> Vec<&ComboOption> {
        let mut all = flatten(&self.groups, &self.options);
        if self.groups.is_empty() {
            let primary: Vec<TagKey> = self.options.iter().map(TagKey::of).collect();
            all.extend(self.added.iter().filter(|o| !primary.contains(&TagKey::of(o))));
        }
        all
    }

    pub fn is_selected(&self, value: &OptionValue) -> bool {
        self.state.values.iter().any(|v| (self.compare)(v, value))
    }

    // =========================================================================
    // UNIVERSE / POLICY UPDATES
    // =========================================================================

    pub fn set_options(&mut self, options: Vec<ComboOption>) {
        self.options = options;
        self.reconcile();
    }

    pub fn set_groups(&mut self, groups: Vec<OptionGroup>) {
        self.groups = groups;
        self.reconcile();
    }

    pub fn set_comparator(&mut self, compare: Comparator) {
        self.compare = compare;
        self.dedup_values();
        self.reconcile();
    }

    pub fn set_multiple(&mut self, multiple: bool) {
        self.policy.multiple = multiple;
        if !multiple {
            self.state.values.truncate(1);
        }
        self.reconcile();
    }

    pub fn set_max(&mut self, max: Option<usize>) {
        self.policy.max = max;
        self.reconcile();
    }

    pub fn set_disable_clear(&mut self, disable_clear: bool) {
        self.policy.disable_clear = disable_clear;
        self.reconcile();
    }

    // =========================================================================
    // SELECTION
    // =========================================================================

    /// Apply a user selection
    ///
    /// Returns the option actually applied (trimmed for ad hoc tags), or
    /// `None` when the max-count guard rejects it.
    pub fn select(&mut self, option: &ComboOption) -> Option<ComboOption> {
        if !self.is_selected(&option.value) {
            if let Some(max) = self.policy.max {
                if self.state.options.len() >= max {
                    tracing::debug!(
                        max,
                        value = %option.value,
                        "selection rejected: max count reached"
                    );
                    return None;
                }
            }
        }

        let mut option = option.clone();
        if option.is_appended() && !option.label.is_empty() && !option.value.is_empty() {
            option.label = option.label.trim().to_string();
            option.value = option.value.trimmed();
            if !option.label.is_empty() && !option.value.is_empty() && self.added.insert(&option) {
                tracing::trace!(value = %option.value, "registered ad hoc tag");
            }
        }

        if self.policy.multiple {
            self.toggle(&option);
        } else {
            self.replace(&option);
        }
        Some(option)
    }

    /// Single-select: the option becomes the whole selection
    fn replace(&mut self, option: &ComboOption) {
        let known = self
            .options
            .iter()
            .any(|o| (self.compare)(&o.value, &option.value));
        if !known && option.is_appended() {
            self.options.insert(0, option.clone());
        }
        self.state.values = vec![option.value.clone()];
        self.state.options = vec![option.clone()];
    }

    /// Multi-select: remove the option if selected, append it otherwise
    pub fn toggle(&mut self, option: &ComboOption) {
        let compare = &self.compare;
        let value_index = self
            .state
            .values
            .iter()
            .position(|v| compare(v, &option.value));

        match value_index {
            Some(j) => {
                // Values are unique under the comparator, so the first matching
                // option is the entry that belongs to values[j].
                let option_index = self
                    .state
                    .options
                    .iter()
                    .position(|o| compare(&o.value, &option.value));
                self.state.values.remove(j);
                if let Some(i) = option_index {
                    self.state.options.remove(i);
                }
            }
            None => {
                self.state.values.push(option.value.clone());
                self.state.options.push(option.clone());
            }
        }
    }

    /// Empty the selection if the policy allows it
    pub fn clear(&mut self) -> bool {
        if self.policy.multiple || self.policy.disable_clear {
            return false;
        }
        self.state = SelectionState::default();
        true
    }

    /// Overwrite the selected values wholesale and re-resolve them
    pub fn replace_values(&mut self, values: Vec<OptionValue>) {
        self.state.values = values;
        self.dedup_values();
        if !self.policy.multiple {
            self.state.values.truncate(1);
        }
        self.reconcile();
    }

    /// Re-derive selected options from selected values against the universe
    ///
    /// Values with no matching option stay selected but resolve to nothing.
    pub fn reconcile(&mut self) {
        let resolved: Vec<ComboOption> = {
            let mut resolved: Vec<&ComboOption> = Vec::new();
            for option in self.universe() {
                if self.is_selected(&option.value)
                    && !resolved
                        .iter()
                        .any(|r| (self.compare)(&r.value, &option.value))
                {
                    resolved.push(option);
                }
            }
            resolved.into_iter().cloned().collect()
        };

        let unresolved = self.state.values.len().saturating_sub(resolved.len());
        if unresolved > 0 {
            tracing::trace!(unresolved, "selected values without a matching option");
        }
        self.state.options = resolved;
    }

    fn dedup_values(&mut self) {
        let compare = &self.compare;
        let mut unique: Vec<OptionValue> = Vec::with_capacity(self.state.values.len());
        for value in self.state.values.drain(..) {
            if !unique.iter().any(|u| compare(u, &value)) {
                unique.push(value);
            }
        }
        self.state.values = unique;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers() -> Vec<ComboOption> {
        (1..=6i64)
            .map(|n| ComboOption::new(n, format!("Option {}", n)))
            .collect()
    }

    fn make_engine(multiple: bool, max: Option<usize>) -> SelectionEngine {
        let mut engine = SelectionEngine::new(
            SelectionPolicy {
                multiple,
                max,
                disable_clear: false,
            },
            CompareMode::Strict.comparator(),
        );
        engine.set_options(numbers());
        engine
    }

    fn assert_consistent(engine: &SelectionEngine) {
        let state = engine.state();
        for option in state.options() {
            assert!(engine.is_selected(&option.value));
        }
        assert!(state.options().len() <= state.values().len());
    }

    #[test]
    fn test_single_select_replaces() {
        let mut engine = make_engine(false, None);
        let a = ComboOption::new(1i64, "Option 1");
        let b = ComboOption::new(2i64, "Option 2");
        engine.select(&a);
        engine.select(&b);
        assert_eq!(engine.state().options(), &[b.clone()]);
        assert_eq!(engine.state().values(), &[OptionValue::Int(2)]);
        assert_consistent(&engine);
    }

    #[test]
    fn test_multi_toggle_twice_restores() {
        let mut engine = make_engine(true, None);
        let opts = numbers();
        engine.select(&opts[0]);
        engine.select(&opts[2]);
        let before = engine.state().clone();

        engine.select(&opts[1]);
        assert_eq!(engine.state().values().len(), 3);
        engine.select(&opts[1]);
        assert_eq!(engine.state(), &before);
        assert_consistent(&engine);
    }

    #[test]
    fn test_max_count_rejects_new_selection() {
        let mut engine = make_engine(true, Some(2));
        let opts = numbers();
        assert!(engine.select(&opts[0]).is_some());
        assert!(engine.select(&opts[1]).is_some());
        let before = engine.state().clone();

        assert!(engine.select(&opts[2]).is_none());
        assert_eq!(engine.state(), &before);

        // Deselecting an existing entry is still allowed at the limit
        assert!(engine.select(&opts[0]).is_some());
        assert_eq!(engine.state().values(), &[OptionValue::Int(2)]);
    }

    #[test]
    fn test_max_zero_blocks_everything() {
        let mut engine = make_engine(false, Some(0));
        assert!(engine.select(&numbers()[0]).is_none());
        assert!(engine.state().is_empty());
    }

    #[test]
    fn test_tag_merge_trims_and_dedups() {
        let mut engine = make_engine(true, None);
        let tag = ComboOption::appended(" x ", " X ");
        let applied = engine.select(&tag).unwrap();
        assert_eq!(applied.label, "X");
        assert_eq!(applied.value, OptionValue::from("x"));

        engine.select(&tag);
        assert_eq!(engine.added().len(), 1);
        let stored = engine.added().iter().next().unwrap();
        assert_eq!(stored.label, "X");
        assert_eq!(stored.value, OptionValue::from("x"));
    }

    #[test]
    fn test_single_select_prepends_new_tag() {
        let mut engine = make_engine(false, None);
        engine.select(&ComboOption::appended("kiwi", "Kiwi"));
        assert_eq!(engine.options()[0].label, "Kiwi");
        assert_eq!(engine.options().len(), 7);

        // Selecting it again does not prepend twice
        engine.select(&ComboOption::appended("kiwi", "Kiwi"));
        assert_eq!(engine.options().len(), 7);
    }

    #[test]
    fn test_reconcile_keeps_orphaned_values() {
        let mut engine = make_engine(false, None);
        engine.select(&ComboOption::new(5i64, "Option 5"));
        engine.set_options(numbers().into_iter().filter(|o| o.value != OptionValue::Int(5)).collect());
        assert_eq!(engine.state().values(), &[OptionValue::Int(5)]);
        assert!(engine.state().options().is_empty());

        // Value resolves again once the option comes back
        engine.set_options(numbers());
        assert_eq!(engine.state().options().len(), 1);
    }

    #[test]
    fn test_reconcile_against_groups() {
        let mut engine = make_engine(true, None);
        engine.replace_values(vec![OptionValue::Int(2), OptionValue::from("z")]);
        engine.set_groups(vec![
            OptionGroup::new("g", "Group").option(ComboOption::new("z", "Zed")),
        ]);
        let labels: Vec<_> = engine.state().options().iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["Zed"]);

        engine.set_groups(Vec::new());
        assert_eq!(engine.state().options()[0].label, "Option 2");
    }

    #[test]
    fn test_replace_values_dedups_and_truncates_single() {
        let mut engine = make_engine(true, None);
        engine.replace_values(vec![OptionValue::Int(1), OptionValue::Int(1), OptionValue::Int(3)]);
        assert_eq!(engine.state().values(), &[OptionValue::Int(1), OptionValue::Int(3)]);
        assert_eq!(engine.state().options().len(), 2);

        engine.set_multiple(false);
        assert_eq!(engine.state().values(), &[OptionValue::Int(1)]);
        assert_consistent(&engine);
    }

    #[test]
    fn test_clear_policy() {
        let mut engine = make_engine(true, None);
        engine.select(&numbers()[0]);
        assert!(!engine.clear());
        assert_eq!(engine.state().values().len(), 1);

        let mut engine = make_engine(false, None);
        engine.select(&numbers()[0]);
        assert!(engine.clear());
        assert!(engine.state().is_empty());

        engine.set_disable_clear(true);
        engine.select(&numbers()[0]);
        assert!(!engine.clear());
    }

    #[test]
    fn test_loose_comparator() {
        let mut engine = make_engine(true, None);
        engine.set_comparator(CompareMode::Loose.comparator());
        engine.replace_values(vec![OptionValue::from("3")]);
        assert!(engine.is_selected(&OptionValue::Int(3)));
        assert_eq!(engine.state().options()[0].label, "Option 3");
    }

    #[test]
    fn test_tags_stay_resolvable_after_option_replacement() {
        let mut engine = make_engine(true, None);
        engine.select(&ComboOption::appended("kiwi", "Kiwi"));
        engine.set_options(Vec::new());
        assert_eq!(engine.state().options().len(), 1);
        assert_eq!(engine.state().options()[0].label, "Kiwi");
    }
}
