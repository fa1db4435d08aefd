//! Combobox - searchable, optionally multi-value, optionally grouped input
//!
//! One `Combobox` owns the complete interaction state of a widget instance:
//! the option universe and selection ([`SelectionEngine`]), the visible set
//! ([`FilterResult`]), the keyboard highlight ([`Navigator`]) and the bound
//! value / display text ([`BindingAdapter`]). The presentation layer forwards
//! normalized intents (typing, clicks, keys, open/close) and renders what the
//! read accessors report.
//!
//! Every operation runs to completion synchronously; reads made right after
//! an operation observe its full effect.
//!
//! # Example
//!
//! ```rust
//! use blinc_combobox::prelude::*;
//!
//! let mut combobox = Combobox::new(ComboboxId::from("country"))
//!     .with_options(vec![
//!         ComboOption::new("us", "United States"),
//!         ComboOption::new("uk", "United Kingdom"),
//!         ComboOption::new("de", "Germany"),
//!     ]);
//!
//! combobox.open();
//! combobox.input("united");
//! assert_eq!(combobox.visible().len(), 2);
//!
//! combobox.navigate(NavIntent::Next);
//! combobox.navigate(NavIntent::Confirm);
//! assert_eq!(combobox.value(), BoundValue::Scalar("us".into()));
//! assert_eq!(combobox.display_text(), "United States");
//! ```

use crate::binding::{
    BindingAdapter, BoundValue, ChangeCallback, SelectChange, SelectChangeCallback,
    TouchedCallback, ValueAccessor,
};
use crate::config::ComboboxConfig;
use crate::filter::{filter_options, unfiltered, FilterResult};
use crate::id::ComboboxId;
use crate::navigation::{HighlightState, NavIntent, Navigator};
use crate::option::{ComboOption, OptionGroup, OptionValue};
use crate::selection::{Comparator, SelectionEngine, SelectionPolicy, SelectionState};
use crate::tags::AddedOptions;

/// State engine of one combobox widget
#[derive(Debug)]
pub struct Combobox {
    id: ComboboxId,
    engine: SelectionEngine,
    binding: BindingAdapter,
    navigator: Navigator,
    visible: FilterResult,
    /// Text the visible set was last filtered by
    query: String,
    open: bool,
    taggable: bool,
    placeholder: String,
    hide_tags: bool,
    focus_requested: bool,
}

impl Combobox {
    /// Create an empty single-select combobox
    pub fn new(id: ComboboxId) -> Self {
        Self {
            id,
            engine: SelectionEngine::default(),
            binding: BindingAdapter::new(),
            navigator: Navigator::new(),
            visible: FilterResult::default(),
            query: String::new(),
            open: false,
            taggable: false,
            placeholder: "Search...".to_string(),
            hide_tags: false,
            focus_requested: false,
        }
    }

    /// Create a combobox from a full configuration
    pub fn from_config(config: ComboboxConfig) -> Self {
        let id = config
            .id
            .clone()
            .map(ComboboxId::new)
            .unwrap_or_else(ComboboxId::generate);
        let mut combobox = Self::new(id);
        combobox.engine = SelectionEngine::new(config.policy(), config.comparator.comparator());
        combobox.taggable = config.taggable;
        combobox.placeholder = config.placeholder;
        combobox.hide_tags = config.hide_tags;
        combobox.engine.set_groups(config.groups);
        combobox.engine.set_options(config.options);
        combobox.universe_changed();

        tracing::debug!(
            id = %combobox.id,
            multiple = combobox.is_multiple(),
            options = combobox.engine.universe().len(),
            "combobox created from config"
        );
        combobox
    }

    // =========================================================================
    // BUILDER
    // =========================================================================

    pub fn with_options(mut self, options: Vec<ComboOption>) -> Self {
        self.set_options(options);
        self
    }

    pub fn with_groups(mut self, groups: Vec<OptionGroup>) -> Self {
        self.set_groups(groups);
        self
    }

    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.engine.set_disable_clear(policy.disable_clear);
        self.engine.set_max(policy.max);
        self.set_multiple(policy.multiple);
        self
    }

    pub fn taggable(mut self, taggable: bool) -> Self {
        self.taggable = taggable;
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    // =========================================================================
    // READ ACCESS
    // =========================================================================

    pub fn id(&self) -> &ComboboxId {
        &self.id
    }

    pub fn placeholder_text(&self) -> &str {
        &self.placeholder
    }

    pub fn hide_tags(&self) -> bool {
        self.hide_tags
    }

    pub fn is_taggable(&self) -> bool {
        self.taggable
    }

    pub fn is_multiple(&self) -> bool {
        self.engine.policy().multiple
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.engine.policy()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_disabled(&self) -> bool {
        self.binding.is_disabled()
    }

    pub fn options(&self) -> &[ComboOption] {
        self.engine.options()
    }

    pub fn groups(&self) -> &[OptionGroup] {
        self.engine.groups()
    }

    pub fn added_options(&self) -> &AddedOptions {
        self.engine.added()
    }

    pub fn selection(&self) -> &SelectionState {
        self.engine.state()
    }

    pub fn selected_options(&self) -> &[ComboOption] {
        self.engine.state().options()
    }

    pub fn selected_values(&self) -> &[OptionValue] {
        self.engine.state().values()
    }

    pub fn is_selected(&self, value: &OptionValue) -> bool {
        self.engine.is_selected(value)
    }

    /// What the dropdown should render
    pub fn visible(&self) -> &FilterResult {
        &self.visible
    }

    pub fn highlight(&self) -> HighlightState {
        self.navigator.state()
    }

    /// Option under the keyboard highlight
    pub fn highlighted_option(&self) -> Option<&ComboOption> {
        self.navigator
            .confirm_target()
            .and_then(|i| self.visible.get(i))
    }

    /// Text shown in the input
    pub fn display_text(&self) -> &str {
        self.binding.display_text()
    }

    /// Current bound value
    pub fn value(&self) -> BoundValue {
        BoundValue::from_selection(self.selected_values(), self.is_multiple())
    }

    /// Whether `clear(true)` asked for focus since the last call
    pub fn take_focus_request(&mut self) -> bool {
        std::mem::take(&mut self.focus_requested)
    }

    /// Ad hoc option the current input would create
    ///
    /// Present only for taggable widgets with non-blank input that does not
    /// already name a visible option.
    pub fn tag_candidate(&self) -> Option<ComboOption> {
        if !self.taggable {
            return None;
        }
        let text = self.display_text().trim();
        if text.is_empty() {
            return None;
        }
        let lowered = text.to_lowercase();
        let exists = self.visible.options().iter().any(|o| {
            o.label.to_lowercase() == lowered || o.value.to_string().to_lowercase() == lowered
        });
        if exists {
            return None;
        }
        Some(ComboOption::appended(text, text))
    }

    // =========================================================================
    // OPTION DATA OWNER
    // =========================================================================

    pub fn set_options(&mut self, options: Vec<ComboOption>) {
        self.engine.set_options(options);
        self.universe_changed();
    }

    pub fn set_groups(&mut self, groups: Vec<OptionGroup>) {
        self.engine.set_groups(groups);
        self.universe_changed();
    }

    pub fn set_comparator(&mut self, compare: Comparator) {
        self.engine.set_comparator(compare);
        self.universe_changed();
    }

    pub fn set_multiple(&mut self, multiple: bool) {
        self.engine.set_multiple(multiple);
        self.universe_changed();
    }

    pub fn set_max(&mut self, max: Option<usize>) {
        self.engine.set_max(max);
        self.universe_changed();
    }

    pub fn set_disable_clear(&mut self, disable_clear: bool) {
        self.engine.set_disable_clear(disable_clear);
        self.universe_changed();
    }

    pub fn set_taggable(&mut self, taggable: bool) {
        self.taggable = taggable;
        self.universe_changed();
    }

    /// Subscribe to selection-change notifications
    pub fn on_select_change<F>(&mut self, listener: F)
    where
        F: Fn(&SelectChange) + Send + Sync + 'static,
    {
        let listener: SelectChangeCallback = std::sync::Arc::new(listener);
        self.binding.add_select_listener(listener);
    }

    // =========================================================================
    // USER INTENTS
    // =========================================================================

    /// Re-filter the visible set by `query`
    ///
    /// Read-only with respect to the selection, so it stays available while
    /// disabled.
    pub fn filter(&mut self, query: &str) {
        self.query = query.to_string();
        self.visible = filter_options(
            self.engine.groups(),
            self.engine.options(),
            self.engine.added(),
            query,
        );
        self.navigator.reset(self.visible.len());
    }

    /// Text typed into the input
    pub fn input(&mut self, text: &str) {
        if self.is_disabled() {
            tracing::debug!(id = %self.id, "input ignored: combobox disabled");
            return;
        }
        self.binding.set_display_text(text);
        self.open = true;
        self.filter(text);
    }

    /// Focus-in: show the whole universe regardless of leftover input
    pub fn open(&mut self) {
        if self.is_disabled() {
            tracing::debug!(id = %self.id, "open ignored: combobox disabled");
            return;
        }
        self.open = true;
        self.query.clear();
        self.visible = unfiltered(self.engine.groups(), self.engine.options(), self.engine.added());
        self.navigator.reset(self.visible.len());
    }

    pub fn close(&mut self) {
        self.open = false;
        self.navigator.reset(self.visible.len());
    }

    /// An option was clicked or confirmed
    pub fn select(&mut self, option: &ComboOption) {
        if self.is_disabled() {
            tracing::debug!(id = %self.id, "select ignored: combobox disabled");
            return;
        }
        let known = self.engine.options().len();
        let Some(applied) = self.engine.select(option) else {
            return;
        };
        if self.engine.options().len() != known {
            // A single-select tag joined the option list
            self.refilter();
        }
        self.refresh_label();
        self.binding
            .emit(self.engine.state(), self.is_multiple(), Some(applied));
    }

    /// A selected tag was clicked away
    ///
    /// Only ever removes: an option that is not selected is ignored.
    pub fn remove_tag(&mut self, option: &ComboOption) {
        if self.is_disabled() {
            tracing::debug!(id = %self.id, "tag removal ignored: combobox disabled");
            return;
        }
        if !self.engine.is_selected(&option.value) {
            tracing::debug!(id = %self.id, value = %option.value, "tag removal ignored: not selected");
            return;
        }
        self.engine.toggle(option);
        self.refresh_label();
        self.binding
            .emit(self.engine.state(), self.is_multiple(), Some(option.clone()));
    }

    /// Select the current tag candidate, if any
    pub fn add_tag(&mut self) -> bool {
        match self.tag_candidate() {
            Some(candidate) => {
                self.select(&candidate);
                true
            }
            None => false,
        }
    }

    /// Reset the typed text; single-select also drops the selection
    ///
    /// Multi-select and `disable_clear` widgets keep their selection.
    pub fn clear(&mut self, restore_focus: bool) {
        if self.is_disabled() {
            tracing::debug!(id = %self.id, "clear ignored: combobox disabled");
            return;
        }
        self.binding.reset_input();
        if restore_focus {
            self.focus_requested = true;
        }
        self.filter("");

        if self.engine.clear() {
            self.refresh_label();
            self.binding.emit(self.engine.state(), self.is_multiple(), None);
        }
    }

    /// Keyboard navigation over the visible set
    pub fn navigate(&mut self, intent: NavIntent) {
        if intent == NavIntent::Cancel {
            self.close();
            return;
        }
        if !self.open {
            tracing::debug!(id = %self.id, ?intent, "navigation ignored: dropdown closed");
            return;
        }

        let visible = &self.visible;
        let is_disabled = |i: usize| visible.get(i).is_some_and(|o| o.disabled);
        match intent {
            NavIntent::Next => self.navigator.move_next(is_disabled),
            NavIntent::Previous => self.navigator.move_previous(is_disabled),
            NavIntent::Confirm => {
                if let Some(option) = self.highlighted_option().cloned() {
                    self.select(&option);
                }
            }
            NavIntent::Cancel => {}
        }
    }

    /// The widget lost focus
    pub fn focus_out(&mut self) {
        // Taggable widgets keep typed text so it can still become a tag
        if !self.taggable {
            self.refresh_label();
        }
        self.binding.emit_touched();
    }

    fn refresh_label(&mut self) {
        let multiple = self.is_multiple();
        self.binding
            .refresh_label(multiple, self.engine.state().options());
    }

    /// Follow-up after the universe or policy was replaced
    fn universe_changed(&mut self) {
        self.refresh_label();
        self.refilter();
    }

    /// Recompute the visible set with the last query
    fn refilter(&mut self) {
        let query = std::mem::take(&mut self.query);
        self.filter(&query);
    }

    pub(crate) fn emit_key(&self) -> usize {
        self.binding.emit_key()
    }
}

impl ValueAccessor for Combobox {
    fn write_value(&mut self, value: BoundValue) {
        self.engine.replace_values(value.into_values());
        self.refresh_label();
    }

    fn register_on_change(&mut self, callback: ChangeCallback) {
        self.binding.register_on_change(callback);
    }

    fn register_on_touched(&mut self, callback: TouchedCallback) {
        self.binding.register_on_touched(callback);
    }

    fn set_disabled(&mut self, disabled: bool) {
        self.binding.set_disabled(disabled);
        if disabled && self.open {
            self.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn countries() -> Vec<ComboOption> {
        vec![
            ComboOption::new("us", "United States"),
            ComboOption::new("uk", "United Kingdom"),
            ComboOption::new("de", "Germany"),
        ]
    }

    fn single() -> Combobox {
        Combobox::new("single".into()).with_options(countries())
    }

    fn multi(max: Option<usize>) -> Combobox {
        Combobox::new("multi".into())
            .with_options(countries())
            .with_policy(SelectionPolicy {
                multiple: true,
                max,
                disable_clear: false,
            })
    }

    fn record_changes(combobox: &mut Combobox) -> Arc<Mutex<Vec<SelectChange>>> {
        let changes = Arc::new(Mutex::new(Vec::new()));
        let changes_clone = changes.clone();
        combobox.on_select_change(move |c| changes_clone.lock().unwrap().push(c.clone()));
        changes
    }

    fn record_values(combobox: &mut Combobox) -> Arc<Mutex<Vec<BoundValue>>> {
        let values = Arc::new(Mutex::new(Vec::new()));
        let values_clone = values.clone();
        combobox.register_on_change(Arc::new(move |v: &BoundValue| {
            values_clone.lock().unwrap().push(v.clone())
        }));
        values
    }

    fn assert_consistent(combobox: &Combobox) {
        let state = combobox.selection();
        assert!(state.options().len() <= state.values().len());
        for option in state.options() {
            assert!(combobox.is_selected(&option.value));
        }
    }

    #[test]
    fn test_single_select_replaces_and_labels() {
        let mut combobox = single();
        let values = record_values(&mut combobox);
        let opts = countries();

        combobox.select(&opts[0]);
        combobox.select(&opts[1]);

        assert_eq!(combobox.selected_options(), &[opts[1].clone()]);
        assert_eq!(combobox.display_text(), "United Kingdom");
        assert_eq!(
            values.lock().unwrap().last(),
            Some(&BoundValue::Scalar(OptionValue::from("uk")))
        );
        assert_consistent(&combobox);
    }

    #[test]
    fn test_single_reselect_still_notifies() {
        let mut combobox = single();
        let changes = record_changes(&mut combobox);
        combobox.select(&countries()[0]);
        combobox.select(&countries()[0]);
        assert_eq!(changes.lock().unwrap().len(), 2);
        assert_eq!(combobox.selected_values().len(), 1);
    }

    #[test]
    fn test_multi_toggle_pairs_and_keeps_order() {
        let mut combobox = multi(None);
        let opts = countries();
        combobox.select(&opts[0]);
        combobox.select(&opts[2]);
        combobox.select(&opts[1]);
        combobox.select(&opts[1]);

        let values: Vec<_> = combobox.selected_values().to_vec();
        assert_eq!(values, vec![OptionValue::from("us"), OptionValue::from("de")]);
        assert_eq!(combobox.display_text(), "");
        assert_eq!(
            combobox.value(),
            BoundValue::Sequence(vec![OptionValue::from("us"), OptionValue::from("de")])
        );
        assert_consistent(&combobox);

        // Interactive changes keep values and options paired by position
        let state = combobox.selection();
        assert_eq!(state.values().len(), state.options().len());
        for (value, option) in state.values().iter().zip(state.options()) {
            assert_eq!(value, &option.value);
        }
    }

    #[test]
    fn test_max_count_rejection_is_silent() {
        let mut combobox = multi(Some(2));
        let changes = record_changes(&mut combobox);
        let opts = countries();
        combobox.select(&opts[0]);
        combobox.select(&opts[1]);
        combobox.select(&opts[2]);

        assert_eq!(changes.lock().unwrap().len(), 2);
        assert_eq!(combobox.selected_values().len(), 2);
        assert!(!combobox.is_selected(&OptionValue::from("de")));
    }

    #[test]
    fn test_select_change_payload() {
        let mut combobox = multi(None);
        let changes = record_changes(&mut combobox);
        combobox.select(&countries()[2]);

        let changes = changes.lock().unwrap();
        assert_eq!(changes[0].selected.as_ref().map(|o| o.label.as_str()), Some("Germany"));
        assert_eq!(changes[0].selected_options.len(), 1);
    }

    #[test]
    fn test_clear_in_multi_keeps_selection() {
        let mut combobox = multi(None);
        let changes = record_changes(&mut combobox);
        combobox.select(&countries()[0]);
        combobox.input("ger");

        combobox.clear(true);

        assert_eq!(combobox.display_text(), "");
        assert_eq!(combobox.selected_options().len(), 1);
        assert_eq!(changes.lock().unwrap().len(), 1);
        assert!(combobox.take_focus_request());
        assert!(!combobox.take_focus_request());
    }

    #[test]
    fn test_clear_in_single_empties_selection() {
        let mut combobox = single();
        let changes = record_changes(&mut combobox);
        let values = record_values(&mut combobox);
        combobox.select(&countries()[0]);

        combobox.clear(false);

        assert!(combobox.selected_options().is_empty());
        assert!(combobox.selected_values().is_empty());
        assert_eq!(combobox.display_text(), "");
        let changes = changes.lock().unwrap();
        let last = changes.last().unwrap();
        assert!(last.selected_options.is_empty());
        assert!(last.selected.is_none());
        assert_eq!(values.lock().unwrap().last(), Some(&BoundValue::Empty));
        assert!(!combobox.take_focus_request());
    }

    #[test]
    fn test_clear_disabled_by_policy() {
        let mut combobox = single().with_policy(SelectionPolicy {
            multiple: false,
            max: None,
            disable_clear: true,
        });
        combobox.select(&countries()[0]);
        combobox.input("zzz");
        combobox.clear(false);
        assert_eq!(combobox.selected_values().len(), 1);
        assert_eq!(combobox.display_text(), "");
    }

    #[test]
    fn test_disabled_freezes_mutations_but_not_reads() {
        let mut combobox = single();
        let changes = record_changes(&mut combobox);
        combobox.select(&countries()[0]);
        combobox.set_disabled(true);

        combobox.select(&countries()[1]);
        combobox.remove_tag(&countries()[0]);
        combobox.clear(true);
        combobox.open();

        assert_eq!(changes.lock().unwrap().len(), 1);
        assert!(combobox.is_selected(&OptionValue::from("us")));
        assert!(!combobox.is_open());

        combobox.filter("king");
        assert_eq!(combobox.visible().len(), 1);

        combobox.set_disabled(false);
        combobox.select(&countries()[1]);
        assert!(combobox.is_selected(&OptionValue::from("uk")));
    }

    #[test]
    fn test_disabling_closes_dropdown_and_keeps_selection() {
        let mut combobox = single();
        combobox.select(&countries()[0]);
        combobox.open();
        combobox.set_disabled(true);
        assert!(!combobox.is_open());
        assert_eq!(combobox.selected_values().len(), 1);
    }

    #[test]
    fn test_reconciliation_on_replacement() {
        let mut combobox = Combobox::new("numbers".into()).with_options(
            (1..=6i64)
                .map(|n| ComboOption::new(n, format!("#{}", n)))
                .collect(),
        );
        combobox.select(&ComboOption::new(5i64, "#5"));
        assert_eq!(combobox.display_text(), "#5");

        combobox.set_options(
            (1..=4i64)
                .map(|n| ComboOption::new(n, format!("#{}", n)))
                .collect(),
        );
        assert_eq!(combobox.selected_values(), &[OptionValue::Int(5)]);
        assert!(combobox.selected_options().is_empty());
        assert_eq!(combobox.display_text(), "");
    }

    #[test]
    fn test_switch_to_groups_at_runtime() {
        let mut combobox = multi(None);
        combobox.write_value(BoundValue::Sequence(vec![
            OptionValue::from("us"),
            OptionValue::from("fr"),
        ]));
        assert_eq!(combobox.selected_options().len(), 1);

        combobox.set_groups(vec![
            OptionGroup::new("eu", "Europe").option(ComboOption::new("fr", "France")),
            OptionGroup::new("na", "North America").option(ComboOption::new("us", "United States")),
        ]);
        let labels: Vec<_> = combobox.selected_options().iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["France", "United States"]);

        combobox.open();
        assert!(combobox.visible().is_grouped());
        combobox.input("fra");
        match combobox.visible() {
            FilterResult::Grouped(groups) => {
                assert_eq!(groups.len(), 1);
                assert_eq!(groups[0].label, "Europe");
            }
            other => panic!("expected grouped result, got {:?}", other),
        }
    }

    #[test]
    fn test_write_value_shapes() {
        let mut combobox = single();
        combobox.write_value(BoundValue::Scalar(OptionValue::from("de")));
        assert_eq!(combobox.display_text(), "Germany");

        combobox.write_value(BoundValue::Sequence(vec![
            OptionValue::from("uk"),
            OptionValue::from("us"),
        ]));
        assert_eq!(combobox.selected_values(), &[OptionValue::from("uk")]);

        combobox.write_value(BoundValue::Empty);
        assert!(combobox.selected_values().is_empty());
        assert_eq!(combobox.display_text(), "");

        combobox.write_value(BoundValue::from_json(serde_json::json!({"not": "a value"})));
        assert!(combobox.selected_values().is_empty());
    }

    #[test]
    fn test_write_value_does_not_notify() {
        let mut combobox = single();
        let values = record_values(&mut combobox);
        combobox.write_value(BoundValue::Scalar(OptionValue::from("de")));
        assert!(values.lock().unwrap().is_empty());
    }

    #[test]
    fn test_open_ignores_leftover_query() {
        let mut combobox = single();
        combobox.input("germ");
        assert_eq!(combobox.visible().len(), 1);
        combobox.close();

        combobox.open();
        assert_eq!(combobox.visible().len(), 3);
        assert_eq!(combobox.highlight().index, None);
    }

    #[test]
    fn test_navigation_wraparound_and_confirm() {
        let mut combobox = single();
        combobox.open();

        combobox.navigate(NavIntent::Previous);
        assert_eq!(combobox.highlight().index, Some(2));
        combobox.navigate(NavIntent::Next);
        assert_eq!(combobox.highlight().index, Some(0));

        combobox.navigate(NavIntent::Next);
        combobox.navigate(NavIntent::Confirm);
        assert_eq!(combobox.selected_values(), &[OptionValue::from("uk")]);
    }

    #[test]
    fn test_navigation_resets_on_query_change() {
        let mut combobox = single();
        combobox.open();
        combobox.navigate(NavIntent::Next);
        combobox.input("u");
        assert_eq!(combobox.highlight(), HighlightState { index: None, count: 2 });
    }

    #[test]
    fn test_navigation_requires_open_dropdown() {
        let mut combobox = single();
        combobox.navigate(NavIntent::Next);
        assert_eq!(combobox.highlight().index, None);
    }

    #[test]
    fn test_cancel_closes_without_touching_selection() {
        let mut combobox = single();
        combobox.select(&countries()[2]);
        combobox.open();
        combobox.navigate(NavIntent::Next);
        combobox.navigate(NavIntent::Cancel);
        assert!(!combobox.is_open());
        assert_eq!(combobox.highlight().index, None);
        assert_eq!(combobox.selected_values(), &[OptionValue::from("de")]);
    }

    #[test]
    fn test_navigation_skips_disabled_options() {
        let mut combobox = Combobox::new("nav".into()).with_options(vec![
            ComboOption::new("a", "A"),
            ComboOption::new("b", "B").disabled(),
            ComboOption::new("c", "C"),
        ]);
        combobox.open();
        combobox.navigate(NavIntent::Next);
        combobox.navigate(NavIntent::Next);
        assert_eq!(combobox.highlighted_option().map(|o| o.label.as_str()), Some("C"));
    }

    #[test]
    fn test_tagging_flow() {
        let mut combobox = multi(None).taggable(true);
        combobox.open();
        combobox.input("  Canada ");
        let candidate = combobox.tag_candidate().unwrap();
        assert!(candidate.is_appended());

        assert!(combobox.add_tag());
        assert!(combobox.is_selected(&OptionValue::from("Canada")));
        assert_eq!(combobox.added_options().len(), 1);

        // Tag shows up like a normal option afterwards
        combobox.open();
        assert_eq!(combobox.visible().len(), 4);

        // Existing option names produce no candidate
        combobox.input("germany");
        assert!(combobox.tag_candidate().is_none());
    }

    #[test]
    fn test_tag_merge_via_widget() {
        let mut combobox = multi(None).taggable(true);
        let tag = ComboOption::appended(" x ", " X ");
        combobox.select(&tag);
        combobox.select(&tag);
        assert_eq!(combobox.added_options().len(), 1);
        let stored = combobox.added_options().iter().next().unwrap();
        assert_eq!(stored.label, "X");
        assert_eq!(stored.value, OptionValue::from("x"));
    }

    #[test]
    fn test_not_taggable_has_no_candidate() {
        let mut combobox = single();
        combobox.input("Atlantis");
        assert!(combobox.tag_candidate().is_none());
        assert!(!combobox.add_tag());
    }

    #[test]
    fn test_focus_out_restores_label_and_touches() {
        let touched = Arc::new(AtomicUsize::new(0));
        let mut combobox = single();
        let touched_clone = touched.clone();
        combobox.register_on_touched(Arc::new(move || {
            touched_clone.fetch_add(1, Ordering::SeqCst);
        }));
        combobox.select(&countries()[2]);
        combobox.input("Ger");

        combobox.focus_out();
        assert_eq!(combobox.display_text(), "Germany");
        assert_eq!(touched.load(Ordering::SeqCst), 1);

        let mut taggable = single().taggable(true);
        taggable.input("Freeform");
        taggable.focus_out();
        assert_eq!(taggable.display_text(), "Freeform");
    }

    #[test]
    fn test_remove_tag_skips_max_check() {
        let mut combobox = multi(Some(1));
        combobox.select(&countries()[0]);
        combobox.remove_tag(&countries()[0]);
        assert!(combobox.selected_values().is_empty());
    }

    #[test]
    fn test_remove_tag_never_adds_in_single_select() {
        let mut combobox = single();
        let changes = record_changes(&mut combobox);
        combobox.select(&countries()[0]);
        combobox.remove_tag(&countries()[1]);

        assert_eq!(combobox.selected_values(), &[OptionValue::from("us")]);
        assert_eq!(changes.lock().unwrap().len(), 1);
        assert_consistent(&combobox);
    }

    #[test]
    fn test_remove_tag_never_adds_past_max() {
        let mut combobox = multi(Some(1));
        combobox.select(&countries()[0]);
        combobox.remove_tag(&countries()[1]);
        assert_eq!(combobox.selected_values(), &[OptionValue::from("us")]);
    }

    #[test]
    fn test_single_select_tag_refreshes_visible_set() {
        let mut combobox = single().taggable(true);
        combobox.open();
        combobox.input("Kiwi");
        assert!(combobox.visible().is_empty());

        assert!(combobox.add_tag());
        let labels: Vec<_> = combobox.visible().options().iter().map(|o| o.label.clone()).collect();
        assert_eq!(labels, vec!["Kiwi"]);
        assert_eq!(combobox.options()[0].label, "Kiwi");
        assert_eq!(combobox.display_text(), "Kiwi");
    }

    #[test]
    fn test_from_config() {
        let config = ComboboxConfig::from_toml_str(
            r#"
id = "fruit"
multiple = true
max = 1

[[options]]
value = "apple"
label = "Apple"

[[options]]
value = "pear"
label = "Pear"
"#,
        )
        .unwrap();
        let mut combobox = Combobox::from_config(config);
        assert_eq!(combobox.id().as_str(), "fruit");
        assert!(combobox.is_multiple());
        assert_eq!(combobox.visible().len(), 2);

        let options = combobox.options().to_vec();
        combobox.select(&options[0]);
        combobox.select(&options[1]);
        assert_eq!(combobox.selected_values(), &[OptionValue::from("apple")]);
    }

    #[test]
    fn test_interaction_sequence_stays_consistent() {
        let mut combobox = multi(Some(3)).taggable(true);
        let opts = countries();
        combobox.select(&opts[0]);
        combobox.input("tag one");
        combobox.add_tag();
        combobox.select(&opts[1]);
        combobox.set_options(opts[1..].to_vec());
        assert_consistent(&combobox);
        combobox.select(&opts[2]);
        combobox.remove_tag(&opts[1]);
        combobox.write_value(BoundValue::Sequence(vec![OptionValue::from("de")]));
        combobox.set_multiple(false);
        assert_consistent(&combobox);
        assert!(combobox.selected_values().len() <= 1);
    }
}
