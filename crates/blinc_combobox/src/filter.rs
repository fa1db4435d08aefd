//! Filter engine
//!
//! Derives the visible option set from the option universe and a free-text
//! query. Pure and synchronous: recomputed on every keystroke and on open.
//!
//! Matching is a case-insensitive substring test against
//! [`ComboOption::search_key`]. In grouped mode each group is narrowed on its
//! own and groups left without options are dropped.

use crate::option::{ComboOption, OptionGroup};
use crate::tags::{AddedOptions, TagKey};

/// What the presentation layer should render
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterResult {
    Flat(Vec<ComboOption>),
    Grouped(Vec<OptionGroup>),
}

impl Default for FilterResult {
    fn default() -> Self {
        FilterResult::Flat(Vec::new())
    }
}

impl FilterResult {
    /// Visible options in display order (groups flattened in group order)
    pub fn options(&self) -> Vec<&ComboOption> {
        match self {
            FilterResult::Flat(options) => options.iter().collect(),
            FilterResult::Grouped(groups) => groups.iter().flat_map(|g| g.options.iter()).collect(),
        }
    }

    /// Visible option at a flattened index
    pub fn get(&self, index: usize) -> Option<&ComboOption> {
        match self {
            FilterResult::Flat(options) => options.get(index),
            FilterResult::Grouped(groups) => {
                groups.iter().flat_map(|g| g.options.iter()).nth(index)
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FilterResult::Flat(options) => options.len(),
            FilterResult::Grouped(groups) => groups.iter().map(|g| g.options.len()).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_grouped(&self) -> bool {
        matches!(self, FilterResult::Grouped(_))
    }
}

/// Lowercase a query; blank input matches everything
pub fn normalize_query(query: &str) -> String {
    if query.trim().is_empty() {
        String::new()
    } else {
        query.to_lowercase()
    }
}

/// Primary options followed by ad hoc tags not already among them
fn flat_universe<'a>(
    options: &'a [ComboOption],
    added: &'a AddedOptions,
) -> impl Iterator<Item = &'a ComboOption> {
    let primary_keys: Vec<TagKey> = options.iter().map(TagKey::of).collect();
    options
        .iter()
        .chain(added.iter().filter(move |o| !primary_keys.contains(&TagKey::of(o))))
}

/// Narrow the option universe by `query`
pub fn filter_options(
    groups: &[OptionGroup],
    options: &[ComboOption],
    added: &AddedOptions,
    query: &str,
) -> FilterResult {
    let needle = normalize_query(query);

    let result = if groups.is_empty() {
        FilterResult::Flat(
            flat_universe(options, added)
                .filter(|o| o.matches(&needle))
                .cloned()
                .collect(),
        )
    } else {
        FilterResult::Grouped(
            groups
                .iter()
                .map(|g| {
                    g.with_options(
                        g.options
                            .iter()
                            .filter(|o| o.matches(&needle))
                            .cloned()
                            .collect(),
                    )
                })
                .filter(|g| !g.options.is_empty())
                .collect(),
        )
    };

    tracing::trace!(query = %needle, visible = result.len(), "filtered combobox options");
    result
}

/// The full universe, independent of any typed query
///
/// Grouped mode drops groups without options, as every filtered result does.
pub fn unfiltered(
    groups: &[OptionGroup],
    options: &[ComboOption],
    added: &AddedOptions,
) -> FilterResult {
    if groups.is_empty() {
        FilterResult::Flat(flat_universe(options, added).cloned().collect())
    } else {
        FilterResult::Grouped(
            groups
                .iter()
                .filter(|g| !g.options.is_empty())
                .cloned()
                .collect(),
        )
    }
}
