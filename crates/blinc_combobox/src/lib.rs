//! Blinc Combobox Core
//!
//! The selection and filter state engine behind Blinc's searchable combobox:
//!
//! - **Option Model**: flat or grouped option lists normalized into one universe
//! - **Filter Engine**: case-insensitive substring filtering with group pruning
//! - **Selection Engine**: single-select, multi-select toggle, ad hoc tags, max count
//! - **Binding Adapter**: bound form value, display text and change notifications
//! - **Navigation**: wrapping keyboard highlight over the visible options
//!
//! Rendering, overlays and event wiring live in the component layer; this
//! crate only tracks state and reports it.
//!
//! # Example
//!
//! ```rust
//! use blinc_combobox::prelude::*;
//!
//! let mut tags = Combobox::new(ComboboxId::from("tags"))
//!     .with_options(vec![
//!         ComboOption::new("rust", "Rust"),
//!         ComboOption::new("zig", "Zig"),
//!     ])
//!     .with_policy(SelectionPolicy {
//!         multiple: true,
//!         max: Some(2),
//!         disable_clear: false,
//!     })
//!     .taggable(true);
//!
//! tags.open();
//! tags.input("Go");
//! tags.add_tag();
//! tags.select(&ComboOption::new("rust", "Rust"));
//!
//! assert_eq!(
//!     tags.value(),
//!     BoundValue::Sequence(vec!["Go".into(), "rust".into()])
//! );
//! ```

pub mod binding;
pub mod combobox;
pub mod config;
pub mod control;
pub mod error;
pub mod filter;
pub mod id;
pub mod navigation;
pub mod option;
pub mod selection;
pub mod tags;

pub use binding::{BindingAdapter, BoundValue, SelectChange, ValueAccessor};
pub use combobox::Combobox;
pub use config::ComboboxConfig;
pub use control::{bind, ControlEvent, FormControl, SharedCombobox, SubscriptionId, ValueSubscription};
pub use error::{ComboboxError, Result};
pub use filter::FilterResult;
pub use id::ComboboxId;
pub use navigation::{HighlightState, NavIntent};
pub use option::{ComboOption, OptionGroup, OptionTag, OptionValue};
pub use selection::{CompareMode, Comparator, SelectionPolicy, SelectionState};
pub use tags::AddedOptions;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::binding::{BoundValue, SelectChange, ValueAccessor};
    pub use crate::combobox::Combobox;
    pub use crate::config::ComboboxConfig;
    pub use crate::control::{bind, FormControl, ValueSubscription};
    pub use crate::filter::FilterResult;
    pub use crate::id::ComboboxId;
    pub use crate::navigation::NavIntent;
    pub use crate::option::{ComboOption, OptionGroup, OptionValue};
    pub use crate::selection::{CompareMode, SelectionPolicy};
}
