//! Host-side form control and the widget's subscription to it
//!
//! A [`FormControl`] is the form layer's view of one bound field: the current
//! value, touched/dirty/disabled flags and a list of subscribers. Writes made
//! by the host (`set_value`, `set_disabled`) are pushed to subscribers; values
//! produced by the widget itself (`set_value_from_view`) are only recorded,
//! so a widget never receives its own output back.
//!
//! # Example
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use blinc_combobox::prelude::*;
//!
//! let combobox = Arc::new(Mutex::new(
//!     Combobox::new(ComboboxId::from("country"))
//!         .with_options(vec![ComboOption::new("us", "United States")]),
//! ));
//! let control = FormControl::new(BoundValue::Empty);
//! let mut subscription = bind(&control, &combobox);
//!
//! // Programmatic write reaches the widget
//! control.set_value(BoundValue::Scalar("us".into()));
//! assert_eq!(combobox.lock().unwrap().display_text(), "United States");
//!
//! subscription.stop();
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, TryLockError};

use slotmap::{new_key_type, SlotMap};

use crate::binding::{self, BoundValue, ValueAccessor};
use crate::combobox::Combobox;

new_key_type! {
    /// Unique identifier for a control subscriber
    pub struct SubscriptionId;
}

/// A combobox shared between its owner and the control subscription
pub type SharedCombobox = Arc<Mutex<Combobox>>;

/// Changes a control pushes to its subscribers
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlEvent {
    Value(BoundValue),
    Disabled(bool),
}

type Subscriber = Arc<dyn Fn(&ControlEvent) + Send + Sync>;

struct ControlInner {
    value: RwLock<BoundValue>,
    touched: AtomicBool,
    dirty: AtomicBool,
    disabled: AtomicBool,
    subscribers: RwLock<SlotMap<SubscriptionId, Subscriber>>,
}

/// Cloneable handle to one bound form field
#[derive(Clone)]
pub struct FormControl {
    inner: Arc<ControlInner>,
}

impl std::fmt::Debug for FormControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormControl")
            .field("value", &self.value())
            .field("touched", &self.is_touched())
            .field("dirty", &self.is_dirty())
            .field("disabled", &self.is_disabled())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl Default for FormControl {
    fn default() -> Self {
        Self::new(BoundValue::Empty)
    }
}

impl FormControl {
    pub fn new(initial: BoundValue) -> Self {
        Self {
            inner: Arc::new(ControlInner {
                value: RwLock::new(initial),
                touched: AtomicBool::new(false),
                dirty: AtomicBool::new(false),
                disabled: AtomicBool::new(false),
                subscribers: RwLock::new(SlotMap::with_key()),
            }),
        }
    }

    pub fn value(&self) -> BoundValue {
        self.inner
            .value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Programmatic write: stores the value and pushes it to subscribers
    pub fn set_value(&self, value: BoundValue) {
        self.store(value.clone());
        self.notify(&ControlEvent::Value(value));
    }

    /// Record a value produced by the bound widget
    pub fn set_value_from_view(&self, value: BoundValue) {
        self.store(value);
        self.inner.dirty.store(true, Ordering::SeqCst);
    }

    pub fn set_disabled(&self, disabled: bool) {
        let previous = self.inner.disabled.swap(disabled, Ordering::SeqCst);
        if previous != disabled {
            self.notify(&ControlEvent::Disabled(disabled));
        }
    }

    pub fn mark_as_touched(&self) {
        self.inner.touched.store(true, Ordering::SeqCst);
    }

    pub fn is_touched(&self) -> bool {
        self.inner.touched.load(Ordering::SeqCst)
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.load(Ordering::SeqCst)
    }

    pub fn is_disabled(&self) -> bool {
        self.inner.disabled.load(Ordering::SeqCst)
    }

    /// Subscribe to host-side changes
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ControlEvent) + Send + Sync + 'static,
    {
        self.inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(Arc::new(callback))
    }

    /// Remove a subscriber, returning whether it was still registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn store(&self, value: BoundValue) {
        *self
            .inner
            .value
            .write()
            .unwrap_or_else(PoisonError::into_inner) = value;
    }

    fn notify(&self, event: &ControlEvent) {
        // Snapshot so callbacks may subscribe/unsubscribe while running
        let subscribers: Vec<Subscriber> = self
            .inner
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for callback in subscribers {
            callback(event);
        }
    }
}

/// A widget's live subscription to a form control
///
/// Holds the widget weakly: once the widget is dropped, pushed changes are
/// ignored. A change pushed while another thread holds the widget waits for
/// the lock. A change pushed from inside the widget's own notifications is
/// skipped, since the widget is mid-update on the same thread.
/// [`stop`](Self::stop) is idempotent and also runs on drop.
#[derive(Debug)]
pub struct ValueSubscription {
    control: FormControl,
    id: Option<SubscriptionId>,
}

impl ValueSubscription {
    /// Subscribe `combobox` to `control`
    ///
    /// Locks the widget briefly, so it must not be locked by the caller.
    pub fn start(control: &FormControl, combobox: &SharedCombobox) -> Self {
        let key = combobox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .emit_key();
        let target = Arc::downgrade(combobox);
        let id = control.subscribe(move |event| {
            let Some(combobox) = target.upgrade() else {
                tracing::trace!("control change for a dropped combobox ignored");
                return;
            };
            let mut combobox = match combobox.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                Err(TryLockError::WouldBlock) if binding::is_emitting(key) => {
                    tracing::debug!("re-entrant control change ignored");
                    return;
                }
                Err(TryLockError::WouldBlock) => {
                    combobox.lock().unwrap_or_else(PoisonError::into_inner)
                }
            };
            match event {
                ControlEvent::Value(value) => combobox.write_value(value.clone()),
                ControlEvent::Disabled(disabled) => combobox.set_disabled(*disabled),
            }
        });

        Self {
            control: control.clone(),
            id: Some(id),
        }
    }

    pub fn is_active(&self) -> bool {
        self.id.is_some()
    }

    pub fn stop(&mut self) {
        if let Some(id) = self.id.take() {
            self.control.unsubscribe(id);
        }
    }
}

impl Drop for ValueSubscription {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Wire a widget to a control in both directions
///
/// Widget output is recorded on the control, focus loss marks it touched,
/// the control's current value and disabled state are pushed in, and the
/// returned subscription forwards later host writes.
pub fn bind(control: &FormControl, combobox: &SharedCombobox) -> ValueSubscription {
    {
        let mut widget = combobox.lock().unwrap_or_else(PoisonError::into_inner);

        let view = control.clone();
        widget.register_on_change(Arc::new(move |value: &BoundValue| {
            view.set_value_from_view(value.clone());
        }));

        let touched = control.clone();
        widget.register_on_touched(Arc::new(move || touched.mark_as_touched()));

        widget.write_value(control.value());
        widget.set_disabled(control.is_disabled());
    }

    ValueSubscription::start(control, combobox)
}
