//! Form Session - Registration, revalidation and submit orchestration.
//!
//! One `FormSession` owns one field table. It registers fields against the
//! host, wires detach watchers and mode-driven revalidation callbacks, and
//! publishes validation errors through a `Signal<ErrorRecord>`.
//!
//! All mutation happens synchronously inside host-dispatched callbacks;
//! state is `Rc`/`RefCell`, single-threaded.
//!
//! # Example
//!
//! ```ignore
//! use spark_form::{ElementRef, FieldDescriptor, FieldRules, FormSession, InputKind, Mode};
//!
//! let session = FormSession::with_mode(host, Mode::OnBlur);
//!
//! session.register(FieldDescriptor::with_rules(
//!     ElementRef::new(email_index, "email", InputKind::Email),
//!     FieldRules { required: true, ..FieldRules::default() },
//! ));
//!
//! let submit = session.submit_handler(|values| {
//!     println!("submitted: {:?}", values);
//! });
//! submit();
//!
//! let errors = session.errors();
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use spark_signals::{Signal, signal};

use crate::field::{
    Field, FieldDescriptor, FieldTable, RadioOption, get_field_value, get_fields_values,
};
use crate::host::{ElementHost, EventCallback, EventKind};
use crate::liveness::{ReconcileOutcome, reconcile};
use crate::types::{ElementId, ErrorRecord, FieldValues, Mode};
use crate::validate::validate_field;

// =============================================================================
// Watch Target
// =============================================================================

/// Which fields `watch` applies to.
#[derive(Debug, Clone, Copy)]
pub enum WatchTarget<'a> {
    /// Every registered field.
    All,
    /// One field by name.
    Name(&'a str),
    /// Several fields by name.
    Names(&'a [&'a str]),
}

// =============================================================================
// Session
// =============================================================================

/// A form session: owned field table, error signal, host wiring.
///
/// Dropping the session (or calling [`FormSession::dispose`]) releases every
/// listener and watcher and clears all state.
pub struct FormSession {
    inner: Rc<SessionInner>,
}

struct SessionInner {
    /// Handle to ourselves for the callbacks handed to the host. Weak, so
    /// host-held callbacks never keep a disposed session alive.
    self_weak: Weak<SessionInner>,
    mode: Mode,
    host: Rc<dyn ElementHost>,
    fields: RefCell<FieldTable>,
    /// Last published record, for change detection before signaling.
    local_errors: RefCell<ErrorRecord>,
    errors: Signal<ErrorRecord>,
    disposed: Cell<bool>,
}

impl FormSession {
    /// Create a session validating on submit only (the default mode).
    pub fn new(host: Rc<dyn ElementHost>) -> Self {
        Self::with_mode(host, Mode::OnSubmit)
    }

    /// Create a session with an explicit revalidation mode.
    pub fn with_mode(host: Rc<dyn ElementHost>, mode: Mode) -> Self {
        Self {
            inner: Rc::new_cyclic(|self_weak| SessionInner {
                self_weak: self_weak.clone(),
                mode,
                host,
                fields: RefCell::new(FieldTable::new()),
                local_errors: RefCell::new(ErrorRecord::new()),
                errors: signal(ErrorRecord::new()),
                disposed: Cell::new(false),
            }),
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a field (or one option of a radio group).
    ///
    /// A descriptor without a name is skipped with a warning. Registering
    /// the same name again (or the same element into its group) is a no-op.
    pub fn register(&self, descriptor: FieldDescriptor) {
        let inner = &self.inner;
        let name = descriptor.element_ref.name.clone();
        let element = descriptor.element_ref.element;
        let kind = descriptor.element_ref.kind;

        if name.is_empty() {
            tracing::warn!(element, "field registered without a name, skipping");
            return;
        }

        // Duplicate detection: same name (scalar), kind mismatch against
        // the existing entry, or same element already in the group. Only a
        // new option for an existing radio group proceeds; anything else
        // would put options on a scalar field.
        {
            let fields = inner.fields.borrow();
            if let Some(existing) = fields.get(&name) {
                if !kind.is_radio()
                    || !existing.kind().is_radio()
                    || existing
                        .options
                        .iter()
                        .any(|option| option.element_ref.element == element)
                {
                    return;
                }
            }
        }

        let watcher = inner
            .host
            .observe_detach(element, inner.detach_callback(&name));

        {
            let mut fields = inner.fields.borrow_mut();
            if kind.is_radio() {
                let group = fields
                    .entry(name.clone())
                    .or_insert_with(|| Field::new_radio_group(name.as_str(), descriptor.rules.clone()));
                group.options.push(RadioOption {
                    element_ref: descriptor.element_ref,
                    watcher: Some(watcher),
                    listener_attached: false,
                });
            } else {
                let mut field = Field::new(descriptor.element_ref, descriptor.rules);
                field.watcher = Some(watcher);
                fields.insert(name.clone(), field);
            }
        }

        inner.attach_mode_listener(&name, element);
    }

    /// Forcibly unregister a field: release its listeners and watcher and
    /// delete it from the table, attached or not.
    pub fn unregister(&self, name: &str) {
        let inner = &self.inner;
        let mut fields = inner.fields.borrow_mut();
        reconcile(&mut fields, name, inner.host.as_ref(), true);
    }

    // =========================================================================
    // Consumer Surface
    // =========================================================================

    /// Flag fields for eager revalidation on every change, regardless of
    /// mode, and return their current values. Unknown names are skipped.
    ///
    /// The flag changes when errors publish, not which listeners exist.
    /// Watched fields revalidate through whatever listener registration
    /// bound for the session mode; in `OnSubmit` mode no listener is ever
    /// bound for a watched field, not even after a submit failure.
    pub fn watch(&self, target: WatchTarget) -> FieldValues {
        let inner = &self.inner;
        {
            let mut fields = inner.fields.borrow_mut();
            match target {
                WatchTarget::All => {
                    for field in fields.values_mut() {
                        field.watched = true;
                    }
                }
                WatchTarget::Name(name) => {
                    if let Some(field) = fields.get_mut(name) {
                        field.watched = true;
                    }
                }
                WatchTarget::Names(names) => {
                    for name in names {
                        if let Some(field) = fields.get_mut(*name) {
                            field.watched = true;
                        }
                    }
                }
            }
        }

        let values = get_fields_values(&inner.fields.borrow());
        match target {
            WatchTarget::All => values,
            WatchTarget::Name(name) => values.into_iter().filter(|(k, _)| k == name).collect(),
            WatchTarget::Names(names) => values
                .into_iter()
                .filter(|(k, _)| names.contains(&k.as_str()))
                .collect(),
        }
    }

    /// Build a submit handler around `callback`.
    ///
    /// On invocation: reconcile every field (skipping those whose elements
    /// vanished), validate the rest, publish the error record, and call
    /// `callback` with the values only when nothing failed. Fields that
    /// failed get change-like listeners so their errors clear as the user
    /// edits.
    pub fn submit_handler<F>(&self, callback: F) -> impl Fn() + use<F>
    where
        F: Fn(&FieldValues) + 'static,
    {
        let inner = Rc::downgrade(&self.inner);
        move || {
            if let Some(inner) = inner.upgrade() {
                inner.run_submit(&callback);
            }
        }
    }

    /// Current error record (sparse: valid fields have no entry).
    pub fn errors(&self) -> ErrorRecord {
        self.inner.errors.get()
    }

    /// The observable error signal, for deriveds and effects.
    pub fn errors_signal(&self) -> Signal<ErrorRecord> {
        self.inner.errors.clone()
    }

    /// Snapshot of every field's current value.
    pub fn values(&self) -> FieldValues {
        get_fields_values(&self.inner.fields.borrow())
    }

    /// Release every listener and watcher, clear the table and error state.
    /// Safe to call more than once; also runs on drop.
    pub fn dispose(&self) {
        self.inner.dispose();
    }
}

impl Drop for FormSession {
    fn drop(&mut self) {
        self.inner.dispose();
    }
}

// =============================================================================
// Internals
// =============================================================================

impl SessionInner {
    /// The revalidation callback bound to a field's element(s).
    fn revalidation_callback(&self, name: &str) -> EventCallback {
        let weak = self.self_weak.clone();
        let name = name.to_string();
        Rc::new(move |trigger| {
            if let Some(inner) = weak.upgrade() {
                inner.revalidate(&name, trigger);
            }
        })
    }

    /// The structural-change callback: reconcile the field when its
    /// element is detached.
    fn detach_callback(&self, name: &str) -> Box<dyn Fn()> {
        let weak = self.self_weak.clone();
        let name = name.to_string();
        Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                let mut fields = inner.fields.borrow_mut();
                reconcile(&mut fields, &name, inner.host.as_ref(), false);
            }
        })
    }

    /// Attach the mode-appropriate listener to a freshly registered element.
    /// Watched fields get change-like listeners even in blur/submit modes.
    fn attach_mode_listener(&self, name: &str, element: ElementId) {
        let watched = self
            .fields
            .borrow()
            .get(name)
            .is_some_and(|field| field.watched);

        let wanted = if self.mode == Mode::OnChange || watched {
            Some(EventKind::Change)
        } else if self.mode == Mode::OnBlur {
            Some(EventKind::Blur)
        } else {
            None
        };
        let Some(event) = wanted else { return };

        let callback = self.revalidation_callback(name);
        let mut fields = self.fields.borrow_mut();
        let Some(field) = fields.get_mut(name) else {
            return;
        };
        if field.kind().is_radio() {
            if let Some(option) = field
                .options
                .iter_mut()
                .find(|option| option.element_ref.element == element)
            {
                if !option.listener_attached {
                    self.host.bind(element, event, callback);
                    option.listener_attached = true;
                }
            }
        } else if !field.listener_attached {
            self.host.bind(element, event, callback);
            field.listener_attached = true;
        }
    }

    /// Bind change-like listeners to a field that failed on submit.
    fn attach_error_listeners(&self, name: &str) {
        let callback = self.revalidation_callback(name);
        let mut fields = self.fields.borrow_mut();
        let Some(field) = fields.get_mut(name) else {
            return;
        };
        if field.kind().is_radio() {
            for option in &mut field.options {
                if !option.listener_attached {
                    self.host
                        .bind(option.element_ref.element, EventKind::Change, callback.clone());
                    option.listener_attached = true;
                }
            }
        } else if !field.listener_attached {
            self.host
                .bind(field.element_ref.element, EventKind::Change, callback);
            field.listener_attached = true;
        }
    }

    /// Revalidate one field and publish when warranted: the field's entry
    /// changed, mode is eager, a blur arrived in blur mode, or the field
    /// is watched.
    fn revalidate(&self, name: &str, trigger: EventKind) {
        let (error, watched) = {
            let fields = self.fields.borrow();
            let Some(field) = fields.get(name) else {
                return;
            };
            (validate_field(field, &fields), field.watched)
        };

        let changed = self.local_errors.borrow().get(name) != error.get(name);
        let publish = changed
            || self.mode == Mode::OnChange
            || (self.mode == Mode::OnBlur && trigger == EventKind::Blur)
            || watched;
        if !publish {
            return;
        }

        let mut copy = self.local_errors.borrow().clone();
        match error.get(name) {
            Some(flags) => {
                copy.insert(name.to_string(), *flags);
            }
            None => {
                copy.remove(name);
            }
        }
        *self.local_errors.borrow_mut() = copy.clone();
        self.errors.set(copy);
    }

    /// The submit pass: reconcile, validate, publish, maybe call through.
    fn run_submit(&self, callback: &dyn Fn(&FieldValues)) {
        let names: Vec<String> = self.fields.borrow().keys().cloned().collect();
        let mut errors = ErrorRecord::new();
        let mut values = FieldValues::new();

        for name in names {
            // Clean up vanished elements before validating.
            let outcome = {
                let mut fields = self.fields.borrow_mut();
                reconcile(&mut fields, &name, self.host.as_ref(), false)
            };
            if matches!(outcome, ReconcileOutcome::Removed | ReconcileOutcome::NoField) {
                continue;
            }

            let (record, watched) = {
                let fields = self.fields.borrow();
                let Some(field) = fields.get(&name) else {
                    continue;
                };
                (validate_field(field, &fields), field.watched)
            };

            if record.contains_key(&name) {
                if !watched {
                    self.attach_error_listeners(&name);
                }
                errors.extend(record);
            } else {
                let fields = self.fields.borrow();
                if let Some(field) = fields.get(&name) {
                    values.insert(name.clone(), get_field_value(field));
                }
            }
        }

        let ok = errors.is_empty();
        *self.local_errors.borrow_mut() = errors.clone();
        self.errors.set(errors);
        if ok {
            callback(&values);
        }
    }

    /// Teardown: the only bulk-cancellation path.
    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }

        {
            let mut fields = self.fields.borrow_mut();
            for field in fields.values() {
                if field.kind().is_radio() {
                    for option in &field.options {
                        self.host.unbind_all(option.element_ref.element);
                        if let Some(watcher) = &option.watcher {
                            watcher.disconnect();
                        }
                    }
                } else {
                    self.host.unbind_all(field.element_ref.element);
                    if let Some(watcher) = &field.watcher {
                        watcher.disconnect();
                    }
                }
            }
            fields.clear();
        }

        self.local_errors.borrow_mut().clear();
        self.errors.set(ErrorRecord::new());
    }
}

// =============================================================================
// TESTS
// =============================================================================
