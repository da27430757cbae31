//! Field Model - Registered fields and the session-owned field table.
//!
//! A `Field` is one logical form field: an element descriptor, its rule
//! set, and bookkeeping for listeners and detach watchers. Radio groups are
//! a single `Field` carrying an ordered option list (one entry per name,
//! never separate table entries per option).
//!
//! Element value and checked state are two-way bound signals, matching the
//! input primitive's `value: Signal<String>` binding.

use std::collections::HashMap;
use std::rc::Rc;

use regex::Regex;
use spark_signals::{Signal, signal};

use crate::host::DetachWatcher;
use crate::types::{Bound, ElementId, FieldValues, InputKind};

// =============================================================================
// Element Reference
// =============================================================================

/// Descriptor for one backing element: identity, kind, and reactive state.
#[derive(Clone)]
pub struct ElementRef {
    /// Host-side element handle.
    pub element: ElementId,
    /// Field name. The table key; equal across all options of a group.
    pub name: String,
    pub kind: InputKind,
    /// Current value (two-way bound signal).
    pub value: Signal<String>,
    /// Selection state, meaningful for radio options only.
    pub checked: Signal<bool>,
}

impl ElementRef {
    /// Create a reference with fresh (empty/unchecked) state signals.
    pub fn new(element: ElementId, name: impl Into<String>, kind: InputKind) -> Self {
        Self {
            element,
            name: name.into(),
            kind,
            value: signal(String::new()),
            checked: signal(false),
        }
    }

    /// Create a reference with an initial value.
    pub fn with_value(
        element: ElementId,
        name: impl Into<String>,
        kind: InputKind,
        value: impl Into<String>,
    ) -> Self {
        let r = Self::new(element, name, kind);
        r.value.set(value.into());
        r
    }
}

// =============================================================================
// Rules
// =============================================================================

/// Declarative constraints for one field.
///
/// Unset rules skip their check entirely. Construct with struct update:
///
/// ```ignore
/// FieldRules {
///     required: true,
///     min_length: Some(3),
///     ..FieldRules::default()
/// }
/// ```
#[derive(Clone, Default)]
pub struct FieldRules {
    pub required: bool,
    pub min: Option<Bound>,
    pub max: Option<Bound>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    /// Compiled pattern. Checked for `InputKind::Text` only.
    pub pattern: Option<Regex>,
    /// Custom predicate over the value; `false` fails the `VALIDATE` rule.
    pub validate: Option<Rc<dyn Fn(&str) -> bool>>,
}

/// Registration input: the element plus its rules.
#[derive(Clone)]
pub struct FieldDescriptor {
    pub element_ref: ElementRef,
    pub rules: FieldRules,
}

impl FieldDescriptor {
    /// Descriptor with no rules.
    pub fn new(element_ref: ElementRef) -> Self {
        Self {
            element_ref,
            rules: FieldRules::default(),
        }
    }

    pub fn with_rules(element_ref: ElementRef, rules: FieldRules) -> Self {
        Self { element_ref, rules }
    }
}

// =============================================================================
// Fields
// =============================================================================

/// One option of a radio group.
pub struct RadioOption {
    pub element_ref: ElementRef,
    /// Active detach observation for this option's element.
    pub watcher: Option<Box<dyn DetachWatcher>>,
    /// Guards against binding the revalidation callback twice.
    pub listener_attached: bool,
}

/// One registered field.
///
/// Invariant: `kind` radio implies non-empty `options`; any other kind
/// implies empty `options`. For radio groups, `element_ref` carries the
/// group identity (name + kind) and the per-option state lives in `options`.
pub struct Field {
    pub element_ref: ElementRef,
    pub rules: FieldRules,
    pub options: Vec<RadioOption>,
    /// Eager revalidation requested via `watch`, regardless of mode.
    pub watched: bool,
    /// Guards against binding the revalidation callback twice.
    pub listener_attached: bool,
    /// Active detach observation (non-radio fields).
    pub watcher: Option<Box<dyn DetachWatcher>>,
}

impl Field {
    /// Create a scalar (non-grouped) field.
    pub fn new(element_ref: ElementRef, rules: FieldRules) -> Self {
        Self {
            element_ref,
            rules,
            options: Vec::new(),
            watched: false,
            listener_attached: false,
            watcher: None,
        }
    }

    /// Create an empty radio group sharing the given name.
    pub fn new_radio_group(name: impl Into<String>, rules: FieldRules) -> Self {
        // Group-level ref carries identity only; state lives per-option.
        let element_ref = ElementRef::new(ElementId::MAX, name, InputKind::Radio);
        Self {
            element_ref,
            rules,
            options: Vec::new(),
            watched: false,
            listener_attached: false,
            watcher: None,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.element_ref.name
    }

    #[inline]
    pub fn kind(&self) -> InputKind {
        self.element_ref.kind
    }
}

/// The session-owned mapping from field name to field.
pub type FieldTable = HashMap<String, Field>;

// =============================================================================
// Radio Selection
// =============================================================================

/// Result of inspecting a radio group's options.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RadioState {
    /// True when some option is checked.
    pub is_valid: bool,
    /// The checked option's value, if any.
    pub value: Option<String>,
}

/// Inspect a radio group's options: is any checked, and which value.
pub fn valid_radio_value(options: &[RadioOption]) -> RadioState {
    for option in options {
        if option.element_ref.checked.get() {
            return RadioState {
                is_valid: true,
                value: Some(option.element_ref.value.get()),
            };
        }
    }
    RadioState::default()
}

// =============================================================================
// Value Extraction
// =============================================================================

/// Current value of one field (selected option's value for radio groups).
pub fn get_field_value(field: &Field) -> String {
    if field.kind().is_radio() {
        valid_radio_value(&field.options).value.unwrap_or_default()
    } else {
        field.element_ref.value.get()
    }
}

/// Snapshot of every field's current value.
pub fn get_fields_values(fields: &FieldTable) -> FieldValues {
    fields
        .iter()
        .map(|(name, field)| (name.clone(), get_field_value(field)))
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn option(element: ElementId, value: &str, checked: bool) -> RadioOption {
        let element_ref = ElementRef::with_value(element, "choice", InputKind::Radio, value);
        element_ref.checked.set(checked);
        RadioOption {
            element_ref,
            watcher: None,
            listener_attached: false,
        }
    }

    #[test]
    fn test_radio_state_none_checked() {
        let options = vec![option(0, "a", false), option(1, "b", false)];
        let state = valid_radio_value(&options);
        assert!(!state.is_valid);
        assert_eq!(state.value, None);
    }

    #[test]
    fn test_radio_state_one_checked() {
        let options = vec![option(0, "a", false), option(1, "b", true)];
        let state = valid_radio_value(&options);
        assert!(state.is_valid);
        assert_eq!(state.value, Some("b".to_string()));
    }

    #[test]
    fn test_radio_state_empty_group() {
        assert_eq!(valid_radio_value(&[]), RadioState::default());
    }

    #[test]
    fn test_field_value_scalar() {
        let field = Field::new(
            ElementRef::with_value(0, "email", InputKind::Email, "a@b"),
            FieldRules::default(),
        );
        assert_eq!(get_field_value(&field), "a@b");
    }

    #[test]
    fn test_field_value_radio_group() {
        let mut field = Field::new_radio_group("choice", FieldRules::default());
        field.options.push(option(0, "red", false));
        field.options.push(option(1, "blue", true));
        assert_eq!(get_field_value(&field), "blue");

        // Nothing checked reads as empty
        field.options[1].element_ref.checked.set(false);
        assert_eq!(get_field_value(&field), "");
    }

    #[test]
    fn test_fields_values_snapshot() {
        let mut fields = FieldTable::new();
        fields.insert(
            "name".to_string(),
            Field::new(
                ElementRef::with_value(0, "name", InputKind::Text, "alice"),
                FieldRules::default(),
            ),
        );
        fields.insert(
            "age".to_string(),
            Field::new(
                ElementRef::with_value(1, "age", InputKind::Number, "30"),
                FieldRules::default(),
            ),
        );

        let values = get_fields_values(&fields);
        assert_eq!(values.get("name").map(String::as_str), Some("alice"));
        assert_eq!(values.get("age").map(String::as_str), Some("30"));
    }
}
