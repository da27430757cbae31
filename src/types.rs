//! Core types for spark-form.
//!
//! These types flow through registration, validation and the error signal:
//! input kinds, revalidation modes, rule-failure flags and the sparse
//! error record published to consumers.

use std::collections::HashMap;

// =============================================================================
// Element Identity
// =============================================================================

/// Identifies one UI element inside the host framework.
///
/// For spark-tui hosts this is the component index into the parallel arrays;
/// other hosts may use any stable handle.
pub type ElementId = usize;

// =============================================================================
// Input Kinds
// =============================================================================

/// The kind of input element a field is backed by.
///
/// Mirrors the standard input-type vocabulary. The kind decides which rule
/// checks apply: numeric and date-like kinds get min/max, text-like kinds
/// get length bounds, and only `Text` gets pattern matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum InputKind {
    #[default]
    Text = 0,
    Email = 1,
    Password = 2,
    Search = 3,
    Tel = 4,
    Url = 5,
    Number = 6,
    Date = 7,
    Time = 8,
    Month = 9,
    Datetime = 10,
    DatetimeLocal = 11,
    Week = 12,
    Radio = 13,
}

impl InputKind {
    /// Text-like kinds: eligible for min_length/max_length checks.
    #[inline]
    pub const fn is_text_like(&self) -> bool {
        matches!(
            self,
            Self::Text | Self::Email | Self::Password | Self::Search | Self::Tel | Self::Url
        )
    }

    /// Date-like kinds: min/max compares parsed instants.
    #[inline]
    pub const fn is_date_like(&self) -> bool {
        matches!(
            self,
            Self::Date | Self::Time | Self::Month | Self::Datetime | Self::DatetimeLocal | Self::Week
        )
    }

    /// Grouped kind: value lives per-option, not on the field.
    #[inline]
    pub const fn is_radio(&self) -> bool {
        matches!(self, Self::Radio)
    }
}

// =============================================================================
// Revalidation Mode
// =============================================================================

/// When a field is revalidated and the error signal updated.
///
/// Regardless of mode, a field that failed on submit gets a change-like
/// listener so the error clears as the user edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Validate only when the submit handler runs.
    #[default]
    OnSubmit,
    /// Validate when a field loses focus.
    OnBlur,
    /// Validate on every change.
    OnChange,
}

// =============================================================================
// Rule Flags (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Failed-rule flags for one field.
    ///
    /// Only failing rules are set; an empty set means the field is valid
    /// and gets no entry in the [`ErrorRecord`] at all.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RuleFlags: u8 {
        const REQUIRED = 1 << 0;
        const MIN = 1 << 1;
        const MAX = 1 << 2;
        const MIN_LENGTH = 1 << 3;
        const MAX_LENGTH = 1 << 4;
        const PATTERN = 1 << 5;
        const VALIDATE = 1 << 6;
    }
}

// =============================================================================
// Records
// =============================================================================

/// Sparse mapping from field name to its failing-rule flags.
///
/// A field with no failures is absent entirely. Recomputed per validation
/// pass; the session merges it into the published error state and removes
/// entries that became empty.
pub type ErrorRecord = HashMap<String, RuleFlags>;

/// Current values keyed by field name.
pub type FieldValues = HashMap<String, String>;

// =============================================================================
// Rule Bounds
// =============================================================================

/// A min/max rule value.
///
/// Numeric kinds compare against [`Bound::Number`]; date-like kinds parse
/// [`Bound::Text`] as an instant in the field's own value format. A bound
/// of the wrong shape for the kind simply never fires.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    Number(f64),
    Text(String),
}

impl Bound {
    /// Numeric view of the bound, if it has one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.parse().ok(),
        }
    }

    /// Textual view of the bound (date-like bounds are attribute text).
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Text(s) => Some(s),
        }
    }
}

impl From<f64> for Bound {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for Bound {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<&str> for Bound {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Bound {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

// =============================================================================
// TESTS
// =============================================================================
