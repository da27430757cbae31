//! Validation Evaluator - Rule checks for one field.
//!
//! Pure single-pass evaluation: given a field's current state and rule set
//! (plus the field table, consulted only to read a radio group's sibling
//! options), produce a sparse error record. Checks accumulate into one
//! flag set per field; no check raises, unset rules skip their step.
//!
//! Rule applicability by kind:
//! - min/max: `Number` (numeric compare) and date-like kinds (instant
//!   compare); every other kind is exempt even when bounds are set.
//! - min_length/max_length: text-like kinds only.
//! - pattern: `Text` only. Email/url/etc. are never pattern-checked even
//!   when a pattern is configured. Intentional narrowing, kept as-is.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};

use crate::field::{Field, FieldTable, valid_radio_value};
use crate::types::{Bound, ErrorRecord, InputKind, RuleFlags};

// =============================================================================
// Instant Parsing
// =============================================================================

/// Parse a date-like value into a naive instant, per the kind's own format.
///
/// Time-only kinds anchor to the epoch date so ordering still works.
/// No timezone normalization: comparison is on the parsed instants as-is.
fn parse_instant(kind: InputKind, s: &str) -> Option<NaiveDateTime> {
    match kind {
        InputKind::Date => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0)),
        InputKind::Time => {
            let time = NaiveTime::parse_from_str(s, "%H:%M:%S")
                .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
                .ok()?;
            Some(NaiveDate::from_ymd_opt(1970, 1, 1)?.and_time(time))
        }
        InputKind::Month => NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0)),
        InputKind::Datetime | InputKind::DatetimeLocal => {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
                .ok()
        }
        InputKind::Week => {
            // ISO week string: "2024-W05"
            let (year, week) = s.split_once("-W")?;
            let year: i32 = year.parse().ok()?;
            let week: u32 = week.parse().ok()?;
            NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        }
        _ => None,
    }
}

/// Instant view of a bound, parsed in the field kind's format.
fn bound_instant(bound: &Bound, kind: InputKind) -> Option<NaiveDateTime> {
    bound.as_text().and_then(|s| parse_instant(kind, s))
}

// =============================================================================
// Evaluation
// =============================================================================

/// Validate one field against its rules.
///
/// Returns a record with at most one entry (the field's name mapped to the
/// union of failing flags); an empty record when everything passes.
/// `fields` is consulted only for radio fields, to inspect the grouped
/// options registered under the same name.
pub fn validate_field(field: &Field, fields: &FieldTable) -> ErrorRecord {
    let mut record = ErrorRecord::new();
    let kind = field.kind();
    let value = field.element_ref.value.get();
    let rules = &field.rules;
    let mut flags = RuleFlags::empty();

    // required
    if rules.required {
        let missing = if kind.is_radio() {
            // Sibling options live on the group's table entry.
            let group = fields.get(field.name()).unwrap_or(field);
            !valid_radio_value(&group.options).is_valid
        } else {
            value.is_empty()
        };
        if missing {
            flags |= RuleFlags::REQUIRED;
        }
    }

    // min / max
    if rules.min.is_some() || rules.max.is_some() {
        let mut exceed_max = false;
        let mut exceed_min = false;

        if kind == InputKind::Number {
            // Unparseable values never fire (NaN comparisons are false).
            if let Ok(n) = value.parse::<f64>() {
                exceed_max = rules
                    .max
                    .as_ref()
                    .and_then(Bound::as_number)
                    .is_some_and(|max| n > max);
                exceed_min = rules
                    .min
                    .as_ref()
                    .and_then(Bound::as_number)
                    .is_some_and(|min| n < min);
            }
        } else if kind.is_date_like() {
            if let Some(instant) = parse_instant(kind, &value) {
                exceed_max = rules
                    .max
                    .as_ref()
                    .and_then(|b| bound_instant(b, kind))
                    .is_some_and(|max| instant > max);
                exceed_min = rules
                    .min
                    .as_ref()
                    .and_then(|b| bound_instant(b, kind))
                    .is_some_and(|min| instant < min);
            }
        }

        if exceed_max {
            flags |= RuleFlags::MAX;
        }
        if exceed_min {
            flags |= RuleFlags::MIN;
        }
    }

    // min_length / max_length
    if (rules.min_length.is_some() || rules.max_length.is_some()) && kind.is_text_like() {
        let len = value.chars().count();
        if rules.max_length.is_some_and(|max| len > max) {
            flags |= RuleFlags::MAX_LENGTH;
        }
        if rules.min_length.is_some_and(|min| len < min) {
            flags |= RuleFlags::MIN_LENGTH;
        }
    }

    // pattern - Text only
    if let Some(pattern) = &rules.pattern {
        if kind == InputKind::Text && !pattern.is_match(&value) {
            flags |= RuleFlags::PATTERN;
        }
    }

    // custom validator - structurally last; returns immediately on failure
    if let Some(validate) = &rules.validate {
        if !validate(&value) {
            flags |= RuleFlags::VALIDATE;
            record.insert(field.name().to_string(), flags);
            return record;
        }
    }

    if !flags.is_empty() {
        record.insert(field.name().to_string(), flags);
    }
    record
}

// =============================================================================
// TESTS
// =============================================================================
