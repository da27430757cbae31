//! # spark-form
//!
//! Reactive form state and validation for spark-tui-style applications.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals): a
//! form session owns a table of registered fields, validates them against
//! declarative rules, and publishes errors through a reactive signal.
//!
//! ## Architecture
//!
//! ```text
//! register → FieldTable → validate_field → ErrorRecord → errors signal
//!                ↑
//!         reconcile (liveness cleanup via the ElementHost)
//! ```
//!
//! The crate never touches UI elements directly. The embedding framework
//! implements [`ElementHost`]: an attachment predicate, detach observation,
//! and event binding. Element values and radio checked-state are two-way
//! bound signals, the same binding the input primitive uses.
//!
//! ## Modules
//!
//! - [`types`] - Core types (InputKind, Mode, RuleFlags, ErrorRecord)
//! - [`host`] - The ElementHost seam to the embedding framework
//! - [`field`] - Field model, field table, value extraction
//! - [`validate`] - Rule evaluation for one field
//! - [`liveness`] - Cleanup of fields whose elements vanished
//! - [`session`] - FormSession: registration, revalidation, submit

pub mod field;
pub mod host;
pub mod liveness;
pub mod session;
pub mod types;
pub mod validate;

// Re-export commonly used items
pub use types::*;

pub use field::{
    ElementRef, Field, FieldDescriptor, FieldRules, FieldTable, RadioOption, RadioState,
    get_field_value, get_fields_values, valid_radio_value,
};

pub use host::{DetachWatcher, ElementHost, EventCallback, EventKind};

pub use validate::validate_field;

pub use liveness::{ReconcileOutcome, reconcile};

pub use session::{FormSession, WatchTarget};
