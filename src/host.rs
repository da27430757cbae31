//! Element Host - The seam to the embedding UI framework.
//!
//! spark-form never touches elements directly. The host framework supplies:
//! - an attachment predicate (is this element still in the live tree?)
//! - structural-change observation (tell me when it is detached)
//! - event binding (attach/detach revalidation callbacks)
//!
//! A spark-tui host backs these with the component registry
//! (`is_allocated` / `on_destroy`) and the input event plumbing. Tests use
//! a mock host.
//!
//! # Example
//!
//! ```ignore
//! use spark_form::{ElementHost, EventKind};
//!
//! struct TuiHost;
//!
//! impl ElementHost for TuiHost {
//!     fn is_attached(&self, element: ElementId) -> bool {
//!         spark_tui::is_allocated(element)
//!     }
//!     // ...
//! }
//! ```

use std::rc::Rc;

use crate::types::ElementId;

// =============================================================================
// Event Categories
// =============================================================================

/// Event category a revalidation callback is bound to.
///
/// `Change` covers change-like events (typing, option selection);
/// `Blur` covers focus-loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Change,
    Blur,
}

/// Revalidation callback bound to an element.
///
/// Invoked by the host with the event category that fired, so `OnBlur`
/// sessions can tell a blur from a change.
pub type EventCallback = Rc<dyn Fn(EventKind)>;

// =============================================================================
// Detach Observation
// =============================================================================

/// Handle for an active detach observation.
///
/// Disconnecting stops the observation; dropping the handle without
/// disconnecting leaves it active (the host owns the callback).
pub trait DetachWatcher {
    fn disconnect(&self);
}

// =============================================================================
// Host Trait
// =============================================================================

/// Everything spark-form asks of the embedding framework.
pub trait ElementHost {
    /// Whether the element is still attached to the live tree.
    fn is_attached(&self, element: ElementId) -> bool;

    /// Watch for the element being detached; `callback` fires when it is.
    /// The returned handle supports disconnect.
    fn observe_detach(&self, element: ElementId, callback: Box<dyn Fn()>) -> Box<dyn DetachWatcher>;

    /// Attach a revalidation callback to the element for one event category.
    fn bind(&self, element: ElementId, kind: EventKind, callback: EventCallback);

    /// Detach every callback previously bound to the element.
    fn unbind_all(&self, element: ElementId);
}
