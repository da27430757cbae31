//! Liveness Reconciler - Cleanup for fields whose elements vanished.
//!
//! A registered field's backing element can be detached from the live tree
//! at any time (conditional rendering, list removal). The reconciler checks
//! attachment through the host, releases listeners and detach watchers for
//! gone elements, and deletes emptied fields from the table.
//!
//! Invoked reactively (a detach watcher fired) and eagerly (on submit,
//! before validating). Idempotent: re-running on a clean table is a no-op.

use crate::field::FieldTable;
use crate::host::ElementHost;

// =============================================================================
// Outcome
// =============================================================================

/// What the reconciler did to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No field registered under the name; nothing to do.
    NoField,
    /// The field was deleted from the table.
    Removed,
    /// A radio group lost options but survives.
    Pruned,
    /// Table unchanged.
    Kept,
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Reconcile one field against element liveness.
///
/// Radio groups: detached options are released (listeners unbound, watcher
/// disconnected) and filtered out in a rebuild pass; a fully-emptied group
/// is deleted. Non-grouped fields: detached, or any field when
/// `force_delete` is set, are released and deleted. `force_delete` has no
/// effect on radio groups.
pub fn reconcile(
    fields: &mut FieldTable,
    name: &str,
    host: &dyn ElementHost,
    force_delete: bool,
) -> ReconcileOutcome {
    let Some(field) = fields.get_mut(name) else {
        return ReconcileOutcome::NoField;
    };

    if field.kind().is_radio() {
        let mut any_detached = false;
        for option in &field.options {
            if !host.is_attached(option.element_ref.element) {
                any_detached = true;
                host.unbind_all(option.element_ref.element);
                if let Some(watcher) = &option.watcher {
                    watcher.disconnect();
                }
            }
        }

        if any_detached {
            // Rebuild instead of splicing mid-iteration.
            field
                .options
                .retain(|option| host.is_attached(option.element_ref.element));
        }

        if field.options.is_empty() {
            fields.remove(name);
            return ReconcileOutcome::Removed;
        }
        if any_detached {
            ReconcileOutcome::Pruned
        } else {
            ReconcileOutcome::Kept
        }
    } else {
        let element = field.element_ref.element;
        if !host.is_attached(element) || force_delete {
            host.unbind_all(element);
            if let Some(watcher) = &field.watcher {
                watcher.disconnect();
            }
            fields.remove(name);
            ReconcileOutcome::Removed
        } else {
            ReconcileOutcome::Kept
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;

    use super::*;
    use crate::field::{ElementRef, Field, FieldRules, RadioOption};
    use crate::host::{DetachWatcher, EventCallback, EventKind};
    use crate::types::{ElementId, InputKind};

    /// Mock host: explicit attachment set, unbind log, watcher log.
    #[derive(Default)]
    struct MockHost {
        attached: RefCell<HashSet<ElementId>>,
        unbound: RefCell<Vec<ElementId>>,
    }

    impl MockHost {
        fn attach(&self, element: ElementId) {
            self.attached.borrow_mut().insert(element);
        }
    }

    struct MockWatcher {
        disconnected: Rc<RefCell<Vec<ElementId>>>,
        element: ElementId,
    }

    impl DetachWatcher for MockWatcher {
        fn disconnect(&self) {
            self.disconnected.borrow_mut().push(self.element);
        }
    }

    impl ElementHost for MockHost {
        fn is_attached(&self, element: ElementId) -> bool {
            self.attached.borrow().contains(&element)
        }

        fn observe_detach(
            &self,
            _element: ElementId,
            _callback: Box<dyn Fn()>,
        ) -> Box<dyn DetachWatcher> {
            unimplemented!("not used by reconciler tests")
        }

        fn bind(&self, _element: ElementId, _kind: EventKind, _callback: EventCallback) {}

        fn unbind_all(&self, element: ElementId) {
            self.unbound.borrow_mut().push(element);
        }
    }

    fn watcher(log: &Rc<RefCell<Vec<ElementId>>>, element: ElementId) -> Box<dyn DetachWatcher> {
        Box::new(MockWatcher {
            disconnected: log.clone(),
            element,
        })
    }

    fn scalar_field(element: ElementId, name: &str) -> Field {
        Field::new(
            ElementRef::new(element, name, InputKind::Text),
            FieldRules::default(),
        )
    }

    fn radio_field(
        name: &str,
        elements: &[ElementId],
        log: &Rc<RefCell<Vec<ElementId>>>,
    ) -> Field {
        let mut group = Field::new_radio_group(name, FieldRules::default());
        for &element in elements {
            group.options.push(RadioOption {
                element_ref: ElementRef::new(element, name, InputKind::Radio),
                watcher: Some(watcher(log, element)),
                listener_attached: false,
            });
        }
        group
    }

    #[test]
    fn test_unknown_name_is_no_op() {
        let host = MockHost::default();
        let mut fields = FieldTable::new();
        assert_eq!(
            reconcile(&mut fields, "ghost", &host, false),
            ReconcileOutcome::NoField
        );
    }

    #[test]
    fn test_attached_field_kept() {
        let host = MockHost::default();
        host.attach(0);
        let mut fields = FieldTable::new();
        fields.insert("a".to_string(), scalar_field(0, "a"));

        assert_eq!(reconcile(&mut fields, "a", &host, false), ReconcileOutcome::Kept);
        assert!(fields.contains_key("a"));
        assert!(host.unbound.borrow().is_empty());
    }

    #[test]
    fn test_detached_field_removed() {
        let host = MockHost::default();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut fields = FieldTable::new();
        let mut field = scalar_field(0, "a");
        field.watcher = Some(watcher(&log, 0));
        fields.insert("a".to_string(), field);

        assert_eq!(reconcile(&mut fields, "a", &host, false), ReconcileOutcome::Removed);
        assert!(!fields.contains_key("a"));
        assert_eq!(*host.unbound.borrow(), vec![0]);
        assert_eq!(*log.borrow(), vec![0]);
    }

    #[test]
    fn test_force_delete_attached_field() {
        let host = MockHost::default();
        host.attach(0);
        let mut fields = FieldTable::new();
        fields.insert("a".to_string(), scalar_field(0, "a"));

        assert_eq!(reconcile(&mut fields, "a", &host, true), ReconcileOutcome::Removed);
        assert!(!fields.contains_key("a"));
        assert_eq!(*host.unbound.borrow(), vec![0]);
    }

    #[test]
    fn test_idempotent_on_clean_table() {
        let host = MockHost::default();
        host.attach(0);
        host.attach(1);
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut fields = FieldTable::new();
        fields.insert("a".to_string(), scalar_field(0, "a"));
        fields.insert("r".to_string(), radio_field("r", &[1], &log));

        for _ in 0..2 {
            assert_eq!(reconcile(&mut fields, "a", &host, false), ReconcileOutcome::Kept);
            assert_eq!(reconcile(&mut fields, "r", &host, false), ReconcileOutcome::Kept);
        }
        assert_eq!(fields.len(), 2);
        assert!(host.unbound.borrow().is_empty());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_radio_group_shrinks() {
        let host = MockHost::default();
        host.attach(1);
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut fields = FieldTable::new();
        fields.insert("r".to_string(), radio_field("r", &[0, 1, 2], &log));

        // Options 0 and 2 are gone; 1 survives.
        assert_eq!(reconcile(&mut fields, "r", &host, false), ReconcileOutcome::Pruned);
        let group = fields.get("r").unwrap();
        assert_eq!(group.options.len(), 1);
        assert_eq!(group.options[0].element_ref.element, 1);

        let mut unbound = host.unbound.borrow().clone();
        unbound.sort_unstable();
        assert_eq!(unbound, vec![0, 2]);
        let mut disconnected = log.borrow().clone();
        disconnected.sort_unstable();
        assert_eq!(disconnected, vec![0, 2]);
    }

    #[test]
    fn test_radio_group_fully_detached_is_deleted() {
        let host = MockHost::default();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut fields = FieldTable::new();
        fields.insert("r".to_string(), radio_field("r", &[0, 1, 2], &log));

        assert_eq!(reconcile(&mut fields, "r", &host, false), ReconcileOutcome::Removed);
        assert!(!fields.contains_key("r"));
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn test_force_delete_ignored_for_radio() {
        let host = MockHost::default();
        host.attach(0);
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut fields = FieldTable::new();
        fields.insert("r".to_string(), radio_field("r", &[0], &log));

        assert_eq!(reconcile(&mut fields, "r", &host, true), ReconcileOutcome::Kept);
        assert!(fields.contains_key("r"));
    }
}
