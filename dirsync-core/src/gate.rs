//! Mutation gate.
//!
//! Before a mutation: only attributes whose value was actually declared take
//! part, so omitted fields are never cleared by accident. After a mutation:
//! the remote "no modifications to be performed" answer is a success, any
//! other rejection aborts the reconciliation.

use std::collections::BTreeSet;

use crate::error::{DirectoryError, ReconcileError};
use crate::object::{DirectoryObject, Modifications};
use crate::outcome::Outcome;
use crate::set_diff;

/// A value takes part in a mutation only when it was declared.
pub fn should_apply<V: ?Sized>(declared: Option<&V>) -> bool {
    declared.is_some()
}

/// A declared value takes part only when it differs from the known one.
/// With no known value every declared value takes part.
pub fn should_apply_change<V: PartialEq + ?Sized>(declared: Option<&V>, current: Option<&V>) -> bool {
    match (declared, current) {
        (Some(declared), Some(current)) => declared != current,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Map a mutation response to an outcome.
pub fn classify(result: Result<(), DirectoryError>) -> Result<Outcome, ReconcileError> {
    match result {
        Ok(()) => Ok(Outcome::Applied),
        Err(e) if e.is_no_modifications() => {
            tracing::debug!(error = %e, "remote reported no modifications, treating as unchanged");
            Ok(Outcome::Unchanged)
        }
        Err(e) => Err(ReconcileError::Conflict(e)),
    }
}

/// Map a delete/remove response to an outcome: a target that is already
/// gone is not a failure.
pub fn classify_delete(result: Result<(), DirectoryError>) -> Result<Outcome, ReconcileError> {
    match result {
        Ok(()) => Ok(Outcome::Applied),
        Err(e) if e.is_not_found() || e.is_no_modifications() => {
            tracing::debug!(error = %e, "delete target already absent");
            Ok(Outcome::GoneRemotely)
        }
        Err(e) => Err(ReconcileError::Conflict(e)),
    }
}

/// Builds [`Modifications`] from declared values, compared against the
/// current remote object when one is known.
#[derive(Debug)]
pub struct ModificationBuilder<'a> {
    current: Option<&'a DirectoryObject>,
    mods: Modifications,
}

impl<'a> ModificationBuilder<'a> {
    pub fn new(current: Option<&'a DirectoryObject>) -> Self {
        Self {
            current,
            mods: Modifications::new(),
        }
    }

    /// Single-valued attribute, replaced as a whole.
    pub fn scalar(mut self, attribute: &str, declared: Option<&str>) -> Self {
        let current = self.current.and_then(|obj| obj.scalar(attribute));
        let changed = match self.current {
            Some(_) => declared.is_some() && declared != current,
            None => should_apply(declared),
        };
        if let (true, Some(value)) = (changed, declared) {
            self.mods.set(attribute, vec![value.to_string()]);
        }
        self
    }

    /// Multi-valued attribute, replaced as a whole. Compared as a set.
    pub fn values(mut self, attribute: &str, declared: Option<&[String]>) -> Self {
        let Some(declared) = declared else {
            return self;
        };
        let changed = match self.current {
            Some(obj) => as_set(obj.values(attribute)) != as_set(declared),
            None => true,
        };
        if changed {
            self.mods.set(attribute, declared.to_vec());
        }
        self
    }

    /// Multi-valued attribute, reconciled with explicit add/remove lists.
    pub fn delta(mut self, attribute: &str, declared: Option<&[String]>) -> Self {
        let Some(declared) = declared else {
            return self;
        };
        let actual = self
            .current
            .map(|obj| obj.values(attribute).to_vec())
            .unwrap_or_default();
        let delta = set_diff::diff(actual, declared.to_vec());
        self.mods
            .add(attribute, delta.to_add)
            .remove(attribute, delta.to_remove);
        self
    }

    pub fn build(self) -> Modifications {
        self.mods
    }
}

fn as_set(values: &[String]) -> BTreeSet<&str> {
    values.iter().map(String::as_str).collect()
}
