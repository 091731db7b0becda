use serde::{Deserialize, Serialize};

use crate::object::Attributes;

/// Result of one reconciling operation.
///
/// A remote rejection is not an outcome: it aborts the reconciliation as
/// [`ReconcileError::Conflict`](crate::error::ReconcileError::Conflict).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// No mutation was issued, or the remote reported nothing to change.
    Unchanged,
    /// A mutation was issued and acknowledged.
    Applied,
    /// The object or relationship no longer exists; drop it from tracked state.
    GoneRemotely,
}

impl Outcome {
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::GoneRemotely)
    }

    /// Fold the outcomes of several mutations on the same resource.
    /// `GoneRemotely` wins over `Applied`, which wins over `Unchanged`.
    pub fn and(self, other: Outcome) -> Outcome {
        match (self, other) {
            (Self::GoneRemotely, _) | (_, Self::GoneRemotely) => Self::GoneRemotely,
            (Self::Applied, _) | (_, Self::Applied) => Self::Applied,
            _ => Self::Unchanged,
        }
    }
}

/// What the orchestrator persists for a declared resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    pub id: String,
    pub outcome: Outcome,
    #[serde(default)]
    pub attributes: Attributes,
}

impl ResourceState {
    pub fn new(id: impl Into<String>, outcome: Outcome, attributes: Attributes) -> Self {
        Self {
            id: id.into(),
            outcome,
            attributes,
        }
    }

    /// State for a resource found absent; carries no attributes.
    pub fn gone(id: impl Into<String>) -> Self {
        Self::new(id, Outcome::GoneRemotely, Attributes::new())
    }

    /// Whether the orchestrator should keep tracking this resource.
    pub fn is_tracked(&self) -> bool {
        !self.outcome.is_gone()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = outcome;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_prefers_applied() {
        assert_eq!(Outcome::Unchanged.and(Outcome::Applied), Outcome::Applied);
        assert_eq!(Outcome::Unchanged.and(Outcome::Unchanged), Outcome::Unchanged);
    }

    #[test]
    fn and_prefers_gone() {
        assert_eq!(Outcome::Applied.and(Outcome::GoneRemotely), Outcome::GoneRemotely);
    }

    #[test]
    fn gone_state_is_untracked() {
        let state = ResourceState::gone("g1/u/u1");
        assert!(!state.is_tracked());
        assert!(state.attributes.is_empty());
    }

    #[test]
    fn state_serializes_for_persistence() {
        let mut attributes = Attributes::new();
        attributes.insert("user".into(), vec!["u1".into()]);
        let state = ResourceState::new("g1/u/u1", Outcome::Applied, attributes);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["outcome"], "applied");
        assert_eq!(json["attributes"]["user"][0], "u1");

        let back: ResourceState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
