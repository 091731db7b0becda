//! In-process [`DirectoryClient`] with the remote service's observable
//! semantics: coded errors, empty-modlist answers, and read-after-create lag.
//!
//! Used by the engine's tests and by orchestrators that want a dry run. The
//! out-of-band helpers (`insert_object`, `remove_object`, `remove_value`)
//! simulate changes made by other administrators.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::client::{DirectoryClient, Result};
use crate::error::{
    DirectoryError, ErrorKind, DUPLICATE_ENTRY_CODE, EMPTY_MODLIST_CODE, NOT_FOUND_CODE,
};
use crate::object::{Attributes, DirectoryObject, Modifications, ObjectKind, ObjectRef};
use crate::relation::RelationSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Show,
    Create,
    AddRelation,
    RemoveRelation,
    Modify,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Show => "show",
            Self::Create => "create",
            Self::AddRelation => "add_relation",
            Self::RemoveRelation => "remove_relation",
            Self::Modify => "modify",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded client call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub operation: Operation,
    pub target: ObjectRef,
}

#[derive(Debug, Default)]
struct State {
    objects: BTreeMap<ObjectRef, Attributes>,
    /// Remaining `show` calls that report NotFound for a freshly created object.
    pending_visibility: HashMap<ObjectRef, u32>,
    failures: HashMap<Operation, VecDeque<(Option<u32>, String)>>,
    calls: Vec<Call>,
}

#[derive(Debug)]
pub struct MemoryDirectory {
    state: Mutex<State>,
    read_lag: u32,
    message_fallback: bool,
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            read_lag: 0,
            message_fallback: true,
        }
    }

    /// Newly created objects stay invisible to the next `lag` reads.
    pub fn with_read_lag(mut self, lag: u32) -> Self {
        self.read_lag = lag;
        self
    }

    /// Whether injected failures without a code are classified by message.
    pub fn with_message_fallback(mut self, enabled: bool) -> Self {
        self.message_fallback = enabled;
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Test controls ───────────────────────────────────────────────

    /// Make the next call of `operation` fail with the given remote error.
    pub fn fail_next(&self, operation: Operation, code: Option<u32>, message: impl Into<String>) {
        self.state()
            .failures
            .entry(operation)
            .or_default()
            .push_back((code, message.into()));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn count(&self, operation: Operation) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    // ── Out-of-band changes ─────────────────────────────────────────

    pub fn insert_object(&self, target: ObjectRef, attributes: Attributes) {
        self.state().objects.insert(target, attributes);
    }

    pub fn remove_object(&self, target: &ObjectRef) -> bool {
        self.state().objects.remove(target).is_some()
    }

    pub fn insert_value(&self, target: &ObjectRef, attribute: &str, value: &str) -> bool {
        let mut state = self.state();
        match state.objects.get_mut(target) {
            Some(attrs) => insert_values(attrs, attribute, &[value.to_string()]),
            None => false,
        }
    }

    pub fn remove_value(&self, target: &ObjectRef, attribute: &str, value: &str) -> bool {
        let mut state = self.state();
        match state.objects.get_mut(target) {
            Some(attrs) => remove_values(attrs, attribute, &[value.to_string()]),
            None => false,
        }
    }

    pub fn object(&self, target: &ObjectRef) -> Option<DirectoryObject> {
        self.state()
            .objects
            .get(target)
            .map(|attrs| DirectoryObject::new(target.clone(), attrs.clone()))
    }

    pub fn len(&self) -> usize {
        self.state().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ── Internals ───────────────────────────────────────────────────

    /// Record the call and pop an injected failure, if any.
    fn begin(&self, state: &mut State, operation: Operation, target: &ObjectRef) -> Result<()> {
        state.calls.push(Call {
            operation,
            target: target.clone(),
        });
        tracing::trace!(%operation, %target, "memory directory call");
        match state.failures.get_mut(&operation).and_then(VecDeque::pop_front) {
            Some((code, message)) => Err(DirectoryError::from_remote(
                code,
                message,
                self.message_fallback,
            )),
            None => Ok(()),
        }
    }
}

fn not_found(target: &ObjectRef) -> DirectoryError {
    DirectoryError::new(
        ErrorKind::NotFound,
        Some(NOT_FOUND_CODE),
        format!("{}: {} not found", target.name, target.kind),
    )
}

fn empty_modlist() -> DirectoryError {
    DirectoryError::new(
        ErrorKind::NoModifications,
        Some(EMPTY_MODLIST_CODE),
        "no modifications to be performed",
    )
}

fn insert_values(attrs: &mut Attributes, attribute: &str, values: &[String]) -> bool {
    let current = attrs.entry(attribute.to_string()).or_default();
    let mut changed = false;
    for value in values {
        if !current.contains(value) {
            current.push(value.clone());
            changed = true;
        }
    }
    if current.is_empty() {
        attrs.remove(attribute);
    }
    changed
}

fn remove_values(attrs: &mut Attributes, attribute: &str, values: &[String]) -> bool {
    let Some(current) = attrs.get_mut(attribute) else {
        return false;
    };
    let before = current.len();
    current.retain(|v| !values.contains(v));
    let changed = current.len() != before;
    if current.is_empty() {
        attrs.remove(attribute);
    }
    changed
}

fn apply(attrs: &mut Attributes, changes: &Modifications) {
    for (attribute, values) in &changes.set {
        if values.is_empty() {
            attrs.remove(attribute);
        } else {
            attrs.insert(attribute.clone(), values.clone());
        }
    }
    for (attribute, values) in &changes.add {
        insert_values(attrs, attribute, values);
    }
    for (attribute, values) in &changes.remove {
        remove_values(attrs, attribute, values);
    }
}

#[async_trait]
impl DirectoryClient for MemoryDirectory {
    async fn show(&self, target: &ObjectRef) -> Result<DirectoryObject> {
        let mut state = self.state();
        self.begin(&mut state, Operation::Show, target)?;

        if let Some(remaining) = state.pending_visibility.get_mut(target) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(not_found(target));
            }
            state.pending_visibility.remove(target);
        }

        state
            .objects
            .get(target)
            .map(|attrs| DirectoryObject::new(target.clone(), attrs.clone()))
            .ok_or_else(|| not_found(target))
    }

    async fn create(&self, target: &ObjectRef, attributes: &Modifications) -> Result<DirectoryObject> {
        let mut state = self.state();
        self.begin(&mut state, Operation::Create, target)?;

        if state.objects.contains_key(target) {
            return Err(DirectoryError::rejected(
                Some(DUPLICATE_ENTRY_CODE),
                format!("{} with name \"{}\" already exists", target.kind, target.name),
            ));
        }
        if let (ObjectKind::DnsRecord, Some(container)) = (target.kind, &target.container) {
            let zone = ObjectRef::new(ObjectKind::DnsZone, container.clone());
            if !state.objects.contains_key(&zone) {
                return Err(not_found(&zone));
            }
        }

        let mut attrs = Attributes::new();
        apply(&mut attrs, attributes);
        state.objects.insert(target.clone(), attrs.clone());
        if self.read_lag > 0 {
            state.pending_visibility.insert(target.clone(), self.read_lag);
        }
        Ok(DirectoryObject::new(target.clone(), attrs))
    }

    async fn add_relation(
        &self,
        parent: &ObjectRef,
        relation: &RelationSpec,
        members: &[String],
    ) -> Result<()> {
        let mut state = self.state();
        self.begin(&mut state, Operation::AddRelation, parent)?;

        let attrs = state.objects.get_mut(parent).ok_or_else(|| not_found(parent))?;
        let already: Vec<&String> = members
            .iter()
            .filter(|m| {
                relation
                    .attributes
                    .iter()
                    .any(|a| attrs.get(*a).is_some_and(|vs| vs.contains(*m)))
            })
            .collect();
        if already.len() == members.len() {
            return Err(DirectoryError::new(
                ErrorKind::NoModifications,
                Some(EMPTY_MODLIST_CODE),
                format!("{}: This entry is already a member", relation.param),
            ));
        }
        let fresh: Vec<String> = members
            .iter()
            .filter(|m| !already.contains(m))
            .cloned()
            .collect();
        let attribute = relation.attributes.first().copied().unwrap_or(relation.param);
        insert_values(attrs, attribute, &fresh);
        Ok(())
    }

    async fn remove_relation(
        &self,
        parent: &ObjectRef,
        relation: &RelationSpec,
        members: &[String],
    ) -> Result<()> {
        let mut state = self.state();
        self.begin(&mut state, Operation::RemoveRelation, parent)?;

        let attrs = state.objects.get_mut(parent).ok_or_else(|| not_found(parent))?;
        let mut changed = false;
        for attribute in relation.attributes {
            changed |= remove_values(attrs, attribute, members);
        }
        if !changed {
            return Err(DirectoryError::new(
                ErrorKind::NoModifications,
                Some(EMPTY_MODLIST_CODE),
                format!("{}: This entry is not a member", relation.param),
            ));
        }
        Ok(())
    }

    async fn modify_attributes(&self, target: &ObjectRef, changes: &Modifications) -> Result<()> {
        let mut state = self.state();
        self.begin(&mut state, Operation::Modify, target)?;

        let attrs = state.objects.get_mut(target).ok_or_else(|| not_found(target))?;
        let mut updated = attrs.clone();
        apply(&mut updated, changes);
        if updated == *attrs {
            return Err(empty_modlist());
        }
        *attrs = updated;
        Ok(())
    }

    async fn delete(&self, target: &ObjectRef) -> Result<()> {
        let mut state = self.state();
        self.begin(&mut state, Operation::Delete, target)?;

        state.pending_visibility.remove(target);
        state
            .objects
            .remove(target)
            .map(|_| ())
            .ok_or_else(|| not_found(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMBER_USER: RelationSpec = RelationSpec {
        method: "member",
        param: "user",
        attributes: &["member_user"],
    };

    fn group(name: &str) -> ObjectRef {
        ObjectRef::new(ObjectKind::Group, name)
    }

    fn members(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn create_then_show() {
        let dir = MemoryDirectory::new();
        let mut mods = Modifications::new();
        mods.set("description", members(&["ops"]));
        dir.create(&group("g1"), &mods).await.unwrap();

        let shown = dir.show(&group("g1")).await.unwrap();
        assert_eq!(shown.scalar("description"), Some("ops"));
        assert_eq!(dir.count(Operation::Create), 1);
    }

    #[tokio::test]
    async fn duplicate_create_rejected() {
        let dir = MemoryDirectory::new();
        dir.insert_object(group("g1"), Attributes::new());
        let err = dir.create(&group("g1"), &Modifications::new()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Rejected);
        assert_eq!(err.code, Some(DUPLICATE_ENTRY_CODE));
    }

    #[tokio::test]
    async fn read_lag_hides_new_objects() {
        let dir = MemoryDirectory::new().with_read_lag(2);
        dir.create(&group("g1"), &Modifications::new()).await.unwrap();
        assert!(dir.show(&group("g1")).await.unwrap_err().is_not_found());
        assert!(dir.show(&group("g1")).await.unwrap_err().is_not_found());
        assert!(dir.show(&group("g1")).await.is_ok());
    }

    #[tokio::test]
    async fn duplicate_add_is_no_modification() {
        let dir = MemoryDirectory::new();
        dir.insert_object(group("g1"), Attributes::new());
        dir.add_relation(&group("g1"), &MEMBER_USER, &members(&["u1"])).await.unwrap();
        let err = dir
            .add_relation(&group("g1"), &MEMBER_USER, &members(&["u1"]))
            .await
            .unwrap_err();
        assert!(err.is_no_modifications());
    }

    #[tokio::test]
    async fn remove_absent_is_no_modification() {
        let dir = MemoryDirectory::new();
        dir.insert_object(group("g1"), Attributes::new());
        let err = dir
            .remove_relation(&group("g1"), &MEMBER_USER, &members(&["u1"]))
            .await
            .unwrap_err();
        assert!(err.is_no_modifications());
    }

    #[tokio::test]
    async fn add_to_missing_parent_is_not_found() {
        let dir = MemoryDirectory::new();
        let err = dir
            .add_relation(&group("nope"), &MEMBER_USER, &members(&["u1"]))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.code, Some(NOT_FOUND_CODE));
    }

    #[tokio::test]
    async fn unchanged_modify_is_empty_modlist() {
        let dir = MemoryDirectory::new();
        let mut attrs = Attributes::new();
        attrs.insert("description".into(), members(&["ops"]));
        dir.insert_object(group("g1"), attrs);

        let mut mods = Modifications::new();
        mods.set("description", members(&["ops"]));
        let err = dir.modify_attributes(&group("g1"), &mods).await.unwrap_err();
        assert_eq!(err.code, Some(EMPTY_MODLIST_CODE));
    }

    #[tokio::test]
    async fn injected_uncoded_failure_uses_fallback() {
        let dir = MemoryDirectory::new();
        dir.fail_next(Operation::Show, None, "g1: group not found");
        assert!(dir.show(&group("g1")).await.unwrap_err().is_not_found());

        let strict = MemoryDirectory::new().with_message_fallback(false);
        strict.fail_next(Operation::Show, None, "g1: group not found");
        let err = strict.show(&group("g1")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Rejected);
    }

    #[tokio::test]
    async fn record_requires_zone() {
        let dir = MemoryDirectory::new();
        let record = ObjectRef::dns_record("example.com.", "www");
        let err = dir.create(&record, &Modifications::new()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn automember_container_is_not_a_zone() {
        let dir = MemoryDirectory::new();
        let rule = ObjectRef::automember("group", "engineers");
        dir.create(&rule, &Modifications::new()).await.unwrap();
        assert!(dir.object(&rule).is_some());
        assert!(dir.object(&ObjectRef::new(ObjectKind::Automember, "engineers")).is_none());
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let dir = MemoryDirectory::new();
        assert!(dir.delete(&group("g1")).await.unwrap_err().is_not_found());
    }
}
