use crate::client::DirectoryClient;
use crate::drift;
use crate::error::ReconcileError;
use crate::gate::{self, ModificationBuilder};
use crate::object::{DirectoryObject, Modifications, ObjectRef};
use crate::outcome::Outcome;
use crate::retry::{retry_read, RetryPolicy};

/// Lifecycle of whole directory objects.
pub struct ObjectReconciler<'a, C: ?Sized> {
    client: &'a C,
    retry: RetryPolicy,
}

impl<'a, C: DirectoryClient + ?Sized> ObjectReconciler<'a, C> {
    pub fn new(client: &'a C, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Create the object and read it back, riding out replication lag.
    pub async fn create(
        &self,
        target: &ObjectRef,
        attributes: &Modifications,
    ) -> Result<DirectoryObject, ReconcileError> {
        tracing::debug!(object = %target, attributes = ?attributes.attribute_names(), "creating object");
        self.client
            .create(target, attributes)
            .await
            .map_err(ReconcileError::Conflict)?;
        retry_read(&self.retry, || self.client.show(target)).await
    }

    /// Current object, or `None` when it no longer exists.
    pub async fn read(&self, target: &ObjectRef) -> Result<Option<DirectoryObject>, ReconcileError> {
        let object = drift::observe(self.client.show(target).await)?;
        if object.is_none() {
            tracing::warn!(object = %target, "object removed out of band");
        }
        Ok(object)
    }

    /// Gated update against the last known state.
    ///
    /// `known` is what the caller last recorded; `build` adds the declared
    /// attributes. Nothing declared or nothing changed means no call at all.
    pub async fn update<F>(
        &self,
        target: &ObjectRef,
        known: Option<&DirectoryObject>,
        build: F,
    ) -> Result<Outcome, ReconcileError>
    where
        F: for<'o> FnOnce(ModificationBuilder<'o>) -> ModificationBuilder<'o>,
    {
        let mods = build(ModificationBuilder::new(known)).build();
        self.modify(target, &mods).await
    }

    /// Send prepared modifications; empty ones are skipped.
    pub async fn modify(&self, target: &ObjectRef, mods: &Modifications) -> Result<Outcome, ReconcileError> {
        if mods.is_empty() {
            return Ok(Outcome::Unchanged);
        }
        tracing::debug!(object = %target, attributes = ?mods.attribute_names(), "modifying object");
        gate::classify(self.client.modify_attributes(target, mods).await)
    }

    /// Delete; an object that is already gone is not an error.
    pub async fn delete(&self, target: &ObjectRef) -> Result<Outcome, ReconcileError> {
        tracing::debug!(object = %target, "deleting object");
        gate::classify_delete(self.client.delete(target).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryDirectory, Operation};
    use crate::object::{Attributes, ObjectKind};
    use std::time::Duration;

    fn host() -> ObjectRef {
        ObjectRef::new(ObjectKind::Host, "web1.example.com")
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(100))
    }

    fn described(text: &str) -> Modifications {
        let mut mods = Modifications::new();
        mods.set("description", vec![text.to_string()]);
        mods
    }

    #[tokio::test(start_paused = true)]
    async fn create_waits_out_read_lag() {
        let dir = MemoryDirectory::new().with_read_lag(2);
        let engine = ObjectReconciler::new(&dir, policy(5));

        let object = engine.create(&host(), &described("web")).await.unwrap();
        assert_eq!(object.scalar("description"), Some("web"));
        assert_eq!(dir.count(Operation::Show), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn create_gives_up_after_budget() {
        let dir = MemoryDirectory::new().with_read_lag(10);
        let engine = ObjectReconciler::new(&dir, policy(3));

        let err = engine.create(&host(), &described("web")).await.unwrap_err();
        assert!(matches!(err, ReconcileError::TransientUnavailable { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn duplicate_create_is_conflict() {
        let dir = MemoryDirectory::new();
        dir.insert_object(host(), Attributes::new());
        let engine = ObjectReconciler::new(&dir, policy(3));
        let err = engine.create(&host(), &Modifications::new()).await.unwrap_err();
        assert!(matches!(err, ReconcileError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_without_changes_skips_call() {
        let dir = MemoryDirectory::new();
        let engine = ObjectReconciler::new(&dir, policy(3));
        let known = engine.create(&host(), &described("web")).await.unwrap();

        let outcome = engine
            .update(&known.reference, Some(&known), |b| {
                b.scalar("description", Some("web")).scalar("locality", None)
            })
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Unchanged);
        assert_eq!(dir.count(Operation::Modify), 0);
    }

    #[tokio::test]
    async fn update_applies_changed_scalar() {
        let dir = MemoryDirectory::new();
        let engine = ObjectReconciler::new(&dir, policy(3));
        let known = engine.create(&host(), &described("web")).await.unwrap();

        let outcome = engine
            .update(&host(), Some(&known), |b| b.scalar("description", Some("frontend")))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(
            dir.object(&host()).unwrap().scalar("description"),
            Some("frontend")
        );
    }

    #[tokio::test]
    async fn read_of_deleted_object_is_none() {
        let dir = MemoryDirectory::new();
        dir.insert_object(host(), Attributes::new());
        let engine = ObjectReconciler::new(&dir, policy(3));
        dir.remove_object(&host());
        assert!(engine.read(&host()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_of_missing_object_is_gone() {
        let dir = MemoryDirectory::new();
        let engine = ObjectReconciler::new(&dir, policy(3));
        assert_eq!(engine.delete(&host()).await.unwrap(), Outcome::GoneRemotely);
    }
}
