use crate::client::DirectoryClient;
use crate::drift;
use crate::error::ReconcileError;
use crate::gate::{self, ModificationBuilder};
use crate::object::{Attributes, ObjectRef};
use crate::outcome::Outcome;

/// Reconciles multi-valued attributes of one object against declared sets.
///
/// Current values are always read fresh: the remote API takes explicit
/// add/remove lists, so the delta must be computed against what is there now.
pub struct AttributeSetReconciler<'a, C: ?Sized> {
    client: &'a C,
}

impl<'a, C: DirectoryClient + ?Sized> AttributeSetReconciler<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Current values of `attributes`, or `None` if the object is gone.
    pub async fn read(
        &self,
        target: &ObjectRef,
        attributes: &[&str],
    ) -> Result<Option<Attributes>, ReconcileError> {
        let object = drift::observe(self.client.show(target).await)?;
        Ok(object.map(|o| o.project(attributes)))
    }

    /// Bring each declared set to its desired contents. Undeclared (`None`)
    /// sets are left alone.
    pub async fn apply(
        &self,
        target: &ObjectRef,
        declared: &[(&str, Option<&[String]>)],
    ) -> Result<Outcome, ReconcileError> {
        self.apply_with(target, |builder| {
            declared
                .iter()
                .fold(builder, |b, (attribute, values)| b.delta(attribute, *values))
        })
        .await
    }

    /// Like [`apply`](Self::apply), with the modifications assembled by
    /// `build` against the freshly read object.
    pub async fn apply_with<F>(&self, target: &ObjectRef, build: F) -> Result<Outcome, ReconcileError>
    where
        F: for<'o> FnOnce(ModificationBuilder<'o>) -> ModificationBuilder<'o>,
    {
        let Some(current) = drift::observe(self.client.show(target).await)? else {
            tracing::warn!(object = %target, "object removed out of band");
            return Ok(Outcome::GoneRemotely);
        };

        let mods = build(ModificationBuilder::new(Some(&current))).build();
        if mods.is_empty() {
            tracing::debug!(object = %target, "attribute sets already converged");
            return Ok(Outcome::Unchanged);
        }

        tracing::debug!(object = %target, attributes = ?mods.attribute_names(), "modifying attribute sets");
        gate::classify(self.client.modify_attributes(target, &mods).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryDirectory, Operation};
    use crate::object::ObjectKind;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn jdoe() -> ObjectRef {
        ObjectRef::new(ObjectKind::User, "jdoe")
    }

    fn directory(mail: &[&str]) -> MemoryDirectory {
        let dir = MemoryDirectory::new();
        let mut attrs = Attributes::new();
        attrs.insert("mail".into(), strings(mail));
        attrs.insert("uid".into(), strings(&["jdoe"]));
        dir.insert_object(jdoe(), attrs);
        dir
    }

    #[tokio::test]
    async fn converges_to_declared_set() {
        let dir = directory(&["a@example.com", "old@example.com"]);
        let engine = AttributeSetReconciler::new(&dir);
        let desired = strings(&["a@example.com", "b@example.com"]);

        let outcome = engine.apply(&jdoe(), &[("mail", Some(desired.as_slice()))]).await.unwrap();
        assert_eq!(outcome, Outcome::Applied);

        let mut mail = dir.object(&jdoe()).unwrap().values("mail").to_vec();
        mail.sort();
        assert_eq!(mail, desired);
    }

    #[tokio::test]
    async fn converged_set_issues_no_call() {
        let dir = directory(&["b@example.com", "a@example.com"]);
        let engine = AttributeSetReconciler::new(&dir);
        let desired = strings(&["a@example.com", "b@example.com"]);

        let outcome = engine.apply(&jdoe(), &[("mail", Some(desired.as_slice()))]).await.unwrap();
        assert_eq!(outcome, Outcome::Unchanged);
        assert_eq!(dir.count(Operation::Modify), 0);
    }

    #[tokio::test]
    async fn undeclared_set_untouched() {
        let dir = directory(&["a@example.com"]);
        let engine = AttributeSetReconciler::new(&dir);

        let outcome = engine.apply(&jdoe(), &[("mail", None)]).await.unwrap();
        assert_eq!(outcome, Outcome::Unchanged);
        assert_eq!(dir.object(&jdoe()).unwrap().values("mail"), strings(&["a@example.com"]));
    }

    #[tokio::test]
    async fn racing_writer_is_unchanged() {
        let dir = directory(&[]);
        dir.fail_next(Operation::Modify, Some(4202), "no modifications to be performed");
        let engine = AttributeSetReconciler::new(&dir);
        let desired = strings(&["a@example.com"]);

        let outcome = engine.apply(&jdoe(), &[("mail", Some(desired.as_slice()))]).await.unwrap();
        assert_eq!(outcome, Outcome::Unchanged);
    }

    #[tokio::test]
    async fn missing_object_is_gone() {
        let dir = MemoryDirectory::new();
        let engine = AttributeSetReconciler::new(&dir);
        assert_eq!(engine.read(&jdoe(), &["mail"]).await.unwrap(), None);
        let desired = strings(&["a@example.com"]);
        let outcome = engine.apply(&jdoe(), &[("mail", Some(desired.as_slice()))]).await.unwrap();
        assert_eq!(outcome, Outcome::GoneRemotely);
    }

    #[tokio::test]
    async fn read_projects_requested_attributes() {
        let dir = directory(&["a@example.com"]);
        let engine = AttributeSetReconciler::new(&dir);
        let attrs = engine.read(&jdoe(), &["mail", "ipasshpubkey"]).await.unwrap().unwrap();
        assert_eq!(attrs["mail"], strings(&["a@example.com"]));
        assert!(!attrs.contains_key("uid"));
    }
}
