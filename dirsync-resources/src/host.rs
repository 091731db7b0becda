//! Hosts.
//!
//! A freshly created host is often not yet visible on the replica serving
//! the next read, so creation reads back through the retry policy.

use serde::{Deserialize, Serialize};

use dirsync_core::gate::should_apply_change;
use dirsync_core::{
    DirectoryClient, Modifications, ObjectKind, ObjectReconciler, ObjectRef, Outcome,
    ReconcileError, ResourceState, RetryPolicy,
};

use crate::{object_state, settle};

pub const DESCRIPTION: &str = "description";
pub const USER_PASSWORD: &str = "userpassword";

/// Attributes reported back; the one-time password is write-only.
const MANAGED: &[&str] = &["fqdn", DESCRIPTION];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostDecl {
    pub fqdn: String,
    #[serde(default)]
    pub description: Option<String>,
    /// One-time enrollment password.
    #[serde(default)]
    pub userpassword: Option<String>,
}

impl HostDecl {
    pub fn new(fqdn: impl Into<String>) -> Self {
        Self {
            fqdn: fqdn.into(),
            ..Default::default()
        }
    }

    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(ObjectKind::Host, self.fqdn.clone())
    }

    fn initial_attributes(&self) -> Modifications {
        let mut mods = Modifications::new();
        mods.set("fqdn", vec![self.fqdn.clone()]);
        if let Some(description) = &self.description {
            mods.set(DESCRIPTION, vec![description.clone()]);
        }
        if let Some(password) = &self.userpassword {
            mods.set(USER_PASSWORD, vec![password.clone()]);
        }
        mods
    }

    /// Fields that changed between two declarations.
    fn changes_from(&self, previous: &HostDecl) -> Modifications {
        let mut mods = Modifications::new();
        if should_apply_change(self.description.as_deref(), previous.description.as_deref()) {
            if let Some(description) = &self.description {
                mods.set(DESCRIPTION, vec![description.clone()]);
            }
        }
        if should_apply_change(self.userpassword.as_deref(), previous.userpassword.as_deref()) {
            if let Some(password) = &self.userpassword {
                mods.set(USER_PASSWORD, vec![password.clone()]);
            }
        }
        mods
    }
}

pub struct Hosts<'a, C: ?Sized> {
    objects: ObjectReconciler<'a, C>,
}

impl<'a, C: DirectoryClient + ?Sized> Hosts<'a, C> {
    pub fn new(client: &'a C, retry: RetryPolicy) -> Self {
        Self {
            objects: ObjectReconciler::new(client, retry),
        }
    }

    pub async fn create(&self, host: &HostDecl) -> Result<ResourceState, ReconcileError> {
        if host.fqdn.is_empty() {
            return Err(ReconcileError::InvalidDeclaration("host fqdn is required".into()));
        }
        tracing::debug!(fqdn = %host.fqdn, "creating host");
        let created = self
            .objects
            .create(&host.object_ref(), &host.initial_attributes())
            .await?;
        Ok(object_state(&host.fqdn, Outcome::Applied, &created, MANAGED))
    }

    pub async fn read(&self, fqdn: &str) -> Result<ResourceState, ReconcileError> {
        let target = ObjectRef::new(ObjectKind::Host, fqdn);
        match self.objects.read(&target).await? {
            Some(object) => Ok(object_state(fqdn, Outcome::Unchanged, &object, MANAGED)),
            None => Ok(ResourceState::gone(fqdn)),
        }
    }

    /// Send only what changed since the previous declaration.
    pub async fn update(
        &self,
        previous: &HostDecl,
        declared: &HostDecl,
    ) -> Result<ResourceState, ReconcileError> {
        if previous.fqdn != declared.fqdn {
            return Err(ReconcileError::InvalidDeclaration(format!(
                "host fqdn cannot change ({} -> {}); replace the host instead",
                previous.fqdn, declared.fqdn
            )));
        }
        let mods = declared.changes_from(previous);
        let outcome = match self.objects.modify(&declared.object_ref(), &mods).await {
            Err(ReconcileError::Conflict(e)) if e.is_not_found() => Outcome::GoneRemotely,
            other => other?,
        };
        if outcome.is_gone() {
            return Ok(ResourceState::gone(declared.fqdn.clone()));
        }
        Ok(settle(self.read(&declared.fqdn).await?, outcome))
    }

    pub async fn delete(&self, fqdn: &str) -> Result<Outcome, ReconcileError> {
        self.objects
            .delete(&ObjectRef::new(ObjectKind::Host, fqdn))
            .await
    }
}
