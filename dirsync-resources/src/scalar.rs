//! Objects managed through single-valued attributes.
//!
//! Updates compare declared scalars with a fresh read and send only the
//! ones that differ. `None` means "not managed": the remote value is left
//! alone.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use dirsync_core::gate::ModificationBuilder;
use dirsync_core::{
    DirectoryClient, Modifications, ObjectReconciler, ObjectRef, Outcome, ReconcileError,
    ResourceState, RetryPolicy,
};

use crate::{object_state, settle};

/// Rule category. The directory accepts `all` only; an unset category means
/// the rule applies to its explicit members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Category {
    All,
}

/// Boolean attribute value as the directory spells it.
pub(crate) fn flag(value: bool) -> String {
    if value { "TRUE" } else { "FALSE" }.to_string()
}

pub trait ScalarDecl {
    fn object_ref(&self) -> ObjectRef;

    /// `(attribute, declared value)` for every attribute the kind manages.
    fn scalars(&self) -> Vec<(&'static str, Option<String>)>;

    /// Checked before any call is made.
    fn validate(&self) -> Result<(), ReconcileError> {
        Ok(())
    }

    /// Attributes reported back in the resource state.
    fn managed(&self) -> Vec<&'static str> {
        self.scalars().into_iter().map(|(attribute, _)| attribute).collect()
    }

    fn apply_to<'o>(&self, builder: ModificationBuilder<'o>) -> ModificationBuilder<'o> {
        self.scalars()
            .iter()
            .fold(builder, |b, (attribute, value)| b.scalar(attribute, value.as_deref()))
    }

    fn initial_attributes(&self) -> Modifications {
        self.apply_to(ModificationBuilder::new(None)).build()
    }
}

pub(crate) fn required(kind: &str, field: &str, value: &str) -> Result<(), ReconcileError> {
    if value.trim().is_empty() {
        return Err(ReconcileError::InvalidDeclaration(format!("{kind}: {field} is required")));
    }
    Ok(())
}

pub struct ScalarObjects<'a, C: ?Sized> {
    objects: ObjectReconciler<'a, C>,
}

impl<'a, C: DirectoryClient + ?Sized> ScalarObjects<'a, C> {
    pub fn new(client: &'a C, retry: RetryPolicy) -> Self {
        Self {
            objects: ObjectReconciler::new(client, retry),
        }
    }

    pub async fn create<D: ScalarDecl + ?Sized>(&self, decl: &D) -> Result<ResourceState, ReconcileError> {
        decl.validate()?;
        let target = decl.object_ref();
        let created = self.objects.create(&target, &decl.initial_attributes()).await?;
        Ok(object_state(&target.name, Outcome::Applied, &created, &decl.managed()))
    }

    pub async fn read<D: ScalarDecl + ?Sized>(&self, decl: &D) -> Result<ResourceState, ReconcileError> {
        let target = decl.object_ref();
        match self.objects.read(&target).await? {
            Some(object) => Ok(object_state(&target.name, Outcome::Unchanged, &object, &decl.managed())),
            None => Ok(ResourceState::gone(target.name)),
        }
    }

    pub async fn update<D: ScalarDecl + ?Sized>(&self, decl: &D) -> Result<ResourceState, ReconcileError> {
        decl.validate()?;
        let target = decl.object_ref();
        let Some(current) = self.objects.read(&target).await? else {
            return Ok(ResourceState::gone(target.name));
        };
        let outcome = self
            .objects
            .update(&target, Some(&current), |b| decl.apply_to(b))
            .await?;
        Ok(settle(self.read(decl).await?, outcome))
    }

    pub async fn delete<D: ScalarDecl + ?Sized>(&self, decl: &D) -> Result<Outcome, ReconcileError> {
        self.objects.delete(&decl.object_ref()).await
    }
}
