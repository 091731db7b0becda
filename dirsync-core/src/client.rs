//! DirectoryClient trait, the sole boundary between the engine and the
//! remote directory service.
//!
//! Session handling, TLS and RPC encoding live behind implementations of this
//! trait. Implementations must report failures as [`DirectoryError`] with a
//! structured [`ErrorKind`](crate::error::ErrorKind); when the underlying RPC
//! layer exposes no codes, [`DirectoryError::from_remote`] applies the
//! message fallback.

use async_trait::async_trait;

use crate::error::DirectoryError;
use crate::object::{DirectoryObject, Modifications, ObjectRef};
use crate::relation::RelationSpec;

pub type Result<T> = std::result::Result<T, DirectoryError>;

#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Fetch an object with all its attributes. `NotFound` if it does not exist.
    async fn show(&self, target: &ObjectRef) -> Result<DirectoryObject>;

    /// Create an object. Values in `attributes.set` and `attributes.add` are
    /// the initial attribute values.
    async fn create(
        &self,
        target: &ObjectRef,
        attributes: &Modifications,
    ) -> Result<DirectoryObject>;

    /// Add members to a relation of `parent`.
    ///
    /// `NoModifications` when every member was already present, `NotFound`
    /// when the parent does not exist.
    async fn add_relation(
        &self,
        parent: &ObjectRef,
        relation: &RelationSpec,
        members: &[String],
    ) -> Result<()>;

    /// Remove members from a relation of `parent`.
    ///
    /// `NoModifications` when none of the members was present.
    async fn remove_relation(
        &self,
        parent: &ObjectRef,
        relation: &RelationSpec,
        members: &[String],
    ) -> Result<()>;

    /// Apply attribute changes. `NoModifications` when nothing changes.
    async fn modify_attributes(
        &self,
        target: &ObjectRef,
        changes: &Modifications,
    ) -> Result<()>;

    /// Delete an object. `NotFound` if it does not exist.
    async fn delete(&self, target: &ObjectRef) -> Result<()>;
}
