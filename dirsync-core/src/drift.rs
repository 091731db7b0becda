//! Drift detector: does a recorded relationship still exist remotely?
//!
//! A missing parent and a missing member collapse into the same answer,
//! [`Presence::Absent`]: the caller only needs to know whether to keep
//! tracking the relationship. Any other read failure is surfaced.

use crate::error::{DirectoryError, ReconcileError};
use crate::object::DirectoryObject;
use crate::relation::RelationTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Present,
    Absent,
}

/// Exact-match membership test over every attribute listed by the relation.
pub fn member_present(object: &DirectoryObject, attributes: &[&str], member: &str) -> bool {
    attributes
        .iter()
        .any(|attribute| object.contains(attribute, member))
}

/// Whether `member` is listed under `tag` on an already observed parent.
pub fn presence<T: RelationTag>(
    parent: Option<&DirectoryObject>,
    tag: T,
    member: &str,
) -> Presence {
    match parent {
        Some(object) if member_present(object, tag.spec().attributes, member) => Presence::Present,
        _ => Presence::Absent,
    }
}

/// Inspect the result of showing the parent for `member` under `tag`.
pub fn confirm<T: RelationTag>(
    read: Result<DirectoryObject, DirectoryError>,
    tag: T,
    member: &str,
) -> Result<Presence, ReconcileError> {
    Ok(presence(observe(read)?.as_ref(), tag, member))
}

/// `NotFound` becomes `None`; other failures become `Conflict`.
pub fn observe(
    read: Result<DirectoryObject, DirectoryError>,
) -> Result<Option<DirectoryObject>, ReconcileError> {
    match read {
        Ok(object) => Ok(Some(object)),
        Err(e) if e.is_not_found() => {
            tracing::debug!(error = %e, "object not found remotely");
            Ok(None)
        }
        Err(e) => Err(ReconcileError::Conflict(e)),
    }
}
