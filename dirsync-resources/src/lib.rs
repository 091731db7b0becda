//! dirsync-resources: directory resource kinds on top of `dirsync-core`.
//!
//! - `vocabulary`: relation tags of every relationship resource
//! - `scalar`: objects reconciled through single-valued attributes
//! - `dns`: DNS record sets
//! - `zone`: DNS zones and their SOA settings
//! - `user`: user scalars and multi-valued user attributes
//! - `host`: hosts, created with a replication-aware read-back
//! - `group`: user groups and description-only objects
//! - `sudo`, `hbac`: rule objects that memberships attach to
//! - `automember`: automember rules and their conditions

pub mod automember;
pub mod dns;
pub mod group;
pub mod hbac;
pub mod host;
pub mod scalar;
pub mod sudo;
pub mod user;
pub mod vocabulary;
pub mod zone;

use dirsync_core::{DirectoryObject, Outcome, ResourceState};

/// Keep a read-back `GoneRemotely`; otherwise report the mutation outcome.
pub(crate) fn settle(read_back: ResourceState, outcome: Outcome) -> ResourceState {
    if read_back.is_tracked() {
        read_back.with_outcome(outcome)
    } else {
        read_back
    }
}

/// Resource state of a whole object, limited to the attributes it manages.
pub(crate) fn object_state(
    id: &str,
    outcome: Outcome,
    object: &DirectoryObject,
    managed: &[&str],
) -> ResourceState {
    ResourceState::new(id, outcome, object.project(managed))
}
