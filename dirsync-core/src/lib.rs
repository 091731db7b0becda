//! dirsync-core: drives a replicated directory service toward declared state.
//!
//! - `identity`: composite `<parent>/<tag>/<member>` keys
//! - `set_diff`: minimal add/remove deltas between attribute sets
//! - `drift`: does a recorded relationship still exist remotely
//! - `gate`: which declared attributes take part in a mutation, and how its
//!   response is classified
//! - `retry`: bounded backoff for reads racing replication
//! - `reconcile`: membership, attribute-set and object flows built from the above
//!
//! The remote service is reached only through [`client::DirectoryClient`];
//! [`memory::MemoryDirectory`] is the in-process implementation.

pub mod client;
pub mod config;
pub mod drift;
pub mod error;
pub mod gate;
pub mod identity;
pub mod memory;
pub mod object;
pub mod outcome;
pub mod reconcile;
pub mod relation;
pub mod retry;
pub mod set_diff;

pub use client::DirectoryClient;
pub use config::EngineConfig;
pub use error::{DirectoryError, ErrorKind, ReconcileError};
pub use identity::{CompositeId, RawCompositeId};
pub use object::{Attributes, DirectoryObject, Modifications, ObjectKind, ObjectRef};
pub use outcome::{Outcome, ResourceState};
pub use reconcile::{AttributeSetReconciler, MembershipReconciler, ObjectReconciler};
pub use relation::{RelationSpec, RelationTag};
pub use retry::RetryPolicy;
