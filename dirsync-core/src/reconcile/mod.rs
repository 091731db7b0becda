//! Reconciliation flows composed from the engine components.
//!
//! Each reconciler borrows a [`DirectoryClient`](crate::client::DirectoryClient)
//! for the duration of one reconciliation and awaits its calls in sequence.

mod attribute_set;
mod membership;
mod object;

pub use attribute_set::AttributeSetReconciler;
pub use membership::MembershipReconciler;
pub use object::ObjectReconciler;
