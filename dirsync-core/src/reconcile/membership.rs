use std::slice;

use crate::client::DirectoryClient;
use crate::drift::{self, Presence};
use crate::error::ReconcileError;
use crate::gate;
use crate::identity::CompositeId;
use crate::object::{Attributes, DirectoryObject};
use crate::outcome::{Outcome, ResourceState};
use crate::relation::RelationTag;
use crate::retry::{retry_read, RetryPolicy};

/// Create/read/delete for relationship resources.
///
/// Relationships are immutable: a changed declaration is a delete followed
/// by a create under a new composite id.
pub struct MembershipReconciler<'a, C: ?Sized> {
    client: &'a C,
    retry: RetryPolicy,
}

impl<'a, C: DirectoryClient + ?Sized> MembershipReconciler<'a, C> {
    pub fn new(client: &'a C, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Add the member, then confirm it through a retried read of the parent.
    pub async fn create<T: RelationTag>(
        &self,
        id: &CompositeId<T>,
    ) -> Result<ResourceState, ReconcileError> {
        let parent = id.parent_ref();
        let spec = id.spec();
        tracing::debug!(parent = %parent, tag = id.tag.as_tag(), member = %id.member, "adding relation");

        let written = gate::classify(
            self.client
                .add_relation(&parent, &spec, slice::from_ref(&id.member))
                .await,
        )?;

        let object = retry_read(&self.retry, || self.client.show(&parent)).await?;
        let state = self.state_from(id, &object, written);
        if !state.is_tracked() {
            tracing::warn!(id = %id, "relation missing right after it was added");
        }
        Ok(state)
    }

    /// Refresh tracked state. A relationship whose member or parent has
    /// disappeared reports `GoneRemotely`.
    pub async fn read<T: RelationTag>(
        &self,
        id: &CompositeId<T>,
    ) -> Result<ResourceState, ReconcileError> {
        let parent = id.parent_ref();
        let object = drift::observe(self.client.show(&parent).await)?;
        match (drift::presence(object.as_ref(), id.tag, &id.member), object) {
            (Presence::Present, Some(object)) => Ok(self.state_from(id, &object, Outcome::Unchanged)),
            _ => {
                tracing::warn!(id = %id, "relation removed out of band");
                Ok(ResourceState::gone(id.encode()))
            }
        }
    }

    /// Import an existing relationship from its persisted key.
    pub async fn read_key<T: RelationTag>(&self, key: &str) -> Result<ResourceState, ReconcileError> {
        let id = CompositeId::<T>::decode(key)?;
        self.read(&id).await
    }

    /// Remove the member. Already absent, or parent gone, is `GoneRemotely`.
    pub async fn delete<T: RelationTag>(&self, id: &CompositeId<T>) -> Result<Outcome, ReconcileError> {
        let parent = id.parent_ref();
        tracing::debug!(parent = %parent, tag = id.tag.as_tag(), member = %id.member, "removing relation");
        gate::classify_delete(
            self.client
                .remove_relation(&parent, &id.spec(), slice::from_ref(&id.member))
                .await,
        )
    }

    fn state_from<T: RelationTag>(
        &self,
        id: &CompositeId<T>,
        parent: &DirectoryObject,
        outcome: Outcome,
    ) -> ResourceState {
        if !drift::member_present(parent, id.spec().attributes, &id.member) {
            return ResourceState::gone(id.encode());
        }
        let mut attributes = Attributes::new();
        attributes.insert("name".to_string(), vec![id.parent.clone()]);
        attributes.insert(id.spec().param.to_string(), vec![id.member.clone()]);
        ResourceState::new(id.encode(), outcome, attributes)
    }
}
