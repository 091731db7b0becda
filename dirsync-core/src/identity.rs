//! Identity codec: composite identifiers for relationship resources.
//!
//! A relationship has no natural primary key on the remote side, so its
//! external ID is `<parent>/<tag>/<member>`. This format is persisted by the
//! orchestrator and must stay stable.
//!
//! Decoding splits on the first two delimiters only: the member is the
//! remainder of the key and may itself contain `/`. No normalization is
//! applied; the remote service's own case rules are authoritative.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ReconcileError;
use crate::object::ObjectRef;
use crate::relation::{RelationSpec, RelationTag};

pub const DELIMITER: char = '/';

/// Join the three parts into a key.
pub fn encode(parent: &str, tag: &str, member: &str) -> String {
    let mut key = String::with_capacity(parent.len() + tag.len() + member.len() + 2);
    key.push_str(parent);
    key.push(DELIMITER);
    key.push_str(tag);
    key.push(DELIMITER);
    key.push_str(member);
    key
}

/// Split a key into `(parent, tag, member)`.
pub fn decode(key: &str) -> Result<(&str, &str, &str), ReconcileError> {
    let mut parts = key.splitn(3, DELIMITER);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(parent), Some(tag), Some(member)) => Ok((parent, tag, member)),
        _ => Err(ReconcileError::malformed(
            key,
            "expected <parent>/<tag>/<member>",
        )),
    }
}

/// Untyped composite identifier: the tag is whatever string was persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawCompositeId {
    pub parent: String,
    pub tag: String,
    pub member: String,
}

impl RawCompositeId {
    pub fn new(
        parent: impl Into<String>,
        tag: impl Into<String>,
        member: impl Into<String>,
    ) -> Self {
        Self {
            parent: parent.into(),
            tag: tag.into(),
            member: member.into(),
        }
    }

    pub fn encode(&self) -> String {
        encode(&self.parent, &self.tag, &self.member)
    }

    pub fn decode(key: &str) -> Result<Self, ReconcileError> {
        let (parent, tag, member) = decode(key)?;
        Ok(Self::new(parent, tag, member))
    }
}

impl fmt::Display for RawCompositeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{DELIMITER}{}{DELIMITER}{}",
            self.parent, self.tag, self.member
        )
    }
}

impl FromStr for RawCompositeId {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

/// Composite identifier whose tag belongs to the vocabulary `T`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeId<T: RelationTag> {
    pub parent: String,
    pub tag: T,
    pub member: String,
}

impl<T: RelationTag> CompositeId<T> {
    /// Validate a declared relationship.
    ///
    /// Parent and member must be non-empty and the parent must not contain
    /// the delimiter, otherwise the encoded key would not decode back.
    pub fn new(
        parent: impl Into<String>,
        tag: T,
        member: impl Into<String>,
    ) -> Result<Self, ReconcileError> {
        let parent = parent.into();
        let member = member.into();
        if parent.is_empty() || member.is_empty() {
            return Err(ReconcileError::InvalidDeclaration(format!(
                "{}: parent and member names are required",
                T::RESOURCE
            )));
        }
        if parent.contains(DELIMITER) {
            return Err(ReconcileError::InvalidDeclaration(format!(
                "{}: parent name {parent:?} contains '{DELIMITER}'",
                T::RESOURCE
            )));
        }
        Ok(Self {
            parent,
            tag,
            member,
        })
    }

    pub fn encode(&self) -> String {
        encode(&self.parent, self.tag.as_tag(), &self.member)
    }

    /// Decode a persisted key, checking the tag against the vocabulary.
    pub fn decode(key: &str) -> Result<Self, ReconcileError> {
        let (parent, tag, member) = decode(key)?;
        let tag = T::from_tag(tag).ok_or_else(|| {
            ReconcileError::malformed(
                key,
                format!("unknown relation tag {tag:?} for {}", T::RESOURCE),
            )
        })?;
        if parent.is_empty() || member.is_empty() {
            return Err(ReconcileError::malformed(
                key,
                "parent and member segments must be non-empty",
            ));
        }
        Ok(Self {
            parent: parent.to_string(),
            tag,
            member: member.to_string(),
        })
    }

    pub fn parent_ref(&self) -> ObjectRef {
        ObjectRef::new(T::PARENT, self.parent.clone())
    }

    pub fn spec(&self) -> RelationSpec {
        self.tag.spec()
    }

    pub fn to_raw(&self) -> RawCompositeId {
        RawCompositeId::new(self.parent.clone(), self.tag.as_tag(), self.member.clone())
    }
}

impl<T: RelationTag> fmt::Display for CompositeId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl<T: RelationTag> FromStr for CompositeId<T> {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
