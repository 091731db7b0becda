//! User groups and the description-only objects (host groups, sudo
//! commands, sudo command groups).

use serde::{Deserialize, Serialize};

use dirsync_core::{ObjectKind, ObjectRef, ReconcileError};

use crate::scalar::{required, ScalarDecl};

pub const DESCRIPTION: &str = "description";
pub const GID_NUMBER: &str = "gidnumber";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDecl {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub gid_number: Option<u32>,
}

impl GroupDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl ScalarDecl for GroupDecl {
    fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(ObjectKind::Group, self.name.clone())
    }

    fn validate(&self) -> Result<(), ReconcileError> {
        required("group", "name", &self.name)
    }

    fn scalars(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            (DESCRIPTION, self.description.clone()),
            (GID_NUMBER, self.gid_number.map(|n| n.to_string())),
        ]
    }
}

/// Host group, sudo command or sudo command group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescribedDecl {
    pub kind: ObjectKind,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl DescribedDecl {
    pub fn new(kind: ObjectKind, name: impl Into<String>) -> Result<Self, ReconcileError> {
        match kind {
            ObjectKind::Hostgroup | ObjectKind::SudoCmd | ObjectKind::SudoCmdGroup => Ok(Self {
                kind,
                name: name.into(),
                description: None,
            }),
            other => Err(ReconcileError::InvalidDeclaration(format!(
                "{other} is not a description-only object"
            ))),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl ScalarDecl for DescribedDecl {
    fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(self.kind, self.name.clone())
    }

    fn validate(&self) -> Result<(), ReconcileError> {
        required(self.kind.as_str(), "name", &self.name)
    }

    fn scalars(&self) -> Vec<(&'static str, Option<String>)> {
        vec![(DESCRIPTION, self.description.clone())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_declared_scalars_on_create() {
        let group = GroupDecl {
            gid_number: Some(40000),
            ..GroupDecl::new("ops")
        };
        let mods = group.initial_attributes();
        assert_eq!(mods.attribute_names(), vec![GID_NUMBER]);
        assert_eq!(mods.set[GID_NUMBER], vec!["40000".to_string()]);
    }

    #[test]
    fn described_kinds_are_checked() {
        assert!(DescribedDecl::new(ObjectKind::Hostgroup, "web").is_ok());
        assert!(DescribedDecl::new(ObjectKind::SudoCmd, "/usr/bin/less").is_ok());
        let err = DescribedDecl::new(ObjectKind::User, "jdoe").unwrap_err();
        assert!(err.to_string().contains("user"));
    }
}
