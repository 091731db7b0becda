//! HBAC policies (host-based access control rules).

use serde::{Deserialize, Serialize};

use dirsync_core::{ObjectKind, ObjectRef, ReconcileError};

use crate::scalar::{flag, required, Category, ScalarDecl};

pub const DESCRIPTION: &str = "description";
pub const ENABLED: &str = "ipaenabledflag";
pub const USER_CATEGORY: &str = "usercategory";
pub const HOST_CATEGORY: &str = "hostcategory";
pub const SERVICE_CATEGORY: &str = "servicecategory";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HbacPolicyDecl {
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub usercategory: Option<Category>,
    pub hostcategory: Option<Category>,
    pub servicecategory: Option<Category>,
}

impl Default for HbacPolicyDecl {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            enabled: true,
            usercategory: None,
            hostcategory: None,
            servicecategory: None,
        }
    }
}

impl HbacPolicyDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl ScalarDecl for HbacPolicyDecl {
    fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(ObjectKind::HbacRule, self.name.clone())
    }

    fn validate(&self) -> Result<(), ReconcileError> {
        required("hbacrule", "name", &self.name)
    }

    fn scalars(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            (DESCRIPTION, self.description.clone()),
            (ENABLED, Some(flag(self.enabled))),
            (USER_CATEGORY, self.usercategory.map(|c| c.to_string())),
            (HOST_CATEGORY, self.hostcategory.map(|c| c.to_string())),
            (SERVICE_CATEGORY, self.servicecategory.map(|c| c.to_string())),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_policy() {
        let policy = HbacPolicyDecl {
            enabled: false,
            servicecategory: Some(Category::All),
            ..HbacPolicyDecl::new("allow_all_services")
        };
        let mods = policy.initial_attributes();
        assert_eq!(mods.set[ENABLED], vec!["FALSE".to_string()]);
        assert_eq!(mods.set[SERVICE_CATEGORY], vec!["all".to_string()]);
        assert!(!mods.set.contains_key(USER_CATEGORY));
        assert_eq!(policy.object_ref().kind, ObjectKind::HbacRule);
    }
}
