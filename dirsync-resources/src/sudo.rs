//! Sudo rules.
//!
//! Members, commands and options are relationship resources (see
//! `vocabulary`); the rule object itself carries only scalars.

use serde::{Deserialize, Serialize};

use dirsync_core::{ObjectKind, ObjectRef, ReconcileError};

use crate::scalar::{flag, required, Category, ScalarDecl};

pub const DESCRIPTION: &str = "description";
pub const ENABLED: &str = "ipaenabledflag";
pub const USER_CATEGORY: &str = "usercategory";
pub const HOST_CATEGORY: &str = "hostcategory";
pub const COMMAND_CATEGORY: &str = "cmdcategory";
pub const RUNAS_USER_CATEGORY: &str = "ipasudorunasusercategory";
pub const RUNAS_GROUP_CATEGORY: &str = "ipasudorunasgroupcategory";
pub const ORDER: &str = "sudoorder";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SudoRuleDecl {
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub usercategory: Option<Category>,
    pub hostcategory: Option<Category>,
    pub commandcategory: Option<Category>,
    pub runasusercategory: Option<Category>,
    pub runasgroupcategory: Option<Category>,
    /// Evaluation order; must be unique across rules.
    pub order: Option<i32>,
}

impl Default for SudoRuleDecl {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            enabled: true,
            usercategory: None,
            hostcategory: None,
            commandcategory: None,
            runasusercategory: None,
            runasgroupcategory: None,
            order: None,
        }
    }
}

impl SudoRuleDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

fn category(value: Option<Category>) -> Option<String> {
    value.map(|c| c.to_string())
}

impl ScalarDecl for SudoRuleDecl {
    fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(ObjectKind::SudoRule, self.name.clone())
    }

    fn validate(&self) -> Result<(), ReconcileError> {
        required("sudorule", "name", &self.name)
    }

    fn scalars(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            (DESCRIPTION, self.description.clone()),
            (ENABLED, Some(flag(self.enabled))),
            (USER_CATEGORY, category(self.usercategory)),
            (HOST_CATEGORY, category(self.hostcategory)),
            (COMMAND_CATEGORY, category(self.commandcategory)),
            (RUNAS_USER_CATEGORY, category(self.runasusercategory)),
            (RUNAS_GROUP_CATEGORY, category(self.runasgroupcategory)),
            (ORDER, self.order.map(|o| o.to_string())),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_unless_said_otherwise() {
        let rule: SudoRuleDecl = serde_json::from_value(serde_json::json!({
            "name": "admins_all",
            "hostcategory": "all",
            "order": 10
        }))
        .unwrap();
        assert!(rule.enabled);

        let mods = rule.initial_attributes();
        assert_eq!(mods.attribute_names(), vec![HOST_CATEGORY, ENABLED, ORDER]);
        assert_eq!(mods.set[ENABLED], vec!["TRUE".to_string()]);
        assert_eq!(mods.set[HOST_CATEGORY], vec!["all".to_string()]);
    }

    #[test]
    fn unknown_category_rejected() {
        let parsed = serde_json::from_value::<SudoRuleDecl>(serde_json::json!({
            "name": "r1",
            "usercategory": "some"
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn name_required() {
        assert!(SudoRuleDecl::default().validate().is_err());
    }
}
