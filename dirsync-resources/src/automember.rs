//! Automember rules and their conditions.
//!
//! A rule targets a group or host group of the same name. Conditions live on
//! the rule as `<key>=<regex>` values of the inclusive and exclusive regex
//! attributes; each declared condition manages the values of one key and
//! leaves other keys alone.
//!
//! Conditions are imported with the key `<rule>/<type>/<key>`, e.g.
//! `engineers/group/manager`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use dirsync_core::identity;
use dirsync_core::set_diff::diff_strings;
use dirsync_core::{
    Attributes, DirectoryClient, DirectoryObject, Modifications, ObjectReconciler, ObjectRef,
    Outcome, ReconcileError, ResourceState, RetryPolicy,
};

use crate::scalar::{required, ScalarDecl};
use crate::settle;

pub const DESCRIPTION: &str = "description";
pub const INCLUSIVE_REGEX: &str = "automemberinclusiveregex";
pub const EXCLUSIVE_REGEX: &str = "automemberexclusiveregex";

/// What kind of group a rule populates.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    Group,
    Hostgroup,
}

// ── Rules ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomemberRuleDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub grouping: Grouping,
    #[serde(default)]
    pub description: Option<String>,
}

impl AutomemberRuleDecl {
    pub fn new(grouping: Grouping, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            grouping,
            description: None,
        }
    }
}

impl ScalarDecl for AutomemberRuleDecl {
    fn object_ref(&self) -> ObjectRef {
        ObjectRef::automember(self.grouping.to_string(), self.name.clone())
    }

    fn validate(&self) -> Result<(), ReconcileError> {
        required("automember", "name", &self.name)
    }

    fn scalars(&self) -> Vec<(&'static str, Option<String>)> {
        vec![(DESCRIPTION, self.description.clone())]
    }
}

// ── Conditions ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomemberConditionDecl {
    /// Rule the condition belongs to.
    pub name: String,
    #[serde(rename = "type")]
    pub grouping: Grouping,
    /// Entry attribute the regexes are matched against.
    pub key: String,
    #[serde(default, rename = "inclusiveregex")]
    pub inclusive_regex: Vec<String>,
    #[serde(default, rename = "exclusiveregex")]
    pub exclusive_regex: Vec<String>,
}

impl AutomemberConditionDecl {
    pub fn new(grouping: Grouping, name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            grouping,
            key: key.into(),
            inclusive_regex: Vec::new(),
            exclusive_regex: Vec::new(),
        }
    }

    pub fn id(&self) -> String {
        identity::encode(&self.name, self.grouping.as_ref(), &self.key)
    }

    pub fn rule_ref(&self) -> ObjectRef {
        ObjectRef::automember(self.grouping.to_string(), self.name.clone())
    }

    fn validate(&self) -> Result<(), ReconcileError> {
        required("automember condition", "name", &self.name)?;
        required("automember condition", "key", &self.key)?;
        if self.key.contains('=') {
            return Err(ReconcileError::InvalidDeclaration(format!(
                "automember condition {}: key {:?} contains '='",
                self.id(),
                self.key
            )));
        }
        if self.inclusive_regex.is_empty() && self.exclusive_regex.is_empty() {
            return Err(ReconcileError::InvalidDeclaration(format!(
                "automember condition {}: at least one inclusive or exclusive regex is required",
                self.id()
            )));
        }
        Ok(())
    }

    fn declared(&self) -> [(&'static str, Vec<String>); 2] {
        let values = |regexes: &[String]| {
            regexes
                .iter()
                .map(|regex| format!("{}={regex}", self.key))
                .collect::<Vec<_>>()
        };
        [
            (INCLUSIVE_REGEX, values(&self.inclusive_regex)),
            (EXCLUSIVE_REGEX, values(&self.exclusive_regex)),
        ]
    }
}

/// Values of `attribute` that belong to `key`.
fn key_values(object: &DirectoryObject, attribute: &str, key: &str) -> Vec<String> {
    let prefix = format!("{key}=");
    object
        .values(attribute)
        .iter()
        .filter(|v| v.starts_with(&prefix))
        .cloned()
        .collect()
}

fn strip_key(values: Vec<String>, key: &str) -> Vec<String> {
    let prefix_len = key.len() + 1;
    values.into_iter().map(|v| v[prefix_len..].to_string()).collect()
}

pub struct AutomemberConditions<'a, C: ?Sized> {
    objects: ObjectReconciler<'a, C>,
}

impl<'a, C: DirectoryClient + ?Sized> AutomemberConditions<'a, C> {
    pub fn new(client: &'a C, retry: RetryPolicy) -> Self {
        Self {
            objects: ObjectReconciler::new(client, retry),
        }
    }

    /// Add the declared regexes to the rule. A missing rule is a conflict.
    pub async fn create(&self, decl: &AutomemberConditionDecl) -> Result<ResourceState, ReconcileError> {
        decl.validate()?;
        let mut mods = Modifications::new();
        for (attribute, values) in decl.declared() {
            mods.add(attribute, values);
        }
        tracing::debug!(condition = %decl.id(), "adding automember condition");
        let outcome = self.objects.modify(&decl.rule_ref(), &mods).await?;
        Ok(settle(self.read(decl).await?, outcome))
    }

    /// Regexes currently held under the condition's key.
    pub async fn read(&self, decl: &AutomemberConditionDecl) -> Result<ResourceState, ReconcileError> {
        let Some(rule) = self.objects.read(&decl.rule_ref()).await? else {
            return Ok(ResourceState::gone(decl.id()));
        };
        let inclusive = key_values(&rule, INCLUSIVE_REGEX, &decl.key);
        let exclusive = key_values(&rule, EXCLUSIVE_REGEX, &decl.key);
        if inclusive.is_empty() && exclusive.is_empty() {
            tracing::warn!(condition = %decl.id(), "automember condition removed out of band");
            return Ok(ResourceState::gone(decl.id()));
        }

        let mut attributes = Attributes::new();
        attributes.insert("key".to_string(), vec![decl.key.clone()]);
        attributes.insert("inclusiveregex".to_string(), strip_key(inclusive, &decl.key));
        attributes.insert("exclusiveregex".to_string(), strip_key(exclusive, &decl.key));
        Ok(ResourceState::new(decl.id(), Outcome::Unchanged, attributes))
    }

    pub async fn import(&self, key: &str) -> Result<ResourceState, ReconcileError> {
        let (name, grouping, condition_key) = identity::decode(key)?;
        let grouping = Grouping::from_str(grouping).map_err(|_| {
            ReconcileError::malformed(key, format!("unsupported automember type {grouping:?}"))
        })?;
        if name.is_empty() || condition_key.is_empty() {
            return Err(ReconcileError::malformed(key, "rule name and condition key are required"));
        }
        self.read(&AutomemberConditionDecl::new(grouping, name, condition_key))
            .await
    }

    /// Converge the regexes of this key; other keys on the rule are untouched.
    pub async fn update(&self, decl: &AutomemberConditionDecl) -> Result<ResourceState, ReconcileError> {
        decl.validate()?;
        let Some(rule) = self.objects.read(&decl.rule_ref()).await? else {
            return Ok(ResourceState::gone(decl.id()));
        };
        let mut mods = Modifications::new();
        for (attribute, desired) in decl.declared() {
            let delta = diff_strings(&key_values(&rule, attribute, &decl.key), &desired);
            mods.add(attribute, delta.to_add).remove(attribute, delta.to_remove);
        }
        let outcome = self.objects.modify(&decl.rule_ref(), &mods).await?;
        Ok(settle(self.read(decl).await?, outcome))
    }

    /// Remove every regex of this key.
    pub async fn delete(&self, decl: &AutomemberConditionDecl) -> Result<Outcome, ReconcileError> {
        let Some(rule) = self.objects.read(&decl.rule_ref()).await? else {
            return Ok(Outcome::GoneRemotely);
        };
        let mut mods = Modifications::new();
        for attribute in [INCLUSIVE_REGEX, EXCLUSIVE_REGEX] {
            mods.remove(attribute, key_values(&rule, attribute, &decl.key));
        }
        if mods.is_empty() {
            return Ok(Outcome::GoneRemotely);
        }
        tracing::debug!(condition = %decl.id(), "removing automember condition");
        self.objects.modify(&decl.rule_ref(), &mods).await
    }
}
