//! Users.
//!
//! Single-valued attributes go through [`ScalarObjects`](crate::scalar::ScalarObjects)
//! with a [`UserDecl`]. Multi-valued ones are reconciled as sets by [`Users`]:
//! every set is optional, `None` leaves the remote values alone and
//! `Some(vec![])` clears them.

use serde::{Deserialize, Serialize};

use dirsync_core::{
    AttributeSetReconciler, DirectoryClient, ObjectKind, ObjectRef, Outcome, ReconcileError,
    ResourceState,
};

use crate::scalar::{flag, required, ScalarDecl};
use crate::settle;

// ── Scalar attributes ───────────────────────────────────────────────

pub const FIRST_NAME: &str = "givenname";
pub const LAST_NAME: &str = "sn";
pub const FULL_NAME: &str = "cn";
pub const DISPLAY_NAME: &str = "displayname";
pub const INITIALS: &str = "initials";
pub const HOME_DIRECTORY: &str = "homedirectory";
pub const GECOS: &str = "gecos";
pub const LOGIN_SHELL: &str = "loginshell";
pub const UID_NUMBER: &str = "uidnumber";
pub const GID_NUMBER: &str = "gidnumber";
pub const STREET: &str = "street";
pub const CITY: &str = "l";
pub const PROVINCE: &str = "st";
pub const POSTAL_CODE: &str = "postalcode";
pub const ORGANISATION_UNIT: &str = "ou";
pub const JOB_TITLE: &str = "title";
pub const MANAGER: &str = "manager";
pub const EMPLOYEE_NUMBER: &str = "employeenumber";
pub const EMPLOYEE_TYPE: &str = "employeetype";
pub const PREFERRED_LANGUAGE: &str = "preferredlanguage";
pub const ACCOUNT_DISABLED: &str = "nsaccountlock";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserDecl {
    pub uid: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: Option<String>,
    pub display_name: Option<String>,
    pub initials: Option<String>,
    pub home_directory: Option<String>,
    pub gecos: Option<String>,
    pub login_shell: Option<String>,
    pub uid_number: Option<u32>,
    pub gid_number: Option<u32>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
    pub organisation_unit: Option<String>,
    pub job_title: Option<String>,
    pub manager: Option<String>,
    pub employee_number: Option<String>,
    pub employee_type: Option<String>,
    pub preferred_language: Option<String>,
    pub account_disabled: Option<bool>,
}

impl UserDecl {
    pub fn new(uid: impl Into<String>, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Default::default()
        }
    }
}

impl ScalarDecl for UserDecl {
    fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(ObjectKind::User, self.uid.clone())
    }

    fn validate(&self) -> Result<(), ReconcileError> {
        required("user", "uid", &self.uid)?;
        required("user", "first_name", &self.first_name)?;
        required("user", "last_name", &self.last_name)
    }

    fn scalars(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            (FIRST_NAME, Some(self.first_name.clone())),
            (LAST_NAME, Some(self.last_name.clone())),
            (FULL_NAME, self.full_name.clone()),
            (DISPLAY_NAME, self.display_name.clone()),
            (INITIALS, self.initials.clone()),
            (HOME_DIRECTORY, self.home_directory.clone()),
            (GECOS, self.gecos.clone()),
            (LOGIN_SHELL, self.login_shell.clone()),
            (UID_NUMBER, self.uid_number.map(|n| n.to_string())),
            (GID_NUMBER, self.gid_number.map(|n| n.to_string())),
            (STREET, self.street_address.clone()),
            (CITY, self.city.clone()),
            (PROVINCE, self.province.clone()),
            (POSTAL_CODE, self.postal_code.clone()),
            (ORGANISATION_UNIT, self.organisation_unit.clone()),
            (JOB_TITLE, self.job_title.clone()),
            (MANAGER, self.manager.clone()),
            (EMPLOYEE_NUMBER, self.employee_number.clone()),
            (EMPLOYEE_TYPE, self.employee_type.clone()),
            (PREFERRED_LANGUAGE, self.preferred_language.clone()),
            (ACCOUNT_DISABLED, self.account_disabled.map(flag)),
        ]
    }
}

// ── Multi-valued attributes ─────────────────────────────────────────

pub const SSH_PUBLIC_KEY: &str = "ipasshpubkey";
pub const MAIL: &str = "mail";
pub const CAR_LICENSE: &str = "carlicense";
pub const KRB_PRINCIPAL_NAME: &str = "krbprincipalname";
pub const USER_CLASS: &str = "userclass";
pub const TELEPHONE_NUMBER: &str = "telephonenumber";
pub const MOBILE: &str = "mobile";

const MANAGED: &[&str] = &[
    SSH_PUBLIC_KEY,
    MAIL,
    CAR_LICENSE,
    KRB_PRINCIPAL_NAME,
    USER_CLASS,
    TELEPHONE_NUMBER,
    MOBILE,
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAttributeSets {
    pub uid: String,
    #[serde(default)]
    pub ssh_public_keys: Option<Vec<String>>,
    #[serde(default)]
    pub email_addresses: Option<Vec<String>>,
    #[serde(default)]
    pub car_licenses: Option<Vec<String>>,
    #[serde(default)]
    pub krb_principal_names: Option<Vec<String>>,
    #[serde(default)]
    pub user_classes: Option<Vec<String>>,
    #[serde(default)]
    pub telephone_numbers: Option<Vec<String>>,
    #[serde(default)]
    pub mobile_numbers: Option<Vec<String>>,
}

impl UserAttributeSets {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            ..Default::default()
        }
    }

    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(ObjectKind::User, self.uid.clone())
    }

    /// `(attribute, declared values)` for every managed set.
    pub fn declared(&self) -> Vec<(&'static str, Option<&[String]>)> {
        vec![
            (SSH_PUBLIC_KEY, self.ssh_public_keys.as_deref()),
            (MAIL, self.email_addresses.as_deref()),
            (CAR_LICENSE, self.car_licenses.as_deref()),
            (KRB_PRINCIPAL_NAME, self.krb_principal_names.as_deref()),
            (USER_CLASS, self.user_classes.as_deref()),
            (TELEPHONE_NUMBER, self.telephone_numbers.as_deref()),
            (MOBILE, self.mobile_numbers.as_deref()),
        ]
    }
}

pub struct Users<'a, C: ?Sized> {
    sets: AttributeSetReconciler<'a, C>,
}

impl<'a, C: DirectoryClient + ?Sized> Users<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self {
            sets: AttributeSetReconciler::new(client),
        }
    }

    pub async fn read(&self, uid: &str) -> Result<ResourceState, ReconcileError> {
        let target = ObjectRef::new(ObjectKind::User, uid);
        match self.sets.read(&target, MANAGED).await? {
            Some(attributes) => Ok(ResourceState::new(uid, Outcome::Unchanged, attributes)),
            None => Ok(ResourceState::gone(uid)),
        }
    }

    pub async fn apply(&self, declared: &UserAttributeSets) -> Result<ResourceState, ReconcileError> {
        let outcome = self
            .sets
            .apply(&declared.object_ref(), &declared.declared())
            .await?;
        tracing::debug!(uid = %declared.uid, ?outcome, "user attribute sets reconciled");
        if outcome.is_gone() {
            return Ok(ResourceState::gone(declared.uid.clone()));
        }
        Ok(settle(self.read(&declared.uid).await?, outcome))
    }
}
