//! DNS zones.
//!
//! SOA timers and the query/transfer policies always take part in updates,
//! with the directory's own defaults when not declared.

use serde::{Deserialize, Serialize};

use dirsync_core::{ObjectKind, ObjectRef, ReconcileError};

use crate::scalar::{flag, required, ScalarDecl};

pub const ADMIN_EMAIL: &str = "idnssoarname";
pub const AUTHORITATIVE_NAMESERVER: &str = "idnssoamname";
pub const SOA_REFRESH: &str = "idnssoarefresh";
pub const SOA_RETRY: &str = "idnssoaretry";
pub const SOA_EXPIRE: &str = "idnssoaexpire";
pub const SOA_MINIMUM: &str = "idnssoaminimum";
pub const TTL: &str = "dnsttl";
pub const DEFAULT_TTL: &str = "dnsdefaultttl";
pub const DYNAMIC_UPDATES: &str = "idnsallowdynupdate";
pub const ALLOW_QUERY: &str = "idnsallowquery";
pub const ALLOW_TRANSFER: &str = "idnsallowtransfer";
pub const ZONE_ACTIVE: &str = "idnszoneactive";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsZoneDecl {
    pub zone_name: String,
    pub admin_email_address: Option<String>,
    pub authoritative_nameserver: Option<String>,
    pub soa_refresh: u32,
    pub soa_retry: u32,
    pub soa_expire: u32,
    pub soa_minimum: u32,
    pub ttl: Option<u32>,
    pub default_ttl: Option<u32>,
    pub dynamic_updates: bool,
    pub allow_query: String,
    pub allow_transfer: String,
    pub disable_zone: bool,
}

impl Default for DnsZoneDecl {
    fn default() -> Self {
        Self {
            zone_name: String::new(),
            admin_email_address: None,
            authoritative_nameserver: None,
            soa_refresh: 3600,
            soa_retry: 900,
            soa_expire: 1_209_600,
            soa_minimum: 3600,
            ttl: None,
            default_ttl: None,
            dynamic_updates: false,
            allow_query: "any".to_string(),
            allow_transfer: "none".to_string(),
            disable_zone: false,
        }
    }
}

impl DnsZoneDecl {
    pub fn new(zone_name: impl Into<String>) -> Self {
        Self {
            zone_name: zone_name.into(),
            ..Default::default()
        }
    }
}

impl ScalarDecl for DnsZoneDecl {
    fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(ObjectKind::DnsZone, self.zone_name.clone())
    }

    fn validate(&self) -> Result<(), ReconcileError> {
        required("dnszone", "zone_name", &self.zone_name)
    }

    fn scalars(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            (ADMIN_EMAIL, self.admin_email_address.clone()),
            (AUTHORITATIVE_NAMESERVER, self.authoritative_nameserver.clone()),
            (SOA_REFRESH, Some(self.soa_refresh.to_string())),
            (SOA_RETRY, Some(self.soa_retry.to_string())),
            (SOA_EXPIRE, Some(self.soa_expire.to_string())),
            (SOA_MINIMUM, Some(self.soa_minimum.to_string())),
            (TTL, self.ttl.map(|t| t.to_string())),
            (DEFAULT_TTL, self.default_ttl.map(|t| t.to_string())),
            (DYNAMIC_UPDATES, Some(flag(self.dynamic_updates))),
            (ALLOW_QUERY, Some(self.allow_query.clone())),
            (ALLOW_TRANSFER, Some(self.allow_transfer.clone())),
            (ZONE_ACTIVE, Some(flag(!self.disable_zone))),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soa_defaults() {
        let zone: DnsZoneDecl =
            serde_json::from_value(serde_json::json!({ "zone_name": "example.com." })).unwrap();
        assert_eq!(zone, DnsZoneDecl::new("example.com."));

        let mods = zone.initial_attributes();
        assert_eq!(mods.set[SOA_EXPIRE], vec!["1209600".to_string()]);
        assert_eq!(mods.set[ZONE_ACTIVE], vec!["TRUE".to_string()]);
        assert!(!mods.set.contains_key(TTL));
        assert!(!mods.set.contains_key(ADMIN_EMAIL));
    }

    #[test]
    fn zone_name_required() {
        assert!(DnsZoneDecl::default().validate().is_err());
    }
}
