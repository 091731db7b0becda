//! DNS record sets.
//!
//! A record name inside a zone holds one value list per record type. Each
//! declared set manages exactly one `(zone, name, type)` list and leaves the
//! other types of the same name alone.
//!
//! Imported with the key `<name>/<zone>/<type>`, e.g. `www/example.com./A`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use dirsync_core::identity;
use dirsync_core::object::{Attributes, DirectoryObject, Modifications, ObjectRef};
use dirsync_core::{
    AttributeSetReconciler, DirectoryClient, ObjectReconciler, Outcome, ReconcileError,
    ResourceState, RetryPolicy,
};

use crate::settle;

pub const TTL_ATTRIBUTE: &str = "dnsttl";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    A,
    Aaaa,
    Cname,
    Mx,
    Ns,
    Ptr,
    Srv,
    Txt,
    Sshfp,
}

impl RecordType {
    /// Attribute of the record object holding values of this type.
    pub fn attribute(&self) -> &'static str {
        match self {
            Self::A => "arecord",
            Self::Aaaa => "aaaarecord",
            Self::Cname => "cnamerecord",
            Self::Mx => "mxrecord",
            Self::Ns => "nsrecord",
            Self::Ptr => "ptrrecord",
            Self::Srv => "srvrecord",
            Self::Txt => "txtrecord",
            Self::Sshfp => "sshfprecord",
        }
    }
}

/// Address of one record-type list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub zone: String,
    pub name: String,
    pub record_type: RecordType,
}

impl RecordKey {
    pub fn new(zone: impl Into<String>, name: impl Into<String>, record_type: RecordType) -> Self {
        Self {
            zone: zone.into(),
            name: name.into(),
            record_type,
        }
    }

    pub fn encode(&self) -> String {
        identity::encode(&self.name, &self.zone, self.record_type.as_ref())
    }

    pub fn decode(key: &str) -> Result<Self, ReconcileError> {
        let (name, zone, record_type) = identity::decode(key)?;
        if name.is_empty() || zone.is_empty() {
            return Err(ReconcileError::malformed(key, "record name and zone are required"));
        }
        let record_type = RecordType::from_str(record_type).map_err(|_| {
            ReconcileError::malformed(key, format!("unsupported record type {record_type:?}"))
        })?;
        Ok(Self::new(zone, name, record_type))
    }

    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::dns_record(self.zone.clone(), self.name.clone())
    }
}

/// Declared record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecordSet {
    #[serde(flatten)]
    pub key: RecordKey,
    pub records: Vec<String>,
    #[serde(default)]
    pub ttl: Option<u32>,
}

impl DnsRecordSet {
    pub fn new(key: RecordKey, records: Vec<String>) -> Self {
        Self {
            key,
            records,
            ttl: None,
        }
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    fn validate(&self) -> Result<(), ReconcileError> {
        if self.records.is_empty() {
            return Err(ReconcileError::InvalidDeclaration(format!(
                "dns record {}: at least one record value is required",
                self.key.encode()
            )));
        }
        if self.key.record_type == RecordType::Cname && self.records.len() > 1 {
            return Err(ReconcileError::InvalidDeclaration(format!(
                "dns record {}: CNAME takes a single value",
                self.key.encode()
            )));
        }
        Ok(())
    }
}

pub struct DnsRecords<'a, C: ?Sized> {
    client: &'a C,
    retry: RetryPolicy,
}

impl<'a, C: DirectoryClient + ?Sized> DnsRecords<'a, C> {
    pub fn new(client: &'a C, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    fn objects(&self) -> ObjectReconciler<'a, C> {
        ObjectReconciler::new(self.client, self.retry)
    }

    fn sets(&self) -> AttributeSetReconciler<'a, C> {
        AttributeSetReconciler::new(self.client)
    }

    /// Add the declared values. The record name is created when it does
    /// not exist yet, otherwise the values join the existing object.
    pub async fn create(&self, set: &DnsRecordSet) -> Result<ResourceState, ReconcileError> {
        set.validate()?;
        let target = set.key.object_ref();
        let attribute = set.key.record_type.attribute();

        let outcome = match self.objects().read(&target).await? {
            None => {
                let mut mods = Modifications::new();
                mods.add(attribute, set.records.clone());
                if let Some(ttl) = set.ttl {
                    mods.set(TTL_ATTRIBUTE, vec![ttl.to_string()]);
                }
                let created = self.objects().create(&target, &mods).await?;
                return Ok(state(&set.key, Outcome::Applied, &created));
            }
            Some(_) => self.apply(set).await?,
        };

        Ok(settle(self.read(&set.key).await?, outcome))
    }

    /// Current values of the record type; an empty list means the set is gone.
    pub async fn read(&self, key: &RecordKey) -> Result<ResourceState, ReconcileError> {
        match self.objects().read(&key.object_ref()).await? {
            Some(object) => Ok(state(key, Outcome::Unchanged, &object)),
            None => Ok(ResourceState::gone(key.encode())),
        }
    }

    pub async fn import(&self, key: &str) -> Result<ResourceState, ReconcileError> {
        let key = RecordKey::decode(key)?;
        tracing::debug!(zone = %key.zone, name = %key.name, record_type = %key.record_type, "importing dns record");
        self.read(&key).await
    }

    /// Converge values to the declaration; TTL only when declared and changed.
    pub async fn update(&self, set: &DnsRecordSet) -> Result<ResourceState, ReconcileError> {
        set.validate()?;
        let outcome = self.apply(set).await?;
        if outcome.is_gone() {
            return Ok(ResourceState::gone(set.key.encode()));
        }
        Ok(settle(self.read(&set.key).await?, outcome))
    }

    /// Remove every value of the record type. The record object goes
    /// away with its last value.
    pub async fn delete(&self, key: &RecordKey) -> Result<Outcome, ReconcileError> {
        let target = key.object_ref();
        let Some(current) = self.objects().read(&target).await? else {
            return Ok(Outcome::GoneRemotely);
        };
        let attribute = key.record_type.attribute();
        let values = current.values(attribute).to_vec();
        if values.is_empty() {
            return Ok(Outcome::GoneRemotely);
        }

        let others_remain = RecordType::iter()
            .filter(|t| *t != key.record_type)
            .any(|t| !current.values(t.attribute()).is_empty());
        if others_remain {
            let mut mods = Modifications::new();
            mods.remove(attribute, values);
            self.objects().modify(&target, &mods).await
        } else {
            self.objects().delete(&target).await
        }
    }

    async fn apply(&self, set: &DnsRecordSet) -> Result<Outcome, ReconcileError> {
        let attribute = set.key.record_type.attribute();
        let ttl = set.ttl.map(|t| t.to_string());
        self.sets()
            .apply_with(&set.key.object_ref(), |b| {
                b.delta(attribute, Some(set.records.as_slice()))
                    .scalar(TTL_ATTRIBUTE, ttl.as_deref())
            })
            .await
    }
}

fn state(key: &RecordKey, outcome: Outcome, object: &DirectoryObject) -> ResourceState {
    let attribute = key.record_type.attribute();
    if object.values(attribute).is_empty() {
        return ResourceState::gone(key.encode());
    }
    let mut attributes: Attributes = object.project(&[attribute, TTL_ATTRIBUTE]);
    attributes.insert("record_type".to_string(), vec![key.record_type.to_string()]);
    ResourceState::new(key.encode(), outcome, attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_type_names() {
        assert_eq!(RecordType::Aaaa.to_string(), "AAAA");
        assert_eq!(RecordType::from_str("SSHFP").unwrap(), RecordType::Sshfp);
        assert!(RecordType::from_str("aaaa").is_err());
        assert_eq!(RecordType::iter().count(), 9);
    }

    #[test]
    fn every_type_has_its_own_attribute() {
        let mut attrs: Vec<_> = RecordType::iter().map(|t| t.attribute()).collect();
        attrs.sort();
        attrs.dedup();
        assert_eq!(attrs.len(), 9);
        assert!(attrs.iter().all(|a| a.ends_with("record")));
    }

    #[test]
    fn key_round_trip() {
        let key = RecordKey::new("example.com.", "www", RecordType::A);
        assert_eq!(key.encode(), "www/example.com./A");
        assert_eq!(RecordKey::decode("www/example.com./A").unwrap(), key);
    }

    #[test]
    fn reverse_zone_key() {
        let key = RecordKey::decode("10/0.168.192.in-addr.arpa./PTR").unwrap();
        assert_eq!(key.zone, "0.168.192.in-addr.arpa.");
        assert_eq!(key.record_type, RecordType::Ptr);
    }

    #[test]
    fn bad_keys_are_malformed() {
        for key in ["www", "www/example.com.", "www/example.com./SPF", "/example.com./A"] {
            assert!(
                matches!(RecordKey::decode(key), Err(ReconcileError::MalformedIdentifier { .. })),
                "{key}"
            );
        }
    }

    #[test]
    fn declaration_validation() {
        let key = RecordKey::new("example.com.", "www", RecordType::Cname);
        assert!(DnsRecordSet::new(key.clone(), vec![]).validate().is_err());
        assert!(DnsRecordSet::new(key.clone(), vec!["a.".into(), "b.".into()])
            .validate()
            .is_err());
        assert!(DnsRecordSet::new(key, vec!["lb.example.com.".into()]).validate().is_ok());
    }

    #[test]
    fn declaration_from_json() {
        let set: DnsRecordSet = serde_json::from_value(serde_json::json!({
            "zone": "example.com.",
            "name": "mail",
            "record_type": "MX",
            "records": ["10 mx1.example.com."],
            "ttl": 300
        }))
        .unwrap();
        assert_eq!(set.key.record_type, RecordType::Mx);
        assert_eq!(set.ttl, Some(300));
    }
}
