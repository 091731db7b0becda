//! Read and write models exchanged with the directory service.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of directory object. Doubles as the remote method prefix
/// (`group_show`, `sudorule_add_user`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    User,
    Group,
    Host,
    Hostgroup,
    SudoRule,
    SudoCmd,
    SudoCmdGroup,
    HbacRule,
    DnsZone,
    DnsRecord,
    Automember,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
            Self::Host => "host",
            Self::Hostgroup => "hostgroup",
            Self::SudoRule => "sudorule",
            Self::SudoCmd => "sudocmd",
            Self::SudoCmdGroup => "sudocmdgroup",
            Self::HbacRule => "hbacrule",
            Self::DnsZone => "dnszone",
            Self::DnsRecord => "dnsrecord",
            Self::Automember => "automember",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "group" => Some(Self::Group),
            "host" => Some(Self::Host),
            "hostgroup" => Some(Self::Hostgroup),
            "sudorule" => Some(Self::SudoRule),
            "sudocmd" => Some(Self::SudoCmd),
            "sudocmdgroup" => Some(Self::SudoCmdGroup),
            "hbacrule" => Some(Self::HbacRule),
            "dnszone" => Some(Self::DnsZone),
            "dnsrecord" => Some(Self::DnsRecord),
            "automember" => Some(Self::Automember),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address of one directory object.
///
/// `container` is the enclosing object for kinds that are not globally
/// named, e.g. the zone of a DNS record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    pub kind: ObjectKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
}

impl ObjectRef {
    pub fn new(kind: ObjectKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            container: None,
        }
    }

    pub fn dns_record(zone: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: ObjectKind::DnsRecord,
            name: name.into(),
            container: Some(zone.into()),
        }
    }

    /// Automember rule; `grouping` is `group` or `hostgroup`.
    pub fn automember(grouping: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: ObjectKind::Automember,
            name: name.into(),
            container: Some(grouping.into()),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.container {
            Some(container) => write!(f, "{} {} (in {})", self.kind, self.name, container),
            None => write!(f, "{} {}", self.kind, self.name),
        }
    }
}

/// Attribute map of a shown object. Every remote attribute is multi-valued;
/// a scalar is a one-element list and a missing attribute is an empty one.
pub type Attributes = BTreeMap<String, Vec<String>>;

/// An object as returned by `show`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryObject {
    pub reference: ObjectRef,
    #[serde(default)]
    pub attributes: Attributes,
}

impl DirectoryObject {
    pub fn new(reference: ObjectRef, attributes: Attributes) -> Self {
        Self {
            reference,
            attributes,
        }
    }

    pub fn values(&self, attribute: &str) -> &[String] {
        self.attributes
            .get(attribute)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First value of a single-valued attribute.
    pub fn scalar(&self, attribute: &str) -> Option<&str> {
        self.values(attribute).first().map(String::as_str)
    }

    pub fn contains(&self, attribute: &str, value: &str) -> bool {
        self.values(attribute).iter().any(|v| v == value)
    }

    /// Copy of the named attributes; absent ones are omitted.
    pub fn project(&self, names: &[&str]) -> Attributes {
        names
            .iter()
            .filter_map(|name| {
                self.attributes
                    .get(*name)
                    .map(|values| ((*name).to_string(), values.clone()))
            })
            .collect()
    }
}

/// Attribute changes sent with `create` or `modify_attributes`.
///
/// - `set` replaces the whole value list of an attribute (empty list clears it).
/// - `add` / `remove` name individual values, for attributes where the remote
///   API only accepts explicit deltas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifications {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub set: Attributes,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub add: Attributes,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub remove: Attributes,
}

impl Modifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.add.is_empty() && self.remove.is_empty()
    }

    pub fn set(&mut self, attribute: impl Into<String>, values: Vec<String>) -> &mut Self {
        self.set.insert(attribute.into(), values);
        self
    }

    pub fn add(&mut self, attribute: impl Into<String>, values: Vec<String>) -> &mut Self {
        if !values.is_empty() {
            self.add.entry(attribute.into()).or_default().extend(values);
        }
        self
    }

    pub fn remove(&mut self, attribute: impl Into<String>, values: Vec<String>) -> &mut Self {
        if !values.is_empty() {
            self.remove.entry(attribute.into()).or_default().extend(values);
        }
        self
    }

    /// Names of every attribute touched, deduplicated and sorted.
    pub fn attribute_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .set
            .keys()
            .chain(self.add.keys())
            .chain(self.remove.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(attrs: &[(&str, &[&str])]) -> DirectoryObject {
        let attributes = attrs
            .iter()
            .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
            .collect();
        DirectoryObject::new(ObjectRef::new(ObjectKind::Group, "g1"), attributes)
    }

    #[test]
    fn object_kind_round_trips() {
        for kind in [
            ObjectKind::User,
            ObjectKind::SudoCmdGroup,
            ObjectKind::HbacRule,
            ObjectKind::DnsRecord,
            ObjectKind::Automember,
        ] {
            assert_eq!(ObjectKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ObjectKind::parse("dnsforwardzone"), None);
        assert_eq!(ObjectKind::parse("Sudorule"), None);
    }

    #[test]
    fn object_kind_serde_matches_as_str() {
        let json = serde_json::to_string(&ObjectKind::SudoRule).unwrap();
        assert_eq!(json, "\"sudorule\"");
    }

    #[test]
    fn missing_attribute_is_empty() {
        let obj = group(&[("member_user", &["u1"])]);
        assert!(obj.values("member_group").is_empty());
        assert!(obj.contains("member_user", "u1"));
        assert!(!obj.contains("member_user", "U1"));
    }

    #[test]
    fn project_skips_absent() {
        let obj = group(&[("member_user", &["u1"]), ("description", &["d"])]);
        let projected = obj.project(&["member_user", "member_group"]);
        assert_eq!(projected.len(), 1);
        assert_eq!(projected["member_user"], vec!["u1".to_string()]);
    }

    #[test]
    fn empty_deltas_are_dropped() {
        let mut mods = Modifications::new();
        mods.add("mail", vec![]).remove("mail", vec![]);
        assert!(mods.is_empty());
    }

    #[test]
    fn attribute_names_deduplicated() {
        let mut mods = Modifications::new();
        mods.set("description", vec!["x".into()])
            .add("mail", vec!["a@example.com".into()])
            .remove("mail", vec!["b@example.com".into()]);
        assert_eq!(mods.attribute_names(), vec!["description", "mail"]);
    }

    #[test]
    fn dns_record_display_names_zone() {
        let r = ObjectRef::dns_record("example.com", "www");
        assert_eq!(r.to_string(), "dnsrecord www (in example.com)");
    }
}
