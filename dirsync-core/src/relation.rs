//! Relation vocabularies.
//!
//! Every relationship resource kind owns a closed set of relation tags. A tag
//! is the discriminant persisted in the composite identifier and also names
//! how the relationship is written (`add_*` / `remove_*` method family and
//! parameter) and read back (attribute(s) of the shown parent).
//!
//! Vocabularies are declared with [`relation_vocabulary!`](crate::relation_vocabulary),
//! which generates the enum and its [`RelationTag`] impl.

use std::fmt;
use std::hash::Hash;

use crate::object::ObjectKind;

/// How one relation is written and read on the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationSpec {
    /// Method family, e.g. `member` for `group_add_member`, `allow_command`
    /// for `sudorule_add_allow_command`.
    pub method: &'static str,
    /// Call parameter carrying the member names.
    pub param: &'static str,
    /// Attributes of the shown parent that list members of this relation.
    /// The first one is where new members land.
    pub attributes: &'static [&'static str],
}

/// A closed relation-tag vocabulary for one resource kind.
pub trait RelationTag: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// Resource kind name, used in diagnostics.
    const RESOURCE: &'static str;
    /// Kind of the parent object every relation in this vocabulary hangs off.
    const PARENT: ObjectKind;

    /// Every tag in the vocabulary.
    fn all() -> &'static [Self];

    /// Persisted discriminant.
    fn as_tag(self) -> &'static str;

    fn spec(self) -> RelationSpec;

    fn from_tag(tag: &str) -> Option<Self> {
        Self::all().iter().copied().find(|t| t.as_tag() == tag)
    }
}

/// Declare a relation vocabulary.
///
/// ```
/// use dirsync_core::relation::RelationTag;
///
/// dirsync_core::relation_vocabulary! {
///     /// Members of a user group.
///     pub enum GroupMember: "user_group_membership", parent = Group {
///         User => "u", method = "member", param = "user", attributes = ["member_user"];
///         Group => "g", method = "member", param = "group", attributes = ["member_group"];
///     }
/// }
///
/// assert_eq!(GroupMember::from_tag("g"), Some(GroupMember::Group));
/// assert_eq!(GroupMember::User.spec().attributes, &["member_user"]);
/// ```
#[macro_export]
macro_rules! relation_vocabulary {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $resource:literal, parent = $parent:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $tag:literal,
                    method = $method:literal,
                    param = $param:literal,
                    attributes = [$($attr:literal),+ $(,)?];
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$vmeta])* $variant,)+
        }

        impl $crate::relation::RelationTag for $name {
            const RESOURCE: &'static str = $resource;
            const PARENT: $crate::object::ObjectKind = $crate::object::ObjectKind::$parent;

            fn all() -> &'static [Self] {
                &[$(Self::$variant),+]
            }

            fn as_tag(self) -> &'static str {
                match self {
                    $(Self::$variant => $tag,)+
                }
            }

            fn spec(self) -> $crate::relation::RelationSpec {
                match self {
                    $(Self::$variant => $crate::relation::RelationSpec {
                        method: $method,
                        param: $param,
                        attributes: &[$($attr),+],
                    },)+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::relation::RelationTag::as_tag(*self))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::relation_vocabulary! {
        enum RunAs: "test_runas", parent = SudoRule {
            User => "ru", method = "runasuser", param = "user",
                attributes = ["ipasudorunas_user", "ipasudorunasextuser"];
            Group => "rg", method = "runasgroup", param = "group",
                attributes = ["ipasudorunasgroup_group"];
        }
    }

    #[test]
    fn tags_round_trip() {
        for tag in RunAs::all() {
            assert_eq!(RunAs::from_tag(tag.as_tag()), Some(*tag));
        }
    }

    #[test]
    fn unknown_tag_rejected() {
        assert_eq!(RunAs::from_tag("u"), None);
        assert_eq!(RunAs::from_tag(""), None);
    }

    #[test]
    fn spec_lists_every_attribute() {
        let spec = RunAs::User.spec();
        assert_eq!(spec.method, "runasuser");
        assert_eq!(spec.attributes.len(), 2);
        assert_eq!(RunAs::PARENT, ObjectKind::SudoRule);
        assert_eq!(RunAs::Group.to_string(), "rg");
    }
}
