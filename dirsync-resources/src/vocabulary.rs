//! Relation vocabularies of every relationship resource kind.
//!
//! Tags are persisted inside composite identifiers and must never change.
//! Tags may repeat across kinds (`u` is both a group member and an HBAC rule
//! user); each kind decodes only its own vocabulary.

use dirsync_core::identity::CompositeId;
use dirsync_core::relation_vocabulary;

// ── Groups and host groups ──────────────────────────────────────────

relation_vocabulary! {
    /// Members of a user group.
    pub enum GroupMember: "user_group_membership", parent = Group {
        User => "u", method = "member", param = "user", attributes = ["member_user"];
        Group => "g", method = "member", param = "group", attributes = ["member_group"];
        /// Member from a trusted external domain.
        External => "e", method = "member", param = "ipaexternalmember",
            attributes = ["ipaexternalmember"];
    }
}

relation_vocabulary! {
    /// Members of a host group.
    pub enum HostgroupMember: "host_hostgroup_membership", parent = Hostgroup {
        Host => "h", method = "member", param = "host", attributes = ["member_host"];
        Hostgroup => "hg", method = "member", param = "hostgroup", attributes = ["member_hostgroup"];
    }
}

relation_vocabulary! {
    /// Commands of a sudo command group.
    pub enum SudoCmdGroupMember: "sudocmdgroup_membership", parent = SudoCmdGroup {
        Command => "sc", method = "member", param = "sudocmd", attributes = ["member_sudocmd"];
    }
}

// ── Sudo rules ──────────────────────────────────────────────────────

relation_vocabulary! {
    pub enum SudoRuleUser: "sudo_rule_user_membership", parent = SudoRule {
        User => "sru", method = "user", param = "user", attributes = ["memberuser_user"];
        Group => "srug", method = "user", param = "group", attributes = ["memberuser_group"];
    }
}

relation_vocabulary! {
    pub enum SudoRuleHost: "sudo_rule_host_membership", parent = SudoRule {
        Host => "srh", method = "host", param = "host", attributes = ["memberhost_host"];
        Hostgroup => "srhg", method = "host", param = "hostgroup", attributes = ["memberhost_hostgroup"];
    }
}

relation_vocabulary! {
    pub enum SudoRuleAllowCommand: "sudo_rule_allowcmd_membership", parent = SudoRule {
        Command => "srac", method = "allow_command", param = "sudocmd",
            attributes = ["memberallowcmd_sudocmd"];
        CommandGroup => "sracg", method = "allow_command", param = "sudocmdgroup",
            attributes = ["memberallowcmd_sudocmdgroup"];
    }
}

relation_vocabulary! {
    pub enum SudoRuleDenyCommand: "sudo_rule_denycmd_membership", parent = SudoRule {
        Command => "srdc", method = "deny_command", param = "sudocmd",
            attributes = ["memberdenycmd_sudocmd"];
        CommandGroup => "srdcg", method = "deny_command", param = "sudocmdgroup",
            attributes = ["memberdenycmd_sudocmdgroup"];
    }
}

relation_vocabulary! {
    /// Run-as users; a name may be a directory user or an external one.
    pub enum SudoRuleRunAsUser: "sudo_rule_runasuser_membership", parent = SudoRule {
        User => "srrau", method = "runasuser", param = "user",
            attributes = ["ipasudorunas_user", "ipasudorunasextuser"];
    }
}

relation_vocabulary! {
    /// Run-as groups; a name may be a directory group or an external one.
    pub enum SudoRuleRunAsGroup: "sudo_rule_runasgroup_membership", parent = SudoRule {
        Group => "srraug", method = "runasgroup", param = "group",
            attributes = ["ipasudorunasgroup_group", "ipasudorunasextgroup"];
    }
}

relation_vocabulary! {
    pub enum SudoRuleOption: "sudo_rule_option", parent = SudoRule {
        Value => "sro", method = "option", param = "ipasudoopt", attributes = ["ipasudoopt"];
    }
}

// ── HBAC rules ──────────────────────────────────────────────────────

relation_vocabulary! {
    pub enum HbacRuleUser: "hbac_policy_user_membership", parent = HbacRule {
        User => "u", method = "user", param = "user", attributes = ["memberuser_user"];
        Group => "g", method = "user", param = "group", attributes = ["memberuser_group"];
    }
}

relation_vocabulary! {
    pub enum HbacRuleHost: "hbac_policy_host_membership", parent = HbacRule {
        Host => "h", method = "host", param = "host", attributes = ["memberhost_host"];
        Hostgroup => "hg", method = "host", param = "hostgroup", attributes = ["memberhost_hostgroup"];
    }
}

relation_vocabulary! {
    pub enum HbacRuleService: "hbac_policy_service_membership", parent = HbacRule {
        Service => "s", method = "service", param = "hbacsvc", attributes = ["memberservice_hbacsvc"];
        ServiceGroup => "sg", method = "service", param = "hbacsvcgroup",
            attributes = ["memberservice_hbacsvcgroup"];
    }
}

pub type GroupMembership = CompositeId<GroupMember>;
pub type HostgroupMembership = CompositeId<HostgroupMember>;
pub type SudoCmdGroupMembership = CompositeId<SudoCmdGroupMember>;
pub type SudoRuleUserMembership = CompositeId<SudoRuleUser>;
pub type SudoRuleHostMembership = CompositeId<SudoRuleHost>;
pub type SudoRuleAllowCommandMembership = CompositeId<SudoRuleAllowCommand>;
pub type SudoRuleDenyCommandMembership = CompositeId<SudoRuleDenyCommand>;
pub type SudoRuleRunAsUserMembership = CompositeId<SudoRuleRunAsUser>;
pub type SudoRuleRunAsGroupMembership = CompositeId<SudoRuleRunAsGroup>;
pub type SudoRuleOptionEntry = CompositeId<SudoRuleOption>;
pub type HbacRuleUserMembership = CompositeId<HbacRuleUser>;
pub type HbacRuleHostMembership = CompositeId<HbacRuleHost>;
pub type HbacRuleServiceMembership = CompositeId<HbacRuleService>;
