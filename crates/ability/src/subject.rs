use core::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::AbilityError;

/// Tag naming what a rule or query is about.
///
/// `All` only ever appears on rules (it matches every tag). `RegionRestriction`
/// and `PendingOpenAccess` are sentinels: they carry no data and exist so the
/// UI can ask whether to render an upsell or an "unlocks on" notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SubjectType {
    Content,
    User,
    Team,
    Invoice,
    Organization,
    OrganizationMember,
    OrganizationBilling,
    RegionRestriction,
    PendingOpenAccess,
    Discord,
    Entitlement,
    #[serde(rename = "all")]
    All,
}

impl SubjectType {
    pub const ALL: [SubjectType; 12] = [
        SubjectType::Content,
        SubjectType::User,
        SubjectType::Team,
        SubjectType::Invoice,
        SubjectType::Organization,
        SubjectType::OrganizationMember,
        SubjectType::OrganizationBilling,
        SubjectType::RegionRestriction,
        SubjectType::PendingOpenAccess,
        SubjectType::Discord,
        SubjectType::Entitlement,
        SubjectType::All,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectType::Content => "Content",
            SubjectType::User => "User",
            SubjectType::Team => "Team",
            SubjectType::Invoice => "Invoice",
            SubjectType::Organization => "Organization",
            SubjectType::OrganizationMember => "OrganizationMember",
            SubjectType::OrganizationBilling => "OrganizationBilling",
            SubjectType::RegionRestriction => "RegionRestriction",
            SubjectType::PendingOpenAccess => "PendingOpenAccess",
            SubjectType::Discord => "Discord",
            SubjectType::Entitlement => "Entitlement",
            SubjectType::All => "all",
        }
    }
}

impl core::fmt::Display for SubjectType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubjectType {
    type Err = AbilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubjectType::ALL
            .into_iter()
            .find(|subject| subject.as_str() == s.trim())
            .ok_or_else(|| AbilityError::UnknownSubject(s.to_string()))
    }
}

/// A concrete record checked against conditional rules.
///
/// Only the fields a rule condition references need to be present; a missing
/// field never satisfies a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectInstance {
    pub kind: SubjectType,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl SubjectInstance {
    pub fn new(kind: SubjectType) -> Self {
        Self {
            kind,
            fields: Map::new(),
        }
    }

    /// Builder: set a field.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Shorthand for `SubjectInstance::new(kind).with("id", id)`.
pub fn subject(kind: SubjectType, id: impl Into<Value>) -> SubjectInstance {
    SubjectInstance::new(kind).with("id", id)
}

/// The second argument of a `can` query: a bare tag or a concrete instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Subject<'a> {
    Type(SubjectType),
    Instance(&'a SubjectInstance),
}

impl Subject<'_> {
    pub fn kind(&self) -> SubjectType {
        match self {
            Subject::Type(kind) => *kind,
            Subject::Instance(instance) => instance.kind,
        }
    }

    pub fn instance(&self) -> Option<&SubjectInstance> {
        match self {
            Subject::Type(_) => None,
            Subject::Instance(instance) => Some(instance),
        }
    }
}

impl From<SubjectType> for Subject<'_> {
    fn from(value: SubjectType) -> Self {
        Subject::Type(value)
    }
}

impl<'a> From<&'a SubjectInstance> for Subject<'a> {
    fn from(value: &'a SubjectInstance) -> Self {
        Subject::Instance(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_names_round_trip() {
        for kind in SubjectType::ALL {
            assert_eq!(kind.as_str().parse::<SubjectType>().unwrap(), kind);
        }
    }

    #[test]
    fn serializes_all_in_lowercase() {
        assert_eq!(serde_json::to_string(&SubjectType::All).unwrap(), "\"all\"");
        assert_eq!(
            serde_json::to_string(&SubjectType::PendingOpenAccess).unwrap(),
            "\"PendingOpenAccess\""
        );
    }

    #[test]
    fn instance_builder_sets_fields() {
        let instance = subject(SubjectType::Content, "lesson_1").with("type", "lesson");
        assert_eq!(instance.field("id"), Some(&Value::from("lesson_1")));
        assert_eq!(instance.field("type"), Some(&Value::from("lesson")));
        assert_eq!(Subject::from(&instance).kind(), SubjectType::Content);
    }
}
