use serde::{Deserialize, Deserializer, Serialize};

use crate::{Action, Conditions, Subject, SubjectType};

/// A single additive grant.
///
/// There is no inverted (deny) form: anything not granted by some rule is
/// denied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub action: Action,
    pub subject: SubjectType,
    /// `None` for unconditional rules; an empty mapping reads as `None`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "non_empty_conditions"
    )]
    pub conditions: Option<Conditions>,
}

fn non_empty_conditions<'de, D>(deserializer: D) -> Result<Option<Conditions>, D::Error>
where
    D: Deserializer<'de>,
{
    let conditions = Option::<Conditions>::deserialize(deserializer)?;
    Ok(conditions.filter(|c| !c.is_empty()))
}

impl Rule {
    pub fn new(action: Action, subject: SubjectType) -> Self {
        Self {
            action,
            subject,
            conditions: None,
        }
    }

    /// Builder: attach conditions. Empty conditions leave the rule unconditional.
    pub fn with_conditions(mut self, conditions: Conditions) -> Self {
        self.conditions = Some(conditions).filter(|c| !c.is_empty());
        self
    }

    pub fn is_conditional(&self) -> bool {
        self.conditions.is_some()
    }

    pub fn matches_action(&self, action: Action) -> bool {
        self.action == action || self.action.is_wildcard()
    }

    pub fn matches_subject_type(&self, subject: SubjectType) -> bool {
        self.subject == subject || self.subject == SubjectType::All
    }

    /// Full match: action, subject tag and (if present) conditions.
    ///
    /// A conditional rule only matches a concrete instance; asking about a
    /// bare subject tag is answered by unconditional rules alone.
    pub fn matches(&self, action: Action, subject: &Subject<'_>) -> bool {
        if !self.matches_action(action) || !self.matches_subject_type(subject.kind()) {
            return false;
        }

        match (&self.conditions, subject.instance()) {
            (None, _) => true,
            (Some(conditions), Some(instance)) => conditions.matches(&instance.fields),
            (Some(_), None) => false,
        }
    }
}

impl core::fmt::Display for Rule {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {}", self.action, self.subject)?;
        if let Some(conditions) = &self.conditions {
            write!(f, " where {}", serde_json::Value::from(conditions.clone()))?;
        }
        Ok(())
    }
}
