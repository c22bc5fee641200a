use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AbilityError;

/// Verb a viewer may perform on a subject.
///
/// `Manage` is the wildcard action: a rule granting `manage` matches every
/// other action on the same subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    Manage,
    View,
    Save,
    Publish,
    Archive,
    Unpublish,
    Invite,
    Transfer,
}

impl Action {
    pub const ALL: [Action; 12] = [
        Action::Create,
        Action::Read,
        Action::Update,
        Action::Delete,
        Action::Manage,
        Action::View,
        Action::Save,
        Action::Publish,
        Action::Archive,
        Action::Unpublish,
        Action::Invite,
        Action::Transfer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Manage => "manage",
            Action::View => "view",
            Action::Save => "save",
            Action::Publish => "publish",
            Action::Archive => "archive",
            Action::Unpublish => "unpublish",
            Action::Invite => "invite",
            Action::Transfer => "transfer",
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Action::Manage)
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = AbilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AbilityError::UnknownAction(s.to_string()))
    }
}
