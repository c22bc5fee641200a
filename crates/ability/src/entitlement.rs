//! Entitlements: standing content grants independent of any purchase record.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use courseware_core::{ContentId, EntitlementTypeId};

/// Catalog row naming an entitlement type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementType {
    pub id: EntitlementTypeId,
    pub name: String,
}

impl EntitlementType {
    pub fn new(id: impl Into<EntitlementTypeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// The entitlement types the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntitlementKind {
    CohortContentAccess,
    WorkshopContentAccess,
}

impl EntitlementKind {
    /// Name used in the entitlement type catalog.
    pub fn catalog_name(&self) -> &'static str {
        match self {
            EntitlementKind::CohortContentAccess => "cohort_content_access",
            EntitlementKind::WorkshopContentAccess => "workshop_content_access",
        }
    }
}

/// Catalog lookups resolved once per compilation.
///
/// A kind whose name is absent from the catalog resolves to `None` and
/// contributes no rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitlementCatalog {
    cohort: Option<EntitlementTypeId>,
    workshop: Option<EntitlementTypeId>,
}

impl EntitlementCatalog {
    pub fn resolve(types: &[EntitlementType]) -> Self {
        let lookup = |kind: EntitlementKind| {
            types
                .iter()
                .find(|t| t.name == kind.catalog_name())
                .map(|t| t.id.clone())
        };

        Self {
            cohort: lookup(EntitlementKind::CohortContentAccess),
            workshop: lookup(EntitlementKind::WorkshopContentAccess),
        }
    }

    pub fn type_id(&self, kind: EntitlementKind) -> Option<&EntitlementTypeId> {
        match kind {
            EntitlementKind::CohortContentAccess => self.cohort.as_ref(),
            EntitlementKind::WorkshopContentAccess => self.workshop.as_ref(),
        }
    }

    /// Classify an entitlement by its type id; unknown types are inert.
    pub fn kind_of(&self, entitlement: &Entitlement) -> Option<EntitlementKind> {
        [
            EntitlementKind::CohortContentAccess,
            EntitlementKind::WorkshopContentAccess,
        ]
        .into_iter()
        .find(|kind| self.type_id(*kind) == Some(&entitlement.entitlement_type))
    }
}

/// An entitlement held by the viewer.
///
/// `metadata` is kept as raw JSON: it is written by several upstream flows and
/// is only trusted after [`Entitlement::content_ids`] has validated it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entitlement {
    #[serde(rename = "type")]
    pub entitlement_type: EntitlementTypeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Value,
}

impl Entitlement {
    pub fn new<I, C>(entitlement_type: impl Into<EntitlementTypeId>, content_ids: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        let ids: Vec<Value> = content_ids
            .into_iter()
            .map(|id| Value::String(id.into()))
            .collect();
        Self {
            entitlement_type: entitlement_type.into(),
            expires: None,
            metadata: serde_json::json!({ "contentIds": ids }),
        }
    }

    /// Builder: set an expiry.
    pub fn expiring_at(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }

    /// Content ids listed in `metadata.contentIds`.
    ///
    /// Anything other than an array of strings yields an empty set; a single
    /// non-string entry discards the whole list.
    pub fn content_ids(&self) -> BTreeSet<ContentId> {
        match self.metadata.get("contentIds") {
            Some(Value::Array(items)) => {
                let ids: Option<BTreeSet<ContentId>> = items
                    .iter()
                    .map(|item| item.as_str().map(ContentId::from))
                    .collect();
                ids.unwrap_or_else(|| {
                    tracing::warn!(
                        entitlement_type = %self.entitlement_type,
                        "entitlement metadata.contentIds has non-string entries; ignoring"
                    );
                    BTreeSet::new()
                })
            }
            None | Some(Value::Null) => BTreeSet::new(),
            Some(other) => {
                tracing::warn!(
                    entitlement_type = %self.entitlement_type,
                    found = %json_kind(other),
                    "entitlement metadata.contentIds is not an array; ignoring"
                );
                BTreeSet::new()
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
