//! JSON snapshot of everything the compiler reads.
//!
//! The snapshot mirrors what a request handler gathers before compiling: the
//! viewer row, purchases, the entitlement type catalog and the content tree.

use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use courseware_ability::{
    AbilityInput, ContentResource, EntitlementType, Purchase, ResourceKind, Viewer,
};
use courseware_core::ContentId;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub viewer: Option<Viewer>,
    #[serde(default)]
    pub purchases: Vec<Purchase>,
    #[serde(default)]
    pub entitlement_types: Vec<EntitlementType>,
    #[serde(default)]
    pub module: Option<ContentResource>,
    #[serde(default)]
    pub lesson: Option<ContentResource>,
    #[serde(default)]
    pub country: Option<String>,
    /// Computed from `module` when omitted.
    #[serde(default)]
    pub all_module_resource_ids: Option<Vec<ContentId>>,
    /// Evaluation instant; the current time when omitted.
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("failed to parse snapshot {}", path.display()))
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let mut snapshot: Snapshot = serde_json::from_str(raw)?;
        snapshot.fill_defaults(Utc::now());
        Ok(snapshot)
    }

    /// Resolve `now` and the flattened module ids if the snapshot omitted them.
    pub fn fill_defaults(&mut self, now: DateTime<Utc>) {
        self.now.get_or_insert(now);
        if self.all_module_resource_ids.is_none() {
            self.all_module_resource_ids = Some(
                self.module
                    .as_ref()
                    .map(flatten_resource_ids)
                    .unwrap_or_default(),
            );
        }
    }

    pub fn input(&self) -> AbilityInput<'_> {
        AbilityInput {
            viewer: self.viewer.as_ref(),
            purchases: &self.purchases,
            entitlement_types: &self.entitlement_types,
            module: self.module.as_ref(),
            lesson: self.lesson.as_ref(),
            country: self.country.as_deref(),
            all_module_resource_ids: self.all_module_resource_ids.as_deref().unwrap_or(&[]),
            now: self.now.unwrap_or_default(),
        }
    }
}

/// Every lesson, exercise and solution id below `module`, at any depth.
pub fn flatten_resource_ids(module: &ContentResource) -> Vec<ContentId> {
    let mut ids = Vec::new();
    let mut stack: Vec<&ContentResource> = module
        .resources
        .iter()
        .rev()
        .map(|link| &link.resource)
        .collect();

    while let Some(resource) = stack.pop() {
        if matches!(
            resource.kind,
            ResourceKind::Lesson | ResourceKind::Exercise | ResourceKind::Solution
        ) {
            ids.push(resource.id.clone());
        }
        stack.extend(resource.resources.iter().rev().map(|link| &link.resource));
    }

    ids
}
