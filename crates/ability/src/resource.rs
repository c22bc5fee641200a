//! Content resource tree as seen by the engine.
//!
//! Only `id`, `type`, `fields.startsAt`, the solution flag and the child
//! `resources` are read. Every other column of the content table is ignored
//! during deserialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use courseware_core::{ContentId, ProductId, UserId};

use crate::{SubjectInstance, SubjectType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Workshop,
    Cohort,
    Tutorial,
    Section,
    Lesson,
    Exercise,
    Solution,
    Post,
    Tip,
    Talk,
    #[serde(other)]
    Other,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 11] = [
        ResourceKind::Workshop,
        ResourceKind::Cohort,
        ResourceKind::Tutorial,
        ResourceKind::Section,
        ResourceKind::Lesson,
        ResourceKind::Exercise,
        ResourceKind::Solution,
        ResourceKind::Post,
        ResourceKind::Tip,
        ResourceKind::Talk,
        ResourceKind::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Workshop => "workshop",
            ResourceKind::Cohort => "cohort",
            ResourceKind::Tutorial => "tutorial",
            ResourceKind::Section => "section",
            ResourceKind::Lesson => "lesson",
            ResourceKind::Exercise => "exercise",
            ResourceKind::Solution => "solution",
            ResourceKind::Post => "post",
            ResourceKind::Tip => "tip",
            ResourceKind::Talk => "talk",
            ResourceKind::Other => "other",
        }
    }

    /// Kinds a free-tier tag can unlock.
    pub fn is_free_tier_eligible(&self) -> bool {
        matches!(
            self,
            ResourceKind::Lesson | ResourceKind::Exercise | ResourceKind::Post
        )
    }
}

impl core::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Standard,
    Premium,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_solution: Option<bool>,
}

/// Metadata on the parent→child join row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
}

/// An ordered child entry of a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLink {
    pub resource_id: ContentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<LinkMetadata>,
    pub resource: ContentResource,
}

impl ResourceLink {
    pub fn is_free(&self) -> bool {
        self.metadata
            .as_ref()
            .and_then(|m| m.tier)
            .is_some_and(|tier| tier == Tier::Free)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceProduct {
    pub product_id: ProductId,
}

/// A node of the content tree (module → section → lesson → solution).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentResource {
    pub id: ContentId,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    #[serde(default)]
    pub fields: ResourceFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by_id: Option<UserId>,
    #[serde(default)]
    pub resources: Vec<ResourceLink>,
    /// Products that sell this module.
    #[serde(default)]
    pub resource_products: Vec<ResourceProduct>,
}

impl ContentResource {
    pub fn new(id: impl Into<ContentId>, kind: ResourceKind) -> Self {
        Self {
            id: id.into(),
            kind,
            fields: ResourceFields::default(),
            created_by_id: None,
            resources: Vec::new(),
            resource_products: Vec::new(),
        }
    }

    /// Builder: set `fields.startsAt`.
    pub fn starting_at(mut self, starts_at: DateTime<Utc>) -> Self {
        self.fields.starts_at = Some(starts_at);
        self
    }

    /// Builder: append a child.
    pub fn with_child(mut self, child: ContentResource, tier: Option<Tier>) -> Self {
        self.resources.push(ResourceLink {
            resource_id: child.id.clone(),
            metadata: tier.map(|tier| LinkMetadata { tier: Some(tier) }),
            resource: child,
        });
        self
    }

    /// Builder: add a product selling this resource.
    pub fn sold_as(mut self, product_id: impl Into<ProductId>) -> Self {
        self.resource_products.push(ResourceProduct {
            product_id: product_id.into(),
        });
        self
    }

    pub fn is_solution(&self) -> bool {
        self.kind == ResourceKind::Solution || self.fields.is_solution.unwrap_or(false)
    }

    /// Whether the module has opened. An absent start date counts as open.
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.fields.starts_at.is_none_or(|starts_at| now > starts_at)
    }

    pub fn product_ids(&self) -> impl Iterator<Item = &ProductId> {
        self.resource_products.iter().map(|p| &p.product_id)
    }

    /// This resource as a `Content` subject for `can` queries.
    pub fn as_subject(&self) -> SubjectInstance {
        let instance = SubjectInstance::new(SubjectType::Content)
            .with("id", self.id.as_str())
            .with("type", self.kind.as_str());
        match &self.created_by_id {
            Some(author) => instance.with("createdById", author.as_str()),
            None => instance,
        }
    }
}
