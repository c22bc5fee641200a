//! Entitlement Resolver.
//!
//! Cohort entitlements gate module content on the module start date; until
//! then the viewer only sees `PendingOpenAccess`. Workshop entitlements are
//! self-paced and open immediately.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use courseware_core::ContentId;

use crate::{
    AbilityBuilder, AbilityConfig, Action, Conditions, ContentResource, Entitlement,
    EntitlementCatalog, EntitlementKind, SubjectType, Viewer,
};

/// What the entitlements did for the module being viewed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementGrants {
    /// A cohort or workshop entitlement lists the module.
    pub covers_module: bool,
    /// Module content is readable through an entitlement.
    pub module_content_open: bool,
    /// A cohort entitlement covers the module but it has not started.
    pub pending_open_access: bool,
}

/// Inputs scoped to the module being viewed.
#[derive(Debug, Clone, Copy)]
pub struct ModuleScope<'a> {
    pub module: Option<&'a ContentResource>,
    pub lesson: Option<&'a ContentResource>,
    /// Pre-flattened ids of every lesson/exercise/solution under the module.
    pub all_module_resource_ids: &'a [ContentId],
    pub now: DateTime<Utc>,
}

pub fn grant_entitlement_rules(
    viewer: &Viewer,
    catalog: &EntitlementCatalog,
    scope: &ModuleScope<'_>,
    config: &AbilityConfig,
    builder: &mut AbilityBuilder,
) -> EntitlementGrants {
    let mut grants = EntitlementGrants::default();

    for entitlement in &viewer.entitlements {
        let Some(kind) = catalog.kind_of(entitlement) else {
            continue;
        };
        if config.honor_entitlement_expiry && entitlement.is_expired(scope.now) {
            tracing::debug!(entitlement_type = %entitlement.entitlement_type, "skipping expired entitlement");
            continue;
        }

        match kind {
            EntitlementKind::CohortContentAccess => {
                grant_cohort(entitlement, scope, builder, &mut grants)
            }
            EntitlementKind::WorkshopContentAccess => {
                grant_workshop(entitlement, scope, builder, &mut grants)
            }
        }
    }

    grants
}

fn grant_cohort(
    entitlement: &Entitlement,
    scope: &ModuleScope<'_>,
    builder: &mut AbilityBuilder,
    grants: &mut EntitlementGrants,
) {
    let content_ids = entitlement.content_ids();
    grant_listed_content(&content_ids, builder);

    let Some(module) = scope.module else {
        return;
    };
    if !content_ids.contains(&module.id) {
        return;
    }
    grants.covers_module = true;

    if module.has_started(scope.now) {
        grant_module_content(scope.all_module_resource_ids, builder);
        grants.module_content_open = true;
    } else {
        tracing::debug!(module_id = %module.id, starts_at = ?module.fields.starts_at, "cohort has not started");
        builder.can(Action::Read, SubjectType::PendingOpenAccess);
        grants.pending_open_access = true;
    }

    if let Some(lesson) = scope.lesson {
        recheck_lesson(module, lesson, scope, builder);
    }
}

/// The cohort gate repeated at lesson granularity.
///
/// A lesson outside the module is left to the module-level rules; a lesson
/// inside it is confined to `PendingOpenAccess` until the module opens.
fn recheck_lesson(
    module: &ContentResource,
    lesson: &ContentResource,
    scope: &ModuleScope<'_>,
    builder: &mut AbilityBuilder,
) {
    if !scope.all_module_resource_ids.contains(&lesson.id) {
        return;
    }

    if module.has_started(scope.now) {
        grant_module_content(scope.all_module_resource_ids, builder);
    } else {
        builder.can(Action::Read, SubjectType::PendingOpenAccess);
    }
}

fn grant_workshop(
    entitlement: &Entitlement,
    scope: &ModuleScope<'_>,
    builder: &mut AbilityBuilder,
    grants: &mut EntitlementGrants,
) {
    let content_ids = entitlement.content_ids();
    grant_listed_content(&content_ids, builder);

    if scope.module.is_some_and(|m| content_ids.contains(&m.id)) {
        grants.covers_module = true;
        grants.module_content_open = true;
        grant_module_content(scope.all_module_resource_ids, builder);
    }
}

fn grant_listed_content(content_ids: &BTreeSet<ContentId>, builder: &mut AbilityBuilder) {
    grant_read_ids(content_ids.iter(), builder);
}

fn grant_module_content(resource_ids: &[ContentId], builder: &mut AbilityBuilder) {
    grant_read_ids(resource_ids.iter(), builder);
}

fn grant_read_ids<'i>(ids: impl Iterator<Item = &'i ContentId>, builder: &mut AbilityBuilder) {
    let ids: Vec<&str> = ids.map(ContentId::as_str).collect();
    if ids.is_empty() {
        return;
    }
    builder.can_where(
        Action::Read,
        SubjectType::Content,
        Conditions::new().is_in("id", ids),
    );
}
