//! Free-Tier Resolver.
//!
//! Walks the module's direct children only. A free `section` opens its
//! lessons, exercises and posts; a free top-level lesson/exercise/post opens
//! itself. Sections nested inside sections are not inspected.

use courseware_core::ContentId;

use crate::{
    AbilityBuilder, AbilityConfig, Action, Conditions, ContentResource, ResourceKind, SubjectType,
};

/// Ids under `module` tagged `tier: free`, in tree order.
pub fn free_resource_ids(module: &ContentResource) -> Vec<ContentId> {
    let mut ids = Vec::new();

    for link in module.resources.iter().filter(|link| link.is_free()) {
        let child = &link.resource;
        match child.kind {
            ResourceKind::Section => {
                ids.extend(
                    child
                        .resources
                        .iter()
                        .map(|grandchild| &grandchild.resource)
                        .filter(|r| is_eligible(r))
                        .map(|r| r.id.clone()),
                );
            }
            _ if is_eligible(child) => ids.push(child.id.clone()),
            _ => {}
        }
    }

    ids
}

fn is_eligible(resource: &ContentResource) -> bool {
    resource.kind.is_free_tier_eligible() && !resource.is_solution()
}

/// Whole-module public visibility.
///
/// Retired: modules are never public as a whole any more; only tagged
/// resources and free content kinds are. Kept so the call site documents the
/// former policy.
fn is_freely_visible(_module: &ContentResource) -> bool {
    false
}

/// Grants that apply to every viewer, anonymous included.
pub fn grant_free_tier_rules(
    module: Option<&ContentResource>,
    all_module_resource_ids: &[ContentId],
    config: &AbilityConfig,
    builder: &mut AbilityBuilder,
) {
    if !config.free_content_kinds.is_empty() {
        builder.can_where(
            Action::Read,
            SubjectType::Content,
            Conditions::new().is_in(
                "type",
                config.free_content_kinds.iter().map(ResourceKind::as_str),
            ),
        );
    }

    let Some(module) = module else {
        return;
    };

    let open_tutorial = config.open_tutorials && module.kind == ResourceKind::Tutorial;
    if open_tutorial || is_freely_visible(module) {
        let ids = std::iter::once(module.id.as_str())
            .chain(all_module_resource_ids.iter().map(ContentId::as_str));
        builder.can_where(
            Action::Read,
            SubjectType::Content,
            Conditions::new().is_in("id", ids),
        );
    }

    let free_ids = free_resource_ids(module);
    if free_ids.is_empty() {
        return;
    }
    tracing::trace!(module_id = %module.id, count = free_ids.len(), "free-tier resources");
    builder.can_where(
        Action::Read,
        SubjectType::Content,
        Conditions::new().is_in("id", free_ids.iter().map(ContentId::as_str)),
    );
}
