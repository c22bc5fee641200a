//! Rule Compiler: one input snapshot in, one immutable [`Ability`] out.
//!
//! - No IO
//! - No panics
//! - `now` is an input, never read from the clock

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use courseware_core::ContentId;

use crate::grants::{
    EntitlementGrants, ModuleScope, PurchaseGrants, grant_entitlement_rules,
    grant_free_tier_rules, grant_purchase_rules, grant_role_rules,
};
use crate::{
    Ability, AbilityBuilder, AbilityConfig, ContentResource, EntitlementCatalog, EntitlementType,
    Purchase, Viewer,
};

/// Everything the compiler reads, gathered by the caller beforehand.
#[derive(Debug, Clone, Copy)]
pub struct AbilityInput<'a> {
    /// `None` for anonymous visitors.
    pub viewer: Option<&'a Viewer>,
    pub purchases: &'a [Purchase],
    pub entitlement_types: &'a [EntitlementType],
    /// The module (workshop/cohort/tutorial) being viewed, if any.
    pub module: Option<&'a ContentResource>,
    /// The lesson being viewed inside `module`, if any.
    pub lesson: Option<&'a ContentResource>,
    /// ISO country of the current request (from the geo header).
    pub country: Option<&'a str>,
    /// Flattened lesson/exercise/solution ids under `module`.
    pub all_module_resource_ids: &'a [ContentId],
    pub now: DateTime<Utc>,
}

impl<'a> AbilityInput<'a> {
    /// An anonymous snapshot with nothing in it.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            viewer: None,
            purchases: &[],
            entitlement_types: &[],
            module: None,
            lesson: None,
            country: None,
            all_module_resource_ids: &[],
            now,
        }
    }

    pub fn viewer(mut self, viewer: &'a Viewer) -> Self {
        self.viewer = Some(viewer);
        self
    }

    pub fn purchases(mut self, purchases: &'a [Purchase]) -> Self {
        self.purchases = purchases;
        self
    }

    pub fn entitlement_types(mut self, entitlement_types: &'a [EntitlementType]) -> Self {
        self.entitlement_types = entitlement_types;
        self
    }

    pub fn module(mut self, module: &'a ContentResource) -> Self {
        self.module = Some(module);
        self
    }

    pub fn lesson(mut self, lesson: &'a ContentResource) -> Self {
        self.lesson = Some(lesson);
        self
    }

    pub fn country(mut self, country: &'a str) -> Self {
        self.country = Some(country);
        self
    }

    pub fn all_module_resource_ids(mut self, ids: &'a [ContentId]) -> Self {
        self.all_module_resource_ids = ids;
        self
    }
}

/// The compiled ability plus what each resolver concluded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Compilation {
    pub ability: Ability,
    pub purchases: PurchaseGrants,
    pub entitlements: EntitlementGrants,
}

/// Compile the rule set for one viewer snapshot.
pub fn compile(input: &AbilityInput<'_>, config: &AbilityConfig) -> Ability {
    compile_detailed(input, config).ability
}

/// Like [`compile`], also returning the resolver summaries.
#[instrument(
    level = "debug",
    skip_all,
    fields(
        viewer_id = input.viewer.map(|v| v.id.as_str()),
        module_id = input.module.map(|m| m.id.as_str()),
    )
)]
pub fn compile_detailed(input: &AbilityInput<'_>, config: &AbilityConfig) -> Compilation {
    let mut builder = AbilityBuilder::new();
    let mut purchases = PurchaseGrants::default();
    let mut entitlements = EntitlementGrants::default();

    if let Some(viewer) = input.viewer {
        grant_role_rules(viewer, &mut builder);

        purchases = grant_purchase_rules(input.purchases, input.module, input.country, &mut builder);

        let catalog = EntitlementCatalog::resolve(input.entitlement_types);
        let scope = ModuleScope {
            module: input.module,
            lesson: input.lesson,
            all_module_resource_ids: input.all_module_resource_ids,
            now: input.now,
        };
        entitlements = grant_entitlement_rules(viewer, &catalog, &scope, config, &mut builder);
    }

    grant_free_tier_rules(
        input.module,
        input.all_module_resource_ids,
        config,
        &mut builder,
    );

    let ability = builder.build();
    tracing::debug!(rule_count = ability.rules().len(), "compiled ability");

    Compilation {
        ability,
        purchases,
        entitlements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Action, Entitlement, PurchaseStatus, ResourceKind, Role, SubjectType, subject};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn anonymous_snapshot_gets_free_kinds_only() {
        let ability = compile(&AbilityInput::new(now()), &AbilityConfig::default());
        assert_eq!(ability.rules().len(), 1);
        assert!(ability.can(Action::Read, &ContentResource::new("tip_1", ResourceKind::Tip).as_subject()));
        assert!(ability.cannot(Action::Read, SubjectType::User));
    }

    #[test]
    fn anonymous_purchases_are_ignored() {
        let purchases = vec![Purchase::new("p1", "prod_1", PurchaseStatus::Valid).with_charge("ch_1")];
        let input = AbilityInput::new(now()).purchases(&purchases);
        let ability = compile(&input, &AbilityConfig::default());
        assert!(ability.cannot(Action::Read, SubjectType::Invoice));
    }

    #[test]
    fn detailed_compilation_reports_resolver_outcomes() {
        let types = vec![EntitlementType::new("et_cohort", "cohort_content_access")];
        let viewer = Viewer::new("u1")
            .with_role(Role::User)
            .with_entitlement(Entitlement::new("et_cohort", ["cohort_1"]));
        let module = ContentResource::new("cohort_1", ResourceKind::Cohort)
            .starting_at(now() + chrono::Duration::days(7))
            .sold_as("prod_1");
        let purchases =
            vec![Purchase::new("p1", "prod_1", PurchaseStatus::Restricted).in_country("DE")];
        let ids = vec![ContentId::new("lesson_1")];

        let input = AbilityInput::new(now())
            .viewer(&viewer)
            .purchases(&purchases)
            .entitlement_types(&types)
            .module(&module)
            .country("US")
            .all_module_resource_ids(&ids);
        let compilation = compile_detailed(&input, &AbilityConfig::default());

        assert!(compilation.purchases.region_restricted);
        assert!(compilation.entitlements.pending_open_access);
        assert!(compilation.ability.can(Action::Read, SubjectType::RegionRestriction));
        assert!(compilation.ability.can(Action::Read, SubjectType::PendingOpenAccess));
        assert!(
            compilation
                .ability
                .cannot(Action::Read, &subject(SubjectType::Content, "lesson_1"))
        );
    }
}
