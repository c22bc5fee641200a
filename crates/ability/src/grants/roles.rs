//! Baseline grants from global roles and organization memberships.

use crate::{
    AbilityBuilder, Action, Conditions, OrganizationRole, OrganizationRoleName, Role, SubjectType,
    Viewer,
};

const CONTRIBUTOR_OWN_CONTENT: [Action; 5] = [
    Action::Manage,
    Action::Save,
    Action::Publish,
    Action::Archive,
    Action::Unpublish,
];

/// Grants derived from who the viewer is, independent of content.
pub fn grant_role_rules(viewer: &Viewer, builder: &mut AbilityBuilder) {
    let own_user = Conditions::new().eq("id", viewer.id.as_str());
    builder.can_each(
        &[Action::Read, Action::Update],
        SubjectType::User,
        Some(own_user),
    );
    builder.can_where(
        Action::Read,
        SubjectType::Entitlement,
        Conditions::new().eq("userId", viewer.id.as_str()),
    );

    for assignment in &viewer.roles {
        match assignment.name {
            Role::Admin => {
                builder.can(Action::Manage, SubjectType::All);
            }
            Role::Contributor => {
                builder.can(Action::Create, SubjectType::Content);
                builder.can_each(
                    &CONTRIBUTOR_OWN_CONTENT,
                    SubjectType::Content,
                    Some(Conditions::new().eq("createdById", viewer.id.as_str())),
                );
            }
            Role::Reviewer => {
                builder.can(Action::Read, SubjectType::Content);
            }
            Role::User => {}
        }
    }

    for membership in &viewer.organization_roles {
        grant_organization_rules(viewer, membership, builder);
    }
}

fn grant_organization_rules(
    viewer: &Viewer,
    membership: &OrganizationRole,
    builder: &mut AbilityBuilder,
) {
    let org_id = membership.organization_id.as_str();
    let organization = || Conditions::new().eq("id", org_id);
    let in_organization = || Conditions::new().eq("organizationId", org_id);

    // Every membership, whatever its name, can see its organization.
    builder.can_where(Action::Read, SubjectType::Organization, organization());

    match membership.name {
        OrganizationRoleName::Owner => {
            builder
                .can_where(Action::Manage, SubjectType::Organization, organization())
                .can_where(Action::Transfer, SubjectType::Organization, organization())
                .can_where(
                    Action::Manage,
                    SubjectType::OrganizationMember,
                    in_organization(),
                )
                .can_where(
                    Action::Manage,
                    SubjectType::OrganizationBilling,
                    in_organization(),
                );
        }
        OrganizationRoleName::Admin => {
            builder
                .can_each(
                    &[Action::Create, Action::Read, Action::Update],
                    SubjectType::Organization,
                    Some(organization()),
                )
                .can_each(
                    &[Action::Create, Action::Read, Action::Update, Action::Delete],
                    SubjectType::OrganizationMember,
                    Some(in_organization()),
                )
                .can_each(
                    &[Action::Read, Action::Update],
                    SubjectType::OrganizationBilling,
                    Some(in_organization()),
                );
        }
        OrganizationRoleName::Member | OrganizationRoleName::Learner => {
            builder
                .can_where(
                    Action::Read,
                    SubjectType::OrganizationMember,
                    in_organization(),
                )
                .can_where(
                    Action::Delete,
                    SubjectType::OrganizationMember,
                    in_organization().eq("userId", viewer.id.as_str()),
                );
        }
        OrganizationRoleName::Unrecognized => {
            tracing::debug!(
                organization_id = %membership.organization_id,
                "unrecognized organization role; baseline read only"
            );
        }
    }
}
