//! The authenticated person an ability is compiled for.
//!
//! Authentication happens elsewhere; by the time a `Viewer` exists the caller
//! has already established who the user is. An absent viewer means anonymous.

use serde::{Deserialize, Serialize};

use courseware_core::{OrganizationId, UserId};

use crate::Entitlement;

/// Global (platform-wide) role.
///
/// Role names the engine does not know are read as `User`, which carries no
/// extra grants beyond those every authenticated viewer receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Contributor,
    Reviewer,
    #[serde(other)]
    User,
}

/// A role row as stored on the user (`{ "name": "admin" }`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub name: Role,
}

/// Role held within a single organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrganizationRoleName {
    Owner,
    Admin,
    Member,
    Learner,
    /// Any other role name; still grants baseline read of the organization.
    #[serde(other)]
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationRole {
    pub organization_id: OrganizationId,
    pub name: OrganizationRoleName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewer {
    pub id: UserId,
    #[serde(default)]
    pub roles: Vec<RoleAssignment>,
    #[serde(default)]
    pub organization_roles: Vec<OrganizationRole>,
    #[serde(default)]
    pub entitlements: Vec<Entitlement>,
}

impl Viewer {
    /// Creates a viewer with no roles, memberships or entitlements.
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            roles: Vec::new(),
            organization_roles: Vec::new(),
            entitlements: Vec::new(),
        }
    }

    /// Builder: add a global role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.push(RoleAssignment { name: role });
        self
    }

    /// Builder: add an organization membership.
    pub fn with_organization_role(
        mut self,
        organization_id: impl Into<OrganizationId>,
        name: OrganizationRoleName,
    ) -> Self {
        self.organization_roles.push(OrganizationRole {
            organization_id: organization_id.into(),
            name,
        });
        self
    }

    /// Builder: add an entitlement.
    pub fn with_entitlement(mut self, entitlement: Entitlement) -> Self {
        self.entitlements.push(entitlement);
        self
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.iter().any(|r| r.name == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}
