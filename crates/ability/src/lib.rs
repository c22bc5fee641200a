//! `courseware-ability`: content-access authorization engine.
//!
//! Given a viewer snapshot (roles, organization memberships, entitlements),
//! their purchases and the content tree being viewed, compile the exact set of
//! permitted actions into an [`Ability`] and answer `can` queries against it.
//!
//! This crate is decoupled from HTTP and storage: callers gather
//! the snapshot, call [`compile`] once per request, and check `can` at every
//! access-controlled point. The engine never enforces anything on its own.

pub mod ability;
pub mod action;
pub mod compiler;
pub mod condition;
pub mod config;
pub mod entitlement;
pub mod error;
pub mod grants;
pub mod purchase;
pub mod resource;
pub mod rule;
pub mod subject;
pub mod viewer;

pub use ability::{Ability, AbilityBuilder, AbilityExplanation, DenialKind, MatchedRule};
pub use action::Action;
pub use compiler::{AbilityInput, Compilation, compile, compile_detailed};
pub use condition::{Conditions, Operator};
pub use config::AbilityConfig;
pub use entitlement::{Entitlement, EntitlementCatalog, EntitlementKind, EntitlementType};
pub use error::{AbilityError, AbilityResult};
pub use purchase::{BulkCoupon, Purchase, PurchaseStatus};
pub use resource::{
    ContentResource, LinkMetadata, ResourceFields, ResourceKind, ResourceLink, ResourceProduct,
    Tier,
};
pub use rule::Rule;
pub use subject::{Subject, SubjectInstance, SubjectType, subject};
pub use viewer::{OrganizationRole, OrganizationRoleName, Role, RoleAssignment, Viewer};
