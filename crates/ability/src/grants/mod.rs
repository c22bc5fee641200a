//! Resolvers turning one input snapshot into additive rules.

pub mod entitlements;
pub mod free_tier;
pub mod purchases;
pub mod roles;

pub use entitlements::{EntitlementGrants, ModuleScope, grant_entitlement_rules};
pub use free_tier::{free_resource_ids, grant_free_tier_rules};
pub use purchases::{
    ClassifiedPurchase, InvalidReason, PurchaseGrants, PurchaseValidity, classify,
    classify_purchases, grant_purchase_rules,
};
pub use roles::grant_role_rules;
