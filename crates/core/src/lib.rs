//! `courseware-core`: shared domain building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;

pub use error::DomainError;
pub use id::{
    ContentId, CouponId, EntitlementTypeId, OrganizationId, ProductId, PurchaseId, UserId,
};
