use serde::{Deserialize, Serialize};

use courseware_core::{CouponId, ProductId, PurchaseId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PurchaseStatus {
    Valid,
    /// Valid only when viewed from the country it was bought in.
    Restricted,
    Refunded,
    Disputed,
    Banned,
    #[serde(other)]
    Other,
}

/// Seat usage of the coupon generated for a bulk (team) purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCoupon {
    pub id: CouponId,
    pub max_uses: u32,
    #[serde(default)]
    pub used_count: u32,
}

impl BulkCoupon {
    pub fn unused_seats(&self) -> u32 {
        self.max_uses.saturating_sub(self.used_count)
    }
}

/// Snapshot of a purchase row. Never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: PurchaseId,
    pub product_id: ProductId,
    pub status: PurchaseStatus,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub bulk_coupon_id: Option<CouponId>,
    #[serde(default)]
    pub bulk_coupon: Option<BulkCoupon>,
    /// Set when a payment-provider charge backs this purchase.
    #[serde(default)]
    pub merchant_charge_id: Option<String>,
}

impl Purchase {
    pub fn new(
        id: impl Into<PurchaseId>,
        product_id: impl Into<ProductId>,
        status: PurchaseStatus,
    ) -> Self {
        Self {
            id: id.into(),
            product_id: product_id.into(),
            status,
            country: None,
            bulk_coupon_id: None,
            bulk_coupon: None,
            merchant_charge_id: None,
        }
    }

    /// Builder: set the purchase country.
    pub fn in_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Builder: mark as a bulk purchase with the given seat coupon.
    pub fn with_bulk_coupon(mut self, coupon: BulkCoupon) -> Self {
        self.bulk_coupon_id = Some(coupon.id.clone());
        self.bulk_coupon = Some(coupon);
        self
    }

    /// Builder: attach a charge record.
    pub fn with_charge(mut self, merchant_charge_id: impl Into<String>) -> Self {
        self.merchant_charge_id = Some(merchant_charge_id.into());
        self
    }

    pub fn is_bulk(&self) -> bool {
        self.bulk_coupon_id.is_some()
    }

    pub fn has_charge(&self) -> bool {
        self.merchant_charge_id.is_some()
    }

    pub fn has_unused_seats(&self) -> bool {
        self.bulk_coupon
            .as_ref()
            .is_some_and(|coupon| coupon.unused_seats() > 0)
    }
}
