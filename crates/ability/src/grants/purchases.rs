//! Purchase Validity Resolver.
//!
//! Classifies the viewer's purchases against the module being viewed and
//! derives the commerce-level grants (invoices, team seats, region notice).
//!
//! Purchases no longer grant module content. Access to lessons flows
//! exclusively through entitlements; a valid purchase is still classified so
//! callers can render receipts and upgrade paths.

use serde::Serialize;

use courseware_core::{ProductId, PurchaseId};

use crate::{AbilityBuilder, Action, ContentResource, Purchase, PurchaseStatus, SubjectType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    BulkPurchase,
    RegionRestricted,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "validity", rename_all = "snake_case")]
pub enum PurchaseValidity {
    Valid,
    Invalid { reason: InvalidReason },
}

impl PurchaseValidity {
    pub fn is_valid(&self) -> bool {
        matches!(self, PurchaseValidity::Valid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedPurchase {
    pub purchase_id: PurchaseId,
    pub product_id: ProductId,
    pub validity: PurchaseValidity,
}

/// Summary of what the viewer's purchases produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseGrants {
    /// Purchases of the module's products, in input order.
    pub module_purchases: Vec<ClassifiedPurchase>,
    pub has_valid_purchase: bool,
    pub region_restricted: bool,
    pub bulk_purchase: bool,
}

/// Classify a single purchase as seen from `viewer_country`.
///
/// Order matters: a bulk purchase is never a direct grant even when its status
/// is `Valid`.
pub fn classify(purchase: &Purchase, viewer_country: Option<&str>) -> PurchaseValidity {
    if purchase.is_bulk() {
        return PurchaseValidity::Invalid {
            reason: InvalidReason::BulkPurchase,
        };
    }

    let same_country = same_country(purchase.country.as_deref(), viewer_country);
    match purchase.status {
        PurchaseStatus::Restricted if !same_country => PurchaseValidity::Invalid {
            reason: InvalidReason::RegionRestricted,
        },
        PurchaseStatus::Valid | PurchaseStatus::Restricted => PurchaseValidity::Valid,
        _ => PurchaseValidity::Invalid {
            reason: InvalidReason::Unknown,
        },
    }
}

/// Classify every purchase of one of `module_products`.
pub fn classify_purchases<'p>(
    module_products: impl IntoIterator<Item = &'p ProductId>,
    purchases: &[Purchase],
    viewer_country: Option<&str>,
) -> Vec<ClassifiedPurchase> {
    let products: Vec<&ProductId> = module_products.into_iter().collect();
    purchases
        .iter()
        .filter(|purchase| products.contains(&&purchase.product_id))
        .map(|purchase| ClassifiedPurchase {
            purchase_id: purchase.id.clone(),
            product_id: purchase.product_id.clone(),
            validity: classify(purchase, viewer_country),
        })
        .collect()
}

pub fn grant_purchase_rules(
    purchases: &[Purchase],
    module: Option<&ContentResource>,
    viewer_country: Option<&str>,
    builder: &mut AbilityBuilder,
) -> PurchaseGrants {
    let module_purchases = match module {
        Some(module) => classify_purchases(module.product_ids(), purchases, viewer_country),
        None => Vec::new(),
    };

    let region_restricted = module_purchases.iter().any(|p| {
        p.validity
            == PurchaseValidity::Invalid {
                reason: InvalidReason::RegionRestricted,
            }
    });
    if region_restricted {
        tracing::debug!("module purchase is region restricted for the current country");
        builder.can(Action::Read, SubjectType::RegionRestriction);
    }

    let has_valid_purchase = module_purchases.iter().any(|p| p.validity.is_valid());
    if has_valid_purchase {
        tracing::trace!("valid module purchase found; content access comes from entitlements");
    }

    if purchases.iter().any(Purchase::has_charge) {
        builder.can(Action::Read, SubjectType::Invoice);
    }

    let bulk_purchase = purchases.iter().any(Purchase::is_bulk);
    if bulk_purchase {
        builder.can(Action::Read, SubjectType::Team);
    }
    if purchases.iter().any(Purchase::has_unused_seats) {
        builder.can(Action::Invite, SubjectType::Team);
    }

    if purchases
        .iter()
        .any(|p| classify(p, viewer_country).is_valid())
    {
        builder.can(Action::Read, SubjectType::Discord);
    }

    PurchaseGrants {
        module_purchases,
        has_valid_purchase,
        region_restricted,
        bulk_purchase,
    }
}

fn same_country(purchase_country: Option<&str>, viewer_country: Option<&str>) -> bool {
    match (purchase_country, viewer_country) {
        (Some(a), Some(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
        (None, None) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BulkCoupon, ResourceKind};
    use courseware_core::CouponId;

    fn module() -> ContentResource {
        ContentResource::new("workshop_1", ResourceKind::Workshop).sold_as("prod_1")
    }

    fn restricted_de() -> Purchase {
        Purchase::new("p1", "prod_1", PurchaseStatus::Restricted).in_country("DE")
    }

    fn team_purchase(max_uses: u32, used_count: u32) -> Purchase {
        Purchase::new("p2", "prod_1", PurchaseStatus::Valid).with_bulk_coupon(BulkCoupon {
            id: CouponId::new("coupon_1"),
            max_uses,
            used_count,
        })
    }

    #[test]
    fn classification_follows_precedence() {
        assert_eq!(
            classify(&team_purchase(5, 0), Some("US")),
            PurchaseValidity::Invalid {
                reason: InvalidReason::BulkPurchase
            }
        );
        assert_eq!(
            classify(&restricted_de(), Some("US")),
            PurchaseValidity::Invalid {
                reason: InvalidReason::RegionRestricted
            }
        );
        assert_eq!(classify(&restricted_de(), Some("de")), PurchaseValidity::Valid);
        assert_eq!(
            classify(&Purchase::new("p3", "prod_1", PurchaseStatus::Valid), None),
            PurchaseValidity::Valid
        );
        assert_eq!(
            classify(&Purchase::new("p4", "prod_1", PurchaseStatus::Refunded), None),
            PurchaseValidity::Invalid {
                reason: InvalidReason::Unknown
            }
        );
    }

    #[test]
    fn restricted_purchase_without_viewer_country_is_restricted() {
        assert_eq!(
            classify(&restricted_de(), None),
            PurchaseValidity::Invalid {
                reason: InvalidReason::RegionRestricted
            }
        );
    }

    #[test]
    fn only_module_products_are_classified() {
        let purchases = vec![
            restricted_de(),
            Purchase::new("p9", "prod_other", PurchaseStatus::Valid),
        ];
        let classified = classify_purchases(module().product_ids(), &purchases, Some("US"));
        assert_eq!(classified.len(), 1);
        assert_eq!(classified[0].purchase_id, PurchaseId::new("p1"));
    }

    #[test]
    fn region_restriction_grants_sentinel_but_not_content() {
        let mut builder = AbilityBuilder::new();
        let grants = grant_purchase_rules(&[restricted_de()], Some(&module()), Some("US"), &mut builder);
        let ability = builder.build();

        assert!(grants.region_restricted);
        assert!(!grants.has_valid_purchase);
        assert!(ability.can(Action::Read, SubjectType::RegionRestriction));
        assert!(!ability.can_some(Action::Read, SubjectType::Content));
    }

    #[test]
    fn valid_purchase_never_grants_content() {
        let mut builder = AbilityBuilder::new();
        let purchase = Purchase::new("p1", "prod_1", PurchaseStatus::Valid);
        let grants = grant_purchase_rules(&[purchase], Some(&module()), None, &mut builder);
        let ability = builder.build();

        assert!(grants.has_valid_purchase);
        assert!(!ability.can_some(Action::Read, SubjectType::Content));
        assert!(ability.can(Action::Read, SubjectType::Discord));
    }

    #[test]
    fn team_grants_follow_seats() {
        let mut builder = AbilityBuilder::new();
        grant_purchase_rules(&[team_purchase(5, 5)], None, None, &mut builder);
        let ability = builder.build();
        assert!(ability.can(Action::Read, SubjectType::Team));
        assert!(ability.cannot(Action::Invite, SubjectType::Team));
        assert!(ability.cannot(Action::Read, SubjectType::Discord));

        let mut builder = AbilityBuilder::new();
        grant_purchase_rules(&[team_purchase(5, 1)], None, None, &mut builder);
        assert!(builder.build().can(Action::Invite, SubjectType::Team));
    }

    #[test]
    fn charged_purchase_grants_invoice() {
        let mut builder = AbilityBuilder::new();
        let purchase = Purchase::new("p1", "prod_x", PurchaseStatus::Refunded).with_charge("ch_1");
        grant_purchase_rules(&[purchase], None, None, &mut builder);
        let ability = builder.build();
        assert!(ability.can(Action::Read, SubjectType::Invoice));
        assert!(ability.cannot(Action::Read, SubjectType::Discord));
    }

    #[test]
    fn no_purchases_no_rules() {
        let mut builder = AbilityBuilder::new();
        let grants = grant_purchase_rules(&[], Some(&module()), Some("US"), &mut builder);
        assert!(builder.is_empty());
        assert_eq!(grants, PurchaseGrants::default());
    }
}
