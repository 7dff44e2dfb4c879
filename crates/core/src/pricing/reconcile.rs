use rust_decimal::Decimal;

use crate::domain::catalog::{SelectedService, ServiceCatalogItem};
use crate::pricing::breakdown::{round_currency, PriceBreakdown, PriceModeKind};
use crate::pricing::compiler::apply_minimum_floor;
use crate::pricing::surcharge::service_lines;
use crate::pricing::PricingOutcome;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Reprice an already-quoted job after its service selection changed.
///
/// The existing breakdown is the template: base, distance, time and location
/// components are carried over untouched (no distance re-resolution, no
/// re-evaluation of time rules against the current clock). Only the service
/// lines are rebuilt from the new selection, after which discount, VAT and
/// the minimum floor are replayed from the captured parameters.
///
/// Fixed/customer/custom-priced jobs are service-insensitive: the breakdown
/// is returned unchanged and the caller must switch modes to reprice.
pub fn reconcile_breakdown(
    existing: &PriceBreakdown,
    services: &[SelectedService],
    catalog: &[ServiceCatalogItem],
) -> PricingOutcome {
    if existing.mode != PriceModeKind::Recommended {
        return PricingOutcome { breakdown: existing.clone(), notes: Vec::new() };
    }

    let (service_surcharges, notes) = service_lines(services, catalog);
    let services_total: Decimal = service_surcharges.iter().map(|line| line.amount).sum();

    let subtotal = existing.base_price
        + existing.distance_price
        + existing.time_addition()
        + existing.location_addition()
        + services_total;

    let discount_amount = subtotal * existing.discount_percent / HUNDRED;
    let after_discount = subtotal - discount_amount;
    let vat_amount = after_discount * existing.vat_rate;
    let total =
        apply_minimum_floor(round_currency(after_discount + vat_amount), existing.minimum_price);

    PricingOutcome {
        breakdown: PriceBreakdown {
            mode: existing.mode,
            base_price: existing.base_price,
            distance_price: existing.distance_price,
            time_surcharges: existing.time_surcharges.clone(),
            location_surcharges: existing.location_surcharges.clone(),
            service_surcharges,
            subtotal,
            discount_percent: existing.discount_percent,
            discount_amount,
            vat_rate: existing.vat_rate,
            vat_amount,
            total,
            minimum_price: existing.minimum_price,
        },
        notes,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::config::PricingConfig;
    use crate::domain::catalog::{
        ActiveWindow, SelectedService, ServiceCatalogItem, ServiceItemId, ServicePriceType,
        SurchargeRuleId, TimeSurchargeRule,
    };
    use crate::pricing::breakdown::PriceModeKind;
    use crate::pricing::compiler::compile_breakdown;
    use crate::pricing::tests::inputs_fixture;
    use crate::pricing::PricingNote;

    use super::reconcile_breakdown;

    fn winch_catalog() -> Vec<ServiceCatalogItem> {
        vec![
            ServiceCatalogItem {
                id: ServiceItemId("winch".to_string()),
                label: "Winch".to_string(),
                price_type: ServicePriceType::PerUnit,
                unit_price: Decimal::new(50, 0),
            },
            ServiceCatalogItem {
                id: ServiceItemId("door-unlock".to_string()),
                label: "Door unlock".to_string(),
                price_type: ServicePriceType::Flat,
                unit_price: Decimal::new(120, 0),
            },
        ]
    }

    fn select(id: &str, quantity: Option<u32>) -> SelectedService {
        SelectedService {
            item_id: ServiceItemId(id.to_string()),
            quantity,
            manual_price: None,
        }
    }

    #[test]
    fn service_edit_recomputes_downstream_totals_only() {
        let mut inputs = inputs_fixture();
        inputs.time_rules = vec![TimeSurchargeRule {
            id: SurchargeRuleId("night".to_string()),
            label: "Night".to_string(),
            window: ActiveWindow {
                days: vec![
                    chrono::Weekday::Mon,
                    chrono::Weekday::Tue,
                    chrono::Weekday::Wed,
                    chrono::Weekday::Thu,
                    chrono::Weekday::Fri,
                    chrono::Weekday::Sat,
                    chrono::Weekday::Sun,
                ],
                start: chrono::NaiveTime::from_hms_opt(0, 0, 0).expect("start"),
                end: chrono::NaiveTime::from_hms_opt(0, 0, 0).expect("end"),
                on_holidays: true,
            },
            percent: Decimal::new(20, 0),
        }];
        inputs.service_catalog = winch_catalog();
        inputs.services = vec![select("winch", Some(1))];

        let original = compile_breakdown(&inputs, &PricingConfig::default()).breakdown;
        let edited =
            reconcile_breakdown(&original, &[select("winch", Some(3))], &winch_catalog()).breakdown;

        // untouched components are carried over exactly
        assert_eq!(edited.base_price, original.base_price);
        assert_eq!(edited.distance_price, original.distance_price);
        assert_eq!(edited.time_surcharges, original.time_surcharges);
        assert_eq!(edited.location_surcharges, original.location_surcharges);

        // the service edit flows through subtotal, VAT and total
        assert_eq!(edited.services_total(), Decimal::new(150, 0));
        assert_eq!(edited.subtotal, original.subtotal + Decimal::new(100, 0));
        assert_ne!(edited.vat_amount, original.vat_amount);
        assert_ne!(edited.total, original.total);
    }

    #[test]
    fn reconciled_totals_match_a_fresh_compile_of_the_same_inputs() {
        let mut inputs = inputs_fixture();
        inputs.service_catalog = winch_catalog();
        inputs.services = vec![select("door-unlock", None)];

        let original = compile_breakdown(&inputs, &PricingConfig::default()).breakdown;

        inputs.services = vec![select("door-unlock", None), select("winch", Some(2))];
        let fresh = compile_breakdown(&inputs, &PricingConfig::default()).breakdown;
        let reconciled =
            reconcile_breakdown(&original, &inputs.services, &winch_catalog()).breakdown;

        assert_eq!(reconciled, fresh);
    }

    #[test]
    fn removing_all_services_can_drop_back_to_the_floor() {
        let mut inputs = inputs_fixture();
        inputs.rates = Some(crate::pricing::tests::price_list(50, 12, 250));
        inputs.distance_km = Some(Decimal::ZERO);
        inputs.service_catalog = winch_catalog();
        inputs.services = vec![select("winch", Some(10))];

        let original = compile_breakdown(&inputs, &PricingConfig::default()).breakdown;
        assert!(original.total > Decimal::new(250, 0));

        let edited = reconcile_breakdown(&original, &[], &winch_catalog()).breakdown;
        assert_eq!(edited.total, Decimal::new(250, 0));
    }

    #[test]
    fn stale_service_reference_is_noted_not_fatal() {
        let mut inputs = inputs_fixture();
        inputs.service_catalog = winch_catalog();
        let original = compile_breakdown(&inputs, &PricingConfig::default()).breakdown;

        let outcome = reconcile_breakdown(&original, &[select("gone", None)], &winch_catalog());

        assert!(outcome.breakdown.service_surcharges.is_empty());
        assert!(matches!(outcome.notes[0], PricingNote::UnknownServiceItem { .. }));
    }

    #[test]
    fn non_recommended_breakdowns_are_returned_unchanged() {
        let mut inputs = inputs_fixture();
        let mut breakdown = compile_breakdown(&inputs, &PricingConfig::default()).breakdown;
        breakdown.mode = PriceModeKind::Custom;

        inputs.service_catalog = winch_catalog();
        let outcome = reconcile_breakdown(&breakdown, &[select("winch", Some(5))], &winch_catalog());

        assert_eq!(outcome.breakdown, breakdown);
        assert!(outcome.notes.is_empty());
    }
}
