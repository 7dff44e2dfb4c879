use rust_decimal::Decimal;

use crate::config::PricingConfig;
use crate::domain::catalog::VehicleClass;
use crate::pricing::breakdown::{round_currency, PriceBreakdown, PriceModeKind, SurchargeLine};
use crate::pricing::surcharge::{
    applied_time_surcharge, resolve_active_time_surcharges, service_lines,
};
use crate::pricing::{PricingInputs, PricingNote, PricingOutcome};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Compile the recommended-price breakdown:
/// base + distance, then time/location surcharges over that subtotal, then
/// service add-ons, customer discount, VAT, and the minimum-price floor.
/// Intermediate values keep full precision; only the total is rounded.
pub fn compile_breakdown(inputs: &PricingInputs, config: &PricingConfig) -> PricingOutcome {
    let mut notes = Vec::new();

    let (price_per_km, minimum_price) = match &inputs.rates {
        Some(rates) => (rates.price_per_km, rates.minimum_price),
        None => {
            notes.push(PricingNote::MissingPriceList);
            (Decimal::ZERO, Decimal::ZERO)
        }
    };

    let base_price = base_price_total(inputs, config, &mut notes);

    let distance_km = match inputs.distance_km {
        Some(km) => km,
        None => {
            notes.push(PricingNote::DistanceUnresolved);
            Decimal::ZERO
        }
    };
    let distance_price = distance_km * price_per_km;

    let subtotal0 = base_price + distance_price;

    let active = resolve_active_time_surcharges(
        &inputs.time_rules,
        inputs.date,
        inputs.time,
        inputs.is_holiday,
    );
    let time_surcharges: Vec<SurchargeLine> = applied_time_surcharge(&active)
        .map(|rule| SurchargeLine {
            rule_id: rule.id.clone(),
            label: rule.label.clone(),
            percent: rule.percent,
            amount: subtotal0 * rule.percent / HUNDRED,
        })
        .into_iter()
        .collect();

    let location_surcharges: Vec<SurchargeLine> = inputs
        .selected_locations
        .iter()
        .map(|rule| SurchargeLine {
            rule_id: rule.id.clone(),
            label: rule.label.clone(),
            percent: rule.percent,
            amount: subtotal0 * rule.percent / HUNDRED,
        })
        .collect();

    let (service_surcharges, service_notes) =
        service_lines(&inputs.services, &inputs.service_catalog);
    notes.extend(service_notes);

    let time_addition: Decimal = time_surcharges.iter().map(|line| line.amount).sum();
    let location_addition: Decimal = location_surcharges.iter().map(|line| line.amount).sum();
    let services_total: Decimal = service_surcharges.iter().map(|line| line.amount).sum();

    let subtotal = subtotal0 + time_addition + location_addition + services_total;

    // Discounts are only ever looked up via an attached customer record.
    let discount_percent =
        inputs.customer.as_ref().map(|pricing| pricing.discount_percent).unwrap_or(Decimal::ZERO);
    let discount_amount = subtotal * discount_percent / HUNDRED;
    let after_discount = subtotal - discount_amount;

    let vat_amount = after_discount * config.vat_rate;
    let total = apply_minimum_floor(round_currency(after_discount + vat_amount), minimum_price);

    PricingOutcome {
        breakdown: PriceBreakdown {
            mode: PriceModeKind::Recommended,
            base_price,
            distance_price,
            time_surcharges,
            location_surcharges,
            service_surcharges,
            subtotal,
            discount_percent,
            discount_amount,
            vat_rate: config.vat_rate,
            vat_amount,
            total,
            minimum_price,
        },
        notes,
    }
}

/// Recommended total only; convenience for callers that do not keep the
/// breakdown (live form recalculation).
pub fn compute_recommended_price(inputs: &PricingInputs, config: &PricingConfig) -> Decimal {
    compile_breakdown(inputs, config).breakdown.total
}

pub(crate) fn apply_minimum_floor(total: Decimal, minimum_price: Decimal) -> Decimal {
    if total > Decimal::ZERO && total < minimum_price {
        minimum_price
    } else {
        total
    }
}

/// Base price over every vehicle on the route ("custom route" jobs carry
/// several). An unmapped class falls back to the configured default class,
/// then to the configured default amount; an empty vehicle list prices a
/// single default-class vehicle.
fn base_price_total(
    inputs: &PricingInputs,
    config: &PricingConfig,
    notes: &mut Vec<PricingNote>,
) -> Decimal {
    let mut classes = inputs.vehicle_classes.clone();
    if classes.is_empty() {
        notes.push(PricingNote::DefaultVehicleClassUsed);
        classes.push(config.default_vehicle_class);
    }

    classes.into_iter().map(|class| base_price_for_class(inputs, config, class, notes)).sum()
}

fn base_price_for_class(
    inputs: &PricingInputs,
    config: &PricingConfig,
    class: VehicleClass,
    notes: &mut Vec<PricingNote>,
) -> Decimal {
    let Some(rates) = &inputs.rates else {
        return config.default_base_price;
    };

    if let Some(price) = rates.base_price_for(class) {
        return price;
    }

    notes.push(PricingNote::DefaultBasePriceUsed { class });
    rates.base_price_for(config.default_vehicle_class).unwrap_or(config.default_base_price)
}
