use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;

use crate::domain::catalog::{
    SelectedService, ServiceCatalogItem, ServicePriceType, TimeSurchargeRule,
};
use crate::pricing::breakdown::ServiceLine;
use crate::pricing::PricingNote;

/// Pure resolution of which time-surcharge rules apply at the given moment.
/// Several rules may be active at once; see [`applied_time_surcharge`] for
/// the non-stacking tie-break.
pub fn resolve_active_time_surcharges<'a>(
    rules: &'a [TimeSurchargeRule],
    date: NaiveDate,
    time: NaiveTime,
    is_holiday: bool,
) -> Vec<&'a TimeSurchargeRule> {
    rules.iter().filter(|rule| rule.window.matches(date, time, is_holiday)).collect()
}

/// Time surcharges never stack: of the simultaneously active rules only the
/// single highest percent is applied. The first of an equal-percent pair
/// wins, keeping the choice stable across recomputations.
pub fn applied_time_surcharge<'a>(
    active: &[&'a TimeSurchargeRule],
) -> Option<&'a TimeSurchargeRule> {
    let mut winner: Option<&TimeSurchargeRule> = None;
    for rule in active {
        match winner {
            Some(current) if rule.percent <= current.percent => {}
            _ => winner = Some(rule),
        }
    }
    winner
}

/// Location surcharges stack additively over the selected set.
pub fn location_percent_sum(percents: impl IntoIterator<Item = Decimal>) -> Decimal {
    percents.into_iter().sum()
}

/// Fold the selected services into billable lines per catalog semantics:
/// flat items contribute their unit price once, per-unit items multiply by
/// quantity (default 1), manual items carry the caller-supplied amount.
/// Zero-amount manual selections are dropped; selections referencing a
/// missing catalog id are skipped and surfaced as a note.
pub fn service_lines(
    selected: &[SelectedService],
    catalog: &[ServiceCatalogItem],
) -> (Vec<ServiceLine>, Vec<PricingNote>) {
    let mut lines = Vec::with_capacity(selected.len());
    let mut notes = Vec::new();

    for selection in selected {
        let Some(item) = catalog.iter().find(|item| item.id == selection.item_id) else {
            notes.push(PricingNote::UnknownServiceItem { item_id: selection.item_id.clone() });
            continue;
        };

        let quantity = selection.quantity.unwrap_or(1).max(1);
        let (quantity, amount) = match item.price_type {
            ServicePriceType::Flat => (1, item.unit_price),
            ServicePriceType::PerUnit => (quantity, item.unit_price * Decimal::from(quantity)),
            ServicePriceType::Manual => {
                let manual = selection.manual_price.unwrap_or(Decimal::ZERO);
                if manual <= Decimal::ZERO {
                    continue;
                }
                (1, manual)
            }
        };

        lines.push(ServiceLine {
            item_id: item.id.clone(),
            label: item.label.clone(),
            price_type: item.price_type,
            quantity,
            amount,
        });
    }

    (lines, notes)
}
