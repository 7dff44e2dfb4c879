use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::catalog::{ServiceItemId, ServicePriceType, SurchargeRuleId};

/// Strategy tag persisted alongside a breakdown. The full [`PriceMode`]
/// carries selection data; this tag is what later edits dispatch on.
///
/// [`PriceMode`]: crate::pricing::strategy::PriceMode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceModeKind {
    Recommended,
    Fixed,
    Customer,
    Custom,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurchargeLine {
    pub rule_id: SurchargeRuleId,
    pub label: String,
    pub percent: Decimal,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceLine {
    pub item_id: ServiceItemId,
    pub label: String,
    pub price_type: ServicePriceType,
    pub quantity: u32,
    pub amount: Decimal,
}

/// Itemized decomposition of a quoted price. Once persisted against a job it
/// is the source of truth for later edits: reconciliation replays the
/// discount/VAT/floor steps from the captured `discount_percent`, `vat_rate`
/// and `minimum_price` without consulting the current catalogs.
///
/// `subtotal` is the pre-discount sum of every component. Unless the
/// minimum-price floor clamped it,
/// `total == round((subtotal - discount_amount) * (1 + vat_rate))`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub mode: PriceModeKind,
    pub base_price: Decimal,
    pub distance_price: Decimal,
    pub time_surcharges: Vec<SurchargeLine>,
    pub location_surcharges: Vec<SurchargeLine>,
    pub service_surcharges: Vec<ServiceLine>,
    pub subtotal: Decimal,
    pub discount_percent: Decimal,
    pub discount_amount: Decimal,
    pub vat_rate: Decimal,
    pub vat_amount: Decimal,
    pub total: Decimal,
    pub minimum_price: Decimal,
}

impl PriceBreakdown {
    pub fn time_addition(&self) -> Decimal {
        self.time_surcharges.iter().map(|line| line.amount).sum()
    }

    pub fn location_addition(&self) -> Decimal {
        self.location_surcharges.iter().map(|line| line.amount).sum()
    }

    pub fn services_total(&self) -> Decimal {
        self.service_surcharges.iter().map(|line| line.amount).sum()
    }
}

/// Round to the nearest whole currency unit, midpoint away from zero.
/// Applied once at the end of a computation, never to intermediate values.
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{round_currency, PriceBreakdown, PriceModeKind};

    #[test]
    fn rounds_midpoint_away_from_zero() {
        assert_eq!(round_currency(Decimal::new(52392, 2)), Decimal::new(524, 0));
        assert_eq!(round_currency(Decimal::new(4715, 1)), Decimal::new(472, 0));
        assert_eq!(round_currency(Decimal::new(4714, 1)), Decimal::new(471, 0));
    }

    #[test]
    fn breakdown_round_trips_through_json() {
        let breakdown = PriceBreakdown {
            mode: PriceModeKind::Recommended,
            base_price: Decimal::new(180, 0),
            distance_price: Decimal::new(264, 0),
            time_surcharges: Vec::new(),
            location_surcharges: Vec::new(),
            service_surcharges: Vec::new(),
            subtotal: Decimal::new(444, 0),
            discount_percent: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            vat_rate: Decimal::new(18, 2),
            vat_amount: Decimal::new(7992, 2),
            total: Decimal::new(524, 0),
            minimum_price: Decimal::new(250, 0),
        };

        let encoded = serde_json::to_string(&breakdown).expect("encode");
        let decoded: PriceBreakdown = serde_json::from_str(&encoded).expect("decode");
        assert_eq!(decoded, breakdown);
    }
}
