use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::customer::{CustomerId, CustomerPricing, PriceItem, PriceItemId};
use crate::pricing::breakdown::{round_currency, PriceBreakdown, PriceModeKind};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Mutually exclusive pricing strategies. Each variant carries only the data
/// its computation path needs; `Fixed`/`Customer` selections and the manual
/// amount stay `None` until the user completes them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PriceMode {
    /// Automatic formula over base, distance, surcharges, discount and VAT.
    Recommended,
    /// A flat item from the tenant's general catalog; customer-discountable.
    Fixed { item: Option<PriceItemId> },
    /// A flat item from the attached customer's own catalog; already
    /// customer-specific, never discounted further.
    Customer { item: Option<PriceItemId> },
    /// Literal operator-entered amount. The engine computes no discount or
    /// VAT over it; the caller owns the VAT-inclusive flag.
    Custom { amount: Option<Decimal> },
}

impl PriceMode {
    pub fn kind(&self) -> PriceModeKind {
        match self {
            Self::Recommended => PriceModeKind::Recommended,
            Self::Fixed { .. } => PriceModeKind::Fixed,
            Self::Customer { .. } => PriceModeKind::Customer,
            Self::Custom { .. } => PriceModeKind::Custom,
        }
    }
}

/// Final-price verdict. `complete == false` (always with amount 0) marks an
/// incomplete quote the caller must not silently accept.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinalPrice {
    pub amount: Decimal,
    pub complete: bool,
}

impl FinalPrice {
    fn incomplete() -> Self {
        Self { amount: Decimal::ZERO, complete: false }
    }

    fn of(amount: Decimal) -> Self {
        Self { amount, complete: true }
    }
}

/// Compute the final price for the chosen strategy.
///
/// `recommended` is the compiled breakdown when one exists; stale catalog
/// references and missing selections degrade to an incomplete zero price,
/// never an error.
pub fn compute_final_price(
    mode: &PriceMode,
    recommended: Option<&PriceBreakdown>,
    general_items: &[PriceItem],
    customer: Option<&CustomerPricing>,
) -> FinalPrice {
    match mode {
        PriceMode::Recommended => match recommended {
            Some(breakdown) => FinalPrice::of(breakdown.total),
            None => FinalPrice::incomplete(),
        },
        PriceMode::Fixed { item } => {
            let Some(item) = item.as_ref().and_then(|id| find_item(general_items, id)) else {
                return FinalPrice::incomplete();
            };
            let discount_percent =
                customer.map(|pricing| pricing.discount_percent).unwrap_or(Decimal::ZERO);
            let discounted = item.price * (HUNDRED - discount_percent) / HUNDRED;
            FinalPrice::of(round_currency(discounted))
        }
        PriceMode::Customer { item } => {
            let found = item
                .as_ref()
                .and_then(|id| customer.and_then(|pricing| pricing.find_item(id)));
            match found {
                Some(item) => FinalPrice::of(item.price),
                None => FinalPrice::incomplete(),
            }
        }
        PriceMode::Custom { amount } => match amount {
            Some(value) if *value > Decimal::ZERO => FinalPrice::of(*value),
            _ => FinalPrice::incomplete(),
        },
    }
}

/// Coerce raw manual-price input. Empty, non-numeric and negative entries
/// yield `None`; the engine never fails on bad numeric input.
pub fn coerce_manual_price(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<Decimal>().ok().filter(|value| !value.is_sign_negative())
}

/// Per-form strategy state. Attaching a different customer resets the mode
/// to `Recommended` and drops any selected item or manual amount, so a price
/// item from another customer's catalog can never silently carry over.
#[derive(Clone, Debug, PartialEq)]
pub struct StrategySession {
    mode: PriceMode,
    customer_id: Option<CustomerId>,
}

impl Default for StrategySession {
    fn default() -> Self {
        Self::new()
    }
}

impl StrategySession {
    pub fn new() -> Self {
        Self { mode: PriceMode::Recommended, customer_id: None }
    }

    /// Restore a previously persisted selection when a priced job is opened
    /// for editing. This path deliberately skips the customer-change reset.
    pub fn load_existing(mode: PriceMode, customer_id: Option<CustomerId>) -> Self {
        Self { mode, customer_id }
    }

    pub fn mode(&self) -> &PriceMode {
        &self.mode
    }

    pub fn customer_id(&self) -> Option<&CustomerId> {
        self.customer_id.as_ref()
    }

    pub fn select_mode(&mut self, mode: PriceMode) {
        self.mode = mode;
    }

    pub fn attach_customer(&mut self, customer_id: Option<CustomerId>) {
        if self.customer_id == customer_id {
            return;
        }
        self.customer_id = customer_id;
        self.mode = PriceMode::Recommended;
    }
}

fn find_item<'a>(items: &'a [PriceItem], id: &PriceItemId) -> Option<&'a PriceItem> {
    items.iter().find(|item| &item.id == id)
}
