use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub Uuid);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceItemId(pub String);

/// A flat-rate catalog line ("tow within city limits") that bypasses the
/// distance/surcharge formula entirely.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceItem {
    pub id: PriceItemId,
    pub label: String,
    pub price: Decimal,
}

/// Per-customer billing terms: a percentage discount plus an optional private
/// catalog of fixed-price items.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomerPricing {
    pub customer_id: CustomerId,
    pub discount_percent: Decimal,
    pub fixed_price_items: Vec<PriceItem>,
}

impl CustomerPricing {
    pub fn find_item(&self, id: &PriceItemId) -> Option<&PriceItem> {
        self.fixed_price_items.iter().find(|item| &item.id == id)
    }
}
