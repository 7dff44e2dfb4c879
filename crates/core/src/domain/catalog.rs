use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleClass {
    Private,
    Motorcycle,
    Heavy,
    Machinery,
}

impl VehicleClass {
    pub fn as_key(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Motorcycle => "motorcycle",
            Self::Heavy => "heavy",
            Self::Machinery => "machinery",
        }
    }
}

impl std::str::FromStr for VehicleClass {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "private" => Ok(Self::Private),
            "motorcycle" => Ok(Self::Motorcycle),
            "heavy" => Ok(Self::Heavy),
            "machinery" => Ok(Self::Machinery),
            other => Err(format!(
                "unsupported vehicle class `{other}` (expected private|motorcycle|heavy|machinery)"
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepotLocation {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Tenant rate card. Loaded once per form session and treated as immutable
/// for the lifetime of a pricing request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BasePriceList {
    pub tenant_id: TenantId,
    pub base_prices: BTreeMap<VehicleClass, Decimal>,
    pub price_per_km: Decimal,
    pub minimum_price: Decimal,
    pub depot: Option<DepotLocation>,
}

impl BasePriceList {
    pub fn base_price_for(&self, class: VehicleClass) -> Option<Decimal> {
        self.base_prices.get(&class).copied()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurchargeRuleId(pub String);

/// Time-of-day/day-of-week window. An `end` at or before `start` wraps past
/// midnight; equal `start` and `end` cover the full day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveWindow {
    pub days: Vec<Weekday>,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub on_holidays: bool,
}

impl ActiveWindow {
    /// The holiday flag overrides day-of-week matching: a holiday-enabled
    /// window is day-eligible on any holiday regardless of the weekday set.
    pub fn matches(&self, date: NaiveDate, time: NaiveTime, is_holiday: bool) -> bool {
        let day_eligible =
            self.days.contains(&date.weekday()) || (is_holiday && self.on_holidays);
        day_eligible && self.covers_time(time)
    }

    fn covers_time(&self, time: NaiveTime) -> bool {
        if self.start == self.end {
            return true;
        }
        if self.start < self.end {
            self.start <= time && time < self.end
        } else {
            time >= self.start || time < self.end
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeSurchargeRule {
    pub id: SurchargeRuleId,
    pub label: String,
    pub window: ActiveWindow,
    pub percent: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationSurchargeRule {
    pub id: SurchargeRuleId,
    pub label: String,
    pub percent: Decimal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServicePriceType {
    Flat,
    PerUnit,
    Manual,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceItemId(pub String);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceCatalogItem {
    pub id: ServiceItemId,
    pub label: String,
    pub price_type: ServicePriceType,
    pub unit_price: Decimal,
}

/// A service picked on a job form. `quantity` is meaningful only for
/// `PerUnit` items, `manual_price` only for `Manual` items.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectedService {
    pub item_id: ServiceItemId,
    pub quantity: Option<u32>,
    pub manual_price: Option<Decimal>,
}
