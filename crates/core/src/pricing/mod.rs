pub mod breakdown;
pub mod compiler;
pub mod reconcile;
pub mod strategy;
pub mod surcharge;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::PricingConfig;
use crate::domain::catalog::{
    BasePriceList, LocationSurchargeRule, SelectedService, ServiceCatalogItem, ServiceItemId,
    TimeSurchargeRule, VehicleClass,
};
use crate::domain::customer::{CustomerPricing, PriceItemId};
use crate::pricing::breakdown::PriceBreakdown;

/// Immutable snapshot of everything a pricing pass needs. The UI layer
/// assembles one of these after any input mutation and hands it to the pure
/// functions below; the engine never holds state between invocations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricingInputs {
    pub vehicle_classes: Vec<VehicleClass>,
    /// Total driving distance (pickup→dropoff, plus depot→pickup when the
    /// job starts from base). `None` means the distance resolver has not
    /// answered yet; distance-dependent pricing is excluded until it does.
    pub distance_km: Option<Decimal>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub is_holiday: bool,
    pub rates: Option<BasePriceList>,
    pub time_rules: Vec<TimeSurchargeRule>,
    pub selected_locations: Vec<LocationSurchargeRule>,
    pub services: Vec<SelectedService>,
    pub service_catalog: Vec<ServiceCatalogItem>,
    pub customer: Option<CustomerPricing>,
}

/// Recoverable conditions attached to a pricing outcome. None of these abort
/// a computation; callers decide whether to block finalization on them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PricingNote {
    MissingPriceList,
    DefaultBasePriceUsed { class: VehicleClass },
    DefaultVehicleClassUsed,
    DistanceUnresolved,
    UnknownServiceItem { item_id: ServiceItemId },
    UnknownPriceItem { item_id: PriceItemId },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricingOutcome {
    pub breakdown: PriceBreakdown,
    pub notes: Vec<PricingNote>,
}

impl PricingOutcome {
    pub fn used_defaults(&self) -> bool {
        self.notes.iter().any(|note| {
            matches!(
                note,
                PricingNote::MissingPriceList
                    | PricingNote::DefaultBasePriceUsed { .. }
                    | PricingNote::DefaultVehicleClassUsed
            )
        })
    }
}

pub trait QuotationEngine: Send + Sync {
    fn compile(&self, inputs: &PricingInputs, config: &PricingConfig) -> PricingOutcome;

    fn reconcile(
        &self,
        existing: &PriceBreakdown,
        services: &[SelectedService],
        catalog: &[ServiceCatalogItem],
    ) -> PricingOutcome;
}

#[derive(Default)]
pub struct DeterministicQuotationEngine;

impl QuotationEngine for DeterministicQuotationEngine {
    fn compile(&self, inputs: &PricingInputs, config: &PricingConfig) -> PricingOutcome {
        compiler::compile_breakdown(inputs, config)
    }

    fn reconcile(
        &self,
        existing: &PriceBreakdown,
        services: &[SelectedService],
        catalog: &[ServiceCatalogItem],
    ) -> PricingOutcome {
        reconcile::reconcile_breakdown(existing, services, catalog)
    }
}
