pub mod config;
pub mod domain;
pub mod errors;
pub mod pricing;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, PricingConfig};
pub use domain::catalog::{
    ActiveWindow, BasePriceList, DepotLocation, LocationSurchargeRule, SelectedService,
    ServiceCatalogItem, ServiceItemId, ServicePriceType, SurchargeRuleId, TenantId,
    TimeSurchargeRule, VehicleClass,
};
pub use domain::customer::{Customer, CustomerId, CustomerPricing, PriceItem, PriceItemId};
pub use domain::job::{JobId, JobStatus, JobVehicle, TowJob};
pub use errors::{ApplicationError, DomainError};
pub use pricing::breakdown::{
    round_currency, PriceBreakdown, PriceModeKind, ServiceLine, SurchargeLine,
};
pub use pricing::compiler::{compile_breakdown, compute_recommended_price};
pub use pricing::reconcile::reconcile_breakdown;
pub use pricing::strategy::{
    coerce_manual_price, compute_final_price, FinalPrice, PriceMode, StrategySession,
};
pub use pricing::surcharge::resolve_active_time_surcharges;
pub use pricing::{
    DeterministicQuotationEngine, PricingInputs, PricingNote, PricingOutcome, QuotationEngine,
};
