use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime, Weekday};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use towdesk_core::config::{AppConfig, LoadOptions};
use towdesk_core::domain::catalog::{
    ActiveWindow, BasePriceList, LocationSurchargeRule, SelectedService, ServiceCatalogItem,
    ServiceItemId, ServicePriceType, SurchargeRuleId, TenantId, TimeSurchargeRule, VehicleClass,
};
use towdesk_core::domain::customer::{CustomerId, CustomerPricing, PriceItem, PriceItemId};
use towdesk_core::pricing::compiler::compile_breakdown;
use towdesk_core::pricing::strategy::{compute_final_price, PriceMode};
use towdesk_core::pricing::PricingInputs;
use towdesk_routing::{AddressPair, DistanceResolver, HttpDistanceResolver};

use crate::commands::CommandResult;

/// Prices the job described by a TOML file. All money fields are strings so
/// they parse into exact decimals. When the file omits the distance but
/// carries addresses, the configured routing service is asked for it; a
/// failed lookup leaves the distance unknown rather than aborting the quote.
pub fn run(file: &Path) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "quote",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let raw = match fs::read_to_string(file) {
        Ok(raw) => raw,
        Err(error) => {
            return CommandResult::failure(
                "quote",
                "file_read",
                format!("could not read `{}`: {error}", file.display()),
                2,
            );
        }
    };

    let quote_file: QuoteFile = match toml::from_str(&raw) {
        Ok(quote_file) => quote_file,
        Err(error) => {
            return CommandResult::failure(
                "quote",
                "file_parse",
                format!("could not parse `{}`: {error}", file.display()),
                2,
            );
        }
    };

    let parsed = match quote_file.into_engine_inputs() {
        Ok(parsed) => parsed,
        Err(message) => {
            return CommandResult::failure("quote", "file_validation", message, 2);
        }
    };
    let ParsedJob { mut inputs, mode, general_items, addresses } = parsed;

    if inputs.distance_km.is_none() {
        inputs.distance_km = resolve_distance(&config, addresses.as_ref());
    }

    let outcome = compile_breakdown(&inputs, &config.pricing);
    let final_price = compute_final_price(
        &mode,
        Some(&outcome.breakdown),
        &general_items,
        inputs.customer.as_ref(),
    );

    let detail = serde_json::json!({
        "breakdown": outcome.breakdown,
        "notes": outcome.notes,
        "final_price": final_price,
        "currency": config.pricing.currency,
    });

    let message = if final_price.complete {
        format!("final price {} {}", final_price.amount, config.pricing.currency)
    } else {
        "quote is incomplete; see notes and selection state".to_string()
    };

    CommandResult::success_with_detail("quote", message, Some(detail))
}

/// Ask the configured routing service for the missing distance. Any failure
/// leaves the distance unknown; the breakdown then carries the unresolved
/// note and the final price is not distance-priced.
fn resolve_distance(config: &AppConfig, addresses: Option<&AddressPair>) -> Option<Decimal> {
    let base_url = config.routing.base_url.as_ref()?;
    let request = addresses?;

    let resolver = HttpDistanceResolver::new(
        base_url.clone(),
        config.routing.api_key.clone(),
        config.routing.timeout_secs,
    )
    .ok()?;

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().ok()?;
    match runtime.block_on(resolver.resolve(request)) {
        Ok(resolved) => Some(resolved.distance_km),
        Err(error) => {
            tracing::warn!(
                pickup = request.from.as_str(),
                dropoff = request.to.as_str(),
                "distance lookup failed, pricing without distance: {error}"
            );
            None
        }
    }
}

#[derive(Debug)]
struct ParsedJob {
    inputs: PricingInputs,
    mode: PriceMode,
    general_items: Vec<PriceItem>,
    addresses: Option<AddressPair>,
}

#[derive(Debug, Deserialize)]
struct QuoteFile {
    job: JobSection,
    rates: Option<RatesSection>,
    #[serde(default)]
    time_rules: Vec<TimeRuleSection>,
    #[serde(default)]
    location_rules: Vec<LocationRuleSection>,
    #[serde(default)]
    services: Vec<ServiceSelectionSection>,
    #[serde(default)]
    catalog: Vec<CatalogItemSection>,
    #[serde(default)]
    price_items: Vec<PriceItemSection>,
    customer: Option<CustomerSection>,
    price: Option<PriceSection>,
}

#[derive(Debug, Deserialize)]
struct JobSection {
    tenant: String,
    vehicle_classes: Vec<String>,
    distance_km: Option<String>,
    pickup_address: Option<String>,
    dropoff_address: Option<String>,
    date: String,
    time: String,
    #[serde(default)]
    is_holiday: bool,
}

#[derive(Debug, Deserialize)]
struct RatesSection {
    price_per_km: String,
    minimum_price: String,
    #[serde(default)]
    base_prices: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct TimeRuleSection {
    id: String,
    label: String,
    days: Vec<String>,
    start: String,
    end: String,
    #[serde(default)]
    on_holidays: bool,
    percent: String,
}

#[derive(Debug, Deserialize)]
struct LocationRuleSection {
    id: String,
    label: String,
    percent: String,
}

#[derive(Debug, Deserialize)]
struct ServiceSelectionSection {
    item: String,
    quantity: Option<u32>,
    manual_price: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogItemSection {
    id: String,
    label: String,
    price_type: String,
    #[serde(default)]
    unit_price: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PriceItemSection {
    id: String,
    label: String,
    price: String,
}

#[derive(Debug, Deserialize)]
struct CustomerSection {
    id: Option<String>,
    discount_percent: Option<String>,
    #[serde(default)]
    fixed_price_items: Vec<PriceItemSection>,
}

#[derive(Debug, Deserialize)]
struct PriceSection {
    mode: String,
    item: Option<String>,
    amount: Option<String>,
}

impl QuoteFile {
    fn into_engine_inputs(self) -> Result<ParsedJob, String> {
        let vehicle_classes = self
            .job
            .vehicle_classes
            .iter()
            .map(|raw| VehicleClass::from_str(raw))
            .collect::<Result<Vec<_>, _>>()?;

        let distance_km = self
            .job
            .distance_km
            .as_deref()
            .map(|raw| parse_decimal("job.distance_km", raw))
            .transpose()?;

        let date = NaiveDate::parse_from_str(&self.job.date, "%Y-%m-%d")
            .map_err(|error| format!("invalid job.date `{}`: {error}", self.job.date))?;
        let time = parse_time("job.time", &self.job.time)?;

        let tenant_id = TenantId(self.job.tenant.clone());
        let rates = self
            .rates
            .map(|section| section.into_price_list(tenant_id.clone()))
            .transpose()?;

        let time_rules = self
            .time_rules
            .into_iter()
            .map(TimeRuleSection::into_rule)
            .collect::<Result<Vec<_>, _>>()?;

        let selected_locations = self
            .location_rules
            .into_iter()
            .map(|section| {
                Ok(LocationSurchargeRule {
                    id: SurchargeRuleId(section.id),
                    label: section.label,
                    percent: parse_decimal("location_rules.percent", &section.percent)?,
                })
            })
            .collect::<Result<Vec<_>, String>>()?;

        let services = self
            .services
            .into_iter()
            .map(|section| {
                Ok(SelectedService {
                    item_id: ServiceItemId(section.item),
                    quantity: section.quantity,
                    manual_price: section
                        .manual_price
                        .as_deref()
                        .map(|raw| parse_decimal("services.manual_price", raw))
                        .transpose()?,
                })
            })
            .collect::<Result<Vec<_>, String>>()?;

        let service_catalog = self
            .catalog
            .into_iter()
            .map(CatalogItemSection::into_item)
            .collect::<Result<Vec<_>, _>>()?;

        let general_items = self
            .price_items
            .into_iter()
            .map(PriceItemSection::into_item)
            .collect::<Result<Vec<_>, _>>()?;

        let customer = self.customer.map(CustomerSection::into_pricing).transpose()?;

        let mode = match self.price {
            Some(section) => section.into_mode()?,
            None => PriceMode::Recommended,
        };

        let addresses = match (&self.job.pickup_address, &self.job.dropoff_address) {
            (Some(pickup), Some(dropoff)) => {
                Some(AddressPair::new(pickup.as_str(), dropoff.as_str()))
            }
            _ => None,
        };

        let inputs = PricingInputs {
            vehicle_classes,
            distance_km,
            date,
            time,
            is_holiday: self.job.is_holiday,
            rates,
            time_rules,
            selected_locations,
            services,
            service_catalog,
            customer,
        };

        Ok(ParsedJob { inputs, mode, general_items, addresses })
    }
}

impl RatesSection {
    fn into_price_list(self, tenant_id: TenantId) -> Result<BasePriceList, String> {
        let mut base_prices = BTreeMap::new();
        for (class_raw, amount_raw) in &self.base_prices {
            let class = VehicleClass::from_str(class_raw)?;
            base_prices.insert(class, parse_decimal("rates.base_prices", amount_raw)?);
        }

        Ok(BasePriceList {
            tenant_id,
            base_prices,
            price_per_km: parse_decimal("rates.price_per_km", &self.price_per_km)?,
            minimum_price: parse_decimal("rates.minimum_price", &self.minimum_price)?,
            depot: None,
        })
    }
}

impl TimeRuleSection {
    fn into_rule(self) -> Result<TimeSurchargeRule, String> {
        let days = self
            .days
            .iter()
            .map(|raw| parse_weekday(raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TimeSurchargeRule {
            id: SurchargeRuleId(self.id),
            label: self.label,
            window: ActiveWindow {
                days,
                start: parse_time("time_rules.start", &self.start)?,
                end: parse_time("time_rules.end", &self.end)?,
                on_holidays: self.on_holidays,
            },
            percent: parse_decimal("time_rules.percent", &self.percent)?,
        })
    }
}

impl CatalogItemSection {
    fn into_item(self) -> Result<ServiceCatalogItem, String> {
        let price_type = match self.price_type.as_str() {
            "flat" => ServicePriceType::Flat,
            "per_unit" => ServicePriceType::PerUnit,
            "manual" => ServicePriceType::Manual,
            other => {
                return Err(format!(
                    "invalid catalog.price_type `{other}` (expected flat|per_unit|manual)"
                ))
            }
        };

        let unit_price = self
            .unit_price
            .as_deref()
            .map(|raw| parse_decimal("catalog.unit_price", raw))
            .transpose()?
            .unwrap_or(Decimal::ZERO);

        Ok(ServiceCatalogItem { id: ServiceItemId(self.id), label: self.label, price_type, unit_price })
    }
}

impl PriceItemSection {
    fn into_item(self) -> Result<PriceItem, String> {
        Ok(PriceItem {
            id: PriceItemId(self.id),
            label: self.label,
            price: parse_decimal("price_items.price", &self.price)?,
        })
    }
}

impl CustomerSection {
    fn into_pricing(self) -> Result<CustomerPricing, String> {
        let customer_id = match self.id.as_deref() {
            Some(raw) => Uuid::parse_str(raw)
                .map_err(|error| format!("invalid customer.id `{raw}`: {error}"))?,
            None => Uuid::nil(),
        };

        let discount_percent = self
            .discount_percent
            .as_deref()
            .map(|raw| parse_decimal("customer.discount_percent", raw))
            .transpose()?
            .unwrap_or(Decimal::ZERO);

        let fixed_price_items = self
            .fixed_price_items
            .into_iter()
            .map(PriceItemSection::into_item)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CustomerPricing {
            customer_id: CustomerId(customer_id),
            discount_percent,
            fixed_price_items,
        })
    }
}

impl PriceSection {
    fn into_mode(self) -> Result<PriceMode, String> {
        let item = self.item.map(PriceItemId);
        let amount = self
            .amount
            .as_deref()
            .map(|raw| parse_decimal("price.amount", raw))
            .transpose()?;

        match self.mode.as_str() {
            "recommended" => Ok(PriceMode::Recommended),
            "fixed" => Ok(PriceMode::Fixed { item }),
            "customer" => Ok(PriceMode::Customer { item }),
            "custom" => Ok(PriceMode::Custom { amount }),
            other => Err(format!(
                "invalid price.mode `{other}` (expected recommended|fixed|customer|custom)"
            )),
        }
    }
}

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw.trim()).map_err(|error| format!("invalid {field} `{raw}`: {error}"))
}

fn parse_time(field: &str, raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|error| format!("invalid {field} `{raw}`: {error}"))
}

fn parse_weekday(raw: &str) -> Result<Weekday, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "mon" => Ok(Weekday::Mon),
        "tue" => Ok(Weekday::Tue),
        "wed" => Ok(Weekday::Wed),
        "thu" => Ok(Weekday::Thu),
        "fri" => Ok(Weekday::Fri),
        "sat" => Ok(Weekday::Sat),
        "sun" => Ok(Weekday::Sun),
        other => Err(format!("invalid weekday `{other}` (expected mon..sun)")),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use towdesk_core::pricing::strategy::PriceMode;

    use super::QuoteFile;

    const REFERENCE_JOB: &str = r#"
[job]
tenant = "demo"
vehicle_classes = ["private"]
distance_km = "22"
date = "2026-03-02"
time = "10:00"

[rates]
price_per_km = "12"
minimum_price = "250"

[rates.base_prices]
private = "180"
"#;

    #[test]
    fn parses_the_reference_job_file() {
        let quote_file: QuoteFile = toml::from_str(REFERENCE_JOB).expect("parse");
        let parsed = quote_file.into_engine_inputs().expect("convert");

        assert_eq!(parsed.inputs.distance_km, Some(Decimal::new(22, 0)));
        assert_eq!(parsed.mode, PriceMode::Recommended);
        assert!(parsed.general_items.is_empty());
        assert!(parsed.inputs.rates.is_some());
        assert!(parsed.addresses.is_none());
    }

    #[test]
    fn rejects_malformed_money_fields() {
        let broken = REFERENCE_JOB.replace("distance_km = \"22\"", "distance_km = \"soon\"");
        let quote_file: QuoteFile = toml::from_str(&broken).expect("parse");

        let error = quote_file.into_engine_inputs().expect_err("conversion should fail");
        assert!(error.contains("job.distance_km"));
    }

    #[test]
    fn parses_an_explicit_custom_mode() {
        let with_mode = format!("{REFERENCE_JOB}\n[price]\nmode = \"custom\"\namount = \"410\"\n");
        let quote_file: QuoteFile = toml::from_str(&with_mode).expect("parse");
        let parsed = quote_file.into_engine_inputs().expect("convert");

        assert_eq!(parsed.mode, PriceMode::Custom { amount: Some(Decimal::new(410, 0)) });
    }
}
