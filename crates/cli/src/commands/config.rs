use serde::Serialize;

use towdesk_core::config::{AppConfig, LoadOptions, LogFormat};

#[derive(Debug, Serialize)]
struct EffectiveConfig {
    database: DatabaseSection,
    routing: RoutingSection,
    pricing: PricingSection,
    logging: LoggingSection,
}

#[derive(Debug, Serialize)]
struct DatabaseSection {
    url: String,
    max_connections: u32,
    timeout_secs: u64,
}

#[derive(Debug, Serialize)]
struct RoutingSection {
    base_url: Option<String>,
    api_key: &'static str,
    timeout_secs: u64,
    debounce_ms: u64,
}

#[derive(Debug, Serialize)]
struct PricingSection {
    vat_rate: String,
    default_vehicle_class: &'static str,
    default_base_price: String,
    currency: String,
}

#[derive(Debug, Serialize)]
struct LoggingSection {
    level: String,
    format: &'static str,
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("configuration issue: {error}"),
    };

    let effective = EffectiveConfig {
        database: DatabaseSection {
            url: config.database.url.clone(),
            max_connections: config.database.max_connections,
            timeout_secs: config.database.timeout_secs,
        },
        routing: RoutingSection {
            base_url: config.routing.base_url.clone(),
            api_key: if config.routing.api_key.is_some() { "<redacted>" } else { "<unset>" },
            timeout_secs: config.routing.timeout_secs,
            debounce_ms: config.routing.debounce_ms,
        },
        pricing: PricingSection {
            vat_rate: config.pricing.vat_rate.to_string(),
            default_vehicle_class: config.pricing.default_vehicle_class.as_key(),
            default_base_price: config.pricing.default_base_price.to_string(),
            currency: config.pricing.currency.clone(),
        },
        logging: LoggingSection {
            level: config.logging.level.clone(),
            format: match config.logging.format {
                LogFormat::Compact => "compact",
                LogFormat::Pretty => "pretty",
                LogFormat::Json => "json",
            },
        },
    };

    toml::to_string_pretty(&effective)
        .unwrap_or_else(|error| format!("failed to render configuration: {error}"))
}
