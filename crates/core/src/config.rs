use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::catalog::VehicleClass;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub routing: RoutingConfig,
    pub pricing: PricingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

/// Distance-resolver client settings. `base_url` unset disables the HTTP
/// resolver; callers then price with an unknown distance.
#[derive(Clone, Debug)]
pub struct RoutingConfig {
    pub base_url: Option<String>,
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
    /// Quiet period after an address edit before a distance request fires.
    pub debounce_ms: u64,
}

/// Engine parameters that are policy, not catalog data. The VAT rate lives
/// here so no call site ever hardcodes one.
#[derive(Clone, Debug)]
pub struct PricingConfig {
    pub vat_rate: Decimal,
    pub default_vehicle_class: VehicleClass,
    pub default_base_price: Decimal,
    pub currency: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid value for `{key}`: `{value}`")]
    InvalidValue { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://towdesk.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            routing: RoutingConfig {
                base_url: None,
                api_key: None,
                timeout_secs: 10,
                debounce_ms: 400,
            },
            pricing: PricingConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            vat_rate: Decimal::new(18, 2),
            default_vehicle_class: VehicleClass::Private,
            default_base_price: Decimal::new(150, 0),
            currency: "ILS".to_string(),
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("towdesk.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(routing) = patch.routing {
            if let Some(base_url) = routing.base_url {
                self.routing.base_url = Some(base_url);
            }
            if let Some(api_key) = routing.api_key {
                self.routing.api_key = Some(api_key.into());
            }
            if let Some(timeout_secs) = routing.timeout_secs {
                self.routing.timeout_secs = timeout_secs;
            }
            if let Some(debounce_ms) = routing.debounce_ms {
                self.routing.debounce_ms = debounce_ms;
            }
        }

        if let Some(pricing) = patch.pricing {
            if let Some(vat_rate) = pricing.vat_rate {
                self.pricing.vat_rate = parse_decimal("pricing.vat_rate", &vat_rate)?;
            }
            if let Some(class) = pricing.default_vehicle_class {
                self.pricing.default_vehicle_class = parse_vehicle_class(
                    "pricing.default_vehicle_class",
                    &class,
                )?;
            }
            if let Some(amount) = pricing.default_base_price {
                self.pricing.default_base_price =
                    parse_decimal("pricing.default_base_price", &amount)?;
            }
            if let Some(currency) = pricing.currency {
                self.pricing.currency = currency;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("TOWDESK_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("TOWDESK_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("TOWDESK_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("TOWDESK_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("TOWDESK_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("TOWDESK_ROUTING_BASE_URL") {
            self.routing.base_url = Some(value);
        }
        if let Some(value) = read_env("TOWDESK_ROUTING_API_KEY") {
            self.routing.api_key = Some(value.into());
        }
        if let Some(value) = read_env("TOWDESK_ROUTING_TIMEOUT_SECS") {
            self.routing.timeout_secs = parse_u64("TOWDESK_ROUTING_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("TOWDESK_ROUTING_DEBOUNCE_MS") {
            self.routing.debounce_ms = parse_u64("TOWDESK_ROUTING_DEBOUNCE_MS", &value)?;
        }

        if let Some(value) = read_env("TOWDESK_PRICING_VAT_RATE") {
            self.pricing.vat_rate = parse_decimal("TOWDESK_PRICING_VAT_RATE", &value)?;
        }
        if let Some(value) = read_env("TOWDESK_PRICING_DEFAULT_VEHICLE_CLASS") {
            self.pricing.default_vehicle_class =
                parse_vehicle_class("TOWDESK_PRICING_DEFAULT_VEHICLE_CLASS", &value)?;
        }
        if let Some(value) = read_env("TOWDESK_PRICING_DEFAULT_BASE_PRICE") {
            self.pricing.default_base_price =
                parse_decimal("TOWDESK_PRICING_DEFAULT_BASE_PRICE", &value)?;
        }
        if let Some(value) = read_env("TOWDESK_PRICING_CURRENCY") {
            self.pricing.currency = value;
        }

        let log_level =
            read_env("TOWDESK_LOGGING_LEVEL").or_else(|| read_env("TOWDESK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("TOWDESK_LOGGING_FORMAT").or_else(|| read_env("TOWDESK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_routing(&self.routing)?;
        validate_pricing(&self.pricing)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("towdesk.toml"), PathBuf::from("config/towdesk.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_routing(routing: &RoutingConfig) -> Result<(), ConfigError> {
    if let Some(base_url) = &routing.base_url {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "routing.base_url must start with http:// or https://".to_string(),
            ));
        }
    }

    if routing.timeout_secs == 0 || routing.timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "routing.timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    // quiet period for address edits; values far outside the 300-500ms band
    // either spam the routing service or feel broken in the form
    if routing.debounce_ms < 100 || routing.debounce_ms > 5_000 {
        return Err(ConfigError::Validation(
            "routing.debounce_ms must be in range 100..=5000".to_string(),
        ));
    }

    Ok(())
}

fn validate_pricing(pricing: &PricingConfig) -> Result<(), ConfigError> {
    if pricing.vat_rate < Decimal::ZERO || pricing.vat_rate > Decimal::ONE {
        return Err(ConfigError::Validation(
            "pricing.vat_rate must be a fraction in range 0..=1 (e.g. `0.18`)".to_string(),
        ));
    }

    if pricing.default_base_price < Decimal::ZERO {
        return Err(ConfigError::Validation(
            "pricing.default_base_price must not be negative".to_string(),
        ));
    }

    if pricing.currency.trim().is_empty() {
        return Err(ConfigError::Validation("pricing.currency must not be empty".to_string()));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_decimal(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    Decimal::from_str(value.trim()).map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_vehicle_class(key: &str, value: &str) -> Result<VehicleClass, ConfigError> {
    value.parse::<VehicleClass>().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    routing: Option<RoutingPatch>,
    pricing: Option<PricingPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RoutingPatch {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
    debounce_ms: Option<u64>,
}

// money fields arrive as strings so they parse into exact decimals
#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    vat_rate: Option<String>,
    default_vehicle_class: Option<String>,
    default_base_price: Option<String>,
    currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use rust_decimal::Decimal;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_validate_and_carry_the_standard_vat_rate() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.pricing.vat_rate == Decimal::new(18, 2), "default vat rate should be 0.18")?;
        ensure(config.routing.debounce_ms == 400, "default debounce should be 400ms")?;
        ensure(config.routing.base_url.is_none(), "routing should default to disabled")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_ROUTING_API_KEY", "rk-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("towdesk.toml");
            fs::write(
                &path,
                r#"
[routing]
base_url = "https://routes.example.test"
api_key = "${TEST_ROUTING_API_KEY}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            let api_key = config
                .routing
                .api_key
                .as_ref()
                .ok_or_else(|| "api key should be set".to_string())?;
            ensure(
                api_key.expose_secret() == "rk-from-env",
                "api key should be loaded from environment",
            )
        })();

        clear_vars(&["TEST_ROUTING_API_KEY"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TOWDESK_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("TOWDESK_PRICING_VAT_RATE", "0.17");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("towdesk.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[pricing]
vat_rate = "0.20"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.pricing.vat_rate == Decimal::new(17, 2),
                "env vat rate should win over the file value",
            )
        })();

        clear_vars(&["TOWDESK_DATABASE_URL", "TOWDESK_PRICING_VAT_RATE"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TOWDESK_LOG_LEVEL", "warn");
        env::set_var("TOWDESK_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warn log level should come from the alias")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty log format should come from the alias",
            )
        })();

        clear_vars(&["TOWDESK_LOG_LEVEL", "TOWDESK_LOG_FORMAT"]);
        result
    }

    #[test]
    fn out_of_range_vat_rate_fails_validation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TOWDESK_PRICING_VAT_RATE", "18");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let mentions_field = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("pricing.vat_rate")
            );
            ensure(mentions_field, "validation failure should mention pricing.vat_rate")
        })();

        clear_vars(&["TOWDESK_PRICING_VAT_RATE"]);
        result
    }

    #[test]
    fn bad_numeric_env_override_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TOWDESK_ROUTING_DEBOUNCE_MS", "soon");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected invalid-value failure".to_string()),
                Err(error) => error,
            };
            ensure(
                matches!(error, ConfigError::InvalidValue { ref key, .. } if key == "TOWDESK_ROUTING_DEBOUNCE_MS"),
                "error should name the offending variable",
            )
        })();

        clear_vars(&["TOWDESK_ROUTING_DEBOUNCE_MS"]);
        result
    }

    #[test]
    fn api_key_is_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TOWDESK_ROUTING_BASE_URL", "https://routes.example.test");
        env::set_var("TOWDESK_ROUTING_API_KEY", "rk-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("rk-secret-value"), "debug output should not contain api key")
        })();

        clear_vars(&["TOWDESK_ROUTING_BASE_URL", "TOWDESK_ROUTING_API_KEY"]);
        result
    }
}
