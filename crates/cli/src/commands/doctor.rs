use serde::Serialize;

use towdesk_core::config::{AppConfig, LoadOptions};
use towdesk_db::{connect_with_settings, ping};

#[derive(Debug, Serialize)]
struct DoctorReport {
    checks: Vec<DoctorCheck>,
    healthy: bool,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    passed: bool,
    detail: String,
}

pub fn run(json: bool) -> String {
    let mut checks = Vec::new();

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config",
                passed: true,
                detail: "configuration loads and validates".to_string(),
            });
            Some(config)
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config",
                passed: false,
                detail: format!("configuration issue: {error}"),
            });
            None
        }
    };

    if let Some(config) = &config {
        checks.push(database_check(config));
        checks.push(DoctorCheck {
            name: "routing",
            passed: true,
            detail: match &config.routing.base_url {
                Some(base_url) => format!("distance resolver configured at {base_url}"),
                None => "distance resolver disabled; jobs price with unknown distance".to_string(),
            },
        });
    }

    let healthy = checks.iter().all(|check| check.passed);
    let report = DoctorReport { checks, healthy };

    if json {
        return serde_json::to_string_pretty(&report)
            .unwrap_or_else(|error| format!("failed to render report: {error}"));
    }

    let mut lines = Vec::with_capacity(report.checks.len() + 1);
    for check in &report.checks {
        let marker = if check.passed { "ok" } else { "FAIL" };
        lines.push(format!("[{marker}] {}: {}", check.name, check.detail));
    }
    lines.push(if report.healthy {
        "doctor: all checks passed".to_string()
    } else {
        "doctor: some checks failed".to_string()
    });
    lines.join("\n")
}

fn database_check(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "database",
                passed: false,
                detail: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let outcome = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| error.to_string())?;
        ping(&pool).await.map_err(|error| error.to_string())?;
        pool.close().await;
        Ok::<(), String>(())
    });

    match outcome {
        Ok(()) => DoctorCheck {
            name: "database",
            passed: true,
            detail: format!("connected to {}", config.database.url),
        },
        Err(error) => DoctorCheck {
            name: "database",
            passed: false,
            detail: format!("database connectivity failed: {error}"),
        },
    }
}
