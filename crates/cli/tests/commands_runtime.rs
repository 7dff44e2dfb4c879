use std::env;
use std::fs;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use towdesk_cli::commands::{migrate, quote, seed};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn with_env(vars: &[(&str, &str)], run: impl FnOnce()) {
    let lock = ENV_LOCK.get_or_init(|| Mutex::new(()));
    let _guard = lock.lock().expect("env lock");

    for (key, value) in vars {
        env::set_var(key, value);
    }
    run();
    for (key, _) in vars {
        env::remove_var(key);
    }
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be JSON")
}

#[test]
fn migrate_succeeds_against_an_in_memory_database() {
    // a single pooled connection keeps every statement on the same :memory: db
    with_env(
        &[
            ("TOWDESK_DATABASE_URL", "sqlite::memory:"),
            ("TOWDESK_DATABASE_MAX_CONNECTIONS", "1"),
        ],
        || {
            let result = migrate::run();
            assert_eq!(result.exit_code, 0, "expected successful migrate run: {}", result.output);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "migrate");
            assert_eq!(payload["status"], "ok");
        },
    );
}

#[test]
fn seed_loads_and_verifies_the_demo_catalog() {
    with_env(
        &[
            ("TOWDESK_DATABASE_URL", "sqlite::memory:"),
            ("TOWDESK_DATABASE_MAX_CONNECTIONS", "1"),
        ],
        || {
            let result = seed::run();
            assert_eq!(result.exit_code, 0, "expected successful seed run: {}", result.output);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "seed");
            assert_eq!(payload["status"], "ok");
        },
    );
}

#[test]
fn quote_prices_the_reference_job_end_to_end() {
    with_env(&[], || {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("job.toml");
        fs::write(
            &path,
            r#"
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
"#,
        )
        .expect("write job file");

        let result = quote::run(&path);
        assert_eq!(result.exit_code, 0, "expected successful quote run: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "quote");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["detail"]["final_price"]["complete"], true);
        assert_eq!(payload["detail"]["final_price"]["amount"], "524");
        assert_eq!(payload["detail"]["breakdown"]["subtotal"], "444");
    });
}

#[test]
fn quote_flags_unresolved_distance_as_incomplete_input() {
    with_env(&[], || {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("job.toml");
        fs::write(
            &path,
            r#"
[job]
tenant = "demo"
vehicle_classes = ["private"]
date = "2026-03-02"
time = "10:00"

[rates]
price_per_km = "12"
minimum_price = "250"

[rates.base_prices]
private = "180"
"#,
        )
        .expect("write job file");

        let result = quote::run(&path);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let notes = payload["detail"]["notes"].as_array().expect("notes array");
        assert!(
            notes.iter().any(|note| note["kind"] == "distance_unresolved"),
            "distance note missing from {notes:?}"
        );
    });
}

#[test]
fn quote_fails_cleanly_on_a_missing_file() {
    with_env(&[], || {
        let result = quote::run(std::path::Path::new("/nonexistent/job.toml"));
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "file_read");
    });
}
