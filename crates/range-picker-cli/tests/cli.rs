use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn rangepick() -> Command {
    Command::cargo_bin("rangepick").unwrap()
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

fn instant(value: &Value) -> chrono::DateTime<chrono::Utc> {
    value.as_str().unwrap().parse().unwrap()
}

// ── period ──────────────────────────────────────────────────────────────────

#[test]
fn test_period_seven_days() {
    let output = rangepick()
        .args(["period", "7d", "--now", "2024-01-08T00:00:00Z"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(
        instant(&json["start"]),
        "2024-01-01T00:00:00Z".parse::<chrono::DateTime<chrono::Utc>>().unwrap()
    );
    assert_eq!(
        instant(&json["end"]),
        "2024-01-08T00:00:00Z".parse::<chrono::DateTime<chrono::Utc>>().unwrap()
    );
}

#[test]
fn test_period_accepts_offset_now() {
    let output = rangepick()
        .args(["period", "15m", "--now", "2024-01-08T02:00:00+02:00"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(
        instant(&json["start"]),
        "2024-01-07T23:45:00Z".parse::<chrono::DateTime<chrono::Utc>>().unwrap()
    );
}

#[test]
fn test_period_invalid_token_fails() {
    rangepick()
        .args(["period", "7w", "--now", "2024-01-08T00:00:00Z"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid period token '7w'"));
}

#[test]
fn test_period_bad_now_is_usage_error() {
    rangepick()
        .args(["period", "7d", "--now", "yesterday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("RFC 3339"));
}

// ── clamp ───────────────────────────────────────────────────────────────────

#[test]
fn test_clamp_pulls_end_back() {
    let output = rangepick()
        .args([
            "clamp",
            "--start",
            "2024-01-02T00:00:00Z",
            "--end",
            "2024-01-08T15:00:00Z",
            "--max-days",
            "3",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(
        instant(&json["end"]),
        "2024-01-04T15:00:00Z".parse::<chrono::DateTime<chrono::Utc>>().unwrap()
    );
    assert_eq!(json["clamped"], Value::Bool(true));
    assert_eq!(json["days"], Value::from(3));
}

#[test]
fn test_clamp_within_limit_is_unchanged() {
    let output = rangepick()
        .args([
            "clamp",
            "--start",
            "2024-01-02T00:00:00Z",
            "--end",
            "2024-01-03T12:00:00Z",
            "--max-days",
            "3",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["clamped"], Value::Bool(false));
    assert_eq!(json["days"], Value::from(2));
}

#[test]
fn test_clamp_counts_days_in_local_zone() {
    // 23:30 UTC on Jan 2 is already Jan 3 at +02:00
    let output = rangepick()
        .args([
            "clamp",
            "--start",
            "2024-01-02T23:30:00Z",
            "--end",
            "2024-01-05T12:00:00Z",
            "--max-days",
            "3",
            "--mode",
            "local",
            "--zone",
            "+02:00",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["clamped"], Value::Bool(false));
    assert_eq!(json["days"], Value::from(3));
}

#[test]
fn test_clamp_rejects_unknown_zone() {
    rangepick()
        .args([
            "clamp",
            "--start",
            "2024-01-02T00:00:00Z",
            "--end",
            "2024-01-03T00:00:00Z",
            "--max-days",
            "3",
            "--zone",
            "Nowhere/Land",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nowhere/Land"));
}

// ── validate ────────────────────────────────────────────────────────────────

#[test]
fn test_validate_clear_range() {
    let output = rangepick()
        .args([
            "validate",
            "--start-date",
            "2024-01-02",
            "--start-time",
            "00:00",
            "--end-date",
            "2024-01-03",
            "--end-time",
            "23:59",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));

    let json = stdout_json(&output);
    assert!(json["start_date"].is_null());
    assert!(json["end_time"].is_null());
}

#[test]
fn test_validate_reports_format_errors() {
    let output = rangepick()
        .args([
            "validate",
            "--start-date",
            "2024-02-30",
            "--start-time",
            "00:00",
            "--end-date",
            "2024-03-01",
            "--end-time",
            "24:00",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));

    let json = stdout_json(&output);
    assert_eq!(json["start_date"], "Invalid date format (YYYY-MM-DD)");
    assert_eq!(json["end_time"], "Invalid time format (HH:MM)");
    assert!(json["start_time"].is_null());
}

#[test]
fn test_validate_blames_inactive_endpoint_for_order() {
    let args = [
        "validate",
        "--start-date",
        "2024-01-05",
        "--start-time",
        "00:00",
        "--end-date",
        "2024-01-02",
        "--end-time",
        "00:00",
    ];

    let output = rangepick().args(args).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stdout_json(&output)["end_date"], "Cannot precede start date");

    let output = rangepick()
        .args(args)
        .args(["--active", "end"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stdout_json(&output)["start_date"], "Cannot exceed end date");
}

#[test]
fn test_validate_checks_bounds() {
    rangepick()
        .args([
            "validate",
            "--start-date",
            "2023-12-31",
            "--start-time",
            "00:00",
            "--end-date",
            "2024-01-02",
            "--end-time",
            "00:00",
            "--min",
            "2024-01-01T00:00:00Z",
        ])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Cannot precede 2024-01-01"));
}

#[test]
fn test_validate_nonexistent_local_time() {
    rangepick()
        .args([
            "validate",
            "--start-date",
            "2024-03-31",
            "--start-time",
            "02:30",
            "--end-date",
            "2024-03-31",
            "--end-time",
            "04:00",
            "--mode",
            "local",
            "--zone",
            "Europe/Paris",
        ])
        .assert()
        .code(2)
        .stdout(predicate::str::contains(
            "Time does not exist in local timezone",
        ));
}
