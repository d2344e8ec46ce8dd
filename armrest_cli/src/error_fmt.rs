//! Human-readable error descriptions, exit codes, and JSON error formatting.

use armrest_core::error::{ArmrestError, BuildError};

pub const EXIT_GENERIC: i32 = 1;
pub const EXIT_CONFIG: i32 = 3;
pub const EXIT_SENSOR: i32 = 4;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingFrontEnd => {
                "What happened: No analog front end was provided to the pipeline.\nLikely causes: The ADC failed to initialize or was not wired into the builder.\nHow to fix: Ensure the front end is created successfully and passed via with_front_end(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/armrest_config.toml for a sample."
            ),
        };
    }

    if let Some(ae) = err.downcast_ref::<ArmrestError>() {
        return match ae {
            ArmrestError::Config(msg) => format!(
                "What happened: Configuration is invalid ({msg}).\nLikely causes: Malformed TOML or out-of-range values.\nHow to fix: Edit the config file and try again."
            ),
            ArmrestError::Sensor(_) | ArmrestError::SensorFault(_) => format!(
                "What happened: The ADC could not be read ({ae}).\nLikely causes: SPI disabled, wrong [pins] bus/chip-select, or missing power/ground on the MCP3208.\nHow to fix: Enable SPI, check the wiring and [pins], then rerun `armrest self-check`.\nContext: {err:#}"
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("sensitivity csv must have headers") {
        return "Invalid headers in sensitivity CSV. Expected 'channel,raw_units'.".to_string();
    }
    if lower.contains("sensitivity table") || lower.contains("duplicate row") {
        return format!(
            "What happened: The sensitivity table is incomplete ({msg}).\nHow to fix: Provide exactly one positive raw_units row for each of left, right and vtc."
        );
    }

    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 3 for configuration problems, 4 for sensor faults, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return EXIT_CONFIG;
    }
    match err.downcast_ref::<ArmrestError>() {
        Some(ArmrestError::Config(_)) => EXIT_CONFIG,
        Some(ArmrestError::Sensor(_) | ArmrestError::SensorFault(_)) => EXIT_SENSOR,
        _ => EXIT_GENERIC,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "InvalidConfig";
    }
    match err.downcast_ref::<ArmrestError>() {
        Some(ArmrestError::Config(_)) => "InvalidConfig",
        Some(ArmrestError::Sensor(_)) => "Sensor",
        Some(ArmrestError::SensorFault(_)) => "SensorFault",
        Some(ArmrestError::State(_)) => "State",
        Some(ArmrestError::Record(_)) => "Record",
        Some(ArmrestError::Io(_)) => "Io",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;
    json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_errors_are_config_exit_codes() {
        let e = eyre::Report::new(BuildError::InvalidConfig("ema_alpha must be in (0, 1)"));
        assert_eq!(exit_code_for_error(&e), EXIT_CONFIG);
        assert!(humanize(&e).contains("ema_alpha"));
    }

    #[test]
    fn wrapped_sensor_faults_keep_their_exit_code() {
        use eyre::WrapErr;
        let e: eyre::Result<()> =
            Err(eyre::Report::new(ArmrestError::SensorFault("spi error: busy".into())));
        let e = e.wrap_err("startup zeroing").unwrap_err();
        assert_eq!(exit_code_for_error(&e), EXIT_SENSOR);
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&e)).unwrap();
        assert_eq!(v["reason"], "SensorFault");
        assert_eq!(v["exit_code"], 4);
    }

    #[test]
    fn untyped_errors_fall_back_to_generic() {
        let e = eyre::eyre!("something odd");
        assert_eq!(exit_code_for_error(&e), EXIT_GENERIC);
        assert!(humanize(&e).contains("something odd"));
    }
}
