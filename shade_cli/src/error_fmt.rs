//! Human-readable error descriptions and structured JSON error formatting.

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use shade_core::error::{BuildError, ShadeError};

    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingEncoder => {
                "What happened: No encoder was provided to the controller.\nLikely causes: The encoder driver failed to initialize or was not wired into the builder.\nHow to fix: Check [pins] encoder_a/encoder_b and pass the encoder via with_encoder(...).".to_string()
            }
            BuildError::MissingMotor => {
                "What happened: No motor was provided to the controller.\nLikely causes: Motor driver failed to initialize or was not wired into the builder.\nHow to fix: Ensure the motor is created successfully and passed via with_motor(...).".to_string()
            }
            BuildError::MissingMotionSensor => {
                "What happened: No motion sensor was provided to the controller.\nLikely causes: The PIR input failed to initialize.\nHow to fix: Check [pins] pir and pass the sensor via with_motion_sensor(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/shade.toml for a sample."
            ),
        };
    }

    if let Some(se) = err.downcast_ref::<ShadeError>() {
        return match se {
            ShadeError::Hardware(_) | ShadeError::HardwareFault(_) | ShadeError::Io(_) => format!(
                "What happened: {se}.\nLikely causes: Motor driver or light not powered, or GPIO access denied.\nHow to fix: Check wiring and permissions, then re-run with --log-level=debug."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("read config") {
        return format!(
            "What happened: The config file could not be read ({msg}).\nLikely causes: Wrong --config path.\nHow to fix: Pass --config <FILE> or create etc/shade.toml."
        );
    }

    if lower.contains("parse config") || lower.contains("must be") {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nLikely causes: A typo in a key or an out-of-range value.\nHow to fix: Edit the TOML config and try again."
        );
    }

    if lower.contains("script") {
        return format!(
            "What happened: The command script could not be used ({msg}).\nLikely causes: A line not of the form `<at_ms> <topic> [payload]`.\nHow to fix: Fix the script line named above."
        );
    }

    if lower.contains("open gpio") {
        return "What happened: Failed to initialize hardware pins.\nLikely causes: Incorrect pin numbers or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values in the config; ensure the process has permission to access GPIO.".to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: config problems are 2, hardware faults 3, the rest 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    use shade_core::error::{BuildError, ShadeError};
    if err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    match err.downcast_ref::<ShadeError>() {
        Some(ShadeError::Config(_)) => 2,
        Some(ShadeError::Hardware(_) | ShadeError::HardwareFault(_) | ShadeError::Io(_)) => 3,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;
    use shade_core::error::ShadeError;

    let reason = match err.downcast_ref::<ShadeError>() {
        Some(ShadeError::Hardware(_) | ShadeError::HardwareFault(_)) => "Hardware",
        Some(ShadeError::Io(_)) => "Io",
        Some(ShadeError::Config(_)) => "Config",
        _ if err.downcast_ref::<shade_core::error::BuildError>().is_some() => "Build",
        _ => "Error",
    };
    json!({ "reason": reason, "message": humanize(err) }).to_string()
}
