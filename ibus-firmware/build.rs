//! Build script for ibus-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates receiver.toml and turns it into constants

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Sensors a default receiver can hold
const MAX_SENSORS: usize = 10;

fn main() {
    setup_linker();
    generate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Receiver settings pulled out of receiver.toml
struct Settings {
    telemetry: bool,
    frame_gap_ms: u32,
    reply_guard_us: u32,
    sensor_codes: Vec<u8>,
}

/// Validate receiver.toml and write `receiver_config.rs` into OUT_DIR
fn generate_config() {
    println!("cargo:rerun-if-changed=receiver.toml");

    let config_path = Path::new("receiver.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: receiver.toml not found!                                 ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a receiver.toml configuration file.       ║\n\
            ║  Please create one in the ibus-firmware directory.               ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read receiver.toml                             ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in receiver.toml                     ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    let settings = validate(&config, &mut errors);
    if !errors.is_empty() {
        report_errors("receiver.toml validation failed", &errors);
    }

    write_config(&settings);
    println!("cargo:warning=receiver.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn report_errors(title: &str, errors: &[String]) -> ! {
    let body = errors
        .iter()
        .map(|e| format_error_lines(&format!("- {}", e)))
        .collect::<Vec<_>>()
        .join("\n");
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title, body
    );
}

fn validate(config: &toml::Value, errors: &mut Vec<String>) -> Settings {
    let receiver = config.get("receiver");
    if receiver.is_none() {
        errors.push("Missing [receiver] section".to_string());
    }

    let telemetry = match receiver.and_then(|r| r.get("telemetry")) {
        None => false,
        Some(value) => value.as_bool().unwrap_or_else(|| {
            errors.push("receiver.telemetry must be true or false".to_string());
            false
        }),
    };

    let frame_gap_ms = read_u32(receiver, "frame_gap_ms", 3, errors);
    if frame_gap_ms == 0 {
        errors.push("receiver.frame_gap_ms must be at least 1".to_string());
    }
    let reply_guard_us = read_u32(receiver, "reply_guard_us", 100, errors);

    let sensor_codes = validate_sensors(config, errors);
    if !telemetry && !sensor_codes.is_empty() {
        println!("cargo:warning=sensors are configured but telemetry is disabled");
    }

    Settings {
        telemetry,
        frame_gap_ms,
        reply_guard_us,
        sensor_codes,
    }
}

fn read_u32(
    section: Option<&toml::Value>,
    key: &str,
    default: u32,
    errors: &mut Vec<String>,
) -> u32 {
    match section.and_then(|s| s.get(key)) {
        None => default,
        Some(value) => match value.as_integer().map(u32::try_from) {
            Some(Ok(v)) => v,
            _ => {
                errors.push(format!("receiver.{} must be a non-negative integer", key));
                default
            }
        },
    }
}

fn validate_sensors(config: &toml::Value, errors: &mut Vec<String>) -> Vec<u8> {
    let Some(sensors) = config.get("sensor") else {
        return Vec::new();
    };
    let Some(sensors) = sensors.as_array() else {
        errors.push("sensor must be an array of tables ([[sensor]])".to_string());
        return Vec::new();
    };

    if sensors.len() > MAX_SENSORS {
        errors.push(format!(
            "{} sensors configured, at most {} are supported",
            sensors.len(),
            MAX_SENSORS
        ));
    }

    let mut codes = Vec::new();
    for (i, sensor) in sensors.iter().enumerate() {
        let code = match sensor.get("type") {
            Some(toml::Value::String(name)) => match name.as_str() {
                "internal_voltage" => Some(0x00),
                "temperature" => Some(0x01),
                "rpm" => Some(0x02),
                "external_voltage" => Some(0x03),
                other => {
                    errors.push(format!("sensor[{}]: unknown type '{}'", i, other));
                    None
                }
            },
            Some(toml::Value::Integer(code)) => match u8::try_from(*code) {
                Ok(code) => Some(code),
                Err(_) => {
                    errors.push(format!("sensor[{}]: type code {} out of range", i, code));
                    None
                }
            },
            Some(_) => {
                errors.push(format!("sensor[{}]: type must be a name or code", i));
                None
            }
            None => {
                errors.push(format!("sensor[{}]: missing 'type'", i));
                None
            }
        };
        codes.extend(code);
    }
    codes
}

fn write_config(settings: &Settings) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let mut f = File::create(out_dir.join("receiver_config.rs")).unwrap();

    let codes = settings
        .sensor_codes
        .iter()
        .map(|c| format!("0x{:02X}", c))
        .collect::<Vec<_>>()
        .join(", ");

    writeln!(f, "// Generated from receiver.toml").unwrap();
    writeln!(f, "pub const TELEMETRY_ENABLED: bool = {};", settings.telemetry).unwrap();
    writeln!(f, "pub const FRAME_GAP_MS: u32 = {};", settings.frame_gap_ms).unwrap();
    writeln!(f, "pub const REPLY_GUARD_US: u32 = {};", settings.reply_guard_us).unwrap();
    writeln!(f, "pub const SENSOR_CODES: &[u8] = &[{}];", codes).unwrap();
}
