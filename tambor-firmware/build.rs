//! Build script for tambor-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates washer.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tambor_core::config::{parse_config, WasherConfig};

fn main() {
    setup_linker();
    validate_config();
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

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    if env::var_os("CARGO_FEATURE_DEFMT").is_some() {
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate washer.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=washer.toml");

    let config_path = Path::new("washer.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: washer.toml not found!                                   ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds washer.toml as its configuration.           ║\n\
            ║  Please create one in the tambor-firmware directory.             ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read washer.toml                               ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    // Full TOML parse: syntax, field types, ranges and unknown keys
    let config: WasherConfig = match toml::from_str(&config_content) {
        Ok(config) => config,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid washer.toml                                      ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&e.to_string())
            );
        }
    };

    // The firmware reads the file with the small no_std parser at boot,
    // which only knows a subset of TOML. It must land on the same values.
    match parse_config(&config_content) {
        Ok(embedded) if embedded == config => {}
        Ok(_) => report_errors(&[String::from(
            "boot parser disagrees with the toml crate; simplify the file",
        )]),
        Err(e) => report_errors(&[format!("boot parser rejects the file: {:?}", e)]),
    }

    validate_timings(&config);

    println!("cargo:warning=washer.toml validated successfully");
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

fn report_errors(errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: Invalid washer configuration                             ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Cross-field checks the type system cannot express
fn validate_timings(config: &WasherConfig) {
    let mut errors = Vec::new();
    let cycle = &config.cycle;
    let program = &config.program;

    for (name, period) in [
        ("shake_period_ms", program.shake_period_ms),
        ("delicate_shake_period_ms", program.delicate_shake_period_ms),
    ] {
        let half = u32::from(period) / 2;
        if period == 0 {
            errors.push(format!("[program] {} must be non-zero", name));
        } else if cycle.shake_cw_pulse_ms > half || cycle.shake_ccw_pulse_ms > half {
            errors.push(format!("[program] {} too short for the shake pulses", name));
        }
    }

    if cycle.spray_pulse_ms >= cycle.spray_interval_ms {
        errors.push(String::from("[cycle] spray_pulse_ms must be below spray_interval_ms"));
    }
    if cycle.dump_ms == 0 {
        errors.push(String::from("[cycle] dump_ms must be non-zero"));
    }
    if config.panel.scan_row_ms == 0 {
        errors.push(String::from("[panel] scan_row_ms must be non-zero"));
    }
    if config.panel.blink_ms == 0 || config.panel.error_blink_ms == 0 {
        errors.push(String::from("[panel] blink periods must be non-zero"));
    }

    report_errors(&errors);
}
