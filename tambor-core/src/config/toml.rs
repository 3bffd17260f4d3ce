//! Minimal TOML reader for the washer configuration
//!
//! Handles only the subset `washer.toml` uses. It does NOT support the
//! full TOML language.
//!
//! Supported:
//! - `[cycle]`, `[program]`, `[panel]` and `[io]` section headers
//! - `key = integer` pairs (underscores allowed as digit separators)
//! - Comments (# ...), including trailing ones
//!
//! Keys that are not present keep their default value.

use super::types::WasherConfig;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection { line: usize },
    /// Key not known in the current section
    UnknownKey { line: usize },
    /// Value is not an integer or does not fit the field
    InvalidValue { line: usize },
    /// Line is neither a header, a comment nor `key = value`
    Malformed { line: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Cycle,
    Program,
    Panel,
    Io,
}

/// Parse TOML text into a [`WasherConfig`]
pub fn parse_config(input: &str) -> Result<WasherConfig, ParseError> {
    let mut config = WasherConfig::default();
    let mut section = Section::Root;

    for (index, raw) in input.lines().enumerate() {
        let line_no = index + 1;
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') {
            if !line.ends_with(']') {
                return Err(ParseError::InvalidSection { line: line_no });
            }
            section = parse_section_header(&line[1..line.len() - 1])
                .ok_or(ParseError::InvalidSection { line: line_no })?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::Malformed { line: line_no })?;
        apply_value(&mut config, section, key, value, line_no)?;
    }

    Ok(config)
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn parse_section_header(header: &str) -> Option<Section> {
    match header.trim() {
        "cycle" => Some(Section::Cycle),
        "program" => Some(Section::Program),
        "panel" => Some(Section::Panel),
        "io" => Some(Section::Io),
        _ => None,
    }
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = value.trim();
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

/// Parse an integer, accepting `_` separators like `360_000`
fn parse_int<T: TryFrom<u64>>(value: &str, line: usize) -> Result<T, ParseError> {
    let err = ParseError::InvalidValue { line };
    if value.starts_with('_') || value.ends_with('_') {
        return Err(err);
    }
    let mut acc: u64 = 0;
    let mut digits = 0;
    for c in value.chars() {
        if c == '_' {
            continue;
        }
        let digit = c.to_digit(10).ok_or(err)?;
        acc = acc
            .checked_mul(10)
            .and_then(|v| v.checked_add(u64::from(digit)))
            .ok_or(err)?;
        digits += 1;
    }
    if digits == 0 {
        return Err(err);
    }
    T::try_from(acc).map_err(|_| err)
}

fn apply_value(
    config: &mut WasherConfig,
    section: Section,
    key: &str,
    value: &str,
    line: usize,
) -> Result<(), ParseError> {
    let unknown = ParseError::UnknownKey { line };
    match section {
        Section::Root => return Err(unknown),
        Section::Cycle => {
            let c = &mut config.cycle;
            match key {
                "dump_ms" => c.dump_ms = parse_int(value, line)?,
                "shake_cw_pulse_ms" => c.shake_cw_pulse_ms = parse_int(value, line)?,
                "shake_ccw_pulse_ms" => c.shake_ccw_pulse_ms = parse_int(value, line)?,
                "rinse_spin_s" => c.rinse_spin_s = parse_int(value, line)?,
                "spin_soak_ms" => c.spin_soak_ms = parse_int(value, line)?,
                "spray_interval_ms" => c.spray_interval_ms = parse_int(value, line)?,
                "spray_pulse_ms" => c.spray_pulse_ms = parse_int(value, line)?,
                _ => return Err(unknown),
            }
        }
        Section::Program => {
            let p = &mut config.program;
            match key {
                "prewash_s" => p.prewash_s = parse_int(value, line)?,
                "prewash_break_s" => p.prewash_break_s = parse_int(value, line)?,
                "break_short_s" => p.break_short_s = parse_int(value, line)?,
                "break_long_s" => p.break_long_s = parse_int(value, line)?,
                "wash_s" => p.wash_s = parse_int(value, line)?,
                "centrifuge_s" => p.centrifuge_s = parse_int(value, line)?,
                "shake_period_ms" => p.shake_period_ms = parse_int(value, line)?,
                "delicate_shake_period_ms" => p.delicate_shake_period_ms = parse_int(value, line)?,
                _ => return Err(unknown),
            }
        }
        Section::Panel => {
            let p = &mut config.panel;
            match key {
                "blink_ms" => p.blink_ms = parse_int(value, line)?,
                "self_test_ms" => p.self_test_ms = parse_int(value, line)?,
                "error_blink_ms" => p.error_blink_ms = parse_int(value, line)?,
                "scan_row_ms" => p.scan_row_ms = parse_int(value, line)?,
                _ => return Err(unknown),
            }
        }
        Section::Io => {
            let io = &mut config.io;
            match key {
                "switch_read_timeout_ms" => io.switch_read_timeout_ms = parse_int(value, line)?,
                "actuator_timeout_ms" => io.actuator_timeout_ms = parse_int(value, line)?,
                "panel_timeout_ms" => io.panel_timeout_ms = parse_int(value, line)?,
                _ => return Err(unknown),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_gives_defaults() {
        assert_eq!(parse_config("").unwrap(), WasherConfig::default());
        assert_eq!(
            parse_config("# nothing here\n\n").unwrap(),
            WasherConfig::default()
        );
    }

    #[test]
    fn test_overrides() {
        let input = "\
[cycle]
dump_ms = 120_000   # two minutes
rinse_spin_s = 60

[program]
break_long_s = 900
delicate_shake_period_ms = 1500

[panel]
blink_ms = 500
";
        let config = parse_config(input).unwrap();
        assert_eq!(config.cycle.dump_ms, 120_000);
        assert_eq!(config.cycle.rinse_spin_s, 60);
        assert_eq!(config.program.break_long_s, 900);
        assert_eq!(config.program.delicate_shake_period_ms, 1500);
        assert_eq!(config.panel.blink_ms, 500);
        // Untouched keys keep defaults
        assert_eq!(config.program.wash_s, 300);
        assert_eq!(config.io, Default::default());
    }

    #[test]
    fn test_unknown_section() {
        assert_eq!(
            parse_config("[heater]\n"),
            Err(ParseError::InvalidSection { line: 1 })
        );
        assert_eq!(
            parse_config("\n[cycle\n"),
            Err(ParseError::InvalidSection { line: 2 })
        );
    }

    #[test]
    fn test_unknown_key() {
        assert_eq!(
            parse_config("[cycle]\nspeed = 3\n"),
            Err(ParseError::UnknownKey { line: 2 })
        );
        assert_eq!(
            parse_config("dump_ms = 3\n"),
            Err(ParseError::UnknownKey { line: 1 })
        );
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            parse_config("[cycle]\ndump_ms = -1\n"),
            Err(ParseError::InvalidValue { line: 2 })
        );
        assert_eq!(
            parse_config("[cycle]\ndump_ms = \"slow\"\n"),
            Err(ParseError::InvalidValue { line: 2 })
        );
        // u16 overflow
        assert_eq!(
            parse_config("[program]\nwash_s = 70000\n"),
            Err(ParseError::InvalidValue { line: 2 })
        );
        assert_eq!(
            parse_config("[program]\nwash_s = _300\n"),
            Err(ParseError::InvalidValue { line: 2 })
        );
    }

    #[test]
    fn test_malformed_line() {
        assert_eq!(
            parse_config("[io]\njust words\n"),
            Err(ParseError::Malformed { line: 2 })
        );
        assert_eq!(
            parse_config("[io]\npanel_timeout_ms =\n"),
            Err(ParseError::Malformed { line: 2 })
        );
    }
}
