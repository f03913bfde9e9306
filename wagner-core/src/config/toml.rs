//! Minimal TOML reader for the robot configuration
//!
//! Handles only the subset `robot.toml` needs. It does NOT support the full
//! TOML grammar.
//!
//! Supported:
//! - `[drive]`, `[wifi]` and `[protocol]` section headers
//! - `key = value` pairs with string, integer, float and boolean values
//! - `_` separators in numbers (`120_000`)
//! - Comments (`# ...`), whole-line or after a value
//!
//! Keys that are not set keep their defaults. Unknown keys and sections are
//! errors so a typo cannot silently fall back to a default.

use heapless::String;
use wagner_protocol::ProtocolVariant;

use super::types::RobotConfig;

/// What went wrong on a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseErrorKind {
    /// Unknown or malformed section header
    InvalidSection,
    /// Key not known in the current section
    UnknownKey,
    /// Line is neither a header nor `key = value`
    Syntax,
    /// Value has the wrong type or is out of range
    InvalidValue,
    /// String value exceeds its capacity
    TooLong,
}

/// Parse error with the 1-based line it occurred on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Drive,
    Wifi,
    Protocol,
}

/// Parse TOML text into a [`RobotConfig`]
///
/// The result is not validated; call [`RobotConfig::validate`] afterwards.
pub fn parse_config(input: &str) -> Result<RobotConfig, ParseError> {
    let mut config = RobotConfig::new();
    let mut section = Section::Root;

    for (index, raw) in input.lines().enumerate() {
        let at = |kind| ParseError {
            line: index + 1,
            kind,
        };

        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('[') {
            let header = header
                .strip_suffix(']')
                .ok_or(at(ParseErrorKind::InvalidSection))?;
            section = parse_section_header(header).ok_or(at(ParseErrorKind::InvalidSection))?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(at(ParseErrorKind::Syntax))?;
        apply_value(&mut config, section, key, value).map_err(at)?;
    }

    Ok(config)
}

fn parse_section_header(header: &str) -> Option<Section> {
    match header.trim() {
        "drive" => Some(Section::Drive),
        "wifi" => Some(Section::Wifi),
        "protocol" => Some(Section::Protocol),
        _ => None,
    }
}

/// Cut a trailing `#` comment, ignoring `#` inside quoted strings
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
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

fn apply_value(
    config: &mut RobotConfig,
    section: Section,
    key: &str,
    value: &str,
) -> Result<(), ParseErrorKind> {
    match (section, key) {
        (Section::Drive, "max_distance_cm") => config.drive.max_distance_cm = parse_float(value)?,
        (Section::Drive, "blocked_time_ms") => config.drive.blocked_time_ms = parse_int(value)?,
        (Section::Drive, "walking_time_ms") => config.drive.walking_time_ms = parse_int(value)?,
        (Section::Drive, "max_speed") => config.drive.max_speed = parse_int(value)?,

        (Section::Wifi, "ssid") => config.wifi.ssid = parse_string(value)?,
        (Section::Wifi, "password") => config.wifi.password = parse_string(value)?,
        (Section::Wifi, "reconnect_attempts") => {
            config.wifi.reconnect_attempts = parse_int(value)?
        }
        (Section::Wifi, "retry_interval_ms") => config.wifi.retry_interval_ms = parse_int(value)?,
        (Section::Wifi, "cooldown_ms") => config.wifi.cooldown_ms = parse_int(value)?,
        (Section::Wifi, "status_interval_ms") => {
            config.wifi.status_interval_ms = parse_int(value)?
        }

        (Section::Protocol, "variant") => config.protocol.variant = parse_variant(value)?,
        (Section::Protocol, "frame_len") => config.protocol.frame_len = Some(parse_int(value)?),

        _ => return Err(ParseErrorKind::UnknownKey),
    }
    Ok(())
}

/// Parse a basic quoted string, handling `\"` and `\\` escapes
fn parse_string<const N: usize>(value: &str) -> Result<String<N>, ParseErrorKind> {
    let inner = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .ok_or(ParseErrorKind::InvalidValue)?;

    let mut out = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        let c = match c {
            '\\' => match chars.next() {
                Some(e @ ('"' | '\\')) => e,
                Some('n') => '\n',
                Some('t') => '\t',
                _ => return Err(ParseErrorKind::InvalidValue),
            },
            '"' => return Err(ParseErrorKind::InvalidValue),
            c => c,
        };
        out.push(c).map_err(|_| ParseErrorKind::TooLong)?;
    }
    Ok(out)
}

/// Copy a number without its `_` separators
fn strip_separators(value: &str) -> Result<String<24>, ParseErrorKind> {
    let mut out = String::new();
    for c in value.chars().filter(|&c| c != '_') {
        out.push(c).map_err(|_| ParseErrorKind::InvalidValue)?;
    }
    Ok(out)
}

/// Parse an integer value
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseErrorKind> {
    strip_separators(value)?
        .parse()
        .map_err(|_| ParseErrorKind::InvalidValue)
}

/// Parse a float value; integers are accepted too
fn parse_float(value: &str) -> Result<f32, ParseErrorKind> {
    strip_separators(value)?
        .parse()
        .map_err(|_| ParseErrorKind::InvalidValue)
}

/// Parse protocol variant
fn parse_variant(value: &str) -> Result<ProtocolVariant, ParseErrorKind> {
    let value: String<16> = parse_string(value)?;
    match value.as_str() {
        "basic" | "Basic" => Ok(ProtocolVariant::Basic),
        "extended" | "Extended" => Ok(ProtocolVariant::Extended),
        "joypad" | "Joypad" => Ok(ProtocolVariant::Joypad),
        _ => Err(ParseErrorKind::InvalidValue),
    }
}
