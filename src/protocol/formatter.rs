//! Response formatter registry
//!
//! Maps an opcode to the rule that turns its raw response value into a
//! readable one. The registry is built on first use and never mutated, so it
//! is shared without locking.
//!
//! A value that does not fit its rule is returned unchanged.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::opcode;

/// How a raw value is turned into a readable one
#[derive(Clone, Copy)]
pub enum Formatter {
    /// Exact lookup of the raw value
    EnumMapping(&'static [(&'static str, &'static str)]),

    /// Raw value is a hex index into the list; gaps are `None`
    IndexedList(&'static [Option<&'static str>]),

    /// Pure function of the raw value; `None` means it could not be parsed
    Computed(fn(&str) -> Option<String>),
}

/// Shape of the value region a rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    /// Exactly this many characters
    Fixed(usize),

    /// One or more characters
    Rest,
}

impl Width {
    fn matches(self, value: &str) -> bool {
        match self {
            Width::Fixed(n) => value.chars().count() == n,
            Width::Rest => !value.is_empty(),
        }
    }
}

/// A registered decode rule
#[derive(Clone, Copy)]
pub struct Rule {
    pub width: Width,
    pub formatter: Formatter,
}

// =============================================================================
// Value Tables
// =============================================================================

const POWER_VALUES: &[(&str, &str)] = &[
    ("0", opcode::STANDBY),
    ("1", opcode::ON),
    ("2", opcode::COOLING),
    ("3", opcode::WARMING),
    ("4", opcode::ERROR),
];

const INPUT_VALUES: &[(&str, &str)] = &[("6", "hdmi1"), ("7", "hdmi2")];

const SOURCE_VALUES: &[(&str, &str)] = &[("0", "nosignal"), ("1", "signal")];

const TOGGLE_VALUES: &[(&str, &str)] = &[("0", opcode::OFF), ("1", opcode::ON)];

const PICTURE_MODE_VALUES: &[(&str, &str)] = &[
    ("00", "film"),
    ("01", "cinema"),
    ("02", "natural"),
    ("03", "hdr10"),
    ("04", "thx"),
    ("06", "user1"),
    ("07", "user2"),
    ("08", "user3"),
    ("09", "user4"),
    ("0A", "user5"),
    ("0B", "user6"),
    ("0C", "hlg"),
];

const LASER_POWER_VALUES: &[Option<&str>] = &[Some("low"), Some("high"), Some("medium")];

const CLEAR_MOTION_DRIVE_VALUES: &[Option<&str>] = &[
    Some(opcode::OFF),
    None,
    None,
    Some("low"),
    Some("high"),
    Some("inverse_telecine"),
];

// =============================================================================
// Computed Values
// =============================================================================

/// Spaces become dashes and dash runs collapse
fn dashed(value: &str) -> Option<String> {
    let mut out = String::with_capacity(value.len());
    for c in value.chars().map(|c| if c == ' ' { '-' } else { c }) {
        if !(c == '-' && out.ends_with('-')) {
            out.push(c);
        }
    }
    Some(out)
}

fn hex_number(value: &str) -> Option<String> {
    u64::from_str_radix(value, 16).ok().map(|n| n.to_string())
}

/// Eight hex digits → dotted quad
fn ip_address(value: &str) -> Option<String> {
    if value.len() != 8 || !value.is_ascii() {
        return None;
    }
    let octets = (0..4)
        .map(|i| u8::from_str_radix(&value[i * 2..i * 2 + 2], 16).ok())
        .collect::<Option<Vec<_>>>()?;
    Some(format!("{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3]))
}

// =============================================================================
// Registry
// =============================================================================

static REGISTRY: Lazy<HashMap<&'static str, Rule>> = Lazy::new(|| {
    use Formatter::*;

    let rules = [
        (opcode::POWER, Width::Fixed(1), EnumMapping(POWER_VALUES)),
        (opcode::INPUT, Width::Fixed(1), EnumMapping(INPUT_VALUES)),
        (opcode::SOURCE, Width::Fixed(1), EnumMapping(SOURCE_VALUES)),
        (opcode::MODEL, Width::Rest, Computed(dashed)),
        (opcode::MAC, Width::Rest, Computed(dashed)),
        (opcode::LAN_IP_ADDRESS, Width::Fixed(8), Computed(ip_address)),
        (opcode::LASER_TIME, Width::Rest, Computed(hex_number)),
        (opcode::PICTURE_MODE, Width::Fixed(2), EnumMapping(PICTURE_MODE_VALUES)),
        (opcode::LOW_LATENCY, Width::Fixed(1), EnumMapping(TOGGLE_VALUES)),
        (opcode::LASER_POWER, Width::Fixed(1), IndexedList(LASER_POWER_VALUES)),
        (
            opcode::CLEAR_MOTION_DRIVE,
            Width::Fixed(1),
            IndexedList(CLEAR_MOTION_DRIVE_VALUES),
        ),
    ];

    rules
        .into_iter()
        .map(|(code, width, formatter)| (code, Rule { width, formatter }))
        .collect()
});

/// Look up the rule registered for an opcode
pub fn rule(code: &str) -> Option<Rule> {
    REGISTRY.get(code).copied()
}

/// Decode a raw response value for `code`
pub fn decode(code: &str, value: &str) -> String {
    let Some(rule) = rule(code) else {
        return value.to_string();
    };
    if !rule.width.matches(value) {
        return value.to_string();
    }

    let decoded = match rule.formatter {
        Formatter::EnumMapping(map) => {
            let found = map.iter().find(|(raw, _)| *raw == value).map(|(_, v)| v.to_string());
            if found.is_none() {
                tracing::warn!("response '{}' not mapped for cmd '{}'", value, code);
            }
            found
        }
        Formatter::IndexedList(list) => match usize::from_str_radix(value, 16) {
            Ok(index) => list.get(index).copied().flatten().map(str::to_string),
            Err(_) => {
                tracing::warn!("response '{}' not int for cmd '{}'", value, code);
                None
            }
        },
        Formatter::Computed(f) => {
            let out = f(value);
            if out.is_none() {
                tracing::warn!("response format failed for '{} ({})'", code, value);
            }
            out
        }
    };

    decoded.unwrap_or_else(|| value.to_string())
}
