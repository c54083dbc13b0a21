//! Turns decoded fields into a [`Reading`].

use log::warn;
use serde::Serialize;

use crate::decoder::DecodedFields;
use crate::flags::{AcDc, FlagSet, Measure, Mode, Scale};
use crate::frame::RawFrame;

/// Text used for readings that failed a sanity check.
pub const INVALID_TEXT: &str = "Invalid Value";

/// A protocol-legal but implausible display state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SanityViolation {
    MultipleDecimalPoints,
    MultipleScales,
    MultipleUnits,
    InvalidSegment { slot: usize },
}

/// One decoded display snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    /// Formatted value, e.g. `-4.9 millivolts DC`.
    pub text: String,
    /// Value with the scale applied; `None` for non-numeric displays.
    pub numeric_val: Option<f64>,
    pub measurement: Option<Measure>,
    pub delta: bool,
    pub acdc: Option<AcDc>,
    pub sane_value: bool,
    pub violations: Vec<SanityViolation>,
    /// Partial frames discarded before this one was captured.
    pub read_errors: u32,
    /// The display as shown, sign and decimal point included.
    pub raw_val: String,
    /// Normalized number when numeric, otherwise the raw display.
    pub val: String,
    pub scale: Option<Scale>,
    pub digits: [char; 4],
    pub flags: FlagSet,
    pub raw_bytes: RawFrame,
}

impl Reading {
    pub fn is_hold(&self) -> bool {
        self.flags.mode.contains(&Mode::Hold)
    }

    pub fn is_battery_low(&self) -> bool {
        self.flags.mode.contains(&Mode::BatteryLow)
    }
}

pub fn assemble(fields: DecodedFields, read_errors: u32) -> Reading {
    let mut violations = Vec::new();

    let mut body = String::with_capacity(5);
    for (slot, ch) in fields.digits.iter().enumerate() {
        if fields.decimal_points.contains(&slot) {
            body.push('.');
        }
        body.push(*ch);
    }
    let sign = if fields.negative { "-" } else { "" };
    let raw_val = format!("{sign}{body}");

    if fields.decimal_points.len() > 1 {
        violations.push(SanityViolation::MultipleDecimalPoints);
    }
    if fields.flags.scale.len() > 1 {
        violations.push(SanityViolation::MultipleScales);
    }
    let units: Vec<Measure> = fields.flags.primary_units().collect();
    if units.len() > 1 {
        violations.push(SanityViolation::MultipleUnits);
    }
    for (slot, ok) in fields.valid.iter().enumerate() {
        if !ok {
            violations.push(SanityViolation::InvalidSegment { slot });
        }
    }

    let scale = match fields.flags.scale.as_slice() {
        [s] => Some(*s),
        _ => None,
    };
    let measurement = match units.as_slice() {
        [m] => Some(*m),
        _ => None,
    };

    let numeric = fields.all_digits_valid() && fields.decimal_points.len() <= 1;
    let digits = format!("{sign}{}", body.trim());
    let parsed = if numeric { digits.parse::<f64>().ok() } else { None };
    // Scale in the decimal domain so the result is the correctly rounded value.
    let numeric_val = parsed.and_then(|_| {
        let exp = scale.map_or(0, Scale::exponent);
        format!("{digits}e{exp}").parse::<f64>().ok()
    });
    let val = match parsed {
        Some(n) => format!("{n:?}"),
        None => raw_val.clone(),
    };

    let delta = fields.flags.mode.contains(&Mode::Delta);
    let acdc = fields.flags.acdc();
    let sane_value = violations.is_empty();

    let text = if sane_value {
        format_text(&val, delta, scale, measurement, acdc)
    } else {
        warn!("implausible reading {raw_val:?}: {violations:?}");
        INVALID_TEXT.to_string()
    };

    Reading {
        text,
        numeric_val,
        measurement,
        delta,
        acdc,
        sane_value,
        violations,
        read_errors,
        raw_val,
        val,
        scale,
        digits: fields.digits,
        flags: fields.flags,
        raw_bytes: fields.frame,
    }
}

fn format_text(
    val: &str,
    delta: bool,
    scale: Option<Scale>,
    measurement: Option<Measure>,
    acdc: Option<AcDc>,
) -> String {
    let mut text = String::new();
    if delta {
        text.push_str("delta ");
    }
    text.push_str(val.trim());
    text.push(' ');
    if let Some(s) = scale {
        text.push_str(s.prefix());
    }
    if let Some(m) = measurement {
        text.push_str(m.name());
    }
    if let Some(ac) = acdc {
        text.push(' ');
        text.push_str(&ac.to_string());
    }
    text.trim_end().to_string()
}
