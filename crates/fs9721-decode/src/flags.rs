//! Annunciator bits in byte 1 and bytes 10-14.

use std::fmt;

use serde::Serialize;

use crate::frame::RawFrame;

/// SI prefix shown on the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    Nano,
    Micro,
    Milli,
    Kilo,
    Mega,
}

impl Scale {
    pub fn prefix(self) -> &'static str {
        match self {
            Scale::Nano => "nano",
            Scale::Micro => "micro",
            Scale::Milli => "milli",
            Scale::Kilo => "kilo",
            Scale::Mega => "mega",
        }
    }

    /// Power of ten the prefix stands for.
    pub fn exponent(self) -> i32 {
        match self {
            Scale::Nano => -9,
            Scale::Micro => -6,
            Scale::Milli => -3,
            Scale::Kilo => 3,
            Scale::Mega => 6,
        }
    }
}

/// What the meter is measuring: a primary unit or a submode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    Volts,
    Amps,
    Ohms,
    Farads,
    Hertz,
    Celsius,
    DutyCycle,
    Ac,
    Dc,
    Diode,
    Continuity,
}

impl Measure {
    /// Physical units; everything else qualifies a unit.
    pub fn is_primary(self) -> bool {
        !matches!(self, Measure::Ac | Measure::Dc | Measure::Diode | Measure::Continuity)
    }

    pub fn name(self) -> &'static str {
        match self {
            Measure::Volts => "volts",
            Measure::Amps => "amps",
            Measure::Ohms => "ohms",
            Measure::Farads => "farads",
            Measure::Hertz => "hertz",
            Measure::Celsius => "degrees Celsius",
            Measure::DutyCycle => "% duty cycle",
            Measure::Ac => "AC",
            Measure::Dc => "DC",
            Measure::Diode => "diode",
            Measure::Continuity => "continuity",
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AcDc {
    #[serde(rename = "AC")]
    Ac,
    #[serde(rename = "DC")]
    Dc,
}

impl fmt::Display for AcDc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AcDc::Ac => "AC",
            AcDc::Dc => "DC",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Auto,
    Rs232,
    Delta,
    Hold,
    BatteryLow,
}

/// A set bit with no assigned meaning on this chip variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReservedBit {
    /// 1-based frame position.
    pub byte: u8,
    /// Bit index within the data nibble, 0 = LSB.
    pub bit: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Scale(Scale),
    Measure(Measure),
    Mode(Mode),
    Reserved,
}

/// Flag bytes and their meanings, most significant data bit first.
pub static FLAG_TABLE: [(usize, [Flag; 4]); 6] = [
    (1, [
        Flag::Measure(Measure::Ac),
        Flag::Measure(Measure::Dc),
        Flag::Mode(Mode::Auto),
        Flag::Mode(Mode::Rs232),
    ]),
    (10, [
        Flag::Scale(Scale::Micro),
        Flag::Scale(Scale::Nano),
        Flag::Scale(Scale::Kilo),
        Flag::Measure(Measure::Diode),
    ]),
    (11, [
        Flag::Scale(Scale::Milli),
        Flag::Measure(Measure::DutyCycle),
        Flag::Scale(Scale::Mega),
        Flag::Measure(Measure::Continuity),
    ]),
    (12, [
        Flag::Measure(Measure::Farads),
        Flag::Measure(Measure::Ohms),
        Flag::Mode(Mode::Delta),
        Flag::Mode(Mode::Hold),
    ]),
    (13, [
        Flag::Measure(Measure::Amps),
        Flag::Measure(Measure::Volts),
        Flag::Measure(Measure::Hertz),
        Flag::Mode(Mode::BatteryLow),
    ]),
    (14, [
        Flag::Reserved,
        Flag::Measure(Measure::Celsius),
        Flag::Reserved,
        Flag::Reserved,
    ]),
];

/// Every annunciator lit in one frame, grouped by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlagSet {
    pub scale: Vec<Scale>,
    pub measurement: Vec<Measure>,
    pub mode: Vec<Mode>,
    pub reserved: Vec<ReservedBit>,
}

impl FlagSet {
    pub fn from_frame(frame: &RawFrame) -> Self {
        let mut set = FlagSet::default();
        for (position, bits) in FLAG_TABLE.iter() {
            let nibble = frame.nibble(*position);
            for (i, flag) in bits.iter().enumerate() {
                let bit = 3 - i as u8;
                if nibble & (1 << bit) == 0 {
                    continue;
                }
                match *flag {
                    Flag::Scale(s) => set.scale.push(s),
                    Flag::Measure(m) => set.measurement.push(m),
                    Flag::Mode(m) => set.mode.push(m),
                    Flag::Reserved => set.reserved.push(ReservedBit { byte: *position as u8, bit }),
                }
            }
        }
        set
    }

    pub fn has(&self, flag: Flag) -> bool {
        match flag {
            Flag::Scale(s) => self.scale.contains(&s),
            Flag::Measure(m) => self.measurement.contains(&m),
            Flag::Mode(m) => self.mode.contains(&m),
            Flag::Reserved => !self.reserved.is_empty(),
        }
    }

    pub fn primary_units(&self) -> impl Iterator<Item = Measure> + '_ {
        self.measurement.iter().copied().filter(|m| m.is_primary())
    }

    /// DC wins when the display shows both.
    pub fn acdc(&self) -> Option<AcDc> {
        if self.has(Flag::Measure(Measure::Dc)) {
            Some(AcDc::Dc)
        } else if self.has(Flag::Measure(Measure::Ac)) {
            Some(AcDc::Ac)
        } else {
            None
        }
    }
}
