use crate::flags::FlagSet;
use crate::frame::RawFrame;
use crate::segment::{self, INVALID_DIGIT};

/// Frame positions of the two nibbles making up each display digit.
pub const DIGIT_POSITIONS: [(usize, usize); 4] = [(2, 3), (4, 5), (6, 7), (8, 9)];

/// Everything read off one frame, before any interpretation of the value.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFields {
    /// Display characters in order; [`INVALID_DIGIT`] where lookup failed.
    pub digits: [char; 4],
    pub valid: [bool; 4],
    pub negative: bool,
    /// Slot indices (1..=3) preceded by a lit decimal point.
    pub decimal_points: Vec<usize>,
    pub flags: FlagSet,
    pub frame: RawFrame,
}

impl DecodedFields {
    /// The decimal point position, if exactly one is lit.
    pub fn decimal_point(&self) -> Option<usize> {
        match self.decimal_points.as_slice() {
            [slot] => Some(*slot),
            _ => None,
        }
    }

    pub fn all_digits_valid(&self) -> bool {
        self.valid.iter().all(|v| *v)
    }
}

pub fn decode(frame: &RawFrame) -> DecodedFields {
    let mut digits = [INVALID_DIGIT; 4];
    let mut valid = [false; 4];
    let mut negative = false;
    let mut decimal_points = Vec::new();

    for (slot, &(hi, lo)) in DIGIT_POSITIONS.iter().enumerate() {
        let (marker, pattern) = segment::split_digit(frame.nibble(hi), frame.nibble(lo));
        if let Some(ch) = segment::lookup(pattern) {
            digits[slot] = ch;
            valid[slot] = true;
        }
        if marker {
            if slot == 0 {
                negative = true;
            } else {
                decimal_points.push(slot);
            }
        }
    }

    DecodedFields {
        digits,
        valid,
        negative,
        decimal_points,
        flags: FlagSet::from_frame(frame),
        frame: *frame,
    }
}
