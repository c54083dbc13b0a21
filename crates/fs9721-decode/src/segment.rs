//! Seven-segment lookup.
//!
//! A digit spans two nibbles: `S123 4567`, where `S` is the sign/decimal bit
//! and the remaining seven bits are the lit segments:
//!
//! ```text
//!      1
//!   2     7
//!      6
//!   3     5
//!      4
//! ```

/// Marker for a segment pattern the table does not know.
pub const INVALID_DIGIT: char = 'X';

/// Pattern (7 bits, first nibble's low three bits in the high positions) to character.
pub static SEGMENT_TABLE: [(u8, char); 12] = [
    (0x7D, '0'),
    (0x05, '1'),
    (0x5B, '2'),
    (0x1F, '3'),
    (0x27, '4'),
    (0x3E, '5'),
    (0x7E, '6'),
    (0x15, '7'),
    (0x7F, '8'),
    (0x3F, '9'),
    (0x68, 'L'),
    (0x00, ' '),
];

/// Joins the two data nibbles of a digit into `(sign_or_decimal, pattern)`.
pub fn split_digit(first: u8, second: u8) -> (bool, u8) {
    let flag = first & 0x08 != 0;
    let pattern = ((first & 0x07) << 4) | (second & 0x0F);
    (flag, pattern)
}

pub fn lookup(pattern: u8) -> Option<char> {
    SEGMENT_TABLE.iter().find(|(p, _)| *p == pattern).map(|&(_, c)| c)
}

pub fn encode(ch: char) -> Option<u8> {
    SEGMENT_TABLE.iter().find(|(_, c)| *c == ch).map(|&(p, _)| p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_character_survives_encode_then_lookup() {
        for &(_, ch) in SEGMENT_TABLE.iter() {
            let pattern = encode(ch).unwrap();
            assert_eq!(lookup(pattern), Some(ch), "character {ch:?}");
        }
    }

    #[test]
    fn patterns_are_unique() {
        for (i, (a, _)) in SEGMENT_TABLE.iter().enumerate() {
            for (b, _) in &SEGMENT_TABLE[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn split_separates_sign_bit() {
        // '4' with the sign/decimal bit lit
        assert_eq!(split_digit(0xA, 0x7), (true, 0x27));
        assert_eq!(split_digit(0x2, 0x7), (false, 0x27));
        assert_eq!(lookup(0x27), Some('4'));
    }

    #[test]
    fn unknown_pattern_has_no_character() {
        assert_eq!(lookup(0x01), None);
        assert_eq!(encode('?'), None);
    }
}
