use serde::{Serialize, Serializer};

use crate::error::FrameError;

/// Bytes per display snapshot.
pub const FRAME_LEN: usize = 14;

/// Position tag carried in the high nibble of a frame byte.
pub fn position_of(byte: u8) -> u8 {
    byte >> 4
}

/// One complete 14-byte frame with every position nibble in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame([u8; FRAME_LEN]);

impl RawFrame {
    /// Validates that byte `i` (1-based) is tagged with position `i`.
    pub fn new(bytes: [u8; FRAME_LEN]) -> Result<Self, FrameError> {
        for (i, &b) in bytes.iter().enumerate() {
            let expected = (i + 1) as u8;
            let found = position_of(b);
            if found != expected {
                return Err(FrameError::BadPosition { index: i + 1, expected, found });
            }
        }
        Ok(Self(bytes))
    }

    /// Caller guarantees the positions are already checked.
    pub(crate) fn from_synced(bytes: [u8; FRAME_LEN]) -> Self {
        debug_assert!(Self::new(bytes).is_ok());
        Self(bytes)
    }

    /// Builds a frame from the 14 data nibbles, adding the position tags.
    pub fn from_nibbles(nibbles: [u8; FRAME_LEN]) -> Self {
        let mut bytes = [0u8; FRAME_LEN];
        for (i, (dst, n)) in bytes.iter_mut().zip(nibbles).enumerate() {
            *dst = (((i + 1) as u8) << 4) | (n & 0x0F);
        }
        Self(bytes)
    }

    /// Data nibble of the byte at 1-based `position`.
    pub fn nibble(&self, position: usize) -> u8 {
        self.0[position - 1] & 0x0F
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }
}

impl TryFrom<&[u8]> for RawFrame {
    type Error = FrameError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; FRAME_LEN] = bytes.try_into().map_err(|_| FrameError::BadLength(bytes.len()))?;
        Self::new(arr)
    }
}

impl AsRef<[u8]> for RawFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for RawFrame {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}
