use std::time::Duration;

/// Hard failures while pulling a frame off the byte source.
#[derive(Debug, thiserror::Error)]
pub enum DmmError {
    /// The byte source failed or was closed. Never retried here.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Too many misaligned partial frames before a complete one arrived.
    #[error("no valid frame after {discarded} discarded frames")]
    SyncExhausted { discarded: u32 },

    /// The time budget ran out before a complete frame arrived.
    #[error("no valid frame within {budget:?} ({discarded} discarded frames)")]
    SyncTimeout { budget: Duration, discarded: u32 },
}

impl DmmError {
    pub fn is_transport(&self) -> bool {
        matches!(self, DmmError::Transport(_))
    }

    /// Number of frames thrown away before giving up, for sync failures.
    pub fn discarded(&self) -> Option<u32> {
        match self {
            DmmError::Transport(_) => None,
            DmmError::SyncExhausted { discarded } | DmmError::SyncTimeout { discarded, .. } => {
                Some(*discarded)
            }
        }
    }
}

/// Rejection reasons when building a [`RawFrame`](crate::RawFrame) from bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("frame must be 14 bytes, got {0}")]
    BadLength(usize),

    #[error("byte {index} carries position {found}, expected {expected}")]
    BadPosition { index: usize, expected: u8, found: u8 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn discarded_is_reported_for_sync_failures_only() {
        let transport = DmmError::Transport(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"));
        assert!(transport.is_transport());
        assert_eq!(transport.discarded(), None);

        let exhausted = DmmError::SyncExhausted { discarded: 3 };
        assert!(!exhausted.is_transport());
        assert_eq!(exhausted.discarded(), Some(3));

        let timeout = DmmError::SyncTimeout { budget: Duration::from_secs(3), discarded: 1 };
        assert_eq!(timeout.discarded(), Some(1));
    }

    #[test]
    fn messages_name_the_failure() {
        let err = DmmError::SyncExhausted { discarded: 2 };
        assert_eq!(err.to_string(), "no valid frame after 2 discarded frames");

        let err = FrameError::BadPosition { index: 3, expected: 4, found: 7 };
        assert_eq!(err.to_string(), "byte 3 carries position 7, expected 4");
    }
}
