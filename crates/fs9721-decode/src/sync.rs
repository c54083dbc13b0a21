//! Locates frame boundaries in an unframed byte stream.

use std::io::{self, Read};
use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::error::DmmError;
use crate::frame::{position_of, RawFrame, FRAME_LEN};

/// Reassembles position-tagged frames, resynchronizing on misalignment.
#[derive(Debug, Clone)]
pub struct FrameSync {
    max_attempts: u32,
    time_budget: Duration,
}

impl FrameSync {
    pub fn new(max_attempts: u32, time_budget: Duration) -> Self {
        Self { max_attempts, time_budget }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn time_budget(&self) -> Duration {
        self.time_budget
    }

    /// Reads until one complete frame arrives.
    ///
    /// Returns the frame together with the number of partial frames thrown
    /// away on the way. A run of consecutive stray bytes counts as a single
    /// discard.
    pub fn next_frame<R: Read>(&self, source: &mut R) -> Result<(RawFrame, u32), DmmError> {
        let started = Instant::now();
        let mut buf = [0u8; FRAME_LEN];
        let mut filled = 0usize;
        let mut discarded = 0u32;
        let mut skipping = false;

        loop {
            let byte = match read_byte(source)? {
                Some(b) => b,
                None => {
                    if started.elapsed() >= self.time_budget {
                        return Err(DmmError::SyncTimeout { budget: self.time_budget, discarded });
                    }
                    continue;
                }
            };

            let expected = (filled + 1) as u8;
            let position = position_of(byte);
            if position == expected {
                buf[filled] = byte;
                filled += 1;
                skipping = false;
                if filled == FRAME_LEN {
                    trace!("frame {:02x?}", buf);
                    return Ok((RawFrame::from_synced(buf), discarded));
                }
            } else {
                if filled > 0 || !skipping {
                    discarded += 1;
                    debug!(
                        "position {} where {} expected, discarding {} bytes ({} discarded)",
                        position, expected, filled, discarded
                    );
                    if discarded >= self.max_attempts {
                        return Err(DmmError::SyncExhausted { discarded });
                    }
                }
                filled = 0;
                if position == 1 {
                    buf[0] = byte;
                    filled = 1;
                    skipping = false;
                } else {
                    skipping = true;
                }
            }

            if started.elapsed() >= self.time_budget {
                return Err(DmmError::SyncTimeout { budget: self.time_budget, discarded });
            }
        }
    }
}

/// `Ok(None)` when the source timed out without data.
fn read_byte<R: Read>(source: &mut R) -> Result<Option<u8>, DmmError> {
    let mut byte = [0u8; 1];
    loop {
        match source.read(&mut byte) {
            Ok(0) => {
                return Err(DmmError::Transport(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "byte source closed",
                )))
            }
            Ok(_) => return Ok(Some(byte[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                return Ok(None)
            }
            Err(e) => return Err(DmmError::Transport(e)),
        }
    }
}
