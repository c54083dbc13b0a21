use std::io::Read;
use std::time::Duration;

use log::{debug, info};

use crate::decoder::decode;
use crate::error::DmmError;
use crate::sync::FrameSync;
use crate::value::{assemble, Reading};

/// Synchronization limits for a [`Dmm`] session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DmmConfig {
    /// Partial frames that may be discarded while waiting for one reading.
    pub retries: u32,
    /// Wall-clock budget for capturing one frame.
    pub timeout: Duration,
}

impl Default for DmmConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            timeout: Duration::from_secs(3),
        }
    }
}

/// A synchronized reader over a meter's byte stream.
pub struct Dmm<R> {
    source: R,
    sync: FrameSync,
}

impl<R: Read> Dmm<R> {
    /// Opens a session and checks that the source carries valid frames.
    pub fn open(source: R, retries: u32, timeout: Duration) -> Result<Self, DmmError> {
        Self::with_config(source, DmmConfig { retries, timeout })
    }

    pub fn with_config(mut source: R, cfg: DmmConfig) -> Result<Self, DmmError> {
        let sync = FrameSync::new(cfg.retries, cfg.timeout);
        // The first frame only aligns the stream.
        let (_, discarded) = sync.next_frame(&mut source)?;
        info!("synchronized with meter ({discarded} partial frames skipped)");
        Ok(Self { source, sync })
    }

    /// Captures and decodes the next frame.
    pub fn read(&mut self) -> Result<Reading, DmmError> {
        let (frame, discarded) = self.sync.next_frame(&mut self.source)?;
        let reading = assemble(decode(&frame), discarded);
        debug!("{} (raw {:?})", reading.text, reading.raw_val);
        Ok(reading)
    }

    /// Ends the session, handing the byte source back for release.
    pub fn close(self) -> R {
        self.source
    }

    pub fn config(&self) -> DmmConfig {
        DmmConfig {
            retries: self.sync.max_attempts(),
            timeout: self.sync.time_budget(),
        }
    }
}

impl<R: Read> Iterator for Dmm<R> {
    type Item = Result<Reading, DmmError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.read())
    }
}
