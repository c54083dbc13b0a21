//! FS9721_LP3 telemetry: frame sync, segment/flag decoding, readings.

pub mod decoder;
pub mod error;
pub mod flags;
pub mod frame;
pub mod segment;
pub mod session;
pub mod sync;
pub mod value;

pub use decoder::{decode, DecodedFields};
pub use error::{DmmError, FrameError};
pub use flags::{AcDc, Flag, FlagSet, Measure, Mode, ReservedBit, Scale};
pub use frame::{RawFrame, FRAME_LEN};
pub use session::{Dmm, DmmConfig};
pub use sync::FrameSync;
pub use value::{assemble, Reading, SanityViolation};
