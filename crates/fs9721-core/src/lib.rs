//! Serial I/O for FS9721_LP3 meters: port setup and a byte source over the link.

pub mod serial_service;

pub use serial_service::{PortInfo, SerialConfig, SerialError, SerialEvent, SerialService, BAUD_RATE};
