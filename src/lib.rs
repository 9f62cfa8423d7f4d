//! Enumerate Linux input event devices and read their capabilities through the
//! evdev control interface.

pub mod bitmask;
pub mod capabilities;
pub mod codes;
pub mod device;
pub mod discovery;
pub mod enumerate;
pub mod error;
pub mod format;
pub mod listing;
pub mod protocol;

pub use capabilities::{DeviceCapabilities, DeviceReport};
pub use codes::{CodeLimits, EventType};
pub use enumerate::Enumerator;
pub use error::{Error, ErrorKind, Result, Warning};
