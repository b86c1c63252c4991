#![no_std]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod bus;
pub mod config;
pub mod device;
pub mod error;
pub mod fusion;
pub mod interface;
pub mod registers;
pub mod reporting;
pub mod timer;

// Re-export main types
pub use bus::{HalSpi, SpiPeripheral};
pub use device::{DataStatus, Lsm6dso, State};
pub use error::{ErrorCode, ErrorKind, Frame, Function, Severity};
pub use fusion::{Angles, ComplementaryFilter, PhysicalSample, RawSample, RawSampleBlock};
pub use interface::SpiInterface;
pub use registers::{Register, WHO_AM_I_VALUE};
pub use reporting::Axis;
pub use timer::Clock;

#[cfg(feature = "embassy-time")]
pub use timer::EmbassyClock;
