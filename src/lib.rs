// src/lib.rs

#![no_std] // Specify no_std at the crate root

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod common;
pub mod driver;

#[cfg(feature = "impl-generic-hal")]
pub mod adapter;

// Re-export key types for convenience
pub use common::config::{ConfigError, DriverConfig};
pub use common::error::{FrameError, Tes902Error};
pub use common::hal_traits::{Tes902Clock, Tes902Instant, Tes902Serial};
pub use driver::{Co2Sink, Measurement, PollState, SensorStatus, Tes902Driver};
