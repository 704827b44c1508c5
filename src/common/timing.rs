// src/common/timing.rs

use core::time::Duration;

// The TES902 link is fixed at 9600 baud, 8 data bits, no parity, 1 stop bit,
// with both RX and TX required. Nominal byte timing below is derived from
// that rate; the receive timeout leaves generous margin over it.

// === Link Parameters ===

/// Fixed serial rate of the TES902. Not configurable.
pub const BAUD_RATE: u32 = 9600;

// === Byte Timing at 9600 Baud (8N1) ===
// 1 start bit + 8 data bits + 1 stop bit = 10 bits per byte
// Time per byte = 10 / 9600 s = 1.0416... ms

/// Nominal duration of a single bit at 9600 baud.
pub const BIT_DURATION: Duration = Duration::from_nanos(104_167);
/// Nominal duration of a single byte (10 bits total) at 9600 baud (8N1 format).
pub const BYTE_DURATION: Duration = Duration::from_micros(1042);

// === Driver Defaults ===

/// Default interval between measurement polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default deadline for a complete response frame after the request is sent.
/// A full 10-byte report takes ~10.4 ms on the wire; the sensor needs some
/// processing time on top of that.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_millis(500);

/// Default number of consecutive failed exchanges before the driver reports
/// the sensor as unavailable.
pub const DEFAULT_UNAVAILABLE_THRESHOLD: u32 = 5;

// === I/O Pacing ===

/// Spin-wait granularity while blocking on a non-blocking serial interface.
pub const IO_POLL_DELAY_US: u32 = 100;

/// Upper bound on the teardown drain: long enough for one in-flight report
/// to finish arriving, short enough not to stall the owner.
pub const TEARDOWN_DRAIN_TIMEOUT: Duration = Duration::from_millis(50);
