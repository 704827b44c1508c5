// src/common/hal_traits.rs

use core::fmt::Debug;
use core::ops::{Add, Sub};
use core::time::Duration;

/// Requirements on the monotonic timestamps handed out by a [`Tes902Clock`].
///
/// Deadline arithmetic only: add a timeout to `now`, compare against a
/// deadline, subtract two instants to get an elapsed duration.
pub trait Tes902Instant:
    Copy + PartialOrd + Add<Duration, Output = Self> + Sub<Self, Output = Duration>
{
}

// Blanket impl so any suitable instant type qualifies without a marker impl.
impl<T> Tes902Instant for T where
    T: Copy + PartialOrd + Add<Duration, Output = T> + Sub<T, Output = Duration>
{
}

/// Abstraction for the monotonic clock and delay operations the driver needs.
///
/// Note: This could potentially be replaced by directly requiring
/// `embedded_hal::delay::DelayNs` if embedded-hal v1 is mandated, but that
/// trait offers no `now()`, which the receive-timeout logic relies on.
pub trait Tes902Clock {
    /// Monotonic timestamp type.
    type Instant: Tes902Instant;

    /// Returns the current monotonic time.
    fn now(&self) -> Self::Instant;

    /// Delay for at least the specified number of microseconds.
    fn delay_us(&mut self, us: u32);
}

/// Abstraction for synchronous (non-blocking) TES902 serial communication.
///
/// The underlying channel must be configured for 9600 baud 8N1 with both RX
/// and TX wired (see `common::timing::BAUD_RATE`). One driver instance owns
/// the channel exclusively; implementations need no buffering beyond one
/// frame.
pub trait Tes902Serial {
    /// Associated error type for communication errors.
    type Error: Debug;

    /// Attempts to read a single byte from the serial interface.
    ///
    /// Returns `Ok(byte)` if a byte was read, or `Err(nb::Error::WouldBlock)`
    /// if no byte is available yet. Other errors are returned as
    /// `Err(nb::Error::Other(Self::Error))`.
    fn read_byte(&mut self) -> nb::Result<u8, Self::Error>;

    /// Attempts to write a single byte to the serial interface.
    ///
    /// Returns `Ok(())` if the byte was accepted for transmission, or
    /// `Err(nb::Error::WouldBlock)` if the write buffer is full. Other errors
    /// are returned as `Err(nb::Error::Other(Self::Error))`.
    fn write_byte(&mut self, byte: u8) -> nb::Result<(), Self::Error>;

    /// Attempts to flush the transmit buffer, ensuring all written bytes have
    /// been sent.
    ///
    /// Returns `Ok(())` if the flush completed, or `Err(nb::Error::WouldBlock)`
    /// if transmission is still in progress. Other errors are returned as
    /// `Err(nb::Error::Other(Self::Error))`.
    fn flush(&mut self) -> nb::Result<(), Self::Error>;
}
