// src/common/error.rs

/// Framing violations detected before any value is trusted.
///
/// These cover everything that makes a byte sequence not a well-formed TES902
/// frame; checksum and range violations have their own variants on
/// [`Tes902Error`] so the fault handler can tell them apart.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum FrameError {
    /// Buffer is shorter than the minimal frame (sync + header + CRC).
    #[error("frame too short: {len} bytes")]
    TooShort { len: usize },

    /// Buffer does not start with the 0xBB 0x66 sync sequence.
    #[error("missing sync bytes")]
    BadSync,

    /// Length byte announces more data than a frame may carry.
    #[error("impossible data length: {len}")]
    Oversize { len: usize },

    /// Total buffer length disagrees with the frame's length byte.
    #[error("length byte {declared} does not match {actual} data bytes")]
    LengthMismatch { declared: usize, actual: usize },

    /// Well-formed frame, but not a CO2 measurement report.
    #[error("unexpected response type: {0:#04x}")]
    UnexpectedType(u8),

    /// CO2 report carries fewer data bytes than the concentration field.
    #[error("truncated payload: {len} data bytes")]
    TruncatedPayload { len: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum Tes902Error<E = ()>
where
    E: core::fmt::Debug, // Still need Debug for the generic Io error
{
    /// Underlying I/O error from the HAL implementation.
    #[error("I/O error: {0:?}")] // Format string requires Debug on E
    Io(E),

    /// No complete response frame arrived within the receive timeout.
    #[error("operation timed out")]
    Timeout,

    /// Received bytes do not form a valid frame.
    #[error("framing error: {0}")]
    Frame(#[source] FrameError),

    /// Received CRC does not match calculated CRC.
    #[error("CRC mismatch: expected {expected:#06x}, calculated {calculated:#06x}")]
    CrcMismatch { expected: u16, calculated: u16 },

    /// Decoded concentration is outside the sensor's measuring range.
    #[error("reading out of range: {0} ppm")]
    OutOfRange(u16),
}

// Allow mapping from underlying HAL error if From is implemented
impl<E: core::fmt::Debug> From<E> for Tes902Error<E> {
    fn from(e: E) -> Self {
        Tes902Error::Io(e)
    }
}

// Note: For the Io(E) variant's #[error("...")] message to work correctly even
// in no_std, the underlying error type `E` must implement `core::fmt::Debug`.
