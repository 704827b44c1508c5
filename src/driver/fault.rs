// src/driver/fault.rs

use core::fmt::Debug;

use crate::common::error::Tes902Error;

/// Coarse classification of a failed exchange.
///
/// Every kind suppresses publication of the poll cycle's value; none of them
/// escalates past the driver from a single occurrence.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FaultKind {
    /// No complete response within the receive timeout.
    Timeout,
    /// Response bytes did not form a valid frame.
    Framing,
    /// Frame arrived intact-looking but failed the CRC.
    Checksum,
    /// Decoded concentration outside the sensor's measuring range.
    OutOfRange,
    /// The serial channel itself reported an error.
    ChannelFailure,
}

impl FaultKind {
    /// Maps a driver error onto its fault class.
    pub fn classify<E: Debug>(error: &Tes902Error<E>) -> Self {
        match error {
            Tes902Error::Io(_) => FaultKind::ChannelFailure,
            Tes902Error::Timeout => FaultKind::Timeout,
            Tes902Error::Frame(_) => FaultKind::Framing,
            Tes902Error::CrcMismatch { .. } => FaultKind::Checksum,
            Tes902Error::OutOfRange(_) => FaultKind::OutOfRange,
        }
    }
}

/// Reported availability of the sensor, derived from recent exchanges.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SensorStatus {
    /// Readings are flowing, or failures have not yet reached the threshold.
    Online,
    /// Sustained failure; the owning system should treat the sensor as gone
    /// rather than crash on it.
    Unavailable,
}

/// Tracks consecutive exchange failures and derives [`SensorStatus`].
///
/// A single bad read never changes the status; only an unbroken run of
/// failures reaching the configured threshold does. Any success resets the
/// run.
#[derive(Debug)]
pub struct FaultMonitor {
    threshold: u32,
    consecutive_failures: u32,
    last_fault: Option<FaultKind>,
}

impl FaultMonitor {
    pub fn new(threshold: u32) -> Self {
        FaultMonitor {
            threshold,
            consecutive_failures: 0,
            last_fault: None,
        }
    }

    /// Records a successful exchange, ending any failure run.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.last_fault = None;
    }

    /// Records a failed exchange. Returns `true` if this failure crossed the
    /// threshold, i.e. the status just transitioned to `Unavailable`.
    pub fn record_failure(&mut self, kind: FaultKind) -> bool {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_fault = Some(kind);
        self.consecutive_failures == self.threshold
    }

    /// Current availability, as seen by the owning system.
    pub fn status(&self) -> SensorStatus {
        if self.consecutive_failures >= self.threshold {
            SensorStatus::Unavailable
        } else {
            SensorStatus::Online
        }
    }

    /// The most recent fault kind, if the last exchange failed.
    pub fn last_fault(&self) -> Option<FaultKind> {
        self.last_fault
    }

    /// Length of the current unbroken failure run.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}
