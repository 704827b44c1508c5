// src/driver/mod.rs

// Declare the fault-handling sub-module
pub mod fault;

// Re-export the fault-handling types
pub use fault::{FaultKind, FaultMonitor, SensorStatus};

use core::fmt::Debug;
use core::time::Duration;

use crate::common::{
    codec::{encode_request, Deframer, ResponseFrame},
    config::{ConfigError, DriverConfig},
    error::Tes902Error,
    hal_traits::{Tes902Clock, Tes902Serial},
    timing,
};
use nb::Result as NbResult;

/// A single decoded CO2 reading.
///
/// Immutable once created; handed to the publish sink and then discarded.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Measurement<I> {
    /// CO2 concentration in parts per million.
    pub co2_ppm: u16,
    /// Monotonic timestamp of acquisition.
    pub timestamp: I,
}

/// Host-supplied capability receiving validated measurements.
///
/// The driver knows nothing about what sits behind it (telemetry bus,
/// display, datastore); `publish` is the entire downstream surface.
pub trait Co2Sink<I> {
    fn publish(&mut self, measurement: Measurement<I>);
}

/// Poll-cycle phase. Externally the driver is always observed `Idle`: a tick
/// passes through the other phases and returns to `Idle` before yielding,
/// success or failure.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PollState {
    Idle,
    Requesting,
    AwaitingResponse,
    Decoding,
}

/// Polling driver for the TES902 CO2 sensor.
///
/// Owns the serial channel exclusively, a monotonic clock, and the publish
/// sink. The host scheduler invokes [`on_poll_tick`](Self::on_poll_tick) at
/// the configured interval; a tick performs at most one request/response
/// exchange and never blocks past the configured receive timeout. Faults are
/// handled internally: a failed exchange suppresses the reading, is recorded
/// by the [`FaultMonitor`], and the cycle retries on the next tick.
#[derive(Debug)]
pub struct Tes902Driver<IF, C, S>
where
    IF: Tes902Serial,
    C: Tes902Clock,
    S: Co2Sink<C::Instant>,
{
    interface: IF,
    clock: C,
    sink: S,
    config: DriverConfig,
    faults: FaultMonitor,
    state: PollState,
}

impl<IF, C, S> Tes902Driver<IF, C, S>
where
    IF: Tes902Serial,
    C: Tes902Clock,
    S: Co2Sink<C::Instant>,
{
    /// Creates a driver from its collaborators and a validated config.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] if the configuration is internally
    /// inconsistent (see [`DriverConfig::validate`]).
    pub fn new(interface: IF, clock: C, sink: S, config: DriverConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Tes902Driver {
            interface,
            clock,
            sink,
            faults: FaultMonitor::new(config.unavailable_threshold),
            config,
            state: PollState::Idle,
        })
    }

    /// Host scheduling callback, to be invoked every `config.poll_interval`.
    ///
    /// Runs one full exchange: request, response, decode, publish. Errors are
    /// internal; they suppress the reading, update the fault monitor and
    /// leave the driver `Idle` for the next tick.
    pub fn on_poll_tick(&mut self) {
        if !self.config.co2_enabled {
            return;
        }
        debug_assert_eq!(self.state, PollState::Idle, "tick while exchange outstanding");

        match self.execute_exchange() {
            Ok(measurement) => {
                self.faults.record_success();
                #[cfg(feature = "log")]
                log::trace!("tes902: {} ppm CO2", measurement.co2_ppm);
                self.sink.publish(measurement);
            }
            Err(err) => {
                let kind = FaultKind::classify(&err);
                #[cfg(feature = "log")]
                log::warn!("tes902: exchange failed ({:?}): {:?}", kind, err);
                let crossed_threshold = self.faults.record_failure(kind);
                if crossed_threshold {
                    #[cfg(feature = "log")]
                    log::error!(
                        "tes902: sensor unavailable after {} consecutive failures",
                        self.faults.consecutive_failures()
                    );
                }
            }
        }

        self.state = PollState::Idle;
    }

    /// Current poll-cycle phase (always `Idle` between ticks).
    pub fn state(&self) -> PollState {
        self.state
    }

    /// Availability derived from the recent failure run.
    pub fn status(&self) -> SensorStatus {
        self.faults.status()
    }

    /// Fault recorded by the most recent tick, if it failed.
    pub fn last_fault(&self) -> Option<FaultKind> {
        self.faults.last_fault()
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Tears the driver down, returning its collaborators to the owner.
    ///
    /// Best effort: lets any in-flight response bytes drain (bounded by
    /// `timing::TEARDOWN_DRAIN_TIMEOUT`) so the channel is handed back
    /// without a partial frame mid-wire.
    pub fn release(mut self) -> (IF, C, S) {
        let hard_deadline = self.clock.now() + timing::TEARDOWN_DRAIN_TIMEOUT;
        let mut quiet_deadline = self.clock.now() + timing::BYTE_DURATION * 2;
        loop {
            match self.interface.read_byte() {
                Ok(_) => {
                    // Byte still arriving; extend the quiet window.
                    quiet_deadline = self.clock.now() + timing::BYTE_DURATION * 2;
                }
                Err(nb::Error::WouldBlock) => {
                    let now = self.clock.now();
                    if now >= quiet_deadline || now >= hard_deadline {
                        break;
                    }
                    self.clock.delay_us(timing::IO_POLL_DELAY_US);
                }
                Err(nb::Error::Other(_)) => break,
            }
        }
        (self.interface, self.clock, self.sink)
    }

    // --- Core Exchange Logic (Private Helpers) ---

    fn execute_exchange(&mut self) -> Result<Measurement<C::Instant>, Tes902Error<IF::Error>> {
        self.state = PollState::Requesting;
        self.drain_stale_bytes()?;
        self.send_request()?;

        self.state = PollState::AwaitingResponse;
        let frame = self.read_response_frame()?;

        self.state = PollState::Decoding;
        let co2_ppm = frame.decode::<IF::Error>()?;
        Ok(Measurement { co2_ppm, timestamp: self.clock.now() })
    }

    /// Discards bytes left over from a previous cycle, so the deframer only
    /// sees the response to the request sent this tick.
    fn drain_stale_bytes(&mut self) -> Result<(), Tes902Error<IF::Error>> {
        loop {
            match self.interface.read_byte() {
                Ok(_) => continue,
                Err(nb::Error::WouldBlock) => return Ok(()),
                Err(nb::Error::Other(e)) => return Err(Tes902Error::Io(e)),
            }
        }
    }

    fn send_request(&mut self) -> Result<(), Tes902Error<IF::Error>> {
        let frame = encode_request();

        let write_duration = timing::BYTE_DURATION * frame.len() as u32;
        let write_timeout = write_duration + Duration::from_millis(20);
        for byte in frame {
            self.blocking_io(write_timeout, |iface| iface.write_byte(byte))?;
        }

        let flush_timeout = Duration::from_millis(10);
        self.blocking_io(flush_timeout, |iface| iface.flush())?;

        Ok(())
    }

    fn read_response_frame(&mut self) -> Result<ResponseFrame, Tes902Error<IF::Error>> {
        let deadline = self.clock.now() + self.config.response_timeout;
        let mut deframer = Deframer::new();

        loop {
            match self.interface.read_byte() {
                Ok(byte) => match deframer.push(byte) {
                    Ok(Some(frame)) => return Ok(frame),
                    Ok(None) => {}
                    Err(e) => return Err(Tes902Error::Frame(e)),
                },
                Err(nb::Error::WouldBlock) => {
                    if self.clock.now() >= deadline {
                        return Err(Tes902Error::Timeout);
                    }
                    self.clock.delay_us(timing::IO_POLL_DELAY_US);
                }
                Err(nb::Error::Other(e)) => return Err(Tes902Error::Io(e)),
            }
        }
    }

    // --- Timeout Helper ---
    fn blocking_io<FN, T>(
        &mut self,
        timeout: Duration,
        mut f: FN,
    ) -> Result<T, Tes902Error<IF::Error>>
    where
        FN: FnMut(&mut IF) -> NbResult<T, IF::Error>,
    {
        let deadline = self.clock.now() + timeout;

        loop {
            match f(&mut self.interface) {
                Ok(result) => return Ok(result),
                Err(nb::Error::WouldBlock) => {
                    if self.clock.now() >= deadline {
                        return Err(Tes902Error::Timeout);
                    }
                    self.clock.delay_us(timing::IO_POLL_DELAY_US);
                }
                Err(nb::Error::Other(e)) => return Err(Tes902Error::Io(e)),
            }
        }
    }
}
