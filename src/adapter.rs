// src/adapter.rs

//! Adapter from `embedded-hal-nb` serial traits to [`Tes902Serial`].
//!
//! Lets any HAL UART implementing the standard non-blocking serial traits
//! drive the sensor without a hand-written transport impl. The UART must
//! already be configured for 9600 baud 8N1 (`common::timing::BAUD_RATE`).

use crate::common::hal_traits::Tes902Serial;
use embedded_hal_nb::serial::{ErrorType, Read, Write};

/// Wraps a HAL UART as a TES902 transport.
pub struct GenericHalAdapter<U> {
    uart: U,
}

impl<U> GenericHalAdapter<U> {
    pub fn new(uart: U) -> Self {
        GenericHalAdapter { uart }
    }

    /// Returns the wrapped UART.
    pub fn release(self) -> U {
        self.uart
    }
}

impl<U> Tes902Serial for GenericHalAdapter<U>
where
    U: Read<u8> + Write<u8>,
{
    type Error = <U as ErrorType>::Error;

    fn read_byte(&mut self) -> nb::Result<u8, Self::Error> {
        self.uart.read()
    }

    fn write_byte(&mut self, byte: u8) -> nb::Result<(), Self::Error> {
        self.uart.write(byte)
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        self.uart.flush()
    }
}
