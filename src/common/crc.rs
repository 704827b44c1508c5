// src/common/crc.rs

use super::error::Tes902Error;
use crc::{Algorithm, Crc};

/// CRC algorithm used by the TES902 wire protocol (CRC-16/MODBUS).
/// Polynomial: 0x8005 (normal representation of 0xA001 reflected)
/// Initial Value: 0xFFFF
/// Input Reflected: true
/// Output Reflected: true
/// Final XOR: 0x0000
/// Check Value: 0x4B37 (for "123456789")
pub const TES902_CRC: Algorithm<u16> = Algorithm {
    poly: 0x8005,
    init: 0xFFFF,
    refin: true,
    refout: true,
    xorout: 0x0000,
    check: 0x4B37,
    width: 16,
    residue: 0x0000,
};

// Create a Crc instance for the TES902 algorithm for reuse.
const CRC_COMPUTER: Crc<u16> = Crc::<u16>::new(&TES902_CRC);

/// Calculates the TES902 CRC-16 (CRC-16/MODBUS) for the given data buffer.
///
/// The sensor computes its CRC over every frame byte from the first sync
/// byte up to the last data byte; the two CRC bytes themselves are excluded.
///
/// # Arguments
///
/// * `data`: A slice of bytes for which to calculate the CRC.
///
/// # Returns
///
/// The calculated 16-bit CRC value.
#[inline]
pub fn calculate_crc16(data: &[u8]) -> u16 {
    CRC_COMPUTER.checksum(data)
}

/// Encodes a 16-bit CRC value into the two trailing frame bytes (LSB first).
pub fn append_crc(crc_value: u16) -> [u8; 2] {
    crc_value.to_le_bytes()
}

/// Decodes the two trailing frame bytes (LSB first) into a 16-bit CRC value.
///
/// # Panics
///
/// Panics if `crc_bytes` does not have a length of exactly 2.
pub fn decode_crc(crc_bytes: &[u8]) -> u16 {
    assert_eq!(crc_bytes.len(), 2, "frame CRC must be 2 bytes long");
    u16::from_le_bytes([crc_bytes[0], crc_bytes[1]])
}

/// Verifies a complete TES902 frame including its trailing CRC bytes.
///
/// Assumes the buffer starts at the first sync byte and ends with the 2 raw
/// CRC bytes.
///
/// # Returns
///
/// * `Ok(())` if the CRC is valid.
/// * `Err(Tes902Error::Frame(..))` if the buffer is too short to hold a CRC.
/// * `Err(Tes902Error::CrcMismatch)` if the CRCs don't match.
pub fn verify_frame_crc<E>(frame_with_crc: &[u8]) -> Result<(), Tes902Error<E>>
where
    E: core::fmt::Debug,
{
    if frame_with_crc.len() < 2 {
        return Err(Tes902Error::Frame(super::error::FrameError::TooShort {
            len: frame_with_crc.len(),
        }));
    }
    let data_len = frame_with_crc.len() - 2;
    let data_part = &frame_with_crc[..data_len];
    let received_crc_bytes = &frame_with_crc[data_len..];

    let calculated_crc = calculate_crc16(data_part);
    let received_crc = decode_crc(received_crc_bytes);

    if calculated_crc == received_crc {
        Ok(())
    } else {
        Err(Tes902Error::CrcMismatch { expected: received_crc, calculated: calculated_crc })
    }
}
