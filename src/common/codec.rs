// src/common/codec.rs

//! TES902 frame construction and parsing.
//!
//! Both directions share one layout:
//!
//! ```text
//! 0xBB 0x66 <type> <len> <data[len]> <crc_lo> <crc_hi>
//! ```
//!
//! The CRC (see `common::crc`) covers every byte from the first sync byte to
//! the last data byte. The CO2 measurement report is type `0x15` and carries
//! the concentration as an unsigned 16-bit little-endian value in the first
//! two data bytes; the remaining data bytes are reserved.

use arrayvec::ArrayVec;
use core::fmt::Debug;

use super::crc::{append_crc, calculate_crc16, verify_frame_crc};
use super::error::{FrameError, Tes902Error};

/// First sync byte of every frame.
pub const SYNC1: u8 = 0xBB;
/// Second sync byte of every frame.
pub const SYNC2: u8 = 0x66;
/// Frame type of the CO2 read command and the CO2 measurement report.
pub const TYPE_CO2: u8 = 0x15;

/// Sync bytes + type byte + length byte.
pub const HEADER_LEN: usize = 4;
/// Trailing CRC bytes.
pub const CRC_LEN: usize = 2;
/// Largest frame the sensor emits.
pub const MAX_FRAME_LEN: usize = 10;
/// Largest data payload that fits in a frame.
pub const MAX_DATA_LEN: usize = MAX_FRAME_LEN - HEADER_LEN - CRC_LEN;
/// The read command carries no data bytes.
pub const REQUEST_FRAME_LEN: usize = HEADER_LEN + CRC_LEN;

/// Data bytes in a full CO2 report (concentration + reserved).
pub const CO2_REPORT_DATA_LEN: usize = 4;
/// Upper bound of the TES902 measuring range in ppm.
pub const CO2_PPM_MAX: u16 = 5000;

/// Builds the fixed read-CO2 command frame: `BB 66 15 00 CA 4F`.
///
/// Deterministic and pure; the CRC is computed over the 4 header bytes.
pub fn encode_request() -> [u8; REQUEST_FRAME_LEN] {
    let mut frame = [SYNC1, SYNC2, TYPE_CO2, 0x00, 0x00, 0x00];
    let crc = calculate_crc16(&frame[..HEADER_LEN]);
    frame[HEADER_LEN..].copy_from_slice(&append_crc(crc));
    frame
}

/// Builds a sensor-conformant CO2 measurement report for the given
/// concentration.
///
/// This is the sensor side of the protocol; the driver never sends it. It
/// exists for round-trip verification and for bus simulators.
pub fn encode_co2_response(ppm: u16) -> ArrayVec<u8, MAX_FRAME_LEN> {
    let mut frame: ArrayVec<u8, MAX_FRAME_LEN> = ArrayVec::new();
    frame.push(SYNC1);
    frame.push(SYNC2);
    frame.push(TYPE_CO2);
    frame.push(CO2_REPORT_DATA_LEN as u8);
    let ppm_bytes = ppm.to_le_bytes();
    frame.push(ppm_bytes[0]);
    frame.push(ppm_bytes[1]);
    // Reserved data bytes.
    frame.push(0x00);
    frame.push(0x00);
    let crc = calculate_crc16(&frame);
    for byte in append_crc(crc) {
        frame.push(byte);
    }
    frame
}

/// Decodes a complete raw frame into a CO2 concentration in ppm.
///
/// Validation order: structure (length, sync bytes, length byte), then CRC,
/// then frame type, then range. No value is returned unless every check
/// passed; a single corrupted byte of a valid frame always surfaces as an
/// error rather than a plausible-looking reading.
///
/// # Arguments
///
/// * `bytes`: One complete frame, from the first sync byte through both CRC
///   bytes.
///
/// # Returns
///
/// The CO2 concentration in ppm, or the first validation failure.
pub fn decode_response<E>(bytes: &[u8]) -> Result<u16, Tes902Error<E>>
where
    E: Debug,
{
    if bytes.len() < HEADER_LEN + CRC_LEN {
        return Err(Tes902Error::Frame(FrameError::TooShort { len: bytes.len() }));
    }
    if bytes[0] != SYNC1 || bytes[1] != SYNC2 {
        return Err(Tes902Error::Frame(FrameError::BadSync));
    }

    let declared = bytes[3] as usize;
    if declared > MAX_DATA_LEN {
        return Err(Tes902Error::Frame(FrameError::Oversize { len: declared }));
    }
    let actual = bytes.len() - HEADER_LEN - CRC_LEN;
    if declared != actual {
        return Err(Tes902Error::Frame(FrameError::LengthMismatch { declared, actual }));
    }

    // CRC before interpreting type or payload, so every later field is
    // already integrity-checked.
    verify_frame_crc(bytes)?;

    let frame_type = bytes[2];
    if frame_type != TYPE_CO2 {
        return Err(Tes902Error::Frame(FrameError::UnexpectedType(frame_type)));
    }
    if declared < 2 {
        return Err(Tes902Error::Frame(FrameError::TruncatedPayload { len: declared }));
    }

    let ppm = u16::from_le_bytes([bytes[HEADER_LEN], bytes[HEADER_LEN + 1]]);
    if ppm > CO2_PPM_MAX {
        return Err(Tes902Error::OutOfRange(ppm));
    }
    Ok(ppm)
}

/// One complete raw frame as assembled by the [`Deframer`].
///
/// Owned copy so the deframer can start on the next frame immediately;
/// invalidated (dropped) after decoding.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    buf: [u8; MAX_FRAME_LEN],
    len: usize,
}

impl ResponseFrame {
    /// The raw frame bytes, sync through CRC.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Decodes the frame into a CO2 concentration. See [`decode_response`].
    pub fn decode<E: Debug>(&self) -> Result<u16, Tes902Error<E>> {
        decode_response(self.as_bytes())
    }
}

/// Byte-at-a-time frame assembler for the receive path.
///
/// Mirrors the sensor's framing: noise before the sync sequence is skipped,
/// an impossible length byte aborts the frame immediately, and a completed
/// frame is handed back raw. CRC verification is deliberately left to
/// [`decode_response`] so a corrupted frame surfaces as a checksum fault
/// instead of a silent resync.
#[derive(Debug)]
pub struct Deframer {
    state: DeframeState,
    buf: ArrayVec<u8, MAX_FRAME_LEN>,
    remaining: usize,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum DeframeState {
    /// Waiting for 0xBB.
    WaitSync1,
    /// Waiting for 0x66 after 0xBB.
    WaitSync2,
    /// Waiting for the response type byte.
    WaitType,
    /// Waiting for the length byte.
    WaitLength,
    /// Collecting data bytes based on length.
    WaitData,
    /// Waiting for the first (low) CRC byte.
    WaitCrcLow,
    /// Waiting for the second (high) CRC byte.
    WaitCrcHigh,
}

impl Deframer {
    pub fn new() -> Self {
        Deframer {
            state: DeframeState::WaitSync1,
            buf: ArrayVec::new(),
            remaining: 0,
        }
    }

    /// Discards any partial frame and waits for the next sync sequence.
    pub fn reset(&mut self) {
        self.state = DeframeState::WaitSync1;
        self.buf.clear();
        self.remaining = 0;
    }

    /// Feeds one received byte into the assembler.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(frame))` when the byte completed a frame.
    /// * `Ok(None)` while a frame is still being collected (or noise skipped).
    /// * `Err(FrameError::Oversize)` if the length byte cannot fit a frame;
    ///   the assembler has reset itself and will hunt for the next sync.
    pub fn push(&mut self, byte: u8) -> Result<Option<ResponseFrame>, FrameError> {
        match self.state {
            DeframeState::WaitSync1 => {
                if byte == SYNC1 {
                    self.buf.clear();
                    self.buf.push(byte);
                    self.state = DeframeState::WaitSync2;
                }
                // Anything else before the sync byte is line noise.
            }
            DeframeState::WaitSync2 => {
                if byte == SYNC2 {
                    self.buf.push(byte);
                    self.state = DeframeState::WaitType;
                } else {
                    // Start over if the second sync byte is incorrect.
                    self.reset();
                }
            }
            DeframeState::WaitType => {
                self.buf.push(byte);
                self.state = DeframeState::WaitLength;
            }
            DeframeState::WaitLength => {
                let len = byte as usize;
                if len > MAX_DATA_LEN {
                    self.reset();
                    return Err(FrameError::Oversize { len });
                }
                self.buf.push(byte);
                self.remaining = len;
                self.state = if len > 0 {
                    DeframeState::WaitData
                } else {
                    DeframeState::WaitCrcLow
                };
            }
            DeframeState::WaitData => {
                self.buf.push(byte);
                self.remaining -= 1;
                if self.remaining == 0 {
                    self.state = DeframeState::WaitCrcLow;
                }
            }
            DeframeState::WaitCrcLow => {
                self.buf.push(byte);
                self.state = DeframeState::WaitCrcHigh;
            }
            DeframeState::WaitCrcHigh => {
                self.buf.push(byte);
                let mut frame = ResponseFrame { buf: [0u8; MAX_FRAME_LEN], len: self.buf.len() };
                frame.buf[..self.buf.len()].copy_from_slice(&self.buf);
                self.reset();
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }
}

impl Default for Deframer {
    fn default() -> Self {
        Self::new()
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    // Mock error type for the decode generic parameter
    #[derive(Debug, Clone, PartialEq, Eq)]
    struct MockIoError;

    // Known-good report for 600 ppm, CRC computed per the sensor's algorithm.
    const REPORT_600: [u8; 10] = [0xBB, 0x66, 0x15, 0x04, 0x58, 0x02, 0x00, 0x00, 0x4D, 0x6F];

    #[test]
    fn test_encode_request_known_answer() {
        assert_eq!(encode_request(), [0xBB, 0x66, 0x15, 0x00, 0xCA, 0x4F]);
    }

    #[test]
    fn test_encode_co2_response_known_answer() {
        assert_eq!(encode_co2_response(600).as_slice(), &REPORT_600);
        assert_eq!(
            encode_co2_response(1234).as_slice(),
            &[0xBB, 0x66, 0x15, 0x04, 0xD2, 0x04, 0x00, 0x00, 0x87, 0x76]
        );
    }

    #[test]
    fn test_decode_known_answer() {
        assert_eq!(decode_response::<MockIoError>(&REPORT_600).unwrap(), 600);
    }

    #[test]
    fn test_decode_is_deterministic() {
        let first = decode_response::<MockIoError>(&REPORT_600).unwrap();
        let second = decode_response::<MockIoError>(&REPORT_600).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        for ppm in [0u16, 1, 399, 400, 600, 1234, 2500, 4999, 5000] {
            let frame = encode_co2_response(ppm);
            assert_eq!(
                decode_response::<MockIoError>(&frame).unwrap(),
                ppm,
                "roundtrip failed for {} ppm",
                ppm
            );
        }
    }

    #[test]
    fn test_decode_out_of_range() {
        for ppm in [5001u16, 10_000, u16::MAX] {
            let frame = encode_co2_response(ppm);
            assert!(matches!(
                decode_response::<MockIoError>(&frame),
                Err(Tes902Error::OutOfRange(v)) if v == ppm
            ));
        }
    }

    #[test]
    fn test_decode_minimal_report() {
        // A report carrying only the concentration field is still valid.
        let frame = [0xBB, 0x66, 0x15, 0x02, 0x58, 0x02, 0x0C, 0x95];
        assert_eq!(decode_response::<MockIoError>(&frame).unwrap(), 600);
    }

    #[test]
    fn test_decode_rejects_short_buffers() {
        assert!(matches!(
            decode_response::<MockIoError>(b""),
            Err(Tes902Error::Frame(FrameError::TooShort { len: 0 }))
        ));
        assert!(matches!(
            decode_response::<MockIoError>(&REPORT_600[..5]),
            Err(Tes902Error::Frame(FrameError::TooShort { len: 5 }))
        ));
    }

    #[test]
    fn test_decode_rejects_bad_sync() {
        let mut frame = REPORT_600;
        frame[0] = 0xAA;
        assert!(matches!(
            decode_response::<MockIoError>(&frame),
            Err(Tes902Error::Frame(FrameError::BadSync))
        ));
    }

    #[test]
    fn test_decode_rejects_length_mismatch() {
        // Truncating a valid frame leaves the length byte disagreeing with
        // the actual payload.
        assert!(matches!(
            decode_response::<MockIoError>(&REPORT_600[..9]),
            Err(Tes902Error::Frame(FrameError::LengthMismatch { declared: 4, actual: 3 }))
        ));
    }

    #[test]
    fn test_decode_rejects_wrong_type() {
        // Valid CRC, but type 0x22 is not a CO2 report.
        let frame = [0xBB, 0x66, 0x22, 0x04, 0x58, 0x02, 0x00, 0x00, 0x49, 0x28];
        assert!(matches!(
            decode_response::<MockIoError>(&frame),
            Err(Tes902Error::Frame(FrameError::UnexpectedType(0x22)))
        ));
    }

    #[test]
    fn test_decode_rejects_empty_payload() {
        // The read command itself (zero data bytes) is not a report.
        let frame = encode_request();
        assert!(matches!(
            decode_response::<MockIoError>(&frame),
            Err(Tes902Error::Frame(FrameError::TruncatedPayload { len: 0 }))
        ));
    }

    #[test]
    fn test_decode_rejects_bad_crc() {
        let mut frame = REPORT_600;
        frame[8] ^= 0x01;
        assert!(matches!(
            decode_response::<MockIoError>(&frame),
            Err(Tes902Error::CrcMismatch { .. })
        ));
    }

    #[test]
    fn test_single_byte_corruption_never_decodes() {
        // Corrupting any single byte of a valid frame must fail decode; a
        // wrong-but-plausible reading must never come back.
        for idx in 0..REPORT_600.len() {
            let mut frame = REPORT_600;
            frame[idx] ^= 0xFF;
            assert!(
                decode_response::<MockIoError>(&frame).is_err(),
                "corruption at byte {} decoded successfully",
                idx
            );
        }
    }

    // --- Deframer tests ---

    fn feed(deframer: &mut Deframer, bytes: &[u8]) -> Option<ResponseFrame> {
        let mut out = None;
        for &b in bytes {
            if let Some(frame) = deframer.push(b).unwrap() {
                assert!(out.is_none(), "more than one frame from fixture");
                out = Some(frame);
            }
        }
        out
    }

    #[test]
    fn test_deframer_assembles_whole_frame() {
        let mut deframer = Deframer::new();
        let frame = feed(&mut deframer, &REPORT_600).expect("no frame assembled");
        assert_eq!(frame.as_bytes(), &REPORT_600);
        assert_eq!(frame.decode::<MockIoError>().unwrap(), 600);
    }

    #[test]
    fn test_deframer_skips_leading_noise() {
        let mut deframer = Deframer::new();
        assert!(feed(&mut deframer, &[0x00, 0x17, 0xFE]).is_none());
        let frame = feed(&mut deframer, &REPORT_600).expect("no frame after noise");
        assert_eq!(frame.as_bytes(), &REPORT_600);
    }

    #[test]
    fn test_deframer_resyncs_after_false_sync() {
        // 0xBB followed by a non-sync byte must not poison the next frame.
        let mut deframer = Deframer::new();
        assert!(feed(&mut deframer, &[SYNC1, 0x00]).is_none());
        let frame = feed(&mut deframer, &REPORT_600).expect("no frame after false sync");
        assert_eq!(frame.as_bytes(), &REPORT_600);
    }

    #[test]
    fn test_deframer_rejects_oversize_length() {
        let mut deframer = Deframer::new();
        assert!(deframer.push(SYNC1).unwrap().is_none());
        assert!(deframer.push(SYNC2).unwrap().is_none());
        assert!(deframer.push(TYPE_CO2).unwrap().is_none());
        assert_eq!(deframer.push(0xFF), Err(FrameError::Oversize { len: 255 }));

        // The assembler reset itself; a following valid frame still parses.
        let frame = feed(&mut deframer, &REPORT_600).expect("no frame after oversize abort");
        assert_eq!(frame.as_bytes(), &REPORT_600);
    }

    #[test]
    fn test_deframer_handles_zero_length_frame() {
        let mut deframer = Deframer::new();
        let request = encode_request();
        let frame = feed(&mut deframer, &request).expect("zero-length frame not assembled");
        assert_eq!(frame.as_bytes(), &request);
    }

    #[test]
    fn test_deframer_back_to_back_frames() {
        let mut deframer = Deframer::new();
        let first = feed(&mut deframer, &REPORT_600).expect("first frame missing");
        let second_fixture = encode_co2_response(1234);
        let second = feed(&mut deframer, &second_fixture).expect("second frame missing");
        assert_eq!(first.decode::<MockIoError>().unwrap(), 600);
        assert_eq!(second.decode::<MockIoError>().unwrap(), 1234);
    }

    #[test]
    fn test_deframer_passes_corrupt_frame_to_decode() {
        // A structurally complete frame with a bad CRC is still yielded, so
        // the caller sees a checksum fault rather than a timeout.
        let mut bytes = REPORT_600;
        bytes[5] ^= 0x10;
        let mut deframer = Deframer::new();
        let frame = feed(&mut deframer, &bytes).expect("corrupt frame not yielded");
        assert!(matches!(
            frame.decode::<MockIoError>(),
            Err(Tes902Error::CrcMismatch { .. })
        ));
    }
}
