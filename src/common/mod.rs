// src/common/mod.rs

// --- Declare all public modules within common ---
pub mod codec;
pub mod config;
pub mod crc;
pub mod error;
pub mod hal_traits;
pub mod timing;

// --- Re-export key types/traits/functions for easier access ---

// From codec.rs
pub use codec::{
    decode_response, encode_co2_response, encode_request, Deframer, ResponseFrame,
    MAX_DATA_LEN, MAX_FRAME_LEN, REQUEST_FRAME_LEN,
};

// From config.rs
pub use config::{ConfigError, DriverConfig};

// From crc.rs
pub use crc::{append_crc, calculate_crc16, verify_frame_crc};

// From error.rs
pub use error::{FrameError, Tes902Error};

// From hal_traits.rs
pub use hal_traits::{Tes902Clock, Tes902Instant, Tes902Serial};

// From timing.rs (constants - users can access via common::timing::*)
// No re-exports by default.
