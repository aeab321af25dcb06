#![ doc = include_str!( concat!( env!( "CARGO_MANIFEST_DIR" ), "/", "README.md" ) ) ]
#![cfg_attr(not(any(feature = "std", test)), no_std)]

pub mod client;
pub mod consts;
pub mod server;
pub mod slave;
pub mod transport;

mod vector;
pub use vector::VectorTrait;

mod error;
pub use error::ErrorKind;

pub use slave::{Slave, SlaveConfig, TickEvent};

#[cfg(test)]
mod tests;

/// Raw RTU request frame
///
/// Both supported functions use a fixed 8-byte request: unit id, function, two big-endian
/// parameters and a little-endian CRC16.
pub type RequestBuf = [u8; consts::REQUEST_FRAME_LEN];

/// Response frame buffer
///
/// The largest RTU frame is 256 bytes, so the response never needs more room than that.
pub type ResponseBuf = heapless::Vec<u8, { consts::RESPONSE_BUF_CAPACITY }>;

/// Calculate Modbus CRC16 over the first `data_length` bytes of `frame`
///
/// Seed 0xFFFF, reflected polynomial 0xA001. If `frame` is shorter than `data_length`, only the
/// available bytes are used.
pub fn calc_crc16(frame: &[u8], data_length: usize) -> u16 {
    let mut crc: u16 = 0xffff;
    for i in frame.iter().take(data_length) {
        crc ^= u16::from(*i);
        for _ in 0..8 {
            if (crc & 0x0001) == 0 {
                crc >>= 1;
            } else {
                crc >>= 1;
                crc ^= 0xA001;
            }
        }
    }
    crc
}

/// Verify the CRC16 stored right after `frame[..data_length]`
///
/// The checksum is read little-endian from `frame[data_length]` and `frame[data_length + 1]`.
/// Returns false if those two bytes are not present.
pub fn check_crc16(frame: &[u8], data_length: usize) -> bool {
    match (frame.get(data_length), frame.get(data_length + 1)) {
        (Some(lo), Some(hi)) => {
            calc_crc16(frame, data_length) == u16::from_le_bytes([*lo, *hi])
        }
        _ => false,
    }
}
