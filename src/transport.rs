//! Collaborator interfaces the slave engine is wired to
//!
//! The engine never opens ports or touches pins itself, everything goes through these traits so
//! it runs the same on a microcontroller UART, a host serial port or an in-memory test double.

use crate::consts::REQUEST_FRAME_LEN;
use crate::{ErrorKind, RequestBuf};

/// Receive side of the serial link
pub trait ByteSource {
    /// Bytes buffered and ready to be read without waiting
    fn available(&self) -> usize;

    /// Read one buffered byte
    ///
    /// Only called when [`available`](ByteSource::available) reported enough bytes.
    fn read_byte(&mut self) -> Result<u8, ErrorKind>;
}

/// Transmit side of the serial link
pub trait ByteSink {
    fn write(&mut self, data: &[u8]) -> Result<(), ErrorKind>;
}

/// Full-duplex serial link with a configurable line speed (8-N-1 framing)
pub trait Transport: ByteSource + ByteSink {
    fn reconfigure(&mut self, baud_rate: u32) -> Result<(), ErrorKind>;
}

/// Binary output driven from the LED register
pub trait DigitalOutput {
    fn set(&mut self, pin: u8, active: bool);
}

/// Take one request frame off the source
///
/// Never waits: with less than a full frame buffered returns [`ErrorKind::FrameIncomplete`] and
/// leaves the buffered bytes in place.
pub fn read_request<S: ByteSource + ?Sized>(source: &mut S) -> Result<RequestBuf, ErrorKind> {
    if source.available() < REQUEST_FRAME_LEN {
        return Err(ErrorKind::FrameIncomplete);
    }
    let mut buf: RequestBuf = [0; REQUEST_FRAME_LEN];
    for b in &mut buf {
        *b = source.read_byte()?;
    }
    Ok(buf)
}

/// Discard everything buffered at call time, returns the number of bytes dropped
///
/// Bytes arriving while draining are left for the next call, so a chatty line cannot keep this
/// spinning.
pub fn drain<S: ByteSource + ?Sized>(source: &mut S) -> Result<usize, ErrorKind> {
    let pending = source.available();
    for _ in 0..pending {
        source.read_byte()?;
    }
    Ok(pending)
}
