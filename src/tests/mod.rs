mod test_slave;

use crate::transport::{ByteSink, ByteSource, DigitalOutput, Transport};
use crate::{ErrorKind, RequestBuf};
use crc16::{State, MODBUS};
use std::collections::VecDeque;

/// In-memory serial link: `rx` is what the master sent, `tx` is what the slave answered
#[derive(Default)]
pub struct MemoryTransport {
    pub rx: VecDeque<u8>,
    pub tx: Vec<u8>,
    pub baud_rate: Option<u32>,
    pub fail_writes: bool,
}

impl MemoryTransport {
    pub fn feed(&mut self, data: &[u8]) {
        self.rx.extend(data);
    }
}

impl ByteSource for MemoryTransport {
    fn available(&self) -> usize {
        self.rx.len()
    }

    fn read_byte(&mut self) -> Result<u8, ErrorKind> {
        self.rx.pop_front().ok_or(ErrorKind::CommunicationError)
    }
}

impl ByteSink for MemoryTransport {
    fn write(&mut self, data: &[u8]) -> Result<(), ErrorKind> {
        if self.fail_writes {
            return Err(ErrorKind::CommunicationError);
        }
        self.tx.extend_from_slice(data);
        Ok(())
    }
}

impl Transport for MemoryTransport {
    fn reconfigure(&mut self, baud_rate: u32) -> Result<(), ErrorKind> {
        self.baud_rate = Some(baud_rate);
        Ok(())
    }
}

/// Records every pin change
#[derive(Default)]
pub struct RecordingOutput {
    pub history: Vec<(u8, bool)>,
}

impl RecordingOutput {
    pub fn last(&self) -> Option<(u8, bool)> {
        self.history.last().copied()
    }
}

impl DigitalOutput for RecordingOutput {
    fn set(&mut self, pin: u8, active: bool) {
        self.history.push((pin, active));
    }
}

/// Build an RTU request, the CRC comes from the crc16 crate
pub fn gen_rtu_frame(data: &[u8; 6]) -> RequestBuf {
    let mut frame: RequestBuf = [0; 8];
    frame[..6].copy_from_slice(data);
    let c = State::<MODBUS>::calculate(data).to_le_bytes();
    frame[6] = c[0];
    frame[7] = c[1];
    frame
}

/// Split a response into payload and CRC, checking the CRC on the way
pub fn check_rtu_response(result: &[u8], payload: &[u8]) {
    assert!(result.len() > 2, "response too short: {:x?}", result);
    let (r, crc) = result.split_at(result.len() - 2);
    assert_eq!(r, payload);
    assert_eq!(
        u16::from_le_bytes([crc[0], crc[1]]),
        State::<MODBUS>::calculate(r)
    );
}
