pub mod context;
pub mod storage;

use crate::consts::{
    MAX_READ_COUNT, MODBUS_GET_HOLDINGS, MODBUS_SET_HOLDING, READ_RESPONSE_HEADER_LEN,
    REQUEST_FRAME_LEN, REQUEST_PAYLOAD_LEN,
};
use crate::{calc_crc16, check_crc16, ErrorKind, RequestBuf, VectorTrait};
use context::Context;

/// Validated request: function code plus the two big-endian parameters
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Request {
    pub func: u8,
    pub param_hi: u16,
    pub param_lo: u16,
}

impl Request {
    /// Decode a raw request frame addressed to `unit_id`
    ///
    /// Errors:
    ///
    /// * **AddressMismatch** the frame is for another slave
    /// * **CrcMismatch** bytes 6-7 do not match the CRC of bytes 0-5
    pub fn decode(unit_id: u8, buf: &RequestBuf) -> Result<Self, ErrorKind> {
        if buf[0] != unit_id {
            return Err(ErrorKind::AddressMismatch);
        }
        if !check_crc16(buf, REQUEST_PAYLOAD_LEN) {
            return Err(ErrorKind::CrcMismatch);
        }
        Ok(Self {
            func: buf[1],
            param_hi: u16::from_be_bytes([buf[2], buf[3]]),
            param_lo: u16::from_be_bytes([buf[4], buf[5]]),
        })
    }
}

/// Supported operations
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Operation {
    /// func 3
    ReadHoldings { reg: u16, count: u16 },
    /// func 6
    WriteHolding { reg: u16, value: u16 },
}

impl Operation {
    pub fn func(self) -> u8 {
        match self {
            Operation::ReadHoldings { .. } => MODBUS_GET_HOLDINGS,
            Operation::WriteHolding { .. } => MODBUS_SET_HOLDING,
        }
    }
}

impl TryFrom<Request> for Operation {
    type Error = ErrorKind;

    fn try_from(req: Request) -> Result<Self, Self::Error> {
        match req.func {
            MODBUS_GET_HOLDINGS => Ok(Operation::ReadHoldings {
                reg: req.param_hi,
                count: req.param_lo,
            }),
            MODBUS_SET_HOLDING => Ok(Operation::WriteHolding {
                reg: req.param_hi,
                value: req.param_lo,
            }),
            _ => Err(ErrorKind::UnsupportedFunction),
        }
    }
}

/// Modbus RTU request processor
///
/// ```no_run
/// use rtu_slave::{RequestBuf, ResponseBuf, server::{ModbusFrame, storage::RegisterStore}};
///
/// # fn code() -> Result<(), rtu_slave::ErrorKind> {
/// let mut ctx: RegisterStore = RegisterStore::new(10)?;
/// let unit_id = 1;
/// let framebuf: RequestBuf = [0; 8];
/// // read frame into the buffer
/// let mut response = ResponseBuf::new();
/// let mut frame = ModbusFrame::new(unit_id, &framebuf, &mut response);
/// // not for us, broken or unsupported frames are dropped here
/// if frame.parse().is_ok() {
///     let result = if frame.readonly {
///         frame.process_read(&ctx)
///     } else {
///         frame.process_write(&mut ctx)
///     };
///     if result.is_ok() && frame.response_required {
///         // adds CRC to read responses
///         frame.finalize_response()?;
///         response.as_slice(); // send response somewhere
///     }
/// }
/// # Ok(()) }
/// ```
pub struct ModbusFrame<'a, V: VectorTrait<u8>> {
    pub unit_id: u8,
    buf: &'a RequestBuf,
    pub response: &'a mut V,
    /// after parse: operation requested
    pub operation: Option<Operation>,
    /// is response required
    pub response_required: bool,
    /// is request read-only
    pub readonly: bool,
}

impl<'a, V: VectorTrait<u8>> ModbusFrame<'a, V> {
    pub fn new(unit_id: u8, buf: &'a RequestBuf, response: &'a mut V) -> Self {
        response.clear();
        Self {
            unit_id,
            buf,
            response,
            operation: None,
            response_required: false,
            readonly: true,
        }
    }

    /// Parse the request frame
    ///
    /// Besides the decode errors of [`Request::decode`], returns
    /// **UnsupportedFunction** for anything but 0x03 / 0x06 and **OOB** for a read larger than a
    /// response frame can carry. A zero-count read is valid and gets an empty register sequence.
    pub fn parse(&mut self) -> Result<(), ErrorKind> {
        let operation = Operation::try_from(Request::decode(self.unit_id, self.buf)?)?;
        match operation {
            Operation::ReadHoldings { count, .. } => {
                if count > MAX_READ_COUNT {
                    return Err(ErrorKind::OOB);
                }
                self.readonly = true;
            }
            Operation::WriteHolding { .. } => {
                self.readonly = false;
            }
        }
        self.operation = Some(operation);
        self.response_required = true;
        Ok(())
    }

    /// Process read functions
    ///
    /// The whole range is checked before anything is written to the response. On error the
    /// response is left empty and no response is required.
    pub fn process_read<C: Context>(&mut self, ctx: &C) -> Result<(), ErrorKind> {
        let Some(Operation::ReadHoldings { reg, count }) = self.operation else {
            return Ok(());
        };
        let result = self.encode_holdings(ctx, reg, count);
        if result.is_err() {
            self.response.clear();
            self.response_required = false;
        }
        result
    }

    fn encode_holdings<C: Context>(
        &mut self,
        ctx: &C,
        reg: u16,
        count: u16,
    ) -> Result<(), ErrorKind> {
        ctx.check_range(reg, count)?;
        let data_len = count << 1;
        if data_len > u16::from(u8::MAX) {
            return Err(ErrorKind::OOB);
        }
        // 2b unit and func
        self.response.extend(&self.buf[..2])?;
        #[allow(clippy::cast_possible_truncation)]
        // 1b data len
        self.response.push(data_len as u8)?;
        ctx.get_holdings_as_u8(reg, count, self.response)
    }

    /// Process write functions
    ///
    /// An out-of-range address leaves the store untouched, the request is echoed anyway.
    pub fn process_write<C: Context>(&mut self, ctx: &mut C) -> Result<(), ErrorKind> {
        let Some(Operation::WriteHolding { reg, value }) = self.operation else {
            return Ok(());
        };
        if ctx.set_holding(reg, value).is_err() {
            log::debug!("write to register {} ignored: out of range", reg);
        }
        // echo: unit, func, reg, val, crc
        self.response.extend(&self.buf[..REQUEST_FRAME_LEN])
    }

    /// Should be always called if response needs to be sent
    ///
    /// Appends CRC16 to read responses, write echoes already carry the request CRC.
    pub fn finalize_response(&mut self) -> Result<(), ErrorKind> {
        if let Some(Operation::ReadHoldings { .. }) = self.operation {
            let len = self.response.len();
            if len < READ_RESPONSE_HEADER_LEN {
                return Err(ErrorKind::OOB);
            }
            let crc = calc_crc16(self.response.as_slice(), len);
            self.response.extend(&crc.to_le_bytes())?;
        }
        Ok(())
    }
}

/// Run a request frame through parse, processing and finalization
///
/// On success the response holds the complete reply. Silent drops come back as errors, use
/// [`ErrorKind::is_silent_drop`] to tell them from rejected requests.
pub fn process_frame<C: Context, V: VectorTrait<u8>>(
    unit_id: u8,
    buf: &RequestBuf,
    ctx: &mut C,
    response: &mut V,
) -> Result<Operation, ErrorKind> {
    let mut frame = ModbusFrame::new(unit_id, buf, response);
    frame.parse()?;
    if frame.readonly {
        frame.process_read(&*ctx)?;
    } else {
        frame.process_write(ctx)?;
    }
    if frame.response_required {
        frame.finalize_response()?;
    }
    frame.operation.ok_or(ErrorKind::UnsupportedFunction)
}
