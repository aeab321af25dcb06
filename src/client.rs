use crate::consts::{
    MAX_READ_COUNT, MODBUS_GET_HOLDINGS, MODBUS_SET_HOLDING, READ_RESPONSE_HEADER_LEN,
    REQUEST_FRAME_LEN,
};
use crate::{calc_crc16, ErrorKind, VectorTrait};

/// Request generator / response parser for the master side of the link
///
/// One object can be used for multiple calls
pub struct ModbusRequest {
    pub unit_id: u8,
    pub func: u8,
    pub reg: u16,
    pub count: u16,
    /// value of the last single write, the slave must echo it back
    pub value: u16,
}

impl ModbusRequest {
    pub fn new(unit_id: u8) -> Self {
        Self {
            unit_id,
            func: 0,
            reg: 0,
            count: 0,
            value: 0,
        }
    }

    pub fn generate_get_holdings<V: VectorTrait<u8>>(
        &mut self,
        reg: u16,
        count: u16,
        request: &mut V,
    ) -> Result<(), ErrorKind> {
        if count > MAX_READ_COUNT {
            return Err(ErrorKind::OOB);
        }
        self.reg = reg;
        self.count = count;
        self.func = MODBUS_GET_HOLDINGS;
        self.generate(count, request)
    }

    pub fn generate_set_holding<V: VectorTrait<u8>>(
        &mut self,
        reg: u16,
        value: u16,
        request: &mut V,
    ) -> Result<(), ErrorKind> {
        self.reg = reg;
        self.count = 1;
        self.value = value;
        self.func = MODBUS_SET_HOLDING;
        self.generate(value, request)
    }

    fn generate<V: VectorTrait<u8>>(&self, param: u16, request: &mut V) -> Result<(), ErrorKind> {
        request.clear();
        request.extend(&[self.unit_id, self.func])?;
        request.extend(&self.reg.to_be_bytes())?;
        request.extend(&param.to_be_bytes())?;
        let crc = calc_crc16(request.as_slice(), request.len());
        request.extend(&crc.to_le_bytes())
    }

    /// Returns the data range of a response (between the header and the CRC)
    fn parse_response(&self, buf: &[u8]) -> Result<(usize, usize), ErrorKind> {
        let l = buf.len();
        if l < READ_RESPONSE_HEADER_LEN + 2 {
            return Err(ErrorKind::FrameIncomplete);
        }
        let frame_end = l - 2;
        let crc = calc_crc16(buf, frame_end);
        if crc != u16::from_le_bytes([buf[frame_end], buf[frame_end + 1]]) {
            return Err(ErrorKind::CrcMismatch);
        }
        if buf[0] != self.unit_id {
            return Err(ErrorKind::AddressMismatch);
        }
        if buf[1] != self.func {
            return Err(ErrorKind::UnsupportedFunction);
        }
        match self.func {
            MODBUS_GET_HOLDINGS => {
                let len = usize::from(buf[2]);
                let expected = usize::from(self.count) * 2;
                if len != frame_end - READ_RESPONSE_HEADER_LEN || len != expected {
                    return Err(ErrorKind::OutOfRange);
                }
                Ok((READ_RESPONSE_HEADER_LEN, frame_end))
            }
            MODBUS_SET_HOLDING => {
                if l != REQUEST_FRAME_LEN
                    || u16::from_be_bytes([buf[2], buf[3]]) != self.reg
                    || u16::from_be_bytes([buf[4], buf[5]]) != self.value
                {
                    return Err(ErrorKind::OutOfRange);
                }
                Ok((2, frame_end))
            }
            _ => Err(ErrorKind::UnsupportedFunction),
        }
    }

    /// Parse response and make sure it answers this request
    ///
    /// The input buffer SHOULD be cut to actual response length
    pub fn parse_ok(&self, buf: &[u8]) -> Result<(), ErrorKind> {
        self.parse_response(buf)?;
        Ok(())
    }

    /// Parse response and collect the register values (getting holdings)
    ///
    /// The input buffer SHOULD be cut to actual response length
    pub fn parse_u16<V: VectorTrait<u16>>(
        &self,
        buf: &[u8],
        result: &mut V,
    ) -> Result<(), ErrorKind> {
        let (frame_start, frame_end) = self.parse_response(buf)?;
        for pair in buf[frame_start..frame_end].chunks_exact(2) {
            result.push(u16::from_be_bytes([pair[0], pair[1]]))?;
        }
        Ok(())
    }
}
