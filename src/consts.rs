//! MODBUS RTU slave constants

// MODBUS Functions
pub const MODBUS_GET_HOLDINGS: u8 = 3;
pub const MODBUS_SET_HOLDING: u8 = 6;

/// Request length of both supported functions: unit + func + 2 x u16 + CRC16
pub const REQUEST_FRAME_LEN: usize = 8;
/// Request bytes covered by the CRC
pub const REQUEST_PAYLOAD_LEN: usize = REQUEST_FRAME_LEN - 2;

pub const RESPONSE_BUF_CAPACITY: usize = 256;
/// unit + func + byte count
pub const READ_RESPONSE_HEADER_LEN: usize = 3;
/// Largest register count a single 0x03 request may ask for
pub const MAX_READ_COUNT: u16 = 125;

// Register filler range, [MIN, MAX)
pub const FILLER_MIN: u16 = 1;
pub const FILLER_MAX: u16 = 10000;

/// Default register store capacity
pub const DEFAULT_STORE_CAPACITY: usize = 256;

// Defaults of a freshly flashed device
pub const DEFAULT_SLAVE_ADDRESS: u8 = 0x01;
pub const DEFAULT_LED_PIN: u8 = 13;
pub const DEFAULT_LED_REGISTER: u16 = 0;
pub const DEFAULT_REGISTER_COUNT: u16 = 10;
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Register contents at power-up, starting from register 0
pub const INITIAL_HOLDINGS: [u16; 3] = [0, 5678, 90];
