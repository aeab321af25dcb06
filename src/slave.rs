//! Polling slave engine
//!
//! [`Slave::tick`] runs the whole pipeline once and returns: refresh filler registers, take a
//! request off the link if a full one is buffered, process it, write the response, drop any
//! surplus bytes and finally project the LED register onto the digital output.

use crate::consts::{
    DEFAULT_BAUD_RATE, DEFAULT_LED_PIN, DEFAULT_LED_REGISTER, DEFAULT_REGISTER_COUNT,
    DEFAULT_SLAVE_ADDRESS, DEFAULT_STORE_CAPACITY, INITIAL_HOLDINGS,
};
use crate::server::{self, context::Context, storage::RegisterStore};
use crate::transport::{self, DigitalOutput, Transport};
use crate::{ErrorKind, RequestBuf, ResponseBuf};
use log::{debug, trace, warn};
use rand_core::RngCore;

#[cfg(feature = "with_serde")]
use serde::{Deserialize, Serialize};

/// Slave configuration
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "with_serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with_serde", serde(default))]
pub struct SlaveConfig {
    /// unit id requests must carry
    pub slave_address: u8,
    /// output pin driven from the LED register
    pub led_pin: u8,
    /// register projected onto the output, exempt from filler refresh
    pub led_register: u16,
    /// fixed at construction
    pub register_count: u16,
    /// applied to the transport only
    pub baud_rate: u32,
}

impl Default for SlaveConfig {
    fn default() -> Self {
        Self {
            slave_address: DEFAULT_SLAVE_ADDRESS,
            led_pin: DEFAULT_LED_PIN,
            led_register: DEFAULT_LED_REGISTER,
            register_count: DEFAULT_REGISTER_COUNT,
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

impl SlaveConfig {
    pub fn with_slave_address(mut self, slave_address: u8) -> Self {
        self.slave_address = slave_address;
        self
    }

    pub fn with_led_pin(mut self, led_pin: u8) -> Self {
        self.led_pin = led_pin;
        self
    }

    pub fn with_led_register(mut self, led_register: u16) -> Self {
        self.led_register = led_register;
        self
    }

    pub fn with_register_count(mut self, register_count: u16) -> Self {
        self.register_count = register_count;
        self
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Check the configuration against a store of `capacity` registers
    ///
    /// Errors:
    ///
    /// * **OOB** more registers than the store can hold
    /// * **OutOfRange** the LED register is outside the register count
    pub fn validate(&self, capacity: usize) -> Result<(), ErrorKind> {
        if usize::from(self.register_count) > capacity {
            return Err(ErrorKind::OOB);
        }
        if self.led_register >= self.register_count {
            return Err(ErrorKind::OutOfRange);
        }
        Ok(())
    }
}

/// What a single tick did
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickEvent {
    /// less than a full frame buffered, nothing consumed
    Idle,
    /// frame consumed, no response sent
    Dropped(ErrorKind),
    /// response of `len` bytes written for function `func`
    Responded { func: u8, len: usize },
}

/// Modbus RTU slave
///
/// Owns the register store and the injected transport, digital output and filler source. `N`
/// is the register store capacity.
pub struct Slave<T, O, R, const N: usize = DEFAULT_STORE_CAPACITY>
where
    T: Transport,
    O: DigitalOutput,
    R: RngCore,
{
    config: SlaveConfig,
    store: RegisterStore<N>,
    transport: T,
    output: O,
    rng: R,
    response: ResponseBuf,
}

impl<T, O, R, const N: usize> Slave<T, O, R, N>
where
    T: Transport,
    O: DigitalOutput,
    R: RngCore,
{
    pub fn new(config: SlaveConfig, transport: T, output: O, rng: R) -> Result<Self, ErrorKind> {
        config.validate(N)?;
        let mut store = RegisterStore::new(config.register_count)?;
        let preset = INITIAL_HOLDINGS.len().min(usize::from(config.register_count));
        store.set_holdings_bulk(0, &INITIAL_HOLDINGS[..preset])?;
        Ok(Self {
            config,
            store,
            transport,
            output,
            rng,
            response: ResponseBuf::new(),
        })
    }

    /// Bring the link up at `baud_rate` and drive the output inactive
    pub fn begin(&mut self, baud_rate: u32) -> Result<(), ErrorKind> {
        self.config.baud_rate = baud_rate;
        self.output.set(self.config.led_pin, false);
        self.transport.reconfigure(baud_rate)
    }

    /// Run one polling cycle
    ///
    /// Never waits for bytes. Frames for other units, broken frames and unsupported functions
    /// end as [`TickEvent::Dropped`]. Read requests outside the store or larger than a response
    /// frame, as well as transport failures, are returned as errors. The output is updated in
    /// every case.
    pub fn tick(&mut self) -> Result<TickEvent, ErrorKind> {
        self.store
            .refresh_non_reserved(self.config.led_register, &mut self.rng);
        let result = self.poll();
        self.apply_output();
        result
    }

    fn poll(&mut self) -> Result<TickEvent, ErrorKind> {
        let buf = match transport::read_request(&mut self.transport) {
            Ok(buf) => buf,
            Err(ErrorKind::FrameIncomplete) => {
                trace!("{} bytes buffered, waiting", self.transport.available());
                return Ok(TickEvent::Idle);
            }
            Err(e) => return Err(e),
        };
        let result = self.handle_request(&buf);
        let drained = transport::drain(&mut self.transport);
        match drained {
            Ok(0) => {}
            Ok(n) => debug!("{} surplus bytes dropped", n),
            Err(e) => warn!("unable to drain receive buffer: {}", e),
        }
        let event = result?;
        drained?;
        Ok(event)
    }

    fn handle_request(&mut self, buf: &RequestBuf) -> Result<TickEvent, ErrorKind> {
        match server::process_frame(
            self.config.slave_address,
            buf,
            &mut self.store,
            &mut self.response,
        ) {
            Ok(operation) => {
                self.transport.write(self.response.as_slice())?;
                let func = operation.func();
                let len = self.response.len();
                debug!("function 0x{:02x}: {} bytes sent", func, len);
                Ok(TickEvent::Responded { func, len })
            }
            Err(e) if e.is_silent_drop() => {
                match e {
                    ErrorKind::AddressMismatch => {
                        debug!("frame for unit {} ignored", buf[0]);
                    }
                    ErrorKind::CrcMismatch => debug!("frame dropped: {}", e),
                    _ => debug!("function 0x{:02x} not supported, frame dropped", buf[1]),
                }
                Ok(TickEvent::Dropped(e))
            }
            Err(e) => {
                warn!("read request rejected: {}", e);
                Err(e)
            }
        }
    }

    fn apply_output(&mut self) {
        let active = self.store.get_holding(self.config.led_register) == Ok(1);
        self.output.set(self.config.led_pin, active);
    }

    pub fn config(&self) -> &SlaveConfig {
        &self.config
    }

    pub fn set_slave_address(&mut self, slave_address: u8) {
        self.config.slave_address = slave_address;
    }

    /// Move the LED to another pin, the new pin starts inactive
    pub fn set_led_pin(&mut self, led_pin: u8) {
        self.config.led_pin = led_pin;
        self.output.set(led_pin, false);
    }

    /// Bind the output to another register
    ///
    /// A register outside the store is ignored and reported as [`ErrorKind::OutOfRange`].
    pub fn set_led_register(&mut self, led_register: u16) -> Result<(), ErrorKind> {
        if led_register >= self.store.register_count() {
            warn!("LED register {} ignored: out of range", led_register);
            return Err(ErrorKind::OutOfRange);
        }
        self.config.led_register = led_register;
        Ok(())
    }

    pub fn set_baud_rate(&mut self, baud_rate: u32) -> Result<(), ErrorKind> {
        self.config.baud_rate = baud_rate;
        self.transport.reconfigure(baud_rate)
    }

    pub fn registers(&self) -> &RegisterStore<N> {
        &self.store
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn output(&self) -> &O {
        &self.output
    }
}
