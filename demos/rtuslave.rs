use serial::prelude::*;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::thread;
use std::time::Duration;

use rand::{rngs::StdRng, SeedableRng};
use rtu_slave::transport::{ByteSink, ByteSource, DigitalOutput, Transport};
use rtu_slave::{ErrorKind, Slave, SlaveConfig};

const TICK_INTERVAL: Duration = Duration::from_millis(10);

struct SerialLink {
    port: serial::SystemPort,
    rx: VecDeque<u8>,
}

impl SerialLink {
    fn open(path: &str) -> serial::Result<Self> {
        let mut port = serial::open(path)?;
        port.set_timeout(Duration::from_millis(1))?;
        Ok(Self {
            port,
            rx: VecDeque::new(),
        })
    }

    /// Move whatever the port has into the receive buffer
    fn pump(&mut self) -> io::Result<()> {
        let mut buf = [0u8; 256];
        match self.port.read(&mut buf) {
            Ok(n) => self.rx.extend(&buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {}
            Err(e) => return Err(e),
        }
        Ok(())
    }
}

impl ByteSource for SerialLink {
    fn available(&self) -> usize {
        self.rx.len()
    }

    fn read_byte(&mut self) -> Result<u8, ErrorKind> {
        self.rx.pop_front().ok_or(ErrorKind::CommunicationError)
    }
}

impl ByteSink for SerialLink {
    fn write(&mut self, data: &[u8]) -> Result<(), ErrorKind> {
        self.port
            .write_all(data)
            .map_err(|_| ErrorKind::CommunicationError)
    }
}

impl Transport for SerialLink {
    fn reconfigure(&mut self, baud_rate: u32) -> Result<(), ErrorKind> {
        let baud = serial::BaudRate::from_speed(baud_rate as usize);
        self.port
            .reconfigure(&|settings| {
                settings.set_baud_rate(baud)?;
                settings.set_char_size(serial::Bits8);
                settings.set_parity(serial::ParityNone);
                settings.set_stop_bits(serial::Stop1);
                settings.set_flow_control(serial::FlowNone);
                Ok(())
            })
            .map_err(|_| ErrorKind::CommunicationError)
    }
}

/// Prints LED changes instead of driving a pin
#[derive(Default)]
struct ConsoleLed {
    state: Option<bool>,
}

impl DigitalOutput for ConsoleLed {
    fn set(&mut self, pin: u8, active: bool) {
        if self.state != Some(active) {
            log::info!("LED on pin {}: {}", pin, if active { "ON" } else { "OFF" });
            self.state = Some(active);
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let mut args = std::env::args().skip(1);
    let port = args.next().unwrap_or_else(|| "/dev/ttyS0".to_owned());
    let unit: u8 = args.next().map_or(Ok(1), |s| s.parse())?;
    let baud_rate: u32 = args.next().map_or(Ok(9600), |s| s.parse())?;

    let config = SlaveConfig::default()
        .with_slave_address(unit)
        .with_baud_rate(baud_rate);
    let link = SerialLink::open(&port)?;
    let mut slave: Slave<_, _, _> =
        Slave::new(config, link, ConsoleLed::default(), StdRng::from_entropy())?;
    slave.begin(baud_rate)?;
    log::info!("unit {} listening on {} at {} baud", unit, port, baud_rate);
    loop {
        slave.transport_mut().pump()?;
        if let Err(e) = slave.tick() {
            log::warn!("tick failed: {}", e);
        }
        thread::sleep(TICK_INTERVAL);
    }
}
