use super::{check_rtu_response, gen_rtu_frame, MemoryTransport, RecordingOutput};
use crate::client::ModbusRequest;
use crate::consts::{FILLER_MAX, FILLER_MIN};
use crate::server::context::Context;
use crate::{ErrorKind, Slave, SlaveConfig, TickEvent};
use rand::rngs::{mock::StepRng, StdRng};
use rand::SeedableRng;

type TestSlave = Slave<MemoryTransport, RecordingOutput, StepRng>;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Filler is always 1 with a zero StepRng
fn new_slave(config: SlaveConfig) -> TestSlave {
    init_logger();
    Slave::new(
        config,
        MemoryTransport::default(),
        RecordingOutput::default(),
        StepRng::new(0, 0),
    )
    .unwrap()
}

#[test]
fn test_slave_defaults() {
    let config = SlaveConfig::default();
    assert_eq!(config.slave_address, 1);
    assert_eq!(config.led_pin, 13);
    assert_eq!(config.led_register, 0);
    assert_eq!(config.register_count, 10);
    assert_eq!(config.baud_rate, 9600);
    let slave = new_slave(config);
    assert_eq!(
        slave.registers().as_slice(),
        &[0, 5678, 90, 0, 0, 0, 0, 0, 0, 0]
    );
}

#[test]
fn test_slave_initial_holdings_short_store() {
    let slave = new_slave(SlaveConfig::default().with_register_count(2));
    assert_eq!(slave.registers().as_slice(), &[0, 5678]);
}

#[test]
fn test_slave_invalid_config() {
    init_logger();
    let result = Slave::<_, _, _, 16>::new(
        SlaveConfig::default().with_led_register(10),
        MemoryTransport::default(),
        RecordingOutput::default(),
        StepRng::new(0, 0),
    );
    assert_eq!(result.err(), Some(ErrorKind::OutOfRange));
    let result = Slave::<_, _, _, 16>::new(
        SlaveConfig::default().with_register_count(17),
        MemoryTransport::default(),
        RecordingOutput::default(),
        StepRng::new(0, 0),
    );
    assert_eq!(result.err(), Some(ErrorKind::OOB));
}

#[test]
fn test_slave_begin() {
    let mut slave = new_slave(SlaveConfig::default());
    slave.begin(19200).unwrap();
    assert_eq!(slave.transport().baud_rate, Some(19200));
    assert_eq!(slave.config().baud_rate, 19200);
    assert_eq!(slave.output().last(), Some((13, false)));
    slave.set_baud_rate(115_200).unwrap();
    assert_eq!(slave.transport().baud_rate, Some(115_200));
    assert_eq!(slave.config().baud_rate, 115_200);
}

#[test]
fn test_slave_idle() {
    let mut slave = new_slave(SlaveConfig::default());
    assert_eq!(slave.tick().unwrap(), TickEvent::Idle);
    assert!(slave.transport().tx.is_empty());
    // filler refreshed, LED register kept
    assert_eq!(slave.registers().as_slice(), &[0, 1, 1, 1, 1, 1, 1, 1, 1, 1]);
    assert_eq!(slave.output().last(), Some((13, false)));
}

#[test]
fn test_slave_partial_frame() {
    let mut slave = new_slave(SlaveConfig::default());
    let frame = gen_rtu_frame(&[1, 6, 0, 0, 0, 1]);
    for b in &frame[..7] {
        slave.transport_mut().feed(&[*b]);
        assert_eq!(slave.tick().unwrap(), TickEvent::Idle);
        assert!(slave.transport().tx.is_empty());
    }
    assert_eq!(slave.transport().rx.len(), 7);
    slave.transport_mut().feed(&frame[7..]);
    assert_eq!(
        slave.tick().unwrap(),
        TickEvent::Responded { func: 6, len: 8 }
    );
    assert_eq!(slave.transport().tx, frame);
    // next frame is aligned
    slave.transport_mut().tx.clear();
    let frame = gen_rtu_frame(&[1, 3, 0, 0, 0, 1]);
    slave.transport_mut().feed(&frame[..4]);
    assert_eq!(slave.tick().unwrap(), TickEvent::Idle);
    slave.transport_mut().feed(&frame[4..]);
    assert_eq!(
        slave.tick().unwrap(),
        TickEvent::Responded { func: 3, len: 7 }
    );
    check_rtu_response(&slave.transport().tx, &[1, 3, 2, 0, 1]);
}

#[test]
fn test_slave_read() {
    let mut slave = new_slave(SlaveConfig::default());
    let mut req = ModbusRequest::new(1);
    let mut request = Vec::new();
    req.generate_get_holdings(0, 3, &mut request).unwrap();
    slave.transport_mut().feed(&request);
    assert_eq!(
        slave.tick().unwrap(),
        TickEvent::Responded { func: 3, len: 11 }
    );
    let mut result = Vec::new();
    req.parse_u16(&slave.transport().tx, &mut result).unwrap();
    assert_eq!(result, vec![0, 1, 1]);
}

#[test]
fn test_slave_led() {
    let mut slave = new_slave(SlaveConfig::default().with_led_register(4).with_led_pin(7));
    slave.transport_mut().feed(&gen_rtu_frame(&[1, 6, 0, 4, 0, 1]));
    slave.tick().unwrap();
    assert_eq!(slave.registers().get_holding(4).unwrap(), 1);
    assert_eq!(slave.output().last(), Some((7, true)));
    // stays on, the LED register is not refreshed
    slave.tick().unwrap();
    assert_eq!(slave.output().last(), Some((7, true)));
    for value in [0u16, 2, 0x0100, 0xffff] {
        let [hi, lo] = value.to_be_bytes();
        slave.transport_mut().feed(&gen_rtu_frame(&[1, 6, 0, 4, hi, lo]));
        slave.tick().unwrap();
        assert_eq!(slave.output().last(), Some((7, false)), "value {}", value);
    }
    // every tick drives the output
    let before = slave.output().history.len();
    slave.tick().unwrap();
    slave.tick().unwrap();
    assert_eq!(slave.output().history.len(), before + 2);
}

#[test]
fn test_slave_written_filler_is_overwritten() {
    let mut slave = new_slave(SlaveConfig::default());
    slave.transport_mut().feed(&gen_rtu_frame(&[1, 6, 0, 5, 0x12, 0x34]));
    slave.tick().unwrap();
    assert_eq!(slave.registers().get_holding(5).unwrap(), 0x1234);
    slave.tick().unwrap();
    assert_eq!(slave.registers().get_holding(5).unwrap(), 1);
}

#[test]
fn test_slave_drops() {
    let mut slave = new_slave(SlaveConfig::default());
    slave
        .transport_mut()
        .feed(&gen_rtu_frame(&[2, 6, 0, 0, 0, 1]));
    assert_eq!(
        slave.tick().unwrap(),
        TickEvent::Dropped(ErrorKind::AddressMismatch)
    );
    let mut frame = gen_rtu_frame(&[1, 6, 0, 0, 0, 1]);
    frame[7] ^= 0x80;
    slave.transport_mut().feed(&frame);
    assert_eq!(
        slave.tick().unwrap(),
        TickEvent::Dropped(ErrorKind::CrcMismatch)
    );
    slave
        .transport_mut()
        .feed(&gen_rtu_frame(&[1, 16, 0, 0, 0, 1]));
    assert_eq!(
        slave.tick().unwrap(),
        TickEvent::Dropped(ErrorKind::UnsupportedFunction)
    );
    assert!(slave.transport().tx.is_empty());
    assert_eq!(slave.registers().get_holding(0).unwrap(), 0);
    assert_eq!(slave.output().last(), Some((13, false)));
}

#[test]
fn test_slave_surplus_drained() {
    let mut slave = new_slave(SlaveConfig::default());
    let frame = gen_rtu_frame(&[1, 6, 0, 0, 0, 1]);
    slave.transport_mut().feed(&frame);
    // a second frame in the same tick is lost
    slave.transport_mut().feed(&gen_rtu_frame(&[1, 6, 0, 0, 0, 0]));
    slave.transport_mut().feed(&[0xde, 0xad]);
    assert_eq!(
        slave.tick().unwrap(),
        TickEvent::Responded { func: 6, len: 8 }
    );
    assert!(slave.transport().rx.is_empty());
    assert_eq!(slave.transport().tx, frame);
    assert_eq!(slave.output().last(), Some((13, true)));
    // garbage after a dropped frame goes too
    slave.transport_mut().feed(&[0x55; 11]);
    assert_eq!(
        slave.tick().unwrap(),
        TickEvent::Dropped(ErrorKind::AddressMismatch)
    );
    assert!(slave.transport().rx.is_empty());
}

#[test]
fn test_slave_read_zero_registers() {
    let mut slave = new_slave(SlaveConfig::default());
    slave.transport_mut().feed(&gen_rtu_frame(&[1, 3, 0, 0, 0, 0]));
    assert_eq!(
        slave.tick().unwrap(),
        TickEvent::Responded { func: 3, len: 5 }
    );
    check_rtu_response(&slave.transport().tx, &[1, 3, 0]);
}

#[test]
fn test_slave_read_rejected() {
    let mut slave = new_slave(SlaveConfig::default());
    slave.transport_mut().feed(&gen_rtu_frame(&[1, 6, 0, 0, 0, 1]));
    slave.tick().unwrap();
    slave.transport_mut().tx.clear();
    slave.transport_mut().feed(&gen_rtu_frame(&[1, 3, 0, 8, 0, 3]));
    slave.transport_mut().feed(&[0x00]);
    assert_eq!(slave.tick(), Err(ErrorKind::OutOfRange));
    assert!(slave.transport().tx.is_empty());
    assert!(slave.transport().rx.is_empty());
    // output still applied
    assert_eq!(slave.output().last(), Some((13, true)));
    slave.transport_mut().feed(&gen_rtu_frame(&[1, 3, 0, 0, 0, 200]));
    assert_eq!(slave.tick(), Err(ErrorKind::OOB));
    assert!(slave.transport().tx.is_empty());
    // the engine keeps going
    slave.transport_mut().feed(&gen_rtu_frame(&[1, 3, 0, 9, 0, 1]));
    assert_eq!(
        slave.tick().unwrap(),
        TickEvent::Responded { func: 3, len: 7 }
    );
}

#[test]
fn test_slave_write_failure() {
    let mut slave = new_slave(SlaveConfig::default());
    slave.transport_mut().fail_writes = true;
    slave.transport_mut().feed(&gen_rtu_frame(&[1, 6, 0, 0, 0, 1]));
    slave.transport_mut().feed(&[0x01, 0x02]);
    assert_eq!(slave.tick(), Err(ErrorKind::CommunicationError));
    assert!(slave.transport().rx.is_empty());
    // the write itself went through
    assert_eq!(slave.output().last(), Some((13, true)));
}

#[test]
fn test_slave_setters() {
    let mut slave = new_slave(SlaveConfig::default());
    slave.set_slave_address(7);
    slave.transport_mut().feed(&gen_rtu_frame(&[1, 6, 0, 0, 0, 1]));
    assert_eq!(
        slave.tick().unwrap(),
        TickEvent::Dropped(ErrorKind::AddressMismatch)
    );
    slave.transport_mut().feed(&gen_rtu_frame(&[7, 6, 0, 3, 0, 1]));
    assert_eq!(
        slave.tick().unwrap(),
        TickEvent::Responded { func: 6, len: 8 }
    );

    assert_eq!(slave.set_led_register(10), Err(ErrorKind::OutOfRange));
    assert_eq!(slave.config().led_register, 0);
    slave.set_led_register(3).unwrap();
    assert_eq!(slave.config().led_register, 3);

    slave.set_led_pin(2);
    assert_eq!(slave.output().last(), Some((2, false)));
    slave.transport_mut().feed(&gen_rtu_frame(&[7, 6, 0, 3, 0, 1]));
    slave.tick().unwrap();
    assert_eq!(slave.output().last(), Some((2, true)));
    // the old LED register is filler now
    slave.tick().unwrap();
    assert_eq!(slave.registers().get_holding(0).unwrap(), 1);
}

#[test]
fn test_slave_filler_range() {
    init_logger();
    let mut slave: Slave<_, _, _> = Slave::new(
        SlaveConfig::default().with_register_count(64).with_led_register(63),
        MemoryTransport::default(),
        RecordingOutput::default(),
        StdRng::seed_from_u64(1),
    )
    .unwrap();
    for _ in 0..50 {
        slave.tick().unwrap();
        let regs = slave.registers().as_slice();
        for v in &regs[..63] {
            assert!((FILLER_MIN..FILLER_MAX).contains(v));
        }
        assert_eq!(regs[63], 0);
    }
}
