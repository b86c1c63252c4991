//! Unit tests for the SPI register transport

use device_driver::RegisterInterface;
use lsm6dso::interface::SpiInterface;
use lsm6dso::registers::{MAX_REGISTER, Register};
use lsm6dso::{ErrorKind, Function, Severity};

use crate::common::{FakeClock, MockSpi, Operation, Stall};

fn bound_interface() -> (SpiInterface<MockSpi, FakeClock>, MockSpi, FakeClock) {
    let clock = FakeClock::new();
    let spi = MockSpi::new().with_clock(clock.clone());
    let mut interface = SpiInterface::new(clock.clone());
    assert!(interface.bind(spi.clone()).is_none());
    (interface, spi, clock)
}

#[test]
fn test_write_then_read_round_trips_every_register() {
    let (mut interface, spi, _clock) = bound_interface();

    for address in 0..=MAX_REGISTER {
        let value = address.wrapping_mul(7) ^ 0x5A;
        interface.write_register(address, value).unwrap();

        let mut buffer = [0u8; 1];
        interface.read_registers(address, &mut buffer, 1).unwrap();
        assert_eq!(
            buffer[0], value,
            "register {:#04x} did not read back what was written",
            address
        );
    }
    assert!(!spi.is_enabled());
}

#[test]
fn test_write_sends_address_with_write_flag() {
    let (mut interface, spi, _clock) = bound_interface();

    interface.write_register(Register::Ctrl1Xl.addr(), 0x62).unwrap();

    assert_eq!(
        spi.operations(),
        vec![Operation::Write {
            address: 0x10,
            value: 0x62
        }]
    );
    assert_eq!(spi.transaction_count(), 1);
    assert_eq!(spi.overrun_clears(), 1);
}

#[test]
fn test_burst_read_auto_increments() {
    let (mut interface, spi, _clock) = bound_interface();
    for (offset, address) in (0x20u8..0x2E).enumerate() {
        spi.set_register(address, offset as u8 + 1);
    }

    let mut buffer = [0u8; 14];
    interface.read_registers(0x20, &mut buffer, 14).unwrap();

    assert_eq!(buffer, [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14]);
    assert_eq!(
        spi.operations(),
        vec![Operation::Read {
            first: 0x20,
            count: 14
        }]
    );
}

#[test]
fn test_read_of_zero_bytes_does_not_touch_the_bus() {
    let (mut interface, spi, _clock) = bound_interface();

    let mut buffer = [0u8; 0];
    interface.read_registers(0x0F, &mut buffer, 0).unwrap();
    assert_eq!(spi.transaction_count(), 0, "count=0 must not start a transaction");

    // even before a bus is bound
    let mut unbound: SpiInterface<MockSpi, FakeClock> = SpiInterface::new(FakeClock::new());
    assert!(unbound.read_registers(0x0F, &mut buffer, 0).is_ok());
}

#[test]
fn test_read_into_short_buffer_is_rejected() {
    let (mut interface, spi, _clock) = bound_interface();

    let mut buffer = [0u8; 2];
    let error = interface.read_registers(0x20, &mut buffer, 3).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::InvalidArguments);
    assert_eq!(error.function(), Function::ReadRegisters);
    assert_eq!(error.step(), 1);
    assert_eq!(spi.transaction_count(), 0);
}

#[test]
fn test_unbound_interface_reports_not_initialized() {
    let mut interface: SpiInterface<MockSpi, FakeClock> = SpiInterface::new(FakeClock::new());
    assert!(!interface.is_bound());

    let write = interface.write_register(0x10, 0x00).unwrap_err();
    assert_eq!(write.kind(), ErrorKind::NotInitialized);
    assert_eq!(write.function(), Function::WriteRegister);
    assert_eq!(write.step(), 1);

    let mut buffer = [0u8; 1];
    let read = interface.read_registers(0x0F, &mut buffer, 1).unwrap_err();
    assert_eq!(read.kind(), ErrorKind::NotInitialized);
    assert_eq!(read.function(), Function::ReadRegisters);
    assert_eq!(read.step(), 1);
    assert_eq!(read.severity(), Severity::Critical);
}

#[test]
fn test_register_above_map_is_rejected_without_bus_activity() {
    let (mut interface, spi, _clock) = bound_interface();

    let error = interface.write_register(MAX_REGISTER + 1, 0x00).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::InvalidRegister);
    assert_eq!(error.step(), 2);
    assert_eq!(spi.transaction_count(), 0);
}

#[test]
fn test_write_timeout_skips_value_and_disables_bus() {
    let (mut interface, spi, clock) = bound_interface();
    spi.stall_next_write();

    let error = interface.write_register(0x10, 0x62).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Timeout);
    assert_eq!(error.function(), Function::WriteRegister);
    assert_eq!(error.step(), 3);
    assert_eq!(error.severity(), Severity::Warning);
    assert!(clock.peek() >= 10, "the transport gave up before its budget");
    assert!(spi.writes().is_empty(), "the value byte must not be sent");
    assert_eq!(spi.operations(), vec![Operation::Aborted { command: 0x10 }]);
    assert!(!spi.is_enabled());
    assert_eq!(spi.overrun_clears(), 1);

    // the next transaction is unaffected
    interface.write_register(0x10, 0x62).unwrap();
    assert_eq!(spi.register(0x10), 0x62);
}

#[test]
fn test_write_timeout_while_busy() {
    let (mut interface, spi, _clock) = bound_interface();
    spi.set_stall(Some(Stall::Busy));

    let error = interface.write_register(0x10, 0x62).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Timeout);
    assert_eq!(error.step(), 3);
    assert!(!spi.is_enabled());
}

#[test]
fn test_read_timeout_disables_bus() {
    let (mut interface, spi, clock) = bound_interface();
    spi.stall_next_read();

    let mut buffer = [0u8; 14];
    let error = interface.read_registers(0x20, &mut buffer, 14).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Timeout);
    assert_eq!(error.function(), Function::ReadRegisters);
    assert_eq!(error.step(), 2);
    assert!(clock.peek() >= 10);
    assert!(!spi.is_enabled());
    assert_eq!(spi.overrun_clears(), 1);
}

#[test]
fn test_bind_returns_previous_bus_and_release_unbinds() {
    let (mut interface, _spi, _clock) = bound_interface();

    let previous = interface.bind(MockSpi::new());
    assert!(previous.is_some(), "rebinding must hand back the old bus");

    assert!(interface.release().is_some());
    assert!(!interface.is_bound());
    assert!(interface.release().is_none());
}

#[test]
fn test_register_interface_reads_size_bits() {
    let (mut interface, spi, _clock) = bound_interface();
    spi.set_register(0x0F, 0x6C);

    let mut buffer = [0u8; 1];
    RegisterInterface::read_register(&mut interface, 0x0F, 8, &mut buffer).unwrap();
    assert_eq!(buffer[0], 0x6C);
}

#[test]
fn test_register_interface_writes_consecutive_registers() {
    let (mut interface, spi, _clock) = bound_interface();

    RegisterInterface::write_register(&mut interface, 0x73, 24, &[1, 2, 3]).unwrap();

    assert_eq!(spi.writes(), vec![(0x73, 1), (0x74, 2), (0x75, 3)]);
    assert_eq!(spi.transaction_count(), 3);
}

#[test]
fn test_register_interface_rejects_short_data() {
    let (mut interface, spi, _clock) = bound_interface();

    let error = RegisterInterface::write_register(&mut interface, 0x73, 16, &[1]).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::InvalidArguments);
    assert_eq!(spi.transaction_count(), 0);
}
