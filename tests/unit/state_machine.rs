//! Unit tests for the acquisition state sequencing

use lsm6dso::config::{INITIALISATION, STATE_TIMEOUT_MS};
use lsm6dso::registers::Register;
use lsm6dso::{ErrorKind, Function, Lsm6dso, Severity, State};

use crate::common::{FakeClock, FaultyPin, MockSpi, Operation, create_mock_driver};

#[test]
fn test_waits_for_boot_before_talking_to_sensor() {
    let (mut driver, harness) = create_mock_driver();
    assert_eq!(driver.state(), State::WaitingBoot);

    harness.clock.advance(9);
    driver.update().unwrap();
    assert_eq!(driver.state(), State::WaitingBoot);
    assert_eq!(harness.spi.transaction_count(), 0);

    harness.clock.advance(1);
    driver.update().unwrap();
    assert_eq!(driver.state(), State::WaitingDeviceId);
    assert_eq!(harness.spi.transaction_count(), 0);
}

#[test]
fn test_boot_delay_survives_tick_wraparound() {
    let clock = FakeClock::starting_at(u32::MAX - 3);
    let spi = MockSpi::new();
    let mut driver = Lsm6dso::new(clock.clone(), crate::common::MockPin::new());
    driver.initialise(spi);

    clock.advance(9);
    driver.update().unwrap();
    assert_eq!(driver.state(), State::WaitingBoot);

    clock.advance(1);
    driver.update().unwrap();
    assert_eq!(driver.state(), State::WaitingDeviceId);
}

#[test]
fn test_identity_match_moves_to_configuring() {
    let (mut driver, harness) = create_mock_driver();
    harness.clock.advance(10);
    driver.update().unwrap();

    driver.update().unwrap();

    assert_eq!(driver.state(), State::Configuring);
    assert_eq!(
        harness.spi.operations(),
        vec![Operation::Read {
            first: Register::WhoAmI.addr(),
            count: 1
        }]
    );
}

#[test]
fn test_identity_mismatch_within_budget_keeps_waiting() {
    let (mut driver, harness) = create_mock_driver();
    harness.spi.set_who_am_i(0x6A);
    harness.clock.advance(10);
    driver.update().unwrap();

    // five wrong answers, 100 ms apart
    for attempt in 0..5 {
        harness.clock.advance(100);
        assert!(driver.update().is_ok(), "attempt {} must not fail", attempt);
        assert_eq!(driver.state(), State::WaitingDeviceId);
    }
    assert!(driver.last_error().is_none());

    // past the 1000 ms mark
    harness.clock.advance(500);
    let error = driver.update().unwrap_err();

    assert_eq!(driver.state(), State::Error);
    assert_eq!(error.function(), Function::CheckDeviceId);
    assert_eq!(error.step(), 1);
    assert_eq!(error.kind(), ErrorKind::DeviceIdentityMismatch);
    assert_eq!(error.severity(), Severity::Critical);
    assert_eq!(driver.last_error(), Some(error));
}

#[test]
fn test_identity_read_failure_is_fatal() {
    let (mut driver, harness) = create_mock_driver();
    harness.clock.advance(10);
    driver.update().unwrap();

    harness.spi.stall_next_read();
    let error = driver.update().unwrap_err();

    assert_eq!(driver.state(), State::Error);
    assert_eq!(error.function(), Function::CheckDeviceId);
    assert_eq!(error.step(), 2);
    assert_eq!(error.kind(), ErrorKind::Timeout);
    assert_eq!(error.root().function, Function::ReadRegisters);
    assert!(error.is_critical());
}

#[test]
fn test_configuring_writes_table_in_order() {
    let (mut driver, harness) = create_mock_driver();
    harness.clock.advance(10);
    driver.update().unwrap();
    driver.update().unwrap();
    harness.spi.clear_operations();

    driver.update().unwrap();

    let expected: Vec<(u8, u8)> = INITIALISATION
        .iter()
        .map(|entry| (entry.register.addr(), entry.value))
        .collect();
    assert_eq!(harness.spi.writes(), expected);
    assert_eq!(harness.spi.transaction_count(), INITIALISATION.len());
    assert_eq!(harness.spi.register(Register::Ctrl1Xl.addr()), 0x62);
    assert_eq!(harness.spi.register(Register::Ctrl2G.addr()), 0x62);
    assert_eq!(driver.state(), State::DiscardingSamples(2));
}

#[test]
fn test_configuring_write_failure_is_fatal() {
    let (mut driver, harness) = create_mock_driver();
    harness.clock.advance(10);
    driver.update().unwrap();
    driver.update().unwrap();

    harness.spi.stall_next_write();
    let error = driver.update().unwrap_err();

    assert_eq!(driver.state(), State::Error);
    assert_eq!(error.function(), Function::Configuring);
    assert_eq!(error.step(), 1);
    assert_eq!(error.root().function, Function::WriteRegister);
    assert_eq!(error.root().step, 3);
    assert!(error.is_critical(), "state failures are always critical");
    assert!(harness.spi.writes().is_empty());
}

#[test]
fn test_discard_counter_decrements_once_per_data_ready() {
    let (mut driver, harness) = create_mock_driver();
    harness.clock.advance(10);
    harness.update_until(&mut driver, State::DiscardingSamples(2), 8);
    harness.spi.clear_operations();

    // no data ready: nothing happens
    for _ in 0..3 {
        driver.update().unwrap();
        assert_eq!(driver.state(), State::DiscardingSamples(2));
    }
    assert_eq!(harness.spi.transaction_count(), 0);

    harness.data_ready.set_high(true);
    driver.update().unwrap();
    assert_eq!(driver.state(), State::DiscardingSamples(1));

    harness.data_ready.set_high(false);
    driver.update().unwrap();
    assert_eq!(driver.state(), State::DiscardingSamples(1), "must not reach Measuring early");

    harness.data_ready.set_high(true);
    driver.update().unwrap();
    assert_eq!(driver.state(), State::Measuring);

    let dummy_read = Operation::Read {
        first: Register::OutxHA.addr(),
        count: 1,
    };
    assert_eq!(harness.spi.operations(), vec![dummy_read.clone(), dummy_read]);
}

#[test]
fn test_discard_timeout() {
    let (mut driver, harness) = create_mock_driver();
    harness.clock.advance(10);
    harness.update_until(&mut driver, State::DiscardingSamples(2), 8);

    harness.clock.advance(STATE_TIMEOUT_MS - 1);
    driver.update().unwrap();

    harness.clock.advance(1);
    let error = driver.update().unwrap_err();
    assert_eq!(error.function(), Function::Dropping);
    assert_eq!(error.step(), 1);
    assert_eq!(error.kind(), ErrorKind::DataNotReady);
    assert_eq!(driver.state(), State::Error);
}

#[test]
fn test_discard_read_failure() {
    let (mut driver, harness) = create_mock_driver();
    harness.clock.advance(10);
    harness.update_until(&mut driver, State::DiscardingSamples(2), 8);

    harness.data_ready.set_high(true);
    harness.spi.stall_next_read();
    let error = driver.update().unwrap_err();

    assert_eq!(error.function(), Function::Dropping);
    assert_eq!(error.step(), 2);
    assert_eq!(driver.state(), State::Error);
}

#[test]
fn test_data_ready_resets_state_timer() {
    let (mut driver, harness) = create_mock_driver();
    harness.bring_up(&mut driver);

    // a sample every 900 ms never trips the 1000 ms budget
    for _ in 0..5 {
        harness.data_ready.set_high(false);
        harness.clock.advance(900);
        driver.update().unwrap();
        harness.data_ready.set_high(true);
        driver.update().unwrap();
    }
    assert_eq!(driver.state(), State::Measuring);
}

#[test]
fn test_measuring_timeout() {
    let (mut driver, harness) = create_mock_driver();
    harness.bring_up(&mut driver);
    harness.data_ready.set_high(false);

    harness.clock.advance(STATE_TIMEOUT_MS);
    let error = driver.update().unwrap_err();

    assert_eq!(error.function(), Function::Measuring);
    assert_eq!(error.step(), 1);
    assert_eq!(error.kind(), ErrorKind::DataNotReady);
    assert_eq!(driver.state(), State::Error);
}

#[test]
fn test_measuring_read_failure() {
    let (mut driver, harness) = create_mock_driver();
    harness.bring_up(&mut driver);

    harness.spi.stall_next_read();
    let error = driver.update().unwrap_err();

    assert_eq!(error.function(), Function::Measuring);
    assert_eq!(error.step(), 2);
    assert_eq!(
        error.frames().len(),
        2,
        "the transport frame stays under the state frame"
    );
    assert_eq!(driver.state(), State::Error);
}

#[test]
fn test_error_state_absorbs_updates() {
    let (mut driver, harness) = create_mock_driver();
    harness.bring_up(&mut driver);
    harness.spi.stall_next_read();
    let error = driver.update().unwrap_err();
    harness.spi.clear_operations();

    for _ in 0..10 {
        harness.clock.advance(STATE_TIMEOUT_MS);
        assert!(driver.update().is_ok(), "Error reports success once entered");
    }

    assert_eq!(driver.state(), State::Error);
    assert_eq!(driver.last_error(), Some(error));
    assert_eq!(harness.spi.transaction_count(), 0);
}

#[test]
fn test_unbound_driver_fails_identity_check() {
    let clock = FakeClock::new();
    let mut driver: Lsm6dso<MockSpi, _, _> = Lsm6dso::new(clock.clone(), crate::common::MockPin::new());
    clock.advance(10);
    driver.update().unwrap();

    let error = driver.update().unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NotInitialized);
    assert_eq!(error.function(), Function::CheckDeviceId);
    assert_eq!(error.step(), 2);
}

#[test]
fn test_faulty_data_ready_pin_reads_as_not_ready() {
    let clock = FakeClock::new();
    let spi = MockSpi::new();
    let mut driver = Lsm6dso::new(clock.clone(), FaultyPin);
    driver.initialise(spi.clone());

    clock.advance(10);
    for _ in 0..3 {
        driver.update().unwrap();
    }
    assert_eq!(driver.state(), State::DiscardingSamples(2));

    spi.clear_operations();
    driver.update().unwrap();
    assert_eq!(driver.state(), State::DiscardingSamples(2));
    assert_eq!(spi.transaction_count(), 0);

    clock.advance(STATE_TIMEOUT_MS);
    assert!(driver.update().is_err());
}

#[test]
fn test_release_returns_bus() {
    let (mut driver, harness) = create_mock_driver();
    harness.bring_up(&mut driver);

    assert!(driver.release().is_some());
    assert!(driver.release().is_none());
}

#[test]
fn test_status_flags_decoded_field_by_field() {
    let (mut driver, harness) = create_mock_driver();

    harness.spi.set_register(Register::StatusReg.addr(), 0b0000_0101);
    let status = driver.read_data_status().unwrap();

    assert!(status.accelerometer);
    assert!(!status.gyroscope);
    assert!(status.temperature);
    assert_eq!(driver.read_who_am_i().unwrap(), 0x6C);
    assert_eq!(driver.state(), State::WaitingBoot, "diagnostic reads never move the state");
}
