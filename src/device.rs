//! Acquisition state machine for the LSM6DSO
//!
//! [`Lsm6dso`] owns everything the acquisition needs: the register transport,
//! the data-ready input, the filter state and the reporting offsets. The
//! firmware main loop calls [`Lsm6dso::update`] once per pass; each call does
//! at most one state's worth of work and never blocks longer than a single
//! bounded SPI transaction.
//!
//! ```text
//! WaitingBoot ─10 ms─▶ WaitingDeviceId ─0x6C─▶ Configuring ─▶ DiscardingSamples(2)
//!                                                   ▲                 │
//!                                            release│                 ▼
//!                                               Holding ◀──hold── Measuring
//! ```
//!
//! Any failure moves to `Error`, which is terminal.

use embedded_hal::digital::InputPin;

use crate::bus::SpiPeripheral;
use crate::config::{
    BOOT_TIME_MS, HOLD, INITIALISATION, RegisterValue, SAMPLES_TO_DISCARD, STATE_TIMEOUT_MS,
};
use crate::error::{ErrorCode, ErrorKind, Function, Severity};
use crate::fusion::{
    Angles, ComplementaryFilter, PhysicalSample, RawSampleBlock, SAMPLE_BLOCK_LEN,
    SAMPLE_FIRST_REGISTER, Temperature,
};
use crate::interface::SpiInterface;
use crate::registers::{Lsm6dsoRegisters, Register, WHO_AM_I_VALUE};
use crate::reporting::{Axis, Reporting};
use crate::timer::Clock;

/// Acquisition state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Waiting for the sensor to boot after power-up
    WaitingBoot,
    /// Polling `WHO_AM_I` until it reads the expected identity
    WaitingDeviceId,
    /// Writing the bring-up table
    Configuring,
    /// Dropping the first samples after a mode change (remaining count)
    DiscardingSamples(u8),
    /// Reading and fusing samples on every data-ready signal
    Measuring,
    /// Sensors powered down, filter frozen
    Holding,
    /// Acquisition stopped; see [`Lsm6dso::last_error`]
    Error,
}

/// Data availability flags from `STATUS_REG`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataStatus {
    /// New accelerometer sample available
    pub accelerometer: bool,
    /// New gyroscope sample available
    pub gyroscope: bool,
    /// New temperature sample available
    pub temperature: bool,
}

/// LSM6DSO inclinometer acquisition
pub struct Lsm6dso<SPI, CLK, DRDY> {
    device: Lsm6dsoRegisters<SpiInterface<SPI, CLK>>,
    data_ready: DRDY,
    state: State,
    timer_ms: u32,
    filter: ComplementaryFilter,
    reporting: Reporting,
    temperature: Temperature,
    last_error: Option<ErrorCode>,
}

impl<SPI, CLK, DRDY> Lsm6dso<SPI, CLK, DRDY>
where
    SPI: SpiPeripheral,
    CLK: Clock,
    DRDY: InputPin,
{
    /// Create the acquisition in [`State::WaitingBoot`]
    ///
    /// The boot delay is measured from this call, so it should happen right
    /// after the sensor is powered. No bus is bound yet; see
    /// [`initialise`](Self::initialise).
    pub fn new(clock: CLK, data_ready: DRDY) -> Self {
        let timer_ms = clock.now_ms();
        Self {
            device: Lsm6dsoRegisters::new(SpiInterface::new(clock)),
            data_ready,
            state: State::WaitingBoot,
            timer_ms,
            filter: ComplementaryFilter::new(),
            reporting: Reporting::new(),
            temperature: Temperature::default(),
            last_error: None,
        }
    }

    /// Bind the SPI peripheral used to talk to the sensor
    ///
    /// The peripheral is left disabled. A previously bound one is returned.
    pub fn initialise(&mut self, spi: SPI) -> Option<SPI> {
        self.device.interface.bind(spi)
    }

    /// Unbind and return the SPI peripheral
    pub fn release(&mut self) -> Option<SPI> {
        self.device.interface.release()
    }

    /// Run one pass of the state machine
    ///
    /// Returns `Ok(())` when there was nothing to do yet, and also once the
    /// acquisition is in [`State::Error`].
    ///
    /// # Errors
    ///
    /// Returns the failure that moved the acquisition into [`State::Error`],
    /// on the pass where it happened. It stays available through
    /// [`last_error`](Self::last_error).
    pub fn update(&mut self) -> Result<(), ErrorCode> {
        let result = match self.state {
            State::WaitingBoot => {
                self.wait_boot();
                Ok(())
            }
            State::WaitingDeviceId => self.check_device_id(),
            State::Configuring => self.configure(),
            State::DiscardingSamples(remaining) => self.discard_sample(remaining),
            State::Measuring => self.measure(),
            State::Holding | State::Error => Ok(()),
        };

        result.map_err(|error| self.fail(error))
    }

    /// Hold (`true`) or release (`false`) the measurements
    ///
    /// Holding powers the accelerometer and the gyroscope down and freezes the
    /// filter. Releasing goes back through the full bring-up, since a powered
    /// down sensor needs the whole configuration sequence again. Holding while
    /// held, releasing while not held, and any request in [`State::Error`]
    /// succeed without bus activity.
    ///
    /// # Errors
    ///
    /// Returns the failed power-down write; the acquisition is then in
    /// [`State::Error`].
    pub fn hold(&mut self, to_hold: bool) -> Result<(), ErrorCode> {
        let held = self.state == State::Holding;
        if to_hold == held || self.state == State::Error {
            return Ok(());
        }

        if !to_hold {
            #[cfg(feature = "defmt")]
            defmt::debug!("LSM6DSO released");
            self.state = State::Configuring;
            return Ok(());
        }

        if let Err(error) = self.write_table(&HOLD, Function::Holding) {
            return Err(self.fail(error));
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("LSM6DSO held");
        self.state = State::Holding;
        Ok(())
    }

    /// Current state
    pub const fn state(&self) -> State {
        self.state
    }

    /// Failure that stopped the acquisition, if any
    pub const fn last_error(&self) -> Option<ErrorCode> {
        self.last_error
    }

    /// Filtered roll and pitch in radians, without zero offset
    pub const fn angles(&self) -> Angles {
        self.filter.angles()
    }

    /// Reported angle of an axis in tenths of a degree (truncated)
    pub fn angle_tenths_of_degree(&self, axis: Axis) -> i16 {
        self.reporting.tenths_of_degree(axis, self.filter.angles())
    }

    /// Whether an axis moved by more than 0.05° since it was last reported
    ///
    /// Returning `true` makes the current value the new baseline.
    pub fn has_changed(&mut self, axis: Axis) -> bool {
        self.reporting.has_changed(axis, self.filter.angles())
    }

    /// Use the current attitude as the zero reference
    pub fn zero_down(&mut self) {
        self.reporting.zero_down(self.filter.angles());
    }

    /// Report absolute angles again
    pub fn cancel_zeroing(&mut self) {
        self.reporting.cancel_zeroing();
    }

    /// Whether angles are reported relative to a zero reference
    pub fn is_zeroed(&self) -> bool {
        self.reporting.is_zeroed()
    }

    /// Latest die temperature in °C (25 °C until the first sample)
    pub const fn temperature_celsius(&self) -> f32 {
        self.temperature.celsius()
    }

    /// Read `WHO_AM_I`
    ///
    /// # Errors
    ///
    /// Returns the transport failure.
    pub fn read_who_am_i(&mut self) -> Result<u8, ErrorCode> {
        let reg = self.device.who_am_i().read()?;
        Ok(reg.who_am_i())
    }

    /// Read the data availability flags of `STATUS_REG`
    ///
    /// # Errors
    ///
    /// Returns the transport failure.
    pub fn read_data_status(&mut self) -> Result<DataStatus, ErrorCode> {
        let reg = self.device.status_reg().read()?;
        Ok(DataStatus {
            accelerometer: reg.xlda(),
            gyroscope: reg.gda(),
            temperature: reg.tda(),
        })
    }

    fn wait_boot(&mut self) {
        if self.elapsed(BOOT_TIME_MS) {
            self.reset_timer();
            self.state = State::WaitingDeviceId;
        }
    }

    fn check_device_id(&mut self) -> Result<(), ErrorCode> {
        if self.elapsed(STATE_TIMEOUT_MS) {
            return Err(ErrorCode::new(
                Function::CheckDeviceId,
                1,
                ErrorKind::DeviceIdentityMismatch,
                Severity::Critical,
            ));
        }

        let identity = self
            .read_who_am_i()
            .map_err(|e| e.push(Function::CheckDeviceId, 2))?;

        if identity == WHO_AM_I_VALUE {
            #[cfg(feature = "defmt")]
            defmt::debug!("LSM6DSO identified");
            self.state = State::Configuring;
        }
        Ok(())
    }

    fn configure(&mut self) -> Result<(), ErrorCode> {
        self.write_table(&INITIALISATION, Function::Configuring)?;

        self.reset_timer();
        self.state = State::DiscardingSamples(SAMPLES_TO_DISCARD);
        Ok(())
    }

    fn discard_sample(&mut self, remaining: u8) -> Result<(), ErrorCode> {
        if self.elapsed(STATE_TIMEOUT_MS) {
            return Err(ErrorCode::new(
                Function::Dropping,
                1,
                ErrorKind::DataNotReady,
                Severity::Critical,
            ));
        }

        if !self.is_data_ready() {
            return Ok(());
        }

        // reading an output register clears the latched data-ready signal
        let mut dummy = [0u8; 1];
        self.device
            .interface
            .read_registers(Register::OutxHA.addr(), &mut dummy, 1)
            .map_err(|e| e.push(Function::Dropping, 2))?;

        self.reset_timer();
        self.state = match remaining.saturating_sub(1) {
            0 => {
                #[cfg(feature = "defmt")]
                defmt::debug!("LSM6DSO measuring");
                State::Measuring
            }
            left => State::DiscardingSamples(left),
        };
        Ok(())
    }

    fn measure(&mut self) -> Result<(), ErrorCode> {
        if self.elapsed(STATE_TIMEOUT_MS) {
            return Err(ErrorCode::new(
                Function::Measuring,
                1,
                ErrorKind::DataNotReady,
                Severity::Critical,
            ));
        }

        if !self.is_data_ready() {
            return Ok(());
        }

        self.reset_timer();

        let mut block = RawSampleBlock::default();
        self.device
            .interface
            .read_registers(
                SAMPLE_FIRST_REGISTER.addr(),
                block.as_mut_bytes(),
                SAMPLE_BLOCK_LEN,
            )
            .map_err(|e| e.push(Function::Measuring, 2))?;

        let raw = block.decode();
        self.temperature.update(raw.temperature);
        self.filter.update(&PhysicalSample::from_raw(&raw));
        Ok(())
    }

    fn write_table(&mut self, table: &[RegisterValue], function: Function) -> Result<(), ErrorCode> {
        for entry in table {
            self.device
                .interface
                .write_register(entry.register.addr(), entry.value)
                .map_err(|e| e.push(function, 1))?;
        }
        Ok(())
    }

    fn fail(&mut self, error: ErrorCode) -> ErrorCode {
        let error = error.critical();

        #[cfg(feature = "defmt")]
        defmt::error!("LSM6DSO stopped in {}: {}", self.state, error);

        self.state = State::Error;
        self.last_error = Some(error);
        error
    }

    fn is_data_ready(&mut self) -> bool {
        self.data_ready.is_high().unwrap_or(false)
    }

    fn elapsed(&self, budget: u32) -> bool {
        self.device.interface.clock().elapsed(self.timer_ms, budget)
    }

    fn reset_timer(&mut self) {
        self.timer_ms = self.device.interface.clock().now_ms();
    }
}
