//! Register transport for the LSM6DSO
//!
//! Synchronous, timeout-bounded register access over a polled SPI
//! peripheral. Every transaction enables the peripheral, moves its bytes and
//! disables it again, even when a wait runs out of budget halfway through.
//!
//! The transport also implements `device-driver`'s [`RegisterInterface`] so
//! the typed register block in [`crate::registers`] can drive it.

use device_driver::RegisterInterface;

use crate::bus::SpiPeripheral;
use crate::config::SPI_TIMEOUT_MS;
use crate::error::{ErrorCode, ErrorKind, Function, Severity};
use crate::registers::{MAX_REGISTER, READ_FLAG, WRITE_FLAG};
use crate::timer::{Clock, wait_until};

/// Byte clocked out while receiving to keep the SPI clock running
pub const SPI_RX_FILLER: u8 = 0xFF;

/// SPI register transport
///
/// Created unbound; [`bind`](Self::bind) attaches the SPI peripheral. Any
/// transaction attempted before that fails with
/// [`ErrorKind::NotInitialized`].
pub struct SpiInterface<SPI, CLK> {
    spi: Option<SPI>,
    clock: CLK,
}

impl<SPI, CLK> SpiInterface<SPI, CLK>
where
    SPI: SpiPeripheral,
    CLK: Clock,
{
    /// Create a transport with no bus bound yet
    pub const fn new(clock: CLK) -> Self {
        Self { spi: None, clock }
    }

    /// Bind the SPI peripheral, leaving it disabled
    ///
    /// A previously bound peripheral is returned.
    pub fn bind(&mut self, mut spi: SPI) -> Option<SPI> {
        spi.disable();
        self.spi.replace(spi)
    }

    /// Whether a peripheral is bound
    pub const fn is_bound(&self) -> bool {
        self.spi.is_some()
    }

    /// Tick source used for transaction timeouts
    pub const fn clock(&self) -> &CLK {
        &self.clock
    }

    /// Unbind and return the SPI peripheral
    pub fn release(&mut self) -> Option<SPI> {
        self.spi.take()
    }

    /// Write a single register
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::NotInitialized`] (step 1) if no peripheral is bound
    /// - [`ErrorKind::InvalidRegister`] (step 2) if `address` is above [`MAX_REGISTER`]
    /// - [`ErrorKind::Timeout`] (step 3) if the peripheral did not keep up within 10 ms
    pub fn write_register(&mut self, address: u8, value: u8) -> Result<(), ErrorCode> {
        let Some(spi) = self.spi.as_mut() else {
            return Err(ErrorCode::new(
                Function::WriteRegister,
                1,
                ErrorKind::NotInitialized,
                Severity::Warning,
            ));
        };

        if address > MAX_REGISTER {
            return Err(ErrorCode::new(
                Function::WriteRegister,
                2,
                ErrorKind::InvalidRegister,
                Severity::Warning,
            ));
        }

        let start = self.clock.now_ms();
        spi.enable();
        spi.transmit(WRITE_FLAG | address);

        let mut result = wait_until(&self.clock, start, SPI_TIMEOUT_MS, || spi.is_tx_empty());
        if result.is_ok() {
            spi.transmit(value);
            result = wait_until(&self.clock, start, SPI_TIMEOUT_MS, || !spi.is_busy());
        }

        spi.clear_overrun();
        spi.disable();

        result.map_err(|_| {
            #[cfg(feature = "defmt")]
            defmt::warn!("SPI write of register {=u8:#04x} timed out", address);

            ErrorCode::new(
                Function::WriteRegister,
                3,
                ErrorKind::Timeout,
                Severity::Warning,
            )
        })
    }

    /// Read `count` consecutive registers starting at `first` into `buffer`
    ///
    /// A `count` of zero succeeds without touching the bus.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::InvalidArguments`] (step 1) if `buffer` is shorter than `count`
    /// - [`ErrorKind::NotInitialized`] (step 1) if no peripheral is bound
    /// - [`ErrorKind::Timeout`] (step 2) if the transfer did not finish within 10 ms
    pub fn read_registers(
        &mut self,
        first: u8,
        buffer: &mut [u8],
        count: usize,
    ) -> Result<(), ErrorCode> {
        if count == 0 {
            return Ok(());
        }

        if buffer.len() < count {
            return Err(ErrorCode::new(
                Function::ReadRegisters,
                1,
                ErrorKind::InvalidArguments,
                Severity::Critical,
            ));
        }

        let Some(spi) = self.spi.as_mut() else {
            return Err(ErrorCode::new(
                Function::ReadRegisters,
                1,
                ErrorKind::NotInitialized,
                Severity::Critical,
            ));
        };

        let start = self.clock.now_ms();
        spi.enable();

        // The byte clocked back during the address phase carries no data
        spi.transmit(READ_FLAG | first);
        let mut result = wait_until(&self.clock, start, SPI_TIMEOUT_MS, || spi.is_rx_not_empty());
        let _ = spi.receive();

        if result.is_ok() {
            for slot in &mut buffer[..count] {
                spi.transmit(SPI_RX_FILLER);
                result = wait_until(&self.clock, start, SPI_TIMEOUT_MS, || spi.is_rx_not_empty());
                if result.is_err() {
                    break;
                }
                *slot = spi.receive();
            }
        }

        if result.is_ok() {
            result = wait_until(&self.clock, start, SPI_TIMEOUT_MS, || !spi.is_busy());
        }

        spi.clear_overrun();
        spi.disable();

        result.map_err(|_| {
            #[cfg(feature = "defmt")]
            defmt::warn!("SPI read of {=usize} bytes from {=u8:#04x} timed out", count, first);

            ErrorCode::new(
                Function::ReadRegisters,
                2,
                ErrorKind::Timeout,
                Severity::Warning,
            )
        })
    }
}

impl<SPI, CLK> RegisterInterface for SpiInterface<SPI, CLK>
where
    SPI: SpiPeripheral,
    CLK: Clock,
{
    type Error = ErrorCode;
    type AddressType = u8;

    fn read_register(
        &mut self,
        address: Self::AddressType,
        size_bits: u32,
        read_data: &mut [u8],
    ) -> Result<(), Self::Error> {
        let count = (size_bits / 8) as usize;
        self.read_registers(address, read_data, count)
    }

    fn write_register(
        &mut self,
        address: Self::AddressType,
        size_bits: u32,
        write_data: &[u8],
    ) -> Result<(), Self::Error> {
        let count = (size_bits / 8) as usize;
        if write_data.len() < count {
            return Err(ErrorCode::new(
                Function::WriteRegister,
                4,
                ErrorKind::InvalidArguments,
                Severity::Critical,
            ));
        }

        // The device has no multi-byte write register, so each byte is its own transaction
        for (offset, &value) in write_data[..count].iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let target = address.wrapping_add(offset as u8);
            SpiInterface::write_register(self, target, value)?;
        }
        Ok(())
    }
}
