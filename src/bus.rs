//! Polled SPI peripheral seam
//!
//! The register transport talks to the sensor through a byte-level SPI block
//! exposing the usual status flags (TX empty, RX not empty, busy, overrun),
//! the way STM32 low-layer SPI drivers do. [`HalSpi`] adapts any
//! `embedded-hal` 1.0 [`SpiBus`] and chip-select pin to that model.

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

/// Byte-level SPI peripheral with polled status flags
pub trait SpiPeripheral {
    /// Enable the peripheral (starts a transaction)
    fn enable(&mut self);

    /// Disable the peripheral (ends a transaction)
    fn disable(&mut self);

    /// Put one byte in the transmit buffer
    fn transmit(&mut self, byte: u8);

    /// Take the last received byte out of the receive buffer
    fn receive(&mut self) -> u8;

    /// Transmit buffer can accept a byte
    fn is_tx_empty(&mut self) -> bool;

    /// Receive buffer holds an unread byte
    fn is_rx_not_empty(&mut self) -> bool;

    /// A transfer is still in progress
    fn is_busy(&mut self) -> bool;

    /// Clear the overrun condition left by unread bytes
    fn clear_overrun(&mut self);
}

impl<T: SpiPeripheral + ?Sized> SpiPeripheral for &mut T {
    fn enable(&mut self) {
        (**self).enable();
    }

    fn disable(&mut self) {
        (**self).disable();
    }

    fn transmit(&mut self, byte: u8) {
        (**self).transmit(byte);
    }

    fn receive(&mut self) -> u8 {
        (**self).receive()
    }

    fn is_tx_empty(&mut self) -> bool {
        (**self).is_tx_empty()
    }

    fn is_rx_not_empty(&mut self) -> bool {
        (**self).is_rx_not_empty()
    }

    fn is_busy(&mut self) -> bool {
        (**self).is_busy()
    }

    fn clear_overrun(&mut self) {
        (**self).clear_overrun();
    }
}

/// [`SpiPeripheral`] over an `embedded-hal` SPI bus and an active-low CS pin
///
/// Every transmitted byte is exchanged immediately with a blocking one-byte
/// transfer and the byte clocked back is latched until [`receive`] is called.
/// A failed transfer latches nothing, so the transport waits for a received
/// byte that never comes and reports a timeout. A chip-select or flush error
/// latches a fault that does the same until a later `enable` drives CS low
/// successfully.
///
/// [`receive`]: SpiPeripheral::receive
pub struct HalSpi<BUS, CS> {
    bus: BUS,
    cs: CS,
    rx: Option<u8>,
    overrun: bool,
    fault: bool,
}

impl<BUS, CS> HalSpi<BUS, CS>
where
    BUS: SpiBus<u8>,
    CS: OutputPin,
{
    /// Wrap a bus and chip-select pin; the pin is driven high (deselected)
    pub fn new(bus: BUS, mut cs: CS) -> Self {
        let fault = cs.set_high().is_err();
        Self {
            bus,
            cs,
            rx: None,
            overrun: false,
            fault,
        }
    }

    /// Whether the chip-select pin or a bus flush failed
    pub const fn has_fault(&self) -> bool {
        self.fault
    }

    /// Whether a received byte was overwritten before being read
    pub const fn has_overrun(&self) -> bool {
        self.overrun
    }

    /// Consume the adapter and return the bus and chip-select pin
    pub fn release(self) -> (BUS, CS) {
        (self.bus, self.cs)
    }
}

impl<BUS, CS> SpiPeripheral for HalSpi<BUS, CS>
where
    BUS: SpiBus<u8>,
    CS: OutputPin,
{
    fn enable(&mut self) {
        self.rx = None;
        self.fault = self.cs.set_low().is_err();
        if self.fault {
            #[cfg(feature = "defmt")]
            defmt::warn!("SPI chip select could not be asserted");
        }
    }

    fn disable(&mut self) {
        // CS is released even when the flush fails
        let flushed = self.bus.flush().is_ok();
        let released = self.cs.set_high().is_ok();
        if !(flushed && released) {
            self.fault = true;
            #[cfg(feature = "defmt")]
            defmt::warn!("SPI teardown failed (flush {}, CS {})", flushed, released);
        }
    }

    fn transmit(&mut self, byte: u8) {
        let mut word = [byte];
        match self.bus.transfer_in_place(&mut word) {
            Ok(()) => {
                if self.rx.is_some() {
                    self.overrun = true;
                }
                self.rx = Some(word[0]);
            }
            Err(_) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("SPI transfer of {=u8:#04x} failed", byte);
            }
        }
    }

    fn receive(&mut self) -> u8 {
        self.rx.take().unwrap_or(0)
    }

    fn is_tx_empty(&mut self) -> bool {
        true
    }

    fn is_rx_not_empty(&mut self) -> bool {
        !self.fault && self.rx.is_some()
    }

    fn is_busy(&mut self) -> bool {
        false
    }

    fn clear_overrun(&mut self) {
        self.overrun = false;
    }
}
