//! Static device configuration
//!
//! The sensor is brought into its operating mode by writing an ordered table
//! of register values; holding the measurements powers the accelerometer and
//! the gyroscope down with a second, shorter table. Timing budgets of the
//! acquisition live here as well.

use crate::registers::{
    FIFO_MODE_BYPASS, FTYPE_120_3HZ, G_FS_125DPS, H_LACTIVE, HP_EN_G, HPM_G_65MHZ, INT1_DRDY_XL,
    LPF1_SEL_G, LPF2_XL_EN, ODR_416HZ, ODR_POWER_DOWN, Register, SW_RESET, XL_FS_2G,
    XL_NO_HP_LPF2_ODR_4,
};

/// Time given to the sensor to boot after power-up
pub const BOOT_TIME_MS: u32 = 10;

/// Budget of a single SPI transaction
pub const SPI_TIMEOUT_MS: u32 = 10;

/// Budget of the identity check and of each wait for a data-ready signal
pub const STATE_TIMEOUT_MS: u32 = 1000;

/// Samples dropped after a change of output data rate or power mode
///
/// The first samples after such a change still carry the previous filter
/// settling (AN5192, table 12).
pub const SAMPLES_TO_DISCARD: u8 = 2;

/// A value to write at a specific register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterValue {
    /// Register to write
    pub register: Register,
    /// Value to write
    pub value: u8,
}

impl RegisterValue {
    /// Pair a register with the value to write
    #[must_use]
    pub const fn new(register: Register, value: u8) -> Self {
        Self { register, value }
    }
}

/// Bring-up sequence, applied in order
///
/// Accelerometer at 416 Hz / ±2 g through LPF2, gyroscope at 416 Hz / 125 dps
/// with its high-pass and LPF1 filters, FIFO bypassed and accelerometer
/// data-ready routed to INT1.
pub const INITIALISATION: [RegisterValue; 9] = [
    RegisterValue::new(Register::Ctrl3C, SW_RESET | H_LACTIVE),
    RegisterValue::new(Register::FifoCtrl4, FIFO_MODE_BYPASS),
    RegisterValue::new(Register::Int1Ctrl, INT1_DRDY_XL),
    RegisterValue::new(Register::Ctrl8Xl, XL_NO_HP_LPF2_ODR_4),
    RegisterValue::new(Register::Ctrl1Xl, ODR_416HZ | XL_FS_2G | LPF2_XL_EN),
    RegisterValue::new(Register::Ctrl7G, HP_EN_G | HPM_G_65MHZ),
    RegisterValue::new(Register::Ctrl4C, LPF1_SEL_G),
    RegisterValue::new(Register::Ctrl6C, FTYPE_120_3HZ),
    RegisterValue::new(Register::Ctrl2G, ODR_416HZ | G_FS_125DPS),
];

/// Power-down sequence used while measurements are held
pub const HOLD: [RegisterValue; 2] = [
    RegisterValue::new(Register::Ctrl1Xl, ODR_POWER_DOWN),
    RegisterValue::new(Register::Ctrl2G, ODR_POWER_DOWN),
];
