//! Register definitions for the LSM6DSO
//!
//! [`Register`] lists every user-bank address of the device and is what the
//! static configuration tables and the raw transport work with. The typed
//! register block generated below covers the registers the acquisition reads
//! field by field.
//!
//! On SPI the direction travels in bit 7 of the address byte: set for a read,
//! clear for a write. The address auto-increments during a burst read
//! (`CTRL3_C.IF_INC`, enabled after reset).

/// Bit 7 of the address byte for a read transaction
pub const READ_FLAG: u8 = 0x80;

/// Bit 7 of the address byte for a write transaction
pub const WRITE_FLAG: u8 = 0x00;

/// Highest valid register address (`FIFO_DATA_OUT_Z_H`)
pub const MAX_REGISTER: u8 = Register::FifoDataOutZH as u8;

/// Expected value of `WHO_AM_I`
pub const WHO_AM_I_VALUE: u8 = 0x6C;

/// LSM6DSO user-bank register addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Register {
    FuncCfgAccess = 0x01,
    PinCtrl = 0x02,
    FifoCtrl1 = 0x07,
    FifoCtrl2 = 0x08,
    FifoCtrl3 = 0x09,
    FifoCtrl4 = 0x0A,
    CounterBdrReg1 = 0x0B,
    CounterBdrReg2 = 0x0C,
    Int1Ctrl = 0x0D,
    Int2Ctrl = 0x0E,
    WhoAmI = 0x0F,
    Ctrl1Xl = 0x10,
    Ctrl2G = 0x11,
    Ctrl3C = 0x12,
    Ctrl4C = 0x13,
    Ctrl5C = 0x14,
    Ctrl6C = 0x15,
    Ctrl7G = 0x16,
    Ctrl8Xl = 0x17,
    Ctrl9Xl = 0x18,
    Ctrl10C = 0x19,
    AllIntSrc = 0x1A,
    WakeUpSrc = 0x1B,
    TapSrc = 0x1C,
    D6dSrc = 0x1D,
    StatusReg = 0x1E,
    OutTempL = 0x20,
    OutTempH = 0x21,
    OutxLG = 0x22,
    OutxHG = 0x23,
    OutyLG = 0x24,
    OutyHG = 0x25,
    OutzLG = 0x26,
    OutzHG = 0x27,
    OutxLA = 0x28,
    OutxHA = 0x29,
    OutyLA = 0x2A,
    OutyHA = 0x2B,
    OutzLA = 0x2C,
    OutzHA = 0x2D,
    EmbFuncStatusMainpage = 0x35,
    FsmStatusAMainpage = 0x36,
    FsmStatusBMainpage = 0x37,
    StatusMasterMainpage = 0x39,
    FifoStatus1 = 0x3A,
    FifoStatus2 = 0x3B,
    Timestamp0 = 0x40,
    Timestamp1 = 0x41,
    Timestamp2 = 0x42,
    Timestamp3 = 0x43,
    TapCfg0 = 0x56,
    TapCfg1 = 0x57,
    TapCfg2 = 0x58,
    TapThs6d = 0x59,
    IntDur2 = 0x5A,
    WakeUpThs = 0x5B,
    WakeUpDur = 0x5C,
    FreeFall = 0x5D,
    Md1Cfg = 0x5E,
    Md2Cfg = 0x5F,
    I3cBusAvb = 0x62,
    InternalFreqFine = 0x63,
    IntOis = 0x6F,
    Ctrl1Ois = 0x70,
    Ctrl2Ois = 0x71,
    Ctrl3Ois = 0x72,
    XOfsUsr = 0x73,
    YOfsUsr = 0x74,
    ZOfsUsr = 0x75,
    FifoDataOutTag = 0x78,
    FifoDataOutXL = 0x79,
    FifoDataOutXH = 0x7A,
    FifoDataOutYL = 0x7B,
    FifoDataOutYH = 0x7C,
    FifoDataOutZL = 0x7D,
    FifoDataOutZH = 0x7E,
}

impl Register {
    /// Register address
    #[must_use]
    pub const fn addr(self) -> u8 {
        self as u8
    }
}

impl From<Register> for u8 {
    fn from(register: Register) -> Self {
        register as u8
    }
}

// CTRL1_XL / CTRL2_G output data rate (bits 7:4)
/// Power-down output data rate
pub const ODR_POWER_DOWN: u8 = 0x00;
/// 416 Hz output data rate (high-performance)
pub const ODR_416HZ: u8 = 0x60;

// CTRL1_XL
/// Accelerometer full scale ±2 g (`FS_XL` = 00)
pub const XL_FS_2G: u8 = 0x00;
/// Accelerometer LPF2 output selection
pub const LPF2_XL_EN: u8 = 0x02;

// CTRL2_G
/// Gyroscope full scale 125 dps (`FS_125`)
pub const G_FS_125DPS: u8 = 0x02;

// CTRL3_C
/// Interrupt pins active low
pub const H_LACTIVE: u8 = 0x20;
/// Software reset
pub const SW_RESET: u8 = 0x01;

// CTRL4_C
/// Enable gyroscope digital LPF1
pub const LPF1_SEL_G: u8 = 0x02;

// CTRL6_C FTYPE (bits 2:0), gyroscope LPF1 bandwidth at 416 Hz
/// LPF1 cutoff 120.3 Hz
pub const FTYPE_120_3HZ: u8 = 0x03;

// CTRL7_G
/// Enable gyroscope digital high-pass filter
pub const HP_EN_G: u8 = 0x40;
/// Gyroscope high-pass cutoff 65 mHz (`HPM_G` = 01)
pub const HPM_G_65MHZ: u8 = 0x10;

// CTRL8_XL
/// Accelerometer high-pass slope filter disabled, LPF2 cutoff ODR/4
pub const XL_NO_HP_LPF2_ODR_4: u8 = 0x00;

// FIFO_CTRL4
/// FIFO disabled (bypass mode)
pub const FIFO_MODE_BYPASS: u8 = 0x00;

// INT1_CTRL
/// Accelerometer data-ready routed to INT1
pub const INT1_DRDY_XL: u8 = 0x01;

device_driver::create_device!(
    device_name: Lsm6dsoRegisters,
    dsl: {
        config {
            type RegisterAddressType = u8;
            type DefaultByteOrder = LE;
        }

        /// WHO_AM_I - Device identification (0x0F)
        /// Expected value: 0x6C
        register WhoAmI {
            const ADDRESS = 0x0F;
            const SIZE_BITS = 8;

            /// Device ID (should read 0x6C)
            who_am_i: uint = 0..8,
        },

        /// STATUS_REG - Data availability (0x1E)
        register StatusReg {
            const ADDRESS = 0x1E;
            const SIZE_BITS = 8;

            /// New accelerometer data available
            xlda: bool = 0,
            /// New gyroscope data available
            gda: bool = 1,
            /// New temperature data available
            tda: bool = 2,
            reserved_7_3: uint = 3..8,
        },
    }
);
