//! Unit conversion and sensor fusion
//!
//! One burst read covers `OUT_TEMP_L` through `OUTZ_H_A`: temperature,
//! gyroscope X/Y/Z and accelerometer X/Y/Z, each a little-endian
//! two's-complement word. The words are decoded explicitly, converted with
//! the sensitivities of the configured full scales, and fused into roll and
//! pitch by a complementary filter.
//!
//! # Filter
//!
//! The accelerometer gives a drift-free but noisy tilt estimate, the
//! gyroscope a smooth but drifting one. Body rates are first transformed into
//! Euler-angle rates using the current estimate, integrated over one sample
//! period and blended with the accelerometer estimate:
//!
//! ```text
//! φ_acc = asin(ax / 1000)             θ_acc = atan(ay / az)
//! φ̇ = gx + sin φ·tan θ·gy + cos φ·tan θ·gz
//! θ̇ = cos φ·gy − sin φ·gz
//! φ' = (1 − α)(φ + φ̇·Δt) + α·φ_acc
//! θ' = (1 − α)(θ + θ̇·Δt) + α·θ_acc
//! ```

use crate::registers::Register;

/// First register of the burst read
pub const SAMPLE_FIRST_REGISTER: Register = Register::OutTempL;

/// Number of bytes in one burst read (`OUT_TEMP_L` ..= `OUTZ_H_A`)
pub const SAMPLE_BLOCK_LEN: usize = (Register::OutzHA as usize) - (Register::OutTempL as usize) + 1;

/// Temperature at which the temperature output reads 0
pub const BASE_TEMPERATURE_C: f32 = 25.0;

/// Temperature sensitivity: 256 LSB/°C (AN5192)
pub const TEMPERATURE_SENSITIVITY: f32 = 0.003_906_25;

/// Gyroscope sensitivity at 125 dps: 4.375 mdps/LSB, expressed in rad/s
pub const GYRO_SENSITIVITY_125DPS_RADPS: f32 = 0.000_076_358_155;

/// Accelerometer sensitivity at ±2 g in mG/LSB
pub const ACCEL_SENSITIVITY_2G_MG: f32 = 0.061;

/// Weight of the accelerometer estimate in the blend
pub const ALPHA: f32 = 0.02;

/// Sample period at 416 Hz in seconds
pub const SAMPLE_PERIOD_S: f32 = 1.0 / 416.0;

/// Gravity reference in mG
pub const GRAVITY_MG: f32 = 1000.0;

/// Bytes of one burst read, as received
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSampleBlock(pub [u8; SAMPLE_BLOCK_LEN]);

impl RawSampleBlock {
    /// Mutable view of the bytes, for the transport to fill
    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.0
    }

    /// Decode the little-endian words
    #[must_use]
    pub fn decode(&self) -> RawSample {
        let bytes = &self.0;
        let word = |index: usize| i16::from_le_bytes([bytes[2 * index], bytes[2 * index + 1]]);

        RawSample {
            temperature: word(0),
            gyro: [word(1), word(2), word(3)],
            accel: [word(4), word(5), word(6)],
        }
    }
}

/// Decoded raw sample, in LSB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    /// Temperature output
    pub temperature: i16,
    /// Gyroscope X, Y, Z
    pub gyro: [i16; 3],
    /// Accelerometer X, Y, Z
    pub accel: [i16; 3],
}

impl RawSample {
    /// Encode back into the layout of a burst read
    #[must_use]
    pub fn to_block(&self) -> RawSampleBlock {
        let mut block = RawSampleBlock::default();
        let words = [
            self.temperature,
            self.gyro[0],
            self.gyro[1],
            self.gyro[2],
            self.accel[0],
            self.accel[1],
            self.accel[2],
        ];
        for (chunk, word) in block.0.chunks_exact_mut(2).zip(words) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        block
    }
}

/// Sample converted to physical units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhysicalSample {
    /// Angular rate per axis in rad/s
    pub gyro_radps: [f32; 3],
    /// Acceleration per axis in mG
    pub accel_mg: [f32; 3],
}

impl PhysicalSample {
    /// Apply the gyroscope and accelerometer sensitivities
    #[must_use]
    pub fn from_raw(raw: &RawSample) -> Self {
        Self {
            gyro_radps: raw.gyro.map(|lsb| f32::from(lsb) * GYRO_SENSITIVITY_125DPS_RADPS),
            accel_mg: raw.accel.map(|lsb| f32::from(lsb) * ACCEL_SENSITIVITY_2G_MG),
        }
    }
}

/// Convert a raw temperature output to °C
#[must_use]
pub fn temperature_to_celsius(raw: i16) -> f32 {
    BASE_TEMPERATURE_C + f32::from(raw) * TEMPERATURE_SENSITIVITY
}

/// Temperature, recomputed only when the raw output changes
///
/// The temperature output refreshes at 52 Hz at most, far slower than the
/// measuring loop.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Temperature {
    previous_raw: i16,
    celsius: f32,
}

impl Default for Temperature {
    fn default() -> Self {
        Self {
            previous_raw: 0,
            celsius: BASE_TEMPERATURE_C,
        }
    }
}

impl Temperature {
    /// Feed a raw output; returns whether the value was recomputed
    pub fn update(&mut self, raw: i16) -> bool {
        if raw == self.previous_raw {
            return false;
        }
        self.celsius = temperature_to_celsius(raw);
        self.previous_raw = raw;
        true
    }

    /// Latest temperature in °C
    #[must_use]
    pub const fn celsius(&self) -> f32 {
        self.celsius
    }
}

/// Roll and pitch in radians
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Angles {
    /// Rotation around X in radians
    pub roll: f32,
    /// Rotation around Y in radians
    pub pitch: f32,
}

/// Tilt estimated from the accelerometer alone
///
/// The `asin` argument is clamped so that a reading slightly above 1 g
/// cannot produce NaN and poison the filter state. With no acceleration on
/// either Y or Z (a zeroed read, free fall) the pitch is undefined and
/// `previous.pitch` is returned instead; a zero Z with a non-zero Y still
/// gives ±π/2.
#[must_use]
pub fn accelerometer_angles(accel_mg: [f32; 3], previous: Angles) -> Angles {
    let [ax, ay, az] = accel_mg;
    let ratio = ay / az;
    Angles {
        roll: libm::asinf((ax / GRAVITY_MG).clamp(-1.0, 1.0)),
        pitch: if ratio.is_nan() {
            previous.pitch
        } else {
            libm::atanf(ratio)
        },
    }
}

/// Complementary filter state
///
/// [`update`](Self::update) is the only way the estimate moves; it must run
/// once per sample so the integration stays in step with the sample rate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ComplementaryFilter {
    angles: Angles,
}

impl ComplementaryFilter {
    /// Filter starting at a level attitude
    #[must_use]
    pub const fn new() -> Self {
        Self {
            angles: Angles {
                roll: 0.0,
                pitch: 0.0,
            },
        }
    }

    /// Current estimate
    #[must_use]
    pub const fn angles(&self) -> Angles {
        self.angles
    }

    /// Fuse one sample into the estimate and return it
    pub fn update(&mut self, sample: &PhysicalSample) -> Angles {
        let estimate = accelerometer_angles(sample.accel_mg, self.angles);
        let [gx, gy, gz] = sample.gyro_radps;
        let Angles { roll, pitch } = self.angles;

        let (sin_roll, cos_roll) = (libm::sinf(roll), libm::cosf(roll));
        let tan_pitch = libm::tanf(pitch);

        // body rates to Euler rates
        let roll_rate = gx + sin_roll * tan_pitch * gy + cos_roll * tan_pitch * gz;
        let pitch_rate = cos_roll * gy - sin_roll * gz;

        self.angles = Angles {
            roll: (1.0 - ALPHA) * (roll + roll_rate * SAMPLE_PERIOD_S) + ALPHA * estimate.roll,
            pitch: (1.0 - ALPHA) * (pitch + pitch_rate * SAMPLE_PERIOD_S) + ALPHA * estimate.pitch,
        };
        debug_assert!(
            self.angles.roll.is_finite() && self.angles.pitch.is_finite(),
            "filter state left the finite range"
        );
        self.angles
    }
}
