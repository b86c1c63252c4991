//! Angle reporting
//!
//! Consumers never see the filter state directly: they read angles in tenths
//! of a degree with the zero offset applied, and ask whether an axis moved
//! enough since they last redrew it.

use core::f32::consts::PI;

use crate::fusion::Angles;

/// Radians to tenths of a degree
pub const TENTHS_OF_DEGREE_PER_RADIAN: f32 = 1800.0 / PI;

/// Radians to degrees
pub const DEGREES_PER_RADIAN: f32 = 180.0 / PI;

/// Smallest change, in degrees, that [`Reporting::has_changed`] reports
pub const CHANGE_THRESHOLD_DEG: f32 = 0.05;

/// Reported axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    /// Rotation around X
    Roll,
    /// Rotation around Y
    Pitch,
}

impl Axis {
    const fn index(self) -> usize {
        match self {
            Self::Roll => 0,
            Self::Pitch => 1,
        }
    }

    const fn of(self, angles: Angles) -> f32 {
        match self {
            Self::Roll => angles.roll,
            Self::Pitch => angles.pitch,
        }
    }
}

/// Zero offsets and change baselines
///
/// Offsets are added at query time only; zeroing never touches the filter.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reporting {
    offset: Angles,
    last_reported_deg: [f32; 2],
}

impl Reporting {
    /// Absolute mode, baselines at zero
    #[must_use]
    pub const fn new() -> Self {
        Self {
            offset: Angles {
                roll: 0.0,
                pitch: 0.0,
            },
            last_reported_deg: [0.0; 2],
        }
    }

    /// Whether a zero reference is set (relative mode)
    #[must_use]
    pub fn is_zeroed(&self) -> bool {
        self.offset != Angles::default()
    }

    /// Angle with the offset applied, in radians
    #[must_use]
    pub fn reported(&self, axis: Axis, angles: Angles) -> f32 {
        axis.of(angles) + axis.of(self.offset)
    }

    /// Angle with the offset applied, truncated to tenths of a degree
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn tenths_of_degree(&self, axis: Axis, angles: Angles) -> i16 {
        (self.reported(axis, angles) * TENTHS_OF_DEGREE_PER_RADIAN) as i16
    }

    /// Whether the reported angle moved more than [`CHANGE_THRESHOLD_DEG`]
    ///
    /// The baseline moves to the current value only when this returns `true`,
    /// so slow drift below the threshold accumulates until it is reported.
    pub fn has_changed(&mut self, axis: Axis, angles: Angles) -> bool {
        let current = self.reported(axis, angles) * DEGREES_PER_RADIAN;
        let last = &mut self.last_reported_deg[axis.index()];

        if libm::fabsf(current - *last) > CHANGE_THRESHOLD_DEG {
            *last = current;
            true
        } else {
            false
        }
    }

    /// Take the current attitude as the zero reference
    pub fn zero_down(&mut self, angles: Angles) {
        self.offset = Angles {
            roll: -angles.roll,
            pitch: -angles.pitch,
        };
    }

    /// Back to absolute mode
    pub fn cancel_zeroing(&mut self) {
        self.offset = Angles::default();
    }
}
