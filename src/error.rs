//! Layered error codes
//!
//! Every failure starts as a single frame naming the function and the step
//! that failed. Each caller that propagates it pushes its own frame, so the
//! final code reads from the state that gave up down to the transport call
//! that timed out.

use core::fmt;

/// Maximum number of frames kept in an [`ErrorCode`]
pub const MAX_ERROR_DEPTH: usize = 4;

/// What went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    /// An SPI wait exceeded its budget
    Timeout,
    /// Register address above the last register of the device
    InvalidRegister,
    /// Buffer too small for the requested transfer
    InvalidArguments,
    /// Operation attempted before a bus was bound
    NotInitialized,
    /// The identity register never returned the expected value
    DeviceIdentityMismatch,
    /// No data-ready signal within the state budget
    DataNotReady,
}

/// How bad it is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Severity {
    /// Recoverable by the caller, usually a single bus hiccup
    Warning,
    /// The acquisition cannot continue
    Critical,
}

/// Function or state that recorded a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Function {
    /// Burst register read
    ReadRegisters = 1,
    /// Single register write
    WriteRegister = 2,
    /// Identity check state
    CheckDeviceId = 3,
    /// Configuration state
    Configuring = 4,
    /// Transient sample discard state
    Dropping = 5,
    /// Steady-state measuring
    Measuring = 6,
    /// Hold request (sensor power-down)
    Holding = 7,
}

/// One layer of an error code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    /// Where the failure was recorded
    pub function: Function,
    /// Step number inside that function
    pub step: u8,
}

/// Layered error code
///
/// Frames are stored innermost first. [`function`](Self::function) and
/// [`step`](Self::step) report the outermost frame, which is the one the
/// acquisition state machine recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ErrorCode {
    kind: ErrorKind,
    severity: Severity,
    frames: [Frame; MAX_ERROR_DEPTH],
    depth: u8,
}

impl ErrorCode {
    /// Create a code with a single frame
    #[must_use]
    pub const fn new(function: Function, step: u8, kind: ErrorKind, severity: Severity) -> Self {
        let frame = Frame { function, step };
        Self {
            kind,
            severity,
            frames: [frame; MAX_ERROR_DEPTH],
            depth: 1,
        }
    }

    /// Add the caller's frame on top of this code
    ///
    /// Once [`MAX_ERROR_DEPTH`] frames are stored the outermost one is
    /// replaced, so the innermost cause is never lost.
    #[must_use]
    pub const fn push(mut self, function: Function, step: u8) -> Self {
        let frame = Frame { function, step };
        if (self.depth as usize) < MAX_ERROR_DEPTH {
            self.frames[self.depth as usize] = frame;
            self.depth += 1;
        } else {
            self.frames[MAX_ERROR_DEPTH - 1] = frame;
        }
        self
    }

    /// Raise the severity to critical
    #[must_use]
    pub const fn critical(mut self) -> Self {
        self.severity = Severity::Critical;
        self
    }

    /// Kind of the root cause
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Severity of the failure
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Whether the acquisition cannot continue
    #[must_use]
    pub const fn is_critical(&self) -> bool {
        matches!(self.severity, Severity::Critical)
    }

    /// Function of the outermost frame
    #[must_use]
    pub const fn function(&self) -> Function {
        self.outermost().function
    }

    /// Step of the outermost frame
    #[must_use]
    pub const fn step(&self) -> u8 {
        self.outermost().step
    }

    /// Frame recorded where the failure originated
    #[must_use]
    pub const fn root(&self) -> Frame {
        self.frames[0]
    }

    /// All frames, innermost first
    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames[..self.depth as usize]
    }

    const fn outermost(&self) -> Frame {
        self.frames[self.depth as usize - 1]
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({:?})", self.kind, self.severity)?;
        for frame in self.frames().iter().rev() {
            write!(f, " <- {:?}#{}", frame.function, frame.step)?;
        }
        Ok(())
    }
}

impl core::error::Error for ErrorCode {}
