//! Board-level error kinds.
//!
//! Every variant is absorbed during bring-up: logged, recorded in the
//! [`BringupReport`](crate::bringup::BringupReport) and followed by a
//! degraded continuation.

use platform::{ClockMuxError, DiscoveryError, GpioId};
use thiserror_no_std::Error;

/// Diagnostic severity of an absorbed failure or milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Severity {
    /// Step tracing.
    Debug,
    /// Milestones.
    Info,
    /// Degraded but expected continuation.
    Warn,
    /// A resource the board wanted is unavailable.
    Error,
}

/// Failures absorbed during bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BoardError {
    /// A GPIO line could not be claimed.
    #[error("failed to acquire {pin}: {code}")]
    GpioAcquireFailed {
        /// Line requested.
        pin: GpioId,
        /// Negative errno.
        code: i32,
    },
    /// A system-controller block could not be resolved.
    #[error("failed to find {0} regmap")]
    RegmapNotFound(&'static str),
    /// A register read-modify-write failed.
    #[error("register 0x{reg:x} access failed: {code}")]
    RegisterAccess {
        /// Byte offset.
        reg: u32,
        /// Negative errno.
        code: i32,
    },
    /// The SoC identification device could not be created.
    #[error("failed to initialize soc device")]
    SocDeviceInitFailed,
    /// The discovery layer refused a device.
    #[error("device registration refused: {0}")]
    DiscoveryRejected(DiscoveryError),
    /// A step was not attempted because an earlier one failed.
    #[error("skipped after earlier failure")]
    DependencyFailed,
}

impl BoardError {
    /// Severity the failure is reported at.
    pub const fn severity(&self) -> Severity {
        match self {
            Self::SocDeviceInitFailed | Self::DependencyFailed => Severity::Warn,
            Self::GpioAcquireFailed { .. }
            | Self::RegmapNotFound(_)
            | Self::RegisterAccess { .. }
            | Self::DiscoveryRejected(_) => Severity::Error,
        }
    }
}

impl From<ClockMuxError> for BoardError {
    fn from(err: ClockMuxError) -> Self {
        match err {
            ClockMuxError::RegmapNotFound(compatible) => Self::RegmapNotFound(compatible),
            ClockMuxError::RegisterAccess { reg, code } => Self::RegisterAccess { reg, code },
        }
    }
}

impl From<DiscoveryError> for BoardError {
    fn from(err: DiscoveryError) -> Self {
        Self::DiscoveryRejected(err)
    }
}
