//! Error kinds raised by the platform seams.
//!
//! None of these abort bring-up. Callers absorb them, emit a diagnostic and
//! continue in a degraded but defined state.

use thiserror_no_std::Error;

use crate::gpio::GpioId;

/// Linux-style errno: resource busy (line already claimed).
pub const EBUSY: i32 = -16;
/// Linux-style errno: invalid argument (no such line).
pub const EINVAL: i32 = -22;
/// Linux-style errno: no such device (regmap not resolvable).
pub const ENODEV: i32 = -19;
/// Linux-style errno: I/O error on a register access.
pub const EIO: i32 = -5;

/// A GPIO line could not be claimed from the platform registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("failed to acquire {pin}: {code}")]
pub struct AcquireError {
    /// The line that was requested.
    pub pin: GpioId,
    /// Negative errno reported by the registry.
    pub code: i32,
}

/// Which of the two sequencer lines a failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequencerLine {
    /// Power-rail enable (asserted first).
    Power,
    /// Regulator enable (asserted second).
    Regulator,
}

impl SequencerLine {
    /// Short label used in diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Power => "power",
            Self::Regulator => "regulator",
        }
    }
}

impl core::fmt::Display for SequencerLine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Construction of a [`PowerSequencer`](crate::power_seq::PowerSequencer) failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerSequencerError {
    /// One of the two control lines could not be acquired.
    #[error("{line} GPIO unavailable: {code}")]
    GpioUnavailable {
        /// Which line failed.
        line: SequencerLine,
        /// Negative errno from the registry.
        code: i32,
    },
}

impl PowerSequencerError {
    /// The errno carried by the failure.
    pub const fn code(&self) -> i32 {
        match self {
            Self::GpioUnavailable { code, .. } => *code,
        }
    }
}

/// Register-map resolution or access failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegmapError {
    /// No register block is registered under the compatibility id.
    #[error("no regmap for {0}")]
    NotFound(&'static str),
    /// A read or write to an offset inside the block failed.
    #[error("register 0x{reg:x} access failed: {code}")]
    Access {
        /// Byte offset of the register.
        reg: u32,
        /// Negative errno.
        code: i32,
    },
}

/// Clock-mux reconfiguration failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockMuxError {
    /// The control block could not be resolved; no write was attempted.
    #[error("failed to find {0} regmap")]
    RegmapNotFound(&'static str),
    /// The block resolved but a read-modify-write failed part way.
    #[error("mux update at 0x{reg:x} failed: {code}")]
    RegisterAccess {
        /// Byte offset of the register.
        reg: u32,
        /// Negative errno.
        code: i32,
    },
}

impl From<RegmapError> for ClockMuxError {
    fn from(err: RegmapError) -> Self {
        match err {
            RegmapError::NotFound(compatible) => Self::RegmapNotFound(compatible),
            RegmapError::Access { reg, code } => Self::RegisterAccess { reg, code },
        }
    }
}

/// The device-discovery layer refused a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DiscoveryError {
    /// A device with the same name and instance is already registered.
    #[error("device already registered")]
    Duplicate,
    /// The layer rejected the device for its own reasons.
    #[error("device rejected: {code}")]
    Rejected {
        /// Negative errno.
        code: i32,
    },
}
