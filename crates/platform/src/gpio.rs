//! GPIO line ownership.
//!
//! A [`GpioLine`] is an output line that has been claimed from the platform
//! [`GpioRegistry`] and driven to a known level. Holding the value is proof of
//! exclusive ownership: there is no way to set the level of a line that was
//! never acquired.

use embedded_hal::digital::{OutputPin, PinState};

use crate::error::AcquireError;

/// Lines per i.MX GPIO bank.
pub const IMX_BANK_WIDTH: u32 = 32;

/// Global GPIO number as used by the platform registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpioId(pub u32);

impl GpioId {
    /// i.MX numbering: banks are 1-based and [`IMX_BANK_WIDTH`] lines wide.
    ///
    /// `GpioId::imx(3, 30)` is GPIO3_IO30, global number 94. Bank 0, an index
    /// past the end of its bank and numbers beyond `u32` give `None`.
    pub const fn imx(bank: u32, index: u32) -> Option<Self> {
        if index >= IMX_BANK_WIDTH {
            return None;
        }
        let Some(first) = bank.checked_sub(1) else {
            return None;
        };
        let Some(base) = first.checked_mul(IMX_BANK_WIDTH) else {
            return None;
        };
        match base.checked_add(index) {
            Some(number) => Some(Self(number)),
            None => None,
        }
    }

    /// Raw global number.
    pub const fn number(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for GpioId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "gpio{}", self.0)
    }
}

/// Logic level of an output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    /// Logic 0, de-asserted.
    Low,
    /// Logic 1, asserted.
    High,
}

impl Level {
    /// Short label used in diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::High => "high",
        }
    }
}

impl core::fmt::Display for Level {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<bool> for Level {
    fn from(value: bool) -> Self {
        if value {
            Self::High
        } else {
            Self::Low
        }
    }
}

impl From<Level> for bool {
    fn from(value: Level) -> Self {
        matches!(value, Level::High)
    }
}

impl From<Level> for PinState {
    fn from(value: Level) -> Self {
        match value {
            Level::High => PinState::High,
            Level::Low => PinState::Low,
        }
    }
}

/// Line direction. Only outputs are modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Push-pull output.
    Output,
}

/// Platform GPIO registry: hands out exclusive output handles.
///
/// Implementations must configure the line as an output and drive it to
/// `initial` before returning, so the pin never floats between the claim and
/// the first write. A second request for the same line must fail with
/// [`EBUSY`](crate::error::EBUSY).
pub trait GpioRegistry {
    /// Handle for a claimed output line.
    type Line: OutputPin;

    /// Claim `id` as an output at `initial`. Errors are negative errnos.
    fn request_output(
        &mut self,
        id: GpioId,
        initial: Level,
        label: &'static str,
    ) -> Result<Self::Line, i32>;
}

/// A claimed, output-configured GPIO line.
pub struct GpioLine<P> {
    id: GpioId,
    name: &'static str,
    level: Level,
    pin: P,
}

impl<P: OutputPin> GpioLine<P> {
    /// Claim `id` from `registry` and drive it to `initial_level`.
    pub fn acquire<R>(
        registry: &mut R,
        id: GpioId,
        initial_level: Level,
        name: &'static str,
    ) -> Result<Self, AcquireError>
    where
        R: GpioRegistry<Line = P>,
    {
        let pin = registry
            .request_output(id, initial_level, name)
            .map_err(|code| AcquireError { pin: id, code })?;
        trace!("{} ({}) acquired at {}", name, id, initial_level);
        Ok(Self {
            id,
            name,
            level: initial_level,
            pin,
        })
    }

    /// Drive the line.
    ///
    /// A claimed output write is infallible on the supported SoCs. Should a
    /// backend still report an error it is logged and the cached level is
    /// left untouched.
    pub fn set_level(&mut self, level: Level) {
        match self.pin.set_state(level.into()) {
            Ok(()) => self.level = level,
            Err(_) => error!("{} ({}): write {} failed", self.name, self.id, level),
        }
    }

    /// Last level successfully driven onto the line.
    pub fn level(&self) -> Level {
        self.level
    }

    /// Registry identifier.
    pub fn id(&self) -> GpioId {
        self.id
    }

    /// Diagnostic label given at acquisition.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Always [`Direction::Output`].
    pub fn direction(&self) -> Direction {
        Direction::Output
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::{EBUSY, EINVAL};
    use crate::mocks::MockGpioRegistry;

    #[test]
    fn imx_numbering_matches_bank_layout() {
        assert_eq!(GpioId::imx(1, 0), Some(GpioId(0)));
        assert_eq!(GpioId::imx(3, 30), Some(GpioId(94)));
        assert_eq!(GpioId::imx(4, 0), Some(GpioId(96)));
    }

    #[test]
    fn imx_rejects_invalid_bank_and_index() {
        assert_eq!(GpioId::imx(0, 5), None);
        assert_eq!(GpioId::imx(3, 32), None);
        assert_eq!(GpioId::imx(u32::MAX, 0), None);
        assert_eq!(GpioId::imx(3, 31), Some(GpioId(95)));
    }

    #[test]
    fn acquire_drives_initial_level() {
        let mut gpio = MockGpioRegistry::new(128);
        let line = GpioLine::acquire(&mut gpio, GpioId(7), Level::High, "test").unwrap();
        assert_eq!(line.level(), Level::High);
        assert_eq!(gpio.level(GpioId(7)), Some(Level::High));
        assert_eq!(line.name(), "test");
        assert_eq!(line.direction(), Direction::Output);
    }

    #[test]
    fn double_acquire_is_busy() {
        let mut gpio = MockGpioRegistry::new(128);
        let _first = GpioLine::acquire(&mut gpio, GpioId(3), Level::Low, "a").unwrap();
        let err = GpioLine::acquire(&mut gpio, GpioId(3), Level::Low, "b")
            .err()
            .expect("second claim must fail");
        assert_eq!(
            err,
            AcquireError {
                pin: GpioId(3),
                code: EBUSY
            }
        );
    }

    #[test]
    fn nonexistent_line_is_invalid() {
        let mut gpio = MockGpioRegistry::new(16);
        let err = GpioLine::acquire(&mut gpio, GpioId(16), Level::Low, "x")
            .err()
            .expect("out of range line must fail");
        assert_eq!(err.code, EINVAL);
        assert_eq!(err.pin, GpioId(16));
    }

    #[test]
    fn set_level_tracks_state() {
        let mut gpio = MockGpioRegistry::new(8);
        let mut line = GpioLine::acquire(&mut gpio, GpioId(1), Level::Low, "l").unwrap();
        line.set_level(Level::High);
        assert_eq!(line.level(), Level::High);
        assert_eq!(gpio.level(GpioId(1)), Some(Level::High));
        line.set_level(Level::Low);
        assert_eq!(gpio.level(GpioId(1)), Some(Level::Low));
    }

    #[test]
    fn level_bool_conversions() {
        assert_eq!(Level::from(true), Level::High);
        assert!(!bool::from(Level::Low));
        assert_eq!(PinState::from(Level::High), PinState::High);
    }
}
