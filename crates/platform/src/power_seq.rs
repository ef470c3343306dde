//! Power sequencing for a GPIO-controlled peripheral.
//!
//! The peripheral is fed by two control lines:
//!
//! ```text
//! power_on:   PWR_ON  low -> high, then REG_ON  low -> high
//! power_off:  PWR_ON high -> low,  then REG_ON high -> low
//! reset:      power_off, hold low for settle_delay, power_on
//! ```
//!
//! The rail enable is always asserted before the regulator enable; asserting
//! the regulator enable on a dead rail can latch the regulator in an
//! undefined state. The settle delay gives the peripheral's power-on-reset
//! circuit a clean low period.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::error::{PowerSequencerError, SequencerLine};
use crate::gpio::{GpioId, GpioLine, GpioRegistry, Level};

/// Default hold time between power-off and power-on during [`PowerControl::reset`].
pub const DEFAULT_SETTLE_DELAY_MS: u32 = 5;

/// Power-control policy handed to a device-discovery layer.
///
/// The consuming driver may invoke these at any time after registration
/// (driver bind, suspend, resume); each call must leave the hardware in the same
/// state as the boot-time invocation.
pub trait PowerControl {
    /// Energise the peripheral.
    fn power_on(&mut self);

    /// De-energise the peripheral, leaving it safe to re-power.
    fn power_off(&mut self);

    /// Power-cycle with a guaranteed low period.
    fn reset(&mut self);
}

impl<T: PowerControl + ?Sized> PowerControl for &mut T {
    fn power_on(&mut self) {
        (**self).power_on();
    }

    fn power_off(&mut self) {
        (**self).power_off();
    }

    fn reset(&mut self) {
        (**self).reset();
    }
}

/// Identity of one control line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpec {
    /// Registry identifier.
    pub id: GpioId,
    /// Label recorded with the registry.
    pub name: &'static str,
}

/// Static description of a sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencerConfig {
    /// Power-rail enable line.
    pub power: LineSpec,
    /// Regulator enable line.
    pub regulator: LineSpec,
    /// Low hold time used by `reset`, in milliseconds.
    pub settle_delay_ms: u32,
}

/// Owns the power and regulator enable lines of one peripheral.
pub struct PowerSequencer<P, D> {
    power_line: GpioLine<P>,
    regulator_line: GpioLine<P>,
    settle_delay_ms: u32,
    delay: D,
}

impl<P: OutputPin, D: DelayNs> PowerSequencer<P, D> {
    /// Acquire both lines de-asserted.
    ///
    /// Fails without touching the other line's level if either acquisition
    /// fails. The peripheral is never powered on from here.
    pub fn new<R>(
        registry: &mut R,
        config: &SequencerConfig,
        delay: D,
    ) -> Result<Self, PowerSequencerError>
    where
        R: GpioRegistry<Line = P>,
    {
        let power_line = Self::claim(registry, config.power, SequencerLine::Power)?;
        let regulator_line = Self::claim(registry, config.regulator, SequencerLine::Regulator)?;

        Ok(Self {
            power_line,
            regulator_line,
            settle_delay_ms: config.settle_delay_ms,
            delay,
        })
    }

    fn claim<R>(
        registry: &mut R,
        spec: LineSpec,
        which: SequencerLine,
    ) -> Result<GpioLine<P>, PowerSequencerError>
    where
        R: GpioRegistry<Line = P>,
    {
        GpioLine::acquire(registry, spec.id, Level::Low, spec.name).map_err(|err| {
            error!("Failed to request {} GPIO {}: {}", which, err.pin, err.code);
            PowerSequencerError::GpioUnavailable {
                line: which,
                code: err.code,
            }
        })
    }

    /// Current level of both lines, `None` while they disagree.
    pub fn level(&self) -> Option<Level> {
        let power = self.power_line.level();
        (power == self.regulator_line.level()).then_some(power)
    }

    /// Configured reset hold time.
    pub fn settle_delay_ms(&self) -> u32 {
        self.settle_delay_ms
    }

    /// Power-rail enable line.
    pub fn power_line(&self) -> &GpioLine<P> {
        &self.power_line
    }

    /// Regulator enable line.
    pub fn regulator_line(&self) -> &GpioLine<P> {
        &self.regulator_line
    }

    fn drive(&mut self, level: Level) {
        self.power_line.set_level(level);
        self.regulator_line.set_level(level);
    }
}

impl<P: OutputPin, D: DelayNs> PowerControl for PowerSequencer<P, D> {
    fn power_on(&mut self) {
        debug!("{}/{}: power on", self.power_line.name(), self.regulator_line.name());
        self.drive(Level::High);
    }

    fn power_off(&mut self) {
        debug!("{}/{}: power off", self.power_line.name(), self.regulator_line.name());
        self.drive(Level::Low);
    }

    fn reset(&mut self) {
        self.power_off();
        self.delay.delay_ms(self.settle_delay_ms);
        self.power_on();
    }
}
