//! Binds a power sequencer to a platform device and registers it.
//!
//! This is the only place a peripheral is energised during boot. Afterwards
//! the consuming driver owns power transitions through the policy bound into
//! the descriptor.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use platform::{
    DeviceDiscovery, DiscoveryError, PeripheralDescriptor, PowerControl, PowerSequencer,
    PowerSequencerError, RejectedDescriptor,
};

/// Outcome of [`PeripheralRegistrar::register_if_ready`].
pub enum Registration<C> {
    /// Powered on and handed to the discovery layer.
    Registered,
    /// Sequencer construction had failed; nothing was powered or submitted.
    Skipped(PowerSequencerError),
    /// The discovery layer refused the descriptor. The peripheral was powered
    /// back off and its policy is returned to the caller, who now owns the
    /// lines.
    Rejected {
        /// Why the descriptor was refused.
        error: DiscoveryError,
        /// The policy, powered off.
        control: C,
    },
}

impl<C> Registration<C> {
    /// Whether the descriptor reached the discovery layer.
    pub fn is_registered(&self) -> bool {
        matches!(self, Self::Registered)
    }
}

/// Registers a peripheral's power policy under a fixed device name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeripheralRegistrar {
    name: &'static str,
}

impl PeripheralRegistrar {
    /// Registrar for the device named `name`.
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    /// Device name descriptors are registered under.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Power on and register `sequencer` if it was built successfully.
    ///
    /// A failed sequencer is never powered and never submitted; the board
    /// continues without the peripheral.
    pub fn register_if_ready<P, D, N>(
        &self,
        sequencer: Result<PowerSequencer<P, D>, PowerSequencerError>,
        discovery: &mut N,
    ) -> Registration<PowerSequencer<P, D>>
    where
        P: OutputPin + 'static,
        D: DelayNs + 'static,
        N: DeviceDiscovery,
    {
        let sequencer = match sequencer {
            Ok(sequencer) => sequencer,
            Err(err) => {
                warn!("failed to power on {}: {}", self.name, err.code());
                return Registration::Skipped(err);
            }
        };

        let mut descriptor = PeripheralDescriptor::new(self.name, sequencer);
        descriptor.control_mut().power_on();

        let outcome = discovery.add_peripheral(descriptor);
        if let Err(RejectedDescriptor { error, descriptor }) = outcome {
            error!("{} registration refused: {}", self.name, error);
            let mut control = descriptor.into_control();
            control.power_off();
            return Registration::Rejected { error, control };
        }
        debug!("{} registered", self.name);
        Registration::Registered
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;
    use platform::error::{EBUSY, ENODEV};
    use platform::mocks::{MockDelay, MockGpioRegistry, RecordingDiscovery};
    use platform::{Level, SequencerLine};

    use crate::config::{BoardConfig, WL_PWR_ON, WL_REG_ON};

    const REGISTRAR: PeripheralRegistrar = PeripheralRegistrar::new("wifi");

    #[test]
    fn registers_and_powers_ready_sequencer() {
        let mut gpio = MockGpioRegistry::new(128);
        let mut discovery = RecordingDiscovery::new();
        let wifi = BoardConfig::default().wifi;
        let seq = PowerSequencer::new(&mut gpio, &wifi, MockDelay::default());

        assert!(REGISTRAR.register_if_ready(seq, &mut discovery).is_registered());
        assert_eq!(discovery.peripheral_count(), 1);
        assert_eq!(discovery.devices()[0].name, "wifi");
        assert_eq!(discovery.devices()[0].instance, None);
        assert_eq!(gpio.level(WL_PWR_ON), Some(Level::High));
        assert_eq!(gpio.level(WL_REG_ON), Some(Level::High));
    }

    #[test]
    fn skips_failed_sequencer() {
        let mut gpio = MockGpioRegistry::new(128);
        gpio.claim_externally(WL_REG_ON);
        let mut discovery = RecordingDiscovery::new();
        let wifi = BoardConfig::default().wifi;
        let seq = PowerSequencer::new(&mut gpio, &wifi, MockDelay::default());

        let outcome = REGISTRAR.register_if_ready(seq, &mut discovery);
        assert!(matches!(
            outcome,
            Registration::Skipped(PowerSequencerError::GpioUnavailable {
                line: SequencerLine::Regulator,
                code: EBUSY
            })
        ));
        assert!(discovery.devices().is_empty());
        assert_eq!(gpio.transitions_to(WL_PWR_ON, Level::High), 0);
    }

    #[test]
    fn rejection_powers_off_and_returns_sequencer() {
        let mut gpio = MockGpioRegistry::new(128);
        let mut discovery = RecordingDiscovery::new();
        discovery.reject_with(ENODEV);
        let wifi = BoardConfig::default().wifi;
        let seq = PowerSequencer::new(&mut gpio, &wifi, MockDelay::default());

        let Registration::Rejected { error, mut control } =
            REGISTRAR.register_if_ready(seq, &mut discovery)
        else {
            panic!("refused descriptor must come back");
        };
        assert_eq!(error, DiscoveryError::Rejected { code: ENODEV });
        assert!(discovery.devices().is_empty());
        assert_eq!(control.level(), Some(Level::Low));
        assert_eq!(gpio.level(WL_PWR_ON), Some(Level::Low));
        assert_eq!(gpio.level(WL_REG_ON), Some(Level::Low));

        // Still drives the same lines.
        let requests = gpio.request_count();
        control.power_on();
        assert_eq!(gpio.level(WL_REG_ON), Some(Level::High));
        assert_eq!(gpio.request_count(), requests);
    }
}
