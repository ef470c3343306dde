//! Peripheral descriptors and the device-discovery seam.

use crate::error::DiscoveryError;
use crate::power_seq::PowerControl;

/// A logical platform device carrying its power-control policy.
///
/// Built once at bring-up and handed to the discovery layer, which owns it
/// for the life of the board.
pub struct PeripheralDescriptor<C> {
    name: &'static str,
    instance: Option<u32>,
    control: C,
}

impl<C: PowerControl> PeripheralDescriptor<C> {
    /// Singleton device named `name`.
    pub fn new(name: &'static str, control: C) -> Self {
        Self {
            name,
            instance: None,
            control,
        }
    }

    /// Device name matched by the consuming driver.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Instance id; `None` for a singleton.
    pub fn instance(&self) -> Option<u32> {
        self.instance
    }

    /// Borrow the bound power-control policy.
    pub fn control_mut(&mut self) -> &mut C {
        &mut self.control
    }

    /// Give up the descriptor, keeping only the policy.
    pub fn into_control(self) -> C {
        self.control
    }
}

/// A descriptor the discovery layer refused, handed back with the reason.
///
/// The caller still owns the policy and with it the peripheral's lines.
pub struct RejectedDescriptor<C> {
    /// Why the layer refused the device.
    pub error: DiscoveryError,
    /// The descriptor as it was submitted.
    pub descriptor: PeripheralDescriptor<C>,
}

/// The platform's device-discovery layer.
pub trait DeviceDiscovery {
    /// Register a peripheral whose power is driven through `descriptor`'s
    /// policy. The layer may call the policy at any later time.
    ///
    /// A refused descriptor is returned inside [`RejectedDescriptor`].
    fn add_peripheral<C>(
        &mut self,
        descriptor: PeripheralDescriptor<C>,
    ) -> Result<(), RejectedDescriptor<C>>
    where
        C: PowerControl + 'static;

    /// Register a resource-less device by name.
    fn register_simple(
        &mut self,
        name: &'static str,
        instance: Option<u32>,
    ) -> Result<(), DiscoveryError>;
}
