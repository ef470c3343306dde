//! SoC services invoked during bring-up.
//!
//! Memory mapping, interrupt-controller setup, the SoC identification
//! device, device-tree population, Ethernet MAC setup and power management
//! are provided by the surrounding platform. Bring-up only decides *when*
//! each runs.
//!
//! - `mock` - in-process recording implementation for host tests

pub mod mock;

pub use mock::{MockSoc, SocCall};

use thiserror_no_std::Error;

/// Handle to the SoC identification device, parent of populated devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SocDevice {
    /// Silicon revision read at device creation.
    pub revision: u32,
}

/// The SoC identification device could not be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SocInitError {
    /// Driver-model registration of the SoC device failed.
    #[error("soc device init failed")]
    DeviceInitFailed,
}

/// Platform services, grouped by the phase that calls them.
pub trait SocServices {
    // ── map_io ───────────────────────────────────────────────────────────
    /// Map the low-level debug UART.
    fn debug_ll_io_init(&mut self);

    /// Map power-management registers.
    fn pm_map_io(&mut self);

    /// Map bus-frequency scaling registers.
    fn busfreq_map_io(&mut self);

    // ── init_irq ─────────────────────────────────────────────────────────
    /// Check the device tree carries a GPC node.
    fn gpc_check_dt(&mut self);

    /// Read the silicon revision from the analog block.
    fn init_revision(&mut self);

    /// Bring up the L2 cache controller.
    fn init_l2cache(&mut self);

    /// Bring up the system reset controller.
    fn src_init(&mut self);

    /// Probe the interrupt-controller tree.
    fn irqchip_init(&mut self);

    // ── init_machine ─────────────────────────────────────────────────────
    /// Create the SoC identification device.
    fn soc_device_init(&mut self) -> Result<SocDevice, SocInitError>;

    /// Create platform devices from the device tree under `parent`.
    fn populate_platform_devices(
        &mut self,
        bus_match: &'static [&'static str],
        parent: Option<&SocDevice>,
    );

    /// Set up the Ethernet MAC, reading its address from the OTP block.
    fn enet_mac_init(&mut self, fec_compatible: &'static str, ocotp_compatible: &'static str);

    /// Bring up the analog top-level block.
    fn anatop_init(&mut self);

    /// Enable runtime power management.
    fn pm_init(&mut self);

    // ── init_late ────────────────────────────────────────────────────────
    /// Activate the idle-state policy.
    fn cpuidle_init(&mut self);
}
