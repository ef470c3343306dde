//! Board configuration and constants
//!
//! Pin assignments, compatibility ids and register layouts for the i.MX6
//! SoloLite board. Everything bring-up touches is named here so the
//! orchestrator carries no magic numbers.

use platform::{
    ClockMuxConfigurator, GpioId, LineSpec, MuxField, SequencerConfig, DEFAULT_SETTLE_DELAY_MS,
};

/// WiFi power-rail enable (GPIO3_IO30).
pub const WL_PWR_ON: GpioId = imx_pin(3, 30);

/// WiFi regulator enable (GPIO4_IO00).
pub const WL_REG_ON: GpioId = imx_pin(4, 0);

/// Pin-table entry; an invalid bank or index fails const evaluation.
#[allow(clippy::panic)] // only evaluated in const items
const fn imx_pin(bank: u32, index: u32) -> GpioId {
    match GpioId::imx(bank, index) {
        Some(id) => id,
        None => panic!("invalid i.MX GPIO bank or index"),
    }
}

/// Registry label for [`WL_PWR_ON`].
pub const WL_PWR_ON_LABEL: &str = "wl_pwr_on";

/// Registry label for [`WL_REG_ON`].
pub const WL_REG_ON_LABEL: &str = "wl_reg_on";

/// Name of the WiFi power-sequencing device matched by the SDIO driver.
pub const WIFI_DEVICE_NAME: &str = "brcmfmac-pwrseq";

/// IOMUXC general-purpose register block.
pub const IOMUXC_GPR_COMPATIBLE: &str = "fsl,imx6sl-iomuxc-gpr";

/// Byte offset of IOMUXC_GPR1.
pub const IOMUXC_GPR1: u32 = 0x04;

/// GPR1 FEC clock mux stage 1 selector, bits 15:14.
pub const GPR1_FEC_CLOCK_MUX1_SEL_MASK: u32 = 0x0000_C000;

/// GPR1 FEC clock mux stage 2 selector, bit 17.
pub const GPR1_FEC_CLOCK_MUX2_SEL_MASK: u32 = 0x0002_0000;

/// Ethernet MAC compatibility id.
pub const FEC_COMPATIBLE: &str = "fsl,imx6sl-fec";

/// On-chip OTP controller holding the fused MAC address.
pub const OCOTP_COMPATIBLE: &str = "fsl,imx6sl-ocotp";

/// CPU frequency-scaling driver device (shared with i.MX6Q).
pub const CPUFREQ_DEVICE_NAME: &str = "imx6q-cpufreq";

/// Bus types whose children are populated from the device tree.
pub const DEFAULT_BUS_MATCH: &[&str] = &["simple-bus", "simple-mfd", "isa", "arm,amba-bus"];

/// How the WiFi power lines are wired into the rest of the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WifiWiring {
    /// Power policy registered as a platform device; the SDIO driver drives
    /// power transitions after boot.
    Registered,
    /// Earlier board revision: powered on once at boot, no device submitted.
    /// The board keeps the sequencer.
    DirectPowerOn,
}

/// Complete bring-up configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    /// WiFi power and regulator lines plus reset hold time.
    pub wifi: SequencerConfig,
    /// WiFi wiring variant.
    pub wifi_wiring: WifiWiring,
    /// Device name for the registered WiFi policy.
    pub wifi_device_name: &'static str,
    /// Compatibility id of the block holding the FEC clock mux.
    pub gpr_compatible: &'static str,
    /// FEC clock mux fields, cleared stage 2 first.
    pub fec_clock_mux: ClockMuxConfigurator,
    /// Ethernet MAC compatibility id.
    pub fec_compatible: &'static str,
    /// OTP block holding the MAC address.
    pub ocotp_compatible: &'static str,
    /// Populate match table handed to the device-tree layer.
    pub bus_match: &'static [&'static str],
    /// Register the CPU frequency-scaling device in init_late.
    pub cpufreq: bool,
    /// Map bus-frequency scaling registers in map_io.
    pub busfreq: bool,
}

impl BoardConfig {
    /// Production configuration for the i.MX6 SoloLite board.
    pub const fn imx6sl() -> Self {
        Self {
            wifi: SequencerConfig {
                power: LineSpec {
                    id: WL_PWR_ON,
                    name: WL_PWR_ON_LABEL,
                },
                regulator: LineSpec {
                    id: WL_REG_ON,
                    name: WL_REG_ON_LABEL,
                },
                settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            },
            wifi_wiring: WifiWiring::Registered,
            wifi_device_name: WIFI_DEVICE_NAME,
            gpr_compatible: IOMUXC_GPR_COMPATIBLE,
            fec_clock_mux: ClockMuxConfigurator::new(
                MuxField::cleared(IOMUXC_GPR1, GPR1_FEC_CLOCK_MUX2_SEL_MASK),
                MuxField::cleared(IOMUXC_GPR1, GPR1_FEC_CLOCK_MUX1_SEL_MASK),
            ),
            fec_compatible: FEC_COMPATIBLE,
            ocotp_compatible: OCOTP_COMPATIBLE,
            bus_match: DEFAULT_BUS_MATCH,
            cpufreq: cfg!(feature = "cpufreq"),
            busfreq: cfg!(feature = "busfreq"),
        }
    }

    /// Same board with the given WiFi wiring.
    pub const fn with_wifi_wiring(mut self, wiring: WifiWiring) -> Self {
        self.wifi_wiring = wiring;
        self
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::imx6sl()
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn wifi_pins_use_imx_numbering() {
        assert_eq!(WL_PWR_ON.number(), 94);
        assert_eq!(WL_REG_ON.number(), 96);
    }

    #[test]
    fn mux_masks_do_not_overlap() {
        assert_eq!(GPR1_FEC_CLOCK_MUX1_SEL_MASK & GPR1_FEC_CLOCK_MUX2_SEL_MASK, 0);
        assert_eq!(GPR1_FEC_CLOCK_MUX1_SEL_MASK, 0x3 << 14);
        assert_eq!(GPR1_FEC_CLOCK_MUX2_SEL_MASK, 0x1 << 17);
    }

    #[test]
    fn default_clears_stage_two_first() {
        let config = BoardConfig::default();
        let stages = config.fec_clock_mux.stages();
        assert_eq!(stages[0].mask, GPR1_FEC_CLOCK_MUX2_SEL_MASK);
        assert_eq!(stages[1].mask, GPR1_FEC_CLOCK_MUX1_SEL_MASK);
        assert!(stages.iter().all(|s| s.value == 0 && s.reg == IOMUXC_GPR1));
    }

    #[test]
    fn default_wiring_registers_policy() {
        let config = BoardConfig::default();
        assert_eq!(config.wifi_wiring, WifiWiring::Registered);
        assert_eq!(config.wifi.settle_delay_ms, 5);
        assert_eq!(config.wifi.power.name, "wl_pwr_on");
        assert_eq!(config.wifi.regulator.name, "wl_reg_on");
    }
}
