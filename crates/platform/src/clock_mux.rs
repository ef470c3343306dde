//! Peripheral clock-source selection through a system-controller block.
//!
//! On the i.MX6 SoloLite the Ethernet reference clock passes through two mux
//! stages in IOMUXC_GPR1. Clearing both selector fields routes it from the
//! internal PLL. Both stages must be cleared in one pass before any consumer
//! of that clock is registered.

use crate::error::ClockMuxError;
use crate::regmap::{Regmap, SysconLookup};

/// One selector field inside the control block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MuxField {
    /// Byte offset of the register holding the field.
    pub reg: u32,
    /// Bits belonging to the field.
    pub mask: u32,
    /// Value written into the field (pre-shifted).
    pub value: u32,
}

impl MuxField {
    /// Field cleared to zero, the internal-PLL selection.
    pub const fn cleared(reg: u32, mask: u32) -> Self {
        Self {
            reg,
            mask,
            value: 0,
        }
    }
}

/// Routes a peripheral clock by rewriting a fixed pair of mux fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockMuxConfigurator {
    stages: [MuxField; 2],
}

impl ClockMuxConfigurator {
    /// `primary` is written first, then `secondary`.
    pub const fn new(primary: MuxField, secondary: MuxField) -> Self {
        Self {
            stages: [primary, secondary],
        }
    }

    /// The fields in write order.
    pub fn stages(&self) -> &[MuxField; 2] {
        &self.stages
    }

    /// Resolve the block registered as `compatible` and clear both stages.
    ///
    /// Returns [`ClockMuxError::RegmapNotFound`] without any register access
    /// when the block cannot be resolved. The peripheral then keeps its
    /// reset-default clock source.
    ///
    /// Each stage is a masked read-modify-write through
    /// [`Regmap::update_bits`](crate::regmap::Regmap::update_bits), so a stage
    /// whose field is already clear is read but not written. From the reset
    /// value of GPR1 that is two writes; on an already-routed block, none.
    pub fn select_internal_pll_source<S: SysconLookup>(
        &self,
        syscon: &mut S,
        compatible: &'static str,
    ) -> Result<(), ClockMuxError> {
        let mut map = syscon.lookup_by_compatible(compatible).map_err(|_| {
            error!("failed to find {} regmap", compatible);
            ClockMuxError::RegmapNotFound(compatible)
        })?;

        for stage in &self.stages {
            if let Err(err) = map.update_bits(stage.reg, stage.mask, stage.value) {
                error!("{}: mux update at {} failed", compatible, stage.reg);
                return Err(err.into());
            }
            trace!("{}: reg {} mask {} <- {}", compatible, stage.reg, stage.mask, stage.value);
        }
        debug!("{}: clock routed from internal PLL", compatible);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::EIO;
    use crate::mocks::{MockRegmap, MockSyscon};

    const GPR1: u32 = 0x4;
    const MUX: ClockMuxConfigurator = ClockMuxConfigurator::new(
        MuxField::cleared(GPR1, 1 << 17),
        MuxField::cleared(GPR1, 3 << 14),
    );

    #[test]
    fn unresolvable_block_performs_no_writes() {
        let block = MockRegmap::with_register(GPR1, 0xFFFF_FFFF);
        let mut syscon = MockSyscon::new();
        syscon.register("vendor,other-gpr", block.clone());

        let result = MUX.select_internal_pll_source(&mut syscon, "vendor,missing");
        assert_eq!(result, Err(ClockMuxError::RegmapNotFound("vendor,missing")));
        assert_eq!(block.write_count(), 0);
    }

    #[test]
    fn resolvable_block_clears_both_fields_only() {
        let block = MockRegmap::with_register(GPR1, 0xFFFF_FFFF);
        let mut syscon = MockSyscon::new();
        syscon.register("vendor,gpr", block.clone());

        MUX.select_internal_pll_source(&mut syscon, "vendor,gpr").unwrap();

        let value = block.peek(GPR1).unwrap();
        assert_eq!(block.write_count(), 2);
        assert_eq!(value & (1 << 17), 0);
        assert_eq!(value & (3 << 14), 0);
        assert_eq!(value | (1 << 17) | (3 << 14), 0xFFFF_FFFF);
    }

    #[test]
    fn already_routed_block_is_not_rewritten() {
        let block = MockRegmap::with_register(GPR1, 0xFFFD_3FFF);
        let mut syscon = MockSyscon::new();
        syscon.register("vendor,gpr", block.clone());

        MUX.select_internal_pll_source(&mut syscon, "vendor,gpr").unwrap();

        assert_eq!(block.write_count(), 0);
        assert_eq!(block.peek(GPR1), Some(0xFFFD_3FFF));
    }

    #[test]
    fn only_set_stage_is_written() {
        let block = MockRegmap::with_register(GPR1, 0x0000_C000);
        let mut syscon = MockSyscon::new();
        syscon.register("vendor,gpr", block.clone());

        MUX.select_internal_pll_source(&mut syscon, "vendor,gpr").unwrap();

        assert_eq!(block.writes(), [(GPR1, 0)]);
    }

    #[test]
    fn stages_written_in_order() {
        let block = MockRegmap::with_register(GPR1, 0xFFFF_FFFF);
        let mut syscon = MockSyscon::new();
        syscon.register("vendor,gpr", block.clone());

        MUX.select_internal_pll_source(&mut syscon, "vendor,gpr").unwrap();

        let writes = block.writes();
        assert_eq!(writes, [(GPR1, 0xFFFD_FFFF), (GPR1, 0xFFFD_3FFF)]);
    }

    #[test]
    fn access_failure_is_reported() {
        let block = MockRegmap::with_register(GPR1, 0xFFFF_FFFF);
        block.fail_writes(EIO);
        let mut syscon = MockSyscon::new();
        syscon.register("vendor,gpr", block.clone());

        let result = MUX.select_internal_pll_source(&mut syscon, "vendor,gpr");
        assert_eq!(
            result,
            Err(ClockMuxError::RegisterAccess {
                reg: GPR1,
                code: EIO
            })
        );
    }
}
