//! Register-map access for memory-mapped system-controller blocks.
//!
//! Blocks are looked up by a stable compatibility id through a
//! [`SysconLookup`]; the returned [`Regmap`] offers word reads and writes plus
//! a masked read-modify-write.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::error::RegmapError;

/// 32-bit register block addressed by byte offset.
pub trait Regmap {
    /// Read the register at `reg`.
    fn read(&mut self, reg: u32) -> Result<u32, RegmapError>;

    /// Write `value` to the register at `reg`.
    fn write(&mut self, reg: u32, value: u32) -> Result<(), RegmapError>;

    /// Replace the bits selected by `mask` with the matching bits of `value`.
    ///
    /// Bits outside `mask` are preserved. The write is skipped when the field
    /// already holds the requested value.
    fn update_bits(&mut self, reg: u32, mask: u32, value: u32) -> Result<(), RegmapError> {
        let current = self.read(reg)?;
        let updated = (current & !mask) | (value & mask);
        if updated != current {
            self.write(reg, updated)?;
        }
        Ok(())
    }
}

/// Resolves a system-controller block by compatibility id.
pub trait SysconLookup {
    /// Handle type for a resolved block.
    type Map: Regmap;

    /// Look up the block registered under `compatible`.
    ///
    /// A missing block is reported as [`RegmapError::NotFound`]; callers treat
    /// it as recoverable.
    fn lookup_by_compatible(&mut self, compatible: &'static str) -> Result<Self::Map, RegmapError>;
}

/// Regmap shared between execution contexts.
///
/// Every access, including the whole read-modify-write of
/// [`Regmap::update_bits`], runs inside one critical section so two field
/// updates on the same register cannot interleave.
pub struct SharedRegmap<M> {
    inner: Mutex<RefCell<M>>,
}

impl<M: Regmap> SharedRegmap<M> {
    /// Wrap `map` for shared use.
    pub const fn new(map: M) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(map)),
        }
    }

    /// Run `f` with exclusive access to the wrapped map.
    pub fn with<R>(&self, f: impl FnOnce(&mut M) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    /// Unwrap the inner map.
    pub fn into_inner(self) -> M {
        self.inner.into_inner().into_inner()
    }
}

impl<M: Regmap> Regmap for &SharedRegmap<M> {
    fn read(&mut self, reg: u32) -> Result<u32, RegmapError> {
        self.with(|map| map.read(reg))
    }

    fn write(&mut self, reg: u32, value: u32) -> Result<(), RegmapError> {
        self.with(|map| map.write(reg, value))
    }

    fn update_bits(&mut self, reg: u32, mask: u32, value: u32) -> Result<(), RegmapError> {
        self.with(|map| map.update_bits(reg, mask, value))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::MockRegmap;

    #[test]
    fn update_bits_preserves_unrelated_bits() {
        let mut map = MockRegmap::with_register(0x4, 0xFFFF_FFFF);
        map.update_bits(0x4, 0x0000_C000, 0).unwrap();
        assert_eq!(map.read(0x4).unwrap(), 0xFFFF_3FFF);
        assert_eq!(map.write_count(), 1);
    }

    #[test]
    fn update_bits_skips_noop_write() {
        let mut map = MockRegmap::with_register(0x4, 0x0000_0001);
        map.update_bits(0x4, 0x0000_0002, 0).unwrap();
        assert_eq!(map.write_count(), 0);
    }

    #[test]
    fn update_bits_sets_field() {
        let mut map = MockRegmap::with_register(0x8, 0);
        map.update_bits(0x8, 0xF0, 0xAB).unwrap();
        assert_eq!(map.read(0x8).unwrap(), 0xA0);
    }

    #[test]
    fn shared_regmap_serialises_updates() {
        let shared = SharedRegmap::new(MockRegmap::with_register(0x4, 0xFFFF_FFFF));
        let mut handle = &shared;
        handle.update_bits(0x4, 1 << 17, 0).unwrap();
        handle.update_bits(0x4, 3 << 14, 0).unwrap();
        let map = shared.into_inner();
        assert_eq!(map.peek(0x4), Some(0xFFFD_3FFF));
        assert_eq!(map.write_count(), 2);
    }
}
