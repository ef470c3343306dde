//! Mock implementations for testing
//!
//! Shared-state test doubles for every platform seam. Handles returned by a
//! mock (GPIO lines, regmaps) share state with the mock that issued them, so
//! a test can keep the mock and inspect what the code under test did with the
//! handle after it has been moved away.

#![cfg(any(test, feature = "std"))]
#![allow(clippy::arithmetic_side_effects)] // virtual clocks and counters in test doubles

use std::boxed::Box;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};

use crate::device::{DeviceDiscovery, PeripheralDescriptor, RejectedDescriptor};
use crate::error::{DiscoveryError, RegmapError, EBUSY, EINVAL};
use crate::gpio::{GpioId, GpioRegistry, Level};
use crate::power_seq::PowerControl;
use crate::regmap::{Regmap, SysconLookup};

// ── Time ─────────────────────────────────────────────────────────────────────

/// Microsecond clock advanced only by [`MockDelay`].
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now_us: Rc<Cell<u64>>,
}

impl VirtualClock {
    /// Clock starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time in microseconds.
    pub fn now_us(&self) -> u64 {
        self.now_us.get()
    }

    fn advance_ns(&self, ns: u64) {
        self.now_us.set(self.now_us.get().saturating_add(ns.div_ceil(1_000)));
    }
}

/// Delay that advances a [`VirtualClock`] instead of sleeping.
#[derive(Debug, Clone, Default)]
pub struct MockDelay {
    clock: VirtualClock,
    calls: Rc<Cell<usize>>,
}

impl MockDelay {
    /// Delay driving `clock`.
    pub fn new(clock: VirtualClock) -> Self {
        Self {
            clock,
            calls: Rc::default(),
        }
    }

    /// Number of delay requests made.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    /// The driven clock.
    pub fn clock(&self) -> &VirtualClock {
        &self.clock
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.calls.set(self.calls.get().saturating_add(1));
        self.clock.advance_ns(u64::from(ns));
    }

    fn delay_us(&mut self, us: u32) {
        self.calls.set(self.calls.get().saturating_add(1));
        self.clock.advance_ns(u64::from(us).saturating_mul(1_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.calls.set(self.calls.get().saturating_add(1));
        self.clock.advance_ns(u64::from(ms).saturating_mul(1_000_000));
    }
}

// ── GPIO ─────────────────────────────────────────────────────────────────────

/// One recorded level change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelEvent {
    /// Line driven.
    pub id: GpioId,
    /// Level driven.
    pub level: Level,
    /// Virtual time of the write.
    pub at_us: u64,
}

#[derive(Debug, Default)]
struct GpioState {
    line_count: u32,
    claimed: BTreeMap<GpioId, (&'static str, Level)>,
    failures: BTreeMap<GpioId, i32>,
    history: Vec<LevelEvent>,
    requests: usize,
}

impl GpioState {
    fn drive(&mut self, id: GpioId, level: Level, at_us: u64) {
        if let Some(entry) = self.claimed.get_mut(&id) {
            entry.1 = level;
        }
        self.history.push(LevelEvent { id, level, at_us });
    }
}

/// GPIO registry with `line_count` lines numbered from zero.
#[derive(Debug, Clone, Default)]
pub struct MockGpioRegistry {
    state: Rc<RefCell<GpioState>>,
    clock: VirtualClock,
}

impl MockGpioRegistry {
    /// Registry with its own clock.
    pub fn new(line_count: u32) -> Self {
        Self::with_clock(line_count, VirtualClock::new())
    }

    /// Registry timestamping writes with `clock`.
    pub fn with_clock(line_count: u32, clock: VirtualClock) -> Self {
        let state = GpioState {
            line_count,
            ..GpioState::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
            clock,
        }
    }

    /// Mark `id` as owned by someone else; requests fail with `EBUSY`.
    pub fn claim_externally(&self, id: GpioId) {
        self.state
            .borrow_mut()
            .claimed
            .insert(id, ("external", Level::Low));
    }

    /// Make requests for `id` fail with `code`.
    pub fn fail_with(&self, id: GpioId, code: i32) {
        self.state.borrow_mut().failures.insert(id, code);
    }

    /// Level of a line claimed through this registry, `None` if unclaimed.
    pub fn level(&self, id: GpioId) -> Option<Level> {
        let state = self.state.borrow();
        state
            .claimed
            .get(&id)
            .filter(|(label, _)| *label != "external")
            .map(|(_, level)| *level)
    }

    /// Label a line was claimed with.
    pub fn label(&self, id: GpioId) -> Option<&'static str> {
        self.state.borrow().claimed.get(&id).map(|(label, _)| *label)
    }

    /// Every level written so far, acquisitions included.
    pub fn history(&self) -> Vec<LevelEvent> {
        self.state.borrow().history.clone()
    }

    /// Number of level changes that drove `id` to `level`.
    pub fn transitions_to(&self, id: GpioId, level: Level) -> usize {
        self.state
            .borrow()
            .history
            .iter()
            .filter(|event| event.id == id && event.level == level)
            .count()
    }

    /// Forget recorded history.
    pub fn clear_history(&self) {
        self.state.borrow_mut().history.clear();
    }

    /// Number of `request_output` calls, failed ones included.
    pub fn request_count(&self) -> usize {
        self.state.borrow().requests
    }
}

impl GpioRegistry for MockGpioRegistry {
    type Line = MockLine;

    fn request_output(
        &mut self,
        id: GpioId,
        initial: Level,
        label: &'static str,
    ) -> Result<Self::Line, i32> {
        let mut state = self.state.borrow_mut();
        state.requests = state.requests.saturating_add(1);
        if id.number() >= state.line_count {
            return Err(EINVAL);
        }
        if let Some(code) = state.failures.get(&id) {
            return Err(*code);
        }
        if state.claimed.contains_key(&id) {
            return Err(EBUSY);
        }
        state.claimed.insert(id, (label, initial));
        state.drive(id, initial, self.clock.now_us());
        Ok(MockLine {
            id,
            state: Rc::clone(&self.state),
            clock: self.clock.clone(),
        })
    }
}

/// Output handle issued by [`MockGpioRegistry`].
#[derive(Debug)]
pub struct MockLine {
    id: GpioId,
    state: Rc<RefCell<GpioState>>,
    clock: VirtualClock,
}

impl ErrorType for MockLine {
    type Error = core::convert::Infallible;
}

impl OutputPin for MockLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.state
            .borrow_mut()
            .drive(self.id, Level::Low, self.clock.now_us());
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.state
            .borrow_mut()
            .drive(self.id, Level::High, self.clock.now_us());
        Ok(())
    }
}

// ── Register maps ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct RegmapState {
    registers: BTreeMap<u32, u32>,
    writes: Vec<(u32, u32)>,
    write_failure: Option<i32>,
}

/// In-memory register block. Clones share the same registers.
#[derive(Debug, Clone, Default)]
pub struct MockRegmap {
    state: Rc<RefCell<RegmapState>>,
}

impl MockRegmap {
    /// Empty block; unknown registers read as zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Block with one preset register.
    pub fn with_register(reg: u32, value: u32) -> Self {
        let map = Self::new();
        map.state.borrow_mut().registers.insert(reg, value);
        map
    }

    /// Register value without recording an access.
    pub fn peek(&self, reg: u32) -> Option<u32> {
        self.state.borrow().registers.get(&reg).copied()
    }

    /// Number of writes performed.
    pub fn write_count(&self) -> usize {
        self.state.borrow().writes.len()
    }

    /// All writes as `(reg, value)` in order.
    pub fn writes(&self) -> Vec<(u32, u32)> {
        self.state.borrow().writes.clone()
    }

    /// Make every subsequent write fail with `code`.
    pub fn fail_writes(&self, code: i32) {
        self.state.borrow_mut().write_failure = Some(code);
    }
}

impl Regmap for MockRegmap {
    fn read(&mut self, reg: u32) -> Result<u32, RegmapError> {
        Ok(self.peek(reg).unwrap_or(0))
    }

    fn write(&mut self, reg: u32, value: u32) -> Result<(), RegmapError> {
        let mut state = self.state.borrow_mut();
        if let Some(code) = state.write_failure {
            return Err(RegmapError::Access { reg, code });
        }
        state.registers.insert(reg, value);
        state.writes.push((reg, value));
        Ok(())
    }
}

/// System-controller lookup over a fixed table of mock blocks.
#[derive(Debug, Default)]
pub struct MockSyscon {
    blocks: Vec<(&'static str, MockRegmap)>,
    lookups: Vec<&'static str>,
}

impl MockSyscon {
    /// Lookup with no registered blocks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `map` resolvable as `compatible`.
    pub fn register(&mut self, compatible: &'static str, map: MockRegmap) {
        self.blocks.push((compatible, map));
    }

    /// Compatibility ids looked up so far.
    pub fn lookups(&self) -> &[&'static str] {
        &self.lookups
    }
}

impl SysconLookup for MockSyscon {
    type Map = MockRegmap;

    fn lookup_by_compatible(&mut self, compatible: &'static str) -> Result<Self::Map, RegmapError> {
        self.lookups.push(compatible);
        self.blocks
            .iter()
            .find(|(name, _)| *name == compatible)
            .map(|(_, map)| map.clone())
            .ok_or(RegmapError::NotFound(compatible))
    }
}

// ── Device discovery ─────────────────────────────────────────────────────────

/// A device accepted by [`RecordingDiscovery`].
pub struct RegisteredDevice {
    /// Device name.
    pub name: &'static str,
    /// Instance id, `None` for singletons.
    pub instance: Option<u32>,
    /// Bound power-control policy; `None` for simple devices.
    pub control: Option<Box<dyn PowerControl>>,
}

/// Discovery layer that keeps every registered device for inspection.
#[derive(Default)]
pub struct RecordingDiscovery {
    devices: Vec<RegisteredDevice>,
    rejection: Option<i32>,
}

impl RecordingDiscovery {
    /// Layer accepting everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every subsequent registration with `code`.
    pub fn reject_with(&mut self, code: i32) {
        self.rejection = Some(code);
    }

    /// Registered devices in registration order.
    pub fn devices(&self) -> &[RegisteredDevice] {
        &self.devices
    }

    /// Number of devices carrying a power-control policy.
    pub fn peripheral_count(&self) -> usize {
        self.devices.iter().filter(|d| d.control.is_some()).count()
    }

    /// Policy bound to the device named `name`, to drive it as a driver would.
    pub fn power_control(&mut self, name: &str) -> Option<&mut (dyn PowerControl + 'static)> {
        self.devices
            .iter_mut()
            .find(|d| d.name == name)
            .and_then(|d| d.control.as_deref_mut())
    }

    fn admission(&self, name: &str, instance: Option<u32>) -> Result<(), DiscoveryError> {
        if let Some(code) = self.rejection {
            return Err(DiscoveryError::Rejected { code });
        }
        if self
            .devices
            .iter()
            .any(|d| d.name == name && d.instance == instance)
        {
            return Err(DiscoveryError::Duplicate);
        }
        Ok(())
    }
}

impl DeviceDiscovery for RecordingDiscovery {
    fn add_peripheral<C>(
        &mut self,
        descriptor: PeripheralDescriptor<C>,
    ) -> Result<(), RejectedDescriptor<C>>
    where
        C: PowerControl + 'static,
    {
        let name = descriptor.name();
        let instance = descriptor.instance();
        if let Err(error) = self.admission(name, instance) {
            return Err(RejectedDescriptor { error, descriptor });
        }
        self.devices.push(RegisteredDevice {
            name,
            instance,
            control: Some(Box::new(descriptor.into_control())),
        });
        Ok(())
    }

    fn register_simple(
        &mut self,
        name: &'static str,
        instance: Option<u32>,
    ) -> Result<(), DiscoveryError> {
        self.admission(name, instance)?;
        self.devices.push(RegisteredDevice {
            name,
            instance,
            control: None,
        });
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn delay_advances_shared_clock() {
        let clock = VirtualClock::new();
        let mut delay = MockDelay::new(clock.clone());
        delay.delay_ms(5);
        delay.delay_us(3);
        assert_eq!(clock.now_us(), 5_003);
        assert_eq!(delay.calls(), 2);
    }

    #[test]
    fn registry_handles_share_state() {
        let mut gpio = MockGpioRegistry::new(4);
        let mut line = gpio.request_output(GpioId(2), Level::Low, "l").unwrap();
        line.set_high().unwrap();
        assert_eq!(gpio.level(GpioId(2)), Some(Level::High));
        assert_eq!(gpio.label(GpioId(2)), Some("l"));
        assert_eq!(gpio.transitions_to(GpioId(2), Level::High), 1);
    }

    #[test]
    fn discovery_rejects_duplicates() {
        let mut discovery = RecordingDiscovery::new();
        discovery.register_simple("dev", None).unwrap();
        assert_eq!(discovery.register_simple("dev", None), Err(DiscoveryError::Duplicate));
        assert!(discovery.register_simple("dev", Some(1)).is_ok());
    }

    struct Noop;

    impl PowerControl for Noop {
        fn power_on(&mut self) {}
        fn power_off(&mut self) {}
        fn reset(&mut self) {}
    }

    #[test]
    fn refused_descriptor_is_handed_back() {
        let mut discovery = RecordingDiscovery::new();
        discovery.reject_with(-19);
        let refused = discovery
            .add_peripheral(PeripheralDescriptor::new("wifi", Noop))
            .err()
            .unwrap();
        assert_eq!(refused.error, DiscoveryError::Rejected { code: -19 });
        assert_eq!(refused.descriptor.name(), "wifi");
        assert!(discovery.devices().is_empty());
    }
}
