//! Board bring-up sequence.
//!
//! Bring-up runs four phases, once each, in a fixed order:
//!
//! ```text
//! [MapIo] --map_io()--> [InitIrq] --init_irq()--> [InitMachine] --init_machine()--> [InitLate] --init_late()--> [Done]
//! ```
//!
//! The phase is a type parameter of [`Bringup`], and each phase method
//! consumes the value and returns the next phase, so running a phase twice or
//! out of order does not compile.
//!
//! # init_machine ordering
//!
//! 1. SoC identification device
//! 2. Populate platform devices under it
//! 3. Route the Ethernet clock from the internal PLL
//! 4. Acquire the WiFi power lines, power on and register the policy
//! 5. Ethernet MAC (must follow 3: the MAC registers against that clock)
//! 6. Analog top-level block
//! 7. Runtime power management
//!
//! No sub-step failure stops the sequence. Each failure is logged, recorded
//! in the [`BringupReport`] with its severity and followed by a degraded
//! continuation. Steps that depend on a failed acquisition are skipped, never
//! attempted with partial state.

use core::marker::PhantomData;

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use platform::{
    DeviceDiscovery, GpioRegistry, PowerControl, PowerSequencer, PowerSequencerError,
    SequencerLine, SysconLookup,
};

use crate::config::{BoardConfig, WifiWiring, CPUFREQ_DEVICE_NAME};
use crate::error::{BoardError, Severity};
use crate::machine::MachineDescriptor;
use crate::registrar::{PeripheralRegistrar, Registration};
use crate::soc::{SocDevice, SocServices};

// ── Phases ───────────────────────────────────────────────────────────────────

/// The four bring-up phases in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BringupPhase {
    /// Static memory mappings.
    MapIo,
    /// Interrupt controller tree.
    InitIrq,
    /// Clocks, devices and peripherals.
    InitMachine,
    /// Frequency scaling and idle policy.
    InitLate,
}

impl BringupPhase {
    /// All phases in execution order.
    pub const ORDER: [Self; 4] = [Self::MapIo, Self::InitIrq, Self::InitMachine, Self::InitLate];

    /// Phase that follows this one.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::MapIo => Some(Self::InitIrq),
            Self::InitIrq => Some(Self::InitMachine),
            Self::InitMachine => Some(Self::InitLate),
            Self::InitLate => None,
        }
    }

    /// Short label used in diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MapIo => "map_io",
            Self::InitIrq => "init_irq",
            Self::InitMachine => "init_machine",
            Self::InitLate => "init_late",
        }
    }
}

/// Typestate markers for [`Bringup`].
pub mod phase {
    /// `map_io` is next.
    pub struct MapIo;
    /// `init_irq` is next.
    pub struct InitIrq;
    /// `init_machine` is next.
    pub struct InitMachine;
    /// `init_late` is next.
    pub struct InitLate;
    /// All phases have run.
    pub struct Done;
}

/// Maps a typestate marker to the phase it stands for.
pub trait PhaseMarker: sealed::Sealed {
    /// Phase that runs next, `None` once bring-up is done.
    const NEXT: Option<BringupPhase>;
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::phase::MapIo {}
    impl Sealed for super::phase::InitIrq {}
    impl Sealed for super::phase::InitMachine {}
    impl Sealed for super::phase::InitLate {}
    impl Sealed for super::phase::Done {}
}

impl PhaseMarker for phase::MapIo {
    const NEXT: Option<BringupPhase> = Some(BringupPhase::MapIo);
}
impl PhaseMarker for phase::InitIrq {
    const NEXT: Option<BringupPhase> = Some(BringupPhase::InitIrq);
}
impl PhaseMarker for phase::InitMachine {
    const NEXT: Option<BringupPhase> = Some(BringupPhase::InitMachine);
}
impl PhaseMarker for phase::InitLate {
    const NEXT: Option<BringupPhase> = Some(BringupPhase::InitLate);
}
impl PhaseMarker for phase::Done {
    const NEXT: Option<BringupPhase> = None;
}

// ── Report ───────────────────────────────────────────────────────────────────

/// Individual bring-up steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// Debug UART mapping.
    DebugLlIo,
    /// Power-management register mapping.
    PmMapIo,
    /// Bus-frequency register mapping.
    BusfreqMapIo,
    /// GPC device-tree node check.
    GpcCheck,
    /// Silicon revision detection.
    Revision,
    /// L2 cache controller.
    L2Cache,
    /// System reset controller.
    Src,
    /// Interrupt-controller tree.
    IrqChip,
    /// SoC identification device.
    SocDevice,
    /// Device-tree population.
    PopulateDevices,
    /// Ethernet clock routed from the internal PLL.
    FecClockMux,
    /// WiFi power and regulator lines acquired.
    WifiGpio,
    /// WiFi powered on (and registered, for [`WifiWiring::Registered`]).
    WifiPower,
    /// Ethernet MAC.
    EnetMac,
    /// Analog top-level block.
    Anatop,
    /// Runtime power management.
    PowerManagement,
    /// CPU frequency-scaling device.
    CpufreqDevice,
    /// Idle-state policy.
    CpuIdle,
}

impl Step {
    /// Phase the step belongs to.
    pub const fn phase(self) -> BringupPhase {
        match self {
            Self::DebugLlIo | Self::PmMapIo | Self::BusfreqMapIo => BringupPhase::MapIo,
            Self::GpcCheck | Self::Revision | Self::L2Cache | Self::Src | Self::IrqChip => {
                BringupPhase::InitIrq
            }
            Self::SocDevice
            | Self::PopulateDevices
            | Self::FecClockMux
            | Self::WifiGpio
            | Self::WifiPower
            | Self::EnetMac
            | Self::Anatop
            | Self::PowerManagement => BringupPhase::InitMachine,
            Self::CpufreqDevice | Self::CpuIdle => BringupPhase::InitLate,
        }
    }

    /// Short label used in diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DebugLlIo => "debug_ll_io",
            Self::PmMapIo => "pm_map_io",
            Self::BusfreqMapIo => "busfreq_map_io",
            Self::GpcCheck => "gpc_check",
            Self::Revision => "revision",
            Self::L2Cache => "l2cache",
            Self::Src => "src",
            Self::IrqChip => "irqchip",
            Self::SocDevice => "soc_device",
            Self::PopulateDevices => "populate",
            Self::FecClockMux => "fec_clock_mux",
            Self::WifiGpio => "wifi_gpio",
            Self::WifiPower => "wifi_power",
            Self::EnetMac => "enet_mac",
            Self::Anatop => "anatop",
            Self::PowerManagement => "pm",
            Self::CpufreqDevice => "cpufreq",
            Self::CpuIdle => "cpuidle",
        }
    }
}

/// Number of distinct [`Step`]s; bounds the report.
pub const MAX_STEPS: usize = 18;

/// What happened to one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepOutcome {
    /// Ran to completion.
    Done,
    /// Ran and failed; bring-up continued without it.
    Failed(BoardError),
    /// Not attempted because a prerequisite failed.
    Skipped(BoardError),
}

/// One entry of the bring-up trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepRecord {
    /// Step executed.
    pub step: Step,
    /// Its outcome.
    pub outcome: StepOutcome,
}

impl StepRecord {
    /// Severity the outcome was reported at.
    pub const fn severity(&self) -> Severity {
        match &self.outcome {
            StepOutcome::Done => Severity::Debug,
            StepOutcome::Failed(err) => err.severity(),
            StepOutcome::Skipped(_) => Severity::Warn,
        }
    }
}

/// Ordered trace of a bring-up run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BringupReport {
    phases: Vec<BringupPhase, 4>,
    steps: Vec<StepRecord, MAX_STEPS>,
}

impl BringupReport {
    /// Phases completed, in order.
    pub fn phases(&self) -> &[BringupPhase] {
        &self.phases
    }

    /// Every step executed, in order.
    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    /// Outcome of `step`, `None` if it never ran.
    pub fn outcome(&self, step: Step) -> Option<StepOutcome> {
        self.steps.iter().find(|r| r.step == step).map(|r| r.outcome)
    }

    /// Position of `step` in the trace.
    pub fn position(&self, step: Step) -> Option<usize> {
        self.steps.iter().position(|r| r.step == step)
    }

    /// Records that did not complete.
    pub fn failures(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps.iter().filter(|r| r.outcome != StepOutcome::Done)
    }

    /// Whether any step failed or was skipped.
    pub fn is_degraded(&self) -> bool {
        self.failures().next().is_some()
    }

    /// Highest severity recorded, `None` for an empty report.
    pub fn worst_severity(&self) -> Option<Severity> {
        self.steps.iter().map(StepRecord::severity).max()
    }

    fn record(&mut self, step: Step, outcome: StepOutcome) {
        debug!("{}: {}", step.phase().as_str(), step.as_str());
        if self.steps.push(StepRecord { step, outcome }).is_err() {
            warn!("bring-up report full, {} not recorded", step.as_str());
        }
    }

    fn complete(&mut self, phase: BringupPhase) {
        if self.phases.push(phase).is_err() {
            warn!("bring-up report full, {} not recorded", phase.as_str());
        }
        info!("{} complete", phase.as_str());
    }
}

// ── Orchestrator ─────────────────────────────────────────────────────────────

/// Everything bring-up drives, owned for the duration of the run.
pub struct BoardResources<S, G, X, N, D> {
    /// SoC services.
    pub soc: S,
    /// GPIO registry.
    pub gpio: G,
    /// System-controller lookup.
    pub syscon: X,
    /// Device-discovery layer.
    pub discovery: N,
    /// Delay source handed to power sequencers.
    pub delay: D,
}

/// Bring-up in progress; `P` is the phase that runs next.
pub struct Bringup<S, G: GpioRegistry, X, N, D, P> {
    machine: &'static MachineDescriptor,
    config: BoardConfig,
    resources: BoardResources<S, G, X, N, D>,
    report: BringupReport,
    wifi: Option<PowerSequencer<G::Line, D>>,
    _phase: PhantomData<P>,
}

impl<S, G: GpioRegistry, X, N, D, P: PhaseMarker> Bringup<S, G, X, N, D, P> {
    /// Phase that runs next, `None` once done.
    pub fn next_phase(&self) -> Option<BringupPhase> {
        P::NEXT
    }

    /// Trace so far.
    pub fn report(&self) -> &BringupReport {
        &self.report
    }

    /// Machine being brought up.
    pub fn machine(&self) -> &'static MachineDescriptor {
        self.machine
    }

    fn advance<Next>(mut self) -> Bringup<S, G, X, N, D, Next> {
        if let Some(done) = P::NEXT {
            self.report.complete(done);
        }
        Bringup {
            machine: self.machine,
            config: self.config,
            resources: self.resources,
            report: self.report,
            wifi: self.wifi,
            _phase: PhantomData,
        }
    }
}

impl<S, G, X, N, D> Bringup<S, G, X, N, D, phase::MapIo>
where
    S: SocServices,
    G: GpioRegistry,
    G::Line: 'static,
    X: SysconLookup,
    N: DeviceDiscovery,
    D: DelayNs + Clone + 'static,
{
    /// Start bring-up of `machine`.
    pub fn new(
        machine: &'static MachineDescriptor,
        config: BoardConfig,
        resources: BoardResources<S, G, X, N, D>,
    ) -> Self {
        info!("{}: starting bring-up", machine.name);
        Self {
            machine,
            config,
            resources,
            report: BringupReport::default(),
            wifi: None,
            _phase: PhantomData,
        }
    }

    /// Establish debug and power-management mappings.
    pub fn map_io(mut self) -> Bringup<S, G, X, N, D, phase::InitIrq> {
        let soc = &mut self.resources.soc;
        soc.debug_ll_io_init();
        self.report.record(Step::DebugLlIo, StepOutcome::Done);
        soc.pm_map_io();
        self.report.record(Step::PmMapIo, StepOutcome::Done);
        if self.config.busfreq {
            soc.busfreq_map_io();
            self.report.record(Step::BusfreqMapIo, StepOutcome::Done);
        }
        self.advance()
    }
}

impl<S, G, X, N, D> Bringup<S, G, X, N, D, phase::InitIrq>
where
    S: SocServices,
    G: GpioRegistry,
    G::Line: 'static,
    X: SysconLookup,
    N: DeviceDiscovery,
    D: DelayNs + Clone + 'static,
{
    /// Bring up the interrupt controller tree.
    ///
    /// Revision detection precedes the controllers because interrupt routing
    /// depends on it.
    pub fn init_irq(mut self) -> Bringup<S, G, X, N, D, phase::InitMachine> {
        let soc = &mut self.resources.soc;
        soc.gpc_check_dt();
        self.report.record(Step::GpcCheck, StepOutcome::Done);
        soc.init_revision();
        self.report.record(Step::Revision, StepOutcome::Done);
        soc.init_l2cache();
        self.report.record(Step::L2Cache, StepOutcome::Done);
        soc.src_init();
        self.report.record(Step::Src, StepOutcome::Done);
        soc.irqchip_init();
        self.report.record(Step::IrqChip, StepOutcome::Done);
        self.advance()
    }
}

impl<S, G, X, N, D> Bringup<S, G, X, N, D, phase::InitMachine>
where
    S: SocServices,
    G: GpioRegistry,
    G::Line: 'static,
    X: SysconLookup,
    N: DeviceDiscovery,
    D: DelayNs + Clone + 'static,
{
    /// Create devices, route clocks and power the WiFi module.
    pub fn init_machine(mut self) -> Bringup<S, G, X, N, D, phase::InitLate> {
        let parent = self.soc_device();

        self.resources
            .soc
            .populate_platform_devices(self.config.bus_match, parent.as_ref());
        self.report.record(Step::PopulateDevices, StepOutcome::Done);

        // Must precede the Ethernet MAC.
        let outcome = match self
            .config
            .fec_clock_mux
            .select_internal_pll_source(&mut self.resources.syscon, self.config.gpr_compatible)
        {
            Ok(()) => StepOutcome::Done,
            Err(err) => StepOutcome::Failed(err.into()),
        };
        self.report.record(Step::FecClockMux, outcome);

        self.wifi_power();

        self.resources
            .soc
            .enet_mac_init(self.config.fec_compatible, self.config.ocotp_compatible);
        self.report.record(Step::EnetMac, StepOutcome::Done);

        self.resources.soc.anatop_init();
        self.report.record(Step::Anatop, StepOutcome::Done);

        self.resources.soc.pm_init();
        self.report.record(Step::PowerManagement, StepOutcome::Done);

        self.advance()
    }

    fn soc_device(&mut self) -> Option<SocDevice> {
        if let Ok(device) = self.resources.soc.soc_device_init() {
            self.report.record(Step::SocDevice, StepOutcome::Done);
            return Some(device);
        }
        warn!("failed to initialize soc device");
        self.report.record(
            Step::SocDevice,
            StepOutcome::Failed(BoardError::SocDeviceInitFailed),
        );
        None
    }

    fn wifi_power(&mut self) {
        let sequencer = PowerSequencer::new(
            &mut self.resources.gpio,
            &self.config.wifi,
            self.resources.delay.clone(),
        );
        let gpio_outcome = match &sequencer {
            Ok(_) => StepOutcome::Done,
            Err(err) => StepOutcome::Failed(self.acquire_error(*err)),
        };
        self.report.record(Step::WifiGpio, gpio_outcome);

        let power_outcome = match self.config.wifi_wiring {
            WifiWiring::Registered => {
                let registrar = PeripheralRegistrar::new(self.config.wifi_device_name);
                match registrar.register_if_ready(sequencer, &mut self.resources.discovery) {
                    Registration::Registered => StepOutcome::Done,
                    Registration::Skipped(_) => StepOutcome::Skipped(BoardError::DependencyFailed),
                    Registration::Rejected { error, control } => {
                        // Refused policy stays with the board, powered off.
                        self.wifi = Some(control);
                        StepOutcome::Failed(error.into())
                    }
                }
            }
            WifiWiring::DirectPowerOn => {
                if let Ok(mut sequencer) = sequencer {
                    sequencer.power_on();
                    self.wifi = Some(sequencer);
                    StepOutcome::Done
                } else {
                    warn!("failed to power on wifi");
                    StepOutcome::Skipped(BoardError::DependencyFailed)
                }
            }
        };
        self.report.record(Step::WifiPower, power_outcome);
    }

    fn acquire_error(&self, err: PowerSequencerError) -> BoardError {
        let PowerSequencerError::GpioUnavailable { line, code } = err;
        let pin = match line {
            SequencerLine::Power => self.config.wifi.power.id,
            SequencerLine::Regulator => self.config.wifi.regulator.id,
        };
        BoardError::GpioAcquireFailed { pin, code }
    }
}

impl<S, G, X, N, D> Bringup<S, G, X, N, D, phase::InitLate>
where
    S: SocServices,
    G: GpioRegistry,
    G::Line: 'static,
    X: SysconLookup,
    N: DeviceDiscovery,
    D: DelayNs + Clone + 'static,
{
    /// Register frequency scaling and activate the idle policy.
    pub fn init_late(mut self) -> Bringup<S, G, X, N, D, phase::Done> {
        if self.config.cpufreq {
            let outcome = match self
                .resources
                .discovery
                .register_simple(CPUFREQ_DEVICE_NAME, None)
            {
                Ok(()) => StepOutcome::Done,
                Err(err) => {
                    warn!("failed to register {}: {}", CPUFREQ_DEVICE_NAME, err);
                    StepOutcome::Failed(err.into())
                }
            };
            self.report.record(Step::CpufreqDevice, outcome);
        }

        self.resources.soc.cpuidle_init();
        self.report.record(Step::CpuIdle, StepOutcome::Done);
        self.advance()
    }
}

impl<S, G: GpioRegistry, X, N, D> Bringup<S, G, X, N, D, phase::Done> {
    /// Hand the brought-up board to the caller.
    pub fn finish(self) -> Board<S, G, X, N, D> {
        if self.report.is_degraded() {
            warn!("{}: up with degraded peripherals", self.machine.name);
        } else {
            info!("{}: up", self.machine.name);
        }
        Board {
            machine: self.machine,
            resources: self.resources,
            report: self.report,
            wifi: self.wifi,
        }
    }
}

/// A board after bring-up.
pub struct Board<S, G: GpioRegistry, X, N, D> {
    machine: &'static MachineDescriptor,
    resources: BoardResources<S, G, X, N, D>,
    report: BringupReport,
    wifi: Option<PowerSequencer<G::Line, D>>,
}

impl<S, G: GpioRegistry, X, N, D> Board<S, G, X, N, D> {
    /// Machine that was brought up.
    pub fn machine(&self) -> &'static MachineDescriptor {
        self.machine
    }

    /// Trace of the run.
    pub fn report(&self) -> &BringupReport {
        &self.report
    }

    /// Resources, e.g. to keep serving the discovery layer.
    pub fn resources(&self) -> &BoardResources<S, G, X, N, D> {
        &self.resources
    }

    /// Mutable access to the resources.
    pub fn resources_mut(&mut self) -> &mut BoardResources<S, G, X, N, D> {
        &mut self.resources
    }

    /// WiFi sequencer kept by the board: powered on under
    /// [`WifiWiring::DirectPowerOn`], powered off when the discovery layer
    /// refused its descriptor.
    pub fn wifi_mut(&mut self) -> Option<&mut PowerSequencer<G::Line, D>> {
        self.wifi.as_mut()
    }

    /// Split into resources and report.
    pub fn into_parts(self) -> (BoardResources<S, G, X, N, D>, BringupReport) {
        (self.resources, self.report)
    }
}

/// Run every phase of bring-up in order.
pub fn run<S, G, X, N, D>(
    machine: &'static MachineDescriptor,
    config: BoardConfig,
    resources: BoardResources<S, G, X, N, D>,
) -> Board<S, G, X, N, D>
where
    S: SocServices,
    G: GpioRegistry,
    G::Line: 'static,
    X: SysconLookup,
    N: DeviceDiscovery,
    D: DelayNs + Clone + 'static,
{
    Bringup::new(machine, config, resources)
        .map_io()
        .init_irq()
        .init_machine()
        .init_late()
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_chain_in_order() {
        let chained: heapless::Vec<BringupPhase, 4> =
            core::iter::successors(Some(BringupPhase::MapIo), |p| p.next()).collect();
        assert_eq!(chained.as_slice(), &BringupPhase::ORDER);
    }

    #[test]
    fn steps_map_to_their_phase() {
        assert_eq!(Step::BusfreqMapIo.phase(), BringupPhase::MapIo);
        assert_eq!(Step::Revision.phase(), BringupPhase::InitIrq);
        assert_eq!(Step::FecClockMux.phase(), BringupPhase::InitMachine);
        assert_eq!(Step::CpuIdle.phase(), BringupPhase::InitLate);
    }

    #[test]
    fn record_severity_follows_outcome() {
        let done = StepRecord {
            step: Step::Src,
            outcome: StepOutcome::Done,
        };
        let skipped = StepRecord {
            step: Step::WifiPower,
            outcome: StepOutcome::Skipped(BoardError::DependencyFailed),
        };
        let soc = StepRecord {
            step: Step::SocDevice,
            outcome: StepOutcome::Failed(BoardError::SocDeviceInitFailed),
        };
        let mux = StepRecord {
            step: Step::FecClockMux,
            outcome: StepOutcome::Failed(BoardError::RegmapNotFound("x")),
        };
        assert_eq!(done.severity(), Severity::Debug);
        assert_eq!(skipped.severity(), Severity::Warn);
        assert_eq!(soc.severity(), Severity::Warn);
        assert_eq!(mux.severity(), Severity::Error);
    }

    #[test]
    fn empty_report_is_clean() {
        let report = BringupReport::default();
        assert!(!report.is_degraded());
        assert_eq!(report.worst_severity(), None);
        assert!(report.phases().is_empty());
    }
}
