//! Mock SoC services for host-side testing
//!
//! Implements [`SocServices`] without any hardware dependency. Records every
//! call in order for assertion in tests.

use heapless::Vec;

use super::{SocDevice, SocInitError, SocServices};

/// Upper bound on recorded calls; one bring-up makes fourteen.
pub const MAX_CALLS: usize = 32;

/// One recorded service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SocCall {
    /// [`SocServices::debug_ll_io_init`]
    DebugLlIoInit,
    /// [`SocServices::pm_map_io`]
    PmMapIo,
    /// [`SocServices::busfreq_map_io`]
    BusfreqMapIo,
    /// [`SocServices::gpc_check_dt`]
    GpcCheckDt,
    /// [`SocServices::init_revision`]
    InitRevision,
    /// [`SocServices::init_l2cache`]
    InitL2Cache,
    /// [`SocServices::src_init`]
    SrcInit,
    /// [`SocServices::irqchip_init`]
    IrqchipInit,
    /// [`SocServices::soc_device_init`]
    SocDeviceInit,
    /// [`SocServices::populate_platform_devices`], with whether a parent was given.
    PopulatePlatformDevices {
        /// A SoC device was passed as parent.
        with_parent: bool,
    },
    /// [`SocServices::enet_mac_init`]
    EnetMacInit,
    /// [`SocServices::anatop_init`]
    AnatopInit,
    /// [`SocServices::pm_init`]
    PmInit,
    /// [`SocServices::cpuidle_init`]
    CpuidleInit,
}

/// Mock SoC: records all calls for test assertions.
#[derive(Debug, Default)]
pub struct MockSoc {
    /// Calls in the order they were made.
    pub calls: Vec<SocCall, MAX_CALLS>,
    /// Make [`SocServices::soc_device_init`] fail.
    pub fail_soc_device: bool,
    /// Revision reported by the SoC device.
    pub revision: u32,
    /// Compatibility ids passed to [`SocServices::enet_mac_init`].
    pub enet_compatibles: Option<(&'static str, &'static str)>,
}

impl MockSoc {
    /// Create a new mock with every service succeeding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock whose SoC device creation fails.
    pub fn failing_soc_device() -> Self {
        Self {
            fail_soc_device: true,
            ..Self::default()
        }
    }

    /// Position of the first call matching `call`.
    pub fn position(&self, call: SocCall) -> Option<usize> {
        self.calls.iter().position(|c| *c == call)
    }

    /// Number of times `call` was made.
    pub fn count(&self, call: SocCall) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }

    fn record(&mut self, call: SocCall) {
        // A full trace only happens if bring-up loops, which tests catch by count.
        let _ = self.calls.push(call);
    }
}

impl SocServices for MockSoc {
    fn debug_ll_io_init(&mut self) {
        self.record(SocCall::DebugLlIoInit);
    }

    fn pm_map_io(&mut self) {
        self.record(SocCall::PmMapIo);
    }

    fn busfreq_map_io(&mut self) {
        self.record(SocCall::BusfreqMapIo);
    }

    fn gpc_check_dt(&mut self) {
        self.record(SocCall::GpcCheckDt);
    }

    fn init_revision(&mut self) {
        self.record(SocCall::InitRevision);
    }

    fn init_l2cache(&mut self) {
        self.record(SocCall::InitL2Cache);
    }

    fn src_init(&mut self) {
        self.record(SocCall::SrcInit);
    }

    fn irqchip_init(&mut self) {
        self.record(SocCall::IrqchipInit);
    }

    fn soc_device_init(&mut self) -> Result<SocDevice, SocInitError> {
        self.record(SocCall::SocDeviceInit);
        if self.fail_soc_device {
            Err(SocInitError::DeviceInitFailed)
        } else {
            Ok(SocDevice {
                revision: self.revision,
            })
        }
    }

    fn populate_platform_devices(
        &mut self,
        _bus_match: &'static [&'static str],
        parent: Option<&SocDevice>,
    ) {
        self.record(SocCall::PopulatePlatformDevices {
            with_parent: parent.is_some(),
        });
    }

    fn enet_mac_init(&mut self, fec_compatible: &'static str, ocotp_compatible: &'static str) {
        self.record(SocCall::EnetMacInit);
        self.enet_compatibles = Some((fec_compatible, ocotp_compatible));
    }

    fn anatop_init(&mut self) {
        self.record(SocCall::AnatopInit);
    }

    fn pm_init(&mut self) {
        self.record(SocCall::PmInit);
    }

    fn cpuidle_init(&mut self) {
        self.record(SocCall::CpuidleInit);
    }
}
