//! i.MX6 SoloLite board bring-up.
//!
//! Drives the four boot phases of the board in order, routes the Ethernet
//! clock, powers the WiFi module through a GPIO power sequencer and hands its
//! power policy to the device-discovery layer.
//!
//! # Architecture
//!
//! ```text
//! Embedding firmware (selects a machine, supplies resources)
//!         ↓
//! Bring-up phases (this crate)
//!         ↓
//! Platform seams (platform crate: GPIO, regmap, power sequencer, discovery)
//! ```
//!
//! # Features
//!
//! - `cpufreq` (default) - Register the CPU frequency-scaling device in init_late
//! - `busfreq` - Map bus-frequency scaling registers in map_io
//! - `defmt` - defmt diagnostics and `defmt::Format` derives
//! - `tracing` - tracing diagnostics for host builds
//! - `std` - Enable the platform test doubles
//!
//! # Example
//!
//! ```no_run
//! use board::{bringup, machine, BoardConfig, BoardResources, MockSoc};
//! use platform::mocks::{MockDelay, MockGpioRegistry, MockSyscon, RecordingDiscovery};
//!
//! let resources = BoardResources {
//!     soc: MockSoc::new(),
//!     gpio: MockGpioRegistry::new(128),
//!     syscon: MockSyscon::new(),
//!     discovery: RecordingDiscovery::new(),
//!     delay: MockDelay::default(),
//! };
//! let board = bringup::run(&machine::IMX6SL, BoardConfig::imx6sl(), resources);
//! assert_eq!(board.report().phases().len(), 4);
//! ```

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![warn(clippy::dbg_macro)]
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::type_complexity)] // typestate generics over five resources

// Must come first so the logging macros are visible to every module.
mod fmt;

pub mod bringup;
pub mod config;
pub mod error;
pub mod machine;
pub mod registrar;
pub mod soc;

pub use bringup::{
    Board, BoardResources, Bringup, BringupPhase, BringupReport, Step, StepOutcome, StepRecord,
};
pub use config::{BoardConfig, WifiWiring};
pub use error::{BoardError, Severity};
pub use machine::{select_machine, MachineDescriptor, MACHINES};
pub use registrar::{PeripheralRegistrar, Registration};
pub use soc::{MockSoc, SocCall, SocDevice, SocInitError, SocServices};
