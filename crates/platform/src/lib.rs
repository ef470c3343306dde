//! Hardware abstraction seams for SoC board bring-up.
//!
//! This crate holds the board-independent half of bring-up: owning GPIO
//! lines, sequencing a GPIO-powered peripheral, routing clocks through
//! system-controller registers and describing peripherals to the platform's
//! device-discovery layer. Every hardware touch point is a trait so the same
//! code runs against real registers and against the [`mocks`].
//!
//! # Architecture Layers
//!
//! ```text
//! Board bring-up (board crate: phases, machine table, registrar)
//!         ↓
//! Platform seams (this crate)
//!         ↓
//! SoC drivers (GPIO controller, syscon, driver model)
//! ```
//!
//! # Modules
//!
//! - [`gpio`] - Exclusive output-line ownership
//! - [`power_seq`] - Power-on / power-off / reset of a two-line peripheral
//! - [`regmap`] - System-controller register blocks
//! - [`clock_mux`] - Peripheral clock-source selection
//! - [`device`] - Peripheral descriptors and the discovery seam
//! - [`error`] - Error kinds
//!
//! # Features
//!
//! - `std`: Enable the shared-state test doubles in [`mocks`]
//! - `defmt`: defmt diagnostics and `defmt::Format` derives
//! - `tracing`: tracing diagnostics for host builds
//!
//! # Example
//!
//! ```no_run
//! use embedded_hal::delay::DelayNs;
//! use platform::{GpioRegistry, PowerControl, PowerSequencer, SequencerConfig};
//!
//! fn bring_up<R: GpioRegistry, D: DelayNs>(gpio: &mut R, config: &SequencerConfig, delay: D) {
//!     if let Ok(mut seq) = PowerSequencer::new(gpio, config, delay) {
//!         seq.power_on();
//!     }
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // register and pin names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors, callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

#[cfg(feature = "std")]
extern crate std;

// Must come first so the logging macros are visible to every module.
mod fmt;

pub mod clock_mux;
pub mod device;
pub mod error;
pub mod gpio;
pub mod mocks;
pub mod power_seq;
pub mod regmap;

pub use clock_mux::{ClockMuxConfigurator, MuxField};
pub use device::{DeviceDiscovery, PeripheralDescriptor, RejectedDescriptor};
pub use error::{
    AcquireError, ClockMuxError, DiscoveryError, PowerSequencerError, RegmapError, SequencerLine,
};
pub use gpio::{Direction, GpioId, GpioLine, GpioRegistry, Level};
pub use power_seq::{
    LineSpec, PowerControl, PowerSequencer, SequencerConfig, DEFAULT_SETTLE_DELAY_MS,
};
pub use regmap::{Regmap, SharedRegmap, SysconLookup};
