//! Property tests for GPIO line acquisition.
//!
//! Whatever line and level is requested, the line reads back exactly the
//! level it was acquired at, and a second claim of the same line is refused.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use platform::error::EBUSY;
use platform::mocks::MockGpioRegistry;
use platform::{GpioId, GpioLine, Level};
use proptest::prelude::*;

const LINE_COUNT: u32 = 160;

proptest! {
    #[test]
    fn acquire_reads_back_initial_level(pin in 0u32..LINE_COUNT, high in any::<bool>()) {
        let mut gpio = MockGpioRegistry::new(LINE_COUNT);
        let level = Level::from(high);
        let line = GpioLine::acquire(&mut gpio, GpioId(pin), level, "prop").unwrap();
        prop_assert_eq!(line.level(), level);
        prop_assert_eq!(gpio.level(GpioId(pin)), Some(level));
    }

    #[test]
    fn second_acquire_is_always_busy(pin in 0u32..LINE_COUNT, high in any::<bool>()) {
        let mut gpio = MockGpioRegistry::new(LINE_COUNT);
        let level = Level::from(high);
        let _held = GpioLine::acquire(&mut gpio, GpioId(pin), level, "first").unwrap();
        let err = GpioLine::acquire(&mut gpio, GpioId(pin), Level::Low, "second")
            .err()
            .expect("line is already held");
        prop_assert_eq!(err.code, EBUSY);
        prop_assert_eq!(gpio.level(GpioId(pin)), Some(level));
    }

    #[test]
    fn out_of_range_lines_never_acquire(pin in LINE_COUNT..u32::MAX) {
        let mut gpio = MockGpioRegistry::new(LINE_COUNT);
        prop_assert!(GpioLine::acquire(&mut gpio, GpioId(pin), Level::Low, "oob").is_err());
        prop_assert!(gpio.history().is_empty());
    }
}
