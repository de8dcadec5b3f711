#![allow(dead_code)]

use tracing_subscriber::filter::LevelFilter;
use weft::{Manager, ManagerBuilder, ManualClock};

/// Routes runtime logs to the test output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(LevelFilter::DEBUG)
        .try_init();
}

/// A manager driven by a clock that only moves when told to.
pub fn manual_manager() -> (Manager, ManualClock) {
    init_tracing();

    let clock = ManualClock::new();
    let manager = ManagerBuilder::new().clock(clock.clone()).build();

    (manager, clock)
}
