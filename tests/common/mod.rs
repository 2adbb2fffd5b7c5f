pub mod mocks;
pub mod model;

/// Routes `log` output to the test harness.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
