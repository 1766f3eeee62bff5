//! Initialization for slicescope-rs.

/// Installs the `env_logger` logger and announces the library.
///
/// Calling it again, or after another logger was installed, only logs.
///
/// # Example
///
/// ```no_run
/// slicescope::init();
/// ```
pub fn init() {
    if env_logger::try_init().is_err() {
        log::debug!("logger already installed");
    }
    log::info!("slicescope initialized");
}
