//! Lifecycle contract shared by all hardware and connectivity wrappers.

/// Uniform driver lifecycle.
///
/// `initialize` performs one-time setup and returns an error on unrecoverable
/// failure; the app continues degraded with the driver reporting not-ready.
/// `tick` must not block for more than a few milliseconds.
pub trait Driver {
    type Error;

    fn initialize(&mut self) -> Result<(), Self::Error>;

    /// Idempotent teardown; safe to call when not initialized.
    fn shutdown(&mut self);

    fn tick(&mut self, now_ms: u64);

    /// True once `initialize` completed successfully.
    fn is_ready(&self) -> bool;
}

/// Drivers with a live link (WiFi, BLE keyboard) report it separately from
/// readiness: a driver can be ready while the link is down.
pub trait ConnectivityDriver: Driver {
    fn is_connected(&self) -> bool;
}
