//! Connectivity state shared between async network workers and the UI loop.

use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use wordly_core::driver::{ConnectivityDriver, Driver};

/// WiFi state for logs and the status bar.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum WifiState {
    Disconnected = 0,
    Connecting = 1,
    LinkUpNoIp = 2,
    Connected = 3,
}

impl WifiState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::Connecting,
            2 => Self::LinkUpNoIp,
            3 => Self::Connected,
            _ => Self::Disconnected,
        }
    }
}

/// Immutable WiFi snapshot for the UI loop.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WifiSnapshot {
    pub state: WifiState,
    pub link_up: bool,
    pub has_ipv4: bool,
    pub revision: u32,
}

impl WifiSnapshot {
    pub const fn disconnected() -> Self {
        Self {
            state: WifiState::Disconnected,
            link_up: false,
            has_ipv4: false,
            revision: 0,
        }
    }

    /// Healthy means the station can actually carry traffic: link + IPv4.
    pub const fn is_healthy(self) -> bool {
        self.link_up && self.has_ipv4
    }
}

/// Lock-free WiFi status, written by the connection worker and read from the
/// UI loop without taking a lock.
#[derive(Debug)]
pub struct WifiHandle {
    state: AtomicU8,
    link_up: AtomicBool,
    has_ipv4: AtomicBool,
    revision: AtomicU32,
}

impl WifiHandle {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(WifiState::Disconnected as u8),
            link_up: AtomicBool::new(false),
            has_ipv4: AtomicBool::new(false),
            revision: AtomicU32::new(0),
        }
    }

    pub fn snapshot(&self) -> WifiSnapshot {
        WifiSnapshot {
            state: WifiState::from_raw(self.state.load(Ordering::Acquire)),
            link_up: self.link_up.load(Ordering::Acquire),
            has_ipv4: self.has_ipv4.load(Ordering::Acquire),
            revision: self.revision.load(Ordering::Acquire),
        }
    }

    pub fn mark_connecting(&self) {
        if self.store_state(WifiState::Connecting) {
            self.bump_revision();
        }
    }

    pub fn mark_disconnected(&self) {
        let mut changed = false;
        changed |= self.store_bool(&self.link_up, false);
        changed |= self.store_bool(&self.has_ipv4, false);
        changed |= self.store_state(WifiState::Disconnected);
        if changed {
            self.bump_revision();
        }
    }

    pub fn update_link_ip(&self, link_up: bool, has_ipv4: bool) {
        let mut changed = false;
        changed |= self.store_bool(&self.link_up, link_up);
        changed |= self.store_bool(&self.has_ipv4, has_ipv4);

        let next = if !link_up {
            WifiState::Disconnected
        } else if !has_ipv4 {
            WifiState::LinkUpNoIp
        } else {
            WifiState::Connected
        };
        changed |= self.store_state(next);

        if changed {
            self.bump_revision();
        }
    }

    fn store_state(&self, next: WifiState) -> bool {
        self.state.swap(next as u8, Ordering::AcqRel) != next as u8
    }

    fn store_bool(&self, cell: &AtomicBool, next: bool) -> bool {
        cell.swap(next, Ordering::AcqRel) != next
    }

    fn bump_revision(&self) {
        self.revision.fetch_add(1, Ordering::AcqRel);
    }
}

impl Default for WifiHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// BLE keyboard link status, written by the BLE worker.
#[derive(Debug)]
pub struct KeyboardLinkHandle {
    connected: AtomicBool,
    scanning: AtomicBool,
    revision: AtomicU32,
}

impl KeyboardLinkHandle {
    pub const fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
            scanning: AtomicBool::new(false),
            revision: AtomicU32::new(0),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::Acquire)
    }

    pub fn revision(&self) -> u32 {
        self.revision.load(Ordering::Acquire)
    }

    pub fn set_connected(&self, connected: bool) {
        if self.connected.swap(connected, Ordering::AcqRel) != connected {
            self.revision.fetch_add(1, Ordering::AcqRel);
        }
    }

    pub fn set_scanning(&self, scanning: bool) {
        if self.scanning.swap(scanning, Ordering::AcqRel) != scanning {
            self.revision.fetch_add(1, Ordering::AcqRel);
        }
    }
}

impl Default for KeyboardLinkHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Driver-facade over [`WifiHandle`] so the WiFi link participates in the
/// uniform lifecycle the app expects. The radio itself is owned by the async
/// connection worker.
pub struct WifiLink {
    handle: &'static WifiHandle,
    ready: bool,
}

impl WifiLink {
    pub fn new(handle: &'static WifiHandle) -> Self {
        Self {
            handle,
            ready: false,
        }
    }

    pub fn snapshot(&self) -> WifiSnapshot {
        self.handle.snapshot()
    }
}

impl Driver for WifiLink {
    type Error = core::convert::Infallible;

    fn initialize(&mut self) -> Result<(), Self::Error> {
        self.ready = true;
        Ok(())
    }

    fn shutdown(&mut self) {
        self.ready = false;
    }

    fn tick(&mut self, _now_ms: u64) {}

    fn is_ready(&self) -> bool {
        self.ready
    }
}

impl ConnectivityDriver for WifiLink {
    fn is_connected(&self) -> bool {
        self.handle.snapshot().is_healthy()
    }
}
