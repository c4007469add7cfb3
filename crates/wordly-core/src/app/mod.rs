//! Application state machine: splash, lookup, and connectivity recovery.

use heapless::String as HeaplessString;
use log::{debug, info};

use crate::{
    config::{MAX_VOLUME_PCT, PASSWORD_BYTES, SSID_BYTES, VOLUME_STEP_PCT, WifiCredentials},
    dictionary::{is_word_valid, AudioKind, DictionaryResult, WORD_BYTES},
    input::{FunctionKey, InputProvider, Key},
    view::{LinkBadge, LookupView, Screen, StatusBarView, WifiSetupView},
};

const COMMAND_QUEUE_DEPTH: usize = 8;
const SPLASH_TITLE: &str = "Wordly";

const MSG_REQUEST_FAILED: &str = "Request failed";
const MSG_CONNECTION_FAILED: &str = "Connection failed";
const MSG_NO_DEVICES: &str = "No devices found";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TickResult {
    NoRender,
    RenderRequested,
}

/// Timing thresholds for the state machine. The defaults match the shipped
/// device; tests shrink them.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StatePolicy {
    pub health_check_interval_ms: u64,
    pub recovery_cooldown_ms: u64,
    pub splash_min_ms: u64,
    pub splash_timeout_ms: u64,
}

impl Default for StatePolicy {
    fn default() -> Self {
        Self {
            health_check_interval_ms: 2_000,
            recovery_cooldown_ms: 5_000,
            splash_min_ms: 3_000,
            splash_timeout_ms: 10_000,
        }
    }
}

/// Driver health sampled by the composition root each tick. `None` means the
/// driver is absent or failed to initialize; absent drivers never force a
/// state transition.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct HealthSnapshot {
    pub wifi: Option<bool>,
    pub keyboard: Option<bool>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AppState {
    Splash,
    Main,
    WifiSettings,
    KeyboardSettings,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum RecoveryService {
    Wifi,
    Keyboard,
}

/// Side effects requested by the app and drained by the composition root.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Lookup(HeaplessString<WORD_BYTES>),
    PlayAudio {
        word: HeaplessString<WORD_BYTES>,
        kind: AudioKind,
    },
    SetVolume(u8),
    /// Reconfigure the WiFi driver and persist the credentials.
    ConnectWifi(WifiCredentials),
    PrintMemoryStatus,
}

/// Credential entry in progress on the WiFi settings screen.
#[derive(Clone, Debug, Eq, PartialEq)]
enum WifiSetup {
    Idle,
    Ssid(HeaplessString<SSID_BYTES>),
    Password {
        ssid: HeaplessString<SSID_BYTES>,
        password: HeaplessString<PASSWORD_BYTES>,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum LookupState {
    Idle,
    Pending(HeaplessString<WORD_BYTES>),
    Ready(DictionaryResult),
    Failed,
}

pub struct DictionaryApp<IN: InputProvider> {
    input: IN,
    policy: StatePolicy,
    state: AppState,
    splash_start_ms: Option<u64>,
    last_splash_pct: u8,
    last_health_check_ms: Option<u64>,
    last_recovery_ms: Option<u64>,
    recovering_from: Option<RecoveryService>,
    health: HealthSnapshot,
    entry: HeaplessString<WORD_BYTES>,
    lookup: LookupState,
    volume_pct: u8,
    wifi_ssid: HeaplessString<SSID_BYTES>,
    wifi_setup: WifiSetup,
    keyboard_addr: HeaplessString<{ crate::config::KEYBOARD_ADDR_BYTES }>,
    pending_redraw: bool,
    commands: heapless::Deque<Command, COMMAND_QUEUE_DEPTH>,
}

include!("runtime.rs");
include!("input.rs");
include!("view.rs");

#[cfg(test)]
mod tests;
