//! Persisted device configuration abstraction.

pub mod record;

use heapless::String as HeaplessString;

pub const SSID_BYTES: usize = 32;
pub const PASSWORD_BYTES: usize = 64;
/// "AA:BB:CC:DD:EE:FF"
pub const KEYBOARD_ADDR_BYTES: usize = 17;

pub const DEFAULT_VOLUME_PCT: u8 = 70;
pub const MAX_VOLUME_PCT: u8 = 100;
pub const VOLUME_STEP_PCT: u8 = 10;

/// WiFi station credentials.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct WifiCredentials {
    pub ssid: HeaplessString<SSID_BYTES>,
    pub password: HeaplessString<PASSWORD_BYTES>,
}

impl WifiCredentials {
    pub fn new(ssid: &str, password: &str) -> Option<Self> {
        let mut out = Self::default();
        out.ssid.push_str(ssid).ok()?;
        out.password.push_str(password).ok()?;
        Some(out)
    }
}

/// Everything that survives a reboot: WiFi credentials, the paired keyboard
/// address, and the audio volume.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeviceConfig {
    pub wifi: Option<WifiCredentials>,
    pub keyboard_addr: Option<HeaplessString<KEYBOARD_ADDR_BYTES>>,
    /// True when the paired keyboard advertises a random address; the central
    /// must connect with the same address type it scanned.
    pub keyboard_addr_random: bool,
    pub volume_pct: u8,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            wifi: None,
            keyboard_addr: None,
            keyboard_addr_random: false,
            volume_pct: DEFAULT_VOLUME_PCT,
        }
    }
}

impl DeviceConfig {
    pub fn with_wifi(mut self, wifi: Option<WifiCredentials>) -> Self {
        self.wifi = wifi;
        self
    }
}

/// Abstract persistence backend for [`DeviceConfig`].
pub trait ConfigStore {
    type Error;

    fn load(&mut self) -> Result<Option<DeviceConfig>, Self::Error>;
    fn save(&mut self, config: &DeviceConfig) -> Result<(), Self::Error>;
}
