//! App-level view models consumed by the board renderer.

/// Connectivity badges shown in the status bar.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LinkBadge {
    /// Driver failed or is still coming up.
    Unavailable,
    Disconnected,
    Connected,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StatusBarView {
    pub wifi: LinkBadge,
    pub keyboard: LinkBadge,
    pub volume_pct: u8,
}

/// Lookup presentation state for the main screen.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LookupView<'a> {
    Idle,
    Pending {
        word: &'a str,
    },
    Entry {
        word: &'a str,
        explanation: &'a str,
        sample_sentence: &'a str,
    },
    Failed {
        message: &'a str,
    },
}

/// Credential entry flow on the WiFi settings screen.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WifiSetupView<'a> {
    /// No entry in progress; show link state for the configured network.
    Status { connecting: bool, message: &'a str },
    EnterSsid {
        ssid: &'a str,
    },
    /// The password itself never reaches the renderer, only its length.
    EnterPassword {
        ssid: &'a str,
        password_len: usize,
    },
}

/// View model handed to the HAL renderer. Borrows from the app so screens
/// carry no owned buffers.
pub enum Screen<'a> {
    Splash {
        title: &'a str,
        /// 0..=100 toward the splash timeout, drives the progress bar.
        progress_pct: u8,
        status: StatusBarView,
    },
    Main {
        entry: &'a str,
        lookup: LookupView<'a>,
        status: StatusBarView,
    },
    WifiSettings {
        ssid: &'a str,
        setup: WifiSetupView<'a>,
        status: StatusBarView,
    },
    KeyboardSettings {
        paired_addr: &'a str,
        scanning: bool,
        message: &'a str,
        status: StatusBarView,
    },
}
