//! Input abstraction layer.
//!
//! The BLE keyboard driver turns HID boot reports into [`KeyEvent`]s; the app
//! consumes them through [`InputProvider`] without knowing the transport.

pub mod keymap;
pub mod mock;
pub mod report;

/// Non-character keys the app reacts to. Function-key assignments follow the
/// device's keyboard legend: F2/F3/F4 speak the word, explanation and sample
/// sentence, F10/F11 adjust volume, F12 opens WiFi settings.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FunctionKey {
    MemoryStatus,
    ReadWord,
    ReadExplanation,
    ReadSampleSentence,
    VolumeDown,
    VolumeUp,
    WifiSettings,
    UpArrow,
    DownArrow,
    LeftArrow,
    RightArrow,
    Enter,
    Backspace,
    Escape,
}

/// Decoded keyboard action.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Key {
    Char(char),
    Function(FunctionKey),
}

/// A single key-down edge with its raw HID context.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KeyEvent {
    pub key: Key,
    pub usage: u8,
    pub modifiers: u8,
}

/// Polled input provider.
pub trait InputProvider {
    type Error;

    fn poll_event(&mut self) -> Result<Option<KeyEvent>, Self::Error>;
}
