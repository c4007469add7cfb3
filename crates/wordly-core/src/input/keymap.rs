//! HID usage-code translation.

use super::report::KeyboardReport;
use super::{FunctionKey, Key, KeyEvent};

/// Maps one usage code to a [`Key`], honouring shift for the printable range.
/// Unmapped usages (media keys, lock keys) return `None` and are dropped.
pub fn map_usage(usage: u8, modifiers: u8) -> Option<Key> {
    let shift = modifiers & 0x22 != 0;
    let key = match usage {
        // Letters: usage 0x04 is 'a'.
        0x04..=0x1d => {
            let base = b'a' + (usage - 0x04);
            Key::Char(if shift {
                base.to_ascii_uppercase() as char
            } else {
                base as char
            })
        }
        // Digits 1..9 then 0.
        0x1e..=0x26 => {
            if shift {
                Key::Char(SHIFTED_DIGITS[(usage - 0x1e) as usize])
            } else {
                Key::Char((b'1' + (usage - 0x1e)) as char)
            }
        }
        0x27 => Key::Char(if shift { ')' } else { '0' }),
        0x28 => Key::Function(FunctionKey::Enter),
        0x29 => Key::Function(FunctionKey::Escape),
        0x2a => Key::Function(FunctionKey::Backspace),
        0x2c => Key::Char(' '),
        0x2d => Key::Char(if shift { '_' } else { '-' }),
        0x2e => Key::Char(if shift { '+' } else { '=' }),
        0x33 => Key::Char(if shift { ':' } else { ';' }),
        0x34 => Key::Char(if shift { '"' } else { '\'' }),
        0x36 => Key::Char(if shift { '<' } else { ',' }),
        0x37 => Key::Char(if shift { '>' } else { '.' }),
        0x38 => Key::Char(if shift { '?' } else { '/' }),
        // Function row.
        0x3a => Key::Function(FunctionKey::MemoryStatus), // F1
        0x3b => Key::Function(FunctionKey::ReadWord),     // F2
        0x3c => Key::Function(FunctionKey::ReadExplanation), // F3
        0x3d => Key::Function(FunctionKey::ReadSampleSentence), // F4
        0x43 => Key::Function(FunctionKey::VolumeDown),   // F10
        0x44 => Key::Function(FunctionKey::VolumeUp),     // F11
        0x45 => Key::Function(FunctionKey::WifiSettings), // F12
        0x4f => Key::Function(FunctionKey::RightArrow),
        0x50 => Key::Function(FunctionKey::LeftArrow),
        0x51 => Key::Function(FunctionKey::DownArrow),
        0x52 => Key::Function(FunctionKey::UpArrow),
        _ => return None,
    };
    Some(key)
}

const SHIFTED_DIGITS: [char; 9] = ['!', '@', '#', '$', '%', '^', '&', '*', '('];

/// Diffs two reports and maps the key-down edges.
pub fn events_from_reports(
    previous: &KeyboardReport,
    current: &KeyboardReport,
) -> heapless::Vec<KeyEvent, 6> {
    let mut out = heapless::Vec::new();
    for usage in current.newly_pressed(previous) {
        if let Some(key) = map_usage(usage, current.modifiers) {
            let _ = out.push(KeyEvent {
                key,
                usage,
                modifiers: current.modifiers,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_respect_shift() {
        assert_eq!(map_usage(0x04, 0x00), Some(Key::Char('a')));
        assert_eq!(map_usage(0x04, 0x02), Some(Key::Char('A')));
        assert_eq!(map_usage(0x1d, 0x00), Some(Key::Char('z')));
    }

    #[test]
    fn function_row_matches_keyboard_legend() {
        assert_eq!(
            map_usage(0x3b, 0),
            Some(Key::Function(FunctionKey::ReadWord))
        );
        assert_eq!(
            map_usage(0x3c, 0),
            Some(Key::Function(FunctionKey::ReadExplanation))
        );
        assert_eq!(
            map_usage(0x3d, 0),
            Some(Key::Function(FunctionKey::ReadSampleSentence))
        );
        assert_eq!(
            map_usage(0x43, 0),
            Some(Key::Function(FunctionKey::VolumeDown))
        );
        assert_eq!(
            map_usage(0x44, 0),
            Some(Key::Function(FunctionKey::VolumeUp))
        );
        assert_eq!(
            map_usage(0x45, 0),
            Some(Key::Function(FunctionKey::WifiSettings))
        );
    }

    #[test]
    fn unmapped_usages_are_dropped() {
        assert_eq!(map_usage(0x39, 0), None); // Caps Lock
        assert_eq!(map_usage(0xe0, 0), None); // bare modifier
    }

    #[test]
    fn report_diff_emits_mapped_events() {
        let previous = KeyboardReport::empty();
        let current = KeyboardReport {
            modifiers: 0,
            keycodes: [0x04, 0x28, 0x39, 0, 0, 0],
        };
        let events = events_from_reports(&previous, &current);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].key, Key::Char('a'));
        assert_eq!(events[1].key, Key::Function(FunctionKey::Enter));
    }
}
