//! HID boot-protocol keyboard reports.
//!
//! Layout (8 bytes): modifier bitfield, reserved byte, then up to six
//! simultaneously pressed usage codes. BLE notifications may carry either the
//! raw 8 bytes or the same bytes prefixed with a report ID.

pub const KEYBOARD_REPORT_SIZE: usize = 8;

pub const MOD_LEFT_SHIFT: u8 = 0x02;
pub const MOD_RIGHT_SHIFT: u8 = 0x20;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct KeyboardReport {
    pub modifiers: u8,
    pub keycodes: [u8; 6],
}

impl KeyboardReport {
    pub const fn empty() -> Self {
        Self {
            modifiers: 0,
            keycodes: [0; 6],
        }
    }

    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < KEYBOARD_REPORT_SIZE {
            return None;
        }
        Some(Self {
            modifiers: data[0],
            keycodes: [data[2], data[3], data[4], data[5], data[6], data[7]],
        })
    }

    /// Accepts raw boot reports or report-protocol payloads with a leading
    /// report ID byte. A 9-byte payload is always ID-prefixed; parsing it as
    /// a raw report would read the ID as the modifier byte and shift every
    /// keycode one slot.
    pub fn from_notification(data: &[u8]) -> Option<Self> {
        match data.len() {
            KEYBOARD_REPORT_SIZE => Self::from_bytes(data),
            n if n == KEYBOARD_REPORT_SIZE + 1 => Self::from_bytes(&data[1..]),
            _ => None,
        }
    }

    pub fn shift_held(&self) -> bool {
        self.modifiers & (MOD_LEFT_SHIFT | MOD_RIGHT_SHIFT) != 0
    }

    /// Usage codes present in `self` but not in `previous` (key-down edges).
    /// Held keys repeat at the keyboard's pace, not ours.
    pub fn newly_pressed(&self, previous: &KeyboardReport) -> heapless::Vec<u8, 6> {
        let mut out = heapless::Vec::new();
        for &code in self.keycodes.iter() {
            if code != 0 && !previous.keycodes.contains(&code) {
                let _ = out.push(code);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_raw_and_prefixed_notifications() {
        let raw = [0x02, 0x00, 0x04, 0, 0, 0, 0, 0];
        let report = KeyboardReport::from_notification(&raw).unwrap();
        assert_eq!(report.modifiers, 0x02);
        assert_eq!(report.keycodes[0], 0x04);
        assert!(report.shift_held());

        // 9 bytes: the leading report ID must be stripped, not read as the
        // modifier byte with every keycode shifted a slot.
        let prefixed = [0x01, 0x00, 0x00, 0x05, 0, 0, 0, 0, 0];
        let report = KeyboardReport::from_notification(&prefixed).unwrap();
        assert_eq!(report.modifiers, 0x00);
        assert_eq!(report.keycodes[0], 0x05);
        assert!(!report.shift_held());
    }

    #[test]
    fn rejects_short_payloads() {
        assert!(KeyboardReport::from_notification(&[0x04, 0x00]).is_none());
    }

    #[test]
    fn diffing_reports_only_new_keys() {
        let previous = KeyboardReport {
            modifiers: 0,
            keycodes: [0x04, 0, 0, 0, 0, 0],
        };
        let next = KeyboardReport {
            modifiers: 0,
            keycodes: [0x04, 0x05, 0, 0, 0, 0],
        };
        let downs = next.newly_pressed(&previous);
        assert_eq!(downs.as_slice(), &[0x05]);

        // Release produces no edges.
        assert!(previous.newly_pressed(&next).is_empty());
    }
}
