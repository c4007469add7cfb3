//! Fixed 128-byte flash record for [`DeviceConfig`].
//!
//! Layout: magic, version, presence flags, volume, then length-prefixed
//! SSID / password / keyboard address, with an FNV-1a checksum over
//! everything before the trailing 4 bytes. Encoding and parsing are pure so
//! the format is testable without flash.

use super::{
    DeviceConfig, KEYBOARD_ADDR_BYTES, MAX_VOLUME_PCT, PASSWORD_BYTES, SSID_BYTES, WifiCredentials,
};

pub const RECORD_LEN: usize = 128;

const MAGIC: u32 = 0x3143_4457; // "WDC1"
const VERSION: u8 = 1;
const CHECKSUM_OFFSET: usize = RECORD_LEN - 4;

const FLAG_WIFI: u8 = 0x01;
const FLAG_KEYBOARD: u8 = 0x02;
const FLAG_KEYBOARD_RANDOM: u8 = 0x04;

const SSID_OFFSET: usize = 8;
const PASSWORD_OFFSET: usize = SSID_OFFSET + 1 + SSID_BYTES;
const ADDR_OFFSET: usize = PASSWORD_OFFSET + 1 + PASSWORD_BYTES;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RecordError {
    Corrupted,
}

pub fn encode(config: &DeviceConfig) -> [u8; RECORD_LEN] {
    let mut buf = [0u8; RECORD_LEN];
    buf[0..4].copy_from_slice(&MAGIC.to_le_bytes());
    buf[4] = VERSION;

    let mut flags = 0u8;
    if config.wifi.is_some() {
        flags |= FLAG_WIFI;
    }
    if config.keyboard_addr.is_some() {
        flags |= FLAG_KEYBOARD;
    }
    if config.keyboard_addr_random {
        flags |= FLAG_KEYBOARD_RANDOM;
    }
    buf[5] = flags;
    buf[6] = config.volume_pct.min(MAX_VOLUME_PCT);
    buf[7] = 0;

    write_str(
        &mut buf,
        SSID_OFFSET,
        SSID_BYTES,
        config.wifi.as_ref().map(|w| w.ssid.as_str()),
    );
    write_str(
        &mut buf,
        PASSWORD_OFFSET,
        PASSWORD_BYTES,
        config.wifi.as_ref().map(|w| w.password.as_str()),
    );
    write_str(
        &mut buf,
        ADDR_OFFSET,
        KEYBOARD_ADDR_BYTES,
        config.keyboard_addr.as_deref(),
    );

    let checksum = checksum32(&buf[..CHECKSUM_OFFSET]);
    buf[CHECKSUM_OFFSET..].copy_from_slice(&checksum.to_le_bytes());
    buf
}

/// `Ok(None)` for blank or foreign records, `Err` only when a record that
/// claims to be ours fails its checksum or carries impossible lengths.
pub fn parse(buf: &[u8; RECORD_LEN]) -> Result<Option<DeviceConfig>, RecordError> {
    // Fresh flash: never written.
    if buf.iter().all(|b| *b == 0xFF) {
        return Ok(None);
    }

    let magic = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    if magic != MAGIC || buf[4] != VERSION {
        return Ok(None);
    }

    let expected = u32::from_le_bytes([
        buf[CHECKSUM_OFFSET],
        buf[CHECKSUM_OFFSET + 1],
        buf[CHECKSUM_OFFSET + 2],
        buf[CHECKSUM_OFFSET + 3],
    ]);
    if checksum32(&buf[..CHECKSUM_OFFSET]) != expected {
        return Err(RecordError::Corrupted);
    }

    let flags = buf[5];
    let volume_pct = buf[6].min(MAX_VOLUME_PCT);

    let wifi = if flags & FLAG_WIFI != 0 {
        let ssid = read_str::<SSID_BYTES>(buf, SSID_OFFSET)?;
        let password = read_str::<PASSWORD_BYTES>(buf, PASSWORD_OFFSET)?;
        Some(WifiCredentials { ssid, password })
    } else {
        None
    };

    let keyboard_addr = if flags & FLAG_KEYBOARD != 0 {
        Some(read_str::<KEYBOARD_ADDR_BYTES>(buf, ADDR_OFFSET)?)
    } else {
        None
    };

    Ok(Some(DeviceConfig {
        wifi,
        keyboard_addr,
        keyboard_addr_random: flags & FLAG_KEYBOARD_RANDOM != 0,
        volume_pct,
    }))
}

fn read_str<const N: usize>(buf: &[u8], offset: usize) -> Result<heapless::String<N>, RecordError> {
    let len = buf[offset] as usize;
    if len > N {
        return Err(RecordError::Corrupted);
    }
    let bytes = &buf[offset + 1..offset + 1 + len];
    let text = core::str::from_utf8(bytes).map_err(|_| RecordError::Corrupted)?;
    let mut out = heapless::String::new();
    out.push_str(text).map_err(|_| RecordError::Corrupted)?;
    Ok(out)
}

fn write_str(buf: &mut [u8], offset: usize, capacity: usize, value: Option<&str>) {
    let text = value.unwrap_or("");
    let bytes = text.as_bytes();
    let len = bytes.len().min(capacity);
    buf[offset] = len as u8;
    buf[offset + 1..offset + 1 + len].copy_from_slice(&bytes[..len]);
    for b in &mut buf[offset + 1 + len..offset + 1 + capacity] {
        *b = 0;
    }
}

fn checksum32(bytes: &[u8]) -> u32 {
    let mut hash = 0x811C_9DC5u32;
    for b in bytes {
        hash ^= *b as u32;
        hash = hash.wrapping_mul(16_777_619);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_config() -> DeviceConfig {
        DeviceConfig {
            wifi: WifiCredentials::new("home-net", "hunter2!"),
            keyboard_addr: Some(heapless::String::try_from("AA:BB:CC:DD:EE:FF").unwrap()),
            keyboard_addr_random: false,
            volume_pct: 40,
        }
    }

    #[test]
    fn round_trips_a_full_config() {
        let config = full_config();
        let parsed = parse(&encode(&config)).unwrap().unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn round_trips_a_default_config() {
        let config = DeviceConfig::default();
        let parsed = parse(&encode(&config)).unwrap().unwrap();
        assert_eq!(parsed, config);
        assert!(parsed.wifi.is_none());
        assert!(parsed.keyboard_addr.is_none());
    }

    #[test]
    fn keyboard_address_type_survives_a_round_trip() {
        let mut config = full_config();
        config.keyboard_addr_random = true;
        let parsed = parse(&encode(&config)).unwrap().unwrap();
        assert!(parsed.keyboard_addr_random);
    }

    #[test]
    fn blank_flash_parses_to_none() {
        assert_eq!(parse(&[0xFF; RECORD_LEN]), Ok(None));
    }

    #[test]
    fn foreign_magic_parses_to_none() {
        let mut buf = encode(&full_config());
        buf[0] ^= 0x5A;
        assert_eq!(parse(&buf), Ok(None));
    }

    #[test]
    fn bit_rot_is_detected() {
        let mut buf = encode(&full_config());
        buf[SSID_OFFSET + 2] ^= 0x01;
        assert_eq!(parse(&buf), Err(RecordError::Corrupted));
    }

    #[test]
    fn oversized_length_prefix_is_corrupted() {
        let mut buf = encode(&full_config());
        buf[SSID_OFFSET] = (SSID_BYTES + 1) as u8;
        let checksum = checksum32(&buf[..CHECKSUM_OFFSET]);
        buf[CHECKSUM_OFFSET..].copy_from_slice(&checksum.to_le_bytes());
        assert_eq!(parse(&buf), Err(RecordError::Corrupted));
    }

    #[test]
    fn volume_is_clamped_to_max() {
        let mut config = DeviceConfig::default();
        config.volume_pct = 250;
        let parsed = parse(&encode(&config)).unwrap().unwrap();
        assert_eq!(parsed.volume_pct, MAX_VOLUME_PCT);
    }
}
