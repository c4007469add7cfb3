//! Percent-encoding for query parameters.

/// Appends `input` percent-encoded onto `out`. Unreserved characters pass
/// through, space becomes `%20`, everything else is `%XX` with uppercase hex.
/// Returns `None` when `out` runs out of capacity.
pub fn encode_component<const N: usize>(
    input: &str,
    out: &mut heapless::String<N>,
) -> Option<()> {
    for &byte in input.as_bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char).ok()?;
            }
            _ => {
                out.push('%').ok()?;
                out.push(hex_digit(byte >> 4)).ok()?;
                out.push(hex_digit(byte & 0x0f)).ok()?;
            }
        }
    }
    Some(())
}

fn hex_digit(nibble: u8) -> char {
    match nibble {
        0..=9 => (b'0' + nibble) as char,
        _ => (b'A' + nibble - 10) as char,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(input: &str) -> heapless::String<128> {
        let mut out = heapless::String::new();
        encode_component(input, &mut out).unwrap();
        out
    }

    #[test]
    fn unreserved_passes_through() {
        assert_eq!(encode("abc-XYZ_0.9~"), "abc-XYZ_0.9~");
    }

    #[test]
    fn space_and_symbols_are_escaped_uppercase() {
        assert_eq!(encode("hello world"), "hello%20world");
        assert_eq!(encode("a&b=c"), "a%26b%3Dc");
    }

    #[test]
    fn multibyte_utf8_encodes_per_byte() {
        assert_eq!(encode("café"), "caf%C3%A9");
    }

    #[test]
    fn capacity_overflow_is_reported() {
        let mut out = heapless::String::<4>::new();
        assert!(encode_component("hello", &mut out).is_none());
    }
}
