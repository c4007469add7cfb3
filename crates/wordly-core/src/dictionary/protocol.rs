//! Wire format for the dictionary backend.
//!
//! Requests are a one-field JSON object. Responses are flat JSON objects
//! whose field names drifted across backend revisions, so the sample
//! sentence is resolved through a fallback chain. The parser walks the
//! top-level object directly instead of building a DOM; response bodies are
//! small and the field set is fixed.

use heapless::String as HeaplessString;

/// Sample-sentence field names in resolution order. `examples` and `samples`
/// are arrays; their first element wins.
const SAMPLE_KEYS: [&str; 5] = ["sample_sentence", "sampleSentence", "sample", "sentence", "example"];
const SAMPLE_ARRAY_KEYS: [&str; 2] = ["examples", "samples"];

/// Builds `{"word":"<escaped>"}`. `None` when the buffer is too small.
pub fn lookup_body<const N: usize>(word: &str) -> Option<HeaplessString<N>> {
    let mut out = HeaplessString::new();
    out.push_str("{\"word\":\"").ok()?;
    for ch in word.chars() {
        match ch {
            '"' => out.push_str("\\\"").ok()?,
            '\\' => out.push_str("\\\\").ok()?,
            '\n' => out.push_str("\\n").ok()?,
            '\r' => out.push_str("\\r").ok()?,
            '\t' => out.push_str("\\t").ok()?,
            c if (c as u32) < 0x20 => {
                out.push_str("\\u00").ok()?;
                let code = c as u8;
                out.push(hex_digit(code >> 4)).ok()?;
                out.push(hex_digit(code & 0x0f)).ok()?;
            }
            c => out.push(c).ok()?,
        }
    }
    out.push_str("\"}").ok()?;
    Some(out)
}

fn hex_digit(nibble: u8) -> char {
    match nibble {
        0..=9 => (b'0' + nibble) as char,
        _ => (b'a' + nibble - 10) as char,
    }
}

/// Extracts a top-level string field, decoding escapes into `out`.
/// Returns `false` when the key is absent, not a string, or `out` overflows.
pub fn string_field<const N: usize>(body: &str, key: &str, out: &mut HeaplessString<N>) -> bool {
    match find_value(body, key) {
        Some(rest) if rest.starts_with('"') => decode_string(&rest[1..], out),
        _ => false,
    }
}

/// Extracts the first string element of a top-level array field.
pub fn first_array_element<const N: usize>(
    body: &str,
    key: &str,
    out: &mut HeaplessString<N>,
) -> bool {
    let Some(rest) = find_value(body, key) else {
        return false;
    };
    if !rest.starts_with('[') {
        return false;
    }
    let inner = rest[1..].trim_start();
    if inner.starts_with('"') {
        decode_string(&inner[1..], out)
    } else {
        false
    }
}

/// Resolves the sample sentence through the fallback chain.
pub fn sample_sentence_field<const N: usize>(body: &str, out: &mut HeaplessString<N>) -> bool {
    for key in SAMPLE_KEYS {
        if string_field(body, key, out) {
            return true;
        }
        out.clear();
    }
    for key in SAMPLE_ARRAY_KEYS {
        if first_array_element(body, key, out) {
            return true;
        }
        out.clear();
    }
    false
}

/// Scans the top-level object for `"key":` and returns the slice starting at
/// the value. Keys inside nested objects, arrays, and string values are
/// skipped by depth tracking.
fn find_value<'a>(body: &'a str, key: &str) -> Option<&'a str> {
    let bytes = body.as_bytes();
    let mut i = body.find('{')? + 1;
    let mut depth = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b'"' if depth == 0 => {
                let (raw_key, after_key) = raw_string_span(body, i + 1)?;
                let mut j = after_key;
                while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                    j += 1;
                }
                if j < bytes.len() && bytes[j] == b':' {
                    j += 1;
                    while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                        j += 1;
                    }
                    if raw_key == key {
                        return Some(&body[j..]);
                    }
                    i = skip_value(body, j)?;
                    continue;
                }
                i = after_key;
            }
            b'"' => {
                let (_, after) = raw_string_span(body, i + 1)?;
                i = after;
            }
            b'{' | b'[' => {
                depth += 1;
                i += 1;
            }
            b'}' | b']' => {
                depth = depth.checked_sub(1)?;
                i += 1;
            }
            _ => i += 1,
        }
    }
    None
}

/// From just past an opening quote, returns the raw (undecoded) contents and
/// the index just past the closing quote.
fn raw_string_span(body: &str, start: usize) -> Option<(&str, usize)> {
    let bytes = body.as_bytes();
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some((&body[start..i], i + 1)),
            _ => i += 1,
        }
    }
    None
}

/// Returns the index just past the value starting at `start`.
fn skip_value(body: &str, start: usize) -> Option<usize> {
    let bytes = body.as_bytes();
    match bytes.get(start)? {
        b'"' => raw_string_span(body, start + 1).map(|(_, end)| end),
        b'{' | b'[' => {
            let mut depth = 0usize;
            let mut i = start;
            while i < bytes.len() {
                match bytes[i] {
                    b'"' => {
                        let (_, end) = raw_string_span(body, i + 1)?;
                        i = end;
                        continue;
                    }
                    b'{' | b'[' => depth += 1,
                    b'}' | b']' => {
                        depth -= 1;
                        if depth == 0 {
                            return Some(i + 1);
                        }
                    }
                    _ => {}
                }
                i += 1;
            }
            None
        }
        _ => {
            let mut i = start;
            while i < bytes.len() && !matches!(bytes[i], b',' | b'}' | b']') {
                i += 1;
            }
            Some(i)
        }
    }
}

/// Decodes a JSON string starting just past the opening quote into `out`.
fn decode_string<const N: usize>(raw: &str, out: &mut HeaplessString<N>) -> bool {
    let mut chars = raw.char_indices();
    while let Some((_, ch)) = chars.next() {
        match ch {
            '"' => return true,
            '\\' => {
                let Some((_, esc)) = chars.next() else {
                    return false;
                };
                let decoded = match esc {
                    '"' => '"',
                    '\\' => '\\',
                    '/' => '/',
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    'b' => '\u{08}',
                    'f' => '\u{0c}',
                    'u' => match decode_unicode_escape(&mut chars) {
                        Some(c) => c,
                        None => return false,
                    },
                    _ => return false,
                };
                if out.push(decoded).is_err() {
                    return false;
                }
            }
            c => {
                if out.push(c).is_err() {
                    return false;
                }
            }
        }
    }
    false
}

fn decode_unicode_escape(chars: &mut core::str::CharIndices<'_>) -> Option<char> {
    let high = hex4(chars)?;
    if (0xd800..0xdc00).contains(&high) {
        // Surrogate pair: expect a trailing \uXXXX.
        if chars.next()?.1 != '\\' || chars.next()?.1 != 'u' {
            return None;
        }
        let low = hex4(chars)?;
        if !(0xdc00..0xe000).contains(&low) {
            return None;
        }
        let code = 0x10000 + ((high - 0xd800) << 10) + (low - 0xdc00);
        char::from_u32(code)
    } else {
        char::from_u32(high)
    }
}

fn hex4(chars: &mut core::str::CharIndices<'_>) -> Option<u32> {
    let mut value = 0u32;
    for _ in 0..4 {
        let (_, c) = chars.next()?;
        value = value * 16 + c.to_digit(16)?;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(body: &str, key: &str) -> Option<heapless::String<256>> {
        let mut out = heapless::String::new();
        string_field(body, key, &mut out).then_some(out)
    }

    #[test]
    fn builds_escaped_request_body() {
        let body: heapless::String<96> = lookup_body("apple").unwrap();
        assert_eq!(body, "{\"word\":\"apple\"}");

        let body: heapless::String<96> = lookup_body("a\"b\\c\n").unwrap();
        assert_eq!(body, "{\"word\":\"a\\\"b\\\\c\\n\"}");
    }

    #[test]
    fn extracts_top_level_fields() {
        let body = r#"{"word":"apple","explanation":"a fruit"}"#;
        assert_eq!(field(body, "word").unwrap(), "apple");
        assert_eq!(field(body, "explanation").unwrap(), "a fruit");
        assert!(field(body, "missing").is_none());
    }

    #[test]
    fn skips_nested_objects_when_scanning() {
        let body = r#"{"meta":{"word":"inner","n":[1,2]},"word":"outer"}"#;
        assert_eq!(field(body, "word").unwrap(), "outer");
    }

    #[test]
    fn decodes_escapes_and_unicode() {
        let body = r#"{"word":"line\none \"two\" é😀"}"#;
        assert_eq!(field(body, "word").unwrap(), "line\none \"two\" é😀");
    }

    #[test]
    fn sample_fallback_chain_in_order() {
        let mut out = heapless::String::<256>::new();

        assert!(sample_sentence_field(
            r#"{"sample":"b","sample_sentence":"a"}"#,
            &mut out
        ));
        assert_eq!(out, "a");

        out.clear();
        assert!(sample_sentence_field(r#"{"sentence":"c"}"#, &mut out));
        assert_eq!(out, "c");

        out.clear();
        assert!(sample_sentence_field(r#"{"examples":["x","y"]}"#, &mut out));
        assert_eq!(out, "x");

        out.clear();
        assert!(sample_sentence_field(r#"{"samples":["z"]}"#, &mut out));
        assert_eq!(out, "z");

        out.clear();
        assert!(!sample_sentence_field(r#"{"word":"a"}"#, &mut out));
    }

    #[test]
    fn rejects_non_string_values() {
        assert!(field(r#"{"word":42}"#, "word").is_none());
        assert!(field(r#"{"word":null}"#, "word").is_none());
    }
}
