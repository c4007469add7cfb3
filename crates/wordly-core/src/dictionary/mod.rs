//! Dictionary lookup client and audio query building.

pub mod protocol;
pub mod url;

use heapless::String as HeaplessString;
use log::warn;

pub const WORD_BYTES: usize = 48;
pub const EXPLANATION_BYTES: usize = 512;
pub const SAMPLE_BYTES: usize = 256;
pub const REQUEST_BODY_BYTES: usize = 112;

/// Which rendition of the current entry to fetch as audio.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AudioKind {
    Word,
    Explanation,
    Sample,
}

impl AudioKind {
    pub const fn query_type(self) -> &'static str {
        match self {
            AudioKind::Word => "word",
            AudioKind::Explanation => "explanation",
            AudioKind::Sample => "sample",
        }
    }
}

/// Lookup outcome handed to the UI. On failure the text fields are empty and
/// the UI shows a generic error label.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DictionaryResult {
    pub success: bool,
    pub word: HeaplessString<WORD_BYTES>,
    pub explanation: HeaplessString<EXPLANATION_BYTES>,
    pub sample_sentence: HeaplessString<SAMPLE_BYTES>,
}

impl DictionaryResult {
    pub fn failure() -> Self {
        Self::default()
    }
}

/// The empty string and the literal "null" (any case) are rejected before any
/// network call. Backends historically serialized missing words that way.
pub fn is_word_valid(word: &str) -> bool {
    !word.is_empty() && !word.eq_ignore_ascii_case("null")
}

fn scrub_null<const N: usize>(field: &mut HeaplessString<N>) {
    if field.eq_ignore_ascii_case("null") {
        field.clear();
    }
}

/// Byte transport for lookup requests: POST `body` as JSON, write the
/// response body into `out`, return the number of bytes received.
pub trait LookupTransport {
    type Error;

    async fn post_json(&mut self, body: &str, out: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Dictionary client over any [`LookupTransport`].
pub struct DictionaryClient<T> {
    transport: T,
}

impl<T: LookupTransport> DictionaryClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Looks up `word`. Invalid words are rejected locally; transport and
    /// parse failures come back as `success == false`.
    pub async fn lookup(&mut self, word: &str, response_buf: &mut [u8]) -> DictionaryResult {
        if !is_word_valid(word) {
            return DictionaryResult::failure();
        }

        let Some(body) = protocol::lookup_body::<REQUEST_BODY_BYTES>(word) else {
            warn!("lookup word too long: {} bytes", word.len());
            return DictionaryResult::failure();
        };

        let received = match self.transport.post_json(&body, response_buf).await {
            Ok(n) => n,
            Err(_) => {
                warn!("lookup transport error for '{word}'");
                return DictionaryResult::failure();
            }
        };

        let Ok(response) = core::str::from_utf8(&response_buf[..received]) else {
            warn!("lookup response is not UTF-8");
            return DictionaryResult::failure();
        };

        parse_result(response)
    }
}

/// Parses a response body into a result. Success means the response carried a
/// usable `word`; explanation and sample sentence stay best-effort.
pub fn parse_result(response: &str) -> DictionaryResult {
    let mut result = DictionaryResult::default();

    if !protocol::string_field(response, "word", &mut result.word) {
        result.word.clear();
    }
    scrub_null(&mut result.word);
    if result.word.is_empty() {
        return DictionaryResult::failure();
    }

    if !protocol::string_field(response, "explanation", &mut result.explanation) {
        result.explanation.clear();
    }
    scrub_null(&mut result.explanation);

    if !protocol::sample_sentence_field(response, &mut result.sample_sentence) {
        result.sample_sentence.clear();
    }
    scrub_null(&mut result.sample_sentence);

    result.success = true;
    result
}

/// Builds `<base>?word=<encoded>&type=<kind>` for the audio endpoint.
pub fn audio_query<const N: usize>(
    base: &str,
    word: &str,
    kind: AudioKind,
) -> Option<HeaplessString<N>> {
    let mut out = HeaplessString::new();
    out.push_str(base).ok()?;
    out.push_str("?word=").ok()?;
    url::encode_component(word, &mut out)?;
    out.push_str("&type=").ok()?;
    out.push_str(kind.query_type()).ok()?;
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;

    struct CannedTransport {
        response: &'static str,
        calls: usize,
    }

    impl LookupTransport for CannedTransport {
        type Error = ();

        async fn post_json(&mut self, body: &str, out: &mut [u8]) -> Result<usize, ()> {
            assert!(body.starts_with("{\"word\":\""));
            self.calls += 1;
            let bytes = self.response.as_bytes();
            out[..bytes.len()].copy_from_slice(bytes);
            Ok(bytes.len())
        }
    }

    struct FailingTransport;

    impl LookupTransport for FailingTransport {
        type Error = ();

        async fn post_json(&mut self, _body: &str, _out: &mut [u8]) -> Result<usize, ()> {
            Err(())
        }
    }

    #[test]
    fn word_validity() {
        assert!(is_word_valid("apple"));
        assert!(!is_word_valid(""));
        assert!(!is_word_valid("null"));
        assert!(!is_word_valid("NULL"));
        assert!(!is_word_valid("Null"));
        assert!(is_word_valid("nullify"));
    }

    #[test]
    fn lookup_populates_all_fields() {
        let mut client = DictionaryClient::new(CannedTransport {
            response: r#"{"word":"apple","explanation":"a fruit","sample_sentence":"I ate an apple."}"#,
            calls: 0,
        });
        let mut buf = [0u8; 512];
        let result = block_on(client.lookup("apple", &mut buf));
        assert!(result.success);
        assert_eq!(result.word, "apple");
        assert_eq!(result.explanation, "a fruit");
        assert_eq!(result.sample_sentence, "I ate an apple.");
    }

    #[test]
    fn invalid_words_never_reach_the_transport() {
        let mut client = DictionaryClient::new(CannedTransport {
            response: "{}",
            calls: 0,
        });
        let mut buf = [0u8; 64];
        assert!(!block_on(client.lookup("", &mut buf)).success);
        assert!(!block_on(client.lookup("null", &mut buf)).success);
        assert_eq!(client.transport.calls, 0);
    }

    #[test]
    fn transport_failure_is_a_failed_result() {
        let mut client = DictionaryClient::new(FailingTransport);
        let mut buf = [0u8; 64];
        assert!(!block_on(client.lookup("apple", &mut buf)).success);
    }

    #[test]
    fn null_fields_are_scrubbed() {
        let result = parse_result(r#"{"word":"apple","explanation":"NULL","sample":"null"}"#);
        assert!(result.success);
        assert!(result.explanation.is_empty());
        assert!(result.sample_sentence.is_empty());

        // A "null" word fails the whole lookup.
        assert!(!parse_result(r#"{"word":"null","explanation":"x"}"#).success);
        assert!(!parse_result(r#"{"explanation":"x"}"#).success);
    }

    #[test]
    fn audio_query_encodes_the_word() {
        let query: heapless::String<128> =
            audio_query("/api/audio", "ice cream", AudioKind::Sample).unwrap();
        assert_eq!(query, "/api/audio?word=ice%20cream&type=sample");
    }
}
