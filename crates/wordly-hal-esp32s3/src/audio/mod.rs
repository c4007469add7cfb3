//! Streaming MP3 playback.
//!
//! The fetch task pushes raw HTTP body bytes into [`Mp3Player`]; each tick
//! decodes buffered frames and hands scaled PCM to the board's [`PcmSink`]
//! (I2S DMA on the device).

use log::{debug, warn};
use wordly_core::driver::Driver;

/// Interleaved 16-bit PCM consumer. `write` blocks until the sink has
/// accepted the whole slice.
pub trait PcmSink {
    type Error;

    fn write(&mut self, pcm: &[i16], sample_rate: u32, channels: u8) -> Result<(), Self::Error>;
}

const MP3_BUFFER_BYTES: usize = 8192;
const FRAMES_PER_TICK: usize = 4;

pub struct Mp3Player<S: PcmSink> {
    decoder: nanomp3::Decoder,
    sink: S,
    buf: heapless::Vec<u8, MP3_BUFFER_BYTES>,
    stream_done: bool,
    volume_pct: u8,
    ready: bool,
}

impl<S: PcmSink> Mp3Player<S> {
    pub fn new(sink: S, volume_pct: u8) -> Self {
        Self {
            decoder: nanomp3::Decoder::new(),
            sink,
            buf: heapless::Vec::new(),
            stream_done: true,
            volume_pct: volume_pct.min(100),
            ready: false,
        }
    }

    pub fn set_volume(&mut self, volume_pct: u8) {
        self.volume_pct = volume_pct.min(100);
    }

    pub fn volume_pct(&self) -> u8 {
        self.volume_pct
    }

    /// Drops any buffered audio and resets decoder state for a new stream.
    pub fn begin_stream(&mut self) {
        self.buf.clear();
        self.decoder = nanomp3::Decoder::new();
        self.stream_done = false;
    }

    pub fn end_stream(&mut self) {
        self.stream_done = true;
    }

    /// Appends stream bytes; returns how many were accepted. The fetch task
    /// retries the remainder after decode has drained the buffer.
    pub fn push_bytes(&mut self, data: &[u8]) -> usize {
        let room = self.buf.capacity() - self.buf.len();
        let take = room.min(data.len());
        let _ = self.buf.extend_from_slice(&data[..take]);
        take
    }

    /// Playback finished: the stream ended and the backlog is decoded.
    pub fn is_idle(&self) -> bool {
        self.stream_done && self.buf.is_empty()
    }

    /// Decodes one frame from the backlog. Returns `Ok(false)` when more
    /// bytes are needed before another frame can come out.
    fn decode_step(&mut self) -> Result<bool, S::Error> {
        if self.buf.is_empty() {
            return Ok(false);
        }

        let mut pcm_buf = [0.0f32; nanomp3::MAX_SAMPLES_PER_FRAME];
        let (consumed, info) = self.decoder.decode(&self.buf, &mut pcm_buf);

        match info {
            Some(info) => {
                let channels = info.channels.num() as u8;
                let produced = info.samples_produced.min(pcm_buf.len());
                let mut out = [0i16; nanomp3::MAX_SAMPLES_PER_FRAME];
                let gain = self.volume_pct as f32 / 100.0;
                for (dst, &src) in out[..produced].iter_mut().zip(pcm_buf[..produced].iter()) {
                    *dst = (src.clamp(-1.0, 1.0) * gain * i16::MAX as f32) as i16;
                }
                self.sink.write(&out[..produced], info.sample_rate, channels)?;
                self.drain(consumed);
                Ok(true)
            }
            None => {
                if consumed > 0 {
                    // Garbage before the first sync word.
                    self.drain(consumed);
                } else if self.buf.is_full() {
                    debug!("mp3 backlog has no sync word, flushing");
                    self.buf.clear();
                }
                Ok(false)
            }
        }
    }

    fn drain(&mut self, consumed: usize) {
        let consumed = consumed.min(self.buf.len());
        let remaining = self.buf.len() - consumed;
        self.buf.copy_within(consumed.., 0);
        self.buf.truncate(remaining);
    }
}

impl<S: PcmSink> Driver for Mp3Player<S> {
    type Error = S::Error;

    fn initialize(&mut self) -> Result<(), Self::Error> {
        self.buf.clear();
        self.stream_done = true;
        self.ready = true;
        Ok(())
    }

    fn shutdown(&mut self) {
        self.buf.clear();
        self.stream_done = true;
        self.ready = false;
    }

    /// Decodes a bounded number of frames so the tick never hogs the loop.
    /// Sink errors are logged and the rest of the backlog is dropped.
    fn tick(&mut self, _now_ms: u64) {
        if !self.ready {
            return;
        }
        for _ in 0..FRAMES_PER_TICK {
            match self.decode_step() {
                Ok(true) => {}
                Ok(false) => break,
                Err(_) => {
                    warn!("pcm sink write failed, dropping stream");
                    self.buf.clear();
                    self.stream_done = true;
                    break;
                }
            }
        }
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}
