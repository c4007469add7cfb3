//! Audio worker: fetches MP3 streams from the backend and plays them through
//! the MP3 player driver. One request at a time; a new request interrupts
//! nothing because the channel depth keeps the queue short.

use embassy_net::Stack;
use embassy_net::dns::DnsSocket;
use embassy_net::tcp::client::{TcpClient, TcpClientState};
use embassy_time::Timer;
use embedded_io_async::Read;
use heapless::String as HeaplessString;
use log::{info, warn};
use reqwless::client::HttpClient;
use reqwless::request::Method;
use static_cell::StaticCell;

use wordly_core::dictionary::{AudioKind, WORD_BYTES, audio_query};
use wordly_core::driver::Driver;
use wordly_hal_esp32s3::audio::{Mp3Player, PcmSink};

use super::{AUDIO_BASE_URL, AudioRequestReceiver, VOLUME_PCT};

const URL_BYTES: usize = 192;
const HEADER_BYTES: usize = 1024;
const CHUNK_BYTES: usize = 512;
const TCP_BUFFER_BYTES: usize = 2048;

static TCP_CLIENT_STATE: StaticCell<TcpClientState<1, TCP_BUFFER_BYTES, TCP_BUFFER_BYTES>> =
    StaticCell::new();

#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) struct AudioRequest {
    pub word: HeaplessString<WORD_BYTES>,
    pub kind: AudioKind,
}

pub(super) async fn audio_task<S: PcmSink>(
    stack: Stack<'_>,
    requests: AudioRequestReceiver,
    player: &mut Mp3Player<S>,
) -> ! {
    let tcp_state = TCP_CLIENT_STATE.init_with(TcpClientState::new);

    if player.initialize().is_err() {
        warn!("audio player init failed; audio disabled");
    }

    loop {
        let request = requests.receive().await;
        if !player.is_ready() {
            continue;
        }

        let Some(url) = audio_query::<URL_BYTES>(AUDIO_BASE_URL, &request.word, request.kind)
        else {
            warn!("audio url too long for '{}'", request.word.as_str());
            continue;
        };
        info!("audio: {} ({})", request.word.as_str(), request.kind.query_type());

        player.set_volume(VOLUME_PCT.load(core::sync::atomic::Ordering::Relaxed));
        if let Err(err) = stream_one(stack, tcp_state, &url, player).await {
            warn!("audio stream failed: {:?}", err);
            player.end_stream();
        }

        // Let the decoder drain what the fetch left behind.
        while !player.is_idle() {
            player.tick(0);
            Timer::after_millis(5).await;
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum StreamError {
    Connect,
    Send,
    Status(u16),
    Read,
}

async fn stream_one<S: PcmSink>(
    stack: Stack<'_>,
    tcp_state: &'static TcpClientState<1, TCP_BUFFER_BYTES, TCP_BUFFER_BYTES>,
    url: &str,
    player: &mut Mp3Player<S>,
) -> Result<(), StreamError> {
    let tcp_client = TcpClient::new(stack, tcp_state);
    let dns = DnsSocket::new(stack);
    let mut client = HttpClient::new(&tcp_client, &dns);

    let mut header_buf = [0u8; HEADER_BYTES];
    let mut request = client
        .request(Method::GET, url)
        .await
        .map_err(|_| StreamError::Connect)?;
    let response = request
        .send(&mut header_buf)
        .await
        .map_err(|_| StreamError::Send)?;
    if response.status.0 != 200 {
        return Err(StreamError::Status(response.status.0));
    }

    player.begin_stream();
    let mut reader = response.body().reader();
    let mut chunk = [0u8; CHUNK_BYTES];

    loop {
        let read = reader.read(&mut chunk).await.map_err(|_| StreamError::Read)?;
        if read == 0 {
            break;
        }

        let mut offset = 0usize;
        while offset < read {
            offset += player.push_bytes(&chunk[offset..read]);
            player.tick(0);
            if offset < read {
                // Backlog full: give the decoder room before retrying.
                Timer::after_millis(2).await;
            }
        }
    }

    player.end_stream();
    Ok(())
}
