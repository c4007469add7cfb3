//! Dictionary lookup worker: owns the HTTP client and serves lookup requests
//! from the UI loop over channels.

use embassy_net::Stack;
use embassy_net::dns::DnsSocket;
use embassy_net::tcp::client::{TcpClient, TcpClientState};
use log::{debug, info};
use reqwless::client::HttpClient;
use reqwless::headers::ContentType;
use reqwless::request::{Method, RequestBuilder};
use static_cell::StaticCell;

use wordly_core::dictionary::{DictionaryClient, DictionaryResult, LookupTransport};

use super::{DICT_LOOKUP_URL, LookupRequestReceiver, LookupResultSender};

const RESPONSE_BYTES: usize = 2048;
const TCP_BUFFER_BYTES: usize = 1024;

static TCP_CLIENT_STATE: StaticCell<TcpClientState<1, TCP_BUFFER_BYTES, TCP_BUFFER_BYTES>> =
    StaticCell::new();

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum HttpError {
    Connect,
    Send,
    Status(u16),
    Read,
}

/// POSTs JSON to the dictionary endpoint over a fresh connection per request.
/// The backend closes the socket after each response anyway.
pub(super) struct HttpLookupTransport<'a> {
    stack: Stack<'a>,
    tcp_state: &'a TcpClientState<1, TCP_BUFFER_BYTES, TCP_BUFFER_BYTES>,
    url: &'static str,
}

impl LookupTransport for HttpLookupTransport<'_> {
    type Error = HttpError;

    async fn post_json(&mut self, body: &str, out: &mut [u8]) -> Result<usize, HttpError> {
        let tcp_client = TcpClient::new(self.stack, self.tcp_state);
        let dns = DnsSocket::new(self.stack);
        let mut client = HttpClient::new(&tcp_client, &dns);

        let mut rx_buf = [0u8; RESPONSE_BYTES];
        let mut request = client
            .request(Method::POST, self.url)
            .await
            .map_err(|_| HttpError::Connect)?
            .content_type(ContentType::ApplicationJson)
            .body(body.as_bytes());

        let response = request.send(&mut rx_buf).await.map_err(|_| HttpError::Send)?;
        if response.status.0 != 200 {
            debug!("lookup status {}", response.status.0);
            return Err(HttpError::Status(response.status.0));
        }

        let received = response
            .body()
            .read_to_end()
            .await
            .map_err(|_| HttpError::Read)?;

        let len = received.len().min(out.len());
        out[..len].copy_from_slice(&received[..len]);
        Ok(len)
    }
}

pub(super) async fn lookup_task(
    stack: Stack<'_>,
    requests: LookupRequestReceiver,
    results: LookupResultSender,
) -> ! {
    let tcp_state = TCP_CLIENT_STATE.init_with(TcpClientState::new);
    let mut client = DictionaryClient::new(HttpLookupTransport {
        stack,
        tcp_state,
        url: DICT_LOOKUP_URL,
    });
    let mut response_buf = [0u8; RESPONSE_BYTES];

    loop {
        let word = requests.receive().await;
        info!("lookup: {}", word.as_str());
        let result: DictionaryResult = client.lookup(&word, &mut response_buf).await;
        if !result.success {
            info!("lookup failed for '{}'", word.as_str());
        }
        results.send(result).await;
    }
}
