use crate::config::TransportConfig;
use crate::errors::{ConfigError, TransportError};
use crate::events::{ProgressEvent, TransportEvent};
use crate::net::{status_text_for, Blob, ResponseHead, Transport};
use bytes::BytesMut;
use futures::StreamExt;
use http::header::{HeaderValue, ACCEPT, USER_AGENT};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, Sender};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Upper bound for pre-allocating the body buffer from a declared `Content-Length`.
const MAX_PREALLOC: u64 = 8 * 1024 * 1024;

/// HTTP(S) transport built on `reqwest`.
///
/// Each [`Transport::open`] spawns one task on the captured tokio runtime. The task
/// streams the body, reports a progress event for every received chunk and finishes
/// with a load or error event. Cancelling the token drops the in-flight request.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    runtime: Handle,
    channel_capacity: usize,
}

impl ReqwestTransport {
    /// Creates a transport on the tokio runtime of the calling context.
    pub fn new(config: TransportConfig) -> Result<Self, ConfigError> {
        let runtime = Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;
        Self::with_runtime(config, runtime)
    }

    /// Creates a transport that spawns its transfers on `runtime`.
    pub fn with_runtime(config: TransportConfig, runtime: Handle) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut headers = http::HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_str(&config.accept).map_err(|_| ConfigError::InvalidHeader { name: "accept" })?,
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).map_err(|_| ConfigError::InvalidHeader { name: "user-agent" })?,
        );

        let redirect = match config.max_redirects {
            0 => reqwest::redirect::Policy::none(),
            n => reqwest::redirect::Policy::limited(n),
        };

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .redirect(redirect)
            .build()?;

        Ok(Self {
            client,
            runtime,
            channel_capacity: config.channel_capacity,
        })
    }
}

impl Transport for ReqwestTransport {
    fn open(&self, url: &Url, cancel: CancellationToken) -> mpsc::Receiver<TransportEvent> {
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let client = self.client.clone();
        let url = url.clone();

        self.runtime.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    log::debug!("Transfer of {url} cancelled");
                }
                _ = fetch(&client, url.clone(), &tx) => {
                    log::debug!("Transfer of {url} finished");
                }
            }
        });

        rx
    }
}

// Performs the GET and reports every step on `tx`. Returns early once the receiver is gone.
async fn fetch(client: &reqwest::Client, url: Url, tx: &Sender<TransportEvent>) {
    let res = match client.get(url).send().await {
        Ok(res) => res,
        Err(e) => {
            let _ = tx.send(TransportEvent::Error(TransportError::from_reqwest(&e))).await;
            return;
        }
    };

    let status = res.status().as_u16();
    let head = ResponseHead {
        url: Some(res.url().clone()),
        status,
        status_text: status_text_for(status),
        headers: res.headers().clone(),
    };
    let content_type = head.content_type();
    // Only trust the length reqwest reports; it is None when the body gets decompressed
    let total = res.content_length();

    if tx.send(TransportEvent::Head(head)).await.is_err() {
        return;
    }

    let mut body = BytesMut::with_capacity(total.unwrap_or(0).min(MAX_PREALLOC) as usize);
    let mut stream = res.bytes_stream();

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(chunk) => {
                body.extend_from_slice(&chunk);
                let progress = ProgressEvent::new(body.len() as u64, total);
                if tx.send(TransportEvent::Progress(progress)).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                let err = TransportError::Body {
                    loaded: body.len() as u64,
                    reason: e.to_string(),
                };
                let _ = tx.send(TransportEvent::Error(err)).await;
                return;
            }
        }
    }

    let _ = tx.send(TransportEvent::Load(Blob::new(body.freeze(), content_type))).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn collect(mut rx: mpsc::Receiver<TransportEvent>) -> Vec<TransportEvent> {
        let mut events = Vec::new();
        while let Some(ev) = rx.recv().await {
            events.push(ev);
        }
        events
    }

    fn transport() -> ReqwestTransport {
        ReqwestTransport::new(TransportConfig::default()).unwrap()
    }

    #[test]
    fn new_without_runtime_fails() {
        let err = ReqwestTransport::new(TransportConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::NoRuntime));
    }

    #[tokio::test]
    async fn streams_head_progress_and_load() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img.png"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![7u8; 1024], "image/png"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/img.png", server.uri())).unwrap();
        let events = collect(transport().open(&url, CancellationToken::new())).await;

        let TransportEvent::Head(head) = &events[0] else {
            panic!("expected head first, got {:?}", events[0]);
        };
        assert_eq!(head.status, 200);
        assert_eq!(head.status_text, "OK");
        assert_eq!(head.content_type(), "image/png");
        assert_eq!(head.url.as_ref(), Some(&url));

        let last_progress = events
            .iter()
            .filter_map(|ev| match ev {
                TransportEvent::Progress(p) => Some(*p),
                _ => None,
            })
            .last()
            .expect("at least one progress event");
        assert_eq!(last_progress, ProgressEvent::new(1024, Some(1024)));

        match events.last() {
            Some(TransportEvent::Load(blob)) => {
                assert_eq!(blob.size(), 1024);
                assert_eq!(blob.content_type(), "image/png");
            }
            other => panic!("expected load last, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn error_status_still_loads() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/nope", server.uri())).unwrap();
        let events = collect(transport().open(&url, CancellationToken::new())).await;

        assert!(matches!(&events[0], TransportEvent::Head(h) if h.status == 404 && h.status_text == "Not Found"));
        assert!(matches!(events.last(), Some(TransportEvent::Load(blob)) if blob.size() == 7));
    }

    #[tokio::test]
    async fn sends_configured_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", "blobfetch-test/1.0"))
            .and(header("accept", "image/*"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(b"ok".to_vec(), "image/gif"))
            .mount(&server)
            .await;

        let cfg = TransportConfig::builder()
            .user_agent("blobfetch-test/1.0")
            .accept("image/*")
            .build()
            .unwrap();
        let url = Url::parse(&server.uri()).unwrap();
        let events = collect(ReqwestTransport::new(cfg).unwrap().open(&url, CancellationToken::new())).await;

        assert!(matches!(&events[0], TransportEvent::Head(h) if h.status == 200));
    }

    #[tokio::test]
    async fn connection_failure_is_reported() {
        // Bind and drop a listener to get a port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{addr}/")).unwrap();
        let events = collect(transport().open(&url, CancellationToken::new())).await;

        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], TransportEvent::Error(TransportError::Connect(_))));
    }

    #[tokio::test]
    async fn cancelled_transfer_emits_nothing_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(b"late".to_vec(), "text/plain")
                    .set_delay(std::time::Duration::from_secs(30)),
            )
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        let cancel = CancellationToken::new();
        let rx = transport().open(&url, cancel.clone());
        cancel.cancel();

        let events = collect(rx).await;
        assert!(events.iter().all(|ev| !ev.is_terminal()), "unexpected events: {:?}", events);
    }
}
