use crate::base::loadstate::LoadState;
use crate::base::neterror::NetError;
use crate::dns::{AddressSet, Name, Resolve};
use crate::http::request::PreparedRequest;
use crate::http::response::HttpResponse;
use crate::http::wirehead::OrderedHead;
use crate::socket::{ConnectJob, SocketType, TlsConfig};
use bytes::Bytes;
use http::Response;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use rustls::ClientConfig;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Internal state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    ResolveHost,
    Connect,
    TlsHandshake,
    SendRequest,
    ReadBody,
    Done,
}

impl State {
    /// Map internal state to public LoadState.
    fn to_load_state(self) -> LoadState {
        match self {
            State::Idle | State::Done => LoadState::Idle,
            State::ResolveHost => LoadState::ResolvingHost,
            State::Connect => LoadState::Connecting,
            State::TlsHandshake => LoadState::SslHandshake,
            State::SendRequest => LoadState::WaitingForResponse,
            State::ReadBody => LoadState::ReadingResponse,
        }
    }
}

/// One request over one fresh connection.
///
/// Drives resolve → connect → TLS → send → read. The connection is never
/// reused; dropping the transaction tears down the connection task.
pub struct HttpNetworkTransaction {
    state: State,
    resolver: Arc<dyn Resolve>,
    /// Falls back to [`TlsConfig::shared`] when unset.
    tls_config: Option<Arc<ClientConfig>>,
    max_body: usize,
    request: Option<PreparedRequest>,
    addrs: Option<AddressSet>,
    stream: Option<SocketType>,
    response: Option<Response<Incoming>>,
    conn_task: Option<JoinHandle<()>>,
}

impl HttpNetworkTransaction {
    pub fn new(
        request: PreparedRequest,
        resolver: Arc<dyn Resolve>,
        tls_config: Option<Arc<ClientConfig>>,
        max_body: usize,
    ) -> Self {
        Self {
            state: State::Idle,
            resolver,
            tls_config,
            max_body,
            request: Some(request),
            addrs: None,
            stream: None,
            response: None,
            conn_task: None,
        }
    }

    /// Get the current load state (for progress reporting).
    pub fn get_load_state(&self) -> LoadState {
        self.state.to_load_state()
    }

    /// Run the transaction to completion.
    pub async fn start(&mut self) -> Result<HttpResponse, NetError> {
        self.state = State::ResolveHost;
        let result = self.do_loop().await;
        if let Err(e) = &result {
            tracing::debug!(state = self.get_load_state().as_str(), error = %e, "transaction failed");
        }
        self.close();
        result
    }

    async fn do_loop(&mut self) -> Result<HttpResponse, NetError> {
        loop {
            match self.state {
                State::Idle | State::Done => {
                    return Err(NetError::IoError("transaction is not running".into()));
                }
                State::ResolveHost => {
                    let request = self.prepared()?;
                    let addrs = match request.host_ip {
                        Some(ip) => AddressSet::from_ips([ip], true),
                        None => {
                            let name = Name::new(request.host.as_str())?;
                            self.resolver
                                .resolve(name)
                                .await
                                .map_err(NetError::into_dns_failure)?
                        }
                    };
                    tracing::debug!(host = %request.host, count = addrs.len(), "host resolved");
                    self.addrs = Some(addrs);
                    self.state = State::Connect;
                }
                State::Connect => {
                    let request = self.prepared()?;
                    let (port, is_https) = (request.port, request.is_https);
                    let addrs = self
                        .addrs
                        .take()
                        .ok_or_else(|| NetError::ConnectFailure("no resolved addresses".into()))?;
                    let tcp = ConnectJob::connect_tcp(&addrs, port).await?;
                    self.stream = Some(SocketType::Tcp(tcp));
                    self.state = if is_https {
                        State::TlsHandshake
                    } else {
                        State::SendRequest
                    };
                }
                State::TlsHandshake => {
                    let host = self.prepared()?.host.clone();
                    let tcp = match self.stream.take() {
                        Some(SocketType::Tcp(tcp)) => tcp,
                        _ => return Err(NetError::IoError("no TCP stream to secure".into())),
                    };
                    let config = match &self.tls_config {
                        Some(config) => config.clone(),
                        None => TlsConfig::shared()?,
                    };
                    let tls = ConnectJob::tls_handshake(tcp, &host, config).await?;
                    self.stream = Some(tls);
                    self.state = State::SendRequest;
                }
                State::SendRequest => {
                    let stream = self
                        .stream
                        .take()
                        .ok_or_else(|| NetError::IoError("connection missing".into()))?;
                    let prepared = self
                        .request
                        .take()
                        .ok_or_else(|| NetError::IoError("request already sent".into()))?;

                    tracing::debug!(
                        peer = ?stream.peer_addr().ok(),
                        tls = stream.is_tls(),
                        alpn = ?stream.negotiated_alpn().map(String::from_utf8_lossy),
                        "connection established"
                    );

                    // hyper frames the body; the head goes out as rendered.
                    let io = OrderedHead::new(stream, prepared.head.clone());
                    let (mut sender, conn) = http1::Builder::new()
                        .handshake::<_, Full<Bytes>>(TokioIo::new(io))
                        .await
                        .map_err(|e| classify_hyper_error(e, "handshake"))?;

                    self.conn_task = Some(tokio::spawn(async move {
                        if let Err(e) = conn.await {
                            tracing::debug!(error = %e, "connection closed with error");
                        }
                    }));

                    tracing::debug!(
                        method = %prepared.request.method(),
                        url = %prepared.url,
                        "sending request"
                    );
                    let response = sender
                        .send_request(prepared.request)
                        .await
                        .map_err(|e| classify_hyper_error(e, "send request"))?;

                    tracing::debug!(status = response.status().as_u16(), "response headers received");
                    self.response = Some(response);
                    self.state = State::ReadBody;
                }
                State::ReadBody => {
                    let response = self
                        .response
                        .take()
                        .ok_or_else(|| NetError::IoError("response missing".into()))?;
                    let result = self.read_body(response).await?;
                    self.state = State::Done;
                    return Ok(result);
                }
            }
        }
    }

    async fn read_body(&self, response: Response<Incoming>) -> Result<HttpResponse, NetError> {
        let (parts, body) = response.into_parts();

        let collected = Limited::new(body, self.max_body)
            .collect()
            .await
            .map_err(|e| {
                if e.downcast_ref::<LengthLimitError>().is_some() {
                    return too_large(self.max_body);
                }
                match e.downcast::<hyper::Error>() {
                    Ok(hyper_err) => classify_hyper_error(*hyper_err, "read body"),
                    Err(other) => NetError::IoError(format!("read body failed: {other}")),
                }
            })?;

        let body = collected.to_bytes();
        tracing::debug!(bytes = body.len(), "response body read");
        Ok(HttpResponse::new(parts.status, parts.version, parts.headers, body))
    }

    fn prepared(&self) -> Result<&PreparedRequest, NetError> {
        self.request
            .as_ref()
            .ok_or_else(|| NetError::IoError("request already sent".into()))
    }

    /// Abort the connection task and release the socket.
    pub fn close(&mut self) {
        if let Some(task) = self.conn_task.take() {
            task.abort();
        }
        self.stream = None;
        self.response = None;
    }
}

impl Drop for HttpNetworkTransaction {
    fn drop(&mut self) {
        self.close();
    }
}

fn too_large(limit: usize) -> NetError {
    NetError::ResponseTooLarge(format!("response body exceeds {limit} bytes"))
}

/// Map a hyper error onto the executor taxonomy.
fn classify_hyper_error(err: hyper::Error, stage: &str) -> NetError {
    if err.is_parse() || err.is_incomplete_message() {
        return NetError::MalformedResponse(format!("{stage}: {err}"));
    }
    if err.is_timeout() {
        return NetError::Timeout(format!("{stage}: {err}"));
    }

    let io_source = std::error::Error::source(&err)
        .and_then(|source| source.downcast_ref::<std::io::Error>());
    match io_source {
        Some(io) if io.kind() == std::io::ErrorKind::TimedOut => {
            NetError::Timeout(format!("{stage}: {io}"))
        }
        // Body ended before its declared length.
        Some(io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
            NetError::MalformedResponse(format!("{stage}: {io}"))
        }
        Some(io) => NetError::IoError(format!("{stage} failed: {io}")),
        None => NetError::IoError(format!("{stage} failed: {err}")),
    }
}
