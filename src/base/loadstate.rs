/// The current stage of a request.
/// Reported in traces so a timeout can be attributed to the stage it hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// The request is idle.
    #[default]
    Idle,

    /// Resolving the host.
    ResolvingHost,

    /// Connecting to the host (TCP handshake).
    Connecting,

    /// Establishing an SSL connection.
    SslHandshake,

    /// Sending the request and waiting for the response head.
    WaitingForResponse,

    /// Reading the response body.
    ReadingResponse,
}

impl LoadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadState::Idle => "idle",
            LoadState::ResolvingHost => "resolving host",
            LoadState::Connecting => "connecting",
            LoadState::SslHandshake => "tls handshake",
            LoadState::WaitingForResponse => "waiting for response",
            LoadState::ReadingResponse => "reading response",
        }
    }
}
