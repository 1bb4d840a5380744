use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::dns::AddressSet;
use crate::socket::client::SocketType;
use rustls::pki_types::ServerName;
use rustls::ClientConfig;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

/// Manages the connection process: TCP over an address list, then TLS.
///
/// Addresses are tried strictly in order, one at a time; the first that
/// accepts wins. There is no racing between families.
pub struct ConnectJob;

impl ConnectJob {
    /// Connect to the first reachable address in `addrs` on `port`.
    pub async fn connect_tcp(addrs: &AddressSet, port: u16) -> Result<TcpStream, NetError> {
        let mut last_err = None;

        for addr in addrs.socket_addrs(port) {
            tracing::debug!(%addr, "connecting");
            match TcpStream::connect(addr).await.connection_context(addr) {
                Ok(stream) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        tracing::debug!(%addr, error = %e, "failed to set TCP_NODELAY");
                    }
                    return Ok(stream);
                }
                Err(e) => {
                    tracing::debug!(%addr, error = %e, "connect attempt failed");
                    last_err = Some(e);
                }
            }
        }

        Err(match last_err {
            Some(NetError::ConnectFailure(msg)) if addrs.len() > 1 => NetError::ConnectFailure(
                format!("all {} addresses failed, last: {msg}", addrs.len()),
            ),
            Some(e) => e,
            None => NetError::ConnectFailure("no addresses to connect to".into()),
        })
    }

    /// Run a TLS handshake over `tcp`, verifying the certificate for `host`.
    pub async fn tls_handshake(
        tcp: TcpStream,
        host: &str,
        config: Arc<ClientConfig>,
    ) -> Result<SocketType, NetError> {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| NetError::TlsFailure(format!("invalid server name {host:?}: {e}")))?;

        let tls_stream = TlsConnector::from(config)
            .connect(server_name, tcp)
            .await
            .map_err(|e| {
                tracing::debug!(host, error = %e, "TLS handshake failed");
                NetError::TlsFailure(format!("handshake with {host} failed: {e}"))
            })?;

        Ok(SocketType::Tls(Box::new(tls_stream)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use tokio::net::TcpListener;

    fn loopback() -> AddressSet {
        AddressSet::from_ips([IpAddr::V4(Ipv4Addr::LOCALHOST)], true)
    }

    #[tokio::test]
    async fn test_connect_first_reachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let tcp = ConnectJob::connect_tcp(&loopback(), port).await.unwrap();
        assert_eq!(tcp.peer_addr().unwrap().port(), port);
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind then drop to get a port nobody listens on
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let err = ConnectJob::connect_tcp(&loopback(), port).await.unwrap_err();
        assert_eq!(err.kind(), "ConnectFailure");
        assert!(err.message().contains(&port.to_string()));
    }

    #[tokio::test]
    async fn test_connect_empty_set() {
        let err = ConnectJob::connect_tcp(&AddressSet::default(), 80).await.unwrap_err();
        assert_eq!(err.kind(), "ConnectFailure");
    }

    #[tokio::test]
    async fn test_tls_against_plain_server_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            use tokio::io::AsyncWriteExt;
            let _ = stream.write_all(b"HTTP/1.1 400 Bad Request\r\n\r\n").await;
        });

        let config = crate::socket::tls::TlsConfig::custom_roots_only().build().unwrap();
        let tcp = ConnectJob::connect_tcp(&loopback(), port).await.unwrap();
        let err = ConnectJob::tls_handshake(tcp, "localhost", config)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "TlsFailure");
    }
}
