//! Loopback mock servers shared by the integration tests.
//!
//! Both servers run on plain std threads so they work from `#[test]` and
//! `#[tokio::test]` alike, including when the code under test builds its
//! own runtime.

#![allow(dead_code)]

use hickory_resolver::proto::op::{Message, MessageType, ResponseCode};
use hickory_resolver::proto::rr::rdata::{A, AAAA};
use hickory_resolver::proto::rr::{RData, Record, RecordType};
use std::io::{Read, Write};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, UdpSocket};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// How the mock name server answers.
#[derive(Clone, Debug)]
pub enum DnsBehavior {
    Answer { v4: Vec<Ipv4Addr>, v6: Vec<Ipv6Addr> },
    NxDomain,
    ServFail,
    Silent,
}

impl DnsBehavior {
    pub fn v4(ips: &[[u8; 4]]) -> Self {
        DnsBehavior::Answer {
            v4: ips.iter().map(|o| Ipv4Addr::from(*o)).collect(),
            v6: Vec::new(),
        }
    }

    fn reply(&self, request: &Message) -> Option<Vec<u8>> {
        let code = match self {
            DnsBehavior::Silent => return None,
            DnsBehavior::NxDomain => ResponseCode::NXDomain,
            DnsBehavior::ServFail => ResponseCode::ServFail,
            DnsBehavior::Answer { .. } => ResponseCode::NoError,
        };

        let mut response = Message::new();
        response
            .set_id(request.id())
            .set_message_type(MessageType::Response)
            .set_op_code(request.op_code())
            .set_recursion_desired(request.recursion_desired())
            .set_recursion_available(true)
            .set_response_code(code);
        response.add_queries(request.queries().iter().cloned());

        if let DnsBehavior::Answer { v4, v6 } = self {
            for query in request.queries() {
                let name = query.name().clone();
                match query.query_type() {
                    RecordType::A => {
                        for ip in v4 {
                            response.add_answer(Record::from_rdata(name.clone(), 60, RData::A(A(*ip))));
                        }
                    }
                    RecordType::AAAA => {
                        for ip in v6 {
                            response.add_answer(Record::from_rdata(
                                name.clone(),
                                60,
                                RData::AAAA(AAAA(*ip)),
                            ));
                        }
                    }
                    _ => {}
                }
            }
        }

        response.to_vec().ok()
    }
}

/// A UDP name server on 127.0.0.1. `hits` counts received datagrams.
pub struct MockDns {
    pub addr: SocketAddr,
    pub hits: Arc<AtomicUsize>,
}

impl MockDns {
    pub fn spawn(behavior: DnsBehavior) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = socket.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        std::thread::spawn(move || {
            let mut buf = [0u8; 4096];
            loop {
                let Ok((len, peer)) = socket.recv_from(&mut buf) else {
                    return;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                let Ok(request) = Message::from_vec(&buf[..len]) else {
                    continue;
                };
                if let Some(reply) = behavior.reply(&request) {
                    let _ = socket.send_to(&reply, peer);
                }
            }
        });

        MockDns { addr, hits }
    }

    pub fn endpoint(&self) -> String {
        self.addr.to_string()
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Read one HTTP/1.1 request: headers plus a Content-Length or chunked body.
pub fn read_request(stream: &mut impl Read) -> Vec<u8> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = find(&data, b"\r\n\r\n") {
            break pos + 4;
        }
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return data,
            Ok(n) => data.extend_from_slice(&buf[..n]),
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_ascii_lowercase();
    let content_length = head
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok());
    let chunked = head.contains("transfer-encoding: chunked");

    loop {
        let body = &data[header_end..];
        let complete = match content_length {
            Some(len) => body.len() >= len,
            None if chunked => find(body, b"0\r\n\r\n").is_some(),
            None => true,
        };
        if complete {
            return data;
        }
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return data,
            Ok(n) => data.extend_from_slice(&buf[..n]),
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Accept one connection, read the request, write `response`, close.
/// The handle yields the raw request bytes.
pub fn serve_once(response: impl Into<Vec<u8>>) -> (SocketAddr, JoinHandle<Vec<u8>>) {
    let response = response.into();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let request = read_request(&mut stream);
        let _ = stream.write_all(&response);
        let _ = stream.flush();
        request
    });

    (addr, handle)
}

/// Accept one connection and hold it open without answering.
pub fn serve_silent(hold: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            std::thread::sleep(hold);
            drop(stream);
        }
    });
    addr
}

/// A loopback port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
