use super::forwarder::UdpForwarder;
use super::response_parser::ResponseParser;
use super::wire_response::{self, HEADER_LEN, RCODE_SERVFAIL};
use async_trait::async_trait;
use ferrous_nftset_application::ports::ResponseWriter;
use ferrous_nftset_application::use_cases::MirrorResponseUseCase;
use ferrous_nftset_domain::DomainError;
use metrics::counter;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::{debug, error, warn};

/// Sends the upstream reply, byte for byte, back to the client.
pub struct UdpResponseWriter {
    socket: Arc<UdpSocket>,
    peer: SocketAddr,
    payload: Vec<u8>,
}

impl UdpResponseWriter {
    pub fn new(socket: Arc<UdpSocket>, peer: SocketAddr, payload: Vec<u8>) -> Self {
        Self {
            socket,
            peer,
            payload,
        }
    }
}

#[async_trait]
impl ResponseWriter for UdpResponseWriter {
    async fn write_response(&mut self) -> Result<(), DomainError> {
        self.socket
            .send_to(&self.payload, self.peer)
            .await
            .map_err(|e| {
                DomainError::IoError(format!("Failed to send response to {}: {}", self.peer, e))
            })?;
        Ok(())
    }
}

pub struct DnsServerHandler {
    forwarder: UdpForwarder,
    mirror: Arc<MirrorResponseUseCase>,
    server_label: Arc<str>,
}

impl DnsServerHandler {
    pub fn new(forwarder: UdpForwarder, mirror: Arc<MirrorResponseUseCase>) -> Self {
        let server_label = Arc::from(forwarder.upstream().to_string());
        Self {
            forwarder,
            mirror,
            server_label,
        }
    }

    /// Forward one client datagram and mirror the reply's addresses.
    pub async fn handle_udp(&self, query: &[u8], socket: Arc<UdpSocket>, peer: SocketAddr) {
        if query.len() < HEADER_LEN {
            debug!(client = %peer, bytes = query.len(), "Dropping runt DNS datagram");
            return;
        }

        let reply = match self.forwarder.forward(query).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(client = %peer, upstream = %self.server_label, error = %e, "Upstream query failed");
                counter!("nftset_upstream_failures_total", "server" => self.server_label.to_string())
                    .increment(1);
                send_servfail(&socket, query, peer).await;
                return;
            }
        };

        let parsed = match ResponseParser::parse(&reply) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(client = %peer, upstream = %self.server_label, error = %e, "Unparseable upstream response");
                counter!("nftset_upstream_failures_total", "server" => self.server_label.to_string())
                    .increment(1);
                send_servfail(&socket, query, peer).await;
                return;
            }
        };

        let writer = UdpResponseWriter::new(socket, peer, reply);
        if let Err(e) = self
            .mirror
            .execute(parsed.answers, Arc::clone(&self.server_label), writer)
            .await
        {
            error!(client = %peer, error = %e, "Failed to write DNS response");
        }
    }
}

async fn send_servfail(socket: &UdpSocket, query: &[u8], peer: SocketAddr) {
    let Some(response) = wire_response::build_error_response(query, RCODE_SERVFAIL) else {
        return;
    };
    if let Err(e) = socket.send_to(&response, peer).await {
        error!(client = %peer, error = %e, "Failed to send SERVFAIL response");
    }
}
