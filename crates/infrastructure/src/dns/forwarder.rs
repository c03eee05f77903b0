//! Plain UDP forwarding to a single upstream resolver (RFC 1035 §4.2.1).

use super::wire_response::HEADER_LEN;
use ferrous_nftset_domain::DomainError;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

/// Maximum UDP DNS response size with EDNS(0)
const MAX_UDP_RESPONSE_SIZE: usize = 4096;

pub struct UdpForwarder {
    upstream: SocketAddr,
    timeout: Duration,
}

impl UdpForwarder {
    pub fn new(upstream: SocketAddr, timeout: Duration) -> Self {
        Self { upstream, timeout }
    }

    pub fn upstream(&self) -> SocketAddr {
        self.upstream
    }

    /// Send `query` upstream under a fresh transaction id and return the
    /// reply with the client's id restored.
    pub async fn forward(&self, query: &[u8]) -> Result<Vec<u8>, DomainError> {
        if query.len() < HEADER_LEN {
            return Err(DomainError::InvalidDnsResponse(format!(
                "Query of {} bytes is shorter than a DNS header",
                query.len()
            )));
        }

        let upstream_id = fastrand::u16(..).to_be_bytes();
        let mut outbound = query.to_vec();
        outbound[..2].copy_from_slice(&upstream_id);

        let mut reply = tokio::time::timeout(self.timeout, self.exchange(&outbound, upstream_id))
            .await
            .map_err(|_| DomainError::QueryTimeout)??;

        reply[..2].copy_from_slice(&query[..2]);
        Ok(reply)
    }

    async fn exchange(&self, outbound: &[u8], id: [u8; 2]) -> Result<Vec<u8>, DomainError> {
        let bind_addr = if self.upstream.is_ipv4() {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0)
        } else {
            SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0)
        };

        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| DomainError::IoError(format!("Failed to bind UDP socket: {}", e)))?;
        socket.connect(self.upstream).await.map_err(|e| {
            DomainError::IoError(format!("Failed to connect to {}: {}", self.upstream, e))
        })?;

        socket.send(outbound).await.map_err(|e| {
            DomainError::IoError(format!(
                "Failed to send UDP query to {}: {}",
                self.upstream, e
            ))
        })?;

        let mut recv_buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];
        loop {
            let n = socket.recv(&mut recv_buf).await.map_err(|e| {
                DomainError::IoError(format!(
                    "Failed to receive UDP response from {}: {}",
                    self.upstream, e
                ))
            })?;

            if n < HEADER_LEN || recv_buf[..2] != id {
                warn!(upstream = %self.upstream, bytes = n, "Discarding mismatched UDP response");
                continue;
            }

            recv_buf.truncate(n);
            debug!(upstream = %self.upstream, bytes_received = n, "UDP response received");
            return Ok(recv_buf);
        }
    }
}
