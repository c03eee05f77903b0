pub mod forwarder;
pub mod response_parser;
pub mod server;
pub mod wire_response;

pub use forwarder::UdpForwarder;
pub use response_parser::{ParsedResponse, ResponseParser};
pub use server::{DnsServerHandler, UdpResponseWriter};
