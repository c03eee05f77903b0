pub mod mock_firewall;

pub use mock_firewall::*;
