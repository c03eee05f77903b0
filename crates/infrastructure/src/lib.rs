//! Ferrous NftSet Infrastructure Layer
pub mod dns;
pub mod nftables;
