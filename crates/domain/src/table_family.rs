use crate::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

const IPV4_FAMILIES: [TableFamily; 3] = [TableFamily::Ip, TableFamily::Inet, TableFamily::Bridge];
const IPV6_FAMILIES: [TableFamily; 3] = [TableFamily::Ip6, TableFamily::Inet, TableFamily::Bridge];

/// nftables address family a table lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFamily {
    #[serde(alias = "ipv4")]
    Ip,
    #[serde(alias = "ipv6")]
    Ip6,
    Inet,
    Arp,
    Bridge,
    Netdev,
}

impl TableFamily {
    pub const ALL: [TableFamily; 6] = [
        TableFamily::Ip,
        TableFamily::Ip6,
        TableFamily::Inet,
        TableFamily::Arp,
        TableFamily::Bridge,
        TableFamily::Netdev,
    ];

    /// Keyword used by the `nft` command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            TableFamily::Ip => "ip",
            TableFamily::Ip6 => "ip6",
            TableFamily::Inet => "inet",
            TableFamily::Arp => "arp",
            TableFamily::Bridge => "bridge",
            TableFamily::Netdev => "netdev",
        }
    }

    /// Families an address of this kind is mirrored into: the
    /// address-specific family followed by the family-agnostic ones.
    pub fn for_address(address: &IpAddr) -> &'static [TableFamily] {
        match address {
            IpAddr::V4(_) => &IPV4_FAMILIES,
            IpAddr::V6(_) => &IPV6_FAMILIES,
        }
    }
}

impl fmt::Display for TableFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableFamily {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ip" | "ipv4" => Ok(TableFamily::Ip),
            "ip6" | "ipv6" => Ok(TableFamily::Ip6),
            "inet" => Ok(TableFamily::Inet),
            "arp" => Ok(TableFamily::Arp),
            "bridge" => Ok(TableFamily::Bridge),
            "netdev" => Ok(TableFamily::Netdev),
            other => Err(DomainError::UnknownTableFamily(other.to_string())),
        }
    }
}
