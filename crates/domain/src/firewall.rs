use crate::TableFamily;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

/// Remote table reference as reported (or created) by the packet filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub family: TableFamily,
    pub name: String,
    pub handle: Option<u64>,
}

impl Table {
    pub fn new(family: TableFamily, name: impl Into<String>) -> Self {
        Self {
            family,
            name: name.into(),
            handle: None,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.family, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SetKeyType {
    Ipv4Addr,
    Ipv6Addr,
}

impl SetKeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetKeyType::Ipv4Addr => "ipv4_addr",
            SetKeyType::Ipv6Addr => "ipv6_addr",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ipv4_addr" => Some(SetKeyType::Ipv4Addr),
            "ipv6_addr" => Some(SetKeyType::Ipv6Addr),
            _ => None,
        }
    }

    /// Key type assumed when a rule does not configure one.
    pub fn default_for(family: TableFamily) -> Self {
        match family {
            TableFamily::Ip6 => SetKeyType::Ipv6Addr,
            _ => SetKeyType::Ipv4Addr,
        }
    }

    pub fn accepts(&self, address: &IpAddr) -> bool {
        matches!(
            (self, address),
            (SetKeyType::Ipv4Addr, IpAddr::V4(_)) | (SetKeyType::Ipv6Addr, IpAddr::V6(_))
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetFlags {
    pub timeout: bool,
    pub interval: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetDescriptor {
    pub table: Table,
    pub name: String,
    pub key_type: SetKeyType,
    pub flags: SetFlags,
}

impl fmt::Display for SetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.table, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetElement {
    pub address: IpAddr,
    pub timeout: Option<Duration>,
}

impl SetElement {
    pub fn new(address: IpAddr) -> Self {
        Self {
            address,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}
