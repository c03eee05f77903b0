use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

/// Payload of one answer-section record, reduced to what the mirror cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerData {
    V4(Ipv4Addr),
    V6(Ipv6Addr),
    /// Any other record kind, carrying its wire type code.
    Other(u16),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    pub name: Arc<str>,
    pub data: AnswerData,
}

impl AnswerRecord {
    pub fn new(name: impl Into<Arc<str>>, data: AnswerData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn a(name: &str, address: Ipv4Addr) -> Self {
        Self::new(name, AnswerData::V4(address))
    }

    pub fn aaaa(name: &str, address: Ipv6Addr) -> Self {
        Self::new(name, AnswerData::V6(address))
    }

    /// Address carried by A/AAAA records, `None` for everything else.
    pub fn address(&self) -> Option<IpAddr> {
        match self.data {
            AnswerData::V4(v4) => Some(IpAddr::V4(v4)),
            AnswerData::V6(v6) => Some(IpAddr::V6(v6)),
            AnswerData::Other(_) => None,
        }
    }

    pub fn is_address(&self) -> bool {
        !matches!(self.data, AnswerData::Other(_))
    }
}

impl fmt::Display for AnswerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.data {
            AnswerData::V4(v4) => write!(f, "{}({})", v4, self.name),
            AnswerData::V6(v6) => write!(f, "{}({})", v6, self.name),
            AnswerData::Other(code) => write!(f, "TYPE{}({})", code, self.name),
        }
    }
}

/// True when at least one record would be mirrored.
pub fn has_address_records(answers: &[AnswerRecord]) -> bool {
    answers.iter().any(AnswerRecord::is_address)
}
