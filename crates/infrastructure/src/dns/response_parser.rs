use ferrous_nftset_domain::{AnswerData, AnswerRecord, DomainError};
use hickory_proto::op::{Message, ResponseCode};
use hickory_proto::rr::RData;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ParsedResponse {
    pub answers: Vec<AnswerRecord>,

    pub rcode: ResponseCode,

    pub truncated: bool,
}

impl ParsedResponse {
    pub fn address_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_address()).count()
    }
}

pub struct ResponseParser;

impl ResponseParser {
    pub fn parse(response_bytes: &[u8]) -> Result<ParsedResponse, DomainError> {
        let message = Message::from_vec(response_bytes).map_err(|e| {
            DomainError::InvalidDnsResponse(format!("Failed to parse DNS response: {}", e))
        })?;

        let rcode = message.response_code();
        let truncated = message.truncated();

        let answers: Vec<AnswerRecord> = message
            .answers()
            .iter()
            .map(|record| {
                let name: Arc<str> = Arc::from(Self::normalize_name(&record.name().to_utf8()));
                let data = match record.data() {
                    RData::A(a) => AnswerData::V4(a.0),
                    RData::AAAA(aaaa) => AnswerData::V6(aaaa.0),
                    _ => AnswerData::Other(u16::from(record.record_type())),
                };
                AnswerRecord::new(name, data)
            })
            .collect();

        debug!(
            rcode = ?rcode,
            answers = answers.len(),
            truncated = truncated,
            "DNS response parsed"
        );

        Ok(ParsedResponse {
            answers,
            rcode,
            truncated,
        })
    }

    fn normalize_name(name: &str) -> &str {
        if name == "." {
            name
        } else {
            name.trim_end_matches('.')
        }
    }
}
