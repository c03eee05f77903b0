//! Error replies built directly in wire format from the client's query.

pub const HEADER_LEN: usize = 12;

pub const RCODE_FORMERR: u8 = 1;
pub const RCODE_SERVFAIL: u8 = 2;

/// Offset just past the first question, or `None` if it is malformed.
pub fn question_end(query: &[u8]) -> Option<usize> {
    if query.len() < HEADER_LEN {
        return None;
    }

    let mut pos = HEADER_LEN;
    let mut name_len = 0usize;
    loop {
        let label = *query.get(pos)? as usize;
        if label == 0 {
            pos += 1;
            break;
        }
        if label & 0xC0 != 0 {
            return None;
        }
        name_len += label + 1;
        if name_len > 255 {
            return None;
        }
        pos += 1 + label;
    }

    let end = pos + 4;
    (end <= query.len()).then_some(end)
}

/// Reply to `query` carrying `rcode` and no records.
///
/// The id, opcode and RD bit are echoed; the question is echoed when it can
/// be parsed. Returns `None` for a datagram shorter than a DNS header.
pub fn build_error_response(query: &[u8], rcode: u8) -> Option<Vec<u8>> {
    if query.len() < HEADER_LEN {
        return None;
    }

    let qdcount = u16::from_be_bytes([query[4], query[5]]);
    let question = if qdcount > 0 { question_end(query) } else { None };
    let len = question.unwrap_or(HEADER_LEN);

    let mut buf = Vec::with_capacity(len);
    buf.extend_from_slice(&query[..len]);

    // QR=1, opcode and RD copied, AA/TC cleared.
    buf[2] = 0x80 | (query[2] & 0x78) | (query[2] & 0x01);
    // RA=1, Z cleared.
    buf[3] = 0x80 | (rcode & 0x0F);
    buf[4] = 0x00;
    buf[5] = u8::from(question.is_some());
    buf[6..HEADER_LEN].fill(0);

    Some(buf)
}
