/// ICMP echo (RFC 792): answer pings, and build requests for the ping helper.
///
/// Other ICMP types, including echo replies to our own pings, are dropped.
use super::addr::Ipv4Address;
use super::checksum::internet_checksum;
use super::ipv4::{Egress, MAX_PAYLOAD, PROTO_ICMP};
use super::wire::{self, WireError};

pub const ECHO_REPLY: u8 = 0;
pub const ECHO_REQUEST: u8 = 8;

/// type, code, checksum, identifier, sequence.
pub const HEADER_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoHeader {
    pub kind: u8,
    pub code: u8,
    pub checksum: u16,
    pub ident: u16,
    pub seq: u16,
}

impl EchoHeader {
    pub fn decode(message: &[u8]) -> Result<(Self, &[u8]), WireError> {
        wire::require(message, HEADER_LEN)?;
        let header = Self {
            kind: message[0],
            code: message[1],
            checksum: wire::read_u16(message, 2),
            ident: wire::read_u16(message, 4),
            seq: wire::read_u16(message, 6),
        };
        Ok((header, &message[HEADER_LEN..]))
    }
}

/// Build an echo request with `data` as payload into `out`.
/// Returns the message length.
pub fn build_echo_request(
    ident: u16,
    seq: u16,
    data: &[u8],
    out: &mut [u8],
) -> Result<usize, WireError> {
    let len = HEADER_LEN + data.len();
    wire::require(out, len)?;
    let msg = &mut out[..len];
    msg[0] = ECHO_REQUEST;
    msg[1] = 0;
    wire::write_u16(msg, 2, 0);
    wire::write_u16(msg, 4, ident);
    wire::write_u16(msg, 6, seq);
    msg[HEADER_LEN..].copy_from_slice(data);
    let csum = internet_checksum(msg);
    wire::write_u16(msg, 2, csum);
    Ok(len)
}

/// Turn an echo request into its reply: the whole message is copied,
/// type and code become 0 and the checksum is recomputed. Identifier,
/// sequence and data are mirrored unchanged.
pub fn build_echo_reply(request: &[u8], out: &mut [u8]) -> Result<usize, WireError> {
    let len = request.len();
    wire::require(request, HEADER_LEN)?;
    wire::require(out, len)?;
    let msg = &mut out[..len];
    msg.copy_from_slice(request);
    msg[0] = ECHO_REPLY;
    msg[1] = 0;
    wire::write_u16(msg, 2, 0);
    let csum = internet_checksum(msg);
    wire::write_u16(msg, 2, csum);
    Ok(len)
}

/// Handle an inbound ICMP message from `src`.
pub(crate) fn on_message(egress: &mut Egress<'_>, src: Ipv4Address, message: &[u8]) {
    let header = match EchoHeader::decode(message) {
        Ok((h, _)) => h,
        Err(e) => {
            log::trace!("icmp: dropped from {}: {}", src, e);
            return;
        }
    };
    if header.kind != ECHO_REQUEST {
        log::trace!("icmp: ignoring type {} from {}", header.kind, src);
        return;
    }

    let mut reply = [0u8; MAX_PAYLOAD];
    let len = match build_echo_reply(message, &mut reply) {
        Ok(n) => n,
        Err(e) => {
            log::trace!("icmp: echo request from {} not answered: {}", src, e);
            return;
        }
    };

    log::debug!("icmp: echo reply to {} id={:#06x} seq={}", src, header.ident, header.seq);
    if let Err(e) = egress.send(src, PROTO_ICMP, &reply[..len]) {
        log::debug!("icmp: reply to {} not sent: {}", src, e);
    }
}
