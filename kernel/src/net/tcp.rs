/// Minimal single-connection TCP responder.
///
/// Passive open only, one peer at a time, one request and one response per
/// connection, then close:
///
///   CLOSED --listen--> LISTEN --SYN--> SYN_RCVD --ACK--> ESTABLISHED
///   ESTABLISHED --data--> (response, FIN) LAST_ACK --ACK--> LISTEN
///   ESTABLISHED --FIN--> (ACK) CLOSED
///
/// There is no retransmission, no window management and no RST handling.
/// Anything that does not match a transition is ignored, including traffic
/// from any host other than the recorded peer; a second SYN while busy is
/// dropped, not queued.
use core::fmt;

use bitflags::bitflags;

use crate::storage::ByteStore;

use super::addr::Ipv4Address;
use super::checksum::pseudo_header_checksum;
use super::http::{HttpResponder, SEGMENT_CAPACITY};
use super::ipv4::{Egress, PROTO_TCP};
use super::wire::{self, WireError};

/// Header length without options.
pub const HEADER_LEN: usize = 20;

pub const DEFAULT_PORT: u16 = 80;

/// Our initial send sequence number, reused for every connection.
pub const INITIAL_SEND_SEQ: u32 = 0x1000;

/// Advertised receive window.
pub const WINDOW: u16 = 4096;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TcpFlags: u8 {
        const FIN = 0x01;
        const SYN = 0x02;
        const RST = 0x04;
        const PSH = 0x08;
        const ACK = 0x10;
        const URG = 0x20;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpHeader {
    pub src_port: u16,
    pub dst_port: u16,
    pub seq: u32,
    pub ack: u32,
    /// Header length in bytes (data offset * 4).
    pub header_len: usize,
    pub flags: TcpFlags,
    pub window: u16,
    pub checksum: u16,
    pub urgent: u16,
}

impl TcpHeader {
    /// Header for an outbound segment from the listening port.
    pub fn outbound(src_port: u16, dst_port: u16, seq: u32, ack: u32, flags: TcpFlags) -> Self {
        Self {
            src_port,
            dst_port,
            seq,
            ack,
            header_len: HEADER_LEN,
            flags,
            window: WINDOW,
            checksum: 0,
            urgent: 0,
        }
    }

    /// Split a segment into header and payload. Options are skipped.
    pub fn decode(segment: &[u8]) -> Result<(Self, &[u8]), WireError> {
        wire::require(segment, HEADER_LEN)?;
        let header_len = (segment[12] >> 4) as usize * 4;
        if header_len < HEADER_LEN || header_len > segment.len() {
            return Err(WireError::BadHeaderLength(header_len));
        }
        let header = Self {
            src_port: wire::read_u16(segment, 0),
            dst_port: wire::read_u16(segment, 2),
            seq: wire::read_u32(segment, 4),
            ack: wire::read_u32(segment, 8),
            header_len,
            flags: TcpFlags::from_bits_truncate(segment[13]),
            window: wire::read_u16(segment, 14),
            checksum: wire::read_u16(segment, 16),
            urgent: wire::read_u16(segment, 18),
        };
        Ok((header, &segment[header_len..]))
    }

    /// Write a 20-byte header. The checksum field is written as given;
    /// the caller patches it once the payload is in place.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, WireError> {
        wire::require(buf, HEADER_LEN)?;
        wire::write_u16(buf, 0, self.src_port);
        wire::write_u16(buf, 2, self.dst_port);
        wire::write_u32(buf, 4, self.seq);
        wire::write_u32(buf, 8, self.ack);
        buf[12] = ((HEADER_LEN / 4) as u8) << 4;
        buf[13] = self.flags.bits();
        wire::write_u16(buf, 14, self.window);
        wire::write_u16(buf, 16, self.checksum);
        wire::write_u16(buf, 18, self.urgent);
        Ok(HEADER_LEN)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcpState {
    Closed,
    Listen,
    SynReceived,
    Established,
    LastAck,
}

impl fmt::Display for TcpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TcpState::Closed => "CLOSED",
            TcpState::Listen => "LISTEN",
            TcpState::SynReceived => "SYN_RCVD",
            TcpState::Established => "ESTABLISHED",
            TcpState::LastAck => "LAST_ACK",
        };
        f.write_str(name)
    }
}

/// The one connection context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub state: TcpState,
    pub listen_port: u16,
    pub peer_ip: Ipv4Address,
    pub peer_port: u16,
    /// Next sequence number expected from the peer.
    pub rcv_next: u32,
    /// Next sequence number we will send.
    pub snd_next: u32,
    pub initial_send_seq: u32,
}

/// Snapshot for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpStatus {
    pub state: TcpState,
    pub listen_port: u16,
}

impl fmt::Display for TcpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "http: {} port={}", self.state, self.listen_port)
    }
}

/// Where TCP-Mini puts its outbound segments.
pub trait SegmentSink {
    fn emit(&mut self, dst: Ipv4Address, header: &TcpHeader, payload: &[u8]);
}

/// Wrap the segment in IPv4 with a pseudo-header checksum and send it.
/// Send failures are logged and otherwise ignored: there is no retransmit.
impl SegmentSink for Egress<'_> {
    fn emit(&mut self, dst: Ipv4Address, header: &TcpHeader, payload: &[u8]) {
        let mut seg = [0u8; HEADER_LEN + SEGMENT_CAPACITY];
        let payload = &payload[..payload.len().min(SEGMENT_CAPACITY)];
        let len = HEADER_LEN + payload.len();

        let mut header = *header;
        header.checksum = 0;
        if header.encode(&mut seg).is_err() {
            return;
        }
        seg[HEADER_LEN..len].copy_from_slice(payload);
        let csum = pseudo_header_checksum(self.local_address(), dst, PROTO_TCP, &seg[..len]);
        wire::write_u16(&mut seg, 16, csum);

        if let Err(e) = self.send(dst, PROTO_TCP, &seg[..len]) {
            log::debug!("tcp: {:?} to {} not sent: {}", header.flags, dst, e);
        }
    }
}

pub struct TcpMini {
    conn: Connection,
    http: HttpResponder,
}

impl TcpMini {
    pub fn new() -> Self {
        Self {
            conn: Connection {
                state: TcpState::Closed,
                listen_port: DEFAULT_PORT,
                peer_ip: Ipv4Address::UNSPECIFIED,
                peer_port: 0,
                rcv_next: 0,
                snd_next: 0,
                initial_send_seq: INITIAL_SEND_SEQ,
            },
            http: HttpResponder::new(),
        }
    }

    /// Start accepting connections on `port` (0 means 80).
    pub fn listen(&mut self, port: u16) {
        self.conn.listen_port = if port == 0 { DEFAULT_PORT } else { port };
        self.conn.state = TcpState::Listen;
        log::info!("tcp: listening on port {}", self.conn.listen_port);
    }

    pub fn stop(&mut self) {
        self.conn.state = TcpState::Closed;
        log::info!("tcp: stopped");
    }

    pub fn state(&self) -> TcpState {
        self.conn.state
    }

    pub fn status(&self) -> TcpStatus {
        TcpStatus {
            state: self.conn.state,
            listen_port: self.conn.listen_port,
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn http(&self) -> &HttpResponder {
        &self.http
    }

    pub fn http_mut(&mut self) -> &mut HttpResponder {
        &mut self.http
    }

    /// Feed one inbound segment from `src` through the state machine.
    pub fn on_segment(
        &mut self,
        src: Ipv4Address,
        header: &TcpHeader,
        payload: &[u8],
        store: &mut dyn ByteStore,
        tx: &mut dyn SegmentSink,
    ) {
        if self.conn.state == TcpState::Closed || header.dst_port != self.conn.listen_port {
            return;
        }

        if self.conn.state == TcpState::Listen {
            if header.flags.contains(TcpFlags::SYN) {
                self.listen_on_syn(src, header, tx);
            }
            return;
        }

        if src != self.conn.peer_ip || header.src_port != self.conn.peer_port {
            log::trace!("tcp: ignoring {}:{}, busy with {}:{}",
                src, header.src_port, self.conn.peer_ip, self.conn.peer_port);
            return;
        }

        match self.conn.state {
            TcpState::SynReceived => {
                if self.syn_received_on_ack(header) {
                    // The handshake ACK may carry the request.
                    self.established_on_segment(header, payload, store, tx);
                }
            }
            TcpState::Established => self.established_on_segment(header, payload, store, tx),
            TcpState::LastAck => self.last_ack_on_ack(header),
            TcpState::Closed | TcpState::Listen => {}
        }
    }

    fn transition(&mut self, next: TcpState) {
        log::debug!("tcp: {} -> {} ({}:{})",
            self.conn.state, next, self.conn.peer_ip, self.conn.peer_port);
        self.conn.state = next;
    }

    fn reply(&self, tx: &mut dyn SegmentSink, flags: TcpFlags, payload: &[u8]) {
        let header = TcpHeader::outbound(
            self.conn.listen_port,
            self.conn.peer_port,
            self.conn.snd_next,
            self.conn.rcv_next,
            flags,
        );
        tx.emit(self.conn.peer_ip, &header, payload);
    }

    /// LISTEN + SYN: record the peer and answer SYN|ACK.
    fn listen_on_syn(&mut self, src: Ipv4Address, header: &TcpHeader, tx: &mut dyn SegmentSink) {
        self.conn.peer_ip = src;
        self.conn.peer_port = header.src_port;
        self.conn.rcv_next = header.seq.wrapping_add(1);
        self.conn.snd_next = self.conn.initial_send_seq;
        self.reply(tx, TcpFlags::SYN | TcpFlags::ACK, &[]);
        self.conn.snd_next = self.conn.snd_next.wrapping_add(1);
        self.transition(TcpState::SynReceived);
    }

    /// SYN_RCVD + ACK of our SYN. Returns true if the connection is now open.
    fn syn_received_on_ack(&mut self, header: &TcpHeader) -> bool {
        if header.flags.contains(TcpFlags::ACK) && header.ack == self.conn.snd_next {
            self.transition(TcpState::Established);
            true
        } else {
            false
        }
    }

    fn established_on_segment(
        &mut self,
        header: &TcpHeader,
        payload: &[u8],
        store: &mut dyn ByteStore,
        tx: &mut dyn SegmentSink,
    ) {
        if header.flags.contains(TcpFlags::FIN) {
            self.established_on_fin(header, tx);
        } else if !payload.is_empty() {
            self.established_on_data(header, payload, store, tx);
        }
        // Bare ACKs change nothing.
    }

    /// ESTABLISHED + FIN from the peer: acknowledge and drop to CLOSED
    /// without sending a FIN of our own.
    fn established_on_fin(&mut self, header: &TcpHeader, tx: &mut dyn SegmentSink) {
        self.conn.rcv_next = header.seq.wrapping_add(1);
        self.reply(tx, TcpFlags::ACK, &[]);
        self.transition(TcpState::Closed);
    }

    /// ESTABLISHED + request bytes: send the whole response, then FIN.
    fn established_on_data(
        &mut self,
        header: &TcpHeader,
        payload: &[u8],
        store: &mut dyn ByteStore,
        tx: &mut dyn SegmentSink,
    ) {
        self.conn.rcv_next = header.seq.wrapping_add(payload.len() as u32);

        let mut response = [0u8; SEGMENT_CAPACITY];
        let (status, len) = self.http.respond(store, &mut response);
        log::debug!("tcp: {} bytes of request, answering \"{}\" ({} bytes)",
            payload.len(), status.status_line(), len);

        self.reply(tx, TcpFlags::PSH | TcpFlags::ACK, &response[..len]);
        self.conn.snd_next = self.conn.snd_next.wrapping_add(len as u32);
        self.reply(tx, TcpFlags::FIN | TcpFlags::ACK, &[]);
        self.conn.snd_next = self.conn.snd_next.wrapping_add(1);
        self.transition(TcpState::LastAck);
    }

    /// LAST_ACK + ACK of our FIN: ready for the next peer.
    fn last_ack_on_ack(&mut self, header: &TcpHeader) {
        if header.flags.contains(TcpFlags::ACK) && header.ack == self.conn.snd_next {
            self.transition(TcpState::Listen);
        }
    }
}

impl Default for TcpMini {
    fn default() -> Self {
        Self::new()
    }
}
