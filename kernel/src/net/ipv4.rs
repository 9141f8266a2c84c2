/// IPv4: header codec, interface configuration, next-hop selection and the
/// egress path shared by ICMP and TCP.
///
/// No options, no fragmentation. Outbound headers are always 20 bytes with
/// DF set and TTL 64. Inbound header checksums are not verified.
use core::fmt;

use crate::drivers::LinkAdapter;

use super::addr::{Ipv4Address, MacAddress};
use super::arp::{self, ArpCache};
use super::checksum::internet_checksum;
use super::ethernet::{self, EtherType, EthernetHeader};
use super::wire::{self, WireError};

/// Header length without options.
pub const HEADER_LEN: usize = 20;

/// Largest payload `send` accepts.
pub const MAX_PAYLOAD: usize = 1500;

pub const DEFAULT_TTL: u8 = 64;

pub const PROTO_ICMP: u8 = 1;
pub const PROTO_TCP: u8 = 6;

/// Don't Fragment, fragment offset 0.
const FLAGS_DF: u16 = 0x4000;

/// Local address, netmask and gateway. Any of them may be unset (zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ipv4Config {
    pub address: Ipv4Address,
    pub netmask: Ipv4Address,
    pub gateway: Ipv4Address,
}

impl Ipv4Config {
    pub const fn new(address: Ipv4Address, netmask: Ipv4Address, gateway: Ipv4Address) -> Self {
        Self { address, netmask, gateway }
    }

    /// Where a datagram for `dest` goes on the wire.
    ///
    /// The gateway is used only when address, mask and gateway are all
    /// configured and `dest` is outside the local subnet.
    pub fn next_hop(&self, dest: Ipv4Address) -> Ipv4Address {
        let mask = self.netmask.to_bits();
        let local = self.address.to_bits();
        if mask != 0
            && local != 0
            && !self.gateway.is_unspecified()
            && dest.to_bits() & mask != local & mask
        {
            self.gateway
        } else {
            dest
        }
    }

    /// Whether an inbound datagram for `dst` is ours. Until an address is
    /// configured every destination is accepted.
    pub fn accepts(&self, dst: Ipv4Address) -> bool {
        self.address.is_unspecified() || dst == self.address
    }
}

impl fmt::Display for Ipv4Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ip={} mask={} gw={}", self.address, self.netmask, self.gateway)
    }
}

/// Decoded IPv4 header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Header {
    /// Header length in bytes (IHL * 4).
    pub header_len: usize,
    pub dscp_ecn: u8,
    pub total_len: u16,
    pub ident: u16,
    pub flags_fragment: u16,
    pub ttl: u8,
    pub protocol: u8,
    pub checksum: u16,
    pub src: Ipv4Address,
    pub dst: Ipv4Address,
}

impl Ipv4Header {
    /// Header for an outbound datagram carrying `payload_len` bytes.
    pub fn outbound(src: Ipv4Address, dst: Ipv4Address, protocol: u8, payload_len: usize) -> Self {
        Self {
            header_len: HEADER_LEN,
            dscp_ecn: 0,
            total_len: (HEADER_LEN + payload_len) as u16,
            ident: 0,
            flags_fragment: FLAGS_DF,
            ttl: DEFAULT_TTL,
            protocol,
            checksum: 0,
            src,
            dst,
        }
    }

    /// Split a datagram into header and payload. The payload ends where the
    /// total-length field says, so link-layer padding is discarded.
    pub fn decode(packet: &[u8]) -> Result<(Self, &[u8]), WireError> {
        wire::require(packet, HEADER_LEN)?;

        let version = packet[0] >> 4;
        if version != 4 {
            return Err(WireError::BadVersion(version));
        }
        let header_len = (packet[0] & 0x0F) as usize * 4;
        if header_len < HEADER_LEN || header_len > packet.len() {
            return Err(WireError::BadHeaderLength(header_len));
        }
        let total_len = wire::read_u16(packet, 2);
        let total = total_len as usize;
        if total < header_len || total > packet.len() {
            return Err(WireError::BadLength(total));
        }

        let header = Self {
            header_len,
            dscp_ecn: packet[1],
            total_len,
            ident: wire::read_u16(packet, 4),
            flags_fragment: wire::read_u16(packet, 6),
            ttl: packet[8],
            protocol: packet[9],
            checksum: wire::read_u16(packet, 10),
            src: Ipv4Address::from_slice(&packet[12..16]),
            dst: Ipv4Address::from_slice(&packet[16..20]),
        };
        Ok((header, &packet[header_len..total]))
    }

    /// Write a 20-byte header (options are never emitted) and fill in the
    /// header checksum. `self.checksum` is ignored.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, WireError> {
        wire::require(buf, HEADER_LEN)?;
        let hdr = &mut buf[..HEADER_LEN];
        hdr[0] = 0x45;
        hdr[1] = self.dscp_ecn;
        wire::write_u16(hdr, 2, self.total_len);
        wire::write_u16(hdr, 4, self.ident);
        wire::write_u16(hdr, 6, self.flags_fragment);
        hdr[8] = self.ttl;
        hdr[9] = self.protocol;
        wire::write_u16(hdr, 10, 0);
        wire::write_u32(hdr, 12, self.src.to_bits());
        wire::write_u32(hdr, 16, self.dst.to_bits());
        let csum = internet_checksum(hdr);
        wire::write_u16(hdr, 10, csum);
        Ok(HEADER_LEN)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// Next hop not in the ARP cache; a request has been broadcast.
    Unresolved(Ipv4Address),
    /// Payload larger than `MAX_PAYLOAD`.
    PayloadTooLarge(usize),
    /// The link adapter refused the frame.
    LinkRefused,
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::Unresolved(ip) => write!(f, "no ARP entry for next hop {}", ip),
            SendError::PayloadTooLarge(n) => {
                write!(f, "payload of {} bytes exceeds {}", n, MAX_PAYLOAD)
            }
            SendError::LinkRefused => write!(f, "link refused frame"),
        }
    }
}

/// Everything needed to put a datagram on the wire, borrowed out of the
/// stack for the duration of one receive callback or one send.
pub(crate) struct Egress<'a> {
    pub link: &'a mut dyn LinkAdapter,
    pub arp: &'a mut ArpCache,
    pub config: Ipv4Config,
    pub mac: MacAddress,
}

impl<'a> Egress<'a> {
    pub fn new(
        link: &'a mut dyn LinkAdapter,
        arp: &'a mut ArpCache,
        config: Ipv4Config,
        mac: MacAddress,
    ) -> Self {
        Self { link, arp, config, mac }
    }

    pub fn local_address(&self) -> Ipv4Address {
        self.config.address
    }

    pub fn resolve_or_request(&mut self, ip: Ipv4Address) -> Option<MacAddress> {
        arp::resolve_or_request(self.arp, self.link, self.mac, self.config.address, ip)
    }

    /// Build Ethernet + IPv4 around `payload` and transmit it to `dest`.
    pub fn send(&mut self, dest: Ipv4Address, protocol: u8, payload: &[u8]) -> Result<(), SendError> {
        if payload.len() > MAX_PAYLOAD {
            return Err(SendError::PayloadTooLarge(payload.len()));
        }

        let hop = self.config.next_hop(dest);
        if hop != dest {
            log::debug!("ipv4: {} is off-link, routing via {}", dest, hop);
        }
        let dst_mac = self.resolve_or_request(hop).ok_or(SendError::Unresolved(hop))?;

        let mut frame = [0u8; ethernet::HEADER_LEN + HEADER_LEN + MAX_PAYLOAD];
        let eth = EthernetHeader {
            dst: dst_mac,
            src: self.mac,
            ethertype: EtherType::Ipv4,
        };
        let ip = Ipv4Header::outbound(self.config.address, dest, protocol, payload.len());

        let mut len = eth.encode(&mut frame).map_err(|_| SendError::LinkRefused)?;
        len += ip.encode(&mut frame[len..]).map_err(|_| SendError::LinkRefused)?;
        frame[len..len + payload.len()].copy_from_slice(payload);
        len += payload.len();

        if self.link.transmit(&frame[..len]) {
            Ok(())
        } else {
            Err(SendError::LinkRefused)
        }
    }
}
