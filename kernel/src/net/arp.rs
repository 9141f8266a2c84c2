/// Address Resolution Protocol (RFC 826), Ethernet/IPv4 only.
///
/// The cache is a fixed 8-slot table with no expiry. Entries are created or
/// refreshed from the sender fields of every ARP message we see, request or
/// reply, whoever it was addressed to.
///
/// Replacement when an unseen IP arrives: first invalid slot, otherwise
/// slot 0 is overwritten unconditionally (not LRU).
use crate::drivers::LinkAdapter;

use super::addr::{Ipv4Address, MacAddress};
use super::ethernet::{self, EtherType, EthernetHeader};
use super::wire::{self, WireError};

/// ARP message size for Ethernet/IPv4.
pub const PACKET_LEN: usize = 28;

/// Number of cache slots.
pub const CACHE_SLOTS: usize = 8;

const HTYPE_ETHERNET: u16 = 1;
const PTYPE_IPV4: u16 = 0x0800;
const HLEN_ETHERNET: u8 = 6;
const PLEN_IPV4: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpOperation {
    Request,
    Reply,
    Other(u16),
}

impl From<u16> for ArpOperation {
    fn from(raw: u16) -> Self {
        match raw {
            1 => ArpOperation::Request,
            2 => ArpOperation::Reply,
            other => ArpOperation::Other(other),
        }
    }
}

impl From<ArpOperation> for u16 {
    fn from(op: ArpOperation) -> u16 {
        match op {
            ArpOperation::Request => 1,
            ArpOperation::Reply => 2,
            ArpOperation::Other(raw) => raw,
        }
    }
}

/// Decoded Ethernet/IPv4 ARP message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpPacket {
    pub operation: ArpOperation,
    pub sender_mac: MacAddress,
    pub sender_ip: Ipv4Address,
    pub target_mac: MacAddress,
    pub target_ip: Ipv4Address,
}

impl ArpPacket {
    /// Broadcast "who has `target_ip`" from the local pair.
    pub fn request(local_mac: MacAddress, local_ip: Ipv4Address, target_ip: Ipv4Address) -> Self {
        Self {
            operation: ArpOperation::Request,
            sender_mac: local_mac,
            sender_ip: local_ip,
            target_mac: MacAddress::ZERO,
            target_ip,
        }
    }

    /// "`local_ip` is at `local_mac`", addressed to the requester.
    pub fn reply(
        local_mac: MacAddress,
        local_ip: Ipv4Address,
        to_mac: MacAddress,
        to_ip: Ipv4Address,
    ) -> Self {
        Self {
            operation: ArpOperation::Reply,
            sender_mac: local_mac,
            sender_ip: local_ip,
            target_mac: to_mac,
            target_ip: to_ip,
        }
    }

    pub fn decode(buf: &[u8]) -> Result<Self, WireError> {
        wire::require(buf, PACKET_LEN)?;
        if wire::read_u16(buf, 0) != HTYPE_ETHERNET
            || wire::read_u16(buf, 2) != PTYPE_IPV4
            || buf[4] != HLEN_ETHERNET
            || buf[5] != PLEN_IPV4
        {
            return Err(WireError::Unsupported);
        }
        Ok(Self {
            operation: ArpOperation::from(wire::read_u16(buf, 6)),
            sender_mac: MacAddress::from_slice(&buf[8..14]),
            sender_ip: Ipv4Address::from_slice(&buf[14..18]),
            target_mac: MacAddress::from_slice(&buf[18..24]),
            target_ip: Ipv4Address::from_slice(&buf[24..28]),
        })
    }

    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, WireError> {
        wire::require(buf, PACKET_LEN)?;
        wire::write_u16(buf, 0, HTYPE_ETHERNET);
        wire::write_u16(buf, 2, PTYPE_IPV4);
        buf[4] = HLEN_ETHERNET;
        buf[5] = PLEN_IPV4;
        wire::write_u16(buf, 6, self.operation.into());
        buf[8..14].copy_from_slice(self.sender_mac.as_bytes());
        wire::write_u32(buf, 14, self.sender_ip.to_bits());
        buf[18..24].copy_from_slice(self.target_mac.as_bytes());
        wire::write_u32(buf, 24, self.target_ip.to_bits());
        Ok(PACKET_LEN)
    }
}

/// One cache slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpEntry {
    pub ip: Ipv4Address,
    pub mac: MacAddress,
    /// Clock reading (ms) when the entry was last learned.
    pub timestamp: u64,
    pub valid: bool,
}

impl ArpEntry {
    pub const fn empty() -> Self {
        Self {
            ip: Ipv4Address::UNSPECIFIED,
            mac: MacAddress::ZERO,
            timestamp: 0,
            valid: false,
        }
    }
}

/// Fixed-capacity IPv4 → MAC table. At most one valid entry per IP.
pub struct ArpCache {
    entries: [ArpEntry; CACHE_SLOTS],
}

impl ArpCache {
    pub const fn new() -> Self {
        Self {
            entries: [ArpEntry::empty(); CACHE_SLOTS],
        }
    }

    /// Insert or refresh `ip → mac`.
    ///
    /// Slot choice: the existing entry for `ip`, else the first invalid
    /// slot, else slot 0.
    pub fn learn(&mut self, ip: Ipv4Address, mac: MacAddress, now_ms: u64) {
        let slot = self
            .entries
            .iter()
            .position(|e| e.valid && e.ip == ip)
            .or_else(|| self.entries.iter().position(|e| !e.valid))
            .unwrap_or(0);

        self.entries[slot] = ArpEntry {
            ip,
            mac,
            timestamp: now_ms,
            valid: true,
        };
    }

    pub fn lookup(&self, ip: Ipv4Address) -> Option<MacAddress> {
        self.entries
            .iter()
            .find(|e| e.valid && e.ip == ip)
            .map(|e| e.mac)
    }

    /// Valid entries in slot order.
    pub fn entries(&self) -> impl Iterator<Item = &ArpEntry> {
        self.entries.iter().filter(|e| e.valid)
    }

    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.entries = [ArpEntry::empty(); CACHE_SLOTS];
    }
}

impl Default for ArpCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Frame `packet` in Ethernet and hand it to the link.
pub(crate) fn transmit(
    link: &mut dyn LinkAdapter,
    local_mac: MacAddress,
    dst_mac: MacAddress,
    packet: &ArpPacket,
) -> bool {
    let mut frame = [0u8; ethernet::HEADER_LEN + PACKET_LEN];
    let eth = EthernetHeader {
        dst: dst_mac,
        src: local_mac,
        ethertype: EtherType::Arp,
    };
    let sent = eth
        .encode(&mut frame)
        .and_then(|n| packet.encode(&mut frame[n..]))
        .map(|_| link.transmit(&frame))
        .unwrap_or(false);
    if !sent {
        log::debug!("arp: link refused {:?} for {}", packet.operation, packet.target_ip);
    }
    sent
}

/// Return the cached MAC for `target`, or broadcast a request for it and
/// return `None`. Nothing is queued; the caller drops its packet.
pub(crate) fn resolve_or_request(
    cache: &ArpCache,
    link: &mut dyn LinkAdapter,
    local_mac: MacAddress,
    local_ip: Ipv4Address,
    target: Ipv4Address,
) -> Option<MacAddress> {
    if let Some(mac) = cache.lookup(target) {
        return Some(mac);
    }
    log::debug!("arp: {} not cached, sending request", target);
    let request = ArpPacket::request(local_mac, local_ip, target);
    transmit(link, local_mac, MacAddress::BROADCAST, &request);
    None
}

/// Handle the payload of an inbound ARP frame: learn the sender, and answer
/// requests for our own address with a unicast reply.
pub(crate) fn on_packet(
    cache: &mut ArpCache,
    link: &mut dyn LinkAdapter,
    local_mac: MacAddress,
    local_ip: Ipv4Address,
    payload: &[u8],
    now_ms: u64,
) {
    let packet = match ArpPacket::decode(payload) {
        Ok(p) => p,
        Err(e) => {
            log::trace!("arp: dropped: {}", e);
            return;
        }
    };

    cache.learn(packet.sender_ip, packet.sender_mac, now_ms);
    log::debug!("arp: learned {} is at {}", packet.sender_ip, packet.sender_mac);

    if packet.operation == ArpOperation::Request
        && !local_ip.is_unspecified()
        && packet.target_ip == local_ip
    {
        let reply = ArpPacket::reply(local_mac, local_ip, packet.sender_mac, packet.sender_ip);
        transmit(link, local_mac, packet.sender_mac, &reply);
    }
}
