/// Ethernet II framing: dst MAC(6), src MAC(6), EtherType(2). No FCS, no VLAN tags.
use super::addr::MacAddress;
use super::wire::{self, WireError};

pub const HEADER_LEN: usize = 14;

/// Largest frame the stack builds or accepts (header + 1500-byte MTU).
pub const MAX_FRAME_LEN: usize = HEADER_LEN + 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherType {
    Ipv4,
    Arp,
    Other(u16),
}

impl From<u16> for EtherType {
    fn from(raw: u16) -> Self {
        match raw {
            0x0800 => EtherType::Ipv4,
            0x0806 => EtherType::Arp,
            other => EtherType::Other(other),
        }
    }
}

impl From<EtherType> for u16 {
    fn from(ty: EtherType) -> u16 {
        match ty {
            EtherType::Ipv4 => 0x0800,
            EtherType::Arp => 0x0806,
            EtherType::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetHeader {
    pub dst: MacAddress,
    pub src: MacAddress,
    pub ethertype: EtherType,
}

impl EthernetHeader {
    /// Split a frame into its header and payload.
    pub fn decode(frame: &[u8]) -> Result<(Self, &[u8]), WireError> {
        wire::require(frame, HEADER_LEN)?;
        let header = Self {
            dst: MacAddress::from_slice(&frame[0..6]),
            src: MacAddress::from_slice(&frame[6..12]),
            ethertype: EtherType::from(wire::read_u16(frame, 12)),
        };
        Ok((header, &frame[HEADER_LEN..]))
    }

    /// Write the header into the first 14 bytes of `buf`.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, WireError> {
        wire::require(buf, HEADER_LEN)?;
        buf[0..6].copy_from_slice(self.dst.as_bytes());
        buf[6..12].copy_from_slice(self.src.as_bytes());
        wire::write_u16(buf, 12, self.ethertype.into());
        Ok(HEADER_LEN)
    }
}
