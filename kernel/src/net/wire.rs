/// Big-endian field accessors and the shared decode error.
///
/// Every decoder checks the buffer length up front and then reads fields
/// through these helpers, so no decoder can index past the slice it was given.
use core::fmt;

/// Why a frame, packet or segment could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireError {
    /// Buffer shorter than the structure requires.
    Truncated { needed: usize, got: usize },
    /// IPv4 version nibble was not 4.
    BadVersion(u8),
    /// Header length field smaller than the minimum or past the buffer.
    BadHeaderLength(usize),
    /// A length field disagrees with the bytes actually present.
    BadLength(usize),
    /// ARP hardware/protocol combination other than Ethernet/IPv4.
    Unsupported,
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::Truncated { needed, got } => {
                write!(f, "truncated: need {} bytes, got {}", needed, got)
            }
            WireError::BadVersion(v) => write!(f, "bad IP version {}", v),
            WireError::BadHeaderLength(l) => write!(f, "bad header length {}", l),
            WireError::BadLength(l) => write!(f, "bad length field {}", l),
            WireError::Unsupported => write!(f, "unsupported hardware/protocol type"),
        }
    }
}

/// Fail with `Truncated` unless `buf` holds at least `needed` bytes.
#[inline]
pub fn require(buf: &[u8], needed: usize) -> Result<(), WireError> {
    if buf.len() < needed {
        Err(WireError::Truncated { needed, got: buf.len() })
    } else {
        Ok(())
    }
}

#[inline]
pub fn read_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([buf[at], buf[at + 1]])
}

#[inline]
pub fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

#[inline]
pub fn write_u16(buf: &mut [u8], at: usize, value: u16) {
    buf[at..at + 2].copy_from_slice(&value.to_be_bytes());
}

#[inline]
pub fn write_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_be_bytes());
}
