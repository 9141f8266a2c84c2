/// Link and network addresses.
///
/// `Ipv4Address` is a plain 32-bit value: routing compares it numerically
/// (`addr & mask`), and the dotted-quad form only exists for parsing shell
/// input and for display.
use core::fmt;
use core::str::FromStr;

/// 6-byte Ethernet hardware address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    pub const BROADCAST: MacAddress = MacAddress([0xFF; 6]);
    pub const ZERO: MacAddress = MacAddress([0; 6]);

    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Read a MAC address from the first 6 bytes of `buf`.
    /// Caller guarantees the length.
    pub(crate) fn from_slice(buf: &[u8]) -> Self {
        let mut mac = [0u8; 6];
        mac.copy_from_slice(&buf[..6]);
        Self(mac)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            m[0], m[1], m[2], m[3], m[4], m[5])
    }
}

impl fmt::Debug for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddress({})", self)
    }
}

/// IPv4 address held as a host-order `u32` (`10.0.0.1` is `0x0A00_0001`).
/// The all-zero value means "not configured".
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ipv4Address(u32);

impl Ipv4Address {
    pub const UNSPECIFIED: Ipv4Address = Ipv4Address(0);

    pub const fn new(a: u8, b: u8, c: u8, d: u8) -> Self {
        Self(u32::from_be_bytes([a, b, c, d]))
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn to_bits(self) -> u32 {
        self.0
    }

    pub const fn octets(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    pub const fn is_unspecified(self) -> bool {
        self.0 == 0
    }

    /// Read an address from the first 4 bytes of `buf` (network order).
    /// Caller guarantees the length.
    pub(crate) fn from_slice(buf: &[u8]) -> Self {
        Self(u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]))
    }
}

impl fmt::Display for Ipv4Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.octets();
        write!(f, "{}.{}.{}.{}", a, b, c, d)
    }
}

impl fmt::Debug for Ipv4Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ipv4Address({})", self)
    }
}

/// Dotted-quad text did not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddrParseError;

impl fmt::Display for AddrParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid dotted-quad IPv4 address")
    }
}

impl FromStr for Ipv4Address {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_dotted_quad(s).ok_or(AddrParseError)
    }
}

/// Parse `a.b.c.d`: exactly four non-empty groups of ASCII digits, each
/// 0..=255, nothing before, after or between them but single dots.
pub fn parse_dotted_quad(text: &str) -> Option<Ipv4Address> {
    let mut octets = [0u8; 4];
    let mut groups = text.split('.');

    for octet in octets.iter_mut() {
        *octet = parse_octet(groups.next()?)?;
    }
    if groups.next().is_some() {
        return None;
    }

    Some(Ipv4Address::new(octets[0], octets[1], octets[2], octets[3]))
}

fn parse_octet(group: &str) -> Option<u8> {
    if group.is_empty() {
        return None;
    }
    let mut value: u32 = 0;
    for b in group.bytes() {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value * 10 + (b - b'0') as u32;
        if value > 255 {
            return None;
        }
    }
    Some(value as u8)
}
