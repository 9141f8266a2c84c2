/// Internet checksum (RFC 1071): one's complement of the one's complement
/// sum of 16-bit big-endian words. An odd trailing byte is padded with zero.
use super::addr::Ipv4Address;

/// Accumulate `data` into a running, unfolded sum.
fn accumulate(mut sum: u64, data: &[u8]) -> u64 {
    let mut words = data.chunks_exact(2);
    for w in &mut words {
        sum += u16::from_be_bytes([w[0], w[1]]) as u64;
    }
    if let Some(&last) = words.remainder().first() {
        sum += (last as u64) << 8;
    }
    sum
}

/// Fold carries back into the low 16 bits until none remain.
fn fold(mut sum: u64) -> u16 {
    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    sum as u16
}

/// Checksum of `data`. The caller zeroes the checksum field first.
pub fn internet_checksum(data: &[u8]) -> u16 {
    !fold(accumulate(0, data))
}

/// TCP/UDP checksum: pseudo-header (source, destination, zero + protocol,
/// segment length) followed by the segment itself.
pub fn pseudo_header_checksum(
    src: Ipv4Address,
    dst: Ipv4Address,
    protocol: u8,
    segment: &[u8],
) -> u16 {
    let src = src.to_bits() as u64;
    let dst = dst.to_bits() as u64;
    let mut sum = (src >> 16) + (src & 0xFFFF) + (dst >> 16) + (dst & 0xFFFF);
    sum += protocol as u64;
    sum += segment.len() as u64;
    !fold(accumulate(sum, segment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc1071_example() {
        // Worked example from RFC 1071 section 3.
        let data = [0x00, 0x01, 0xf2, 0x03, 0xf4, 0xf5, 0xf6, 0xf7];
        assert_eq!(internet_checksum(&data), !0xddf2);
    }

    #[test]
    fn known_ipv4_header() {
        let mut hdr = [
            0x45, 0x00, 0x00, 0x73, 0x00, 0x00, 0x40, 0x00, 0x40, 0x11,
            0x00, 0x00, 0xc0, 0xa8, 0x00, 0x01, 0xc0, 0xa8, 0x00, 0xc7,
        ];
        let c = internet_checksum(&hdr);
        assert_eq!(c, 0xb861);
        hdr[10..12].copy_from_slice(&c.to_be_bytes());
        assert_eq!(internet_checksum(&hdr), 0);
    }

    #[test]
    fn stored_checksum_sums_to_zero() {
        // Odd and even lengths, including an all-zero buffer.
        let buffers: [&[u8]; 4] = [
            &[0u8; 12],
            &[0xde, 0xad, 0x00, 0x00, 0xbe, 0xef, 0x12],
            &[0xff; 20],
            b"\x08\x00\x00\x00\x12\x34\x00\x07hello, world",
        ];
        for b in buffers {
            let mut buf = [0u8; 32];
            let buf = &mut buf[..b.len()];
            buf.copy_from_slice(b);
            buf[2] = 0;
            buf[3] = 0;
            let c = internet_checksum(buf);
            buf[2..4].copy_from_slice(&c.to_be_bytes());
            assert_eq!(internet_checksum(buf), 0, "buffer {:02x?}", b);
        }
    }

    #[test]
    fn pseudo_header_verifies() {
        let src = Ipv4Address::new(10, 0, 0, 5);
        let dst = Ipv4Address::new(10, 0, 0, 9);
        let mut seg = [0u8; 25];
        seg[0..2].copy_from_slice(&80u16.to_be_bytes());
        seg[2..4].copy_from_slice(&4321u16.to_be_bytes());
        seg[12] = 0x50;
        seg[13] = 0x18;
        seg[20..25].copy_from_slice(b"hello");
        let c = pseudo_header_checksum(src, dst, 6, &seg);
        seg[16..18].copy_from_slice(&c.to_be_bytes());
        assert_eq!(pseudo_header_checksum(src, dst, 6, &seg), 0);
    }
}
