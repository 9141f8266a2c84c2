/// Network protocol core: Ethernet, ARP, IPv4, ICMP echo and a
/// single-connection TCP responder that serves one HTTP/1.0 page.
///
/// Architecture:
///   LinkAdapter (raw Ethernet frames, NIC driver)
///       ↓ ↑
///   NetStack::on_frame: dispatch on EtherType
///       ↓ ARP              ↓ IPv4
///   arp (cache,         ipv4 (validate, route by protocol)
///        resolver)          ↓ ICMP        ↓ TCP
///       ↑                 icmp (echo)   tcp (TCP-Mini) → http → ByteStore
///       └──── next-hop MAC ← ipv4::Egress ← icmp / tcp
pub mod addr;
pub mod arp;
pub mod checksum;
pub mod ethernet;
pub mod http;
pub mod icmp;
pub mod ipv4;
pub mod stack;
pub mod tcp;
pub mod wire;

pub use addr::{parse_dotted_quad, Ipv4Address, MacAddress};
pub use ipv4::{Ipv4Config, SendError};
pub use stack::{ConfigError, NetStack, PingSummary};
pub use tcp::{TcpState, TcpStatus};

// A full response segment is exactly one maximum-size Ethernet frame.
static_assertions::const_assert_eq!(
    ethernet::HEADER_LEN + ipv4::HEADER_LEN + tcp::HEADER_LEN + http::SEGMENT_CAPACITY,
    ethernet::MAX_FRAME_LEN
);
static_assertions::const_assert!(tcp::HEADER_LEN + http::SEGMENT_CAPACITY <= ipv4::MAX_PAYLOAD);
