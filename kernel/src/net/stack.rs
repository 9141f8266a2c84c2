/// The network stack context.
///
/// One `NetStack` owns every piece of mutable protocol state (interface
/// configuration, ARP cache, the TCP-Mini connection) together with the
/// three collaborators it talks to: the link adapter, the byte store that
/// supplies HTTP bodies, and a clock.
///
/// All processing is synchronous and runs inside `on_frame`; nothing blocks
/// except `ping`, which busy-waits on the clock. Callers that share a stack
/// between contexts wrap the whole thing in one `spin::Mutex`.
use core::fmt;

use crate::drivers::LinkAdapter;
use crate::storage::ByteStore;
use crate::time::Clock;

use super::addr::{parse_dotted_quad, Ipv4Address, MacAddress};
use super::arp::{self, ArpCache};
use super::ethernet::{self, EtherType, EthernetHeader};
use super::http::HttpResponder;
use super::icmp;
use super::ipv4::{Egress, Ipv4Config, Ipv4Header, SendError, PROTO_ICMP, PROTO_TCP};
use super::tcp::{TcpHeader, TcpMini, TcpState, TcpStatus};

/// Identifier carried by every ping request.
pub const PING_IDENT: u16 = 0x4242;

/// Used when `ping` is given a zero timeout.
pub const DEFAULT_PING_TIMEOUT_MS: u32 = 1000;

/// Echo data carried by ping requests.
const PING_PATTERN: [u8; 8] = [0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    BadAddress,
    BadMask,
    BadGateway,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::BadAddress => write!(f, "bad address"),
            ConfigError::BadMask => write!(f, "bad mask"),
            ConfigError::BadGateway => write!(f, "bad gateway"),
        }
    }
}

/// Outcome of `ping`. Replies are not matched to requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingSummary {
    /// Echo requests attempted.
    pub requested: u32,
    /// Echo requests that reached the link (next hop was resolved).
    pub transmitted: u32,
}

pub struct NetStack<L, S, C> {
    link: L,
    store: S,
    clock: C,
    mac: MacAddress,
    config: Ipv4Config,
    arp: ArpCache,
    tcp: TcpMini,
}

impl<L: LinkAdapter, S: ByteStore, C: Clock> NetStack<L, S, C> {
    /// Build an unconfigured stack. The MAC address is read from the link
    /// once, here. TCP-Mini starts CLOSED.
    pub fn new(link: L, store: S, clock: C) -> Self {
        let mac = MacAddress::new(link.local_mac());
        log::info!("net: interface up, mac {}", mac);
        Self {
            link,
            store,
            clock,
            mac,
            config: Ipv4Config::default(),
            arp: ArpCache::new(),
            tcp: TcpMini::new(),
        }
    }

    pub fn mac(&self) -> MacAddress {
        self.mac
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // ---- Configuration ----

    /// Set address, mask and gateway (unspecified = unset). Takes effect on
    /// the next send or receive.
    pub fn configure(&mut self, address: Ipv4Address, netmask: Ipv4Address, gateway: Ipv4Address) {
        self.config = Ipv4Config::new(address, netmask, gateway);
        log::info!("net: {}", self.config);
    }

    /// Configure from dotted-quad text. An absent or empty gateway clears it.
    /// Nothing changes unless all given values parse.
    pub fn configure_from_strings(
        &mut self,
        address: &str,
        netmask: &str,
        gateway: Option<&str>,
    ) -> Result<(), ConfigError> {
        let address = parse_dotted_quad(address).ok_or(ConfigError::BadAddress)?;
        let netmask = parse_dotted_quad(netmask).ok_or(ConfigError::BadMask)?;
        let gateway = match gateway {
            Some(gw) if !gw.is_empty() => parse_dotted_quad(gw).ok_or(ConfigError::BadGateway)?,
            _ => Ipv4Address::UNSPECIFIED,
        };
        self.configure(address, netmask, gateway);
        Ok(())
    }

    pub fn config(&self) -> Ipv4Config {
        self.config
    }

    // ---- Address resolution ----

    pub fn arp_cache(&self) -> &ArpCache {
        &self.arp
    }

    pub fn lookup(&self, ip: Ipv4Address) -> Option<MacAddress> {
        self.arp.lookup(ip)
    }

    /// Forget every learned address.
    pub fn flush_arp(&mut self) {
        self.arp.clear();
        log::info!("arp: cache flushed");
    }

    /// Cached MAC for `ip`, or `None` after broadcasting a request for it.
    pub fn resolve_or_request(&mut self, ip: Ipv4Address) -> Option<MacAddress> {
        arp::resolve_or_request(&self.arp, &mut self.link, self.mac, self.config.address, ip)
    }

    // ---- Transmit ----

    /// Send `payload` to `dest` as an IPv4 datagram. On an ARP miss the
    /// datagram is dropped and `SendError::Unresolved` returned; the ARP
    /// request has already gone out.
    pub fn send(&mut self, dest: Ipv4Address, protocol: u8, payload: &[u8]) -> Result<(), SendError> {
        Egress::new(&mut self.link, &mut self.arp, self.config, self.mac).send(dest, protocol, payload)
    }

    // ---- Receive ----

    /// Receive callback: process one Ethernet frame (without FCS).
    /// Malformed or foreign frames are dropped silently.
    pub fn on_frame(&mut self, frame: &[u8]) {
        let (eth, payload) = match EthernetHeader::decode(frame) {
            Ok(v) => v,
            Err(e) => {
                log::trace!("net: dropped frame: {}", e);
                return;
            }
        };

        match eth.ethertype {
            EtherType::Arp => {
                let now = self.clock.now_ms();
                arp::on_packet(&mut self.arp, &mut self.link, self.mac, self.config.address, payload, now);
            }
            EtherType::Ipv4 => self.on_ipv4(payload),
            EtherType::Other(ty) => log::trace!("net: ignoring ethertype {:#06x}", ty),
        }
    }

    fn on_ipv4(&mut self, packet: &[u8]) {
        let (ip, payload) = match Ipv4Header::decode(packet) {
            Ok(v) => v,
            Err(e) => {
                log::trace!("ipv4: dropped: {}", e);
                return;
            }
        };
        if !self.config.accepts(ip.dst) {
            log::trace!("ipv4: {} -> {} is not for us", ip.src, ip.dst);
            return;
        }

        let mut egress = Egress::new(&mut self.link, &mut self.arp, self.config, self.mac);
        match ip.protocol {
            PROTO_ICMP => icmp::on_message(&mut egress, ip.src, payload),
            PROTO_TCP => {
                if self.tcp.state() == TcpState::Closed {
                    return;
                }
                match TcpHeader::decode(payload) {
                    Ok((tcp, data)) => {
                        self.tcp.on_segment(ip.src, &tcp, data, &mut self.store, &mut egress)
                    }
                    Err(e) => log::trace!("tcp: dropped from {}: {}", ip.src, e),
                }
            }
            other => log::trace!("ipv4: ignoring protocol {} from {}", other, ip.src),
        }
    }

    /// Drain every frame the link has pending through `on_frame`.
    /// Returns the number of frames processed.
    pub fn poll(&mut self) -> usize {
        let mut buf = [0u8; ethernet::MAX_FRAME_LEN];
        let mut processed = 0;
        while let Some(len) = self.link.receive(&mut buf) {
            self.on_frame(&buf[..len]);
            processed += 1;
        }
        processed
    }

    // ---- TCP-Mini / HTTP ----

    pub fn listen(&mut self, port: u16) {
        self.tcp.listen(port);
    }

    pub fn stop_listening(&mut self) {
        self.tcp.stop();
    }

    pub fn tcp_state(&self) -> TcpState {
        self.tcp.state()
    }

    pub fn tcp_status(&self) -> TcpStatus {
        self.tcp.status()
    }

    pub fn tcp(&self) -> &TcpMini {
        &self.tcp
    }

    pub fn http(&self) -> &HttpResponder {
        self.tcp.http()
    }

    /// Replace the inline body text (the source is left as is).
    pub fn set_inline_body(&mut self, body: &str) {
        self.tcp.http_mut().set_inline_body(body);
    }

    pub fn use_inline_body(&mut self) {
        self.tcp.http_mut().use_inline();
    }

    /// Serve the stored file at `path`.
    pub fn set_body_path(&mut self, path: &str) {
        self.tcp.http_mut().set_path(path);
    }

    // ---- Ping ----

    /// Send `count` echo requests to `dst` (0 means 1), waiting out
    /// `timeout_ms` (0 means 1000) after each one while polling the link.
    /// Replies are processed but not matched to requests.
    pub fn ping(&mut self, dst: Ipv4Address, count: u32, timeout_ms: u32) -> PingSummary {
        let count = count.max(1);
        let timeout_ms = if timeout_ms == 0 { DEFAULT_PING_TIMEOUT_MS } else { timeout_ms };
        let mut summary = PingSummary { requested: 0, transmitted: 0 };

        for seq in 0..count {
            let mut msg = [0u8; icmp::HEADER_LEN + PING_PATTERN.len()];
            summary.requested += 1;
            let sent = match icmp::build_echo_request(PING_IDENT, seq as u16, &PING_PATTERN, &mut msg) {
                Ok(len) => self.send(dst, PROTO_ICMP, &msg[..len]),
                Err(_) => Err(SendError::PayloadTooLarge(msg.len())),
            };
            match sent {
                Ok(()) => summary.transmitted += 1,
                Err(e) => log::debug!("ping: seq {} to {} not sent: {}", seq, dst, e),
            }

            let start = self.clock.now_ms();
            while self.clock.now_ms().saturating_sub(start) < timeout_ms as u64 {
                self.poll();
                core::hint::spin_loop();
            }
        }
        summary
    }
}
