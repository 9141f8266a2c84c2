#![no_std]

//! Mezereon kernel network stack.
//!
//! Ethernet, ARP, IPv4, ICMP echo and a one-connection TCP responder that
//! serves a single HTTP page. Hardware sits behind three seams
//! (`LinkAdapter`, `ByteStore`, `Clock`) so the whole stack also runs on the
//! host under `cargo test` against the RAM mocks in `drivers::mock`,
//! `storage::mem_store` and `time`.

extern crate alloc;

pub mod drivers;
pub mod logging;
pub mod net;
pub mod shell;
pub mod storage;
pub mod time;
