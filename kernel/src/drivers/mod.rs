/// Device seams consumed by the network core.
///
/// Only the link adapter contract and its RAM mock live here; a NIC driver
/// outside this crate implements `LinkAdapter`.
pub mod link;
pub mod mock;

pub use link::LinkAdapter;
pub use mock::CaptureNic;
