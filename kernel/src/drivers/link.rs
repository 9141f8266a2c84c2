/// The seam between the NIC driver and the protocol core.
///
/// A platform NIC driver implements this to carry whole Ethernet frames
/// without FCS. The RAM-backed `CaptureNic` implements it for host tests.
pub trait LinkAdapter {
    /// Hand a complete Ethernet frame (no FCS) to the device.
    /// Returns false if the device refused it (queue full, link down).
    fn transmit(&mut self, frame: &[u8]) -> bool;

    /// Hardware address of this interface. Read once when the stack is built.
    fn local_mac(&self) -> [u8; 6];

    /// Copy the next pending inbound frame into `buf`, returning its length.
    /// Frames longer than `buf` are truncated.
    fn receive(&mut self, buf: &mut [u8]) -> Option<usize>;
}
