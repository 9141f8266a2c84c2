/// RAM-backed link adapter for testing.
///
/// Records every transmitted frame and replays frames queued with
/// `push_inbound` through `receive`, so the whole stack can be driven
/// without hardware.
use alloc::collections::VecDeque;
use alloc::vec::Vec;

use super::link::LinkAdapter;

pub struct CaptureNic {
    mac: [u8; 6],
    link_up: bool,
    sent: Vec<Vec<u8>>,
    inbound: VecDeque<Vec<u8>>,
}

impl CaptureNic {
    pub fn new(mac: [u8; 6]) -> Self {
        Self {
            mac,
            link_up: true,
            sent: Vec::new(),
            inbound: VecDeque::new(),
        }
    }

    /// Frames transmitted so far, oldest first.
    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    /// Drain and return the transmitted frames.
    pub fn take_sent(&mut self) -> Vec<Vec<u8>> {
        core::mem::take(&mut self.sent)
    }

    /// Queue a frame to be returned by the next `receive`.
    pub fn push_inbound(&mut self, frame: &[u8]) {
        self.inbound.push_back(frame.to_vec());
    }

    pub fn pending_inbound(&self) -> usize {
        self.inbound.len()
    }

    /// While the link is down, `transmit` refuses every frame.
    pub fn set_link_up(&mut self, up: bool) {
        self.link_up = up;
    }
}

impl LinkAdapter for CaptureNic {
    fn transmit(&mut self, frame: &[u8]) -> bool {
        if !self.link_up {
            return false;
        }
        self.sent.push(frame.to_vec());
        true
    }

    fn local_mac(&self) -> [u8; 6] {
        self.mac
    }

    fn receive(&mut self, buf: &mut [u8]) -> Option<usize> {
        let frame = self.inbound.pop_front()?;
        let len = frame.len().min(buf.len());
        buf[..len].copy_from_slice(&frame[..len]);
        Some(len)
    }
}
