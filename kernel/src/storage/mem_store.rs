/// RAM-backed byte store for testing.
///
/// Holds a small table of path → contents. Used to exercise the HTTP
/// responder's 200/404 paths without a disk.
use alloc::string::String;
use alloc::vec::Vec;

use super::byte_store::ByteStore;

pub struct MemStore {
    files: Vec<(String, Vec<u8>)>,
    reads: u64,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            reads: 0,
        }
    }

    /// Create or replace the file at `path`.
    pub fn insert(&mut self, path: &str, contents: &[u8]) {
        match self.files.iter_mut().find(|(p, _)| p == path) {
            Some((_, data)) => *data = contents.to_vec(),
            None => self.files.push((String::from(path), contents.to_vec())),
        }
    }

    /// Remove the file at `path`. Returns true if it existed.
    pub fn remove(&mut self, path: &str) -> bool {
        let before = self.files.len();
        self.files.retain(|(p, _)| p != path);
        self.files.len() != before
    }

    /// How many times read() was called (for testing).
    pub fn read_count(&self) -> u64 {
        self.reads
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteStore for MemStore {
    fn read(&mut self, path: &str, buf: &mut [u8]) -> Option<usize> {
        self.reads += 1;
        let (_, data) = self.files.iter().find(|(p, _)| p == path)?;
        let len = data.len().min(buf.len());
        buf[..len].copy_from_slice(&data[..len]);
        Some(len)
    }
}
