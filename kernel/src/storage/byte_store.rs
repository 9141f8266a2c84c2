/// Read-only access to stored files by path.
///
/// The HTTP responder pulls response bodies through this. Any filesystem
/// that can copy a file's leading bytes into a buffer can back it; tests
/// use `MemStore`.
pub trait ByteStore {
    /// Copy the contents of `path` into `buf`, truncating to `buf.len()`.
    /// Returns the number of bytes copied, or `None` if the path does not
    /// exist or cannot be read.
    fn read(&mut self, path: &str, buf: &mut [u8]) -> Option<usize>;
}
