pub mod byte_store;
pub mod mem_store;

pub use byte_store::ByteStore;
pub use mem_store::MemStore;
