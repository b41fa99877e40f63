mod file_kv;
mod memory_kv;

pub use file_kv::FileKeyValueStore;
pub use memory_kv::InMemoryKeyValueStore;
