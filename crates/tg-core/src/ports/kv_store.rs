use thiserror::Error;

#[derive(Debug, Error)]
pub enum KvStoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage quota exceeded")]
    QuotaExceeded,

    #[error("storage io failed: {0}")]
    Io(String),
}

/// Minimal key-value persistence.
///
/// 最小化的键值持久化端口。
///
/// Values are UTF-8 JSON documents. Implementations may be a file, an
/// embedded database or a remote store; the engine treats every failure as
/// non-fatal.
pub trait KeyValueStorePort: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, KvStoreError>;

    /// Store `value` under `key`. Must overwrite an existing value.
    fn set(&self, key: &str, value: &str) -> Result<(), KvStoreError>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), KvStoreError>;
}
