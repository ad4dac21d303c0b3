//! Key-value store contract.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Durable mapping from string key to JSON value.
///
/// Every operation is independent: there is no multi-key transaction.
/// `compare_and_swap` is still a single-key write and is the only
/// conditional primitive a backend has to offer.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Read a key. `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Upsert a key.
    async fn put(&self, key: &str, value: Value) -> Result<()>;

    /// Remove a key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Write `new` only if the current value equals `expected`
    /// (`None` = key must be absent). Returns whether the write happened.
    async fn compare_and_swap(&self, key: &str, expected: Option<&Value>, new: Value)
    -> Result<bool>;
}
