//! List operations
//!
//! Indices follow the store's own convention: zero-based from the head,
//! negative from the tail (-1 is the last element).

use super::{ensure, ensure_key, Store};
use crate::core::Intent;
use crate::error::CentinelaResult;
use crate::protocol::{reply, Command};
use crate::sentinel::Topology;

impl<T: Topology> Store<T> {
    /// Push to the head; returns the list length afterwards
    pub async fn lpush<V: AsRef<str>>(&self, key: &str, values: &[V]) -> CentinelaResult<i64> {
        self.push("LPUSH", key, values).await
    }

    /// Push to the tail; returns the list length afterwards
    pub async fn rpush<V: AsRef<str>>(&self, key: &str, values: &[V]) -> CentinelaResult<i64> {
        self.push("RPUSH", key, values).await
    }

    async fn push<V: AsRef<str>>(
        &self,
        command: &'static str,
        key: &str,
        values: &[V],
    ) -> CentinelaResult<i64> {
        ensure_key(command, key)?;
        ensure(command, key, !values.is_empty(), "at least one value is required")?;
        let cmd = Command::new(command)
            .arg(key)
            .args(values.iter().map(|v| v.as_ref()));
        self.run(Intent::Write, cmd, key, reply::into_integer).await
    }

    pub async fn llen(&self, key: &str) -> CentinelaResult<i64> {
        ensure_key("LLEN", key)?;
        self.run(Intent::Read, Command::new("LLEN").arg(key), key, reply::into_integer)
            .await
    }

    /// Element at `index`; 0 is the head, -1 the tail
    pub async fn lindex(&self, key: &str, index: i64) -> CentinelaResult<Option<String>> {
        ensure_key("LINDEX", key)?;
        let cmd = Command::new("LINDEX").arg(key).arg_int(index);
        self.run(Intent::Read, cmd, key, reply::into_string).await
    }

    /// Elements from `start` to `end`, both inclusive
    pub async fn lrange(&self, key: &str, start: i64, end: i64) -> CentinelaResult<Vec<String>> {
        ensure_key("LRANGE", key)?;
        let cmd = Command::new("LRANGE")
            .arg(key)
            .arg_int(start)
            .arg_int(end);
        self.run(Intent::Read, cmd, key, reply::into_strings).await
    }

    /// The whole list
    pub async fn lrange_all(&self, key: &str) -> CentinelaResult<Vec<String>> {
        self.lrange(key, 0, -1).await
    }

    pub async fn lpop(&self, key: &str) -> CentinelaResult<Option<String>> {
        ensure_key("LPOP", key)?;
        self.run(Intent::Write, Command::new("LPOP").arg(key), key, reply::into_string)
            .await
    }

    pub async fn rpop(&self, key: &str) -> CentinelaResult<Option<String>> {
        ensure_key("RPOP", key)?;
        self.run(Intent::Write, Command::new("RPOP").arg(key), key, reply::into_string)
            .await
    }
}
