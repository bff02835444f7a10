//! Hash operations

use std::collections::HashMap;

use super::{ensure, ensure_key, Store};
use crate::core::Intent;
use crate::error::CentinelaResult;
use crate::protocol::{reply, Command};
use crate::sentinel::Topology;

impl<T: Topology> Store<T> {
    /// HSET of one field; true when the field was newly created
    pub async fn hset(&self, key: &str, field: &str, value: &str) -> CentinelaResult<bool> {
        ensure_key("HSET", key)?;
        ensure("HSET", key, !field.is_empty(), "field must not be empty")?;
        let cmd = Command::new("HSET").arg(key).arg(field).arg(value);
        self.run(Intent::Write, cmd, key, reply::into_bool).await
    }

    pub async fn hget(&self, key: &str, field: &str) -> CentinelaResult<Option<String>> {
        ensure_key("HGET", key)?;
        ensure("HGET", key, !field.is_empty(), "field must not be empty")?;
        let cmd = Command::new("HGET").arg(key).arg(field);
        self.run(Intent::Read, cmd, key, reply::into_string).await
    }

    /// Number of fields removed
    pub async fn hdel(&self, key: &str, field: &str) -> CentinelaResult<i64> {
        ensure_key("HDEL", key)?;
        ensure("HDEL", key, !field.is_empty(), "field must not be empty")?;
        let cmd = Command::new("HDEL").arg(key).arg(field);
        self.run(Intent::Write, cmd, key, reply::into_integer).await
    }

    /// Set several fields in one command
    pub async fn hmset(&self, key: &str, fields: &HashMap<String, String>) -> CentinelaResult<()> {
        ensure_key("HMSET", key)?;
        ensure("HMSET", key, !fields.is_empty(), "at least one field is required")?;
        ensure(
            "HMSET",
            key,
            fields.keys().all(|f| !f.is_empty()),
            "fields must not be empty",
        )?;

        let cmd = fields
            .iter()
            .fold(Command::new("HMSET").arg(key), |cmd, (field, value)| {
                cmd.arg(field).arg(value)
            });
        self.run(Intent::Write, cmd, key, reply::into_ok).await
    }

    /// One entry per requested field, `None` where the field is missing
    pub async fn hmget<F: AsRef<str>>(&self, key: &str, fields: &[F]) -> CentinelaResult<Vec<Option<String>>> {
        ensure_key("HMGET", key)?;
        ensure("HMGET", key, !fields.is_empty(), "at least one field is required")?;
        let cmd = Command::new("HMGET")
            .arg(key)
            .args(fields.iter().map(|f| f.as_ref()));
        self.run(Intent::Read, cmd, key, reply::into_optional_strings)
            .await
    }

    pub async fn hlen(&self, key: &str) -> CentinelaResult<i64> {
        ensure_key("HLEN", key)?;
        self.run(Intent::Read, Command::new("HLEN").arg(key), key, reply::into_integer)
            .await
    }

    /// Every field and value; empty when the key is missing
    pub async fn hgetall(&self, key: &str) -> CentinelaResult<HashMap<String, String>> {
        ensure_key("HGETALL", key)?;
        self.run(Intent::Read, Command::new("HGETALL").arg(key), key, reply::into_string_map)
            .await
    }
}
