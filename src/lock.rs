/// Distributed lock on the writable replica
///
/// Ownership is "the value at the lock key equals the caller's token".
/// Acquire is a single `SET NX PX`; release is a single server-side script
/// that deletes the key only when it still holds the caller's token.
use std::time::Duration;

use crate::core::Intent;
use crate::error::CentinelaResult;
use crate::protocol::{reply, Command, RespValue};
use crate::sentinel::Topology;
use crate::store::{ensure, ensure_key, Store};

/// Compare-and-delete executed atomically by the store
pub const UNLOCK_SCRIPT: &str =
    "if redis.call(\"get\",KEYS[1]) == ARGV[1] then return redis.call(\"del\",KEYS[1]) else return 0 end";

impl<T: Topology> Store<T> {
    /// Acquire `key` for `token` for `expire`.
    ///
    /// `Ok(false)` means another token holds the lock; errors mean the store
    /// could not be asked.
    pub async fn try_lock(&self, key: &str, token: &str, expire: Duration) -> CentinelaResult<bool> {
        ensure_key("SET", key)?;
        ensure("SET", key, !token.is_empty(), "lock token must not be empty")?;
        ensure(
            "SET",
            key,
            expire.as_millis() > 0,
            "lock expiry must be at least one millisecond",
        )?;

        let cmd = Command::new("SET")
            .arg(key)
            .arg(token)
            .arg("NX")
            .arg("PX")
            .arg_int(expire.as_millis());
        self.run(Intent::Write, cmd, key, |cmd, value| match value {
            RespValue::BulkString(None) => Ok(false),
            RespValue::SimpleString(status) => Ok(status == "OK"),
            other => reply::into_ok(cmd, other).map(|_| false),
        })
        .await
    }

    /// Release `key` if it is still held by `token`; true when deleted
    pub async fn unlock(&self, key: &str, token: &str) -> CentinelaResult<bool> {
        ensure_key("EVAL", key)?;
        ensure("EVAL", key, !token.is_empty(), "lock token must not be empty")?;

        let cmd = Command::new("EVAL")
            .arg(UNLOCK_SCRIPT)
            .arg("1")
            .arg(key)
            .arg(token);
        self.run(Intent::Write, cmd, key, |cmd, value| {
            reply::into_integer(cmd, value).map(|n| n == 1)
        })
        .await
    }
}
