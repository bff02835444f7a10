/// Conversions from raw RESP replies to the Rust types operations return.
///
/// An `-ERR` reply always becomes `CentinelaError::StoreCommand`; any other
/// shape the command cannot produce is a protocol error.

use bytes::Bytes;
use std::collections::HashMap;

use super::RespValue;
use crate::error::{CentinelaError, CentinelaResult};

fn unexpected(command: &str, value: &RespValue) -> CentinelaError {
    CentinelaError::protocol(format!("unexpected reply to {}: {:?}", command, value))
}

fn rejected(command: &str, value: RespValue) -> CentinelaResult<RespValue> {
    match value {
        RespValue::Error(message) => Err(CentinelaError::store_command(command, message)),
        other => Ok(other),
    }
}

fn utf8(command: &str, data: Bytes) -> CentinelaResult<String> {
    String::from_utf8(data.to_vec())
        .map_err(|_| CentinelaError::protocol(format!("{} returned non UTF-8 data", command)))
}

/// `+OK` style status replies
pub fn into_ok(command: &str, value: RespValue) -> CentinelaResult<()> {
    match rejected(command, value)? {
        RespValue::SimpleString(_) => Ok(()),
        other => Err(unexpected(command, &other)),
    }
}

pub fn into_integer(command: &str, value: RespValue) -> CentinelaResult<i64> {
    match rejected(command, value)? {
        RespValue::Integer(n) => Ok(n),
        other => Err(unexpected(command, &other)),
    }
}

/// Integer replies used as flags (`EXISTS`, `PERSIST`, `EXPIRE`)
pub fn into_bool(command: &str, value: RespValue) -> CentinelaResult<bool> {
    into_integer(command, value).map(|n| n > 0)
}

pub fn into_bytes(command: &str, value: RespValue) -> CentinelaResult<Option<Bytes>> {
    match rejected(command, value)? {
        RespValue::BulkString(data) => Ok(data),
        other => Err(unexpected(command, &other)),
    }
}

pub fn into_string(command: &str, value: RespValue) -> CentinelaResult<Option<String>> {
    match rejected(command, value)? {
        RespValue::BulkString(Some(data)) => utf8(command, data).map(Some),
        RespValue::BulkString(None) => Ok(None),
        RespValue::SimpleString(text) => Ok(Some(text)),
        other => Err(unexpected(command, &other)),
    }
}

fn into_array(command: &str, value: RespValue) -> CentinelaResult<Vec<RespValue>> {
    match rejected(command, value)? {
        RespValue::Array(Some(items)) => Ok(items),
        RespValue::Array(None) => Ok(Vec::new()),
        other => Err(unexpected(command, &other)),
    }
}

/// Arrays whose elements may be null (`MGET`, `HMGET`)
pub fn into_optional_strings(command: &str, value: RespValue) -> CentinelaResult<Vec<Option<String>>> {
    into_array(command, value)?
        .into_iter()
        .map(|item| into_string(command, item))
        .collect()
}

/// Arrays of non-null strings (`LRANGE`, `SENTINEL GET-MASTER-ADDR-BY-NAME`)
pub fn into_strings(command: &str, value: RespValue) -> CentinelaResult<Vec<String>> {
    into_array(command, value)?
        .into_iter()
        .map(|item| match into_string(command, item)? {
            Some(text) => Ok(text),
            None => Err(CentinelaError::protocol(format!(
                "{} returned a null element",
                command
            ))),
        })
        .collect()
}

/// Flat field/value arrays (`HGETALL`, each entry of `SENTINEL REPLICAS`)
pub fn into_string_map(command: &str, value: RespValue) -> CentinelaResult<HashMap<String, String>> {
    let items = into_strings(command, value)?;
    if items.len() % 2 != 0 {
        return Err(CentinelaError::protocol(format!(
            "{} returned an odd number of field/value elements",
            command
        )));
    }

    let mut map = HashMap::with_capacity(items.len() / 2);
    let mut iter = items.into_iter();
    while let (Some(field), Some(value)) = (iter.next(), iter.next()) {
        map.insert(field, value);
    }
    Ok(map)
}

/// Arrays of flat field/value arrays (`SENTINEL REPLICAS`)
pub fn into_string_maps(command: &str, value: RespValue) -> CentinelaResult<Vec<HashMap<String, String>>> {
    into_array(command, value)?
        .into_iter()
        .map(|item| into_string_map(command, item))
        .collect()
}

/// `SCAN` replies: `[cursor, [key, ...]]`
pub fn into_scan_page(command: &str, value: RespValue) -> CentinelaResult<(u64, Vec<String>)> {
    let mut items = into_array(command, value)?;
    if items.len() != 2 {
        return Err(CentinelaError::protocol(format!(
            "{} returned {} elements, expected 2",
            command,
            items.len()
        )));
    }

    let keys = into_strings(command, items.pop().unwrap_or(RespValue::Array(None)))?;
    let cursor = match into_string(command, items.pop().unwrap_or(RespValue::BulkString(None)))? {
        Some(text) => text
            .parse::<u64>()
            .map_err(|_| CentinelaError::protocol(format!("{} returned cursor {:?}", command, text)))?,
        None => return Err(CentinelaError::protocol(format!("{} returned a null cursor", command))),
    };
    Ok((cursor, keys))
}
