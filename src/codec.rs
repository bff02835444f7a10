//! Typed value encoding for `set_object` / `get_object`.
//!
//! Values are stored as JSON bytes. The format is opaque to the rest of the
//! crate; only these two functions know it.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CentinelaResult;

pub fn encode<T: Serialize + ?Sized>(value: &T) -> CentinelaResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

pub fn decode<T: DeserializeOwned>(data: &[u8]) -> CentinelaResult<T> {
    Ok(serde_json::from_slice(data)?)
}
