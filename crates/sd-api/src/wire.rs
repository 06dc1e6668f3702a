//! Decoding of the server's response envelopes.
//!
//! Responses usually look like `{"message": "...", "data": ...}`, but older
//! endpoints put the payload at the top level or return lists as a bare
//! `data` array. Everything here accepts both.

use sd_core::error::ApiError;
use sd_core::session::Page;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

/// The `data` member when present, else the whole body.
pub(crate) fn data(mut value: Value) -> Value {
    match value.get_mut("data") {
        Some(inner) if !inner.is_null() => inner.take(),
        _ => value,
    }
}

pub(crate) fn decode_data<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    decode(data(value))
}

/// Decode a payload that may sit at the top level or under `data`.
pub(crate) fn decode_flat_or_data<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    match serde_json::from_value::<T>(value.clone()) {
        Ok(v) => Ok(v),
        Err(_) => decode_data(value),
    }
}

pub(crate) fn message(value: &Value) -> Option<String> {
    value
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
}

/// Decode a paged list whose items live under `field`.
pub(crate) fn decode_page<T: DeserializeOwned>(
    value: Value,
    field: &str,
    page: u32,
    page_size: u32,
) -> Result<Page<T>, ApiError> {
    let inner = data(value.clone());

    let items = [inner.get(field), value.get(field), Some(&inner)]
        .into_iter()
        .flatten()
        .find(|v| v.is_array())
        .cloned()
        .ok_or_else(|| ApiError::Decode(format!("missing `{field}` list in response")))?;
    let items: Vec<T> = decode(items)?;

    let number = |key: &str| {
        inner
            .get(key)
            .or_else(|| value.get(key))
            .and_then(|v| v.as_u64())
    };
    let total = number("total").unwrap_or(items.len() as u64);
    let page = number("page").map(|p| p as u32).unwrap_or(page);
    let page_size = number("pageSize")
        .or_else(|| number("page_size"))
        .map(|p| p as u32)
        .unwrap_or(page_size);

    Ok(Page::new(items, total, page, page_size))
}
