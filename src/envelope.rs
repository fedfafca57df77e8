//! Unwrapping of records that arrive in the compact binary (CBOR) encoding.
//!
//! The logger may emit records as CBOR instead of JSON text. A record is
//! treated as binary when its first byte is outside the ASCII range, which
//! can never start a JSON document. Binary records decode into the same
//! [`FieldValue`] model as JSON ones.

use crate::value::FieldValue;
use chrono::{DateTime, SecondsFormat, Utc};
use ciborium::value::Value;
use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

const EPOCH_TIME_TAG: u64 = 1;
const IP_ADDRESS_TAG: u64 = 260;
const EMBEDDED_JSON_TAG: u64 = 262;
const HEX_STRING_TAG: u64 = 263;

/// Whether `raw` is in the binary encoding.
pub fn is_binary(raw: &[u8]) -> bool {
    matches!(raw.first(), Some(b) if *b > 0x7F)
}

/// Decode one CBOR data item into a [`FieldValue`].
pub fn decode_binary(raw: &[u8]) -> Result<FieldValue, String> {
    let value: Value = ciborium::de::from_reader(raw).map_err(|e| e.to_string())?;
    Ok(convert(value))
}

fn convert(value: Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::Null,
        Value::Bool(b) => FieldValue::Bool(b),
        Value::Integer(i) => FieldValue::Number(i128::from(i).to_string()),
        Value::Float(f) => float_value(f),
        Value::Text(s) => FieldValue::Text(s),
        Value::Bytes(b) => FieldValue::Text(String::from_utf8_lossy(&b).into_owned()),
        Value::Array(items) => FieldValue::Array(items.into_iter().map(convert).collect()),
        Value::Map(entries) => FieldValue::Object(
            entries
                .into_iter()
                .map(|(k, v)| (map_key(k), convert(v)))
                .collect::<BTreeMap<_, _>>(),
        ),
        Value::Tag(tag, inner) => convert_tagged(tag, *inner),
        // `Value` is non-exhaustive; anything new is treated as absent.
        _ => FieldValue::Null,
    }
}

fn convert_tagged(tag: u64, inner: Value) -> FieldValue {
    match (tag, inner) {
        (EPOCH_TIME_TAG, Value::Integer(secs)) => i64::try_from(i128::from(secs))
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(rfc3339)
            .unwrap_or_else(|| FieldValue::Number(i128::from(secs).to_string())),
        (EPOCH_TIME_TAG, Value::Float(f)) => epoch_float(f)
            .map(rfc3339)
            .unwrap_or_else(|| float_value(f)),
        (IP_ADDRESS_TAG, Value::Bytes(bytes)) => ip_address(&bytes)
            .map(|ip| FieldValue::Text(ip.to_string()))
            .unwrap_or_else(|| FieldValue::Text(hex(&bytes))),
        (EMBEDDED_JSON_TAG, Value::Bytes(bytes)) => crate::record::decode_json(&bytes)
            .unwrap_or_else(|_| FieldValue::Text(String::from_utf8_lossy(&bytes).into_owned())),
        (HEX_STRING_TAG, Value::Bytes(bytes)) => FieldValue::Text(hex(&bytes)),
        (_, other) => convert(other),
    }
}

fn map_key(key: Value) -> String {
    match convert(key) {
        FieldValue::Text(s) | FieldValue::Number(s) => s,
        other => serde_json::to_string(&other).unwrap_or_else(|_| other.kind().to_string()),
    }
}

fn float_value(f: f64) -> FieldValue {
    if f.is_nan() {
        FieldValue::Text("NaN".to_string())
    } else if f.is_infinite() {
        FieldValue::Text(if f > 0.0 { "+Inf" } else { "-Inf" }.to_string())
    } else {
        FieldValue::Number(f.to_string())
    }
}

fn epoch_float(f: f64) -> Option<DateTime<Utc>> {
    if !f.is_finite() {
        return None;
    }
    let secs = f.floor();
    let nanos = ((f - secs) * 1e9).round() as u32;
    DateTime::from_timestamp(secs as i64, nanos.min(999_999_999))
}

fn rfc3339(ts: DateTime<Utc>) -> FieldValue {
    FieldValue::Text(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

fn ip_address(bytes: &[u8]) -> Option<IpAddr> {
    match bytes.len() {
        4 => {
            let octets: [u8; 4] = bytes.try_into().ok()?;
            Some(IpAddr::V4(Ipv4Addr::from(octets)))
        }
        16 => {
            let octets: [u8; 16] = bytes.try_into().ok()?;
            Some(IpAddr::V6(Ipv6Addr::from(octets)))
        }
        _ => None,
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
