//! Lenient decimal decoding for vendor JSON.

use std::str::FromStr;

use coinsight_core::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decode a JSON number or numeric string; anything else (including `null`) is `None`.
pub fn opt_decimal<'de, D>(d: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(to_decimal))
}

pub fn to_decimal(v: &Value) -> Option<Decimal> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_u64().map(Decimal::from))
            .or_else(|| parse(&n.to_string())),
        Value::String(s) => parse(s.trim()),
        _ => None,
    }
}

fn parse(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}
