//! Forgiving deserializers for fields that older documents stored loosely.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Interpret a JSON value as a non-negative whole number.
///
/// Accepts numbers and numeric strings; anything else (including `null`,
/// fractions and negatives) yields `None`.
#[must_use]
pub fn value_as_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Deserialize an optional whole number, mapping malformed values to `None`.
///
/// # Errors
///
/// Only fails if the input is not valid JSON.
pub fn optional_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_u32(&value))
}

/// Interpret a JSON scalar as text: strings as-is, numbers and booleans
/// printed, `null` as empty.
fn scalar_text<E: serde::de::Error>(value: Value) -> Result<String, E> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(E::custom(format!("expected text, got {other}"))),
    }
}

/// Deserialize a text field that clients may send as a number or `null`.
///
/// # Errors
///
/// Fails for arrays and objects.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    scalar_text(Value::deserialize(deserializer)?)
}

/// Like [`text`] for patch fields: absent stays `None` (with
/// `#[serde(default)]`), while `null` becomes `Some("")` to clear the field.
///
/// # Errors
///
/// Fails for arrays and objects.
pub fn patch_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    scalar_text(Value::deserialize(deserializer)?).map(Some)
}

/// Deserialize a whole number, reading `null`, text and other junk as 0.
///
/// Fractions are truncated toward zero.
///
/// # Errors
///
/// Only fails if the input is not valid JSON.
#[allow(clippy::cast_possible_truncation)]
pub fn i64_or_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let number = match &value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(number.unwrap_or(0))
}

/// Deserialize a non-negative whole number, reading malformed values as 0.
///
/// # Errors
///
/// Only fails if the input is not valid JSON.
pub fn u32_or_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_u32(&value).unwrap_or(0))
}

/// Interpret a JSON value as a decimal amount.
///
/// Accepts numbers (including exponent notation) and numeric strings.
#[must_use]
pub fn value_as_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_owned(),
        _ => return None,
    };
    text.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// Deserialize a money amount, reading `null` and unparseable values as zero.
///
/// A NaN price is serialized by JavaScript as `null`, so documents written
/// by older admin tooling can hold one.
///
/// # Errors
///
/// Only fails if the input is not valid JSON.
pub fn decimal_or_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_decimal(&value).unwrap_or(Decimal::ZERO))
}

/// Keep a field's raw value, wrapping an explicit `null` as `Some(Value::Null)`.
///
/// Use with `#[serde(default)]` to tell an absent field (`None`) from one
/// that was sent as `null` to clear it.
///
/// # Errors
///
/// Only fails if the input is not valid JSON.
pub fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Deserialize a timestamp stored either as RFC 3339 text or as epoch milliseconds.
///
/// # Errors
///
/// Returns an error if the value is neither form.
pub fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .ok_or_else(|| serde::de::Error::custom(format!("invalid epoch millis: {n}"))),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom),
        other => Err(serde::de::Error::custom(format!(
            "expected timestamp, got {other}"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Deserialize)]
    struct Stamped {
        #[serde(default, deserialize_with = "optional_u32")]
        age: Option<u32>,
        #[serde(deserialize_with = "timestamp")]
        at: DateTime<Utc>,
    }

    #[test]
    fn test_value_as_u32() {
        assert_eq!(value_as_u32(&json!(27)), Some(27));
        assert_eq!(value_as_u32(&json!("31")), Some(31));
        assert_eq!(value_as_u32(&json!(-4)), None);
        assert_eq!(value_as_u32(&json!("abc")), None);
        assert_eq!(value_as_u32(&json!(null)), None);
    }

    #[test]
    fn test_timestamp_accepts_millis_and_rfc3339() {
        let from_millis: Stamped =
            serde_json::from_value(json!({"at": 1_700_000_000_000_i64})).unwrap();
        let from_text: Stamped =
            serde_json::from_value(json!({"at": "2023-11-14T22:13:20Z"})).unwrap();
        assert_eq!(from_millis.at, from_text.at);
        assert_eq!(from_millis.age, None);
    }

    #[test]
    fn test_present_distinguishes_null_from_absent() {
        #[derive(Deserialize)]
        struct Patch {
            #[serde(default, deserialize_with = "present")]
            age: Option<Value>,
        }

        let absent: Patch = serde_json::from_value(json!({})).unwrap();
        let cleared: Patch = serde_json::from_value(json!({"age": null})).unwrap();
        assert!(absent.age.is_none());
        assert_eq!(cleared.age, Some(Value::Null));
    }

    #[test]
    fn test_null_numbers_read_as_zero() {
        #[derive(Deserialize)]
        struct Row {
            #[serde(default, deserialize_with = "i64_or_zero")]
            stock: i64,
            #[serde(default, deserialize_with = "u32_or_zero")]
            order: u32,
            #[serde(default, deserialize_with = "decimal_or_zero")]
            price: Decimal,
        }

        let nulls: Row =
            serde_json::from_value(json!({"stock": null, "order": null, "price": null})).unwrap();
        assert_eq!((nulls.stock, nulls.order, nulls.price), (0, 0, Decimal::ZERO));

        let loose: Row =
            serde_json::from_value(json!({"stock": 7.9, "order": "3", "price": "1299.50"}))
                .unwrap();
        assert_eq!(loose.stock, 7);
        assert_eq!(loose.order, 3);
        assert_eq!(loose.price, Decimal::new(129_950, 2));
    }

    #[test]
    fn test_text_accepts_scalars() {
        #[derive(Deserialize)]
        struct Form {
            #[serde(default, deserialize_with = "text")]
            postal_code: String,
            #[serde(default, deserialize_with = "patch_text")]
            line2: Option<String>,
            #[serde(default, deserialize_with = "patch_text")]
            city: Option<String>,
        }

        let form: Form =
            serde_json::from_value(json!({"postal_code": 560_001, "line2": null})).unwrap();
        assert_eq!(form.postal_code, "560001");
        assert_eq!(form.line2.as_deref(), Some(""));
        assert_eq!(form.city, None);

        assert!(serde_json::from_value::<Form>(json!({"postal_code": ["5"]})).is_err());
    }

    #[test]
    fn test_value_as_decimal() {
        assert_eq!(value_as_decimal(&json!(2499)), Some(Decimal::new(2499, 0)));
        assert_eq!(value_as_decimal(&json!(1e3)), Some(Decimal::new(1000, 0)));
        assert_eq!(value_as_decimal(&json!("abc")), None);
        assert_eq!(value_as_decimal(&json!(null)), None);
    }

    #[test]
    fn test_timestamp_rejects_garbage() {
        assert!(serde_json::from_value::<Stamped>(json!({"at": true})).is_err());
    }
}
