//! Conversion between opaque JSON payloads stored in custom resources and the
//! structured protobuf values ([`Struct`]) crossing the backend gRPC boundary.
//!
//! Both directions keep the contract non-nullable: an absent or empty payload
//! becomes an explicit empty [`Struct`], an absent [`Struct`] becomes an
//! explicit empty JSON object. Downstream consumers never have to reason
//! about `null` vs "no fields".

use prost_types::{ListValue, NullValue, Struct, Value, value::Kind};
use serde_json::{Map, Number, Value as JsonValue};
use snafu::{OptionExt, Snafu};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("payload must decode into a JSON object"))]
    NotAnObject,

    #[snafu(display("number {value} has no JSON representation"))]
    NonFiniteNumber { value: f64 },
}

/// Converts an opaque resource payload into a protobuf [`Struct`].
///
/// Absent and `null` payloads convert to an empty [`Struct`]. Payloads that
/// are valid JSON but not an object (a bare array, string, number or bool)
/// fail with [`Error::NotAnObject`] and must be surfaced to the resource
/// status instead of being dropped.
pub fn to_protobuf_struct(payload: Option<&JsonValue>) -> Result<Struct> {
    match payload {
        None | Some(JsonValue::Null) => Ok(Struct::default()),
        Some(JsonValue::Object(fields)) => Ok(object_to_struct(fields)),
        Some(_) => NotAnObjectSnafu.fail(),
    }
}

/// Converts a protobuf [`Struct`] back into a JSON object payload.
///
/// An absent [`Struct`] produces an explicit empty object, never `null`.
/// Fails only on numbers that protobuf can carry but JSON cannot (NaN and
/// the infinities).
pub fn to_json_payload(value: Option<Struct>) -> Result<JsonValue> {
    let fields = value.map(|s| s.fields).unwrap_or_default();

    let mut object = Map::new();
    for (key, value) in fields {
        object.insert(key, to_json_value(value)?);
    }

    Ok(JsonValue::Object(object))
}

fn object_to_struct(fields: &Map<String, JsonValue>) -> Struct {
    Struct {
        fields: fields
            .iter()
            .map(|(key, value)| (key.clone(), to_protobuf_value(value)))
            .collect(),
    }
}

fn to_protobuf_value(value: &JsonValue) -> Value {
    let kind = match value {
        JsonValue::Null => Kind::NullValue(NullValue::NullValue as i32),
        JsonValue::Bool(value) => Kind::BoolValue(*value),
        // Numbers outside the f64 range cannot occur in resource payloads,
        // which were parsed from JSON without arbitrary precision enabled
        JsonValue::Number(value) => Kind::NumberValue(value.as_f64().unwrap_or_default()),
        JsonValue::String(value) => Kind::StringValue(value.clone()),
        JsonValue::Array(items) => Kind::ListValue(ListValue {
            values: items.iter().map(to_protobuf_value).collect(),
        }),
        JsonValue::Object(fields) => Kind::StructValue(object_to_struct(fields)),
    };

    Value { kind: Some(kind) }
}

fn to_json_value(value: Value) -> Result<JsonValue> {
    let Some(kind) = value.kind else {
        return Ok(JsonValue::Null);
    };

    let value = match kind {
        Kind::NullValue(_) => JsonValue::Null,
        Kind::BoolValue(value) => JsonValue::Bool(value),
        Kind::NumberValue(value) => to_json_number(value)?,
        Kind::StringValue(value) => JsonValue::String(value),
        Kind::ListValue(list) => JsonValue::Array(
            list.values
                .into_iter()
                .map(to_json_value)
                .collect::<Result<_>>()?,
        ),
        Kind::StructValue(fields) => to_json_payload(Some(fields))?,
    };

    Ok(value)
}

/// Protobuf carries every number as f64. Restore whole numbers to JSON
/// integers so a payload round-trip reproduces the original text form.
fn to_json_number(value: f64) -> Result<JsonValue> {
    if value.is_finite() && value.fract() == 0.0 && (i64::MIN as f64..=i64::MAX as f64).contains(&value) {
        Ok(JsonValue::from(value as i64))
    } else {
        Number::from_f64(value)
            .map(JsonValue::Number)
            .context(NonFiniteNumberSnafu { value })
    }
}
