use std::borrow::Cow;

use metahub_api::reflect::FieldValue;
use metahub_api::value::Value;

/// Convert a reflected field value into a dynamic value.
///
/// Scalars pass through, enums become their ordinal, messages stay borrowed
/// handles, sequences and maps are coerced element-wise. Never fails; the
/// caller checks presence first.
pub fn coerce<'a>(field: &FieldValue<'a>) -> Value<'a> {
    match field {
        FieldValue::Bool(v) => Value::Bool(*v),
        FieldValue::Int(v) => Value::Int64(*v),
        FieldValue::UInt(v) => Value::UInt64(*v),
        FieldValue::Float(v) => Value::Float64(*v),
        FieldValue::Str(s) => Value::String(Cow::Borrowed(*s)),
        FieldValue::Bytes(b) => Value::Bytes(Cow::Borrowed(*b)),
        FieldValue::Enum(e) => Value::Int64(i64::from(e.ordinal)),
        FieldValue::Message(m) => Value::Message(*m),
        FieldValue::List(items) => Value::Array(items.iter().map(coerce).collect()),
        FieldValue::Map(entries) => Value::Map(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), coerce(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use metahub_api::reflect::{EnumRef, EnumValueAnnotation};

    use super::*;

    static VALUES: [EnumValueAnnotation; 1] = [EnumValueAnnotation {
        ordinal: 3,
        name: "Thesis",
        target: Some("thesis"),
    }];

    #[test]
    fn scalars_pass_through_and_enums_become_ordinals() {
        assert_eq!(coerce(&FieldValue::Str("x")), Value::str("x"));
        assert_eq!(coerce(&FieldValue::UInt(7)), Value::UInt64(7));
        let e = FieldValue::Enum(EnumRef {
            type_name: "Kind",
            ordinal: 3,
            values: &VALUES,
        });
        assert_eq!(coerce(&e), Value::Int64(3));
    }

    #[test]
    fn containers_are_coerced_element_wise() {
        let list = FieldValue::List(vec![FieldValue::Int(1), FieldValue::Bool(true)]);
        assert_eq!(
            coerce(&list),
            Value::Array(vec![Value::Int64(1), Value::Bool(true)])
        );
        let map = FieldValue::Map(vec![("k".into(), FieldValue::Float(1.5))]);
        assert_eq!(
            coerce(&map),
            Value::Map(vec![("k".into(), Value::Float64(1.5))])
        );
    }
}
