//! Conversions between attribute strings and typed property values.
//!
//! Attributes live in kebab-case and carry string payloads; properties live
//! in camelCase and carry typed values. The codec is the single place both
//! translations happen: name transforms in [`attribute_name`] /
//! [`property_name`], value transforms in [`decode`] / [`encode`]. All
//! functions are pure and total: malformed input degrades, it never panics.

use serde_json::Value;

/// The type a schema property declares for its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// Presence-based boolean: the attribute existing at all means `true`.
    Bool,
    /// Floating-point number.
    Number,
    /// Plain text.
    Text,
    /// Structured data carried as JSON in the attribute.
    Structured,
}

/// A typed property value as held in a component's property map.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Boolean value.
    Bool(bool),
    /// Numeric value. May be `NaN` when the attribute text was unparsable.
    Number(f64),
    /// Text value.
    Text(String),
    /// Structured value.
    Structured(Value),
}

impl PropertyValue {
    /// The [`ValueType`] this value belongs to.
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Bool,
            Self::Number(_) => ValueType::Number,
            Self::Text(_) => ValueType::Text,
            Self::Structured(_) => ValueType::Structured,
        }
    }

    /// Returns the boolean payload, if this is a boolean value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the numeric payload, if this is a numeric value.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the text payload, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the structured payload, if this is a structured value.
    #[must_use]
    pub const fn as_structured(&self) -> Option<&Value> {
        match self {
            Self::Structured(value) => Some(value),
            _ => None,
        }
    }
}

/// Converts a camelCase property name into its kebab-case attribute name.
#[must_use]
pub fn attribute_name(property: &str) -> String {
    let mut attribute = String::with_capacity(property.len() + 2);
    for ch in property.chars() {
        if ch.is_ascii_uppercase() {
            attribute.push('-');
            attribute.push(ch.to_ascii_lowercase());
        } else {
            attribute.push(ch);
        }
    }
    attribute
}

/// Converts a kebab-case attribute name into its camelCase property name.
#[must_use]
pub fn property_name(attribute: &str) -> String {
    let mut property = String::with_capacity(attribute.len());
    let mut upper_next = false;
    for ch in attribute.chars() {
        if ch == '-' {
            upper_next = true;
        } else if upper_next {
            property.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            property.push(ch);
        }
    }
    property
}

/// Decodes a raw attribute value (`None` when the attribute is absent) into
/// the typed value declared by `value_type`.
///
/// Booleans are presence-based: any attribute content, including the empty
/// string, decodes to `true`. Unparsable numbers surface as `NaN` rather
/// than an error. Unparsable structured payloads degrade to an empty
/// sequence or mapping depending on what the text was shaped like, because
/// attribute corruption must not take down the element.
#[must_use]
pub fn decode(raw: Option<&str>, value_type: ValueType) -> PropertyValue {
    match value_type {
        ValueType::Bool => PropertyValue::Bool(raw.is_some()),
        ValueType::Number => PropertyValue::Number(
            raw.and_then(|text| text.trim().parse::<f64>().ok())
                .unwrap_or(f64::NAN),
        ),
        ValueType::Text => PropertyValue::Text(raw.unwrap_or_default().to_owned()),
        ValueType::Structured => {
            let text = raw.unwrap_or_default();
            PropertyValue::Structured(
                serde_json::from_str(text).unwrap_or_else(|_| empty_structured(text)),
            )
        }
    }
}

fn empty_structured(text: &str) -> Value {
    if text.trim_start().starts_with('[') {
        Value::Array(Vec::new())
    } else {
        Value::Object(serde_json::Map::new())
    }
}

/// Encodes a typed property value into its attribute representation.
///
/// `None` means "remove the attribute": `Bool(false)` and a null structured
/// value unset rather than write. `Bool(true)` writes the empty string, so
/// presence alone carries the signal.
#[must_use]
pub fn encode(value: &PropertyValue) -> Option<String> {
    match value {
        PropertyValue::Bool(false) | PropertyValue::Structured(Value::Null) => None,
        PropertyValue::Bool(true) => Some(String::new()),
        PropertyValue::Number(number) => Some(number.to_string()),
        PropertyValue::Text(text) => Some(text.clone()),
        PropertyValue::Structured(value) => Some(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn name_transforms_are_inverse() {
        for property in ["variant", "maxItems", "ariaLabelledBy", "a"] {
            assert_eq!(property_name(&attribute_name(property)), property);
        }
        assert_eq!(attribute_name("maxItems"), "max-items");
        assert_eq!(property_name("aria-labelled-by"), "ariaLabelledBy");
    }

    #[test]
    fn boolean_decodes_by_presence() {
        assert_eq!(decode(Some(""), ValueType::Bool), PropertyValue::Bool(true));
        assert_eq!(
            decode(Some("false"), ValueType::Bool),
            PropertyValue::Bool(true)
        );
        assert_eq!(decode(None, ValueType::Bool), PropertyValue::Bool(false));
    }

    #[test]
    fn number_surfaces_nan_for_garbage() {
        assert_eq!(
            decode(Some("2.5"), ValueType::Number),
            PropertyValue::Number(2.5)
        );
        let PropertyValue::Number(parsed) = decode(Some("not-a-number"), ValueType::Number) else {
            panic!("expected a number");
        };
        assert!(parsed.is_nan());
        let PropertyValue::Number(absent) = decode(None, ValueType::Number) else {
            panic!("expected a number");
        };
        assert!(absent.is_nan());
    }

    #[test]
    fn structured_degrades_to_empty_default() {
        assert_eq!(
            decode(Some(r#"{"a":1}"#), ValueType::Structured),
            PropertyValue::Structured(json!({"a": 1}))
        );
        assert_eq!(
            decode(Some("[1, 2, oops"), ValueType::Structured),
            PropertyValue::Structured(json!([]))
        );
        assert_eq!(
            decode(Some("{broken"), ValueType::Structured),
            PropertyValue::Structured(json!({}))
        );
        assert_eq!(
            decode(None, ValueType::Structured),
            PropertyValue::Structured(json!({}))
        );
    }

    #[test]
    fn encode_removes_false_and_null() {
        assert_eq!(encode(&PropertyValue::Bool(false)), None);
        assert_eq!(encode(&PropertyValue::Structured(Value::Null)), None);
        assert_eq!(encode(&PropertyValue::Bool(true)), Some(String::new()));
    }

    #[test]
    fn text_and_number_round_trip_through_attributes() {
        for value in [
            PropertyValue::Text("primary".to_owned()),
            PropertyValue::Text(String::new()),
            PropertyValue::Number(42.0),
            PropertyValue::Number(-0.125),
        ] {
            let encoded = encode(&value).expect("reflecting values encode");
            assert_eq!(decode(Some(&encoded), value.value_type()), value);
        }
    }
}
