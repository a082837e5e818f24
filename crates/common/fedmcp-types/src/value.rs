use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// JSON value with a single canonical byte encoding.
///
/// Objects are stored in a `BTreeMap`, so key order is lexicographic by
/// UTF-8 bytes no matter how the value was built. Encoding never depends on
/// `serde_json`'s map feature flags.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum CanonicalValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<CanonicalValue>),
    Object(BTreeMap<String, CanonicalValue>),
}

impl CanonicalValue {
    /// Append the canonical encoding: compact JSON, sorted object keys.
    pub fn write_canonical(&self, out: &mut Vec<u8>) {
        match self {
            CanonicalValue::Null => out.extend_from_slice(b"null"),
            CanonicalValue::Bool(true) => out.extend_from_slice(b"true"),
            CanonicalValue::Bool(false) => out.extend_from_slice(b"false"),
            CanonicalValue::Number(n) => out.extend_from_slice(n.to_string().as_bytes()),
            CanonicalValue::String(s) => write_canonical_str(s, out),
            CanonicalValue::Array(items) => {
                out.push(b'[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(b',');
                    }
                    item.write_canonical(out);
                }
                out.push(b']');
            }
            CanonicalValue::Object(entries) => {
                out.push(b'{');
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push(b',');
                    }
                    write_canonical_str(key, out);
                    out.push(b':');
                    value.write_canonical(out);
                }
                out.push(b'}');
            }
        }
    }

    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_canonical(&mut out);
        out
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, CanonicalValue>> {
        match self {
            CanonicalValue::Object(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CanonicalValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Look up `key` when this value is an object.
    pub fn get(&self, key: &str) -> Option<&CanonicalValue> {
        self.as_object().and_then(|entries| entries.get(key))
    }
}

/// JSON string escaping: `"` and `\` are backslash-escaped, control
/// characters use the short forms or `\u00XX`, everything else is literal.
pub(crate) fn write_canonical_str(s: &str, out: &mut Vec<u8>) {
    out.push(b'"');
    for c in s.chars() {
        match c {
            '"' => out.extend_from_slice(b"\\\""),
            '\\' => out.extend_from_slice(b"\\\\"),
            '\u{08}' => out.extend_from_slice(b"\\b"),
            '\u{0c}' => out.extend_from_slice(b"\\f"),
            '\n' => out.extend_from_slice(b"\\n"),
            '\r' => out.extend_from_slice(b"\\r"),
            '\t' => out.extend_from_slice(b"\\t"),
            c if (c as u32) < 0x20 => {
                out.extend_from_slice(format!("\\u{:04x}", c as u32).as_bytes());
            }
            c => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
    out.push(b'"');
}

impl From<Value> for CanonicalValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => CanonicalValue::Null,
            Value::Bool(b) => CanonicalValue::Bool(b),
            Value::Number(n) => CanonicalValue::Number(n),
            Value::String(s) => CanonicalValue::String(s),
            Value::Array(items) => {
                CanonicalValue::Array(items.into_iter().map(CanonicalValue::from).collect())
            }
            Value::Object(entries) => CanonicalValue::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, CanonicalValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<CanonicalValue> for Value {
    fn from(value: CanonicalValue) -> Self {
        match value {
            CanonicalValue::Null => Value::Null,
            CanonicalValue::Bool(b) => Value::Bool(b),
            CanonicalValue::Number(n) => Value::Number(n),
            CanonicalValue::String(s) => Value::String(s),
            CanonicalValue::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            CanonicalValue::Object(entries) => Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }
}

impl From<&str> for CanonicalValue {
    fn from(value: &str) -> Self {
        CanonicalValue::String(value.to_string())
    }
}

impl From<String> for CanonicalValue {
    fn from(value: String) -> Self {
        CanonicalValue::String(value)
    }
}

impl From<bool> for CanonicalValue {
    fn from(value: bool) -> Self {
        CanonicalValue::Bool(value)
    }
}

impl From<i64> for CanonicalValue {
    fn from(value: i64) -> Self {
        CanonicalValue::Number(value.into())
    }
}

impl From<BTreeMap<String, CanonicalValue>> for CanonicalValue {
    fn from(value: BTreeMap<String, CanonicalValue>) -> Self {
        CanonicalValue::Object(value)
    }
}

impl FromIterator<(String, CanonicalValue)> for CanonicalValue {
    fn from_iter<I: IntoIterator<Item = (String, CanonicalValue)>>(iter: I) -> Self {
        CanonicalValue::Object(iter.into_iter().collect())
    }
}
