//! Log records and structured field values.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::level::Severity;

/// Key under which a causing error is attached to a record.
pub const ERROR_KEY: &str = "error";

/// A structured field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    /// Rendered in seconds by every encoding.
    Duration(Duration),
    Null,
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Str(s) => serializer.serialize_str(s),
            Value::I64(v) => serializer.serialize_i64(*v),
            Value::U64(v) => serializer.serialize_u64(*v),
            Value::F64(v) => serializer.serialize_f64(*v),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Duration(d) => serializer.serialize_f64(d.as_secs_f64()),
            Value::Null => serializer.serialize_unit(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::I64(v) => write!(f, "{}", v),
            Value::U64(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Duration(d) => write!(f, "{}", d.as_secs_f64()),
            Value::Null => f.write_str("null"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Str(s.clone())
    }
}

macro_rules! value_from_int {
    ($variant:ident, $target:ty, $($t:ty),+) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v as $target)
                }
            }
        )+
    };
}

value_from_int!(I64, i64, i8, i16, i32, i64, isize);
value_from_int!(U64, u64, u8, u16, u32, u64, usize);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F64(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Duration> for Value {
    fn from(d: Duration) -> Self {
        Value::Duration(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// A single key/value pair attached to a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub value: Value,
}

impl Field {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Build a `Vec<Field>` from `key => value` pairs, keeping insertion order.
///
/// ```
/// use mixin_log::fields;
/// let f = fields!["k1" => "v1", "k2" => 42];
/// assert_eq!(f.len(), 2);
/// ```
#[macro_export]
macro_rules! fields {
    () => { ::std::vec::Vec::<$crate::record::Field>::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {
        ::std::vec![$($crate::record::Field::new($key, $value)),+]
    };
}

/// Serializes a field slice as a JSON-style map in insertion order.
pub(crate) struct FieldMap<'a>(pub &'a [Field]);

impl Serialize for FieldMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for field in self.0 {
            map.serialize_entry(&field.key, &field.value)?;
        }
        map.end()
    }
}

/// One log event, immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    timestamp: DateTime<FixedOffset>,
    severity: Severity,
    message: String,
    fields: Vec<Field>,
}

impl LogRecord {
    pub fn new(
        timestamp: DateTime<FixedOffset>,
        severity: Severity,
        message: impl Into<String>,
        fields: Vec<Field>,
    ) -> Self {
        Self {
            timestamp,
            severity,
            message: message.into(),
            fields,
        }
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Text of the attached causing error, if the call carried one.
    pub fn error(&self) -> Option<&str> {
        self.field(ERROR_KEY).and_then(Value::as_str)
    }

    /// First value recorded under `key`.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|f| f.key == key).map(|f| &f.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_macro_keeps_order() {
        let f = fields!["b" => 1, "a" => "x", "c" => true];
        let keys: Vec<_> = f.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, ["b", "a", "c"]);
        assert_eq!(f[0].value, Value::I64(1));
        assert_eq!(f[2].value, Value::Bool(true));
    }

    #[test]
    fn test_duration_serializes_as_seconds() {
        let v = Value::from(Duration::from_millis(1500));
        assert_eq!(serde_json::to_string(&v).unwrap(), "1.5");
        assert_eq!(v.to_string(), "1.5");
    }

    #[test]
    fn test_option_maps_to_null() {
        assert_eq!(Value::from(None::<u32>), Value::Null);
        assert_eq!(Value::from(Some(3u32)), Value::U64(3));
    }

    #[test]
    fn test_error_accessor() {
        let ts = DateTime::parse_from_rfc3339("2024-01-02T03:04:05Z").unwrap();
        let record = LogRecord::new(
            ts,
            Severity::Error,
            "db failed",
            fields!["table" => "users", ERROR_KEY => "timeout"],
        );
        assert_eq!(record.error(), Some("timeout"));
        assert_eq!(record.field("table"), Some(&Value::from("users")));

        let plain = LogRecord::new(ts, Severity::Info, "ok", Vec::new());
        assert_eq!(plain.error(), None);
    }
}
